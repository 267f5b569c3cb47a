use super::*;
use crate::ledger::Participant;
use crate::session::SessionFile;
use time::OffsetDateTime;

fn signed_in(username: &str) -> DashboardState {
    let mut session = Session::default();
    session.sign_in(&SessionFile::ephemeral(), username);
    DashboardState::new(session)
}

fn row(username: &str, name: &str, people: &[(&str, &str, bool)], tip: &str) -> PresetRow {
    let people = people
        .iter()
        .map(|(n, amount, paid)| Participant { amount: (*amount).to_owned(), paid: *paid, ..Participant::new(*n) })
        .collect();
    PresetRow {
        id: Uuid::new_v4(),
        username: username.to_owned(),
        name: name.to_owned(),
        data: PresetData { people, tip: tip.to_owned() },
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

fn with_presets(state: &mut DashboardState, presets: Vec<PresetRow>) {
    let stamp = SessionStamp::of(state.session());
    assert!(state.reconcile(SyncOutcome::Reloaded { stamp, presets }));
}

fn id_of(state: &DashboardState, name: &str) -> Uuid {
    state.ledger().find_by_name(name).unwrap().id
}

// =============================================================================
// autosave decisions
// =============================================================================

#[test]
fn edits_while_signed_out_stay_local() {
    let mut state = DashboardState::default();
    state.set_preset_name("dinner");
    let t = state.add_person("Alice");
    assert!(t.changed);
    assert!(t.sync.is_none());
}

#[test]
fn edits_without_target_stay_local() {
    let mut state = signed_in("alice");
    let t = state.add_person("Alice");
    assert!(t.changed);
    assert!(t.sync.is_none());
    assert!(state.autosave_target().is_none());
}

#[test]
fn blank_typed_name_is_not_a_target() {
    let mut state = signed_in("alice");
    state.set_preset_name("   ");
    assert!(state.autosave_target().is_none());
}

#[test]
fn typed_name_is_autosave_target() {
    let mut state = signed_in("alice");
    state.set_preset_name("  dinner ");
    let t = state.add_person("Bob");
    let Some(SyncCommand::Save { stamp, name, data, activate }) = t.sync else {
        panic!("expected autosave");
    };
    assert_eq!(stamp.username, "alice");
    assert_eq!(name, "dinner");
    assert!(!activate);
    assert_eq!(data.people.len(), 1);
    assert_eq!(data.people[0].name, "Bob");
}

#[test]
fn selected_preset_wins_over_typed_name() {
    let mut state = signed_in("alice");
    with_presets(&mut state, vec![row("alice", "lunch", &[("A", "1", false)], "0")]);
    assert!(state.select_preset("lunch"));
    state.set_preset_name("other");
    assert_eq!(state.autosave_target(), Some("lunch"));
}

#[test]
fn noop_edits_do_not_autosave() {
    let mut state = signed_in("alice");
    state.set_preset_name("dinner");
    let _ = state.add_person("Alice");

    let dup = state.add_person("Alice");
    assert!(!dup.changed);
    assert!(dup.sync.is_none());

    let missing = state.toggle_paid(Uuid::new_v4());
    assert!(missing.sync.is_none());

    let nothing_to_split = state.split_evenly();
    assert!(nothing_to_split.sync.is_none());
}

#[test]
fn every_ledger_mutation_autosaves_snapshot() {
    let mut state = signed_in("alice");
    state.set_preset_name("dinner");
    assert!(state.add_person("Alice").sync.is_some());
    let alice = id_of(&state, "Alice");
    assert!(state.update_amount(alice, "10").sync.is_some());
    assert!(state.toggle_paid(alice).sync.is_some());
    state.change_tip("4");
    let split = state.split_evenly();
    let Some(SyncCommand::Save { data, .. }) = split.sync else {
        panic!("expected autosave after split");
    };
    assert_eq!(data.tip, "4");
    assert_eq!(data.people[0].amount, "14");
    assert!(data.people[0].paid);
    assert!(state.remove_person(alice).sync.is_some());
}

#[test]
fn tip_change_reports_undone_split() {
    let mut state = signed_in("alice");
    state.set_preset_name("dinner");
    let _ = state.add_person("Alice");
    assert!(!state.change_tip("5"));
    let _ = state.split_evenly();
    assert!(state.change_tip("7"));
    assert_eq!(state.ledger().find_by_name("Alice").unwrap().amount, "0");
    assert_eq!(state.tip().tip_text, "7");
}

// =============================================================================
// tip scenario
// =============================================================================

#[test]
fn split_and_undo_example() {
    let mut state = DashboardState::default();
    let _ = state.add_person("Alice");
    let _ = state.add_person("Bob");
    let (alice, bob) = (id_of(&state, "Alice"), id_of(&state, "Bob"));
    let _ = state.update_amount(alice, "10");
    let _ = state.update_amount(bob, "20");
    state.change_tip("6");

    let _ = state.split_evenly();
    assert_eq!(state.ledger().get(alice).unwrap().amount, "13");
    assert_eq!(state.ledger().get(bob).unwrap().amount, "23");
    assert!((state.tip().last_applied_tip - 6.0).abs() < f64::EPSILON);
    assert!((state.total() - 36.0).abs() < 1e-9);
    assert!((state.grand_total() - 42.0).abs() < 1e-9);

    state.change_tip("0");
    assert_eq!(state.ledger().get(alice).unwrap().amount, "10");
    assert_eq!(state.ledger().get(bob).unwrap().amount, "20");
    assert_eq!(state.tip().last_applied_tip, 0.0);
}

// =============================================================================
// presets
// =============================================================================

#[test]
fn select_preset_replaces_bill_and_resets_applied_tip() {
    let mut state = signed_in("alice");
    let _ = state.add_person("Stale");
    state.change_tip("9");
    let _ = state.split_evenly();
    with_presets(&mut state, vec![row("alice", "dinner", &[("A", "13", false), ("B", "23", true)], "6")]);

    assert!(state.select_preset("dinner"));

    let names: Vec<&str> = state.ledger().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(state.ledger().find_by_name("A").unwrap().amount, "13");
    assert!(state.ledger().find_by_name("B").unwrap().paid);
    assert_eq!(state.tip().tip_text, "6");
    assert_eq!(state.tip().last_applied_tip, 0.0);
    assert_eq!(state.selected_preset(), Some("dinner"));
}

#[test]
fn select_unknown_preset_clears_bill() {
    let mut state = signed_in("alice");
    with_presets(&mut state, vec![row("alice", "dinner", &[("A", "1", false)], "2")]);
    assert!(state.select_preset("dinner"));

    assert!(!state.select_preset(""));

    assert!(state.selected_preset().is_none());
    assert!(state.ledger().is_empty());
    assert_eq!(state.tip().tip_text, "0");
}

#[test]
fn start_new_preset_clears_draft_and_selection() {
    let mut state = signed_in("alice");
    with_presets(&mut state, vec![row("alice", "dinner", &[("A", "1", false)], "2")]);
    assert!(state.select_preset("dinner"));
    state.set_preset_name("draft");

    state.start_new_preset();

    assert!(state.selected_preset().is_none());
    assert_eq!(state.preset_name(), "");
    assert!(state.ledger().is_empty());
    assert_eq!(state.presets().len(), 1, "preset list is kept");
}

#[test]
fn save_preset_validation() {
    let mut signed_out = DashboardState::default();
    signed_out.set_preset_name("dinner");
    assert_eq!(signed_out.save_preset().unwrap_err(), ValidationError::MissingUsername);

    let mut state = signed_in("alice");
    state.set_preset_name("   ");
    assert_eq!(state.save_preset().unwrap_err(), ValidationError::MissingPresetName);
}

#[test]
fn save_preset_trims_and_activates() {
    let mut state = signed_in("alice");
    state.set_preset_name(" dinner ");
    let Ok(SyncCommand::Save { name, activate, .. }) = state.save_preset() else {
        panic!("expected save command");
    };
    assert_eq!(name, "dinner");
    assert!(activate);
}

#[test]
fn delete_preset_validation() {
    assert_eq!(DashboardState::default().delete_preset("x").unwrap_err(), ValidationError::MissingUsername);
    assert_eq!(signed_in("alice").delete_preset("").unwrap_err(), ValidationError::MissingPresetName);
}

// =============================================================================
// reconcile
// =============================================================================

#[test]
fn reconcile_saved_with_activate_selects_and_clears_draft() {
    let mut state = signed_in("alice");
    state.set_preset_name("dinner");
    let saved = row("alice", "dinner", &[], "0");
    let outcome = SyncOutcome::Saved {
        stamp: SessionStamp::of(state.session()),
        row: saved.clone(),
        activate: true,
        presets: Some(vec![saved]),
    };

    assert!(state.reconcile(outcome));

    assert_eq!(state.selected_preset(), Some("dinner"));
    assert_eq!(state.preset_name(), "");
    assert_eq!(state.presets().len(), 1);
}

#[test]
fn reconcile_autosave_keeps_draft() {
    let mut state = signed_in("alice");
    state.set_preset_name("dinner");
    let saved = row("alice", "dinner", &[], "0");
    let outcome = SyncOutcome::Saved {
        stamp: SessionStamp::of(state.session()),
        row: saved.clone(),
        activate: false,
        presets: Some(vec![saved]),
    };
    assert!(state.reconcile(outcome));
    assert!(state.selected_preset().is_none());
    assert_eq!(state.preset_name(), "dinner");
}

#[test]
fn reconcile_delete_of_active_preset_clears_bill() {
    let mut state = signed_in("alice");
    with_presets(&mut state, vec![row("alice", "dinner", &[("A", "5", false)], "3")]);
    assert!(state.select_preset("dinner"));
    let outcome = SyncOutcome::Deleted {
        stamp: SessionStamp::of(state.session()),
        name: "dinner".into(),
        removed: Vec::new(),
        presets: Some(Vec::new()),
    };

    assert!(state.reconcile(outcome));

    assert!(state.selected_preset().is_none());
    assert!(state.ledger().is_empty());
    assert_eq!(state.tip().tip_text, "0");
}

#[test]
fn reconcile_delete_of_other_preset_keeps_bill() {
    let mut state = signed_in("alice");
    with_presets(
        &mut state,
        vec![row("alice", "dinner", &[("A", "5", false)], "3"), row("alice", "lunch", &[], "0")],
    );
    assert!(state.select_preset("dinner"));
    let outcome = SyncOutcome::Deleted {
        stamp: SessionStamp::of(state.session()),
        name: "lunch".into(),
        removed: Vec::new(),
        presets: Some(vec![row("alice", "dinner", &[("A", "5", false)], "3")]),
    };
    assert!(state.reconcile(outcome));
    assert_eq!(state.selected_preset(), Some("dinner"));
    assert_eq!(state.ledger().len(), 1);
}

#[test]
fn reconcile_delete_without_reload_prunes_local_list() {
    let mut state = signed_in("alice");
    with_presets(
        &mut state,
        vec![row("alice", "dinner", &[("A", "5", false)], "3"), row("alice", "lunch", &[], "0")],
    );
    assert!(state.select_preset("dinner"));
    let outcome = SyncOutcome::Deleted {
        stamp: SessionStamp::of(state.session()),
        name: "dinner".into(),
        removed: Vec::new(),
        presets: None,
    };

    assert!(state.reconcile(outcome));

    assert!(state.selected_preset().is_none());
    assert!(state.ledger().is_empty());
    let names: Vec<&str> = state.presets().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["lunch"]);
    assert!(state.autosave_target().is_none());
}

#[test]
fn reconcile_save_without_reload_activates_and_lists_row() {
    let mut state = signed_in("alice");
    with_presets(&mut state, vec![row("alice", "lunch", &[], "0"), row("alice", "dinner", &[], "0")]);
    state.set_preset_name("dinner");
    let saved = row("alice", "dinner", &[("A", "1", false)], "0");
    let outcome = SyncOutcome::Saved {
        stamp: SessionStamp::of(state.session()),
        row: saved.clone(),
        activate: true,
        presets: None,
    };

    assert!(state.reconcile(outcome));

    assert_eq!(state.selected_preset(), Some("dinner"));
    assert_eq!(state.preset_name(), "");
    let names: Vec<&str> = state.presets().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["dinner", "lunch"]);
    assert_eq!(state.presets()[0], saved);
}

#[test]
fn reconcile_drops_outcome_from_previous_epoch() {
    let mut state = signed_in("alice");
    let stale = SessionStamp::of(state.session());
    state.session_mut().sign_in(&SessionFile::ephemeral(), "bob");

    let applied = state.reconcile(SyncOutcome::Reloaded { stamp: stale, presets: vec![row("alice", "x", &[], "0")] });

    assert!(!applied);
    assert!(state.presets().is_empty());
}

#[test]
fn reset_local_keeps_session() {
    let mut state = signed_in("alice");
    with_presets(&mut state, vec![row("alice", "x", &[], "0")]);
    let _ = state.add_person("A");
    state.set_preset_name("y");

    state.reset_local();

    assert!(state.presets().is_empty());
    assert!(state.ledger().is_empty());
    assert_eq!(state.preset_name(), "");
    assert_eq!(state.session().username(), "alice");
}
