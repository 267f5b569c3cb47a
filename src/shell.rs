//! Terminal shell — line commands driving a [`Dashboard`].
//!
//! DESIGN
//! ======
//! Parsing is pure (`parse_command`), rendering is pure (`render_bill`,
//! `render_presets`), and only `Shell::run` does I/O. The loop is generic
//! over tokio reader/writer halves so tests can script a whole session from
//! a byte slice.
//!
//! Errors never end the loop. Validation failures print as `error [CODE]`;
//! a failed autosave prints a notice while the local edit stays in place.

use time::format_description::well_known::Rfc3339;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::debug;
use uuid::Uuid;

use crate::dashboard::{Dashboard, DashboardState, delete_prompt};
use crate::error::ErrorCode;
use crate::money::format_money;
use crate::store::{PresetRow, StoreError};

pub const HELP: &str = "\
commands:
  signin <user>         sign in and load your presets
  signout               forget the user and the local bill
  presets               list saved presets
  select <name>         load a preset into the bill
  clear                 drop the active preset and the bill
  new                   start a fresh, unnamed bill
  name <draft>          type a preset name (autosave target)
  save [name]           save the bill as a preset
  delete [name]         delete a preset (default: the active one)
  add <name>            add a person
  remove <who>          remove a person
  amount <who> <text>   set what a person owes
  paid <who>            toggle a person's paid flag
  tip <text>            set the tip (undoes a previous split)
  split                 split the tip evenly
  show                  print the bill
  help                  this text
  quit                  leave

<who> is an exact name, or else a row number from `show`.";

// =============================================================================
// COMMANDS
// =============================================================================

/// A participant reference as typed: an exact name, else a 1-based row
/// number. Names win, so a person called "2" is reachable by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Who(pub String);

impl From<&str> for Who {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    SignIn(String),
    SignOut,
    Presets,
    Select(String),
    Clear,
    New,
    Name(String),
    Save(Option<String>),
    Delete(Option<String>),
    Add(String),
    Remove(Who),
    Amount(Who, String),
    Paid(Who),
    Tip(String),
    Split,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShellError {
    #[error("unknown command `{0}` (try `help`)")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("no person matches `{0}`")]
    NoSuchPerson(String),
    #[error("{0} is marked paid; unmark them before editing the amount")]
    PaidRowLocked(String),
    #[error("no preset selected")]
    NoActivePreset,
}

impl ErrorCode for ShellError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCommand(_) => "E_UNKNOWN_COMMAND",
            Self::Usage(_) => "E_USAGE",
            Self::NoSuchPerson(_) => "E_NO_SUCH_PERSON",
            Self::PaidRowLocked(_) => "E_PAID_ROW_LOCKED",
            Self::NoActivePreset => "E_NO_ACTIVE_PRESET",
        }
    }
}

/// Parse one input line. Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns [`ShellError`] for unknown commands or missing arguments.
pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, ShellError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = split_word(line);

    let command = match verb.to_ascii_lowercase().as_str() {
        "signin" => ShellCommand::SignIn(required(rest, "signin <user>")?),
        "signout" => ShellCommand::SignOut,
        "presets" => ShellCommand::Presets,
        "select" => ShellCommand::Select(required(rest, "select <name>")?),
        "clear" => ShellCommand::Clear,
        "new" => ShellCommand::New,
        "name" => ShellCommand::Name(rest.to_owned()),
        "save" => ShellCommand::Save(optional(rest)),
        "delete" => ShellCommand::Delete(optional(rest)),
        "add" => ShellCommand::Add(required(rest, "add <name>")?),
        "remove" => ShellCommand::Remove(Who(required(rest, "remove <who>")?)),
        "amount" => {
            let (who, text) = split_word(rest);
            if who.is_empty() || text.is_empty() {
                return Err(ShellError::Usage("amount <who> <text>"));
            }
            ShellCommand::Amount(Who::from(who), text.to_owned())
        }
        "paid" => ShellCommand::Paid(Who(required(rest, "paid <who>")?)),
        "tip" => ShellCommand::Tip(required(rest, "tip <text>")?),
        "split" => ShellCommand::Split,
        "show" => ShellCommand::Show,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        _ => return Err(ShellError::UnknownCommand(verb.to_owned())),
    };
    Ok(Some(command))
}

fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (text, ""),
    }
}

fn required(rest: &str, usage: &'static str) -> Result<String, ShellError> {
    if rest.is_empty() { Err(ShellError::Usage(usage)) } else { Ok(rest.to_owned()) }
}

fn optional(rest: &str) -> Option<String> {
    if rest.is_empty() { None } else { Some(rest.to_owned()) }
}

/// Resolve `who` to a participant id in the current ledger: exact name
/// first, then row number.
///
/// # Errors
///
/// Returns [`ShellError::NoSuchPerson`] when nothing matches.
pub fn resolve_who(state: &DashboardState, who: &Who) -> Result<Uuid, ShellError> {
    let ledger = state.ledger();
    ledger
        .find_by_name(&who.0)
        .or_else(|| {
            let row = who.0.parse::<usize>().ok()?.checked_sub(1)?;
            ledger.people().get(row)
        })
        .map(|p| p.id)
        .ok_or_else(|| ShellError::NoSuchPerson(who.0.clone()))
}

// =============================================================================
// RENDERING
// =============================================================================

/// The bill as shown by `show`.
#[must_use]
pub fn render_bill(state: &DashboardState) -> String {
    let mut out = String::new();
    let heading = match (state.selected_preset(), state.preset_name().trim()) {
        (Some(active), _) => format!("Preset: {active}"),
        (None, "") => "Preset: (unsaved)".to_owned(),
        (None, typed) => format!("Preset: (unsaved) name: {typed}"),
    };
    out.push_str(&heading);
    out.push('\n');

    if state.ledger().is_empty() {
        out.push_str("  (no people yet)\n");
    }
    let width = state.ledger().iter().map(|p| p.name.chars().count()).max().unwrap_or(0);
    for (i, person) in state.ledger().iter().enumerate() {
        let marker = if person.paid { "  [paid]" } else { "" };
        out.push_str(&format!(
            "{:>3}. {:<width$}  {:>10}{marker}\n",
            i + 1,
            person.name,
            format_money(person.amount_value()),
        ));
    }

    out.push_str(&format!("Total:       {:>10}\n", format_money(state.total())));
    out.push_str(&format!("Tip:         {:>10}\n", format_money(state.tip().parsed())));
    out.push_str(&format!("Grand Total: {:>10}\n", format_money(state.grand_total())));
    out
}

/// The preset list as shown by `presets`; the active preset is starred.
#[must_use]
pub fn render_presets(presets: &[PresetRow], selected: Option<&str>) -> String {
    if presets.is_empty() {
        return "no saved presets\n".to_owned();
    }
    let mut out = String::new();
    for row in presets {
        let star = if selected == Some(row.name.as_str()) { '*' } else { ' ' };
        let updated = row.updated_at.format(&Rfc3339).unwrap_or_default();
        out.push_str(&format!("{star} {}  ({} people, updated {updated})\n", row.name, row.data.people.len()));
    }
    out
}

/// Like [`resolve_who`], but refuses rows already marked paid.
///
/// # Errors
///
/// Returns [`ShellError::PaidRowLocked`] for a paid row.
pub fn resolve_editable(state: &DashboardState, who: &Who) -> Result<Uuid, ShellError> {
    let id = resolve_who(state, who)?;
    match state.ledger().get(id) {
        Some(person) if person.paid => Err(ShellError::PaidRowLocked(person.name.clone())),
        _ => Ok(id),
    }
}

fn store_notice(err: &StoreError) -> String {
    match err {
        StoreError::Validation(e) => format!("error [{}]: {e}", e.error_code()),
        other => format!("sync failed [{}]: {other}", other.error_code()),
    }
}

// =============================================================================
// LOOP
// =============================================================================

enum Flow {
    Continue,
    Quit,
}

pub struct Shell<R, W> {
    lines: Lines<R>,
    out: W,
}

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, out: W) -> Self {
        Self { lines: input.lines(), out }
    }

    /// Read commands until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Only terminal I/O failures end the loop with an error.
    pub async fn run(&mut self, dashboard: &mut Dashboard) -> std::io::Result<()> {
        let greeting = match dashboard.state().session().username() {
            "" => "tabsplit: type `help` for commands, `signin <user>` to sync presets".to_owned(),
            user => format!("tabsplit: signed in as {user}; type `help` for commands"),
        };
        self.say(&greeting).await?;

        loop {
            self.prompt("> ").await?;
            let Some(line) = self.lines.next_line().await? else {
                return Ok(());
            };
            let command = match parse_command(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    self.say(&format!("error [{}]: {e}", e.error_code())).await?;
                    continue;
                }
            };
            debug!(?command, "shell command");
            if let Flow::Quit = self.handle(dashboard, command).await? {
                return Ok(());
            }
        }
    }

    async fn handle(&mut self, dash: &mut Dashboard, command: ShellCommand) -> std::io::Result<Flow> {
        let result: Result<Option<String>, Notice> = match command {
            ShellCommand::Quit => return Ok(Flow::Quit),
            ShellCommand::Help => Ok(Some(HELP.to_owned())),
            ShellCommand::Show => Ok(Some(render_bill(dash.state()))),
            ShellCommand::Presets => {
                Ok(Some(render_presets(dash.state().presets(), dash.state().selected_preset())))
            }
            ShellCommand::SignIn(user) => dash
                .sign_in(&user)
                .await
                .map(|()| Some(format!("signed in as {}", dash.state().session().username())))
                .map_err(Notice::from),
            ShellCommand::SignOut => {
                dash.sign_out();
                Ok(Some("signed out".to_owned()))
            }
            ShellCommand::Select(name) => {
                if dash.select_preset(&name) {
                    Ok(Some(render_bill(dash.state())))
                } else {
                    Ok(Some(format!("no preset named `{name}`; bill cleared")))
                }
            }
            ShellCommand::Clear => {
                dash.clear_selection();
                Ok(None)
            }
            ShellCommand::New => {
                dash.start_new_preset();
                Ok(None)
            }
            ShellCommand::Name(text) => {
                dash.set_preset_name(&text);
                Ok(None)
            }
            ShellCommand::Save(name) => {
                if let Some(name) = name {
                    dash.set_preset_name(&name);
                }
                dash.save_preset()
                    .await
                    .map(|()| dash.state().selected_preset().map(|n| format!("saved {n}")))
                    .map_err(Notice::from)
            }
            ShellCommand::Delete(name) => return self.delete(dash, name).await,
            ShellCommand::Add(name) => dash.add_person(&name).await.map(|_| None).map_err(Notice::from),
            ShellCommand::Remove(who) => match resolve_who(dash.state(), &who) {
                Ok(id) => dash.remove_person(id).await.map(|_| None).map_err(Notice::from),
                Err(e) => Err(e.into()),
            },
            ShellCommand::Amount(who, text) => match resolve_editable(dash.state(), &who) {
                Ok(id) => dash.update_amount(id, &text).await.map(|_| None).map_err(Notice::from),
                Err(e) => Err(e.into()),
            },
            ShellCommand::Paid(who) => match resolve_who(dash.state(), &who) {
                Ok(id) => dash.toggle_paid(id).await.map(|_| None).map_err(Notice::from),
                Err(e) => Err(e.into()),
            },
            ShellCommand::Tip(text) => {
                dash.change_tip(&text);
                Ok(None)
            }
            ShellCommand::Split => dash.split_evenly().await.map(|_| None).map_err(Notice::from),
        };

        match result {
            Ok(Some(text)) => self.say(text.trim_end()).await?,
            Ok(None) => {}
            Err(notice) => self.say(&notice.0).await?,
        }
        Ok(Flow::Continue)
    }

    async fn delete(&mut self, dash: &mut Dashboard, name: Option<String>) -> std::io::Result<Flow> {
        let Some(name) = name.or_else(|| dash.state().selected_preset().map(str::to_owned)) else {
            let e = ShellError::NoActivePreset;
            self.say(&format!("error [{}]: {e}", e.error_code())).await?;
            return Ok(Flow::Continue);
        };
        if let Err(e) = dash.state().delete_preset(&name) {
            self.say(&store_notice(&e.into())).await?;
            return Ok(Flow::Continue);
        }

        self.prompt(&format!("{} [y/N] ", delete_prompt(&name))).await?;
        let answer = self.lines.next_line().await?.unwrap_or_default();
        let confirmed = matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes");

        match dash.delete_preset(&name, |_| confirmed).await {
            Ok(true) => self.say(&format!("deleted {name}")).await?,
            Ok(false) => self.say("kept").await?,
            Err(e) => self.say(&store_notice(&e)).await?,
        }
        Ok(Flow::Continue)
    }

    async fn say(&mut self, text: &str) -> std::io::Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await
    }

    async fn prompt(&mut self, text: &str) -> std::io::Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.flush().await
    }
}

/// A line to print after a failed command.
struct Notice(String);

impl From<StoreError> for Notice {
    fn from(err: StoreError) -> Self {
        Self(store_notice(&err))
    }
}

impl From<ShellError> for Notice {
    fn from(err: ShellError) -> Self {
        Self(format!("error [{}]: {err}", err.error_code()))
    }
}

#[cfg(test)]
#[path = "shell_test.rs"]
mod tests;
