use super::*;

fn row_json(name: &str, updated_at: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "3f1c2b9e-8a55-4a7e-9d0b-1c2d3e4f5a6b",
        "username": "alice",
        "name": name,
        "data": { "people": [{ "name": "Bob", "amount": "12.5", "paid": false }], "tip": "3" },
        "updated_at": updated_at
    })
}

// =============================================================================
// parse_rows
// =============================================================================

#[test]
fn parse_rows_reads_postgrest_timestamps() {
    let json = serde_json::json!([row_json("dinner", "2025-03-01T18:30:00.123456+00:00")]).to_string();
    let rows = parse_rows(&json).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "dinner");
    assert_eq!(rows[0].data.tip, "3");
    assert_eq!(rows[0].data.people[0].amount, "12.5");
    assert_eq!(rows[0].updated_at.year(), 2025);
}

#[test]
fn parse_rows_keeps_server_order() {
    let json = serde_json::json!([
        row_json("newer", "2025-03-02T00:00:00Z"),
        row_json("older", "2025-03-01T00:00:00Z"),
    ])
    .to_string();
    let names: Vec<String> = parse_rows(&json).unwrap().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["newer", "older"]);
}

#[test]
fn parse_rows_empty_body_is_empty() {
    assert!(parse_rows("").unwrap().is_empty());
    assert!(parse_rows("[]").unwrap().is_empty());
}

#[test]
fn parse_rows_invalid_json() {
    let err = parse_rows("not json").unwrap_err();
    assert!(matches!(err, StoreError::Parse(_)));
}

#[test]
fn parse_rows_missing_data_fields_use_defaults() {
    let json = serde_json::json!([{
        "id": "3f1c2b9e-8a55-4a7e-9d0b-1c2d3e4f5a6b",
        "username": "alice",
        "name": "empty",
        "data": {},
        "updated_at": "2025-03-01T00:00:00Z"
    }])
    .to_string();
    let rows = parse_rows(&json).unwrap();
    assert!(rows[0].data.people.is_empty());
    assert_eq!(rows[0].data.tip, "0");
}

// =============================================================================
// helpers
// =============================================================================

#[test]
fn table_endpoint_joins_without_double_slash() {
    assert_eq!(table_endpoint("https://x.test/", "presets"), "https://x.test/rest/v1/presets");
    assert_eq!(table_endpoint("https://x.test", "bills"), "https://x.test/rest/v1/bills");
}

#[test]
fn eq_filter_plain_and_quoted() {
    assert_eq!(eq_filter("alice"), "eq.alice");
    assert_eq!(eq_filter("Fri night, 8pm"), "eq.\"Fri night, 8pm\"");
    assert_eq!(eq_filter("say \"hi\""), "eq.\"say \\\"hi\\\"\"");
}

#[test]
fn upsert_payload_serializes_rfc3339_timestamp() {
    let data = PresetData::default();
    let payload = UpsertPayload {
        username: "alice",
        name: "dinner",
        data: &data,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    };
    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["updated_at"], "1970-01-01T00:00:00Z");
    assert_eq!(json["data"]["tip"], "0");
    assert_eq!(json["data"]["people"], serde_json::json!([]));
}

#[test]
fn new_backend_builds_endpoint_from_config() {
    let config = RestConfig {
        base_url: "https://rows.example.test".into(),
        api_key: "anon".into(),
        table: "presets".into(),
    };
    let backend = RestPresetBackend::new(&config, StoreTimeouts { request_secs: 5, connect_secs: 1 }).unwrap();
    assert_eq!(backend.endpoint, "https://rows.example.test/rest/v1/presets");
}
