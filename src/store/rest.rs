//! HTTP row-API preset backend (PostgREST dialect).
//!
//! Thin wrapper over `/rest/v1/<table>`. Filters use PostgREST operators
//! (`username=eq.alice`), upsert relies on `on_conflict` with
//! `Prefer: resolution=merge-duplicates`, and every write asks for
//! `return=representation` so the stored rows come back. Pure parsing in
//! `parse_rows` for testability.

use std::time::Duration;

use time::OffsetDateTime;

use super::{PresetBackend, PresetData, PresetRow, StoreError};
use crate::config::{RestConfig, StoreTimeouts};

const SELECT_COLUMNS: &str = "id,username,name,data,updated_at";
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=representation";
const PREFER_RETURN: &str = "return=representation";

// =============================================================================
// CLIENT
// =============================================================================

pub struct RestPresetBackend {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RestPresetBackend {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &RestConfig, timeouts: StoreTimeouts) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| StoreError::Request(e.to_string()))?;
        Ok(Self { http, endpoint: table_endpoint(&config.base_url, &config.table), api_key: config.api_key.clone() })
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.http
            .request(method, &self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Vec<PresetRow>, StoreError> {
        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(StoreError::Response { status: status.as_u16(), body: text });
        }

        parse_rows(&text)
    }
}

#[async_trait::async_trait]
impl PresetBackend for RestPresetBackend {
    async fn fetch_all(&self, username: &str) -> Result<Vec<PresetRow>, StoreError> {
        let builder = self.request(reqwest::Method::GET).query(&[
            ("select", SELECT_COLUMNS.to_owned()),
            ("username", eq_filter(username)),
            ("order", "updated_at.desc".to_owned()),
        ]);
        self.send(builder).await
    }

    async fn upsert(&self, username: &str, name: &str, data: &PresetData) -> Result<PresetRow, StoreError> {
        let payload = [UpsertPayload { username, name, data, updated_at: OffsetDateTime::now_utc() }];
        let builder = self
            .request(reqwest::Method::POST)
            .query(&[("on_conflict", "username,name"), ("select", SELECT_COLUMNS)])
            .header("Prefer", PREFER_UPSERT)
            .json(&payload);
        self.send(builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::MissingRow(name.to_owned()))
    }

    async fn delete(&self, username: &str, name: &str) -> Result<Vec<PresetRow>, StoreError> {
        let builder = self
            .request(reqwest::Method::DELETE)
            .query(&[
                ("username", eq_filter(username)),
                ("name", eq_filter(name)),
                ("select", SELECT_COLUMNS.to_owned()),
            ])
            .header("Prefer", PREFER_RETURN);
        self.send(builder).await
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
struct UpsertPayload<'a> {
    username: &'a str,
    name: &'a str,
    data: &'a PresetData,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

// =============================================================================
// HELPERS
// =============================================================================

fn table_endpoint(base_url: &str, table: &str) -> String {
    format!("{}/rest/v1/{table}", base_url.trim_end_matches('/'))
}

/// PostgREST equality filter. Values containing reserved characters are
/// double-quoted so commas and parentheses match literally.
fn eq_filter(value: &str) -> String {
    if value.contains([',', '(', ')', '"', '\\']) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("eq.\"{escaped}\"")
    } else {
        format!("eq.{value}")
    }
}

fn parse_rows(json: &str) -> Result<Vec<PresetRow>, StoreError> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(json).map_err(|e| StoreError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "rest_test.rs"]
mod tests;
