//! Runtime configuration parsed from environment variables.

use std::path::PathBuf;

use crate::error::ErrorCode;

pub const DEFAULT_SESSION_FILE: &str = ".tabsplit_session";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_REST_TABLE: &str = "presets";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),
    #[error("missing required setting: {0}")]
    Missing(&'static str),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "E_CONFIG_PARSE",
            Self::Missing(_) => "E_CONFIG_MISSING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Postgres,
    Rest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestConfig {
    pub base_url: String,
    pub api_key: String,
    pub table: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend: BackendKind,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub rest: Option<RestConfig>,
    pub timeouts: StoreTimeouts,
    pub session_file: PathBuf,
}

impl Config {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `TABSPLIT_BACKEND`: `memory` (default), `postgres`, or `rest`
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `PRESETS_REST_TABLE`: default `presets`
    /// - `PRESETS_REQUEST_TIMEOUT_SECS`: default 30
    /// - `PRESETS_CONNECT_TIMEOUT_SECS`: default 10
    /// - `TABSPLIT_SESSION_FILE`: default `.tabsplit_session`
    ///
    /// Required by backend:
    /// - `postgres`: `DATABASE_URL`
    /// - `rest`: `PRESETS_REST_URL`, `PRESETS_REST_KEY`
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown backend or a missing required value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_backend(None)
    }

    /// Like [`Config::from_env`], with `backend` taking precedence over
    /// `TABSPLIT_BACKEND` when given.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown backend or a missing required value.
    pub fn from_env_with_backend(backend: Option<&str>) -> Result<Self, ConfigError> {
        let env_backend = std::env::var("TABSPLIT_BACKEND").ok();
        let backend = parse_backend(backend.or(env_backend.as_deref()))?;

        let database_url = non_empty_env("DATABASE_URL");
        if backend == BackendKind::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let rest = match (non_empty_env("PRESETS_REST_URL"), non_empty_env("PRESETS_REST_KEY")) {
            (Some(base_url), Some(api_key)) => Some(RestConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key,
                table: non_empty_env("PRESETS_REST_TABLE").unwrap_or_else(|| DEFAULT_REST_TABLE.to_string()),
            }),
            (None, _) if backend == BackendKind::Rest => return Err(ConfigError::Missing("PRESETS_REST_URL")),
            (_, None) if backend == BackendKind::Rest => return Err(ConfigError::Missing("PRESETS_REST_KEY")),
            _ => None,
        };

        let timeouts = StoreTimeouts {
            request_secs: env_parse("PRESETS_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("PRESETS_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self {
            backend,
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            rest,
            timeouts,
            session_file: non_empty_env("TABSPLIT_SESSION_FILE")
                .map_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from),
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_backend(raw: Option<&str>) -> Result<BackendKind, ConfigError> {
    match raw.unwrap_or("memory") {
        "memory" => Ok(BackendKind::Memory),
        "postgres" => Ok(BackendKind::Postgres),
        "rest" => Ok(BackendKind::Rest),
        other => Err(ConfigError::Parse(format!(
            "unknown TABSPLIT_BACKEND '{other}' (expected 'memory', 'postgres' or 'rest')"
        ))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
