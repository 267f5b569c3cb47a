//! tabsplit — split a restaurant bill, distribute the tip, and keep named
//! presets of the bill per user.
//!
//! ARCHITECTURE
//! ============
//! `money`, `ledger` and `tip` are pure bill arithmetic. `store` persists
//! preset snapshots behind the `PresetBackend` seam (memory, Postgres via
//! `db`, or a REST row API). `dashboard` ties the bill to the session and
//! the store; `shell` is the terminal surface over it.

pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod ledger;
pub mod money;
pub mod session;
pub mod shell;
pub mod store;
pub mod tip;
