//! `SQLite` catalog for relay.
//!
//! Persists repositories, their working trees, and process-wide settings.
//! Every read returns an owned snapshot; nothing here touches git or the
//! network.

mod db;
mod models;
mod repo_queries;
mod settings_queries;
mod worktree_queries;

pub use db::{Database, DatabaseError};
pub use models::*;
pub use settings_queries::SettingKey;
