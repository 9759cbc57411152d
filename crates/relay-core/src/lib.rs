//! Relay Core Library
//!
//! Shared functionality for relay components:
//! - Error taxonomy with user-facing remediation hints
//! - Catalog database pool helpers
//! - Project configuration discovery (`.relay/relay-config.json`)
//! - Editor enumeration
//! - Tracing initialization

pub mod config;
pub mod db;
pub mod editor;
pub mod error;
pub mod tracing_init;

pub use config::RelayConfig;
pub use editor::Editor;
pub use error::{Error, Result};
