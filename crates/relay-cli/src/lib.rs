//! relay CLI
//!
//! Command surface over `relay-engine`: argument parsing, interactive
//! prompts, and terminal output. Workflow logic lives in the engine.

pub mod commit_cmd;
pub mod config_cmd;
pub mod context;
pub mod output;
pub mod pr_cmd;
pub mod prompt;
pub mod repo_cmd;
pub mod setup;
pub mod worktree_cmd;
