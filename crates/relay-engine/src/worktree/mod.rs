//! Git working-tree primitives.
//!
//! Everything here shells out to `git`; nothing touches the catalog. The
//! workflows decide when a tree is recorded or forgotten.

pub(crate) mod git;
mod manager;

pub use manager::{WorktreeError, WorktreeManager, validate_branch};
