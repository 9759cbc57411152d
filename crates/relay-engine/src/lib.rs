//! Relay Engine Library
//!
//! Core functionality behind the `relay` command:
//! - SQLite catalog of repositories, working trees, and settings
//! - Git working-tree primitives
//! - Linear tracker and OpenRouter generator adapters
//! - Editor launcher and the GitHub CLI
//! - Workflow orchestration for create, open, switch, cleanup, commit, and pr

pub mod annotate;
pub mod editor;
pub mod generator;
pub mod hosting;
pub mod storage;
pub mod tracker;
pub mod workflow;
pub mod worktree;

#[cfg(test)]
mod testutil;
