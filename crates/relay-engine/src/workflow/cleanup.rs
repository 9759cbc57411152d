//! Cleanup: remove selected working trees and forget them.

use std::path::Path;

use relay_core::{Error, Result};
use serde::Serialize;
use tracing::{info, warn};

use super::WorkflowContext;
use super::steps::{CLEANUP, Step, StepTracker};
use crate::storage::WorktreeListing;
use crate::worktree::WorktreeError;

#[derive(Debug, Clone, Default)]
pub struct CleanupOptions {
    /// Only consider this repository's working trees.
    pub repo: Option<String>,
    /// Discard local changes without asking when git refuses a removal.
    pub force: bool,
}

/// What happened to one selected working tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CleanupResult {
    /// Removed through git, then forgotten.
    Removed { forced: bool },
    /// Directory was already gone; git was pruned and the record forgotten.
    Pruned,
    /// Git refused and the operator declined to force. Record kept.
    Kept { reason: String },
    /// Removal failed. Record kept.
    Failed { reason: String },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupOutcome {
    pub entries: Vec<(WorktreeListing, CleanupResult)>,
}

impl CleanupOutcome {
    pub fn removed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, r)| matches!(r, CleanupResult::Removed { .. } | CleanupResult::Pruned))
            .count()
    }
}

/// Run the cleanup workflow. Nothing recorded is a successful no-op.
pub async fn cleanup(ctx: &WorkflowContext, opts: &CleanupOptions) -> Result<CleanupOutcome> {
    let mut steps = StepTracker::new(CLEANUP, ctx.observer.clone());
    let result = run(ctx, opts, &mut steps).await;
    steps.finish(result)
}

async fn run(
    ctx: &WorkflowContext,
    opts: &CleanupOptions,
    steps: &mut StepTracker,
) -> Result<CleanupOutcome> {
    steps.advance(Step::Select);
    let repo_id = match opts.repo.as_deref() {
        Some(name) => Some(
            ctx.db
                .get_repository_by_name(name)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Repository \"{name}\"")))?
                .id,
        ),
        None => None,
    };

    let listings = ctx.db.list_worktree_listings(repo_id).await?;
    if listings.is_empty() {
        return Ok(CleanupOutcome::default());
    }

    let mut picked = ctx.prompter.select_worktrees(&listings)?;
    picked.sort_unstable();
    picked.dedup();
    picked.retain(|&i| i < listings.len());
    if picked.is_empty() {
        return Ok(CleanupOutcome::default());
    }
    let selected: Vec<WorktreeListing> = picked.iter().map(|&i| listings[i].clone()).collect();

    steps.advance(Step::Remove);
    let mut outcome = CleanupOutcome::default();
    for listing in selected {
        let result = remove_one(ctx, &listing, opts.force, steps).await?;
        outcome.entries.push((listing, result));
    }
    Ok(outcome)
}

/// Remove one working tree. The record is deleted only after git succeeds.
async fn remove_one(
    ctx: &WorkflowContext,
    listing: &WorktreeListing,
    force: bool,
    steps: &StepTracker,
) -> Result<CleanupResult> {
    let wt = &listing.worktree;
    let repo_path = Path::new(&listing.repo_path);
    let path = Path::new(&wt.path);

    if !path.exists() {
        if let Err(e) = ctx.worktrees.prune_worktrees(repo_path).await {
            steps.warn(&format!("{}: {e}", wt.issue_identifier));
            return Ok(CleanupResult::Failed {
                reason: e.to_string(),
            });
        }
        ctx.db.delete_worktree(wt.id).await?;
        info!(identifier = %wt.issue_identifier, "Forgot worktree whose directory was gone");
        return Ok(CleanupResult::Pruned);
    }

    let refusal = match ctx.worktrees.remove_worktree(repo_path, path, false).await {
        Ok(()) => {
            ctx.db.delete_worktree(wt.id).await?;
            return Ok(CleanupResult::Removed { forced: false });
        }
        Err(WorktreeError::WorktreeRemoval(stderr)) => stderr,
        Err(e) => {
            return Ok(CleanupResult::Failed {
                reason: e.to_string(),
            });
        }
    };

    if !force && !ctx.prompter.confirm_force_removal(path, &refusal)? {
        return Ok(CleanupResult::Kept { reason: refusal });
    }

    match ctx.worktrees.remove_worktree(repo_path, path, true).await {
        Ok(()) => {
            ctx.db.delete_worktree(wt.id).await?;
            Ok(CleanupResult::Removed { forced: true })
        }
        Err(e) => {
            warn!(identifier = %wt.issue_identifier, error = %e, "Forced removal failed");
            Ok(CleanupResult::Failed {
                reason: e.to_string(),
            })
        }
    }
}
