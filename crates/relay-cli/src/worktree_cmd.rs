//! CLI worktree commands: create, open, switch, list, cleanup, and the bare
//! `relay <task-or-issue-id>` shortcut.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Write};

use relay_core::{Error, Result};
use relay_engine::storage::Database;
use relay_engine::workflow::{
    self, CleanupOptions, CleanupOutcome, CleanupResult, CreateRequest, Target, WorkflowContext,
};
use tracing::debug;

use crate::output::write_outcome;

pub async fn create(ctx: &WorkflowContext, req: &CreateRequest) -> Result<()> {
    let outcome = workflow::create(ctx, req).await?;
    write_outcome(&mut io::stdout(), &outcome)?;
    Ok(())
}

pub async fn open(ctx: &WorkflowContext, identifier: &str, repo: Option<&str>) -> Result<()> {
    let identifier = identifier.trim().to_ascii_uppercase();
    let outcome = workflow::open(ctx, &identifier, repo).await?;
    write_outcome(&mut io::stdout(), &outcome)?;
    Ok(())
}

pub async fn switch(ctx: &WorkflowContext, repo: Option<&str>) -> Result<()> {
    let outcome = workflow::switch(ctx, repo).await?;
    write_outcome(&mut io::stdout(), &outcome)?;
    Ok(())
}

/// `relay <input>`: open an issue identifier, otherwise create from a task.
pub async fn quick(
    ctx: &WorkflowContext,
    input: &str,
    repo: Option<String>,
    yes: bool,
) -> Result<()> {
    match workflow::classify(input) {
        Target::Issue(identifier) => {
            debug!(identifier = %identifier, "Input looks like an issue identifier");
            open(ctx, &identifier, repo.as_deref()).await
        }
        Target::Task(task) => {
            debug!("Input looks like a task description");
            let req = CreateRequest {
                task,
                repo,
                team: None,
                yes,
            };
            create(ctx, &req).await
        }
    }
}

/// `relay list`: every recorded working tree, optionally for one repository.
pub async fn list(db: &Database, repo: Option<&str>) -> Result<()> {
    let repo_id = match repo {
        Some(name) => Some(
            db.get_repository_by_name(name)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Repository \"{name}\"")))?
                .id,
        ),
        None => None,
    };
    let listings = db.list_worktree_listings(repo_id).await?;

    let mut out = io::stdout();
    if listings.is_empty() {
        writeln!(out, "No worktrees found.")?;
        return Ok(());
    }
    writeln!(
        out,
        "{:<10} {:<16} {:<40} PATH",
        "ISSUE", "REPOSITORY", "BRANCH"
    )?;
    for listing in &listings {
        let wt = &listing.worktree;
        let gone = if std::path::Path::new(&wt.path).exists() {
            ""
        } else {
            "  (missing)"
        };
        writeln!(
            out,
            "{:<10} {:<16} {:<40} {}{gone}",
            wt.issue_identifier, listing.repo_name, wt.branch_name, wt.path
        )?;
    }
    writeln!(out, "\n{} worktree(s)", listings.len())?;
    Ok(())
}

pub async fn cleanup(ctx: &WorkflowContext, opts: &CleanupOptions) -> Result<()> {
    let outcome = workflow::cleanup(ctx, opts).await?;
    write_cleanup(&mut io::stdout(), &outcome)?;
    Ok(())
}

fn write_cleanup(w: &mut impl Write, outcome: &CleanupOutcome) -> io::Result<()> {
    if outcome.entries.is_empty() {
        writeln!(w, "Nothing to clean up.")?;
        return Ok(());
    }
    for (listing, result) in &outcome.entries {
        let id = &listing.worktree.issue_identifier;
        match result {
            CleanupResult::Removed { forced: false } => writeln!(w, "✓ Removed {id}")?,
            CleanupResult::Removed { forced: true } => {
                writeln!(w, "✓ Removed {id} (local changes discarded)")?;
            }
            CleanupResult::Pruned => {
                writeln!(w, "✓ Forgot {id} (directory was already gone)")?;
            }
            CleanupResult::Kept { reason } => writeln!(w, "- Kept {id}: {reason}")?,
            CleanupResult::Failed { reason } => writeln!(w, "✗ Failed to remove {id}: {reason}")?,
        }
    }
    writeln!(
        w,
        "\n{} of {} worktree(s) removed",
        outcome.removed_count(),
        outcome.entries.len()
    )?;
    Ok(())
}
