//! Open and switch: bring up the working tree of an existing issue.

use relay_core::{Error, Result};
use tracing::{debug, info};

use super::steps::{OPEN, SWITCH, Step, StepTracker};
use super::{WorkflowContext, WorktreeOutcome};
use crate::storage::Repository;
use crate::tracker::TrackerIssue;

/// Open the working tree for `identifier`, creating it if git has none.
pub async fn open(
    ctx: &WorkflowContext,
    identifier: &str,
    repo: Option<&str>,
) -> Result<WorktreeOutcome> {
    let mut steps = StepTracker::new(OPEN, ctx.observer.clone());
    let result = run_open(ctx, identifier, repo, &mut steps).await;
    steps.finish(result)
}

/// Pick one of the operator's assigned issues and open its working tree.
pub async fn switch(ctx: &WorkflowContext, repo: Option<&str>) -> Result<WorktreeOutcome> {
    let mut steps = StepTracker::new(SWITCH, ctx.observer.clone());
    let result = run_switch(ctx, repo, &mut steps).await;
    steps.finish(result)
}

async fn run_open(
    ctx: &WorkflowContext,
    identifier: &str,
    repo: Option<&str>,
    steps: &mut StepTracker,
) -> Result<WorktreeOutcome> {
    steps.advance(Step::Init);
    let tracker = ctx.tracker()?;

    steps.advance(Step::SelectRepo);
    let repo = ctx.resolve_repository(repo).await?;

    steps.advance(Step::FetchIssue);
    let issue = tracker
        .get_issue(identifier)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Issue {identifier}")))?;

    bring_up(ctx, repo, issue, steps).await
}

async fn run_switch(
    ctx: &WorkflowContext,
    repo: Option<&str>,
    steps: &mut StepTracker,
) -> Result<WorktreeOutcome> {
    steps.advance(Step::Init);
    let tracker = ctx.tracker()?;

    steps.advance(Step::SelectRepo);
    let repo = ctx.resolve_repository(repo).await?;

    steps.advance(Step::SelectIssue);
    let mut issues = tracker.my_issues().await?;
    if issues.is_empty() {
        return Err(Error::missing(
            "No assigned issues found",
            "Create one with: relay create \"<task>\"",
        ));
    }
    let idx = ctx.prompter.select_issue(&issues)?;
    if idx >= issues.len() {
        return Err(Error::Cancelled);
    }
    let issue = issues.swap_remove(idx);

    bring_up(ctx, repo, issue, steps).await
}

/// Shared tail: reuse a listed working tree or create one, then open it.
async fn bring_up(
    ctx: &WorkflowContext,
    repo: Repository,
    issue: TrackerIssue,
    steps: &mut StepTracker,
) -> Result<WorktreeOutcome> {
    steps.advance(Step::CheckExisting);
    let mut existing = ctx
        .worktrees
        .find_worktree_for_branch(&repo.path, &issue.branch_name)
        .await?;

    if let Some(path) = existing.as_ref().filter(|p| !p.exists()) {
        debug!(path = %path.display(), "Listed worktree is gone from disk, pruning");
        ctx.worktrees.prune_worktrees(&repo.path).await?;
        existing = None;
    }

    let (path, reused) = if let Some(path) = existing {
        info!(identifier = %issue.identifier, path = %path.display(), "Reusing existing worktree");
        ctx.record(&repo, &issue, &path).await?;
        (path, true)
    } else {
        steps.advance(Step::CreateWorktree);
        (ctx.materialize(&repo, &issue, steps, true).await?, false)
    };

    steps.advance(Step::OpenEditor);
    let editor = ctx.choose_editor(&repo).await?;
    ctx.editor.open(editor, &path).await?;

    Ok(WorktreeOutcome {
        repository: repo.name,
        identifier: issue.identifier,
        title: issue.title,
        branch: issue.branch_name,
        path,
        url: issue.url,
        editor,
        reused,
    })
}
