//! Pull request: draft a title and description for the current branch and
//! open it with `gh`.

use relay_core::{Error, Result};
use serde::Serialize;
use tracing::info;

use super::WorkflowContext;
use super::steps::{PULL_REQUEST, Step, StepTracker};
use crate::annotate;
use crate::generator::PullRequestDraft;

#[derive(Debug, Clone, Default)]
pub struct PullRequestOptions {
    /// Open without showing the draft for confirmation.
    pub yes: bool,
    /// Target branch. Defaults to the project's base branch.
    pub base: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestOutcome {
    pub url: String,
    pub base: String,
    pub branch: String,
    pub draft: PullRequestDraft,
    pub issue: Option<String>,
    /// Recent authors of the changed files, as suggestions only.
    pub reviewers: Vec<String>,
    pub commits: usize,
}

/// Run the pull request workflow for the branch checked out in the context's
/// working directory.
pub async fn pull_request(
    ctx: &WorkflowContext,
    opts: &PullRequestOptions,
) -> Result<PullRequestOutcome> {
    let mut steps = StepTracker::new(PULL_REQUEST, ctx.observer.clone());
    let result = run(ctx, opts, &mut steps).await;
    steps.finish(result)
}

async fn run(
    ctx: &WorkflowContext,
    opts: &PullRequestOptions,
    steps: &mut StepTracker,
) -> Result<PullRequestOutcome> {
    steps.advance(Step::Init);
    let generator = ctx.generator()?;
    let dir = ctx.cwd.as_path();
    let base = opts
        .base
        .clone()
        .unwrap_or_else(|| ctx.base_branch().to_string());

    let branch = ctx.worktrees.current_branch(dir).await?;
    if branch.is_empty() {
        return Err(Error::GitState(
            "HEAD is detached; check out a feature branch first".into(),
        ));
    }
    if branch == base {
        return Err(Error::GitState(format!(
            "You're on {base}; switch to a feature branch first"
        )));
    }

    steps.advance(Step::Collect);
    let changes = annotate::changes_since(dir, &base).await?;
    if changes.commits.is_empty() {
        return Err(Error::missing(
            format!("No commits on {branch} compared to {base}"),
            "Commit your work first with: relay commit",
        ));
    }

    steps.advance(Step::DraftPullRequest);
    let (draft, reviewers) = tokio::join!(
        generator.pull_request(&changes.commits, &changes.files, &changes.diff),
        annotate::reviewers(dir, &changes.files),
    );
    let mut draft = draft?;
    let issue = annotate::extract_issue_identifier(&branch);
    draft.body = annotate::link_issue(&draft.body, issue.as_deref());

    steps.advance(Step::Preview);
    if !opts.yes && !ctx.prompter.confirm_pull_request(&draft, &base)? {
        return Err(Error::Cancelled);
    }

    steps.advance(Step::Publish);
    let url = ctx
        .hosting
        .create_pull_request(dir, &base, &draft.title, &draft.body)
        .await?;
    info!(url = %url, branch = %branch, base = %base, issue = ?issue, "Pull request workflow complete");

    Ok(PullRequestOutcome {
        url,
        base,
        branch,
        draft,
        issue,
        reviewers,
        commits: changes.commits.len(),
    })
}
