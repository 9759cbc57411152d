//! Commit: generate a message for the staged changes and commit them.

use relay_core::{Error, Result};
use serde::Serialize;
use tracing::info;

use super::WorkflowContext;
use super::steps::{COMMIT, Step, StepTracker};
use crate::annotate;

#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    /// Commit without showing the message for confirmation.
    pub yes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitOutcome {
    /// Full message including trailers.
    pub message: String,
    pub issue: Option<String>,
    pub co_authors: Vec<String>,
}

impl CommitOutcome {
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

/// Run the commit workflow in the context's working directory.
pub async fn commit(ctx: &WorkflowContext, opts: &CommitOptions) -> Result<CommitOutcome> {
    let mut steps = StepTracker::new(COMMIT, ctx.observer.clone());
    let result = run(ctx, opts, &mut steps).await;
    steps.finish(result)
}

async fn run(
    ctx: &WorkflowContext,
    opts: &CommitOptions,
    steps: &mut StepTracker,
) -> Result<CommitOutcome> {
    steps.advance(Step::Init);
    let generator = ctx.generator()?;
    let dir = ctx.cwd.as_path();

    steps.advance(Step::Stage);
    let staged = annotate::staged_changes(dir).await?;
    if staged.is_empty() {
        return Err(Error::missing(
            "No staged changes",
            "Stage your changes first with: git add <files>",
        ));
    }

    steps.advance(Step::Generate);
    let (message, co_authors, branch) = tokio::join!(
        generator.commit_message(&staged.files, &staged.diff),
        annotate::co_authors(dir, &staged.files),
        ctx.worktrees.current_branch(dir),
    );
    let issue = match branch {
        Ok(branch) => annotate::extract_issue_identifier(&branch),
        Err(e) => {
            steps.warn(&format!("Could not read the current branch: {e}"));
            None
        }
    };
    let full = annotate::annotate_message(&message?, issue.as_deref(), &co_authors);

    steps.advance(Step::Preview);
    if !opts.yes && !ctx.prompter.confirm_commit(&full)? {
        return Err(Error::Cancelled);
    }

    steps.advance(Step::Commit);
    annotate::commit(dir, &full).await?;
    info!(issue = ?issue, co_authors = co_authors.len(), "Committed staged changes");

    Ok(CommitOutcome {
        message: full,
        issue,
        co_authors,
    })
}
