//! Create-from-task: draft an issue, create it, and open a working tree.

use relay_core::{Error, Result};
use tracing::{debug, info};

use super::steps::{CREATE, Step, StepTracker};
use super::{WorkflowContext, WorktreeOutcome};
use crate::tracker::{NewIssue, Team, TrackerContext};

/// Inputs of `relay create`.
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    pub task: String,
    pub repo: Option<String>,
    /// Team key (`ENG`).
    pub team: Option<String>,
    /// Skip the draft confirmation.
    pub yes: bool,
}

/// `--team` key, then the stored default team id, then the project config's
/// team key, then the first team.
async fn select_team(
    ctx: &WorkflowContext,
    context: &TrackerContext,
    requested: Option<&str>,
) -> Result<Team> {
    if context.teams.is_empty() {
        return Err(Error::missing(
            "No teams found in your Linear workspace",
            "Create a team in Linear first, then re-run this command",
        ));
    }

    if let Some(key) = requested {
        return context.team_by_key(key).cloned().ok_or_else(|| {
            Error::missing(
                format!("Team \"{key}\" not found"),
                format!("Available teams: {}", context.team_keys()),
            )
        });
    }

    if let Some(id) = ctx.db.default_team_id().await? {
        if let Some(team) = context.team_by_id(&id) {
            return Ok(team.clone());
        }
        debug!(team_id = %id, "Stored default team is not visible, ignoring");
    }

    if let Some(key) = ctx.config.as_ref().and_then(|c| c.default_team.as_deref()) {
        if let Some(team) = context.team_by_key(key) {
            return Ok(team.clone());
        }
        debug!(team = key, "Configured default team is not visible, ignoring");
    }

    Ok(context.teams[0].clone())
}

/// Run the create workflow.
pub async fn create(ctx: &WorkflowContext, req: &CreateRequest) -> Result<WorktreeOutcome> {
    let mut steps = StepTracker::new(CREATE, ctx.observer.clone());
    let result = run(ctx, req, &mut steps).await;
    steps.finish(result)
}

async fn run(
    ctx: &WorkflowContext,
    req: &CreateRequest,
    steps: &mut StepTracker,
) -> Result<WorktreeOutcome> {
    steps.advance(Step::Init);
    let task = req.task.trim();
    if task.is_empty() {
        return Err(Error::Config("Task description is empty".into()));
    }
    let generator = ctx.generator()?;
    let tracker = ctx.tracker()?;

    steps.advance(Step::SelectRepo);
    let repo = ctx.resolve_repository(req.repo.as_deref()).await?;

    steps.advance(Step::FetchContext);
    let context = tracker.fetch_context().await?;
    let team = select_team(ctx, &context, req.team.as_deref()).await?;
    debug!(team = %team.key, repo = %repo.name, "Create: team and repository chosen");

    steps.advance(Step::Analyze);
    let draft = generator.draft_issue(task, &context).await?;

    steps.advance(Step::Preview);
    if !req.yes && !ctx.prompter.confirm_issue(&draft, &team, &context)? {
        return Err(Error::Cancelled);
    }

    // Past this point the remote issue exists; local failures are partial.
    steps.advance(Step::CreateIssue);
    let issue = tracker
        .create_issue(&NewIssue {
            team_id: team.id.clone(),
            draft,
        })
        .await?;
    let partial = |source: Error| Error::PartialSuccess {
        identifier: issue.identifier.clone(),
        source: Box::new(source),
    };

    steps.advance(Step::MaterializeWorktree);
    let path = ctx
        .materialize(&repo, &issue, steps, false)
        .await
        .map_err(partial)?;

    steps.advance(Step::OpenEditor);
    let editor = ctx.choose_editor(&repo).await.map_err(partial)?;
    ctx.editor
        .open(editor, &path)
        .await
        .map_err(|e| partial(e.into()))?;

    info!(identifier = %issue.identifier, path = %path.display(), "Create workflow complete");
    Ok(WorktreeOutcome {
        repository: repo.name,
        identifier: issue.identifier,
        title: issue.title,
        branch: issue.branch_name,
        path,
        url: issue.url,
        editor,
        reused: false,
    })
}
