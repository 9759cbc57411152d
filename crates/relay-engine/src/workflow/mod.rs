//! Workflow orchestration.
//!
//! Each command is a linear state machine ([`steps`]) that talks to the
//! catalog, the tracker, the generator, git, and the editor in a fixed order.
//! Nothing is retried. A remote issue, once created, is never rolled back;
//! later failures surface as [`Error::PartialSuccess`] naming the issue.

mod cleanup;
mod commit;
mod create;
mod open;
mod pr;
pub mod steps;

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use relay_core::config::{DEFAULT_BASE_BRANCH, DEFAULT_WORKTREE_BASE};
use relay_core::{Editor, Error, RelayConfig, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::editor::EditorLauncher;
use crate::generator::{Generator, PullRequestDraft};
use crate::hosting::GhCli;
use crate::storage::{Database, NewWorktree, Repository, Worktree, WorktreeListing};
use crate::tracker::{IssueDraft, Team, Tracker, TrackerContext, TrackerIssue};
use crate::worktree::WorktreeManager;

pub use cleanup::{CleanupOptions, CleanupOutcome, CleanupResult, cleanup};
pub use commit::{CommitOptions, CommitOutcome, commit};
pub use create::{CreateRequest, create};
pub use open::{open, switch};
pub use pr::{PullRequestOptions, PullRequestOutcome, pull_request};
pub use steps::{NoopObserver, Step, StepTracker, WorkflowObserver};

static ISSUE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+-\d+$").expect("static regex is valid"));

/// What a bare `relay <input>` refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Existing issue identifier, uppercased (`ENG-42`).
    Issue(String),
    /// Free-form task description for a new issue.
    Task(String),
}

/// Classify user input as an issue identifier or a task description.
pub fn classify(input: &str) -> Target {
    let trimmed = input.trim();
    if ISSUE_ID_RE.is_match(trimmed) {
        Target::Issue(trimmed.to_ascii_uppercase())
    } else {
        Target::Task(trimmed.to_string())
    }
}

/// Interactive decisions. Implementations may block on the terminal.
///
/// Returning [`Error::Cancelled`] aborts the workflow before its next mutation.
pub trait Prompter: Send + Sync {
    /// Index into `repos`.
    fn select_repository(&self, repos: &[Repository]) -> Result<usize>;

    /// Index into `issues`.
    fn select_issue(&self, issues: &[TrackerIssue]) -> Result<usize>;

    /// Whether to create the drafted issue.
    fn confirm_issue(
        &self,
        draft: &IssueDraft,
        team: &Team,
        context: &TrackerContext,
    ) -> Result<bool>;

    /// Indices into `worktrees` to remove.
    fn select_worktrees(&self, worktrees: &[WorktreeListing]) -> Result<Vec<usize>>;

    /// Whether to discard local changes in `path`, which git refused to remove.
    fn confirm_force_removal(&self, path: &Path, reason: &str) -> Result<bool>;

    /// Whether to commit with `message`.
    fn confirm_commit(&self, message: &str) -> Result<bool>;

    /// Whether to open the drafted pull request into `base`.
    fn confirm_pull_request(&self, draft: &PullRequestDraft, base: &str) -> Result<bool>;
}

/// Collaborators shared by every workflow.
///
/// The tracker and generator are absent when their API keys are not stored;
/// workflows that need them fail with a hint naming the setup command.
#[derive(Clone)]
pub struct WorkflowContext {
    pub db: Database,
    pub worktrees: WorktreeManager,
    pub hosting: GhCli,
    pub tracker: Option<Arc<dyn Tracker>>,
    pub generator: Option<Arc<dyn Generator>>,
    pub editor: Arc<dyn EditorLauncher>,
    pub prompter: Arc<dyn Prompter>,
    pub observer: Arc<dyn WorkflowObserver>,
    /// Nearest `.relay/relay-config.json`, if any.
    pub config: Option<RelayConfig>,
    /// Directory the command runs in.
    pub cwd: PathBuf,
}

/// Summary of a create, open, or switch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorktreeOutcome {
    pub repository: String,
    pub identifier: String,
    pub title: String,
    pub branch: String,
    pub path: PathBuf,
    pub url: Option<String>,
    pub editor: Editor,
    /// An existing working tree was opened instead of creating one.
    pub reused: bool,
}

impl WorkflowContext {
    pub(crate) fn tracker(&self) -> Result<Arc<dyn Tracker>> {
        self.tracker.clone().ok_or_else(|| {
            Error::missing(
                "Linear API key not found",
                "Run: relay config set-key linear <key> (or relay setup)",
            )
        })
    }

    pub(crate) fn generator(&self) -> Result<Arc<dyn Generator>> {
        self.generator.clone().ok_or_else(|| {
            Error::missing(
                "OpenRouter API key not found",
                "Run: relay config set-key openrouter <key> (or relay setup)",
            )
        })
    }

    /// Explicit name, else the only repository, else the one the project
    /// config points at, else ask.
    pub async fn resolve_repository(&self, name: Option<&str>) -> Result<Repository> {
        if let Some(name) = name {
            return self
                .db
                .get_repository_by_name(name)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Repository \"{name}\"")));
        }

        let mut repos = self.db.list_repositories().await?;
        match repos.len() {
            0 => Err(Error::missing(
                "No repositories found",
                "Add one with: relay repo add",
            )),
            1 => Ok(repos.remove(0)),
            _ => {
                if let Some(config) = &self.config {
                    if let Some(idx) = repos.iter().position(|r| r.path == config.repo_base) {
                        debug!(repo = %repos[idx].name, "Repository chosen by project config");
                        return Ok(repos.remove(idx));
                    }
                }
                let idx = self.prompter.select_repository(&repos)?;
                if idx >= repos.len() {
                    return Err(Error::Cancelled);
                }
                Ok(repos.remove(idx))
            }
        }
    }

    /// Repository editor, then project config, then the stored default, then
    /// the fallback.
    pub async fn choose_editor(&self, repo: &Repository) -> Result<Editor> {
        if let Some(editor) = repo.editor {
            return Ok(editor);
        }
        if let Some(editor) = self.config.as_ref().and_then(|c| c.editor) {
            return Ok(editor);
        }
        Ok(self.db.default_editor().await?.unwrap_or(Editor::FALLBACK))
    }

    pub(crate) fn base_branch(&self) -> &str {
        self.config
            .as_ref()
            .map_or(DEFAULT_BASE_BRANCH, |c| c.base_branch.as_str())
    }

    /// Where `repo`'s working trees go. A base set on the repository wins;
    /// otherwise the project config of that same checkout may move it.
    pub fn worktree_base<'a>(&'a self, repo: &'a Repository) -> &'a str {
        if repo.worktree_base != DEFAULT_WORKTREE_BASE {
            return &repo.worktree_base;
        }
        self.config
            .as_ref()
            .filter(|c| c.repo_base == repo.path)
            .map_or(repo.worktree_base.as_str(), |c| c.worktree_base.as_str())
    }

    pub(crate) fn startup_scripts(&self) -> &[String] {
        self.config
            .as_ref()
            .map(|c| c.startup_scripts.as_slice())
            .unwrap_or_default()
    }

    /// Create the working tree for `issue` and record it.
    ///
    /// With `reuse_branch`, a local branch that outlived its tree is checked
    /// out again instead of failing as already existing.
    pub(crate) async fn materialize(
        &self,
        repo: &Repository,
        issue: &TrackerIssue,
        steps: &StepTracker,
        reuse_branch: bool,
    ) -> Result<PathBuf> {
        let base = self.worktree_base(repo);
        let attach = reuse_branch
            && self
                .worktrees
                .branch_exists(&repo.path, &issue.branch_name)
                .await?;

        let path = if attach {
            debug!(branch = %issue.branch_name, "Branch already exists, attaching a worktree");
            self.worktrees
                .attach_worktree(&repo.path, base, &issue.branch_name)
                .await?
        } else {
            self.worktrees
                .create_worktree(&repo.path, base, &issue.branch_name, self.base_branch())
                .await?
        };

        self.record(repo, issue, &path).await?;

        if let Err(e) = self
            .worktrees
            .run_startup_scripts(&path, self.startup_scripts())
            .await
        {
            steps.warn(&e.to_string());
        }
        Ok(path)
    }

    /// Ensure a catalog row exists for `issue`'s branch at `path`.
    pub(crate) async fn record(
        &self,
        repo: &Repository,
        issue: &TrackerIssue,
        path: &Path,
    ) -> Result<Worktree> {
        let path_str = path.to_string_lossy();
        if let Some(existing) = self
            .db
            .find_worktree_by_branch(repo.id, &issue.branch_name)
            .await?
        {
            if same_location(Path::new(&existing.path), path).await {
                return Ok(existing);
            }
            debug!(stale = %existing.path, "Replacing stale worktree record");
            self.db.delete_worktree(existing.id).await?;
        }

        let wt = self
            .db
            .create_worktree(&NewWorktree {
                repo_id: repo.id,
                issue_id: &issue.id,
                issue_identifier: &issue.identifier,
                issue_title: Some(&issue.title),
                branch_name: &issue.branch_name,
                path: &path_str,
            })
            .await?;
        info!(identifier = %issue.identifier, path = %wt.path, "Recorded worktree");
        Ok(wt)
    }
}

/// Equal paths, or both resolve to the same directory. git lists trees by
/// their canonical path while creation records the joined one.
async fn same_location(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match tokio::join!(tokio::fs::canonicalize(a), tokio::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn joined_and_canonical_paths_match() {
        let tmp = tempfile::tempdir().unwrap();
        let tree = tmp.path().join("worktrees/eng-7");
        std::fs::create_dir_all(&tree).unwrap();
        std::fs::create_dir_all(tmp.path().join("demo")).unwrap();
        let joined = tmp.path().join("demo/../worktrees/eng-7");

        assert!(same_location(&joined, &tree.canonicalize().unwrap()).await);
        assert!(same_location(&joined, &joined).await);
        assert!(!same_location(&joined, &tmp.path().join("demo")).await);
        assert!(!same_location(&tmp.path().join("gone"), &tree).await);
    }

    #[test]
    fn classify_identifiers() {
        assert_eq!(classify("ENG-42"), Target::Issue("ENG-42".into()));
        assert_eq!(classify("eng-42"), Target::Issue("ENG-42".into()));
        assert_eq!(classify("  Ops-7 "), Target::Issue("OPS-7".into()));
    }

    #[test]
    fn classify_tasks() {
        assert_eq!(
            classify("fix login bug"),
            Target::Task("fix login bug".into())
        );
        assert_eq!(classify("ENG-42 fix"), Target::Task("ENG-42 fix".into()));
        assert_eq!(classify("ENG42"), Target::Task("ENG42".into()));
        assert_eq!(classify("42-ENG"), Target::Task("42-ENG".into()));
    }
}
