//! Worktree manager: git worktree operations for registered repositories.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::git;

/// Errors from git working-tree operations. Each carries git's stderr.
#[derive(Debug, Error)]
pub enum WorktreeError {
    #[error("Not a git repository: {0}")]
    NotARepository(String),

    #[error("Repository has no commits yet: {0}")]
    EmptyRepository(String),

    #[error("Invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("Branch '{branch}' already exists: {stderr}")]
    BranchExists { branch: String, stderr: String },

    #[error("Base branch '{base}' not found: {stderr}")]
    BaseBranchNotFound { base: String, stderr: String },

    #[error("git worktree add failed: {0}")]
    WorktreeCreation(String),

    #[error("git worktree remove failed: {0}")]
    WorktreeRemoval(String),

    #[error("Startup script '{script}' failed: {stderr}")]
    StartupScript { script: String, stderr: String },

    #[error("Git command failed: {0}")]
    Git(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<WorktreeError> for relay_core::Error {
    fn from(e: WorktreeError) -> Self {
        match e {
            WorktreeError::Io(io) => Self::Io(io),
            other => Self::GitState(other.to_string()),
        }
    }
}

/// Validate a git branch name: alphanumeric, hyphens, underscores, slashes, dots.
/// Rejects path traversal (`..`), leading dashes, and control characters.
pub fn validate_branch(branch: &str) -> Result<(), WorktreeError> {
    if branch.is_empty() {
        return Err(WorktreeError::InvalidBranchName(
            "branch name cannot be empty".into(),
        ));
    }
    if branch.starts_with('-') {
        return Err(WorktreeError::InvalidBranchName(format!(
            "branch name cannot start with a dash: {branch}"
        )));
    }
    if branch.contains("..") {
        return Err(WorktreeError::InvalidBranchName(format!(
            "branch name cannot contain '..': {branch}"
        )));
    }
    if !branch
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
    {
        return Err(WorktreeError::InvalidBranchName(format!(
            "branch name contains invalid characters: {branch}"
        )));
    }
    Ok(())
}

/// Git working-tree operations.
///
/// Stateless; every call names the repository it acts on.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorktreeManager;

impl WorktreeManager {
    pub const fn new() -> Self {
        Self
    }

    /// Create a working tree for a new `branch` forked from `base_branch`.
    ///
    /// The tree lands at `repo_path/worktree_base/branch`; the path is joined,
    /// never normalized.
    pub async fn create_worktree(
        &self,
        repo_path: &Path,
        worktree_base: &str,
        branch: &str,
        base_branch: &str,
    ) -> Result<PathBuf, WorktreeError> {
        debug!(repo_path = %repo_path.display(), worktree_base, branch, base_branch, "create: validating inputs");

        if !repo_path.join(".git").exists() {
            return Err(WorktreeError::NotARepository(
                repo_path.display().to_string(),
            ));
        }
        validate_branch(branch)?;

        let head = git::run(repo_path, &["rev-parse", "HEAD"]).await?;
        if !head.status.success() {
            return Err(WorktreeError::EmptyRepository(git::stderr(&head)));
        }

        let worktree_path = repo_path.join(worktree_base).join(branch);
        debug!(worktree_path = %worktree_path.display(), "create: computed worktree path");

        if let Some(parent) = worktree_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let path_arg = worktree_path.to_string_lossy();
        let output = git::run(
            repo_path,
            &["worktree", "add", &path_arg, "-b", branch, base_branch],
        )
        .await?;

        if !output.status.success() {
            let stderr = git::stderr(&output);
            debug!(stderr = %stderr, "create: git worktree add failed");
            return Err(classify_add_failure(branch, base_branch, stderr));
        }

        info!(
            path = %worktree_path.display(),
            branch,
            base_branch,
            "Created git worktree"
        );
        Ok(worktree_path)
    }

    /// Attach a working tree to the existing local `branch`.
    ///
    /// Used when the branch outlived its tree: the directory was deleted or
    /// the tree was cleaned up. Lands at the same path as [`Self::create_worktree`].
    pub async fn attach_worktree(
        &self,
        repo_path: &Path,
        worktree_base: &str,
        branch: &str,
    ) -> Result<PathBuf, WorktreeError> {
        if !repo_path.join(".git").exists() {
            return Err(WorktreeError::NotARepository(
                repo_path.display().to_string(),
            ));
        }
        validate_branch(branch)?;

        let worktree_path = repo_path.join(worktree_base).join(branch);
        if let Some(parent) = worktree_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let path_arg = worktree_path.to_string_lossy();
        let output = git::run(repo_path, &["worktree", "add", &path_arg, branch]).await?;
        if !output.status.success() {
            let stderr = git::stderr(&output);
            debug!(stderr = %stderr, "attach: git worktree add failed");
            return Err(WorktreeError::WorktreeCreation(stderr));
        }

        info!(path = %worktree_path.display(), branch, "Attached git worktree to existing branch");
        Ok(worktree_path)
    }

    /// Whether `branch` exists as a local branch.
    pub async fn branch_exists(&self, repo_path: &Path, branch: &str) -> Result<bool, WorktreeError> {
        let reference = format!("refs/heads/{branch}");
        let output = git::run(repo_path, &["rev-parse", "--verify", "--quiet", &reference]).await?;
        Ok(output.status.success())
    }

    /// Paths of every working tree git knows about, the main checkout included.
    pub async fn list_worktrees(&self, repo_path: &Path) -> Result<Vec<PathBuf>, WorktreeError> {
        let output = git::run(repo_path, &["worktree", "list", "--porcelain"]).await?;
        if !output.status.success() {
            return Err(WorktreeError::Git(git::stderr(&output)));
        }
        Ok(parse_porcelain(&git::stdout(&output)))
    }

    /// First listed working tree whose path mentions `branch`.
    pub async fn find_worktree_for_branch(
        &self,
        repo_path: &Path,
        branch: &str,
    ) -> Result<Option<PathBuf>, WorktreeError> {
        let found = self
            .list_worktrees(repo_path)
            .await?
            .into_iter()
            .find(|p| p.to_string_lossy().contains(branch));
        debug!(branch, found = ?found, "Looked up existing worktree");
        Ok(found)
    }

    /// Remove a working tree. `force` discards local modifications.
    pub async fn remove_worktree(
        &self,
        repo_path: &Path,
        worktree_path: &Path,
        force: bool,
    ) -> Result<(), WorktreeError> {
        let path_arg = worktree_path.to_string_lossy();
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(&path_arg);

        let output = git::run(repo_path, &args).await?;
        if !output.status.success() {
            let stderr = git::stderr(&output);
            warn!(path = %worktree_path.display(), force, error = %stderr, "git worktree remove failed");
            return Err(WorktreeError::WorktreeRemoval(stderr));
        }

        info!(path = %worktree_path.display(), force, "Removed git worktree");
        Ok(())
    }

    /// Drop git's bookkeeping for working trees whose directories are gone.
    pub async fn prune_worktrees(&self, repo_path: &Path) -> Result<(), WorktreeError> {
        let output = git::run(repo_path, &["worktree", "prune"]).await?;
        if !output.status.success() {
            return Err(WorktreeError::Git(git::stderr(&output)));
        }
        debug!(repo_path = %repo_path.display(), "Pruned worktrees");
        Ok(())
    }

    /// Branch checked out at `path`. Empty on a detached HEAD.
    pub async fn current_branch(&self, path: &Path) -> Result<String, WorktreeError> {
        let output = git::run(path, &["branch", "--show-current"]).await?;
        if !output.status.success() {
            return Err(WorktreeError::Git(git::stderr(&output)));
        }
        Ok(git::stdout(&output))
    }

    /// Run each startup script in the new working tree, stopping at the first
    /// failure.
    ///
    /// Scripts come from the project configuration and run through `sh -c`;
    /// they are trusted the same way a Makefile is.
    pub async fn run_startup_scripts(
        &self,
        worktree_path: &Path,
        scripts: &[String],
    ) -> Result<(), WorktreeError> {
        let shell = if cfg!(windows) { "cmd" } else { "sh" };
        let flag = if cfg!(windows) { "/C" } else { "-c" };

        for script in scripts {
            info!(path = %worktree_path.display(), script = %script, "Running startup script");
            let start = std::time::Instant::now();
            let output = tokio::process::Command::new(shell)
                .args([flag, script])
                .current_dir(worktree_path)
                .output()
                .await?;

            if !output.status.success() {
                return Err(WorktreeError::StartupScript {
                    script: script.clone(),
                    stderr: git::stderr(&output),
                });
            }
            debug!(
                script = %script,
                elapsed_ms = start.elapsed().as_millis(),
                "Startup script completed"
            );
        }
        Ok(())
    }
}

fn classify_add_failure(branch: &str, base_branch: &str, stderr: String) -> WorktreeError {
    if stderr.contains("already exists") {
        WorktreeError::BranchExists {
            branch: branch.to_string(),
            stderr,
        }
    } else if stderr.contains("invalid reference") || stderr.contains("not a valid object name") {
        WorktreeError::BaseBranchNotFound {
            base: base_branch.to_string(),
            stderr,
        }
    } else {
        WorktreeError::WorktreeCreation(stderr)
    }
}

fn parse_porcelain(output: &str) -> Vec<PathBuf> {
    output
        .lines()
        .filter_map(|line| line.strip_prefix("worktree "))
        .map(PathBuf::from)
        .collect()
}
