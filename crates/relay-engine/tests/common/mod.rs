//! Stub collaborators and git helpers shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::panic)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use relay_core::{Editor, Error, Result};
use relay_engine::editor::{EditorError, EditorLauncher};
use relay_engine::generator::{Generator, GeneratorError, PullRequestDraft};
use relay_engine::hosting::GhCli;
use relay_engine::storage::{Database, NewRepository, Repository, WorktreeListing};
use relay_engine::tracker::{
    IssueDraft, Label, NewIssue, Project, Team, Tracker, TrackerContext, TrackerError,
    TrackerIssue,
};
use relay_engine::workflow::{Prompter, Step, WorkflowContext, WorkflowObserver};
use relay_engine::worktree::WorktreeManager;

// =============================================================================
// Git
// =============================================================================

pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A committed repository on `main` at `root/name`.
pub fn init_repo(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    git(&dir, &["init", "-q"]);
    git(&dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(&dir, &["config", "user.name", "Relay Test"]);
    git(&dir, &["config", "user.email", "test@relay.dev"]);
    git(&dir, &["config", "commit.gpgsign", "false"]);
    std::fs::write(dir.join("README.md"), "demo\n").unwrap();
    git(&dir, &["add", "README.md"]);
    git(&dir, &["commit", "-q", "-m", "init"]);
    dir
}

pub fn git_worktree_count(repo: &Path) -> usize {
    git(repo, &["worktree", "list", "--porcelain"])
        .lines()
        .filter(|l| l.starts_with("worktree "))
        .count()
}

/// A `gh` stand-in that records its arguments in `gh-args.txt` next to itself
/// and prints a pull request URL.
#[cfg(unix)]
pub fn stub_gh(dir: &Path) -> GhCli {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("gh");
    let log = dir.join("gh-args.txt");
    std::fs::write(
        &path,
        format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\necho https://github.com/acme/demo/pull/7\n",
            log.display()
        ),
    )
    .unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    GhCli::new(path.to_string_lossy())
}

// =============================================================================
// Tracker
// =============================================================================

pub fn issue(identifier: &str, branch: &str, title: &str) -> TrackerIssue {
    TrackerIssue {
        id: format!("uuid-{identifier}"),
        identifier: identifier.into(),
        title: title.into(),
        branch_name: branch.into(),
        url: Some(format!("https://linear.app/acme/issue/{identifier}")),
    }
}

pub fn tracker_context() -> TrackerContext {
    TrackerContext {
        teams: vec![
            Team {
                id: "team-eng".into(),
                name: "Engineering".into(),
                key: "ENG".into(),
            },
            Team {
                id: "team-ops".into(),
                name: "Operations".into(),
                key: "OPS".into(),
            },
        ],
        projects: vec![Project {
            id: "p1".into(),
            name: "Auth".into(),
            description: None,
            team_id: Some("team-eng".into()),
        }],
        labels: vec![Label {
            id: "l1".into(),
            name: "bug".into(),
            description: None,
        }],
    }
}

pub struct StubTracker {
    pub context: TrackerContext,
    /// Returned by `create_issue`.
    pub created: TrackerIssue,
    pub issues: HashMap<String, TrackerIssue>,
    pub assigned: Vec<TrackerIssue>,
    pub create_calls: Mutex<Vec<NewIssue>>,
}

impl StubTracker {
    pub fn new() -> Self {
        Self {
            context: tracker_context(),
            created: issue("ENG-42", "eng-42-fix-login-bug", "Fix login bug"),
            issues: HashMap::new(),
            assigned: Vec::new(),
            create_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_issue(mut self, issue: TrackerIssue) -> Self {
        self.issues.insert(issue.identifier.clone(), issue);
        self
    }

    pub fn create_count(&self) -> usize {
        self.create_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Tracker for StubTracker {
    async fn fetch_context(&self) -> std::result::Result<TrackerContext, TrackerError> {
        Ok(self.context.clone())
    }

    async fn create_issue(
        &self,
        issue: &NewIssue,
    ) -> std::result::Result<TrackerIssue, TrackerError> {
        self.create_calls.lock().unwrap().push(issue.clone());
        Ok(self.created.clone())
    }

    async fn get_issue(
        &self,
        identifier: &str,
    ) -> std::result::Result<Option<TrackerIssue>, TrackerError> {
        Ok(self.issues.get(identifier).cloned())
    }

    async fn my_issues(&self) -> std::result::Result<Vec<TrackerIssue>, TrackerError> {
        Ok(self.assigned.clone())
    }
}

// =============================================================================
// Generator
// =============================================================================

pub struct StubGenerator {
    pub commit_message: String,
}

impl StubGenerator {
    pub fn new() -> Self {
        Self {
            commit_message: "fix(auth): handle expired tokens".into(),
        }
    }
}

#[async_trait]
impl Generator for StubGenerator {
    async fn draft_issue(
        &self,
        task: &str,
        _context: &TrackerContext,
    ) -> std::result::Result<IssueDraft, GeneratorError> {
        Ok(IssueDraft {
            title: task.to_string(),
            description: format!("Do this: {task}"),
            project_id: Some("p1".into()),
            label_ids: vec!["l1".into()],
            priority: 3,
            assignee_id: None,
        })
    }

    async fn commit_message(
        &self,
        _files: &[String],
        _diff: &str,
    ) -> std::result::Result<String, GeneratorError> {
        Ok(self.commit_message.clone())
    }

    async fn pull_request(
        &self,
        commits: &[String],
        files: &[String],
        _diff: &str,
    ) -> std::result::Result<PullRequestDraft, GeneratorError> {
        Ok(PullRequestDraft {
            title: "fix(auth): handle expired tokens".into(),
            body: format!("{} commit(s) touching {}", commits.len(), files.join(", ")),
        })
    }
}

// =============================================================================
// Editor
// =============================================================================

#[derive(Default)]
pub struct RecordingEditor {
    pub opened: Mutex<Vec<(Editor, PathBuf)>>,
    pub fail: bool,
}

impl RecordingEditor {
    pub fn failing() -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn opened(&self) -> Vec<(Editor, PathBuf)> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl EditorLauncher for RecordingEditor {
    async fn open(&self, editor: Editor, path: &Path) -> std::result::Result<(), EditorError> {
        if self.fail {
            return Err(EditorError::NotInstalled {
                command: editor.command().into(),
            });
        }
        self.opened
            .lock()
            .unwrap()
            .push((editor, path.to_path_buf()));
        Ok(())
    }
}

// =============================================================================
// Prompter
// =============================================================================

pub struct ScriptedPrompter {
    pub repo_index: usize,
    pub issue_index: usize,
    pub confirm_issue: bool,
    pub worktrees: Vec<usize>,
    pub confirm_force: bool,
    pub confirm_commit: bool,
    pub confirm_pull_request: bool,
    pub asked: Mutex<Vec<&'static str>>,
}

impl Default for ScriptedPrompter {
    fn default() -> Self {
        Self {
            repo_index: 0,
            issue_index: 0,
            confirm_issue: true,
            worktrees: vec![0],
            confirm_force: false,
            confirm_commit: true,
            confirm_pull_request: true,
            asked: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedPrompter {
    pub fn asked(&self) -> Vec<&'static str> {
        self.asked.lock().unwrap().clone()
    }

    fn ask(&self, what: &'static str) {
        self.asked.lock().unwrap().push(what);
    }
}

impl Prompter for ScriptedPrompter {
    fn select_repository(&self, _repos: &[Repository]) -> Result<usize> {
        self.ask("repository");
        Ok(self.repo_index)
    }

    fn select_issue(&self, _issues: &[TrackerIssue]) -> Result<usize> {
        self.ask("issue");
        Ok(self.issue_index)
    }

    fn confirm_issue(
        &self,
        _draft: &IssueDraft,
        _team: &Team,
        _context: &TrackerContext,
    ) -> Result<bool> {
        self.ask("confirm_issue");
        Ok(self.confirm_issue)
    }

    fn select_worktrees(&self, _worktrees: &[WorktreeListing]) -> Result<Vec<usize>> {
        self.ask("worktrees");
        Ok(self.worktrees.clone())
    }

    fn confirm_force_removal(&self, _path: &Path, _reason: &str) -> Result<bool> {
        self.ask("force");
        Ok(self.confirm_force)
    }

    fn confirm_commit(&self, _message: &str) -> Result<bool> {
        self.ask("commit");
        if self.confirm_commit {
            Ok(true)
        } else {
            Err(Error::Cancelled)
        }
    }

    fn confirm_pull_request(&self, _draft: &PullRequestDraft, _base: &str) -> Result<bool> {
        self.ask("pull_request");
        Ok(self.confirm_pull_request)
    }
}

// =============================================================================
// Observer
// =============================================================================

#[derive(Default)]
pub struct StepRecorder {
    pub steps: Mutex<Vec<Step>>,
    pub warnings: Mutex<Vec<String>>,
}

impl StepRecorder {
    pub fn steps(&self) -> Vec<Step> {
        self.steps.lock().unwrap().clone()
    }
}

impl WorkflowObserver for StepRecorder {
    fn on_step(&self, _workflow: &'static str, step: Step) {
        self.steps.lock().unwrap().push(step);
    }

    fn on_warning(&self, _workflow: &'static str, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub tmp: tempfile::TempDir,
    pub db: Database,
    pub tracker: Arc<StubTracker>,
    pub generator: Arc<StubGenerator>,
    pub editor: Arc<RecordingEditor>,
    pub prompter: Arc<ScriptedPrompter>,
    pub observer: Arc<StepRecorder>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with(StubTracker::new(), ScriptedPrompter::default()).await
    }

    pub async fn with(tracker: StubTracker, prompter: ScriptedPrompter) -> Self {
        Self {
            tmp: tempfile::tempdir().unwrap(),
            db: Database::open_in_memory().await.unwrap(),
            tracker: Arc::new(tracker),
            generator: Arc::new(StubGenerator::new()),
            editor: Arc::new(RecordingEditor::default()),
            prompter: Arc::new(prompter),
            observer: Arc::new(StepRecorder::default()),
        }
    }

    /// Register a fresh git repository named `name`.
    pub async fn add_repo(&self, name: &str) -> Repository {
        let path = init_repo(self.tmp.path(), name);
        self.db
            .create_repository(&NewRepository {
                name,
                path: &path.to_string_lossy(),
                worktree_base: None,
                editor: None,
            })
            .await
            .unwrap()
    }

    pub fn context(&self) -> WorkflowContext {
        WorkflowContext {
            db: self.db.clone(),
            worktrees: WorktreeManager::new(),
            hosting: GhCli::default(),
            tracker: Some(self.tracker.clone()),
            generator: Some(self.generator.clone()),
            editor: self.editor.clone(),
            prompter: self.prompter.clone(),
            observer: self.observer.clone(),
            config: None,
            cwd: self.tmp.path().to_path_buf(),
        }
    }
}
