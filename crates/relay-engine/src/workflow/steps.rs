//! Workflow steps and the tracker that enforces their order.

use std::fmt;
use std::sync::Arc;

use relay_core::Error;
use tracing::{debug, warn};

/// A step of some workflow. Each workflow walks a fixed subsequence of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Init,
    SelectRepo,
    FetchContext,
    Analyze,
    Preview,
    CreateIssue,
    MaterializeWorktree,
    FetchIssue,
    SelectIssue,
    CheckExisting,
    CreateWorktree,
    OpenEditor,
    Select,
    Remove,
    Stage,
    Generate,
    Commit,
    Collect,
    DraftPullRequest,
    Publish,
    Complete,
    Error,
}

impl Step {
    /// Progress line shown while the step runs.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Init => "Checking configuration",
            Self::SelectRepo => "Selecting repository",
            Self::FetchContext => "Fetching tracker context",
            Self::Analyze => "Drafting issue",
            Self::Preview => "Reviewing draft",
            Self::CreateIssue => "Creating issue",
            Self::MaterializeWorktree | Self::CreateWorktree => "Creating worktree",
            Self::FetchIssue => "Fetching issue",
            Self::SelectIssue => "Selecting issue",
            Self::CheckExisting => "Looking for an existing worktree",
            Self::OpenEditor => "Opening editor",
            Self::Select => "Selecting worktrees",
            Self::Remove => "Removing worktrees",
            Self::Stage => "Reading staged changes",
            Self::Generate => "Drafting commit message",
            Self::Commit => "Committing",
            Self::Collect => "Collecting commits since the base branch",
            Self::DraftPullRequest => "Drafting pull request",
            Self::Publish => "Opening pull request",
            Self::Complete => "Done",
            Self::Error => "Failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A workflow's name and its linear step order, terminal `Complete` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Workflow {
    pub name: &'static str,
    pub steps: &'static [Step],
}

pub const CREATE: Workflow = Workflow {
    name: "create",
    steps: &[
        Step::Init,
        Step::SelectRepo,
        Step::FetchContext,
        Step::Analyze,
        Step::Preview,
        Step::CreateIssue,
        Step::MaterializeWorktree,
        Step::OpenEditor,
        Step::Complete,
    ],
};

pub const OPEN: Workflow = Workflow {
    name: "open",
    steps: &[
        Step::Init,
        Step::SelectRepo,
        Step::FetchIssue,
        Step::CheckExisting,
        Step::CreateWorktree,
        Step::OpenEditor,
        Step::Complete,
    ],
};

pub const SWITCH: Workflow = Workflow {
    name: "switch",
    steps: &[
        Step::Init,
        Step::SelectRepo,
        Step::SelectIssue,
        Step::CheckExisting,
        Step::CreateWorktree,
        Step::OpenEditor,
        Step::Complete,
    ],
};

pub const CLEANUP: Workflow = Workflow {
    name: "cleanup",
    steps: &[Step::Select, Step::Remove, Step::Complete],
};

pub const COMMIT: Workflow = Workflow {
    name: "commit",
    steps: &[
        Step::Init,
        Step::Stage,
        Step::Generate,
        Step::Preview,
        Step::Commit,
        Step::Complete,
    ],
};

pub const PULL_REQUEST: Workflow = Workflow {
    name: "pr",
    steps: &[
        Step::Init,
        Step::Collect,
        Step::DraftPullRequest,
        Step::Preview,
        Step::Publish,
        Step::Complete,
    ],
};

/// Receives step transitions and non-fatal warnings.
pub trait WorkflowObserver: Send + Sync {
    fn on_step(&self, workflow: &'static str, step: Step);

    fn on_warning(&self, _workflow: &'static str, _message: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl WorkflowObserver for NoopObserver {
    fn on_step(&self, _workflow: &'static str, _step: Step) {}
}

/// Walks a [`Workflow`] forward, one step at a time.
///
/// Steps may be skipped but never revisited; once `Complete` or `Error` is
/// reached nothing moves.
pub struct StepTracker {
    workflow: Workflow,
    current: Option<Step>,
    position: usize,
    history: Vec<Step>,
    observer: Arc<dyn WorkflowObserver>,
}

impl StepTracker {
    pub fn new(workflow: Workflow, observer: Arc<dyn WorkflowObserver>) -> Self {
        Self {
            workflow,
            current: None,
            position: 0,
            history: Vec::new(),
            observer,
        }
    }

    pub const fn current(&self) -> Option<Step> {
        self.current
    }

    /// Every step entered so far, in order.
    pub fn history(&self) -> &[Step] {
        &self.history
    }

    /// Enter `step`. Returns `false` (and stays put) for a backward or unknown
    /// step, or after a terminal state.
    pub fn advance(&mut self, step: Step) -> bool {
        if self.current.is_some_and(Step::is_terminal) {
            warn!(workflow = self.workflow.name, ?step, "Ignoring step after terminal state");
            return false;
        }
        let Some(offset) = self.workflow.steps[self.position..]
            .iter()
            .position(|s| *s == step)
        else {
            warn!(workflow = self.workflow.name, ?step, current = ?self.current, "Invalid step transition");
            return false;
        };

        self.position += offset + 1;
        self.enter(step);
        true
    }

    /// Settle a finished run: `Complete` on success, `Error` otherwise.
    pub fn finish<T>(&mut self, result: Result<T, Error>) -> Result<T, Error> {
        match &result {
            Ok(_) => {
                self.advance(Step::Complete);
            }
            Err(e) => {
                debug!(workflow = self.workflow.name, error = %e, "Workflow failed");
                if !self.current.is_some_and(Step::is_terminal) {
                    self.enter(Step::Error);
                }
            }
        }
        result
    }

    /// Forward a non-fatal problem to the observer.
    pub fn warn(&self, message: &str) {
        warn!(workflow = self.workflow.name, message, "Workflow warning");
        self.observer.on_warning(self.workflow.name, message);
    }

    fn enter(&mut self, step: Step) {
        debug!(workflow = self.workflow.name, ?step, "Entering step");
        self.current = Some(step);
        self.history.push(step);
        self.observer.on_step(self.workflow.name, step);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Step>>);

    impl WorkflowObserver for Recorder {
        fn on_step(&self, _workflow: &'static str, step: Step) {
            if let Ok(mut steps) = self.0.lock() {
                steps.push(step);
            }
        }
    }

    #[test]
    fn every_workflow_ends_in_complete() {
        for wf in [CREATE, OPEN, SWITCH, CLEANUP, COMMIT, PULL_REQUEST] {
            assert_eq!(wf.steps.last(), Some(&Step::Complete), "{}", wf.name);
            assert!(!wf.steps.contains(&Step::Error));
        }
    }

    #[test]
    fn linear_progress_is_reported() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker = StepTracker::new(CLEANUP, recorder.clone());
        assert!(tracker.advance(Step::Select));
        assert!(tracker.advance(Step::Remove));
        let result: Result<(), Error> = tracker.finish(Ok(()));
        assert!(result.is_ok());
        assert_eq!(tracker.current(), Some(Step::Complete));
        let seen = recorder.0.lock().map(|s| s.clone()).unwrap_or_default();
        assert_eq!(seen, vec![Step::Select, Step::Remove, Step::Complete]);
    }

    #[test]
    fn optional_step_can_be_skipped() {
        let mut tracker = StepTracker::new(OPEN, Arc::new(NoopObserver));
        for step in [Step::Init, Step::SelectRepo, Step::FetchIssue, Step::CheckExisting] {
            assert!(tracker.advance(step));
        }
        assert!(tracker.advance(Step::OpenEditor));
        assert!(!tracker.history().contains(&Step::CreateWorktree));
    }

    #[test]
    fn backward_transition_is_refused() {
        let mut tracker = StepTracker::new(CREATE, Arc::new(NoopObserver));
        assert!(tracker.advance(Step::Analyze));
        assert!(!tracker.advance(Step::SelectRepo));
        assert_eq!(tracker.current(), Some(Step::Analyze));
    }

    #[test]
    fn error_is_absorbing() {
        let mut tracker = StepTracker::new(CREATE, Arc::new(NoopObserver));
        tracker.advance(Step::Init);
        let result: Result<(), Error> = tracker.finish(Err(Error::Cancelled));
        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(tracker.current(), Some(Step::Error));
        assert!(!tracker.advance(Step::SelectRepo));
        assert_eq!(tracker.current(), Some(Step::Error));
    }
}
