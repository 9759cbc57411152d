//! Terminal prompts (dialoguer) and progress output for workflows.
//!
//! Everything here writes to stderr; stdout carries command results only.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::Path;

use dialoguer::{Confirm, MultiSelect, Select};
use relay_core::{Error, Result};
use relay_engine::generator::PullRequestDraft;
use relay_engine::storage::{Repository, WorktreeListing};
use relay_engine::tracker::{IssueDraft, Team, TrackerContext, TrackerIssue};
use relay_engine::workflow::{Prompter, Step, WorkflowObserver};

fn interaction(e: dialoguer::Error) -> Error {
    Error::Io(io::Error::other(e.to_string()))
}

/// `None` from an `interact_opt` means the operator pressed Esc or q.
fn chosen<T>(choice: Option<T>) -> Result<T> {
    choice.ok_or(Error::Cancelled)
}

/// Render an issue draft the way the confirmation prompt shows it.
pub fn render_draft(draft: &IssueDraft, team: &Team, context: &TrackerContext) -> String {
    let project = draft
        .project_id
        .as_deref()
        .and_then(|id| context.projects.iter().find(|p| p.id == id))
        .map_or("-", |p| p.name.as_str());
    let labels: Vec<&str> = draft
        .label_ids
        .iter()
        .filter_map(|id| context.labels.iter().find(|l| &l.id == id))
        .map(|l| l.name.as_str())
        .collect();
    let labels = if labels.is_empty() {
        "-".to_string()
    } else {
        labels.join(", ")
    };

    let mut out = String::new();
    let _ = writeln!(out, "  Title:    {}", draft.title);
    let _ = writeln!(out, "  Team:     {} ({})", team.name, team.key);
    let _ = writeln!(out, "  Project:  {project}");
    let _ = writeln!(out, "  Labels:   {labels}");
    let _ = writeln!(out, "  Priority: {}", draft.priority_label());
    if !draft.description.trim().is_empty() {
        out.push('\n');
        for line in draft.description.lines() {
            let _ = writeln!(out, "  {line}");
        }
    }
    out
}

/// Interactive prompter backed by dialoguer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn select_repository(&self, repos: &[Repository]) -> Result<usize> {
        let items: Vec<String> = repos
            .iter()
            .map(|r| format!("{:<20} {}", r.name, r.path.display()))
            .collect();
        let choice = Select::new()
            .with_prompt("Repository")
            .items(&items)
            .default(0)
            .interact_opt()
            .map_err(interaction)?;
        chosen(choice)
    }

    fn select_issue(&self, issues: &[TrackerIssue]) -> Result<usize> {
        let items: Vec<String> = issues
            .iter()
            .map(|i| format!("{:<10} {}", i.identifier, i.title))
            .collect();
        let choice = Select::new()
            .with_prompt("Issue")
            .items(&items)
            .default(0)
            .interact_opt()
            .map_err(interaction)?;
        chosen(choice)
    }

    fn confirm_issue(
        &self,
        draft: &IssueDraft,
        team: &Team,
        context: &TrackerContext,
    ) -> Result<bool> {
        let mut err = io::stderr();
        writeln!(err, "\nDrafted issue:\n{}", render_draft(draft, team, context))?;
        Confirm::new()
            .with_prompt("Create this issue?")
            .default(true)
            .interact()
            .map_err(interaction)
    }

    fn select_worktrees(&self, worktrees: &[WorktreeListing]) -> Result<Vec<usize>> {
        let items: Vec<String> = worktrees
            .iter()
            .map(|l| {
                format!(
                    "{:<10} {:<40} ({})",
                    l.worktree.issue_identifier, l.worktree.branch_name, l.repo_name
                )
            })
            .collect();
        let choice = MultiSelect::new()
            .with_prompt("Worktrees to remove (space to select, enter to confirm)")
            .items(&items)
            .interact_opt()
            .map_err(interaction)?;
        chosen(choice)
    }

    fn confirm_force_removal(&self, path: &Path, reason: &str) -> Result<bool> {
        let mut err = io::stderr();
        writeln!(err, "git refused to remove {}:\n  {reason}", path.display())?;
        Confirm::new()
            .with_prompt("Force removal and discard local changes?")
            .default(false)
            .interact()
            .map_err(interaction)
    }

    fn confirm_commit(&self, message: &str) -> Result<bool> {
        let mut err = io::stderr();
        writeln!(err, "\nCommit message:\n")?;
        for line in message.lines() {
            writeln!(err, "  {line}")?;
        }
        writeln!(err)?;
        Confirm::new()
            .with_prompt("Commit with this message?")
            .default(true)
            .interact()
            .map_err(interaction)
    }

    fn confirm_pull_request(&self, draft: &PullRequestDraft, base: &str) -> Result<bool> {
        let mut err = io::stderr();
        writeln!(err, "\nPull request into {base}:\n\n  {}\n", draft.title)?;
        for line in draft.body.lines() {
            writeln!(err, "  {line}")?;
        }
        writeln!(err)?;
        Confirm::new()
            .with_prompt("Open this pull request?")
            .default(true)
            .interact()
            .map_err(interaction)
    }
}

/// Prints one progress line per step and every warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalObserver;

impl WorkflowObserver for TerminalObserver {
    fn on_step(&self, _workflow: &'static str, step: Step) {
        if step.is_terminal() {
            return;
        }
        let _ = writeln!(io::stderr(), "› {}...", step.label());
    }

    fn on_warning(&self, _workflow: &'static str, message: &str) {
        let _ = writeln!(io::stderr(), "⚠ {message}");
    }
}
