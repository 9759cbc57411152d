//! Commit and pull request annotations: issue links, co-authors, and
//! reviewers derived from history.
//!
//! Advisory only. Lookups that fail are skipped rather than reported.

use std::path::Path;
use std::sync::LazyLock;

use futures::future::join_all;
use regex::Regex;
use tracing::debug;

use crate::worktree::WorktreeError;
use crate::worktree::git;

/// Files inspected for recent authors.
pub const MAX_AUTHOR_FILES: usize = 5;

/// Authors considered per file.
const AUTHORS_PER_FILE: &str = "3";

/// Co-authors kept in the trailer block.
pub const MAX_CO_AUTHORS: usize = 3;

/// Reviewers suggested for a pull request.
pub const MAX_REVIEWERS: usize = 5;

static ISSUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+-\d+)").expect("static regex is valid"));

/// Tracker-generated branches are lowercase: `eng-42-fix-login-bug`,
/// optionally behind a `user/` prefix.
static LOWER_ISSUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[^/]+/)?([a-z]+-\d+)(?:-|$)").expect("static regex is valid")
});

/// Issue identifier embedded in a branch name, uppercased.
pub fn extract_issue_identifier(branch: &str) -> Option<String> {
    if let Some(m) = ISSUE_RE.captures(branch).and_then(|c| c.get(1)) {
        return Some(m.as_str().to_string());
    }
    LOWER_ISSUE_RE
        .captures(branch)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_uppercase())
}

async fn file_authors(repo: &Path, file: &str) -> Vec<String> {
    let args = [
        "log",
        "-n",
        AUTHORS_PER_FILE,
        "--pretty=format:%an <%ae>",
        "--",
        file,
    ];
    match git::run(repo, &args).await {
        Ok(output) if output.status.success() => git::stdout(&output)
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect(),
        Ok(output) => {
            debug!(file, stderr = %git::stderr(&output), "Skipping file without history");
            Vec::new()
        }
        Err(e) => {
            debug!(file, error = %e, "Skipping file without history");
            Vec::new()
        }
    }
}

/// Distinct recent authors of the first few `files`, in first-seen order.
pub async fn recent_authors(repo: &Path, files: &[String]) -> Vec<String> {
    let lookups = files
        .iter()
        .take(MAX_AUTHOR_FILES)
        .map(|f| file_authors(repo, f));

    let mut authors: Vec<String> = Vec::new();
    for author in join_all(lookups).await.into_iter().flatten() {
        if !authors.contains(&author) {
            authors.push(author);
        }
    }
    authors
}

/// `Name <email>` of the configured git user, if both are set.
pub async fn current_author(repo: &Path) -> Option<String> {
    let (name, email) = tokio::join!(
        git::run(repo, &["config", "user.name"]),
        git::run(repo, &["config", "user.email"])
    );
    let name = name.ok().filter(|o| o.status.success())?;
    let email = email.ok().filter(|o| o.status.success())?;
    Some(format!("{} <{}>", git::stdout(&name), git::stdout(&email)))
}

async fn other_authors(repo: &Path, files: &[String], limit: usize) -> Vec<String> {
    let (authors, me) = tokio::join!(recent_authors(repo, files), current_author(repo));
    authors
        .into_iter()
        .filter(|a| me.as_deref() != Some(a.as_str()))
        .take(limit)
        .collect()
}

/// Recent authors of `files` other than the current user, capped.
pub async fn co_authors(repo: &Path, files: &[String]) -> Vec<String> {
    other_authors(repo, files, MAX_CO_AUTHORS).await
}

/// People who recently touched `files`, as review candidates.
pub async fn reviewers(repo: &Path, files: &[String]) -> Vec<String> {
    other_authors(repo, files, MAX_REVIEWERS).await
}

/// Append the tracker link to a pull request description.
pub fn link_issue(body: &str, issue: Option<&str>) -> String {
    match issue {
        Some(issue) => format!("{}\n\n---\n\nLinear: {issue}", body.trim_end()),
        None => body.trim_end().to_string(),
    }
}

/// Append the issue and co-author trailers to a commit message.
pub fn annotate_message(message: &str, issue: Option<&str>, co_authors: &[String]) -> String {
    let mut full = message.trim_end().to_string();
    if let Some(issue) = issue {
        full.push_str("\n\nLinear: ");
        full.push_str(issue);
    }
    if !co_authors.is_empty() {
        full.push_str("\n\n");
        full.push_str(
            &co_authors
                .iter()
                .map(|a| format!("Co-authored-by: {a}"))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }
    full
}

/// Staged file names and the staged diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedChanges {
    pub files: Vec<String>,
    pub diff: String,
}

impl StagedChanges {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

pub async fn staged_changes(repo: &Path) -> Result<StagedChanges, WorktreeError> {
    let names = git::run(repo, &["diff", "--cached", "--name-only"]).await?;
    if !names.status.success() {
        return Err(WorktreeError::Git(git::stderr(&names)));
    }
    let files: Vec<String> = git::stdout(&names)
        .lines()
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    if files.is_empty() {
        return Ok(StagedChanges::default());
    }

    let diff = git::run(repo, &["diff", "--cached"]).await?;
    if !diff.status.success() {
        return Err(WorktreeError::Git(git::stderr(&diff)));
    }
    Ok(StagedChanges {
        files,
        diff: String::from_utf8_lossy(&diff.stdout).into_owned(),
    })
}

/// What a branch adds on top of its base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchChanges {
    /// Commit subjects, newest first.
    pub commits: Vec<String>,
    pub files: Vec<String>,
    pub diff: String,
}

fn nonempty_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Commits, changed files, and the diff of `HEAD` since it forked from `base`.
pub async fn changes_since(repo: &Path, base: &str) -> Result<BranchChanges, WorktreeError> {
    let range = format!("{base}..HEAD");
    let fork = format!("{base}...HEAD");
    let log_args = ["log", &range, "--pretty=format:%s"];
    let names_args = ["diff", &fork, "--name-only"];
    let diff_args = ["diff", &fork];
    let (log, names, diff) = tokio::join!(
        git::run(repo, &log_args),
        git::run(repo, &names_args),
        git::run(repo, &diff_args),
    );
    let (log, names, diff) = (log?, names?, diff?);
    for output in [&log, &names, &diff] {
        if !output.status.success() {
            return Err(WorktreeError::Git(git::stderr(output)));
        }
    }
    Ok(BranchChanges {
        commits: nonempty_lines(&git::stdout(&log)),
        files: nonempty_lines(&git::stdout(&names)),
        diff: String::from_utf8_lossy(&diff.stdout).into_owned(),
    })
}

/// Commit the index with `message`.
pub async fn commit(repo: &Path, message: &str) -> Result<(), WorktreeError> {
    let output = git::run(repo, &["commit", "-q", "-m", message]).await?;
    if !output.status.success() {
        return Err(WorktreeError::Git(git::stderr(&output)));
    }
    Ok(())
}
