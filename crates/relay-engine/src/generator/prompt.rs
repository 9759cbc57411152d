//! Prompt text sent to the model.

use std::fmt::Write;

use crate::tracker::TrackerContext;

/// Diffs longer than this are cut before being sent.
pub const MAX_DIFF_CHARS: usize = 3000;

/// A branch diff gets more room than a single commit's.
pub const MAX_PR_DIFF_CHARS: usize = 5000;

pub fn issue_prompt(task: &str, context: &TrackerContext) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "You turn a short task into a Linear issue a developer can start on immediately.\n"
    );
    let _ = writeln!(out, "Task: \"{task}\"\n");

    let _ = writeln!(out, "Teams:");
    for t in &context.teams {
        let _ = writeln!(out, "- {} ({}, id {})", t.name, t.key, t.id);
    }
    let _ = writeln!(out, "\nProjects:");
    for p in &context.projects {
        let _ = writeln!(
            out,
            "- {} (id {}): {}",
            p.name,
            p.id,
            p.description.as_deref().unwrap_or("no description")
        );
    }
    let _ = writeln!(out, "\nLabels:");
    for l in &context.labels {
        let _ = writeln!(
            out,
            "- {} (id {}): {}",
            l.name,
            l.id,
            l.description.as_deref().unwrap_or("no description")
        );
    }

    out.push_str(
        "\nPick the project that fits best and two to five labels, using only ids listed above. \
         Write a title of at most 50 characters starting with a verb. The description states the \
         problem, lists acceptance criteria as bullets, and notes technical context and edge cases. \
         Use priority 3 unless the task signals urgency. Suggest an assignee only when the task \
         names one.",
    );
    out
}

pub fn commit_prompt(files: &[String], diff: &str) -> String {
    format!(
        "Write a conventional commit message (type(scope): subject) for the change below.\n\
         Allowed types: feat, fix, refactor, docs, style, test, chore. Keep the subject under \
         50 characters and say what changed and why.\n\n\
         Changed files:\n{}\n\nDiff:\n{}\n\nReply with the commit message only.",
        files.join("\n"),
        truncate_chars(diff, MAX_DIFF_CHARS)
    )
}

pub fn pull_request_prompt(commits: &[String], files: &[String], diff: &str) -> String {
    format!(
        "Write a pull request for the changes below.\n\n\
         Commits:\n{}\n\nChanged files:\n{}\n\nDiff:\n{}\n\n\
         Put a conventional-commit style title (feat/fix/refactor/docs/...) on the first line, \
         then a blank line, then the description: a short summary, the motivation, the key \
         changes as bullets, testing notes, and any breaking changes. Write for reviewers.",
        commits.join("\n"),
        files.join("\n"),
        truncate_chars(diff, MAX_PR_DIFF_CHARS)
    )
}

/// Prefix of `s` holding at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
