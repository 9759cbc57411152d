//! Helpers for tests that need a real git repository.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::path::Path;
use std::process::Command;

pub const TEST_USER: &str = "Relay Test";
pub const TEST_EMAIL: &str = "test@relay.dev";

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

/// `git init` on branch `main` with a local identity, optionally with an
/// initial empty commit.
pub fn init_repo(dir: &Path, with_commit: bool) {
    git(dir, &["init", "-q"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(dir, &["config", "user.name", TEST_USER]);
    git(dir, &["config", "user.email", TEST_EMAIL]);
    git(dir, &["config", "commit.gpgsign", "false"]);
    if with_commit {
        git(dir, &["commit", "-q", "--allow-empty", "-m", "init"]);
    }
}

/// Write `name` and commit it, optionally as another author.
pub fn commit_file(dir: &Path, name: &str, content: &str) {
    commit_file_as(dir, name, content, None);
}

pub fn commit_file_as(dir: &Path, name: &str, content: &str, author: Option<&str>) {
    std::fs::write(dir.join(name), content).unwrap();
    git(dir, &["add", name]);
    let message = format!("update {name}");
    let author_arg = author.map(|a| format!("--author={a}"));
    let mut args = vec!["commit", "-q", "-m", message.as_str()];
    if let Some(author_arg) = &author_arg {
        args.push(author_arg);
    }
    git(dir, &args);
}
