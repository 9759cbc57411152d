//! Thin `git` process runner shared by the worktree manager and commit
//! annotations.

use std::path::Path;
use std::process::Output;
use std::time::Instant;

use tracing::debug;

/// Run `git <args>` in `dir` and capture its output.
///
/// A non-zero exit is not an error here; callers inspect the status and map
/// stderr themselves.
pub async fn run(dir: &Path, args: &[&str]) -> std::io::Result<Output> {
    debug!(dir = %dir.display(), ?args, "git: spawning");
    let start = Instant::now();
    let output = tokio::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await?;
    debug!(
        elapsed_ms = start.elapsed().as_millis(),
        status = %output.status,
        "git: finished"
    );
    Ok(output)
}

/// Trimmed stdout as an owned string.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Trimmed stderr as an owned string.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}
