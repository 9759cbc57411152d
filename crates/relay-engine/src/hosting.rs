//! Pull requests through the GitHub CLI.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum HostingError {
    #[error("'{command}' is not installed or not on PATH")]
    NotInstalled { command: String },

    #[error("{0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<HostingError> for relay_core::Error {
    fn from(e: HostingError) -> Self {
        match e {
            HostingError::NotInstalled { command } => Self::missing(
                format!("GitHub CLI '{command}' not found"),
                "Install it from https://cli.github.com and run: gh auth login",
            ),
            HostingError::Failed(stderr) => Self::external("GitHub", stderr),
            HostingError::Io(io) => Self::Io(io),
        }
    }
}

/// Runs `gh` in a checkout.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: String,
}

impl Default for GhCli {
    fn default() -> Self {
        Self::new("gh")
    }
}

impl GhCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Open a pull request from the current branch into `base`. Returns the
    /// URL `gh` prints.
    pub async fn create_pull_request(
        &self,
        dir: &Path,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<String, HostingError> {
        debug!(program = %self.program, dir = %dir.display(), base, "Creating pull request");
        let output = match tokio::process::Command::new(&self.program)
            .args(["pr", "create", "--base", base, "--title", title, "--body", body])
            .current_dir(dir)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(HostingError::NotInstalled {
                    command: self.program.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(HostingError::Failed(stderr));
        }

        let url = String::from_utf8_lossy(&output.stdout)
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or_default()
            .trim()
            .to_string();
        info!(url = %url, base, "Pull request created");
        Ok(url)
    }
}
