//! Editor launcher.

use std::path::Path;

use async_trait::async_trait;
use relay_core::Editor;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("'{command}' is not installed or not on PATH")]
    NotInstalled { command: String },

    #[error("'{command}' exited with {status}")]
    Failed { command: String, status: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EditorError> for relay_core::Error {
    fn from(e: EditorError) -> Self {
        Self::EditorLaunch(e.to_string())
    }
}

/// Opens a directory in an editor.
#[async_trait]
pub trait EditorLauncher: Send + Sync {
    async fn open(&self, editor: Editor, path: &Path) -> Result<(), EditorError>;
}

/// Launches the editor's command-line shim (`code`, `cursor`, `zed`).
#[derive(Debug, Clone, Default)]
pub struct ProcessEditorLauncher {
    command_override: Option<String>,
}

impl ProcessEditorLauncher {
    pub const fn new() -> Self {
        Self {
            command_override: None,
        }
    }

    /// Run `command` instead of the editor's own launcher.
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command_override: Some(command.into()),
        }
    }

    fn command_for(&self, editor: Editor) -> &str {
        self.command_override
            .as_deref()
            .unwrap_or_else(|| editor.command())
    }

    /// Whether the launcher for `editor` can be spawned at all.
    pub async fn is_available(&self, editor: Editor) -> bool {
        tokio::process::Command::new(self.command_for(editor))
            .arg("--version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .is_ok_and(|s| s.success())
    }
}

#[async_trait]
impl EditorLauncher for ProcessEditorLauncher {
    async fn open(&self, editor: Editor, path: &Path) -> Result<(), EditorError> {
        let command = self.command_for(editor);
        debug!(command, path = %path.display(), "Launching editor");

        let status = match tokio::process::Command::new(command)
            .arg(path)
            .status()
            .await
        {
            Ok(status) => status,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EditorError::NotInstalled {
                    command: command.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if !status.success() {
            return Err(EditorError::Failed {
                command: command.to_string(),
                status: status.to_string(),
            });
        }

        info!(%editor, path = %path.display(), "Opened editor");
        Ok(())
    }
}
