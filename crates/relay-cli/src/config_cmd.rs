//! CLI config subcommands.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Write};
use std::path::Path;

use clap::{Subcommand, ValueEnum};
use relay_core::config::discover_config;
use relay_core::{Editor, Error, Result};
use relay_engine::storage::{Database, SettingKey};
use tracing::info;

/// Which service an API key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyService {
    Linear,
    Openrouter,
}

impl KeyService {
    pub const fn setting(self) -> &'static str {
        match self {
            Self::Linear => SettingKey::LINEAR_KEY,
            Self::Openrouter => SettingKey::OPENROUTER_KEY,
        }
    }
}

/// Config subcommand actions.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show stored settings (API keys masked) and the project config
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Store an API key
    SetKey {
        service: KeyService,
        value: String,
    },
    /// Set the default editor: vscode, cursor, zed
    SetEditor { editor: Editor },
    /// Set the default Linear team id
    SetTeam { id: String },
}

/// Keep the last four characters of a secret.
pub fn mask_secret(value: &str) -> String {
    let count = value.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = value.chars().skip(count - 4).collect();
    format!("{}{tail}", "*".repeat(count - 4))
}

fn is_secret(key: &str) -> bool {
    key == SettingKey::LINEAR_KEY || key == SettingKey::OPENROUTER_KEY
}

/// Execute a config subcommand.
pub async fn run(db: &Database, cwd: &Path, action: ConfigAction) -> Result<()> {
    let mut out = io::stdout();
    match action {
        ConfigAction::Show { json } => {
            let settings: Vec<(String, String)> = db
                .all_settings()
                .await?
                .into_iter()
                .map(|(k, v)| {
                    let shown = if is_secret(&k) { mask_secret(&v) } else { v };
                    (k, shown)
                })
                .collect();
            let project = discover_config(cwd)?;

            if json {
                let value = serde_json::json!({
                    "settings": settings
                        .into_iter()
                        .map(|(k, v)| (k, serde_json::Value::String(v)))
                        .collect::<serde_json::Map<_, _>>(),
                    "project": project.map(|(dir, config)| serde_json::json!({
                        "dir": dir,
                        "config": config,
                    })),
                });
                writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
                return Ok(());
            }

            if settings.is_empty() {
                writeln!(out, "No settings stored. Run: relay setup")?;
            } else {
                for (key, value) in &settings {
                    writeln!(out, "{key:<20} {value}")?;
                }
            }
            match project {
                Some((dir, config)) => {
                    writeln!(out, "\nProject config: {}", dir.display())?;
                    writeln!(out, "  repoBase:     {}", config.repo_base.display())?;
                    writeln!(out, "  worktreeBase: {}", config.worktree_base)?;
                    writeln!(out, "  baseBranch:   {}", config.base_branch)?;
                    if let Some(editor) = config.editor {
                        writeln!(out, "  editor:       {editor}")?;
                    }
                    if let Some(team) = &config.default_team {
                        writeln!(out, "  defaultTeam:  {team}")?;
                    }
                    for script in &config.startup_scripts {
                        writeln!(out, "  startup:      {script}")?;
                    }
                }
                None => writeln!(out, "\nNo project config found.")?,
            }
        }
        ConfigAction::SetKey { service, value } => {
            let value = value.trim();
            if value.is_empty() {
                return Err(Error::Config("API key is empty".into()));
            }
            db.set_setting(service.setting(), value).await?;
            info!(key = service.setting(), "API key stored");
            writeln!(out, "✓ Stored {} key {}", service_name(service), mask_secret(value))?;
        }
        ConfigAction::SetEditor { editor } => {
            db.set_setting(SettingKey::DEFAULT_EDITOR, editor.as_str())
                .await?;
            writeln!(out, "✓ Default editor: {editor}")?;
        }
        ConfigAction::SetTeam { id } => {
            let id = id.trim();
            if id.is_empty() {
                return Err(Error::Config("Team id is empty".into()));
            }
            db.set_setting(SettingKey::DEFAULT_TEAM_ID, id).await?;
            writeln!(out, "✓ Default team: {id}")?;
        }
    }
    Ok(())
}

const fn service_name(service: KeyService) -> &'static str {
    match service {
        KeyService::Linear => "Linear",
        KeyService::Openrouter => "OpenRouter",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn masks_all_but_tail() {
        assert_eq!(mask_secret("lin_api_abcd1234"), "************1234");
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret(""), "");
    }

    #[tokio::test]
    async fn set_key_stores_trimmed_value() {
        let db = Database::open_in_memory().await.unwrap();
        run(
            &db,
            Path::new("/"),
            ConfigAction::SetKey {
                service: KeyService::Linear,
                value: "  lin_api_x  ".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(db.linear_key().await.unwrap().as_deref(), Some("lin_api_x"));
    }

    #[tokio::test]
    async fn empty_key_is_rejected() {
        let db = Database::open_in_memory().await.unwrap();
        let err = run(
            &db,
            Path::new("/"),
            ConfigAction::SetKey {
                service: KeyService::Openrouter,
                value: " ".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(db.openrouter_key().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_editor_and_team() {
        let db = Database::open_in_memory().await.unwrap();
        run(
            &db,
            Path::new("/"),
            ConfigAction::SetEditor {
                editor: Editor::Zed,
            },
        )
        .await
        .unwrap();
        run(
            &db,
            Path::new("/"),
            ConfigAction::SetTeam {
                id: "team-eng".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(db.default_editor().await.unwrap(), Some(Editor::Zed));
        assert_eq!(
            db.default_team_id().await.unwrap().as_deref(),
            Some("team-eng")
        );
    }
}
