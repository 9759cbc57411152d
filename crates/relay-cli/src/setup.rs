//! `relay setup`: store API keys, pick defaults, and optionally write the
//! project config for the current checkout.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use dialoguer::{Confirm, Password, Select};
use relay_core::config::{load_config, save_config};
use relay_core::{Editor, Error, RelayConfig, Result};
use relay_engine::editor::ProcessEditorLauncher;
use relay_engine::storage::{Database, SettingKey};
use relay_engine::tracker::TrackerContext;
use tracing::{info, warn};

use crate::{context, repo_cmd};

#[derive(Args, Debug, Default)]
pub struct SetupArgs {
    /// Linear API key (prompted when omitted)
    #[arg(long, env = "LINEAR_API_KEY", hide_env_values = true)]
    pub linear_key: Option<String>,
    /// OpenRouter API key (prompted when omitted)
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub openrouter_key: Option<String>,
    /// Default editor: vscode, cursor, zed
    #[arg(long)]
    pub editor: Option<Editor>,
    /// Never prompt; keep stored values for anything not given
    #[arg(long)]
    pub non_interactive: bool,
}

fn interaction(e: dialoguer::Error) -> Error {
    Error::Io(io::Error::other(e.to_string()))
}

/// Nearest ancestor of `dir` holding a `.git` entry.
pub fn find_checkout(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .find(|d| d.join(".git").exists())
        .map(Path::to_path_buf)
}

/// Given value, else a hidden prompt. Empty input keeps `existing`.
fn prompt_key(
    label: &str,
    given: Option<String>,
    existing: Option<&str>,
    non_interactive: bool,
) -> Result<Option<String>> {
    if let Some(value) = given.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        return Ok(Some(value));
    }
    if non_interactive {
        return Ok(None);
    }
    let prompt = if existing.is_some() {
        format!("{label} API key (leave empty to keep the stored one)")
    } else {
        format!("{label} API key")
    };
    let value: String = Password::new()
        .with_prompt(prompt)
        .allow_empty_password(existing.is_some())
        .interact()
        .map_err(interaction)?;
    let value = value.trim().to_string();
    Ok((!value.is_empty()).then_some(value))
}

fn prompt_editor(
    given: Option<Editor>,
    current: Option<Editor>,
    non_interactive: bool,
) -> Result<Option<Editor>> {
    if given.is_some() || non_interactive {
        return Ok(given);
    }
    let current = current.unwrap_or(Editor::FALLBACK);
    let default = Editor::ALL.iter().position(|e| *e == current).unwrap_or(0);
    let idx = Select::new()
        .with_prompt("Default editor")
        .items(&Editor::ALL)
        .default(default)
        .interact()
        .map_err(interaction)?;
    Ok(Editor::ALL.get(idx).copied())
}

fn prompt_team(context: &TrackerContext, current: Option<&str>) -> Result<Option<String>> {
    match context.teams.len() {
        0 => Ok(None),
        1 => Ok(Some(context.teams[0].id.clone())),
        _ => {
            let items: Vec<String> = context
                .teams
                .iter()
                .map(|t| format!("{:<8} {}", t.key, t.name))
                .collect();
            let default = current
                .and_then(|id| context.teams.iter().position(|t| t.id == id))
                .unwrap_or(0);
            let idx = Select::new()
                .with_prompt("Default team")
                .items(&items)
                .default(default)
                .interact()
                .map_err(interaction)?;
            Ok(context.teams.get(idx).map(|t| t.id.clone()))
        }
    }
}

/// Run setup against the catalog.
pub async fn run(db: &Database, cwd: &Path, args: SetupArgs) -> Result<()> {
    let mut out = io::stdout();
    let mut err = io::stderr();

    let linear = db.linear_key().await?;
    if let Some(key) = prompt_key(
        "Linear",
        args.linear_key,
        linear.as_deref(),
        args.non_interactive,
    )? {
        db.set_setting(SettingKey::LINEAR_KEY, &key).await?;
        info!("Linear key stored");
    }

    let openrouter = db.openrouter_key().await?;
    if let Some(key) = prompt_key(
        "OpenRouter",
        args.openrouter_key,
        openrouter.as_deref(),
        args.non_interactive,
    )? {
        db.set_setting(SettingKey::OPENROUTER_KEY, &key).await?;
        info!("OpenRouter key stored");
    }

    let current_editor = db.default_editor().await?;
    let editor = prompt_editor(args.editor, current_editor, args.non_interactive)?;
    if let Some(editor) = editor {
        db.set_setting(SettingKey::DEFAULT_EDITOR, editor.as_str())
            .await?;
    }
    let editor = editor.or(current_editor).unwrap_or(Editor::FALLBACK);
    if !ProcessEditorLauncher::new().is_available(editor).await {
        writeln!(
            err,
            "⚠ `{}` is not on PATH; install the {editor} shell command before opening worktrees",
            editor.command()
        )?;
    }

    // Verifies the Linear key and picks the default team in one round trip.
    if let Some(tracker) = context::tracker(db).await? {
        match tracker.fetch_context().await {
            Ok(ctx) => {
                let current = db.default_team_id().await?;
                let team = if args.non_interactive {
                    current.clone().or_else(|| ctx.teams.first().map(|t| t.id.clone()))
                } else {
                    prompt_team(&ctx, current.as_deref())?
                };
                if let Some(team) = team {
                    db.set_setting(SettingKey::DEFAULT_TEAM_ID, &team).await?;
                }
                writeln!(out, "✓ Linear key works ({} team(s) visible)", ctx.teams.len())?;
            }
            Err(e) => {
                warn!(error = %e, "Linear key check failed");
                writeln!(err, "⚠ Could not reach Linear with the stored key: {e}")?;
            }
        }
    }

    if let Some(root) = find_checkout(cwd) {
        setup_project(db, &root, editor, args.non_interactive).await?;
    }

    if db.has_required_keys().await? {
        writeln!(out, "✓ Setup complete. Try: relay \"<task>\"")?;
    } else {
        writeln!(
            out,
            "Setup saved, but API keys are still missing. Run: relay config set-key <linear|openrouter> <key>"
        )?;
    }
    Ok(())
}

/// Offer to write the project config and register the checkout.
async fn setup_project(
    db: &Database,
    root: &Path,
    editor: Editor,
    non_interactive: bool,
) -> Result<()> {
    let mut out = io::stdout();
    let config = load_config(root)?;
    let has_config = config.is_some();
    let registered = db
        .get_repository_by_path(&root.to_string_lossy())
        .await?
        .is_some();
    if has_config && registered {
        return Ok(());
    }
    if non_interactive {
        return Ok(());
    }

    let proceed = Confirm::new()
        .with_prompt(format!(
            "Configure {} for relay (project config and catalog entry)?",
            root.display()
        ))
        .default(true)
        .interact()
        .map_err(interaction)?;
    if !proceed {
        return Ok(());
    }

    if !has_config {
        let mut config = RelayConfig::new(root);
        config.editor = Some(editor);
        let path = save_config(&config, root)?;
        writeln!(out, "✓ Wrote {}", path.display())?;
    }
    if !registered {
        let worktree_base = config.as_ref().map(|c| c.worktree_base.as_str());
        let repo = repo_cmd::add(db, root, None, worktree_base, None).await?;
        writeln!(out, "✓ Added repository {}", repo.name)?;
    }
    Ok(())
}
