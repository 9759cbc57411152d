//! Per-invocation wiring: catalog handle, adapters, and the workflow context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use relay_core::config::{catalog_path, discover_config};
use relay_core::{Error, Result};
use relay_engine::editor::ProcessEditorLauncher;
use relay_engine::generator::{Generator, OpenRouterClient, OpenRouterConfig};
use relay_engine::hosting::GhCli;
use relay_engine::storage::Database;
use relay_engine::tracker::{LinearClient, LinearConfig, Tracker};
use relay_engine::workflow::WorkflowContext;
use relay_engine::worktree::WorktreeManager;
use tracing::debug;

use crate::prompt::{DialoguerPrompter, TerminalObserver};

/// `--db` / `RELAY_DB`, else `~/.relay/relay.db`.
pub fn resolve_db_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    explicit.or_else(catalog_path).ok_or_else(|| {
        Error::missing(
            "Could not determine your home directory",
            "Pass --db <path> or set RELAY_DB",
        )
    })
}

pub async fn open_catalog(path: &Path) -> Result<Database> {
    debug!(path = %path.display(), "Opening catalog");
    Ok(Database::open(path).await?)
}

/// Linear client when a key is stored.
pub async fn tracker(db: &Database) -> Result<Option<Arc<dyn Tracker>>> {
    let Some(key) = db.linear_key().await?.filter(|k| !k.is_empty()) else {
        return Ok(None);
    };
    let client: Arc<dyn Tracker> = Arc::new(LinearClient::new(&LinearConfig::new(key))?);
    Ok(Some(client))
}

/// OpenRouter client when a key is stored.
pub async fn generator(db: &Database) -> Result<Option<Arc<dyn Generator>>> {
    let Some(key) = db.openrouter_key().await?.filter(|k| !k.is_empty()) else {
        return Ok(None);
    };
    let client: Arc<dyn Generator> =
        Arc::new(OpenRouterClient::new(&OpenRouterConfig::new(key))?);
    Ok(Some(client))
}

/// Everything a workflow needs, with terminal prompts and progress output.
pub async fn workflow_context(db: Database, cwd: PathBuf) -> Result<WorkflowContext> {
    let config = discover_config(&cwd)?.map(|(dir, config)| {
        debug!(dir = %dir.display(), "Using project config");
        config
    });
    let tracker = tracker(&db).await?;
    let generator = generator(&db).await?;

    Ok(WorkflowContext {
        db,
        worktrees: WorktreeManager::new(),
        hosting: GhCli::default(),
        tracker,
        generator,
        editor: Arc::new(ProcessEditorLauncher::new()),
        prompter: Arc::new(DialoguerPrompter),
        observer: Arc::new(TerminalObserver),
        config,
        cwd,
    })
}
