//! relay CLI
//!
//! Turns a task description or a Linear issue identifier into a git worktree
//! opened in your editor.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use relay_core::tracing_init::{default_filter, init_tracing};
use relay_engine::workflow::{CleanupOptions, CommitOptions, CreateRequest, PullRequestOptions};
use tracing::{debug, info};

use relay_cli::config_cmd::ConfigAction;
use relay_cli::repo_cmd::RepoAction;
use relay_cli::setup::SetupArgs;
use relay_cli::{commit_cmd, config_cmd, context, output, pr_cmd, repo_cmd, setup, worktree_cmd};

#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(version, about = "Linear issues, git worktrees, and your editor in one command")]
#[command(arg_required_else_help = true, allow_external_subcommands = true)]
struct Cli {
    /// Catalog database path (default: ~/.relay/relay.db)
    #[arg(long, env = "RELAY_DB", global = true)]
    db: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store API keys and defaults, and configure the current checkout
    Setup(SetupArgs),
    /// Manage registered repositories
    Repo {
        #[command(subcommand)]
        action: RepoAction,
    },
    /// Draft a Linear issue from a task, create it, and open its worktree
    Create {
        /// What needs doing, in plain words
        task: String,
        /// Repository name
        #[arg(long)]
        repo: Option<String>,
        /// Linear team key (e.g. ENG)
        #[arg(long)]
        team: Option<String>,
        /// Create the drafted issue without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Open the worktree for an existing issue, creating it if needed
    Open {
        /// Issue identifier (e.g. ENG-42)
        issue: String,
        #[arg(long)]
        repo: Option<String>,
    },
    /// Pick one of your assigned issues and open its worktree
    Switch {
        #[arg(long)]
        repo: Option<String>,
    },
    /// List recorded worktrees
    List {
        #[arg(long)]
        repo: Option<String>,
    },
    /// Remove worktrees you are done with
    Cleanup {
        #[arg(long)]
        repo: Option<String>,
        /// Discard local changes without asking when git refuses
        #[arg(long)]
        force: bool,
    },
    /// Show or change stored settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Commit staged changes with a generated message
    Commit {
        /// Commit without showing the message first
        #[arg(short, long)]
        yes: bool,
    },
    /// Open a pull request for the current branch with a generated description
    Pr {
        /// Open without showing the draft first
        #[arg(short, long)]
        yes: bool,
        /// Target branch (defaults to the project's base branch)
        #[arg(long)]
        base: Option<String>,
    },
    #[command(external_subcommand)]
    Quick(Vec<String>),
}

/// `relay <task-or-issue-id> [--repo <name>] [--yes]`.
#[derive(Parser, Debug, PartialEq, Eq)]
#[command(name = "relay")]
struct QuickArgs {
    #[arg(required = true, num_args = 1..)]
    input: Vec<String>,
    #[arg(long)]
    repo: Option<String>,
    #[arg(short, long)]
    yes: bool,
}

impl QuickArgs {
    fn parse_external(args: Vec<String>) -> Result<Self, clap::Error> {
        Self::try_parse_from(std::iter::once("relay".to_string()).chain(args))
    }

    fn text(&self) -> String {
        self.input.join(" ")
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(default_filter(cli.verbose), cli.log_json);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting relay");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!(error = ?e, "Command failed");
            output::report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let db_path = context::resolve_db_path(cli.db)?;
    let db = context::open_catalog(&db_path).await?;

    match cli.command {
        Command::Setup(args) => setup::run(&db, &cwd, args).await?,
        Command::Repo { action } => repo_cmd::run(&db, &cwd, action).await?,
        Command::Config { action } => config_cmd::run(&db, &cwd, action).await?,
        Command::List { repo } => worktree_cmd::list(&db, repo.as_deref()).await?,
        Command::Create {
            task,
            repo,
            team,
            yes,
        } => {
            let ctx = context::workflow_context(db, cwd).await?;
            let req = CreateRequest {
                task,
                repo,
                team,
                yes,
            };
            worktree_cmd::create(&ctx, &req).await?;
        }
        Command::Open { issue, repo } => {
            let ctx = context::workflow_context(db, cwd).await?;
            worktree_cmd::open(&ctx, &issue, repo.as_deref()).await?;
        }
        Command::Switch { repo } => {
            let ctx = context::workflow_context(db, cwd).await?;
            worktree_cmd::switch(&ctx, repo.as_deref()).await?;
        }
        Command::Cleanup { repo, force } => {
            let ctx = context::workflow_context(db, cwd).await?;
            worktree_cmd::cleanup(&ctx, &CleanupOptions { repo, force }).await?;
        }
        Command::Commit { yes } => {
            let ctx = context::workflow_context(db, cwd).await?;
            commit_cmd::run(&ctx, &CommitOptions { yes }).await?;
        }
        Command::Pr { yes, base } => {
            let ctx = context::workflow_context(db, cwd).await?;
            pr_cmd::run(&ctx, &PullRequestOptions { yes, base }).await?;
        }
        Command::Quick(args) => {
            let quick = QuickArgs::parse_external(args).unwrap_or_else(|e| e.exit());
            let ctx = context::workflow_context(db, cwd).await?;
            worktree_cmd::quick(&ctx, &quick.text(), quick.repo, quick.yes).await?;
        }
    }
    Ok(())
}
