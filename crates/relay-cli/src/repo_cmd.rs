//! CLI repo subcommands.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Subcommand;
use relay_core::{Editor, Error, Result};
use relay_engine::storage::{Database, NewRepository, Repository, RepositoryUpdate};
use tracing::info;

/// Repo subcommand actions.
#[derive(Subcommand, Debug)]
pub enum RepoAction {
    /// Register a git repository (defaults to the current directory)
    Add {
        /// Path to the repository root
        path: Option<PathBuf>,
        /// Display name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,
        /// Where worktrees go, relative to the repository (default: ../worktrees)
        #[arg(long)]
        worktree_base: Option<String>,
        /// Editor for this repository: vscode, cursor, zed
        #[arg(long)]
        editor: Option<Editor>,
    },
    /// List registered repositories
    List,
    /// Forget a repository and its worktree records (files stay on disk)
    Remove {
        /// Repository name
        name: String,
    },
    /// Change a repository's settings
    Edit {
        /// Repository name
        name: String,
        /// New display name
        #[arg(long)]
        rename: Option<String>,
        /// New worktree base, relative to the repository
        #[arg(long)]
        worktree_base: Option<String>,
        /// Editor for this repository: vscode, cursor, zed
        #[arg(long, conflicts_with = "clear_editor")]
        editor: Option<Editor>,
        /// Fall back to the default editor
        #[arg(long)]
        clear_editor: bool,
    },
}

/// Absolute checkout root for `path`; it must contain a `.git` entry.
pub fn checkout_root(path: &Path) -> Result<PathBuf> {
    let abs = std::fs::canonicalize(path)
        .map_err(|e| Error::GitState(format!("{}: {e}", path.display())))?;
    if !abs.join(".git").exists() {
        return Err(Error::GitState(format!(
            "{} is not a git repository (no .git found)",
            abs.display()
        )));
    }
    Ok(abs)
}

fn default_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::Config(format!("Cannot derive a name from {}", path.display())))
}

/// Register the checkout at `path`.
pub async fn add(
    db: &Database,
    path: &Path,
    name: Option<&str>,
    worktree_base: Option<&str>,
    editor: Option<Editor>,
) -> Result<Repository> {
    let root = checkout_root(path)?;
    let name = match name {
        Some(n) => n.to_string(),
        None => default_name(&root)?,
    };
    let repo = db
        .create_repository(&NewRepository {
            name: &name,
            path: &root.to_string_lossy(),
            worktree_base,
            editor,
        })
        .await?;
    info!(repo = %repo.name, path = %repo.path.display(), "Repository registered");
    Ok(repo)
}

/// Execute a repo subcommand.
pub async fn run(db: &Database, cwd: &Path, action: RepoAction) -> Result<()> {
    let mut out = io::stdout();
    match action {
        RepoAction::Add {
            path,
            name,
            worktree_base,
            editor,
        } => {
            let path = path.unwrap_or_else(|| cwd.to_path_buf());
            let repo = add(
                db,
                &path,
                name.as_deref(),
                worktree_base.as_deref(),
                editor,
            )
            .await?;
            writeln!(out, "✓ Added repository {}", repo.name)?;
            write_repo_detail(&mut out, &repo)?;
        }
        RepoAction::List => {
            let repos = db.list_repositories().await?;
            if repos.is_empty() {
                writeln!(out, "No repositories registered. Add one with: relay repo add")?;
                return Ok(());
            }
            writeln!(
                out,
                "{:<20} {:<8} {:<10} {:<16} PATH",
                "NAME", "EDITOR", "WORKTREES", "WORKTREE BASE"
            )?;
            for repo in &repos {
                let count = db.count_worktrees(Some(repo.id)).await?;
                writeln!(
                    out,
                    "{:<20} {:<8} {:<10} {:<16} {}",
                    repo.name,
                    repo.editor.map_or("-", |e| e.as_str()),
                    count,
                    repo.worktree_base,
                    repo.path.display()
                )?;
            }
            writeln!(out, "\n{} repository(s)", repos.len())?;
        }
        RepoAction::Remove { name } => {
            let repo = db
                .get_repository_by_name(&name)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Repository \"{name}\"")))?;
            let forgotten = db.count_worktrees(Some(repo.id)).await?;
            if !db.delete_repository_by_name(&name).await? {
                return Err(Error::NotFound(format!("Repository \"{name}\"")));
            }
            writeln!(out, "✓ Removed repository {name}")?;
            if forgotten > 0 {
                writeln!(
                    out,
                    "  Forgot {forgotten} worktree record(s); the directories are untouched."
                )?;
            }
        }
        RepoAction::Edit {
            name,
            rename,
            worktree_base,
            editor,
            clear_editor,
        } => {
            let repo = db
                .get_repository_by_name(&name)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Repository \"{name}\"")))?;
            let update = RepositoryUpdate {
                name: rename,
                path: None,
                worktree_base,
                editor: if clear_editor { Some(None) } else { editor.map(Some) },
            };
            if update.is_empty() {
                writeln!(out, "Nothing to change.")?;
                return Ok(());
            }
            let repo = db.update_repository(repo.id, &update).await?;
            writeln!(out, "✓ Updated repository {}", repo.name)?;
            write_repo_detail(&mut out, &repo)?;
        }
    }
    Ok(())
}

fn write_repo_detail(w: &mut impl Write, repo: &Repository) -> io::Result<()> {
    writeln!(w, "  Path:           {}", repo.path.display())?;
    writeln!(w, "  Worktree base:  {}", repo.worktree_base)?;
    writeln!(
        w,
        "  Editor:         {}",
        repo.editor.map_or("(default)", |e| e.as_str())
    )?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::process::Command;

    use super::*;

    fn git_dir(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        let status = Command::new("git")
            .args(["init", "-q"])
            .current_dir(&dir)
            .status()
            .unwrap();
        assert!(status.success());
        dir
    }

    #[test]
    fn checkout_root_requires_git() {
        let tmp = tempfile::tempdir().unwrap();
        let err = checkout_root(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::GitState(_)));
        assert!(err.to_string().contains("not a git repository"));
    }

    #[tokio::test]
    async fn add_defaults_name_and_base() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = git_dir(tmp.path(), "demo");
        let db = Database::open_in_memory().await.unwrap();

        let repo = add(&db, &dir, None, None, None).await.unwrap();
        assert_eq!(repo.name, "demo");
        assert_eq!(repo.path, dir.canonicalize().unwrap());
        assert_eq!(repo.worktree_base, "../worktrees");
        assert!(repo.editor.is_none());
    }

    #[tokio::test]
    async fn add_twice_conflicts() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = git_dir(tmp.path(), "demo");
        let db = Database::open_in_memory().await.unwrap();

        add(&db, &dir, None, None, None).await.unwrap();
        let err = add(&db, &dir, Some("other"), None, None).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn add_with_explicit_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = git_dir(tmp.path(), "checkout");
        let db = Database::open_in_memory().await.unwrap();

        let repo = add(&db, &dir, Some("api"), Some(".trees"), Some(Editor::Zed))
            .await
            .unwrap();
        assert_eq!(repo.name, "api");
        assert_eq!(repo.worktree_base, ".trees");
        assert_eq!(repo.editor, Some(Editor::Zed));
    }

    #[tokio::test]
    async fn edit_clears_editor() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = git_dir(tmp.path(), "demo");
        let db = Database::open_in_memory().await.unwrap();
        add(&db, &dir, None, None, Some(Editor::Vscode))
            .await
            .unwrap();

        run(
            &db,
            tmp.path(),
            RepoAction::Edit {
                name: "demo".into(),
                rename: None,
                worktree_base: None,
                editor: None,
                clear_editor: true,
            },
        )
        .await
        .unwrap();
        let repo = db.get_repository_by_name("demo").await.unwrap().unwrap();
        assert!(repo.editor.is_none());
    }

    #[tokio::test]
    async fn remove_unknown_is_not_found() {
        let db = Database::open_in_memory().await.unwrap();
        let err = run(
            &db,
            Path::new("/"),
            RepoAction::Remove {
                name: "ghost".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
