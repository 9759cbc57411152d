//! Catalog models.

use std::path::{Path, PathBuf};

use relay_core::Editor;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Repository record as stored.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RepositoryRow {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub worktree_base: String,
    pub editor: Option<String>,
    pub created_at: i64,
}

/// A git checkout registered in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    pub id: i64,
    pub name: String,
    pub path: PathBuf,
    /// Relative to `path`; new working trees land in `path/worktree_base/<branch>`.
    pub worktree_base: String,
    pub editor: Option<Editor>,
    pub created_at: i64,
}

impl Repository {
    /// Directory that holds this repository's working trees.
    pub fn worktree_root(&self) -> PathBuf {
        self.path.join(&self.worktree_base)
    }

    /// Whether `dir` is this checkout or lies inside it.
    pub fn contains(&self, dir: &Path) -> bool {
        dir.starts_with(&self.path)
    }
}

impl From<RepositoryRow> for Repository {
    fn from(row: RepositoryRow) -> Self {
        let editor = row.editor.as_deref().and_then(|e| match e.parse() {
            Ok(editor) => Some(editor),
            Err(err) => {
                warn!(repo = %row.name, error = %err, "Ignoring unknown stored editor");
                None
            }
        });

        Self {
            id: row.id,
            name: row.name,
            path: PathBuf::from(row.path),
            worktree_base: row.worktree_base,
            editor,
            created_at: row.created_at,
        }
    }
}

/// Fields for a new repository.
#[derive(Debug, Clone)]
pub struct NewRepository<'a> {
    pub name: &'a str,
    pub path: &'a str,
    /// Defaults to `../worktrees` when `None`.
    pub worktree_base: Option<&'a str>,
    pub editor: Option<Editor>,
}

/// Partial repository update: `None` leaves the column untouched.
///
/// `editor` is doubly optional: `Some(None)` clears the stored editor.
#[derive(Debug, Clone, Default)]
pub struct RepositoryUpdate {
    pub name: Option<String>,
    pub path: Option<String>,
    pub worktree_base: Option<String>,
    pub editor: Option<Option<Editor>>,
}

impl RepositoryUpdate {
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.path.is_none()
            && self.worktree_base.is_none()
            && self.editor.is_none()
    }
}

/// Working-tree record from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Worktree {
    pub id: i64,
    pub repo_id: i64,
    pub issue_id: String,
    pub issue_identifier: String,
    pub issue_title: Option<String>,
    pub branch_name: String,
    pub path: String,
    pub created_at: i64,
}

/// Fields for a new working-tree record.
#[derive(Debug, Clone)]
pub struct NewWorktree<'a> {
    pub repo_id: i64,
    pub issue_id: &'a str,
    pub issue_identifier: &'a str,
    pub issue_title: Option<&'a str>,
    pub branch_name: &'a str,
    pub path: &'a str,
}

/// A working tree joined with its owning repository, for display.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorktreeListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub worktree: Worktree,
    pub repo_name: String,
    pub repo_path: String,
}
