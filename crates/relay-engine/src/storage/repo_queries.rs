//! Catalog queries for the `repositories` table.

use relay_core::config::DEFAULT_WORKTREE_BASE;
use relay_core::db::unix_timestamp;

use super::db::{Database, DatabaseError};
use super::models::{NewRepository, Repository, RepositoryRow, RepositoryUpdate};

const UPDATE_REPOSITORY_SQL: &str =
    "UPDATE repositories SET name = ?, path = ?, worktree_base = ?, editor = ? WHERE id = ?";

impl Database {
    // =========================================================================
    // Repository queries
    // =========================================================================

    /// Register a repository. Name and path must both be unused.
    pub async fn create_repository(
        &self,
        input: &NewRepository<'_>,
    ) -> Result<Repository, DatabaseError> {
        if self.get_repository_by_name(input.name).await?.is_some() {
            return Err(DatabaseError::Conflict(format!("Repository '{}'", input.name)));
        }
        if self.get_repository_by_path(input.path).await?.is_some() {
            return Err(DatabaseError::Conflict(format!(
                "Repository at {}",
                input.path
            )));
        }

        let result = sqlx::query(
            "INSERT INTO repositories (name, path, worktree_base, editor, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(input.name)
        .bind(input.path)
        .bind(input.worktree_base.unwrap_or(DEFAULT_WORKTREE_BASE))
        .bind(input.editor.map(|e| e.as_str()))
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        let id = result.last_insert_rowid();
        self.get_repository(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Repository {id}")))
    }

    /// Get a repository by ID.
    pub async fn get_repository(&self, id: i64) -> Result<Option<Repository>, DatabaseError> {
        let row = sqlx::query_as::<_, RepositoryRow>("SELECT * FROM repositories WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(Repository::from))
    }

    /// Get a repository by its unique name.
    pub async fn get_repository_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Repository>, DatabaseError> {
        let row = sqlx::query_as::<_, RepositoryRow>("SELECT * FROM repositories WHERE name = ?")
            .bind(name)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(Repository::from))
    }

    /// Get a repository by its unique checkout path.
    pub async fn get_repository_by_path(
        &self,
        path: &str,
    ) -> Result<Option<Repository>, DatabaseError> {
        let row = sqlx::query_as::<_, RepositoryRow>("SELECT * FROM repositories WHERE path = ?")
            .bind(path)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(Repository::from))
    }

    /// List all repositories, most recently created first.
    pub async fn list_repositories(&self) -> Result<Vec<Repository>, DatabaseError> {
        let rows = sqlx::query_as::<_, RepositoryRow>(
            "SELECT * FROM repositories ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Repository::from).collect())
    }

    /// Atomically fetch-then-update a repository inside a single transaction.
    ///
    /// Only supplied fields change. An empty update returns the stored record
    /// without writing. `created_at` is never touched.
    pub async fn update_repository(
        &self,
        id: i64,
        update: &RepositoryUpdate,
    ) -> Result<Repository, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let existing =
            sqlx::query_as::<_, RepositoryRow>("SELECT * FROM repositories WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DatabaseError::NotFound(format!("Repository {id}")))?;

        if update.is_empty() {
            tx.commit().await?;
            return Ok(existing.into());
        }

        let name = update.name.as_deref().unwrap_or(&existing.name);
        let path = update.path.as_deref().unwrap_or(&existing.path);
        let worktree_base = update
            .worktree_base
            .as_deref()
            .unwrap_or(&existing.worktree_base);
        let editor: Option<&str> = match update.editor {
            Some(v) => v.map(|e| e.as_str()),
            None => existing.editor.as_deref(),
        };

        sqlx::query(UPDATE_REPOSITORY_SQL)
            .bind(name)
            .bind(path)
            .bind(worktree_base)
            .bind(editor)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let updated = sqlx::query_as::<_, RepositoryRow>("SELECT * FROM repositories WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(updated.into())
    }

    /// Remove a repository and all its worktree records (transactionally).
    pub async fn delete_repository_by_name(&self, name: &str) -> Result<bool, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            "DELETE FROM worktrees WHERE repo_id IN (SELECT id FROM repositories WHERE name = ?)",
        )
        .bind(name)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM repositories WHERE name = ?")
            .bind(name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count the registered repositories.
    pub async fn count_repositories(&self) -> Result<u32, DatabaseError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM repositories")
            .fetch_one(self.pool())
            .await?;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(row.0 as u32)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use relay_core::Editor;

    use crate::storage::{Database, DatabaseError, NewRepository, NewWorktree, RepositoryUpdate};

    async fn create_test_repo(db: &Database, name: &str, path: &str) -> super::Repository {
        db.create_repository(&NewRepository {
            name,
            path,
            worktree_base: None,
            editor: None,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn create_and_get_repository() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = db
            .create_repository(&NewRepository {
                name: "demo",
                path: "/tmp/demo",
                worktree_base: Some("../wt"),
                editor: Some(Editor::Zed),
            })
            .await
            .unwrap();
        assert_eq!(repo.name, "demo");
        assert_eq!(repo.worktree_base, "../wt");
        assert_eq!(repo.editor, Some(Editor::Zed));

        let by_name = db.get_repository_by_name("demo").await.unwrap().unwrap();
        let by_path = db.get_repository_by_path("/tmp/demo").await.unwrap().unwrap();
        let by_id = db.get_repository(repo.id).await.unwrap().unwrap();
        assert_eq!(by_name, repo);
        assert_eq!(by_path, repo);
        assert_eq!(by_id, repo);
    }

    #[tokio::test]
    async fn default_worktree_base() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = create_test_repo(&db, "demo", "/tmp/demo").await;
        assert_eq!(repo.worktree_base, "../worktrees");
        assert!(repo.editor.is_none());
    }

    #[tokio::test]
    async fn lookup_miss_is_none() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(db.get_repository_by_name("nope").await.unwrap().is_none());
        assert!(db.get_repository_by_path("/nope").await.unwrap().is_none());
        assert!(db.get_repository(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_name_conflicts() {
        let db = Database::open_in_memory().await.unwrap();
        create_test_repo(&db, "demo", "/a").await;
        let err = db
            .create_repository(&NewRepository {
                name: "demo",
                path: "/b",
                worktree_base: None,
                editor: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn duplicate_path_conflicts() {
        let db = Database::open_in_memory().await.unwrap();
        create_test_repo(&db, "a", "/same/path").await;
        let err = db
            .create_repository(&NewRepository {
                name: "b",
                path: "/same/path",
                worktree_base: None,
                editor: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_most_recent_first() {
        let db = Database::open_in_memory().await.unwrap();
        create_test_repo(&db, "first", "/first").await;
        create_test_repo(&db, "second", "/second").await;
        create_test_repo(&db, "third", "/third").await;

        let names: Vec<_> = db
            .list_repositories()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = db
            .create_repository(&NewRepository {
                name: "demo",
                path: "/tmp/demo",
                worktree_base: Some("../wt"),
                editor: Some(Editor::Vscode),
            })
            .await
            .unwrap();

        let updated = db
            .update_repository(
                repo.id,
                &RepositoryUpdate {
                    editor: Some(Some(Editor::Zed)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.editor, Some(Editor::Zed));
        assert_eq!(updated.name, "demo");
        assert_eq!(updated.worktree_base, "../wt");
        assert_eq!(updated.created_at, repo.created_at);

        // Clear the editor
        let cleared = db
            .update_repository(
                repo.id,
                &RepositoryUpdate {
                    editor: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.editor.is_none());
        assert_eq!(cleared.worktree_base, "../wt");
    }

    #[tokio::test]
    async fn empty_update_is_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = create_test_repo(&db, "demo", "/tmp/demo").await;

        let first = db
            .update_repository(repo.id, &RepositoryUpdate::default())
            .await
            .unwrap();
        let second = db
            .update_repository(repo.id, &RepositoryUpdate::default())
            .await
            .unwrap();
        assert_eq!(first, repo);
        assert_eq!(second, repo);
    }

    #[tokio::test]
    async fn update_rename_into_existing_name_conflicts() {
        let db = Database::open_in_memory().await.unwrap();
        create_test_repo(&db, "a", "/a").await;
        let b = create_test_repo(&db, "b", "/b").await;

        let err = db
            .update_repository(
                b.id,
                &RepositoryUpdate {
                    name: Some("a".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let db = Database::open_in_memory().await.unwrap();
        let err = db
            .update_repository(99, &RepositoryUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_cascades_to_worktrees() {
        let db = Database::open_in_memory().await.unwrap();
        let demo = create_test_repo(&db, "demo", "/tmp/demo").await;
        let other = create_test_repo(&db, "other", "/tmp/other").await;

        for (repo_id, branch) in [(demo.id, "a"), (demo.id, "b"), (other.id, "c")] {
            db.create_worktree(&NewWorktree {
                repo_id,
                issue_id: "uuid",
                issue_identifier: "ENG-1",
                issue_title: None,
                branch_name: branch,
                path: "/tmp/wt",
            })
            .await
            .unwrap();
        }

        assert!(db.delete_repository_by_name("demo").await.unwrap());
        assert!(db.get_repository_by_name("demo").await.unwrap().is_none());
        assert!(db.list_worktrees_by_repo(demo.id).await.unwrap().is_empty());
        assert_eq!(db.count_worktrees(None).await.unwrap(), 1);
        assert_eq!(db.list_all_worktrees().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_nonexistent_returns_false() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(!db.delete_repository_by_name("nope").await.unwrap());
    }

    #[tokio::test]
    async fn count_repositories() {
        let db = Database::open_in_memory().await.unwrap();
        assert_eq!(db.count_repositories().await.unwrap(), 0);
        create_test_repo(&db, "a", "/a").await;
        create_test_repo(&db, "b", "/b").await;
        assert_eq!(db.count_repositories().await.unwrap(), 2);
    }
}
