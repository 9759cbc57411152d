//! Catalog queries for the `worktrees` table.

use relay_core::db::unix_timestamp;

use super::db::{Database, DatabaseError};
use super::models::{NewWorktree, Worktree, WorktreeListing};

const LISTING_SELECT: &str = "SELECT w.*, r.name AS repo_name, r.path AS repo_path \
     FROM worktrees w JOIN repositories r ON r.id = w.repo_id";

impl Database {
    /// Record a working tree. `(repo_id, branch_name)` must be unused.
    pub async fn create_worktree(&self, input: &NewWorktree<'_>) -> Result<Worktree, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO worktrees \
             (repo_id, issue_id, issue_identifier, issue_title, branch_name, path, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(input.repo_id)
        .bind(input.issue_id)
        .bind(input.issue_identifier)
        .bind(input.issue_title)
        .bind(input.branch_name)
        .bind(input.path)
        .bind(unix_timestamp())
        .execute(self.pool())
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::Conflict(_) => {
                DatabaseError::Conflict(format!("Worktree for branch '{}'", input.branch_name))
            }
            other => other,
        })?;

        let id = result.last_insert_rowid();
        self.get_worktree(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Worktree {id}")))
    }

    /// Get a working-tree record by ID.
    pub async fn get_worktree(&self, id: i64) -> Result<Option<Worktree>, DatabaseError> {
        let wt = sqlx::query_as::<_, Worktree>("SELECT * FROM worktrees WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(wt)
    }

    /// Most recent working tree recorded for an issue identifier.
    pub async fn get_worktree_by_issue_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<Worktree>, DatabaseError> {
        let wt = sqlx::query_as::<_, Worktree>(
            "SELECT * FROM worktrees WHERE issue_identifier = ? \
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(identifier)
        .fetch_optional(self.pool())
        .await?;
        Ok(wt)
    }

    /// Working tree of `repo_id` checked out on `branch`, if recorded.
    pub async fn find_worktree_by_branch(
        &self,
        repo_id: i64,
        branch: &str,
    ) -> Result<Option<Worktree>, DatabaseError> {
        let wt = sqlx::query_as::<_, Worktree>(
            "SELECT * FROM worktrees WHERE repo_id = ? AND branch_name = ?",
        )
        .bind(repo_id)
        .bind(branch)
        .fetch_optional(self.pool())
        .await?;
        Ok(wt)
    }

    /// List working trees of one repository, most recent first.
    pub async fn list_worktrees_by_repo(&self, repo_id: i64) -> Result<Vec<Worktree>, DatabaseError> {
        let rows = sqlx::query_as::<_, Worktree>(
            "SELECT * FROM worktrees WHERE repo_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(repo_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// List working trees joined with their repository, optionally filtered.
    pub async fn list_worktree_listings(
        &self,
        repo_id: Option<i64>,
    ) -> Result<Vec<WorktreeListing>, DatabaseError> {
        let rows = if let Some(repo_id) = repo_id {
            sqlx::query_as::<_, WorktreeListing>(&format!(
                "{LISTING_SELECT} WHERE w.repo_id = ? ORDER BY w.created_at DESC, w.id DESC"
            ))
            .bind(repo_id)
            .fetch_all(self.pool())
            .await?
        } else {
            sqlx::query_as::<_, WorktreeListing>(&format!(
                "{LISTING_SELECT} ORDER BY w.created_at DESC, w.id DESC"
            ))
            .fetch_all(self.pool())
            .await?
        };
        Ok(rows)
    }

    /// Every recorded working tree with its repository, most recent first.
    pub async fn list_all_worktrees(&self) -> Result<Vec<WorktreeListing>, DatabaseError> {
        self.list_worktree_listings(None).await
    }

    /// Delete a working-tree record. Returns whether a row was removed.
    pub async fn delete_worktree(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM worktrees WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count working trees, optionally limited to one repository.
    pub async fn count_worktrees(&self, repo_id: Option<i64>) -> Result<u32, DatabaseError> {
        let row: (i64,) = if let Some(repo_id) = repo_id {
            sqlx::query_as("SELECT COUNT(*) FROM worktrees WHERE repo_id = ?")
                .bind(repo_id)
                .fetch_one(self.pool())
                .await?
        } else {
            sqlx::query_as("SELECT COUNT(*) FROM worktrees")
                .fetch_one(self.pool())
                .await?
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(row.0 as u32)
    }
}
