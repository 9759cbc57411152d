//! Catalog connection and schema migrations.

use std::path::Path;

use relay_core::db::{Location, connect};
use sqlx::migrate::Migrator;
use sqlx::{Pool, Sqlite};
use tracing::debug;

pub use relay_core::db::DatabaseError;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Handle to the catalog. Cloning shares the pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if needed) the catalog at `path` and migrate it.
    pub async fn open(path: &Path) -> Result<Self, DatabaseError> {
        Self::migrated(connect(Location::File(path)).await?).await
    }

    /// Fresh in-memory catalog, used by tests.
    pub async fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::migrated(connect(Location::Memory).await?).await
    }

    async fn migrated(pool: Pool<Sqlite>) -> Result<Self, DatabaseError> {
        MIGRATOR.run(&pool).await?;
        debug!("Catalog migrations complete");
        Ok(Self { pool })
    }

    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}
