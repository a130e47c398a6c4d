//! Connection pool over the sqlx `Any` driver.

use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::AnyPool;
use std::path::Path;

use super::game_repo::SqlGameRepository;
use super::player_repo::SqlPlayerRepository;
use super::schema::{self, SchemaStatus};
use crate::persistence::PersistenceError;

const MAX_CONNECTIONS: u32 = 5;

/// Holds a connection pool to the stats database.
#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
}

impl Database {
    /// Connect to `url` and verify one connection can be opened.
    pub async fn connect(url: &str) -> Result<Self, PersistenceError> {
        install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Build a pool for `url` without connecting. Connection failures show up
    /// on first use, so a server can start while the database is down.
    pub fn connect_lazy(url: &str) -> Result<Self, PersistenceError> {
        install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_lazy(url)?;
        Ok(Self { pool })
    }

    /// sqlx URL for a SQLite file, creating its directory if needed.
    pub fn sqlite_url(path: &Path) -> Result<String, PersistenceError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(format!("sqlite://{}?mode=rwc", path.display()))
    }

    /// Create an in-memory database for testing with the schema applied.
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self, PersistenceError> {
        install_default_drivers();
        // Every connection to :memory: is a separate database
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let db = Self { pool };
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Bring the schema to the required version (see [`schema::ensure_schema`]).
    pub async fn ensure_schema(&self) -> Result<SchemaStatus, PersistenceError> {
        schema::ensure_schema(&self.pool).await
    }

    pub fn games(&self) -> SqlGameRepository {
        SqlGameRepository::new(self.pool.clone())
    }

    pub fn players(&self) -> SqlPlayerRepository {
        SqlPlayerRepository::new(self.pool.clone())
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = Database::new_in_memory().await.unwrap();
        let row: (i64,) = sqlx::query_as("SELECT 1").fetch_one(db.pool()).await.unwrap();
        assert_eq!(row.0, 1);
    }

    #[tokio::test]
    async fn test_open_file_based() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("nhltop.db");
        let url = Database::sqlite_url(&db_path).unwrap();

        let db = Database::connect(&url).await.unwrap();
        assert_eq!(db.ensure_schema().await.unwrap(), SchemaStatus::Created);
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_schema_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let url = Database::sqlite_url(&dir.path().join("nhltop.db")).unwrap();

        let db = Database::connect(&url).await.unwrap();
        db.ensure_schema().await.unwrap();
        db.pool().close().await;

        let reopened = Database::connect(&url).await.unwrap();
        assert_eq!(reopened.ensure_schema().await.unwrap(), SchemaStatus::UpToDate);
    }

    #[tokio::test]
    async fn test_lazy_pool_reports_errors_on_use() {
        let dir = tempfile::tempdir().unwrap();
        // Read-only mode on a missing file cannot be opened
        let url = format!("sqlite://{}?mode=ro", dir.path().join("missing.db").display());
        let db = Database::connect_lazy(&url).unwrap();
        let err = db.ensure_schema().await.unwrap_err();
        assert!(matches!(err, PersistenceError::Database(_)));
    }
}
