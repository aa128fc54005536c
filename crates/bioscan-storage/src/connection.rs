//! Opening the template database.
//!
//! A file-backed database runs in WAL mode so listing templates never blocks
//! an insert or a purge. The in-memory variant is meant for tests and lives
//! on exactly one connection.

use crate::error::{StorageError, StorageResult};
use bioscan_core::constants::{DEFAULT_DATABASE_PATH, DEFAULT_MAX_CONNECTIONS};
use sqlx::ConnectOptions;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// How long a writer waits on SQLite's file lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the template database lives and how it is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// SQLite database file. Created, along with missing parent
    /// directories, on first open.
    pub database_path: PathBuf,

    /// Upper bound on pooled connections.
    pub max_connections: u32,

    /// Apply pending migrations when the database is opened.
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Default::default()
        }
    }

    /// Set the pool size. Zero is raised to one when the pool is built.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn auto_migrate(mut self, migrate: bool) -> Self {
        self.auto_migrate = migrate;
        self
    }
}

/// Pooled handle to the template database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database described by `config`.
    ///
    /// # Errors
    ///
    /// `StorageError::Configuration` if the parent directory cannot be
    /// created, `Database` if SQLite refuses the file, `Migration` if a
    /// migration fails.
    ///
    /// ```no_run
    /// use bioscan_storage::{Database, DatabaseConfig};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let db = Database::open(&DatabaseConfig::new("data/bioscan.db")).await?;
    /// db.health_check().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn open(config: &DatabaseConfig) -> StorageResult<Self> {
        ensure_parent_dir(&config.database_path)?;

        let options = SqliteConnectOptions::new()
            .filename(&config.database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;

        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections.max(1),
            "Opened template database"
        );

        let db = Self { pool };
        if config.auto_migrate {
            db.migrate().await?;
        }
        Ok(db)
    }

    /// Fresh, migrated in-memory database.
    ///
    /// An in-memory SQLite database is dropped with its connection, so the
    /// pool keeps a single connection that never idles out or expires.
    pub async fn in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Apply the embedded migrations. Already-applied ones are skipped.
    pub async fn migrate(&self) -> StorageResult<()> {
        debug!("Running database migrations");
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool, waiting for checked-out connections to come back.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Template database closed");
    }

    pub async fn health_check(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn ensure_parent_dir(path: &Path) -> StorageResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Configuration(format!(
                    "cannot create database directory {}: {e}",
                    parent.display()
                ))
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.database_path, PathBuf::from("bioscan.db"));
        assert_eq!(config.max_connections, 10);
        assert!(config.auto_migrate);
    }

    #[test]
    fn test_database_config_builder() {
        let config = DatabaseConfig::new("data/test.db")
            .max_connections(2)
            .auto_migrate(false);
        assert_eq!(config.database_path, PathBuf::from("data/test.db"));
        assert_eq!(config.max_connections, 2);
        assert!(!config.auto_migrate);
    }

    #[test]
    fn test_parent_dir_blocked_by_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let err = ensure_parent_dir(&blocker.join("nested").join("bioscan.db")).unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_open_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("bioscan.db");

        let db = Database::open(&DatabaseConfig::new(&path).max_connections(0))
            .await
            .unwrap();
        db.health_check().await.unwrap();
        db.close().await;

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_in_memory_health_check() {
        let db = Database::in_memory().await.unwrap();
        db.health_check().await.unwrap();
        db.close().await;
    }
}
