//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  DbConfig::new(path) / DbConfig::from_env()                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ├── db.stores()                    → StoreResource                │
//! │       ├── db.store_groups()              → StoreGroupRepository         │
//! │       ├── db.config_data()               → ConfigDataRepository         │
//! │       ├── db.layout_updates()            → LayoutUpdateResource         │
//! │       └── db.layout_update_collection()  → LayoutUpdateCollection       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled so readers don't block
//! the writer while a store save and its cascades are in flight.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::collection::layout_update::LayoutUpdateCollection;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::config_data::ConfigDataRepository;
use crate::repository::layout_update::LayoutUpdateResource;
use crate::repository::store::StoreResource;
use crate::repository::store_group::StoreGroupRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Environment variable holding the database file path.
pub const ENV_DB_PATH: &str = "STOREFRONT_DB_PATH";

/// Environment variable holding the pool size.
pub const ENV_DB_MAX_CONNECTIONS: &str = "STOREFRONT_DB_MAX_CONNECTIONS";

/// Environment variable toggling migrations on connect (`true`/`false`).
pub const ENV_DB_RUN_MIGRATIONS: &str = "STOREFRONT_DB_RUN_MIGRATIONS";

/// Database file used when nothing is configured.
pub const DEFAULT_DB_PATH: &str = "./storefront.db";

/// Path value that selects an in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/storefront.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::in_memory()).await?;
    /// // Database is isolated, perfect for tests
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY_PATH),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }

    /// Whether this config points at a private in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY_PATH
    }

    /// Loads configuration from environment variables with fallback to defaults.
    ///
    /// | Variable                          | Default              |
    /// |-----------------------------------|----------------------|
    /// | `STOREFRONT_DB_PATH`              | `./storefront.db`    |
    /// | `STOREFRONT_DB_MAX_CONNECTIONS`   | `5`                  |
    /// | `STOREFRONT_DB_RUN_MIGRATIONS`    | `true`               |
    pub fn from_env() -> DbResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DbConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> DbResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup(ENV_DB_PATH).unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let mut config = DbConfig::new(path);

        if let Some(raw) = lookup(ENV_DB_MAX_CONNECTIONS) {
            let max: u32 = raw
                .trim()
                .parse()
                .map_err(|_| DbError::invalid_config(ENV_DB_MAX_CONNECTIONS, format!("'{raw}' is not a number")))?;
            if max == 0 {
                return Err(DbError::invalid_config(ENV_DB_MAX_CONNECTIONS, "must be at least 1"));
            }
            let min = config.min_connections.min(max);
            config = config.max_connections(max).min_connections(min);
        }

        if let Some(raw) = lookup(ENV_DB_RUN_MIGRATIONS) {
            let run: bool = raw
                .trim()
                .parse()
                .map_err(|_| DbError::invalid_config(ENV_DB_RUN_MIGRATIONS, format!("'{raw}' is not true/false")))?;
            config = config.run_migrations(run);
        }

        Ok(config)
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing resource and collection access.
///
/// Cheap to clone: it only holds the pool.
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous (balance of safety/speed)
    ///    - Foreign keys enabled (layout links cascade with their update)
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        // sqlite://path creates file if not exists; each `sqlite::memory:` parse
        // gets its own private database
        let connect_url = if config.is_in_memory() {
            IN_MEMORY_URL.to_string()
        } else {
            format!("sqlite://{}?mode=rwc", config.database_path.display())
        };

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // SQLite has them disabled by default for backwards compatibility
            .foreign_keys(true)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations.
    ///
    /// Called by `new()` when `run_migrations` is set.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the store resource.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let mut store = Store::new("en_us", 1, 1);
    /// db.stores().save(&mut store).await?;
    /// ```
    pub fn stores(&self) -> StoreResource {
        StoreResource::new(self.pool.clone())
    }

    /// Returns the store group repository.
    pub fn store_groups(&self) -> StoreGroupRepository {
        StoreGroupRepository::new(self.pool.clone())
    }

    /// Returns the config data repository.
    pub fn config_data(&self) -> ConfigDataRepository {
        ConfigDataRepository::new(self.pool.clone())
    }

    /// Returns the layout update resource.
    pub fn layout_updates(&self) -> LayoutUpdateResource {
        LayoutUpdateResource::new(self.pool.clone())
    }

    /// Returns a fresh layout update collection with no filters applied.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let mut stale = db.layout_update_collection();
    /// stale.filter_by_updated_before(30).filter_by_no_links(&[]);
    /// stale.delete_all().await?;
    /// ```
    pub fn layout_update_collection(&self) -> LayoutUpdateCollection {
        LayoutUpdateCollection::new(self.pool.clone(), self.layout_updates())
    }

    /// Closes the database connection pool.
    ///
    /// After calling close, all operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_closed_database_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;

        assert!(!db.health_check().await);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
    }

    #[test]
    fn test_config_defaults_from_empty_env() {
        let config = DbConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.max_connections, 5);
        assert!(config.run_migrations);
    }

    #[test]
    fn test_config_from_env_values() {
        let config = DbConfig::from_lookup(lookup_from(&[
            (ENV_DB_PATH, "/var/lib/storefront.db"),
            (ENV_DB_MAX_CONNECTIONS, "8"),
            (ENV_DB_RUN_MIGRATIONS, "false"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/storefront.db"));
        assert_eq!(config.max_connections, 8);
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_config_clamps_min_to_max_connections() {
        let config = DbConfig::from_lookup(lookup_from(&[(ENV_DB_MAX_CONNECTIONS, "1")])).unwrap();

        assert_eq!(config.max_connections, 1);
        assert!(config.min_connections <= 1);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let err = DbConfig::from_lookup(lookup_from(&[(ENV_DB_MAX_CONNECTIONS, "lots")])).unwrap_err();
        assert!(matches!(err, DbError::InvalidConfig { .. }));

        let err = DbConfig::from_lookup(lookup_from(&[(ENV_DB_MAX_CONNECTIONS, "0")])).unwrap_err();
        assert!(matches!(err, DbError::InvalidConfig { .. }));

        let err = DbConfig::from_lookup(lookup_from(&[(ENV_DB_RUN_MIGRATIONS, "yes")])).unwrap_err();
        assert!(matches!(err, DbError::InvalidConfig { .. }));
    }
}
