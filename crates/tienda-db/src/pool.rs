//! # Store Database
//!
//! Opens the SQLite store that backs checkout, order administration and
//! the dashboard, and hands out the repositories over one shared pool.
//!
//! ## Who Uses the Pool
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  StoreConfig::from_env()                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::from(&store)      file or :memory:, pool size               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::connect(config)   open + migrate                            │
//! │       │                                                                 │
//! │       ├── checkout   ──► orders().insert(&order)                       │
//! │       ├── admin      ──► orders().transition(actor, id, version, ..)   │
//! │       ├── coupons    ──► coupons().find_by_code(entered)               │
//! │       └── dashboard  ──► metrics(&now)                                 │
//! │                                                                         │
//! │  Writers queue on SQLite's lock for up to `busy_timeout`; two admins   │
//! │  racing on one order are told apart by the order's version column.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! File databases run in WAL mode so dashboard reads do not wait on
//! checkout writes. In-memory databases live exactly as long as their single
//! connection, so that connection is never recycled.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeZone};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tienda_core::metrics::{aggregate, MetricsSnapshot};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::coupon::CouponRepository;
use crate::repository::order::OrderRepository;

/// Connections kept for a file database unless configured otherwise.
pub const DEFAULT_POOL_SIZE: u32 = 4;

/// How long a writer waits on SQLite's lock before giving up.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Configuration
// =============================================================================

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    Memory,
}

/// How to open the store.
///
/// Usually built from [`StoreConfig`]:
/// ```rust,ignore
/// let store = StoreConfig::from_env()?;
/// let db = Database::connect(DbConfig::from(&store)).await?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub location: DbLocation,
    /// Upper bound on open connections. Ignored for [`DbLocation::Memory`].
    pub pool_size: u32,
    pub busy_timeout: Duration,
    /// Apply pending migrations while connecting.
    pub run_migrations: bool,
}

impl DbConfig {
    /// A store in the SQLite file at `path`, created on first use.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: DbLocation::File(path.into()),
            pool_size: DEFAULT_POOL_SIZE,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            run_migrations: true,
        }
    }

    /// A private, empty store that disappears with the `Database`. For tests
    /// and demos.
    pub fn in_memory() -> Self {
        DbConfig {
            location: DbLocation::Memory,
            pool_size: 1,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            run_migrations: true,
        }
    }

    pub fn pool_size(mut self, size: u32) -> Self {
        self.pool_size = size.max(1);
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Connections the pool will actually open.
    pub fn max_connections(&self) -> u32 {
        match self.location {
            DbLocation::File(_) => self.pool_size.max(1),
            DbLocation::Memory => 1,
        }
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.location {
            DbLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
            DbLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };

        Ok(options.foreign_keys(true).busy_timeout(self.busy_timeout))
    }

    fn describe(&self) -> String {
        match &self.location {
            DbLocation::File(path) => path.display().to_string(),
            DbLocation::Memory => ":memory:".to_string(),
        }
    }
}

impl From<&StoreConfig> for DbConfig {
    fn from(store: &StoreConfig) -> Self {
        DbConfig::file(&store.database_path).pool_size(store.db_pool_size)
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the store. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the store described by `config`.
    ///
    /// ## Errors
    /// - `ConnectionFailed` if the file cannot be opened or created
    /// - `MigrationFailed` if a pending migration does not apply
    pub async fn connect(config: DbConfig) -> DbResult<Self> {
        let target = config.describe();
        info!(database = %target, "Opening store database");

        let options = config.connect_options()?;
        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections())
            .min_connections(1)
            .acquire_timeout(config.busy_timeout);

        if config.location == DbLocation::Memory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(format!("{target}: {e}")))?;

        debug!(
            database = %target,
            max_connections = config.max_connections(),
            "Store pool ready"
        );

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Opens the store named by a loaded [`StoreConfig`].
    pub async fn open(store: &StoreConfig) -> DbResult<Self> {
        Self::connect(DbConfig::from(store)).await
    }

    /// Convenience for [`DbConfig::file`] with default settings.
    pub async fn open_file(path: impl AsRef<Path>) -> DbResult<Self> {
        Self::connect(DbConfig::file(path.as_ref())).await
    }

    /// Applies pending migrations. Already-applied ones are skipped.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Raw pool, for queries the repositories do not cover.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    pub fn coupons(&self) -> CouponRepository {
        CouponRepository::new(self.pool.clone())
    }

    /// Dashboard figures as seen at `now`, recomputed from every stored
    /// order. `now`'s time zone decides what "today" and "this month" mean.
    pub async fn metrics<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DbResult<MetricsSnapshot> {
        let summaries = self.orders().summaries().await?;
        Ok(aggregate(&summaries, now))
    }

    /// Round-trips a trivial query.
    ///
    /// ## Errors
    /// `ConnectionFailed` once the pool is closed, otherwise whatever the
    /// query failed with.
    pub async fn ping(&self) -> DbResult<()> {
        if self.pool.is_closed() {
            return Err(DbError::ConnectionFailed("pool is closed".to_string()));
        }
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Closes every connection. Later calls through any clone fail.
    pub async fn close(&self) {
        info!("Closing store database");
        self.pool.close().await;
    }
}
