//! # tienda-db: Storage Layer for Tienda
//!
//! This crate persists orders and coupons for the Tienda store in SQLite,
//! using sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tienda Data Flow                                 │
//! │                                                                         │
//! │  Checkout / admin request                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tienda-core  price() / checkout() / transition() / aggregate()        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tienda-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  order.rs     │    │  (embedded)  │  │   │
//! │  │   │ SqlitePool    │◄───│  coupon.rs    │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   StoreConfig (config.rs) ← TIENDA_* environment variables     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │                  TIENDA_DB_PATH (./tienda_dev.db)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Store configuration from the environment
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Order and coupon repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tienda_db::{Database, StoreConfig};
//!
//! let config = StoreConfig::from_env()?;
//! let db = Database::open(&config).await?;
//!
//! let order = config.pricing_engine().checkout(&cart, coupon.as_ref(), method, destination, Utc::now())?;
//! db.orders().insert(&order).await?;
//!
//! let snapshot = db.metrics(&Utc::now()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, StoreConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DbLocation};

// Repository re-exports for convenience
pub use repository::coupon::CouponRepository;
pub use repository::order::OrderRepository;
