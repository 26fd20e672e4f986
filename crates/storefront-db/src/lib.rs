//! # storefront-db: Data Access for Storefront Configuration
//!
//! Stores, store groups, scoped config and layout updates on SQLite,
//! through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storefront Data Flow                             │
//! │                                                                         │
//! │  Admin flow (save store, purge stale layout updates)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  storefront-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐  ┌────────────────┐  ┌──────────────────┐  │   │
//! │  │   │   Database    │  │  Resources     │  │  Collections     │  │   │
//! │  │   │   (pool.rs)   │  │  (repository/) │  │  (collection/)   │  │   │
//! │  │   │               │  │                │  │                  │  │   │
//! │  │   │ SqlitePool    │◄─│ StoreResource  │  │ LayoutUpdate-    │  │   │
//! │  │   │ DbConfig      │  │  + cascades    │  │  Collection      │  │   │
//! │  │   │ Migrations    │  │ StoreGroup...  │  │  Select builder  │  │   │
//! │  │   └───────────────┘  └────────────────┘  └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SQLite: core_store, core_store_group, core_config_data,        │   │
//! │  │          core_layout_update, core_layout_link                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Single-entity resources (store, store group, config, layout update)
//! - [`collection`] - Filterable result sets and the SELECT builder behind them
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! // Store counts exclude the admin store unless asked
//! let stores = db.stores().count_all(false).await?;
//!
//! // Drop theme 3's updates untouched for a week that nothing links to
//! let mut stale = db.layout_update_collection();
//! stale.filter_by_theme(3).filter_by_updated_before(7);
//! stale.delete_all().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod collection;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use collection::layout_update::LayoutUpdateCollection;
pub use collection::select::{BindValue, QueryOperator, Select, SortOrder};
pub use collection::{CollectionEvent, CollectionObserver, LoadPhase};
pub use repository::config_data::ConfigDataRepository;
pub use repository::layout_update::{LayoutUpdateDeleter, LayoutUpdateResource};
pub use repository::store::{StoreField, StoreResource};
pub use repository::store_group::StoreGroupRepository;
