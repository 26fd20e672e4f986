//! # Repository Module
//!
//! Single-entity persistence for the storefront tables.
//!
//! ## Resource Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Save With Cascades                                   │
//! │                                                                         │
//! │  db.stores().save(&mut store)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate input (storefront-core)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN ────────────────────────────────────────────┐                    │
//! │  unique pre-check   (UniqueViolation, nothing written)                 │
//! │  INSERT / UPDATE                                   │  one transaction   │
//! │  after-save cascades, in declared order            │                    │
//! │  COMMIT ───────────────────────────────────────────┘                    │
//! │                                                                         │
//! │  Any error drops the transaction, which rolls everything back.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`StoreResource`](store::StoreResource) - Store CRUD with group/config cascades
//! - [`StoreGroupRepository`](store_group::StoreGroupRepository) - Store groups
//! - [`ConfigDataRepository`](config_data::ConfigDataRepository) - Scoped config values
//! - [`LayoutUpdateResource`](layout_update::LayoutUpdateResource) - Layout updates and links

pub mod config_data;
pub mod layout_update;
pub mod store;
pub mod store_group;

use sqlx::SqliteConnection;
use tracing::debug;

use crate::collection::select::{QueryOperator, Select};
use crate::error::{DbError, DbResult};

/// A column whose values must not repeat across rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueField {
    pub field: &'static str,
    /// Subject of the conflict message, e.g. "Store with the same code".
    pub title: &'static str,
}

/// Fails with [`DbError::UniqueViolation`] when another row of `table`
/// already holds `value` in `unique.field`.
///
/// `id` excludes the row being updated; pass `None` for inserts.
pub(crate) async fn check_unique(
    conn: &mut SqliteConnection,
    table: &str,
    id_column: &str,
    id: Option<i64>,
    unique: &UniqueField,
    value: &str,
) -> DbResult<()> {
    let mut select = Select::from(table);
    select.filter(unique.field, QueryOperator::Eq(value.into()));
    if let Some(id) = id {
        select.filter(id_column, QueryOperator::Neq(id.into()));
    }
    select.limit(Some(1));

    let existing = select.build().build().fetch_optional(&mut *conn).await?;

    if existing.is_some() {
        debug!(table, field = unique.field, value, "Unique field conflict");
        return Err(DbError::duplicate(unique.field, unique.title));
    }

    Ok(())
}
