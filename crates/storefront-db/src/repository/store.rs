//! # Store Resource
//!
//! Persistence for store views, including the side effects a save or a
//! delete has on other tables.
//!
//! ## Cascades
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         After Save                                      │
//! │                                                                         │
//! │  1. UpdateGroupDefaultStore                                            │
//! │     group has exactly one store? ──yes──► group.default = this store   │
//! │                                                                         │
//! │  2. ChangeGroup                                                        │
//! │     moved out of original group                                        │
//! │     AND original group's default is this store?                        │
//! │                              ──yes──► original.default = 0             │
//! │                                                                         │
//! │                         After Delete                                    │
//! │                                                                         │
//! │  1. DeleteStoreConfig                                                  │
//! │     DELETE core_config_data WHERE scope = 'stores'                     │
//! │                              AND scope_id = store_id                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cascades run on the transaction of the write that triggered them.

use sqlx::{SqliteConnection, SqlitePool};
use storefront_core::validation::{validate_store_code, validate_store_name};
use storefront_core::{Store, ADMIN_STORE_CODE, DEFAULT_STORE_ID, SCOPE_STORES};
use tracing::{debug, info};

use crate::collection::select::{BindValue, QueryOperator, Select, SortOrder};
use crate::error::{DbError, DbResult};
use crate::repository::{check_unique, UniqueField};

/// Store table.
pub const STORE_TABLE: &str = "core_store";

/// Fields that must be unique across stores.
pub const STORE_UNIQUE_FIELDS: &[UniqueField] = &[UniqueField {
    field: "code",
    title: "Store with the same code",
}];

/// Side effect run after a store write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreCascade {
    /// Make the store its group's default if it is the group's only store.
    UpdateGroupDefaultStore,
    /// Clear the original group's default if the store was it and moved away.
    ChangeGroup,
    /// Drop the store's store-scoped config rows.
    DeleteStoreConfig,
}

/// Cascades run after INSERT/UPDATE, in this order.
pub const AFTER_SAVE: &[StoreCascade] = &[
    StoreCascade::UpdateGroupDefaultStore,
    StoreCascade::ChangeGroup,
];

/// Cascades run after DELETE, in this order.
pub const AFTER_DELETE: &[StoreCascade] = &[StoreCascade::DeleteStoreConfig];

/// Columns a store can be loaded by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreField {
    StoreId,
    Code,
    GroupId,
    WebsiteId,
}

impl StoreField {
    pub fn column(self) -> &'static str {
        match self {
            StoreField::StoreId => "main_table.store_id",
            StoreField::Code => "main_table.code",
            StoreField::GroupId => "main_table.group_id",
            StoreField::WebsiteId => "main_table.website_id",
        }
    }
}

/// Repository for store rows.
///
/// ## Usage
/// ```rust,ignore
/// let stores = db.stores();
///
/// let mut store = Store::new("en_us", 1, group.group_id);
/// stores.save(&mut store).await?;          // group default set if first store
///
/// let found = stores.load_by(StoreField::Code, "en_us".into()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct StoreResource {
    pool: SqlitePool,
}

impl StoreResource {
    /// Creates a new StoreResource.
    pub fn new(pool: SqlitePool) -> Self {
        StoreResource { pool }
    }

    /// Unique fields checked before every write.
    pub fn unique_fields(&self) -> &'static [UniqueField] {
        STORE_UNIQUE_FIELDS
    }

    /// Counts stores. The admin store is left out unless `include_admin`.
    pub async fn count_all(&self, include_admin: bool) -> DbResult<i64> {
        let count: i64 = if include_admin {
            sqlx::query_scalar("SELECT COUNT(*) FROM core_store")
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar("SELECT COUNT(*) FROM core_store WHERE code <> ?1")
                .bind(ADMIN_STORE_CODE)
                .fetch_one(&self.pool)
                .await?
        };

        Ok(count)
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// The single-row load query for `field = value`.
    ///
    /// Ordered by `sort_order` so that a lookup by a non-unique column
    /// always returns the same first match.
    pub fn load_select(&self, field: StoreField, value: BindValue) -> Select {
        let mut select = Select::from(STORE_TABLE);
        select
            .filter(field.column(), QueryOperator::Eq(value))
            .order_by("main_table.sort_order", SortOrder::Asc)
            .limit(Some(1));
        select
    }

    /// Loads the first store matching `field = value`.
    ///
    /// ## Returns
    /// * `Ok(Some(Store))` - Store found, `original_group_id` set to its group
    /// * `Ok(None)` - No match
    pub async fn load_by(&self, field: StoreField, value: BindValue) -> DbResult<Option<Store>> {
        let mut query = self.load_select(field, value).build();

        let store = query
            .build_query_as::<Store>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(store.map(snapshot_group))
    }

    /// Loads a store by id.
    pub async fn load(&self, store_id: i64) -> DbResult<Option<Store>> {
        self.load_by(StoreField::StoreId, store_id.into()).await
    }

    /// Stores of a group, by `sort_order` then id.
    pub async fn list_by_group(&self, group_id: i64) -> DbResult<Vec<Store>> {
        let stores = sqlx::query_as::<_, Store>(
            r#"
            SELECT store_id, code, website_id, group_id, name, sort_order, is_active
            FROM core_store
            WHERE group_id = ?1
            ORDER BY sort_order, store_id
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(stores.into_iter().map(snapshot_group).collect())
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// Inserts or updates a store, then runs [`AFTER_SAVE`].
    ///
    /// On success `store.store_id` is set and `original_group_id` moves to
    /// the saved group.
    ///
    /// ## Returns
    /// * `Err(DbError::Validation)` - bad code or name, nothing written
    /// * `Err(DbError::UniqueViolation)` - code taken, nothing written
    /// * `Err(DbError::NotFound)` - updating a store that no longer exists
    pub async fn save(&self, store: &mut Store) -> DbResult<()> {
        validate_store_code(&store.code)?;
        validate_store_name(&store.name)?;

        let mut tx = self.pool.begin().await?;

        for unique in self.unique_fields() {
            let value = unique_value(store, unique.field)?;
            check_unique(&mut *tx, STORE_TABLE, "store_id", store.store_id, unique, value).await?;
        }

        let store_id = match store.store_id {
            None => insert_store(&mut *tx, store).await?,
            Some(store_id) => {
                update_store(&mut *tx, store_id, store).await?;
                store_id
            }
        };
        store.store_id = Some(store_id);

        self.after_save(&mut *tx, store).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        store.original_group_id = Some(store.group_id);
        debug!(store_id, code = %store.code, "Store saved");
        Ok(())
    }

    /// Deletes a store, then runs [`AFTER_DELETE`].
    pub async fn delete(&self, store: &Store) -> DbResult<()> {
        let store_id = store
            .store_id
            .ok_or_else(|| DbError::not_found("Store", &store.code))?;

        debug!(store_id, code = %store.code, "Deleting store");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM core_store WHERE store_id = ?1")
            .bind(store_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Store", store_id));
        }

        self.after_delete(&mut *tx, store).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    // =========================================================================
    // Cascades
    // =========================================================================

    /// Runs [`AFTER_SAVE`] for a store that was just written on `conn`.
    pub async fn after_save(&self, conn: &mut SqliteConnection, store: &Store) -> DbResult<()> {
        for step in AFTER_SAVE {
            run_cascade(conn, *step, store).await?;
        }
        Ok(())
    }

    /// Runs [`AFTER_DELETE`] for a store that was just deleted on `conn`.
    pub async fn after_delete(&self, conn: &mut SqliteConnection, store: &Store) -> DbResult<()> {
        for step in AFTER_DELETE {
            run_cascade(conn, *step, store).await?;
        }
        Ok(())
    }
}

/// Value `store` holds in the unique column `field`.
fn unique_value<'a>(store: &'a Store, field: &str) -> DbResult<&'a str> {
    match field {
        "code" => Ok(&store.code),
        "name" => Ok(&store.name),
        other => Err(DbError::Internal(format!(
            "store column '{other}' cannot be checked for uniqueness"
        ))),
    }
}

/// Remembers the loaded group so a later save can detect a move.
fn snapshot_group(mut store: Store) -> Store {
    store.original_group_id = Some(store.group_id);
    store
}

async fn insert_store(conn: &mut SqliteConnection, store: &Store) -> DbResult<i64> {
    debug!(code = %store.code, group_id = store.group_id, "Inserting store");

    let result = sqlx::query(
        r#"
        INSERT INTO core_store (code, website_id, group_id, name, sort_order, is_active)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&store.code)
    .bind(store.website_id)
    .bind(store.group_id)
    .bind(&store.name)
    .bind(store.sort_order)
    .bind(store.is_active)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

async fn update_store(conn: &mut SqliteConnection, store_id: i64, store: &Store) -> DbResult<()> {
    debug!(store_id, code = %store.code, "Updating store");

    let result = sqlx::query(
        r#"
        UPDATE core_store SET
            code = ?2,
            website_id = ?3,
            group_id = ?4,
            name = ?5,
            sort_order = ?6,
            is_active = ?7
        WHERE store_id = ?1
        "#,
    )
    .bind(store_id)
    .bind(&store.code)
    .bind(store.website_id)
    .bind(store.group_id)
    .bind(&store.name)
    .bind(store.sort_order)
    .bind(store.is_active)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Store", store_id));
    }

    Ok(())
}

async fn run_cascade(conn: &mut SqliteConnection, step: StoreCascade, store: &Store) -> DbResult<()> {
    let store_id = store
        .store_id
        .ok_or_else(|| DbError::not_found("Store", &store.code))?;

    match step {
        StoreCascade::UpdateGroupDefaultStore => {
            update_group_default_store(conn, store.group_id, store_id).await
        }
        StoreCascade::ChangeGroup => change_group(conn, store, store_id).await,
        StoreCascade::DeleteStoreConfig => delete_store_config(conn, store_id).await,
    }
}

/// Makes `store_id` the group's default when it is the group's only store.
async fn update_group_default_store(conn: &mut SqliteConnection, group_id: i64, store_id: i64) -> DbResult<()> {
    let members: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM core_store WHERE group_id = ?1")
        .bind(group_id)
        .fetch_one(&mut *conn)
        .await?;

    if members == 1 {
        debug!(group_id, store_id, "Store is the only one in its group, making it the default");

        sqlx::query("UPDATE core_store_group SET default_store_id = ?1 WHERE group_id = ?2")
            .bind(store_id)
            .bind(group_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Clears the original group's default when the store that was it moved out.
async fn change_group(conn: &mut SqliteConnection, store: &Store, store_id: i64) -> DbResult<()> {
    if !store.group_changed() {
        return Ok(());
    }
    let Some(original_group_id) = store.original_group_id else {
        return Ok(());
    };

    let default_store_id: Option<i64> =
        sqlx::query_scalar("SELECT default_store_id FROM core_store_group WHERE group_id = ?1")
            .bind(original_group_id)
            .fetch_optional(&mut *conn)
            .await?;

    if default_store_id == Some(store_id) {
        info!(
            store_id,
            original_group_id,
            new_group_id = store.group_id,
            "Default store moved to another group, resetting original group's default"
        );

        sqlx::query("UPDATE core_store_group SET default_store_id = ?1 WHERE group_id = ?2")
            .bind(DEFAULT_STORE_ID)
            .bind(original_group_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

async fn delete_store_config(conn: &mut SqliteConnection, store_id: i64) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM core_config_data WHERE scope = ?1 AND scope_id = ?2")
        .bind(SCOPE_STORES)
        .bind(store_id)
        .execute(&mut *conn)
        .await?;

    debug!(store_id, removed = result.rows_affected(), "Removed store config rows");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
