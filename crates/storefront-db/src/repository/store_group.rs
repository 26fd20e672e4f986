//! # Store Group Repository
//!
//! Groups own their stores (`ON DELETE CASCADE`) and point at one of them as
//! the default. The default pointer is maintained by the store save cascade;
//! [`StoreGroupRepository::set_default_store`] is the manual override.

use sqlx::SqlitePool;
use storefront_core::validation::validate_store_name;
use storefront_core::StoreGroup;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Repository for store group rows.
#[derive(Debug, Clone)]
pub struct StoreGroupRepository {
    pool: SqlitePool,
}

impl StoreGroupRepository {
    /// Creates a new StoreGroupRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StoreGroupRepository { pool }
    }

    /// Creates a group with no default store.
    pub async fn create(&self, website_id: i64, name: &str, root_category_id: i64) -> DbResult<StoreGroup> {
        validate_store_name(name)?;

        debug!(website_id, name, "Creating store group");

        let result = sqlx::query(
            r#"
            INSERT INTO core_store_group (website_id, name, root_category_id, default_store_id)
            VALUES (?1, ?2, ?3, 0)
            "#,
        )
        .bind(website_id)
        .bind(name)
        .bind(root_category_id)
        .execute(&self.pool)
        .await?;

        Ok(StoreGroup {
            group_id: result.last_insert_rowid(),
            website_id,
            name: name.to_string(),
            root_category_id,
            default_store_id: 0,
        })
    }

    /// Gets a group by id.
    pub async fn get_by_id(&self, group_id: i64) -> DbResult<Option<StoreGroup>> {
        let group = sqlx::query_as::<_, StoreGroup>(
            r#"
            SELECT group_id, website_id, name, root_category_id, default_store_id
            FROM core_store_group
            WHERE group_id = ?1
            "#,
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    /// Points the group at `store_id` as its default.
    pub async fn set_default_store(&self, group_id: i64, store_id: i64) -> DbResult<()> {
        debug!(group_id, store_id, "Setting group default store");

        let result = sqlx::query("UPDATE core_store_group SET default_store_id = ?1 WHERE group_id = ?2")
            .bind(store_id)
            .bind(group_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Store group", group_id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_create_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let groups = db.store_groups();

        let created = groups.create(1, "Main Website Store", 2).await.unwrap();
        assert!(created.group_id > 0);
        assert_eq!(created.default_store_id, 0);

        let loaded = groups.get_by_id(created.group_id).await.unwrap().unwrap();
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn test_set_default_store_on_missing_group() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db.store_groups().set_default_store(777, 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
