//! # Layout Update Resource
//!
//! Single-row persistence for layout updates and their theme/store links.
//!
//! Link rows have no lifecycle of their own: deleting an update removes its
//! links through `ON DELETE CASCADE`.

use std::future::Future;

use sqlx::SqlitePool;
use storefront_core::datetime;
use storefront_core::validation::validate_layout_handle;
use storefront_core::{LayoutLink, LayoutUpdate};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Deletes one layout update.
///
/// [`LayoutUpdateCollection::delete_all`](crate::collection::layout_update::LayoutUpdateCollection::delete_all)
/// calls this once per loaded row, so anything hooked onto an entity
/// delete runs for each of them.
pub trait LayoutUpdateDeleter {
    fn delete(&self, update: &LayoutUpdate) -> impl Future<Output = DbResult<()>> + Send;
}

/// Repository for layout update rows.
#[derive(Debug, Clone)]
pub struct LayoutUpdateResource {
    pool: SqlitePool,
}

impl LayoutUpdateResource {
    /// Creates a new LayoutUpdateResource.
    pub fn new(pool: SqlitePool) -> Self {
        LayoutUpdateResource { pool }
    }

    /// Inserts a layout update and returns it with its assigned id.
    ///
    /// `updated_at` is kept as given; pass `None` for a row that was never
    /// touched.
    pub async fn insert(&self, update: &LayoutUpdate) -> DbResult<LayoutUpdate> {
        validate_layout_handle(&update.handle)?;

        debug!(handle = %update.handle, "Inserting layout update");

        let updated_at = update.updated_at.map(datetime::format_datetime);

        let result = sqlx::query(
            r#"
            INSERT INTO core_layout_update (handle, xml, sort_order, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&update.handle)
        .bind(&update.xml)
        .bind(update.sort_order)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        let mut saved = update.clone();
        saved.layout_update_id = result.last_insert_rowid();
        Ok(saved)
    }

    /// Replaces the xml of an update and stamps `updated_at` with now.
    pub async fn touch(&self, layout_update_id: i64, xml: &str) -> DbResult<()> {
        debug!(layout_update_id, "Updating layout update xml");

        let now = datetime::format_datetime(datetime::now());

        let result = sqlx::query(
            r#"
            UPDATE core_layout_update
            SET xml = ?2, updated_at = ?3
            WHERE layout_update_id = ?1
            "#,
        )
        .bind(layout_update_id)
        .bind(xml)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Layout update", layout_update_id));
        }

        Ok(())
    }

    /// Gets a layout update by id.
    pub async fn get_by_id(&self, layout_update_id: i64) -> DbResult<Option<LayoutUpdate>> {
        let update = sqlx::query_as::<_, LayoutUpdate>(
            r#"
            SELECT layout_update_id, handle, xml, sort_order, updated_at
            FROM core_layout_update
            WHERE layout_update_id = ?1
            "#,
        )
        .bind(layout_update_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(update)
    }

    /// Links an update to a theme in a store.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - update or store doesn't exist
    pub async fn add_link(&self, layout_update_id: i64, theme_id: i64, store_id: i64) -> DbResult<LayoutLink> {
        debug!(layout_update_id, theme_id, store_id, "Linking layout update");

        let result = sqlx::query(
            r#"
            INSERT INTO core_layout_link (layout_update_id, theme_id, store_id)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(layout_update_id)
        .bind(theme_id)
        .bind(store_id)
        .execute(&self.pool)
        .await?;

        Ok(LayoutLink {
            layout_link_id: result.last_insert_rowid(),
            layout_update_id,
            theme_id,
            store_id,
        })
    }

    /// All links of an update.
    pub async fn links_for(&self, layout_update_id: i64) -> DbResult<Vec<LayoutLink>> {
        let links = sqlx::query_as::<_, LayoutLink>(
            r#"
            SELECT layout_link_id, layout_update_id, theme_id, store_id
            FROM core_layout_link
            WHERE layout_update_id = ?1
            ORDER BY layout_link_id
            "#,
        )
        .bind(layout_update_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(links)
    }

    /// Counts all layout updates (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM core_layout_update")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

impl LayoutUpdateDeleter for LayoutUpdateResource {
    /// Deletes the update; its links go with it.
    async fn delete(&self, update: &LayoutUpdate) -> DbResult<()> {
        debug!(layout_update_id = update.layout_update_id, "Deleting layout update");

        let result = sqlx::query("DELETE FROM core_layout_update WHERE layout_update_id = ?1")
            .bind(update.layout_update_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Layout update", update.layout_update_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn setup() -> LayoutUpdateResource {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.layout_updates()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let resource = setup().await;
        let stamp = datetime::parse_datetime("2026-01-15 10:00:00").unwrap();

        let saved = resource
            .insert(&LayoutUpdate::new("default", "<block/>").with_updated_at(Some(stamp)))
            .await
            .unwrap();
        assert!(saved.layout_update_id > 0);

        let loaded = resource.get_by_id(saved.layout_update_id).await.unwrap().unwrap();
        assert_eq!(loaded.handle, "default");
        assert_eq!(loaded.updated_at, Some(stamp));
        assert_eq!(loaded.store_id, None);
    }

    #[tokio::test]
    async fn test_insert_rejects_empty_handle() {
        let resource = setup().await;

        let err = resource.insert(&LayoutUpdate::new("  ", "")).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(resource.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_touch_sets_updated_at() {
        let resource = setup().await;
        let saved = resource.insert(&LayoutUpdate::new("default", "")).await.unwrap();

        resource.touch(saved.layout_update_id, "<block/>").await.unwrap();

        let loaded = resource.get_by_id(saved.layout_update_id).await.unwrap().unwrap();
        assert_eq!(loaded.xml, "<block/>");
        assert!(loaded.updated_at.is_some());

        assert!(matches!(
            resource.touch(9999, "").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_links() {
        let resource = setup().await;
        let saved = resource.insert(&LayoutUpdate::new("default", "")).await.unwrap();
        resource.add_link(saved.layout_update_id, 1, 0).await.unwrap();
        resource.add_link(saved.layout_update_id, 2, 0).await.unwrap();
        assert_eq!(resource.links_for(saved.layout_update_id).await.unwrap().len(), 2);

        resource.delete(&saved).await.unwrap();

        assert!(resource.get_by_id(saved.layout_update_id).await.unwrap().is_none());
        assert!(resource.links_for(saved.layout_update_id).await.unwrap().is_empty());
        assert!(matches!(
            resource.delete(&saved).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_link_to_missing_update_fails() {
        let resource = setup().await;

        let err = resource.add_link(424242, 1, 0).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
