//! # Config Data Repository
//!
//! Scoped configuration values keyed by `(scope, scope_id, path)`.
//!
//! Store-scoped rows (`scope = 'stores'`) are removed by the store delete
//! cascade; nothing else touches them implicitly.

use sqlx::SqlitePool;
use storefront_core::validation::validate_scope;
use storefront_core::ConfigData;
use tracing::debug;

use crate::error::DbResult;

/// Repository for `core_config_data`.
#[derive(Debug, Clone)]
pub struct ConfigDataRepository {
    pool: SqlitePool,
}

impl ConfigDataRepository {
    /// Creates a new ConfigDataRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ConfigDataRepository { pool }
    }

    /// Writes a value, replacing any existing value at the same key.
    pub async fn save_value(&self, scope: &str, scope_id: i64, path: &str, value: Option<&str>) -> DbResult<()> {
        validate_scope(scope)?;

        debug!(scope, scope_id, path, "Saving config value");

        sqlx::query(
            r#"
            INSERT INTO core_config_data (scope, scope_id, path, value)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (scope, scope_id, path) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(scope)
        .bind(scope_id)
        .bind(path)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Reads a value.
    ///
    /// ## Returns
    /// * `Ok(None)` - no row at this key
    /// * `Ok(Some(None))` - row exists with a NULL value
    pub async fn get_value(&self, scope: &str, scope_id: i64, path: &str) -> DbResult<Option<Option<String>>> {
        let value: Option<Option<String>> = sqlx::query_scalar(
            "SELECT value FROM core_config_data WHERE scope = ?1 AND scope_id = ?2 AND path = ?3",
        )
        .bind(scope)
        .bind(scope_id)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    /// All rows of one scope, by path.
    pub async fn list_for_scope(&self, scope: &str, scope_id: i64) -> DbResult<Vec<ConfigData>> {
        let rows = sqlx::query_as::<_, ConfigData>(
            r#"
            SELECT config_id, scope, scope_id, path, value
            FROM core_config_data
            WHERE scope = ?1 AND scope_id = ?2
            ORDER BY path
            "#,
        )
        .bind(scope)
        .bind(scope_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
