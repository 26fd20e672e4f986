//! # Domain Types
//!
//! Core domain types for storefront configuration.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   StoreGroup    │ 1 │      Store      │ 1 │   ConfigData    │       │
//! │  │  ─────────────  │──<│  ─────────────  │──<│  ─────────────  │       │
//! │  │  group_id       │ n │  store_id       │ n │  scope=stores   │       │
//! │  │  default_store  │   │  code (unique)  │   │  scope_id       │       │
//! │  └─────────────────┘   │  group_id       │   │  path, value    │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │  LayoutUpdate   │ 1 │   LayoutLink    │                             │
//! │  │  ─────────────  │──<│  ─────────────  │                             │
//! │  │  handle, xml    │ n │  theme_id       │                             │
//! │  │  updated_at     │   │  store_id       │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Store
// =============================================================================

/// A store view.
///
/// `store_id` is `None` until the store has been saved. `original_group_id`
/// is not a column: it holds the group the store belonged to when it was
/// loaded, so the save cascade can tell that the store moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Store {
    pub store_id: Option<i64>,

    /// Business identifier, unique across stores (e.g. `"en_us"`).
    pub code: String,

    pub website_id: i64,

    pub group_id: i64,

    /// Display name shown in the admin.
    pub name: String,

    /// Lower sorts first when several stores match a lookup.
    pub sort_order: i64,

    pub is_active: bool,

    /// Group at load time. Not persisted.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(skip)]
    #[ts(skip)]
    pub original_group_id: Option<i64>,
}

impl Store {
    /// Creates an unsaved, active store.
    pub fn new(code: impl Into<String>, website_id: i64, group_id: i64) -> Self {
        let code = code.into();
        Store {
            store_id: None,
            name: code.clone(),
            code,
            website_id,
            group_id,
            sort_order: 0,
            is_active: true,
            original_group_id: None,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the sort order.
    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Whether the store has been persisted.
    #[inline]
    pub fn is_new(&self) -> bool {
        self.store_id.is_none()
    }

    /// Whether the store is being moved away from the group it was loaded in.
    ///
    /// A missing or zero original group means the store was never in a group.
    pub fn group_changed(&self) -> bool {
        match self.original_group_id {
            Some(original) if original != 0 => original != self.group_id,
            _ => false,
        }
    }
}

// =============================================================================
// Store Group
// =============================================================================

/// A group of store views sharing a root category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StoreGroup {
    pub group_id: i64,
    pub website_id: i64,
    pub name: String,
    pub root_category_id: i64,
    /// Store shown when the group is entered without a store code.
    /// `0` when no default is assigned.
    pub default_store_id: i64,
}

// =============================================================================
// Config Data
// =============================================================================

/// A configuration value at some scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ConfigData {
    pub config_id: i64,
    /// `default`, `websites` or `stores`.
    pub scope: String,
    pub scope_id: i64,
    pub path: String,
    pub value: Option<String>,
}

// =============================================================================
// Layout Update
// =============================================================================

/// A layout XML fragment registered under a handle.
///
/// `store_id` and `theme_id` are only populated when the row was read
/// through a query that joined the link table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LayoutUpdate {
    pub layout_update_id: i64,
    pub handle: String,
    pub xml: String,
    pub sort_order: i64,
    #[ts(as = "Option<String>")]
    pub updated_at: Option<NaiveDateTime>,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub store_id: Option<i64>,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub theme_id: Option<i64>,
}

impl LayoutUpdate {
    /// Creates an unsaved layout update. The id is assigned on insert.
    pub fn new(handle: impl Into<String>, xml: impl Into<String>) -> Self {
        LayoutUpdate {
            layout_update_id: 0,
            handle: handle.into(),
            xml: xml.into(),
            sort_order: 0,
            updated_at: None,
            store_id: None,
            theme_id: None,
        }
    }

    /// Sets the last-updated timestamp.
    pub fn with_updated_at(mut self, updated_at: Option<NaiveDateTime>) -> Self {
        self.updated_at = updated_at;
        self
    }
}

// =============================================================================
// Layout Link
// =============================================================================

/// Binds a layout update to a (theme, store) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LayoutLink {
    pub layout_link_id: i64,
    pub layout_update_id: i64,
    pub theme_id: i64,
    pub store_id: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
