//! # storefront-core: Domain Types for Storefront Configuration
//!
//! Pure types and rules shared by the storefront data-access layer.
//! Nothing in this crate touches a database, a file or the network.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storefront Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Admin flows (external)                       │   │
//! │  │    create store, move store, clean layout updates, ...         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               storefront-db (collections, resources)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ uses                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ storefront-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   types   │  │ datetime  │  │ validation│                  │   │
//! │  │   │  Store    │  │  format   │  │  codes    │                  │   │
//! │  │   │  Layout   │  │  cutoffs  │  │  handles  │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Store, StoreGroup, ConfigData, LayoutUpdate, ...)
//! - [`datetime`] - The one place timestamps are formatted and parsed
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation for codes and handles

// =============================================================================
// Module Declarations
// =============================================================================

pub mod datetime;
pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Store id of the admin store, which always exists.
pub const ADMIN_STORE_ID: i64 = 0;

/// Code of the admin store. Excluded from store counts by default.
pub const ADMIN_STORE_CODE: &str = "admin";

/// Sentinel written into `core_store_group.default_store_id` when a group
/// loses its default store.
pub const DEFAULT_STORE_ID: i64 = 0;

/// Config scope name for rows that apply to a single store.
pub const SCOPE_STORES: &str = "stores";

/// Config scope name for rows that apply to a website.
pub const SCOPE_WEBSITES: &str = "websites";

/// Config scope name for global rows.
pub const SCOPE_DEFAULT: &str = "default";
