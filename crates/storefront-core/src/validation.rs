//! # Validation Module
//!
//! Input validation run before anything is written.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE                                                  │
//! │  ├── Store code format                                                 │
//! │  ├── Layout handle presence                                            │
//! │  └── Config scope names                                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Resource pre-checks (storefront-db)                          │
//! │  └── Unique fields (store code) checked before INSERT/UPDATE           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints                                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::validation::{validate_store_code, validate_scope};
//!
//! validate_store_code("en_us").unwrap();
//! validate_scope("stores").unwrap();
//! ```

use crate::error::ValidationError;
use crate::{SCOPE_DEFAULT, SCOPE_STORES, SCOPE_WEBSITES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a store code (column width in `core_store`).
pub const MAX_STORE_CODE_LENGTH: usize = 32;

/// Maximum length of a layout handle.
pub const MAX_HANDLE_LENGTH: usize = 255;

// =============================================================================
// Store Validators
// =============================================================================

/// Validates a store code.
///
/// ## Rules
/// - Must not be empty
/// - At most 32 characters
/// - First character is a lowercase latin letter
/// - Remaining characters are lowercase letters, digits or underscores
///
/// ## Example
/// ```rust
/// use storefront_core::validation::validate_store_code;
///
/// assert!(validate_store_code("en_us").is_ok());
/// assert!(validate_store_code("1store").is_err());
/// assert!(validate_store_code("EN").is_err());
/// ```
pub fn validate_store_code(code: &str) -> ValidationResult<()> {
    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > MAX_STORE_CODE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_STORE_CODE_LENGTH,
        });
    }

    let mut chars = code.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    let rest_valid = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if !starts_with_letter || !rest_valid {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "use lowercase letters (a-z), digits (0-9) or underscore, starting with a letter"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a store display name.
pub fn validate_store_name(name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Layout Validators
// =============================================================================

/// Validates a layout handle (e.g. `"catalog_product_view"`).
pub fn validate_layout_handle(handle: &str) -> ValidationResult<()> {
    let handle = handle.trim();

    if handle.is_empty() {
        return Err(ValidationError::Required {
            field: "handle".to_string(),
        });
    }

    if handle.len() > MAX_HANDLE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "handle".to_string(),
            max: MAX_HANDLE_LENGTH,
        });
    }

    Ok(())
}

// =============================================================================
// Config Validators
// =============================================================================

/// Validates a config scope name.
pub fn validate_scope(scope: &str) -> ValidationResult<()> {
    match scope {
        SCOPE_DEFAULT | SCOPE_WEBSITES | SCOPE_STORES => Ok(()),
        _ => Err(ValidationError::NotAllowed {
            field: "scope".to_string(),
            allowed: vec![
                SCOPE_DEFAULT.to_string(),
                SCOPE_WEBSITES.to_string(),
                SCOPE_STORES.to_string(),
            ],
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_store_code() {
        // Valid codes
        assert!(validate_store_code("default").is_ok());
        assert!(validate_store_code("en_us").is_ok());
        assert!(validate_store_code("store2").is_ok());

        // Invalid codes
        assert!(validate_store_code("").is_err());
        assert!(validate_store_code("2store").is_err());
        assert!(validate_store_code("_store").is_err());
        assert!(validate_store_code("En").is_err());
        assert!(validate_store_code("has space").is_err());
        assert!(validate_store_code("dash-code").is_err());
        assert!(validate_store_code(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_store_code_error_kind() {
        assert!(matches!(
            validate_store_code(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_store_code(&"a".repeat(40)),
            Err(ValidationError::TooLong { max: 32, .. })
        ));
    }

    #[test]
    fn test_validate_store_name() {
        assert!(validate_store_name("English").is_ok());
        assert!(validate_store_name("   ").is_err());
    }

    #[test]
    fn test_validate_layout_handle() {
        assert!(validate_layout_handle("default").is_ok());
        assert!(validate_layout_handle("catalog_product_view").is_ok());
        assert!(validate_layout_handle("").is_err());
        assert!(validate_layout_handle("  ").is_err());
        assert!(validate_layout_handle(&"h".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_scope() {
        assert!(validate_scope("default").is_ok());
        assert!(validate_scope("websites").is_ok());
        assert!(validate_scope("stores").is_ok());
        assert!(validate_scope("store").is_err());
        assert!(validate_scope("").is_err());
    }
}
