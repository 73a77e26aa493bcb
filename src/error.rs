//! Error types for the books catalog
//!
//! This module defines error types using thiserror for ergonomic error handling.
//! Errors are categorized by the outcome a caller has to act on (missing
//! resource, duplicate value, bad input, storage failure) so an outer layer
//! can map them to responses without inspecting messages.
//!
//! ## Outcome mapping
//!
//! - `NotFound` → missing resource (404 in an HTTP surface)
//! - `Conflict` → duplicate unique value, user-correctable (400)
//! - `UnknownReference` → a link names a genre/contributor that does not exist (400)
//! - `Validation` → payload outside the accepted input range (422)
//! - everything else → internal/storage failure (500)
//!
//! Malformed sort, order and pagination parameters are *not*
//! represented here: the listing engine normalizes them to defaults.

use thiserror::Error;

/// Result type alias using our CatalogError type
pub type Result<T> = std::result::Result<T, CatalogError>;

/// SQLite extended result codes for constraint failures
/// (`SQLITE_CONSTRAINT_FOREIGNKEY`, `SQLITE_CONSTRAINT_PRIMARYKEY`, `SQLITE_CONSTRAINT_UNIQUE`)
const SQLITE_CONSTRAINT_FOREIGNKEY: &str = "787";
const SQLITE_CONSTRAINT_PRIMARYKEY: &str = "1555";
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";

/// Main error type for the catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    // ===== Domain Errors =====

    /// Entity with the given id does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: String,
    },

    /// A unique value is already taken by another entity
    #[error("{entity} with {field} '{value}' already exists")]
    Conflict {
        entity: &'static str,
        field: &'static str,
        /// The offending value, echoed back so the caller can correct it
        value: String,
    },

    /// A link references a parent row that does not exist
    #[error("Unknown {entity} referenced: {id}")]
    UnknownReference {
        entity: &'static str,
        id: String,
    },

    /// Create/update payload failed input-boundary validation
    #[error("Validation failed: {0}")]
    Validation(String),

    // ===== Database Errors =====

    /// Database schema migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Stored data could not be mapped back into a domain value
    #[error("Invalid data: {0}")]
    InvalidData(String),

    // ===== Configuration Errors =====

    /// Configuration is invalid or incomplete
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ===== General Errors =====

    /// Internal error that should not normally occur
    #[error("Internal error: {0}")]
    InternalError(String),

    // ===== External Library Errors =====

    /// Database driver error from sqlx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Constraint family reported by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConstraintViolation {
    Unique,
    ForeignKey,
}

/// Classify a driver error as a constraint violation, if it is one
pub(crate) fn constraint_violation(err: &sqlx::Error) -> Option<ConstraintViolation> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    match db_err.code().as_deref() {
        Some(SQLITE_CONSTRAINT_UNIQUE) | Some(SQLITE_CONSTRAINT_PRIMARYKEY) => {
            Some(ConstraintViolation::Unique)
        }
        Some(SQLITE_CONSTRAINT_FOREIGNKEY) => Some(ConstraintViolation::ForeignKey),
        _ => None,
    }
}

// Helper methods for creating common errors
impl CatalogError {
    /// Create a NotFound error for an entity id
    pub fn not_found<S: ToString>(entity: &'static str, id: S) -> Self {
        CatalogError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a Conflict error naming the duplicate value
    pub fn conflict<S: Into<String>>(entity: &'static str, field: &'static str, value: S) -> Self {
        CatalogError::Conflict {
            entity,
            field,
            value: value.into(),
        }
    }

    /// Create an UnknownReference error for a missing link target
    pub fn unknown_reference<S: ToString>(entity: &'static str, id: S) -> Self {
        CatalogError::UnknownReference {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a Validation error with a message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        CatalogError::Validation(message.into())
    }

    /// Create an InternalError with a message
    pub fn internal<S: Into<String>>(message: S) -> Self {
        CatalogError::InternalError(message.into())
    }

    /// Check if the error signals a missing resource
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }

    /// Check if the error signals a duplicate unique value
    pub fn is_conflict(&self) -> bool {
        matches!(self, CatalogError::Conflict { .. })
    }

    /// Check if the error is caused by the caller's input
    ///
    /// Returns `true` for errors the caller can fix by changing the request;
    /// `false` for storage and internal failures.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CatalogError::NotFound { .. }
                | CatalogError::Conflict { .. }
                | CatalogError::UnknownReference { .. }
                | CatalogError::Validation(_)
        )
    }

    /// Get user-friendly error message suitable for display
    ///
    /// Storage details are hidden; domain errors keep the offending value.
    pub fn user_message(&self) -> String {
        match self {
            CatalogError::Conflict { entity, field, value } => {
                format!("A {} with {} '{}' already exists. Please choose another one.", entity, field, value)
            }
            CatalogError::UnknownReference { entity, id } => {
                format!("The {} '{}' does not exist. Create it first or remove it from the request.", entity, id)
            }
            CatalogError::SqlxError(_) | CatalogError::MigrationFailed(_) | CatalogError::IoError(_) => {
                "The catalog storage is unavailable. Please try again later.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

// ===== IMPLEMENTATION NOTES =====
//
// - Query functions return `Result<T>` and propagate driver errors with `?`
//   (sqlx::Error → CatalogError::SqlxError).
// - Writes that can hit a store constraint translate it at the call site with
//   `constraint_violation()`, because only the caller knows which value was
//   duplicated or which reference was dangling.
// - No variant is retried internally; every error is scoped to one request.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_echoes_value() {
        let err = CatalogError::conflict("genre", "name", "Fantasy");
        assert_eq!(err.to_string(), "genre with name 'Fantasy' already exists");
        assert!(err.is_conflict());
        assert!(err.is_client_error());
        assert!(err.user_message().contains("'Fantasy'"));
    }

    #[test]
    fn test_storage_errors_are_not_client_errors() {
        let err = CatalogError::from(sqlx::Error::RowNotFound);
        assert!(!err.is_client_error());
        assert!(!err.is_not_found());
        assert_eq!(constraint_violation(&sqlx::Error::RowNotFound), None);
    }
}
