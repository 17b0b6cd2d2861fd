//! Error types for account reconciliation
//!
//! Field-level validation failures are not errors: they are data carried by
//! `FieldCheck`. Only structural problems end a run.

use crate::record::{Field, Side};
use thiserror::Error;

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, ReconError>;

#[derive(Error, Debug)]
pub enum ReconError {
    /// A row from the fetch collaborator lacks one of the five account fields
    #[error("Schema violation: {side} row {row} is missing field '{field}'")]
    SchemaViolation { side: Side, row: usize, field: Field },

    /// The same account number appears twice in one validated set
    #[error("Key collision: account_number '{account_number}' appears more than once in {side} set")]
    KeyCollision { side: Side, account_number: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ReconError {
    /// True for errors caused by the shape of the input rows rather than I/O
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ReconError::SchemaViolation { .. } | ReconError::KeyCollision { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_violation_message_names_side_and_field() {
        let err = ReconError::SchemaViolation {
            side: Side::Target,
            row: 3,
            field: Field::Designation,
        };

        assert_eq!(
            err.to_string(),
            "Schema violation: target row 3 is missing field 'designation'"
        );
        assert!(err.is_structural());
    }

    #[test]
    fn test_config_error_is_not_structural() {
        let err = ReconError::Config("missing source database".to_string());
        assert!(!err.is_structural());
    }
}
