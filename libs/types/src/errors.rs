//! Error types for the data model
//!
//! Comprehensive error taxonomy using thiserror

use thiserror::Error;

/// Inbound row errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("Row is not an array")]
    NotAnArray,

    #[error("Row has no field at index {index}")]
    MissingField { index: usize },
}

/// Errors raised while interpreting upstream dates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DateError {
    #[error("Unrecognised release date: {value}")]
    Unrecognised { value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_display() {
        let err = RowError::MissingField { index: 1 };
        assert_eq!(err.to_string(), "Row has no field at index 1");
    }

    #[test]
    fn test_date_error_display() {
        let err = DateError::Unrecognised {
            value: "yesterday".to_string(),
        };
        assert!(err.to_string().contains("yesterday"));
    }
}
