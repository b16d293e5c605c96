//! Inbound batch rows
//!
//! A row is one element of the inbound JSON array: a JSON array whose first
//! two values identify a book (title fragment, author fragment).

use crate::errors::RowError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One inbound row, kept verbatim so errors can quote it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Value);

impl Row {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Text of the field at `index`.
    ///
    /// Strings are returned as-is, any other JSON value as its JSON text.
    /// A missing index is an error, never a default.
    pub fn field(&self, index: usize) -> Result<String, RowError> {
        let items = self.0.as_array().ok_or(RowError::NotAnArray)?;
        let value = items.get(index).ok_or(RowError::MissingField { index })?;
        Ok(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Title and author fragments.
    pub fn fragments(&self) -> Result<(String, String), RowError> {
        Ok((self.field(0)?, self.field(1)?))
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
