//! Field validation for book drafts before they are stored
//!
//! The only column constraint of the relational schema the store stands in
//! for is the 3-character currency. Numbers must also be finite, since a
//! NaN or infinite price cannot be written back out as JSON.

use thiserror::Error;
use types::record::BookDraft;

pub const MAX_CURRENCY_LEN: usize = 3;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{field} {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

fn require_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new(field, format!("must be a finite number, got {}", value)))
    }
}

pub fn validate_draft(draft: &BookDraft) -> Result<(), ValidationError> {
    let len = draft.currency.chars().count();
    if len > MAX_CURRENCY_LEN {
        return Err(ValidationError::new(
            "currency",
            format!("is {} characters long, the limit is {}", len, MAX_CURRENCY_LEN),
        ));
    }
    require_finite("price", draft.price)?;
    require_finite("rate", draft.rate)
}
