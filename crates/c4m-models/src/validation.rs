//! Input validation errors shared by draft types.

use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Result type for draft validation.
pub type DraftResult<T> = Result<T, DraftError>;

/// A user-correctable problem with submitted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DraftError(pub String);

impl DraftError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<ValidationErrors> for DraftError {
    fn from(errors: ValidationErrors) -> Self {
        Self(first_message(&errors))
    }
}

/// Pick one human-readable message out of a validator error set.
///
/// Keys are sorted so the reported message is stable across runs.
fn first_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by_key(|(name, _)| name.to_string());

    for (name, kind) in fields {
        if let ValidationErrorsKind::Field(list) = kind {
            if let Some(err) = list.first() {
                return match &err.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid value for {}", name),
                };
            }
        }
    }

    "Invalid input".to_string()
}
