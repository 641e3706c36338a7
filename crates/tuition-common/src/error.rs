//! Error taxonomy shared by every engine

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name used for messages that do not belong to a single input field.
pub const NON_FIELD: &str = "non_field_errors";

/// Field-level messages, ordered by field name for stable output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Single message for a single field
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Append a message to a field
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for a field
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Turn the collected messages into a validation failure, if any.
    pub fn into_result(self) -> TuitionResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(TuitionError::Validation(self))
        }
    }

    fn summary(&self) -> String {
        self.0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Tuition ERP error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TuitionError {
    /// Bad input shape or values
    #[error("validation failed: {}", .0.summary())]
    Validation(FieldErrors),

    /// Entity absent, or present but owned by another tenant
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Role may not perform the operation
    #[error("forbidden")]
    Forbidden,

    /// Uniqueness violation
    #[error("conflict: {}", .0.summary())]
    Conflict(FieldErrors),

    /// Nothing left to collect on the installment
    #[error("fee already paid")]
    AlreadyPaid,

    /// External payment provider failure
    #[error("gateway error: {0}")]
    Gateway(String),

    /// Persistence failure
    #[error("storage error: {0}")]
    Storage(String),
}

impl TuitionError {
    /// Validation failure on one field
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }

    /// Uniqueness failure on one field
    pub fn conflict(field: &str, message: impl Into<String>) -> Self {
        Self::Conflict(FieldErrors::single(field, message))
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound { entity, id: id.to_string() }
    }

    /// Field-level details, present for validation and conflict errors.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(fields) | Self::Conflict(fields) => Some(fields),
            _ => None,
        }
    }
}

/// Result type for Tuition ERP
pub type TuitionResult<T> = Result<T, TuitionError>;
