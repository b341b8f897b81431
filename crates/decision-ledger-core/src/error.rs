//! Error types for the decision ledger core.

use thiserror::Error;

/// Core errors that can occur while encoding or decoding ledger primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("invalid hex identifier: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid key material: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),
}

/// Validation errors for a candidate ledger entry.
///
/// A validation failure is always local: nothing has been stored and no
/// event has been emitted when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} is {len} bytes, maximum is {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

impl ValidationError {
    /// Name of the field that failed validation.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::EmptyField { field } | ValidationError::FieldTooLong { field, .. } => {
                field
            }
        }
    }
}
