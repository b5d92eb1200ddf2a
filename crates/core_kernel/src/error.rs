//! Kernel errors

use thiserror::Error;

/// Failures parsing kernel values from text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("'{input}' is not a valid {entity} id")]
    InvalidIdentifier { entity: &'static str, input: String },
}

impl CoreError {
    pub fn invalid_identifier(entity: &'static str, input: impl Into<String>) -> Self {
        CoreError::InvalidIdentifier {
            entity,
            input: input.into(),
        }
    }
}
