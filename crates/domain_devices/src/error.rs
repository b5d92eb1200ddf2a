//! Device domain errors

use thiserror::Error;
use validator::ValidationErrors;

use core_kernel::PortError;

/// Errors raised by [`EntityService`](crate::EntityService) operations
#[derive(Debug, Error)]
pub enum DomainError {
    /// A create request carried an id
    #[error("A new {entity} cannot already have an ID")]
    IdExists { entity: &'static str },

    /// An update request carried no id
    #[error("Invalid id")]
    IdNull { entity: &'static str },

    /// The entity does not exist in the primary store
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Field validation failed
    #[error("Invalid {entity}: {message}")]
    Validation { entity: &'static str, message: String },

    /// A storage or index port failed
    #[error(transparent)]
    Port(#[from] PortError),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(entity: &'static str, errors: &ValidationErrors) -> Self {
        DomainError::Validation {
            entity,
            message: errors.to_string(),
        }
    }

    /// Machine-readable key reported to clients alongside the message
    pub fn error_key(&self) -> &'static str {
        match self {
            DomainError::IdExists { .. } => "idexists",
            DomainError::IdNull { .. } => "idnull",
            DomainError::NotFound { .. } => "idnotfound",
            DomainError::Validation { .. } => "validation",
            DomainError::Port(PortError::InvalidQuery { .. }) => "badquery",
            DomainError::Port(_) => "internal",
        }
    }

    /// Entity the error refers to, when known
    pub fn entity(&self) -> Option<&'static str> {
        match self {
            DomainError::IdExists { entity }
            | DomainError::IdNull { entity }
            | DomainError::NotFound { entity, .. }
            | DomainError::Validation { entity, .. } => Some(entity),
            DomainError::Port(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            DomainError::NotFound { .. } => true,
            DomainError::Port(e) => e.is_not_found(),
            _ => false,
        }
    }
}
