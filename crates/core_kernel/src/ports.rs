//! Ports and Adapters Infrastructure
//!
//! Every entity is reached through two ports:
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │              EntityService<E>                  │
//! │   (create / update / list / get / delete)      │
//! └───────────────────────────────────────────────┘
//!            │                         │
//!            ▼                         ▼
//!   ┌─────────────────┐      ┌──────────────────┐
//!   │  EntityPort<E>  │      │  SearchPort<E>   │
//!   │ (primary store) │      │ (search index)   │
//!   └─────────────────┘      └──────────────────┘
//!      PostgreSQL / mock      Elasticsearch / memory
//! ```
//!
//! The primary store is the source of truth. The search index mirrors it
//! and is written after the primary store on every mutation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::entity::Entity;

/// Error type for port operations
///
/// Provides a unified error type that all port implementations must use,
/// ensuring consistent error handling across database and index adapters.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// A validation error occurred
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The operation conflicts with existing data
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    /// The search query could not be understood
    #[error("Invalid query: {message}")]
    InvalidQuery {
        message: String,
    },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The external system is unavailable
    #[error("Service unavailable: {service}")]
    ServiceUnavailable {
        service: String,
    },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Validation error with field information
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        PortError::InvalidQuery {
            message: message.into(),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates a transient failure that may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. } | PortError::ServiceUnavailable { .. }
        )
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

/// Marker trait for all ports
///
/// All port traits extend this marker so that adapters can be shared
/// behind `Arc<dyn ...>` across async tasks.
pub trait DomainPort: Send + Sync + 'static {}

/// Primary-store repository for one entity type
#[async_trait]
pub trait EntityPort<E: Entity>: DomainPort {
    /// Inserts the entity when it has no id, otherwise overwrites the stored row.
    /// Returns the stored entity, with its id assigned.
    async fn save(&self, entity: E) -> Result<E, PortError>;

    async fn find_by_id(&self, id: E::Id) -> Result<Option<E>, PortError>;

    /// Every stored entity, ordered by id
    async fn find_all(&self) -> Result<Vec<E>, PortError>;

    /// Removes the entity; returns whether a row was deleted
    async fn delete_by_id(&self, id: E::Id) -> Result<bool, PortError>;

    async fn exists(&self, id: E::Id) -> Result<bool, PortError> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    async fn count(&self) -> Result<u64, PortError> {
        Ok(self.find_all().await?.len() as u64)
    }
}

/// Search-index mirror for one entity type
#[async_trait]
pub trait SearchPort<E: Entity>: DomainPort {
    /// Indexes (or re-indexes) a persisted entity
    async fn index(&self, entity: &E) -> Result<(), PortError>;

    /// Removes the document for `id`; removing an absent document is not an error
    async fn remove(&self, id: E::Id) -> Result<(), PortError>;

    /// Runs a query-string search against the index
    async fn search(&self, query: &str) -> Result<Vec<E>, PortError>;

    /// Drops every document of this index
    async fn clear(&self) -> Result<(), PortError>;

    /// Drops every document whose id is not in `keep`
    async fn retain(&self, keep: &BTreeSet<E::Id>) -> Result<(), PortError>;
}

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    /// Adapter is healthy and operational
    Healthy,
    /// Adapter is degraded but operational
    Degraded,
    /// Adapter is unhealthy and not operational
    Unhealthy,
    /// Health status is unknown
    Unknown,
}

/// Health check result for an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Adapter identifier
    pub adapter_id: String,
    /// Current health status
    pub status: AdapterHealth,
    /// Latency of the health check in milliseconds
    pub latency_ms: u64,
    /// Optional message with additional details
    pub message: Option<String>,
    /// Timestamp of the health check
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl HealthCheckResult {
    pub fn is_healthy(&self) -> bool {
        self.status == AdapterHealth::Healthy
    }
}

/// Trait for adapters that support health checks
#[async_trait]
pub trait HealthCheckable: Send + Sync {
    /// Performs a health check on the adapter
    async fn health_check(&self) -> HealthCheckResult;
}
