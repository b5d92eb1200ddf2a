//! API error handling
//!
//! Bad-request alerts carry the entity and error key in the JSON body and
//! in an [`AlertError`] response extension, which the alert middleware turns
//! into `X-{app}-error` and `X-{app}-params` headers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use core_kernel::PortError;
use domain_devices::DomainError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// A request the entity resource refuses, reported with an alert key
    #[error("{message}")]
    BadRequestAlert {
        entity_name: String,
        error_key: String,
        message: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

/// Body of a bad-request alert
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    pub entity_name: String,
    pub error_key: String,
    pub message: String,
    pub title: String,
    pub status: u16,
}

/// Attached to bad-request responses for the alert middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertError {
    pub entity_name: String,
    pub error_key: String,
}

impl ApiError {
    pub fn bad_request_alert(
        entity_name: impl Into<String>,
        error_key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ApiError::BadRequestAlert {
            entity_name: entity_name.into(),
            error_key: error_key.into(),
            message: message.into(),
        }
    }

    /// Maps a domain failure for the resource named `entity_name`
    pub fn from_domain(err: DomainError, entity_name: &str) -> Self {
        let error_key = err.error_key();
        match err {
            DomainError::IdExists { .. } | DomainError::IdNull { .. } | DomainError::Validation { .. } => {
                ApiError::bad_request_alert(entity_name, error_key, err.to_string())
            }
            DomainError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DomainError::Port(port) => match port {
                PortError::NotFound { .. } => ApiError::NotFound(port.to_string()),
                PortError::InvalidQuery { message } => {
                    ApiError::bad_request_alert(entity_name, error_key, message)
                }
                PortError::Validation { message, .. } => {
                    ApiError::bad_request_alert(entity_name, "validation", message)
                }
                PortError::Conflict { message } => ApiError::Conflict(message),
                PortError::Connection { .. } | PortError::ServiceUnavailable { .. } => {
                    ApiError::ServiceUnavailable(port.to_string())
                }
                PortError::Internal { .. } => ApiError::Internal(port.to_string()),
            },
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let entity = err.entity().unwrap_or("entity").to_string();
        ApiError::from_domain(err, &entity)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequestAlert { entity_name, error_key, message } => {
                return alert_response(entity_name, error_key, message);
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

fn alert_response(entity_name: String, error_key: String, message: String) -> Response {
    let body = AlertResponse {
        entity_name: entity_name.clone(),
        error_key: error_key.clone(),
        message,
        title: "Bad Request".to_string(),
        status: StatusCode::BAD_REQUEST.as_u16(),
    };
    let mut response = (StatusCode::BAD_REQUEST, Json(body)).into_response();
    response.extensions_mut().insert(AlertError { entity_name, error_key });
    response
}
