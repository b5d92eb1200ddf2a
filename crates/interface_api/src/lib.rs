//! HTTP API Layer
//!
//! This crate provides the REST API of the device hub using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: one generic set of entity handlers, instantiated per
//!   [`Resource`](handlers::Resource), plus health checks
//! - **Middleware**: authentication, audit logging, alert headers
//! - **Error Handling**: JSON error bodies with alert keys
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod alerts;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use core_kernel::HealthCheckable;
use domain_devices::{
    Application, Device, DomainError, EntityService, PushNotificationToken, SmsNotification,
    Temperature, Values,
};

use crate::config::ApiConfig;
use crate::handlers::{health, resource, Resource};
use crate::middleware::{alert_middleware, audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub temperatures: EntityService<Temperature>,
    pub devices: EntityService<Device>,
    pub applications: EntityService<Application>,
    pub push_notification_tokens: EntityService<PushNotificationToken>,
    pub sms_notifications: EntityService<SmsNotification>,
    pub values: EntityService<Values>,
    /// Adapters consulted by `/health/ready`
    pub readiness: Vec<Arc<dyn HealthCheckable>>,
    pub config: ApiConfig,
}

impl AppState {
    /// Rebuilds every search index from the primary store
    ///
    /// Returns the total number of indexed entities.
    pub async fn reindex_all(&self) -> Result<usize, DomainError> {
        Ok(self.temperatures.reindex().await?
            + self.devices.reindex().await?
            + self.applications.reindex().await?
            + self.push_notification_tokens.reindex().await?
            + self.sms_notifications.reindex().await?
            + self.values.reindex().await?)
    }
}

/// Routes of one entity resource, relative to `/api`
fn resource_routes<R: Resource>() -> Router<AppState> {
    Router::new()
        .route(
            &format!("/{}", R::PATH),
            get(resource::list::<R>)
                .post(resource::create::<R>)
                .put(resource::update::<R>),
        )
        .route(
            &format!("/{}/:id", R::PATH),
            get(resource::get_one::<R>).delete(resource::delete::<R>),
        )
        .route(&format!("/_search/{}", R::PATH), get(resource::search::<R>))
        .route(&format!("/_reindex/{}", R::PATH), post(resource::reindex::<R>))
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Protected API routes
    let api_routes = Router::new()
        .merge(resource_routes::<Temperature>())
        .merge(resource_routes::<Device>())
        .merge(resource_routes::<Application>())
        .merge(resource_routes::<PushNotificationToken>())
        .merge(resource_routes::<SmsNotification>())
        .merge(resource_routes::<Values>())
        .layer(axum_middleware::from_fn_with_state(state.clone(), alert_middleware))
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .with_state(state)
}
