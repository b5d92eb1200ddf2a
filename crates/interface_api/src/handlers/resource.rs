//! Entity resource handlers
//!
//! Every entity is exposed through the same set of handlers, instantiated
//! once per [`Resource`]:
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | POST | `/api/{resource}` | [`create`] |
//! | PUT | `/api/{resource}` | [`update`] |
//! | GET | `/api/{resource}` | [`list`] |
//! | GET | `/api/{resource}/:id` | [`get_one`] |
//! | DELETE | `/api/{resource}/:id` | [`delete`] |
//! | GET | `/api/_search/{resource}?query=` | [`search`] |
//! | POST | `/api/_reindex/{resource}` | [`reindex`] |

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;

use core_kernel::Entity;
use domain_devices::{
    Application, Device, DomainError, EntityService, PushNotificationToken, SmsNotification,
    Temperature, Values,
};

use crate::alerts;
use crate::auth::{has_role, roles, Claims};
use crate::error::ApiError;
use crate::AppState;

/// An entity exposed under `/api/{PATH}`
pub trait Resource: Entity + Validate {
    /// Path segment under `/api`
    const PATH: &'static str;

    /// Entity name reported in alert headers and error bodies
    const ALERT_NAME: &'static str;

    fn service(state: &AppState) -> &EntityService<Self>;
}

macro_rules! resource {
    ($entity:ty, $path:literal, $alert:literal, $field:ident) => {
        impl Resource for $entity {
            const PATH: &'static str = $path;
            const ALERT_NAME: &'static str = $alert;

            fn service(state: &AppState) -> &EntityService<Self> {
                &state.$field
            }
        }
    };
}

resource!(Temperature, "temperatures", "temperature", temperatures);
resource!(Device, "devices", "device", devices);
resource!(Application, "applications", "application", applications);
resource!(
    PushNotificationToken,
    "push-notification-tokens",
    "pushNotificationToken",
    push_notification_tokens
);
resource!(SmsNotification, "sms-notifications", "sMSNotification", sms_notifications);
resource!(Values, "values", "values", values);

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReindexResponse {
    pub indexed: usize,
}

fn failed<R: Resource>(err: DomainError) -> ApiError {
    ApiError::from_domain(err, R::ALERT_NAME)
}

fn persisted_id<R: Resource>(entity: &R) -> Result<R::Id, ApiError> {
    entity
        .id()
        .ok_or_else(|| ApiError::Internal(format!("{} was saved without an id", R::ENTITY_NAME)))
}

/// `POST /api/{resource}`: creates a new entity
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    Json(entity): Json<R>,
) -> Result<Response, ApiError> {
    debug!("REST request to save {} : {:?}", R::ENTITY_NAME, entity);
    let saved = R::service(&state).create(entity).await.map_err(failed::<R>)?;
    let id = persisted_id(&saved)?.to_string();

    let mut headers = alerts::entity_created(&state.config.app_name, R::ALERT_NAME, &id);
    let location = format!("/api/{}/{}", R::PATH, id);
    if let Ok(value) = HeaderValue::from_str(&location) {
        headers.insert(header::LOCATION, value);
    }

    Ok((StatusCode::CREATED, headers, Json(saved)).into_response())
}

/// `PUT /api/{resource}`: overwrites an existing entity
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Json(entity): Json<R>,
) -> Result<Response, ApiError> {
    debug!("REST request to update {} : {:?}", R::ENTITY_NAME, entity);
    let saved = R::service(&state).update(entity).await.map_err(failed::<R>)?;
    let id = persisted_id(&saved)?.to_string();

    let headers = alerts::entity_updated(&state.config.app_name, R::ALERT_NAME, &id);
    Ok((StatusCode::OK, headers, Json(saved)).into_response())
}

/// `GET /api/{resource}`: every entity, ordered by id
pub async fn list<R: Resource>(State(state): State<AppState>) -> Result<Json<Vec<R>>, ApiError> {
    debug!("REST request to get all {}", R::ENTITY_NAME);
    let all = R::service(&state).find_all().await.map_err(failed::<R>)?;
    Ok(Json(all))
}

/// `GET /api/{resource}/:id`
pub async fn get_one<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<R>, ApiError> {
    debug!("REST request to get {} : {}", R::ENTITY_NAME, id);
    let entity = R::service(&state)
        .find_one(R::Id::from(id))
        .await
        .map_err(failed::<R>)?;
    Ok(Json(entity))
}

/// `DELETE /api/{resource}/:id`
///
/// Answers 204 whether or not the entity existed.
pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    debug!("REST request to delete {} : {}", R::ENTITY_NAME, id);
    R::service(&state)
        .delete(R::Id::from(id))
        .await
        .map_err(failed::<R>)?;

    let headers = alerts::entity_deleted(&state.config.app_name, R::ALERT_NAME, &id.to_string());
    Ok((StatusCode::NO_CONTENT, headers).into_response())
}

/// `GET /api/_search/{resource}?query=`
pub async fn search<R: Resource>(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<R>>, ApiError> {
    debug!("REST request to search {} for query {}", R::ENTITY_NAME, params.query);
    let hits = R::service(&state)
        .search(&params.query)
        .await
        .map_err(failed::<R>)?;
    Ok(Json(hits))
}

/// `POST /api/_reindex/{resource}`: rebuilds the index from the database
///
/// Restricted to administrators.
pub async fn reindex<R: Resource>(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ReindexResponse>, ApiError> {
    if !has_role(&claims, roles::ADMIN) {
        return Err(ApiError::Forbidden(format!(
            "{} may not reindex {}",
            claims.sub,
            R::ENTITY_NAME
        )));
    }

    let indexed = R::service(&state).reindex().await.map_err(failed::<R>)?;
    info!(user = %claims.sub, indexed, "Reindexed {}", R::ENTITY_NAME);
    Ok(Json(ReindexResponse { indexed }))
}
