//! Alert headers
//!
//! Mutating requests report what happened through two headers named after
//! the application, for example:
//!
//! ```text
//! X-deviceHubApp-alert: deviceHubApp.temperature.created
//! X-deviceHubApp-params: 1001
//! ```
//!
//! Rejected requests carry `X-{app}-error: error.{key}` instead.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use tracing::warn;

/// Builds an alert with its parameter
pub fn alert(app_name: &str, message: &str, param: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, &format!("X-{}-alert", app_name), message);
    insert(&mut headers, &format!("X-{}-params", app_name), param);
    headers
}

pub fn entity_created(app_name: &str, entity_name: &str, id: &str) -> HeaderMap {
    alert(app_name, &format!("{}.{}.created", app_name, entity_name), id)
}

pub fn entity_updated(app_name: &str, entity_name: &str, id: &str) -> HeaderMap {
    alert(app_name, &format!("{}.{}.updated", app_name, entity_name), id)
}

pub fn entity_deleted(app_name: &str, entity_name: &str, id: &str) -> HeaderMap {
    alert(app_name, &format!("{}.{}.deleted", app_name, entity_name), id)
}

/// Headers for a request rejected with `error_key`
pub fn failure(app_name: &str, entity_name: &str, error_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, &format!("X-{}-error", app_name), &format!("error.{}", error_key));
    insert(&mut headers, &format!("X-{}-params", app_name), entity_name);
    headers
}

fn insert(headers: &mut HeaderMap, name: &str, value: &str) {
    match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
        (Ok(name), Ok(value)) => {
            headers.insert(name, value);
        }
        _ => warn!(header = name, "Skipping alert header that is not valid HTTP"),
    }
}
