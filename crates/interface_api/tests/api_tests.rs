//! HTTP surface tests
//!
//! The router runs over in-memory stores and the in-process search index.

use std::sync::Arc;

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use serde_json::{json, Value};
use validator::Validate;

use core_kernel::{Entity, HealthCheckable};
use domain_devices::mock::InMemoryEntityPort;
use domain_devices::{Device, EntityService, Temperature};
use infra_search::InMemorySearchIndex;
use interface_api::auth::{create_token, roles};
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState};
use test_utils::{
    default_application, default_device, default_push_notification_token,
    default_sms_notification, default_temperature, updated_push_notification_token,
    DEFAULT_TEXT, UPDATED_TEXT,
};

const SECRET: &str = "api-test-secret";

fn service<E: Entity + Validate>() -> EntityService<E> {
    EntityService::new(
        Arc::new(InMemoryEntityPort::new()),
        Arc::new(InMemorySearchIndex::new()),
    )
}

fn state(readiness: Vec<Arc<dyn HealthCheckable>>) -> AppState {
    AppState {
        temperatures: service(),
        devices: service(),
        applications: service(),
        push_notification_tokens: service(),
        sms_notifications: service(),
        values: service(),
        readiness,
        config: ApiConfig {
            jwt_secret: SECRET.to_string(),
            ..ApiConfig::default()
        },
    }
}

fn server() -> TestServer {
    TestServer::new(create_router(state(Vec::new()))).unwrap()
}

fn bearer(role: &str) -> HeaderValue {
    let token = create_token("tester", vec![role.to_string()], SECRET, 3600).unwrap();
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

fn as_user(request: TestRequest) -> TestRequest {
    request.add_header(header::AUTHORIZATION, bearer(roles::USER))
}

fn as_admin(request: TestRequest) -> TestRequest {
    request.add_header(header::AUTHORIZATION, bearer(roles::ADMIN))
}

fn id_of(body: &Value) -> i64 {
    body["id"].as_i64().expect("body carries an id")
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let server = server();

    let response = server.get("/api/temperatures").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .get("/api/temperatures")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer not-a-token"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_returns_location_and_alert() {
    let server = server();

    let response = as_user(server.post("/api/temperatures"))
        .json(&default_temperature())
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let id = id_of(&body);
    assert_eq!(body["name"], DEFAULT_TEXT);

    let headers = response.headers();
    assert_eq!(headers[header::LOCATION], format!("/api/temperatures/{}", id).as_str());
    assert_eq!(
        headers["x-devicehubapp-alert"],
        "deviceHubApp.temperature.created"
    );
    assert_eq!(headers["x-devicehubapp-params"], id.to_string().as_str());
}

#[tokio::test]
async fn test_create_with_id_is_rejected() {
    let server = server();

    let response = as_user(server.post("/api/sms-notifications"))
        .json(&json!({ "id": 1, "message": DEFAULT_TEXT }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["entityName"], "sMSNotification");
    assert_eq!(body["errorKey"], "idexists");
    assert_eq!(body["message"], "A new SMSNotification cannot already have an ID");
    assert_eq!(response.headers()["x-devicehubapp-error"], "error.idexists");
    assert_eq!(response.headers()["x-devicehubapp-params"], "sMSNotification");

    let all: Vec<Value> = as_user(server.get("/api/sms-notifications")).await.json();
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_update_without_id_is_rejected() {
    let server = server();

    let response = as_user(server.put("/api/devices"))
        .json(&default_device())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["errorKey"], "idnull");
    assert_eq!(body["message"], "Invalid id");
}

#[tokio::test]
async fn test_update_overwrites_existing() {
    let server = server();
    let created: Value = as_user(server.post("/api/devices"))
        .json(&default_device())
        .await
        .json();
    let id = id_of(&created);

    let response = as_user(server.put("/api/devices"))
        .json(&json!({ "id": id, "uuid": UPDATED_TEXT }))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.headers()["x-devicehubapp-alert"],
        "deviceHubApp.device.updated"
    );
    let fetched: Value = as_user(server.get(&format!("/api/devices/{}", id))).await.json();
    assert_eq!(fetched["uuid"], UPDATED_TEXT);
}

#[tokio::test]
async fn test_update_of_unknown_id_is_not_found() {
    let server = server();

    let response = as_user(server.put("/api/devices"))
        .json(&json!({ "id": 424242, "uuid": UPDATED_TEXT }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_validation_failure_is_a_bad_request() {
    let server = server();

    let response = as_user(server.post("/api/temperatures"))
        .json(&json!({ "name": "x".repeat(300) }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["errorKey"], "validation");
    assert_eq!(body["entityName"], "temperature");
}

#[tokio::test]
async fn test_get_unknown_id_is_not_found() {
    let server = server();

    let response = as_user(server.get("/api/temperatures/999")).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_list_is_ordered_by_id() {
    let server = server();
    for name in ["c", "a", "b"] {
        as_user(server.post("/api/temperatures"))
            .json(&json!({ "name": name }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let all: Vec<Value> = as_user(server.get("/api/temperatures")).await.json();
    let ids: Vec<i64> = all.iter().map(id_of).collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(all[0]["name"], "c");
}

#[tokio::test]
async fn test_delete_answers_no_content() {
    let server = server();
    let created: Value = as_user(server.post("/api/temperatures"))
        .json(&default_temperature())
        .await
        .json();
    let id = id_of(&created);

    let response = as_user(server.delete(&format!("/api/temperatures/{}", id))).await;
    response.assert_status(StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers()["x-devicehubapp-alert"],
        "deviceHubApp.temperature.deleted"
    );

    as_user(server.get(&format!("/api/temperatures/{}", id)))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // a second delete is still a success
    as_user(server.delete(&format!("/api/temperatures/{}", id)))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let hits: Vec<Value> = as_user(server.get("/api/_search/temperatures"))
        .add_query_param("query", "*")
        .await
        .json();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_search_follows_writes() {
    let server = server();
    as_user(server.post("/api/temperatures"))
        .json(&json!({ "name": "Greenhouse", "address": "North field" }))
        .await
        .assert_status(StatusCode::CREATED);
    as_user(server.post("/api/temperatures"))
        .json(&json!({ "name": "Cellar", "address": "Main house" }))
        .await
        .assert_status(StatusCode::CREATED);

    let hits: Vec<Value> = as_user(server.get("/api/_search/temperatures"))
        .add_query_param("query", "name:greenhouse")
        .await
        .json();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["address"], "North field");

    let hits: Vec<Value> = as_user(server.get("/api/_search/temperatures"))
        .add_query_param("query", "house AND NOT cellar")
        .await
        .json();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_search_requires_query_and_valid_syntax() {
    let server = server();

    as_user(server.get("/api/_search/devices"))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = as_user(server.get("/api/_search/devices"))
        .add_query_param("query", "uuid:(open")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["errorKey"], "badquery");
}

#[tokio::test]
async fn test_deeply_nested_search_is_a_bad_query() {
    let server = server();

    let response = as_user(server.get("/api/_search/devices"))
        .add_query_param("query", "(".repeat(20_000))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["errorKey"], "badquery");

    let nested = format!("{}uuid:a{}", "(".repeat(1000), ")".repeat(1000));
    let response = as_user(server.get("/api/_search/devices"))
        .add_query_param("query", &nested)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_push_notification_token_lifecycle() {
    let server = server();
    let device: Value = as_user(server.post("/api/devices"))
        .json(&default_device())
        .await
        .json();

    let mut token = serde_json::to_value(default_push_notification_token()).unwrap();
    token["device"] = json!({ "id": id_of(&device) });
    let response = as_user(server.post("/api/push-notification-tokens"))
        .json(&token)
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(
        response.headers()["x-devicehubapp-alert"],
        "deviceHubApp.pushNotificationToken.created"
    );
    let created: Value = response.json();
    let id = id_of(&created);
    assert_eq!(created["token"], DEFAULT_TEXT);

    let hits: Vec<Value> = as_user(server.get("/api/_search/push-notification-tokens"))
        .add_query_param("query", &format!("device.id:{}", id_of(&device)))
        .await
        .json();
    assert_eq!(hits.len(), 1);

    let mut changed = serde_json::to_value(updated_push_notification_token()).unwrap();
    changed["id"] = json!(id);
    as_user(server.put("/api/push-notification-tokens"))
        .json(&changed)
        .await
        .assert_status_ok();
    let fetched: Value = as_user(server.get(&format!("/api/push-notification-tokens/{}", id)))
        .await
        .json();
    assert_eq!(fetched["token"], UPDATED_TEXT);

    let hits: Vec<Value> = as_user(server.get("/api/_search/push-notification-tokens"))
        .add_query_param("query", &format!("token:{}", UPDATED_TEXT))
        .await
        .json();
    assert_eq!(hits.len(), 1);
    let hits: Vec<Value> = as_user(server.get("/api/_search/push-notification-tokens"))
        .add_query_param("query", &format!("device.id:{}", id_of(&device)))
        .await
        .json();
    assert!(hits.is_empty());

    as_user(server.delete(&format!("/api/push-notification-tokens/{}", id)))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let hits: Vec<Value> = as_user(server.get("/api/_search/push-notification-tokens"))
        .add_query_param("query", "*")
        .await
        .json();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_referenced_device_delete_keeps_search_consistent() {
    let devices = Arc::new(InMemoryEntityPort::<Device>::new());
    let mut state = state(Vec::new());
    state.devices = EntityService::new(devices.clone(), Arc::new(InMemorySearchIndex::<Device>::new()));
    let server = TestServer::new(create_router(state)).unwrap();

    let device: Value = as_user(server.post("/api/devices"))
        .json(&default_device())
        .await
        .json();
    let device_id = id_of(&device);
    let mut sensor = serde_json::to_value(default_temperature()).unwrap();
    sensor["device"] = json!({ "id": device_id });
    as_user(server.post("/api/temperatures"))
        .json(&sensor)
        .await
        .assert_status(StatusCode::CREATED);
    devices.mark_referenced(device_id.into()).await;

    let response = as_user(server.delete(&format!("/api/devices/{}", device_id))).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["errorKey"], "validation");

    // the device and the sensor pointing at it are both still found
    as_user(server.get(&format!("/api/devices/{}", device_id)))
        .await
        .assert_status_ok();
    let hits: Vec<Value> = as_user(server.get("/api/_search/devices"))
        .add_query_param("query", &format!("id:{}", device_id))
        .await
        .json();
    assert_eq!(hits.len(), 1);
    let hits: Vec<Value> = as_user(server.get("/api/_search/temperatures"))
        .add_query_param("query", &format!("device.id:{}", device_id))
        .await
        .json();
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn test_reindex_requires_admin() {
    let server = server();
    as_user(server.post("/api/devices"))
        .json(&default_device())
        .await
        .assert_status(StatusCode::CREATED);

    as_user(server.post("/api/_reindex/devices"))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = as_admin(server.post("/api/_reindex/devices")).await;
    response.assert_status_ok();
    response.assert_json(&json!({ "indexed": 1 }));
}

#[tokio::test]
async fn test_values_link_sensors() {
    let server = server();
    let sensor: Value = as_user(server.post("/api/temperatures"))
        .json(&default_temperature())
        .await
        .json();
    let sensor_id = id_of(&sensor);

    let response = as_user(server.post("/api/values"))
        .json(&json!({ "value": 21.5, "temperatures": [{ "id": sensor_id }] }))
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(
        response.headers()["x-devicehubapp-alert"],
        "deviceHubApp.values.created"
    );

    let created: Value = response.json();
    assert_eq!(created["temperatures"], json!([{ "id": sensor_id }]));

    let hits: Vec<Value> = as_user(server.get("/api/_search/values"))
        .add_query_param("query", &format!("temperatures.id:{}", sensor_id))
        .await
        .json();
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn test_application_data_travels_as_base64() {
    let server = server();

    let response = as_user(server.post("/api/applications"))
        .json(&default_application())
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["data"], "AAE=");

    let fetched: Value = as_user(server.get(&format!("/api/applications/{}", id_of(&created))))
        .await
        .json();
    assert_eq!(fetched["data"], "AAE=");
    assert_eq!(fetched["dataContentType"], created["dataContentType"]);
}

#[tokio::test]
async fn test_sms_notification_references_device() {
    let server = server();
    let device: Value = as_user(server.post("/api/devices"))
        .json(&default_device())
        .await
        .json();

    let mut sms = serde_json::to_value(default_sms_notification()).unwrap();
    sms["device"] = json!({ "id": id_of(&device) });
    let created: Value = as_user(server.post("/api/sms-notifications"))
        .json(&sms)
        .await
        .json();

    assert_eq!(created["device"]["id"], device["id"]);
}

#[tokio::test]
async fn test_health_endpoints() {
    let server = TestServer::new(create_router(state(vec![Arc::new(
        InMemorySearchIndex::<Temperature>::new(),
    )])))
    .unwrap();

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");

    let response = server.get("/health/ready").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_reindex_all_counts_every_entity() {
    let state = state(Vec::new());
    state.temperatures.create(default_temperature()).await.unwrap();
    state.devices.create(default_device()).await.unwrap();

    assert_eq!(state.reindex_all().await.unwrap(), 2);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let server = server();
    let response = server.get("/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}
