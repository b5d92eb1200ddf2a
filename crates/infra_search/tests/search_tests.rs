//! Tests for the in-memory search index against the device entities

use proptest::prelude::*;
use std::collections::BTreeSet;

use core_kernel::{DeviceId, Entity, HealthCheckable, PortError, SearchPort, TemperatureId, ValuesId};
use domain_devices::{Device, PushNotificationToken, Temperature, Values};
use infra_search::{InMemorySearchIndex, Query};
use test_utils::{device_strategy, temperature_strategy, values_strategy};

async fn temperature_index() -> InMemorySearchIndex<Temperature> {
    let index = InMemorySearchIndex::new();
    let sensors = [
        Temperature::new()
            .with_id(TemperatureId::new(1))
            .with_name("Cellar")
            .with_address("12 Main Street")
            .with_device(DeviceId::new(10)),
        Temperature::new()
            .with_id(TemperatureId::new(2))
            .with_name("Attic")
            .with_address("12 Main Street")
            .with_device(DeviceId::new(11)),
        Temperature::new()
            .with_id(TemperatureId::new(3))
            .with_name("Greenhouse"),
    ];
    for sensor in &sensors {
        index.index(sensor).await.unwrap();
    }
    index
}

fn ids(hits: &[Temperature]) -> Vec<i64> {
    hits.iter().filter_map(|t| t.id).map(i64::from).collect()
}

#[tokio::test]
async fn test_match_all_variants() {
    let index = temperature_index().await;
    for q in ["", "*", "*:*", "   "] {
        assert_eq!(index.search(q).await.unwrap().len(), 3, "query {:?}", q);
    }
}

#[tokio::test]
async fn test_field_term_is_case_insensitive() {
    let index = temperature_index().await;
    let hits = index.search("name:cellar").await.unwrap();
    assert_eq!(ids(&hits), vec![1]);
}

#[tokio::test]
async fn test_phrase_and_boolean_queries() {
    let index = temperature_index().await;

    let hits = index.search("address:\"main street\"").await.unwrap();
    assert_eq!(ids(&hits), vec![1, 2]);

    let hits = index.search("address:\"main street\" AND NOT name:attic").await.unwrap();
    assert_eq!(ids(&hits), vec![1]);

    let hits = index.search("cellar OR greenhouse").await.unwrap();
    assert_eq!(ids(&hits), vec![1, 3]);
}

#[tokio::test]
async fn test_exists_and_reference_fields() {
    let index = temperature_index().await;

    let hits = index.search("device.id:*").await.unwrap();
    assert_eq!(ids(&hits), vec![1, 2]);

    let hits = index.search("device.id:11").await.unwrap();
    assert_eq!(ids(&hits), vec![2]);
}

#[tokio::test]
async fn test_prefix_query() {
    let index = temperature_index().await;
    let hits = index.search("name:green*").await.unwrap();
    assert_eq!(ids(&hits), vec![3]);
}

#[tokio::test]
async fn test_invalid_query_is_reported() {
    let index = temperature_index().await;
    let err = index.search("name:(cellar").await.unwrap_err();
    assert!(matches!(err, PortError::InvalidQuery { .. }));
}

#[tokio::test]
async fn test_remove_and_clear() {
    let index = temperature_index().await;
    index.remove(TemperatureId::new(1)).await.unwrap();
    assert!(index.search("cellar").await.unwrap().is_empty());

    // removing an unknown id is not an error
    index.remove(TemperatureId::new(99)).await.unwrap();

    index.clear().await.unwrap();
    assert!(index.is_empty().await);
}

#[tokio::test]
async fn test_retain_drops_only_unlisted_documents() {
    let index = temperature_index().await;
    let keep: BTreeSet<TemperatureId> = [TemperatureId::new(1), TemperatureId::new(3)].into_iter().collect();

    index.retain(&keep).await.unwrap();

    assert_eq!(index.len().await, 2);
    assert_eq!(ids(&index.search("*").await.unwrap()), vec![1, 3]);
}

#[tokio::test]
async fn test_deeply_nested_query_is_rejected() {
    let index = temperature_index().await;
    let query = format!("{}cellar{}", "(".repeat(1000), ")".repeat(1000));

    let err = index.search(&query).await.unwrap_err();

    assert!(matches!(err, PortError::InvalidQuery { .. }));
}

#[tokio::test]
async fn test_reindexing_replaces_document() {
    let index = temperature_index().await;
    let renamed = Temperature::new().with_id(TemperatureId::new(1)).with_name("Basement");
    index.index(&renamed).await.unwrap();

    assert_eq!(index.len().await, 3);
    assert!(index.search("cellar").await.unwrap().is_empty());
    assert_eq!(ids(&index.search("basement").await.unwrap()), vec![1]);
}

#[tokio::test]
async fn test_unsaved_entity_cannot_be_indexed() {
    let index: InMemorySearchIndex<Device> = InMemorySearchIndex::new();
    let err = index.index(&Device::new().with_uuid("AAAA")).await.unwrap_err();
    assert!(matches!(err, PortError::Validation { .. }));
}

#[tokio::test]
async fn test_values_linked_temperature_search() {
    let index: InMemorySearchIndex<Values> = InMemorySearchIndex::new();
    index
        .index(
            &Values::new()
                .with_id(ValuesId::new(1))
                .with_value(21.5)
                .with_temperature(TemperatureId::new(4)),
        )
        .await
        .unwrap();
    index
        .index(&Values::new().with_id(ValuesId::new(2)).with_value(3.0))
        .await
        .unwrap();

    let hits = index.search("temperatures.id:4").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, Some(ValuesId::new(1)));
}

#[tokio::test]
async fn test_token_search_and_health() {
    let index: InMemorySearchIndex<PushNotificationToken> = InMemorySearchIndex::new();
    index
        .index(
            &PushNotificationToken::new()
                .with_id(1.into())
                .with_token("fcm-AAAAAAAAAA"),
        )
        .await
        .unwrap();

    assert_eq!(index.search("token:fcm*").await.unwrap().len(), 1);

    let health = index.health_check().await;
    assert!(health.is_healthy());
}

proptest! {
    #[test]
    fn parse_never_panics(input in "\\PC{0,40}") {
        let _ = Query::parse(&input);
    }

    #[test]
    fn single_words_always_parse(word in "[a-z0-9]{1,12}") {
        prop_assert!(Query::parse(&word).is_ok());
    }

    #[test]
    fn sensor_matches_its_own_fields(sensor in temperature_strategy()) {
        let document = sensor.search_document();
        let name = sensor.name.clone().unwrap_or_default();
        let by_name = Query::parse(&format!("name:{}", name)).unwrap();
        prop_assert!(by_name.matches(&document));

        let by_id = Query::parse(&format!("id:{}", sensor.id().unwrap())).unwrap();
        prop_assert!(by_id.matches(&document));

        let attached = Query::parse("device.id:*").unwrap();
        prop_assert_eq!(attached.matches(&document), sensor.device.is_some());
    }

    #[test]
    fn device_flag_is_searchable(device in device_strategy()) {
        let query = Query::parse(&format!("idUpdated:{}", device.id_updated.unwrap_or_default())).unwrap();
        prop_assert!(query.matches(&device.search_document()));
    }

    #[test]
    fn reading_matches_every_linked_sensor(values in values_strategy()) {
        let document = values.search_document();
        for sensor in values.temperature_ids() {
            let query = Query::parse(&format!("temperatures.id:{}", sensor)).unwrap();
            prop_assert!(query.matches(&document));
        }
    }
}
