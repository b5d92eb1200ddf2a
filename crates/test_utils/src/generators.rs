//! Property-Based Test Generators
//!
//! Proptest strategies for entities whose fields respect the column bounds.

use chrono::{DateTime, TimeZone, Utc};
use proptest::collection::btree_set;
use proptest::prelude::*;

use core_kernel::{DeviceId, TemperatureId};
use domain_devices::{Device, Temperature, Values};

/// Short alphanumeric text, always a single searchable word
pub fn word_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{2,11}"
}

/// Text within the 255 character column limit
pub fn text_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ,.'-]{0,255}"
}

/// Instants between 1970 and 2100
pub fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800i64).prop_map(|secs| Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
}

pub fn id_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000i64
}

pub fn temperature_strategy() -> impl Strategy<Value = Temperature> {
    (
        id_strategy(),
        word_strategy(),
        text_strategy(),
        timestamp_strategy(),
        proptest::option::of(id_strategy()),
    )
        .prop_map(|(id, name, address, created, device)| {
            let sensor = Temperature::new()
                .with_id(TemperatureId::new(id))
                .with_name(name)
                .with_address(address)
                .with_create_timestamp(created);
            match device {
                Some(device) => sensor.with_device(DeviceId::new(device)),
                None => sensor,
            }
        })
}

pub fn device_strategy() -> impl Strategy<Value = Device> {
    (id_strategy(), word_strategy(), any::<bool>()).prop_map(|(id, uuid, updated)| {
        Device::new()
            .with_id(DeviceId::new(id))
            .with_uuid(uuid)
            .with_id_updated(updated)
    })
}

/// Persisted readings linked to up to five sensors
pub fn values_strategy() -> impl Strategy<Value = Values> {
    (
        id_strategy(),
        -100.0f64..100.0f64,
        btree_set(id_strategy(), 0..5),
    )
        .prop_map(|(id, value, sensors)| {
            sensors.into_iter().fold(
                Values::new().with_id(id.into()).with_value(value),
                |values, sensor| values.with_temperature(TemperatureId::new(sensor)),
            )
        })
}
