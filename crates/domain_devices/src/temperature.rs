//! Temperature sensors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use core_kernel::{DeviceId, Entity, EntityRef, SearchField, TemperatureId};

use crate::codec::show;

/// A named temperature sensor installed at an address
///
/// A sensor may be attached to the device that reports for it. Readings
/// reference sensors from the [`Values`](crate::Values) side; the sensor
/// itself does not carry them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct Temperature {
    pub id: Option<TemperatureId>,
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    pub create_timestamp: Option<DateTime<Utc>>,
    pub last_update_timestamp: Option<DateTime<Utc>>,
    pub device: Option<EntityRef<DeviceId>>,
}

impl Temperature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: TemperatureId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_create_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.create_timestamp = Some(at);
        self
    }

    pub fn with_last_update_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.last_update_timestamp = Some(at);
        self
    }

    pub fn with_device(mut self, device: DeviceId) -> Self {
        self.device = Some(EntityRef::new(device));
        self
    }
}

impl Entity for Temperature {
    type Id = TemperatureId;
    const ENTITY_NAME: &'static str = "Temperature";
    const INDEX_NAME: &'static str = "temperature";

    fn id(&self) -> Option<TemperatureId> {
        self.id
    }

    fn set_id(&mut self, id: TemperatureId) {
        self.id = Some(id);
    }

    fn search_fields(&self) -> Vec<SearchField> {
        [
            SearchField::optional("name", self.name.as_ref()),
            SearchField::optional("address", self.address.as_ref()),
            self.create_timestamp
                .map(|t| SearchField::new("createTimestamp", t.to_rfc3339())),
            self.last_update_timestamp
                .map(|t| SearchField::new("lastUpdateTimestamp", t.to_rfc3339())),
            self.device.map(|d| SearchField::new("device.id", d.id)),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl PartialEq for Temperature {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Temperature{{id={}, name='{}', address='{}', createTimestamp='{}', lastUpdateTimestamp='{}'}}",
            show(&self.id),
            show(&self.name),
            show(&self.address),
            show(&self.create_timestamp),
            show(&self.last_update_timestamp),
        )
    }
}
