//! Registered devices

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use core_kernel::{DeviceId, Entity, SearchField};

use crate::codec::show;

/// A handset running the companion app
///
/// `id_updated` records whether the device has re-registered under a new
/// hardware uuid since it was first seen.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct Device {
    pub id: Option<DeviceId>,
    #[validate(length(max = 255))]
    pub uuid: Option<String>,
    #[validate(length(max = 255))]
    pub app_version: Option<String>,
    pub id_updated: Option<bool>,
}

impl Device {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = Some(version.into());
        self
    }

    pub fn with_id_updated(mut self, updated: bool) -> Self {
        self.id_updated = Some(updated);
        self
    }

    pub fn is_id_updated(&self) -> bool {
        self.id_updated.unwrap_or(false)
    }
}

impl Entity for Device {
    type Id = DeviceId;
    const ENTITY_NAME: &'static str = "Device";
    const INDEX_NAME: &'static str = "device";

    fn id(&self) -> Option<DeviceId> {
        self.id
    }

    fn set_id(&mut self, id: DeviceId) {
        self.id = Some(id);
    }

    fn search_fields(&self) -> Vec<SearchField> {
        [
            SearchField::optional("uuid", self.uuid.as_ref()),
            SearchField::optional("appVersion", self.app_version.as_ref()),
            SearchField::optional("idUpdated", self.id_updated.as_ref()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device{{id={}, uuid='{}', appVersion='{}', idUpdated='{}'}}",
            show(&self.id),
            show(&self.uuid),
            show(&self.app_version),
            show(&self.id_updated),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_names() {
        let json = r#"{"uuid":"AAAAAAAAAA","appVersion":"1.0","idUpdated":true}"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert!(device.id.is_none());
        assert_eq!(device.app_version.as_deref(), Some("1.0"));
        assert!(device.is_id_updated());
    }

    #[test]
    fn test_display() {
        let device = Device::new().with_id(DeviceId::new(1)).with_uuid("u-1");
        assert_eq!(
            device.to_string(),
            "Device{id=1, uuid='u-1', appVersion='null', idUpdated='null'}"
        );
    }

    #[test]
    fn test_search_fields_skip_missing_values() {
        let device = Device::new().with_app_version("2.1");
        let fields = device.search_fields();
        assert_eq!(fields, vec![SearchField::new("appVersion", "2.1")]);
    }
}
