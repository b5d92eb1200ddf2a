//! Push notification tokens

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use core_kernel::{DeviceId, Entity, EntityRef, PushNotificationTokenId, SearchField};

use crate::codec::show;

/// A push token issued to a device by its platform notification service
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PushNotificationToken {
    pub id: Option<PushNotificationTokenId>,
    #[validate(length(max = 255))]
    pub token: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub device: Option<EntityRef<DeviceId>>,
}

impl PushNotificationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: PushNotificationTokenId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    pub fn with_device(mut self, device: DeviceId) -> Self {
        self.device = Some(EntityRef::new(device));
        self
    }
}

impl Entity for PushNotificationToken {
    type Id = PushNotificationTokenId;
    const ENTITY_NAME: &'static str = "PushNotificationToken";
    const INDEX_NAME: &'static str = "pushnotificationtoken";

    fn id(&self) -> Option<PushNotificationTokenId> {
        self.id
    }

    fn set_id(&mut self, id: PushNotificationTokenId) {
        self.id = Some(id);
    }

    fn search_fields(&self) -> Vec<SearchField> {
        [
            SearchField::optional("token", self.token.as_ref()),
            self.timestamp.map(|t| SearchField::new("timestamp", t.to_rfc3339())),
            self.device.map(|d| SearchField::new("device.id", d.id)),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl PartialEq for PushNotificationToken {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl fmt::Display for PushNotificationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PushNotificationToken{{id={}, token='{}', timestamp='{}'}}",
            show(&self.id),
            show(&self.token),
            show(&self.timestamp),
        )
    }
}
