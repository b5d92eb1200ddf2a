//! SMS notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use core_kernel::{DeviceId, Entity, EntityRef, SearchField, SmsNotificationId};

use crate::codec::show;

/// A text message sent on behalf of a device
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SmsNotification {
    pub id: Option<SmsNotificationId>,
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
    #[validate(length(max = 255))]
    pub message: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub device: Option<EntityRef<DeviceId>>,
}

impl SmsNotification {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: SmsNotificationId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_phone_number(mut self, number: impl Into<String>) -> Self {
        self.phone_number = Some(number.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
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

impl Entity for SmsNotification {
    type Id = SmsNotificationId;
    const ENTITY_NAME: &'static str = "SMSNotification";
    const INDEX_NAME: &'static str = "smsnotification";

    fn id(&self) -> Option<SmsNotificationId> {
        self.id
    }

    fn set_id(&mut self, id: SmsNotificationId) {
        self.id = Some(id);
    }

    fn search_fields(&self) -> Vec<SearchField> {
        [
            SearchField::optional("phoneNumber", self.phone_number.as_ref()),
            SearchField::optional("message", self.message.as_ref()),
            self.timestamp.map(|t| SearchField::new("timestamp", t.to_rfc3339())),
            self.device.map(|d| SearchField::new("device.id", d.id)),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl PartialEq for SmsNotification {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl fmt::Display for SmsNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SMSNotification{{id={}, phoneNumber='{}', message='{}', timestamp='{}'}}",
            show(&self.id),
            show(&self.phone_number),
            show(&self.message),
            show(&self.timestamp),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_number_length() {
        let sms = SmsNotification::new().with_phone_number("+1".repeat(20));
        assert!(sms.validate().is_err());
    }
}
