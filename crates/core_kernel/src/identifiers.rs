//! Strongly-typed identifiers for domain entities
//!
//! Every entity is keyed by a sequence-generated 64-bit integer. Newtype
//! wrappers keep a `DeviceId` from being passed where a `TemperatureId`
//! is expected, while still serializing as a plain JSON number.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

macro_rules! define_id {
    ($name:ident, $entity:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw key
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw key
            pub const fn value(&self) -> i64 {
                self.0
            }

            /// Returns the name of the entity this identifier belongs to
            pub fn entity_name() -> &'static str {
                $entity
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| CoreError::invalid_identifier($entity, s))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_id!(TemperatureId, "Temperature");
define_id!(DeviceId, "Device");
define_id!(ApplicationId, "Application");
define_id!(PushNotificationTokenId, "PushNotificationToken");
define_id!(SmsNotificationId, "SMSNotification");
define_id!(ValuesId, "Values");

/// Reference to another entity by primary key
///
/// Associations are carried as references rather than embedded records, and
/// serialize as `{"id": 42}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef<I> {
    pub id: I,
}

impl<I> EntityRef<I> {
    pub fn new(id: I) -> Self {
        Self { id }
    }
}

impl<I> From<I> for EntityRef<I> {
    fn from(id: I) -> Self {
        Self { id }
    }
}
