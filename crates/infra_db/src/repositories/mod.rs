//! Repository implementations for domain entities
//!
//! Each repository owns the SQL for one table, maps rows with
//! `sqlx::FromRow` and implements [`core_kernel::EntityPort`] for its
//! entity. Ids come from the shared `sequence_generator` sequence, so an
//! insert never carries an id and an update always does.

pub mod temperature;
pub mod device;
pub mod application;
pub mod push_notification_token;
pub mod sms_notification;
pub mod values;

pub use temperature::PgTemperatureRepository;
pub use device::PgDeviceRepository;
pub use application::PgApplicationRepository;
pub use push_notification_token::PgPushNotificationTokenRepository;
pub use sms_notification::PgSmsNotificationRepository;
pub use values::PgValuesRepository;

use core_kernel::{DeviceId, Entity, EntityRef, PortError};

use crate::error::DatabaseError;

/// Foreign key column to device reference
pub(crate) fn device_ref(device_id: Option<i64>) -> Option<EntityRef<DeviceId>> {
    device_id.map(|id| EntityRef::new(DeviceId::new(id)))
}

/// Device reference to foreign key column
pub(crate) fn device_column(device: &Option<EntityRef<DeviceId>>) -> Option<i64> {
    device.as_ref().map(|r| r.id.value())
}

/// Maps a failed save, naming the entity when an update hit no row
pub(crate) fn save_error<E: Entity>(err: DatabaseError, id: Option<E::Id>) -> PortError {
    match (err, id) {
        (DatabaseError::NotFound(_), Some(id)) => PortError::not_found(E::ENTITY_NAME, id),
        (other, _) => other.into(),
    }
}
