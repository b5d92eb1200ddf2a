//! Pre-built Test Fixtures
//!
//! Every entity has a `default_*` fixture carrying the `DEFAULT_*` values
//! and an `updated_*` counterpart carrying the `UPDATED_*` values, so a test
//! can create with one and update with the other and tell them apart.

use chrono::{DateTime, TimeZone, Utc};

use core_kernel::{DeviceId, TemperatureId};
use domain_devices::{
    Application, Device, PushNotificationToken, SmsNotification, Temperature, Values,
};

pub const DEFAULT_TEXT: &str = "AAAAAAAAAA";
pub const UPDATED_TEXT: &str = "BBBBBBBBBB";

pub const DEFAULT_PHONE_NUMBER: &str = "+15550100";
pub const UPDATED_PHONE_NUMBER: &str = "+15550199";

pub const DEFAULT_VALUE: f64 = 1.0;
pub const UPDATED_VALUE: f64 = 2.0;

pub const DEFAULT_DATA: &[u8] = &[0x00, 0x01];
pub const UPDATED_DATA: &[u8] = &[0x01, 0x00, 0xff];
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpg";
pub const UPDATED_CONTENT_TYPE: &str = "image/png";

/// The epoch, stored as the default for every timestamp field
pub fn default_timestamp() -> DateTime<Utc> {
    Utc.timestamp_opt(0, 0).single().unwrap_or_default()
}

/// A fixed, non-epoch instant (2024-01-01T00:00:00Z)
pub fn updated_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn default_temperature() -> Temperature {
    Temperature::new()
        .with_name(DEFAULT_TEXT)
        .with_address(DEFAULT_TEXT)
        .with_create_timestamp(default_timestamp())
        .with_last_update_timestamp(default_timestamp())
}

pub fn updated_temperature() -> Temperature {
    Temperature::new()
        .with_name(UPDATED_TEXT)
        .with_address(UPDATED_TEXT)
        .with_create_timestamp(updated_timestamp())
        .with_last_update_timestamp(updated_timestamp())
}

pub fn default_device() -> Device {
    Device::new()
        .with_uuid(DEFAULT_TEXT)
        .with_app_version(DEFAULT_TEXT)
        .with_id_updated(false)
}

pub fn updated_device() -> Device {
    Device::new()
        .with_uuid(UPDATED_TEXT)
        .with_app_version(UPDATED_TEXT)
        .with_id_updated(true)
}

pub fn default_application() -> Application {
    Application::new()
        .with_file_name(DEFAULT_TEXT)
        .with_data(DEFAULT_DATA.to_vec(), DEFAULT_CONTENT_TYPE)
        .with_version(DEFAULT_TEXT)
        .with_timestamp(default_timestamp())
}

pub fn updated_application() -> Application {
    Application::new()
        .with_file_name(UPDATED_TEXT)
        .with_data(UPDATED_DATA.to_vec(), UPDATED_CONTENT_TYPE)
        .with_version(UPDATED_TEXT)
        .with_timestamp(updated_timestamp())
}

pub fn default_push_notification_token() -> PushNotificationToken {
    PushNotificationToken::new()
        .with_token(DEFAULT_TEXT)
        .with_timestamp(default_timestamp())
}

pub fn updated_push_notification_token() -> PushNotificationToken {
    PushNotificationToken::new()
        .with_token(UPDATED_TEXT)
        .with_timestamp(updated_timestamp())
}

pub fn default_sms_notification() -> SmsNotification {
    SmsNotification::new()
        .with_phone_number(DEFAULT_PHONE_NUMBER)
        .with_message(DEFAULT_TEXT)
        .with_timestamp(default_timestamp())
}

pub fn updated_sms_notification() -> SmsNotification {
    SmsNotification::new()
        .with_phone_number(UPDATED_PHONE_NUMBER)
        .with_message(UPDATED_TEXT)
        .with_timestamp(updated_timestamp())
}

pub fn default_values() -> Values {
    Values::new()
        .with_value(DEFAULT_VALUE)
        .with_timestamp(default_timestamp())
}

pub fn updated_values() -> Values {
    Values::new()
        .with_value(UPDATED_VALUE)
        .with_timestamp(updated_timestamp())
}

/// A default sensor attached to the given device
pub fn temperature_on(device: DeviceId) -> Temperature {
    default_temperature().with_device(device)
}

/// A reading linked to each of the given sensors
pub fn values_for(sensors: &[TemperatureId]) -> Values {
    sensors
        .iter()
        .fold(default_values(), |values, id| values.with_temperature(*id))
}
