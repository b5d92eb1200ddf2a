//! Randomised Test Data
//!
//! Builds entities with plausible random field values from `fake`, for tests
//! that need many distinct records rather than the fixed fixtures.

use chrono::{DateTime, Duration, TimeZone, Utc};
use fake::faker::address::en::{CityName, StreetName};
use fake::faker::lorem::en::{Sentence, Word};
use fake::faker::phone_number::en::PhoneNumber;
use fake::{Fake, Faker};

use core_kernel::DeviceId;
use domain_devices::{Device, PushNotificationToken, SmsNotification, Temperature};

/// A random instant within 2024
pub fn fake_timestamp() -> DateTime<Utc> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    start + Duration::seconds((0..31_536_000i64).fake())
}

pub fn fake_temperature() -> Temperature {
    let created = fake_timestamp();
    Temperature::new()
        .with_name(CityName().fake::<String>())
        .with_address(StreetName().fake::<String>())
        .with_create_timestamp(created)
        .with_last_update_timestamp(created + Duration::minutes((0..600i64).fake()))
}

pub fn fake_device() -> Device {
    let hex: u64 = Faker.fake();
    Device::new()
        .with_uuid(format!("{:016x}", hex))
        .with_app_version(format!(
            "{}.{}.{}",
            (1..5u8).fake::<u8>(),
            (0..20u8).fake::<u8>(),
            (0..100u8).fake::<u8>()
        ))
        .with_id_updated(Faker.fake())
}

pub fn fake_push_notification_token(device: Option<DeviceId>) -> PushNotificationToken {
    let token = PushNotificationToken::new()
        .with_token(format!("{}:{:x}", Word().fake::<String>(), Faker.fake::<u64>()))
        .with_timestamp(fake_timestamp());
    match device {
        Some(device) => token.with_device(device),
        None => token,
    }
}

pub fn fake_sms_notification(device: Option<DeviceId>) -> SmsNotification {
    let mut message: String = Sentence(3..8).fake();
    message.truncate(255);
    let sms = SmsNotification::new()
        .with_phone_number(PhoneNumber().fake::<String>().chars().take(32).collect::<String>())
        .with_message(message)
        .with_timestamp(fake_timestamp());
    match device {
        Some(device) => sms.with_device(device),
        None => sms,
    }
}

/// `count` random sensors, none attached to a device
pub fn fake_temperatures(count: usize) -> Vec<Temperature> {
    (0..count).map(|_| fake_temperature()).collect()
}
