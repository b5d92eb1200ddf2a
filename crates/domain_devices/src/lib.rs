//! Device Domain
//!
//! This crate holds the records managed by the device hub and the service
//! that applies the create / update / list / get / delete / search operations
//! to each of them.
//!
//! # Entities
//!
//! - **Temperature**: a named temperature sensor at an address, optionally
//!   attached to a device
//! - **Device**: a registered handset running the companion app
//! - **Application**: an uploaded application build with its binary payload
//! - **PushNotificationToken**: a push token issued to a device
//! - **SmsNotification**: an SMS sent on behalf of a device
//! - **Values**: a reading, linked to any number of temperature sensors
//!
//! Every entity is keyed by a store-assigned integer id and compares equal
//! only to another persisted entity with the same id.
//!
//! # Examples
//!
//! ```rust
//! use domain_devices::{Temperature, Device};
//! use core_kernel::{DeviceId, Entity};
//!
//! let device = Device::new().with_uuid("3f2a").with_app_version("1.4.0");
//! assert!(device.id().is_none());
//!
//! let sensor = Temperature::new()
//!     .with_name("Greenhouse")
//!     .with_device(DeviceId::new(1));
//! assert_eq!(sensor.device.map(|d| d.id), Some(DeviceId::new(1)));
//! ```

pub mod temperature;
pub mod device;
pub mod application;
pub mod push_notification_token;
pub mod sms_notification;
pub mod values;
pub mod codec;
pub mod error;
pub mod service;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use temperature::Temperature;
pub use device::Device;
pub use application::Application;
pub use push_notification_token::PushNotificationToken;
pub use sms_notification::SmsNotification;
pub use values::Values;
pub use error::DomainError;
pub use service::EntityService;
