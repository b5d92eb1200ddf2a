//! Core Kernel - Foundational types shared by every device hub crate
//!
//! This crate provides the building blocks used across the workspace:
//! - Strongly-typed entity identifiers
//! - The [`Entity`] contract implemented by every persisted record
//! - Storage ports for the primary store and the search index

pub mod identifiers;
pub mod entity;
pub mod ports;
pub mod error;

pub use identifiers::{
    TemperatureId, DeviceId, ApplicationId, PushNotificationTokenId,
    SmsNotificationId, ValuesId, EntityRef,
};
pub use entity::{Entity, SearchField};
pub use ports::{
    PortError, DomainPort, EntityPort, SearchPort,
    AdapterHealth, HealthCheckResult, HealthCheckable,
};
pub use error::CoreError;
