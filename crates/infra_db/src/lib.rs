//! Infrastructure Database Layer
//!
//! This crate provides the PostgreSQL primary store for the device hub,
//! using SQLx for connection pooling and queries.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: one repository per entity,
//! each implementing [`core_kernel::EntityPort`] so the domain service can
//! stay unaware of SQL. Row types are mapped with `sqlx::FromRow` and
//! converted into domain entities at the repository boundary.
//!
//! | Entity | Table |
//! |---|---|
//! | Temperature | `temperature` |
//! | Device | `device` |
//! | Application | `application` |
//! | PushNotificationToken | `push_notification_token` |
//! | SMSNotification | `sms_notification` |
//! | Values | `"values"` + `values_temperatures` |
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, PgTemperatureRepository};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/devicehub")).await?;
//! let repo = PgTemperatureRepository::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod health;
pub mod repositories;

pub use pool::{DatabasePool, create_pool, create_pool_from_url, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use health::DatabaseHealth;
pub use repositories::{
    PgApplicationRepository, PgDeviceRepository, PgPushNotificationTokenRepository,
    PgSmsNotificationRepository, PgTemperatureRepository, PgValuesRepository,
};
