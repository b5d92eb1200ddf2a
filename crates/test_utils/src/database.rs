//! Database Test Utilities
//!
//! Runs PostgreSQL in a throwaway container with the device hub schema
//! applied. Tests that use it need Docker and are marked `#[ignore]`.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};
use tokio::sync::OnceCell;

const POSTGRES_IMAGE: &str = "postgres";
const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "devicehub";
const POSTGRES_PASSWORD: &str = "devicehub";
const POSTGRES_DB: &str = "devicehub_test";

/// First id handed out by `sequence_generator`
pub const FIRST_ID: i64 = 1000;

const SCHEMA: &str = include_str!("../../../migrations/20240101_000001_initial_schema.sql");

/// Every table, children before parents
const TABLES: &str =
    r#"values_temperatures, "values", sms_notification, push_notification_token, application, temperature, device"#;

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Builds a connection URL from its parts
pub fn connection_url(host: &str, port: u16) -> String {
    format!(
        "postgres://{}:{}@{}:{}/{}",
        POSTGRES_USER, POSTGRES_PASSWORD, host, port, POSTGRES_DB
    )
}

/// A PostgreSQL container plus a pool connected to it
pub struct TestDatabase {
    _container: ContainerAsync<GenericImage>,
    url: String,
    pool: PgPool,
}

impl TestDatabase {
    /// Starts a container and applies the schema
    pub async fn start() -> TestResult<Self> {
        let container = GenericImage::new(POSTGRES_IMAGE, POSTGRES_TAG)
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stderr(
                "database system is ready to accept connections",
            ))
            .with_env_var("POSTGRES_USER", POSTGRES_USER)
            .with_env_var("POSTGRES_PASSWORD", POSTGRES_PASSWORD)
            .with_env_var("POSTGRES_DB", POSTGRES_DB)
            .start()
            .await?;

        let host = container.get_host().await?.to_string();
        let port = container.get_host_port_ipv4(5432).await?;
        let url = connection_url(&host, port);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&url)
            .await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;

        Ok(Self {
            _container: container,
            url,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Empties every table and restarts the id sequence at [`FIRST_ID`]
    pub async fn reset(&self) -> TestResult<()> {
        sqlx::raw_sql(&format!(
            "TRUNCATE TABLE {TABLES} CASCADE; ALTER SEQUENCE sequence_generator RESTART WITH {FIRST_ID};"
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

static SHARED_TEST_DB: OnceCell<Arc<TestDatabase>> = OnceCell::const_new();

/// One container shared by every test in the binary
///
/// # Panics
///
/// Panics if the container cannot be started
pub async fn shared_test_database() -> Arc<TestDatabase> {
    SHARED_TEST_DB
        .get_or_init(|| async {
            Arc::new(
                TestDatabase::start()
                    .await
                    .expect("Failed to start shared test database"),
            )
        })
        .await
        .clone()
}
