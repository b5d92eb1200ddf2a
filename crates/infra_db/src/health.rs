//! Database health check

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use core_kernel::{AdapterHealth, HealthCheckResult, HealthCheckable};

/// Pings the primary store with `SELECT 1`
#[derive(Debug, Clone)]
pub struct DatabaseHealth {
    pool: PgPool,
}

impl DatabaseHealth {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthCheckable for DatabaseHealth {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        };

        HealthCheckResult {
            adapter_id: "postgres".to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}
