//! Temperature sensor repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{DomainPort, Entity, EntityPort, PortError, TemperatureId};
use domain_devices::Temperature;

use super::{device_column, device_ref, save_error};
use crate::error::DatabaseError;

const COLUMNS: &str = "id, name, address, create_timestamp, last_update_timestamp, device_id";

/// Database row for the `temperature` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TemperatureRow {
    pub id: i64,
    pub name: Option<String>,
    pub address: Option<String>,
    pub create_timestamp: Option<DateTime<Utc>>,
    pub last_update_timestamp: Option<DateTime<Utc>>,
    pub device_id: Option<i64>,
}

impl From<TemperatureRow> for Temperature {
    fn from(row: TemperatureRow) -> Self {
        Temperature {
            id: Some(TemperatureId::new(row.id)),
            name: row.name,
            address: row.address,
            create_timestamp: row.create_timestamp,
            last_update_timestamp: row.last_update_timestamp,
            device: device_ref(row.device_id),
        }
    }
}

/// PostgreSQL store for temperature sensors
#[derive(Debug, Clone)]
pub struct PgTemperatureRepository {
    pool: PgPool,
}

impl PgTemperatureRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, entity: &Temperature) -> Result<TemperatureRow, DatabaseError> {
        let row = sqlx::query_as::<_, TemperatureRow>(&format!(
            "INSERT INTO temperature (name, address, create_timestamp, last_update_timestamp, device_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
        ))
        .bind(&entity.name)
        .bind(&entity.address)
        .bind(entity.create_timestamp)
        .bind(entity.last_update_timestamp)
        .bind(device_column(&entity.device))
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: TemperatureId, entity: &Temperature) -> Result<TemperatureRow, DatabaseError> {
        sqlx::query_as::<_, TemperatureRow>(&format!(
            "UPDATE temperature SET name = $2, address = $3, create_timestamp = $4, \
             last_update_timestamp = $5, device_id = $6 WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id.value())
        .bind(&entity.name)
        .bind(&entity.address)
        .bind(entity.create_timestamp)
        .bind(entity.last_update_timestamp)
        .bind(device_column(&entity.device))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found(Temperature::ENTITY_NAME, id))
    }
}

impl DomainPort for PgTemperatureRepository {}

#[async_trait]
impl EntityPort<Temperature> for PgTemperatureRepository {
    #[instrument(skip_all, fields(id = ?entity.id))]
    async fn save(&self, entity: Temperature) -> Result<Temperature, PortError> {
        let row = match entity.id {
            Some(id) => self.update(id, &entity).await,
            None => self.insert(&entity).await,
        }
        .map_err(|e| save_error::<Temperature>(e, entity.id))?;
        debug!(id = row.id, "Saved temperature");
        Ok(row.into())
    }

    async fn find_by_id(&self, id: TemperatureId) -> Result<Option<Temperature>, PortError> {
        let row = sqlx::query_as::<_, TemperatureRow>(&format!(
            "SELECT {COLUMNS} FROM temperature WHERE id = $1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(row.map(Temperature::from))
    }

    async fn find_all(&self) -> Result<Vec<Temperature>, PortError> {
        let rows = sqlx::query_as::<_, TemperatureRow>(&format!(
            "SELECT {COLUMNS} FROM temperature ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(rows.into_iter().map(Temperature::from).collect())
    }

    async fn delete_by_id(&self, id: TemperatureId) -> Result<bool, PortError> {
        let result = sqlx::query("DELETE FROM temperature WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64, PortError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM temperature")
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(count as u64)
    }
}
