//! Device repository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{DeviceId, DomainPort, Entity, EntityPort, PortError};
use domain_devices::Device;

use super::save_error;
use crate::error::DatabaseError;

const COLUMNS: &str = "id, uuid, app_version, id_updated";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeviceRow {
    pub id: i64,
    pub uuid: Option<String>,
    pub app_version: Option<String>,
    pub id_updated: Option<bool>,
}

impl From<DeviceRow> for Device {
    fn from(row: DeviceRow) -> Self {
        Device {
            id: Some(DeviceId::new(row.id)),
            uuid: row.uuid,
            app_version: row.app_version,
            id_updated: row.id_updated,
        }
    }
}

/// PostgreSQL store for registered devices
#[derive(Debug, Clone)]
pub struct PgDeviceRepository {
    pool: PgPool,
}

impl PgDeviceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PgDeviceRepository {}

#[async_trait]
impl EntityPort<Device> for PgDeviceRepository {
    #[instrument(skip_all, fields(id = ?entity.id))]
    async fn save(&self, entity: Device) -> Result<Device, PortError> {
        let result = match entity.id {
            Some(id) => sqlx::query_as::<_, DeviceRow>(&format!(
                "UPDATE device SET uuid = $2, app_version = $3, id_updated = $4 \
                 WHERE id = $1 RETURNING {COLUMNS}"
            ))
            .bind(id.value())
            .bind(&entity.uuid)
            .bind(&entity.app_version)
            .bind(entity.id_updated)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from)
            .and_then(|row| row.ok_or_else(|| DatabaseError::not_found(Device::ENTITY_NAME, id))),
            None => sqlx::query_as::<_, DeviceRow>(&format!(
                "INSERT INTO device (uuid, app_version, id_updated) VALUES ($1, $2, $3) \
                 RETURNING {COLUMNS}"
            ))
            .bind(&entity.uuid)
            .bind(&entity.app_version)
            .bind(entity.id_updated)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from),
        };
        let row = result.map_err(|e| save_error::<Device>(e, entity.id))?;
        debug!(id = row.id, "Saved device");
        Ok(row.into())
    }

    async fn find_by_id(&self, id: DeviceId) -> Result<Option<Device>, PortError> {
        let row = sqlx::query_as::<_, DeviceRow>(&format!("SELECT {COLUMNS} FROM device WHERE id = $1"))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(row.map(Device::from))
    }

    async fn find_all(&self) -> Result<Vec<Device>, PortError> {
        let rows = sqlx::query_as::<_, DeviceRow>(&format!("SELECT {COLUMNS} FROM device ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(rows.into_iter().map(Device::from).collect())
    }

    async fn delete_by_id(&self, id: DeviceId) -> Result<bool, PortError> {
        let result = sqlx::query("DELETE FROM device WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
