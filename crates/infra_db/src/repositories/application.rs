//! Application build repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{ApplicationId, DomainPort, Entity, EntityPort, PortError};
use domain_devices::Application;

use super::save_error;
use crate::error::DatabaseError;

const COLUMNS: &str = "id, file_name, data, data_content_type, version, timestamp";

/// Database row for the `application` table; `data` is a `BYTEA` column
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApplicationRow {
    pub id: i64,
    pub file_name: Option<String>,
    pub data: Option<Vec<u8>>,
    pub data_content_type: Option<String>,
    pub version: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<ApplicationRow> for Application {
    fn from(row: ApplicationRow) -> Self {
        Application {
            id: Some(ApplicationId::new(row.id)),
            file_name: row.file_name,
            data: row.data,
            data_content_type: row.data_content_type,
            version: row.version,
            timestamp: row.timestamp,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgApplicationRepository {
    pool: PgPool,
}

impl PgApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, entity: &Application) -> Result<ApplicationRow, DatabaseError> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "INSERT INTO application (file_name, data, data_content_type, version, timestamp) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
        ))
        .bind(&entity.file_name)
        .bind(&entity.data)
        .bind(&entity.data_content_type)
        .bind(&entity.version)
        .bind(entity.timestamp)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: ApplicationId, entity: &Application) -> Result<ApplicationRow, DatabaseError> {
        sqlx::query_as::<_, ApplicationRow>(&format!(
            "UPDATE application SET file_name = $2, data = $3, data_content_type = $4, \
             version = $5, timestamp = $6 WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id.value())
        .bind(&entity.file_name)
        .bind(&entity.data)
        .bind(&entity.data_content_type)
        .bind(&entity.version)
        .bind(entity.timestamp)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found(Application::ENTITY_NAME, id))
    }
}

impl DomainPort for PgApplicationRepository {}

#[async_trait]
impl EntityPort<Application> for PgApplicationRepository {
    #[instrument(skip_all, fields(id = ?entity.id, bytes = entity.data_len()))]
    async fn save(&self, entity: Application) -> Result<Application, PortError> {
        let row = match entity.id {
            Some(id) => self.update(id, &entity).await,
            None => self.insert(&entity).await,
        }
        .map_err(|e| save_error::<Application>(e, entity.id))?;
        debug!(id = row.id, "Saved application");
        Ok(row.into())
    }

    async fn find_by_id(&self, id: ApplicationId) -> Result<Option<Application>, PortError> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {COLUMNS} FROM application WHERE id = $1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(row.map(Application::from))
    }

    async fn find_all(&self) -> Result<Vec<Application>, PortError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {COLUMNS} FROM application ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(rows.into_iter().map(Application::from).collect())
    }

    async fn delete_by_id(&self, id: ApplicationId) -> Result<bool, PortError> {
        let result = sqlx::query("DELETE FROM application WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
