//! Push notification token repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{DomainPort, Entity, EntityPort, PortError, PushNotificationTokenId};
use domain_devices::PushNotificationToken;

use super::{device_column, device_ref, save_error};
use crate::error::DatabaseError;

const COLUMNS: &str = "id, token, timestamp, device_id";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PushNotificationTokenRow {
    pub id: i64,
    pub token: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub device_id: Option<i64>,
}

impl From<PushNotificationTokenRow> for PushNotificationToken {
    fn from(row: PushNotificationTokenRow) -> Self {
        PushNotificationToken {
            id: Some(PushNotificationTokenId::new(row.id)),
            token: row.token,
            timestamp: row.timestamp,
            device: device_ref(row.device_id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgPushNotificationTokenRepository {
    pool: PgPool,
}

impl PgPushNotificationTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, entity: &PushNotificationToken) -> Result<PushNotificationTokenRow, DatabaseError> {
        let row = sqlx::query_as::<_, PushNotificationTokenRow>(&format!(
            "INSERT INTO push_notification_token (token, timestamp, device_id) \
             VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        ))
        .bind(&entity.token)
        .bind(entity.timestamp)
        .bind(device_column(&entity.device))
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(
        &self,
        id: PushNotificationTokenId,
        entity: &PushNotificationToken,
    ) -> Result<PushNotificationTokenRow, DatabaseError> {
        sqlx::query_as::<_, PushNotificationTokenRow>(&format!(
            "UPDATE push_notification_token SET token = $2, timestamp = $3, device_id = $4 \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id.value())
        .bind(&entity.token)
        .bind(entity.timestamp)
        .bind(device_column(&entity.device))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found(PushNotificationToken::ENTITY_NAME, id))
    }
}

impl DomainPort for PgPushNotificationTokenRepository {}

#[async_trait]
impl EntityPort<PushNotificationToken> for PgPushNotificationTokenRepository {
    #[instrument(skip_all, fields(id = ?entity.id))]
    async fn save(&self, entity: PushNotificationToken) -> Result<PushNotificationToken, PortError> {
        let row = match entity.id {
            Some(id) => self.update(id, &entity).await,
            None => self.insert(&entity).await,
        }
        .map_err(|e| save_error::<PushNotificationToken>(e, entity.id))?;
        debug!(id = row.id, "Saved push notification token");
        Ok(row.into())
    }

    async fn find_by_id(&self, id: PushNotificationTokenId) -> Result<Option<PushNotificationToken>, PortError> {
        let row = sqlx::query_as::<_, PushNotificationTokenRow>(&format!(
            "SELECT {COLUMNS} FROM push_notification_token WHERE id = $1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(row.map(PushNotificationToken::from))
    }

    async fn find_all(&self) -> Result<Vec<PushNotificationToken>, PortError> {
        let rows = sqlx::query_as::<_, PushNotificationTokenRow>(&format!(
            "SELECT {COLUMNS} FROM push_notification_token ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(rows.into_iter().map(PushNotificationToken::from).collect())
    }

    async fn delete_by_id(&self, id: PushNotificationTokenId) -> Result<bool, PortError> {
        let result = sqlx::query("DELETE FROM push_notification_token WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
