//! SMS notification repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{DomainPort, Entity, EntityPort, PortError, SmsNotificationId};
use domain_devices::SmsNotification;

use super::{device_column, device_ref, save_error};
use crate::error::DatabaseError;

const COLUMNS: &str = "id, phone_number, message, timestamp, device_id";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SmsNotificationRow {
    pub id: i64,
    pub phone_number: Option<String>,
    pub message: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub device_id: Option<i64>,
}

impl From<SmsNotificationRow> for SmsNotification {
    fn from(row: SmsNotificationRow) -> Self {
        SmsNotification {
            id: Some(SmsNotificationId::new(row.id)),
            phone_number: row.phone_number,
            message: row.message,
            timestamp: row.timestamp,
            device: device_ref(row.device_id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgSmsNotificationRepository {
    pool: PgPool,
}

impl PgSmsNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PgSmsNotificationRepository {}

#[async_trait]
impl EntityPort<SmsNotification> for PgSmsNotificationRepository {
    #[instrument(skip_all, fields(id = ?entity.id))]
    async fn save(&self, entity: SmsNotification) -> Result<SmsNotification, PortError> {
        let query = match entity.id {
            Some(_) => format!(
                "UPDATE sms_notification SET phone_number = $2, message = $3, timestamp = $4, \
                 device_id = $5 WHERE id = $1 RETURNING {COLUMNS}"
            ),
            None => format!(
                "INSERT INTO sms_notification (phone_number, message, timestamp, device_id) \
                 VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
            ),
        };

        let mut statement = sqlx::query_as::<_, SmsNotificationRow>(&query);
        if let Some(id) = entity.id {
            statement = statement.bind(id.value());
        }
        let row = statement
            .bind(&entity.phone_number)
            .bind(&entity.message)
            .bind(entity.timestamp)
            .bind(device_column(&entity.device))
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from)
            .and_then(|row| {
                row.ok_or_else(|| {
                    DatabaseError::not_found(SmsNotification::ENTITY_NAME, show_id(entity.id))
                })
            })
            .map_err(|e| save_error::<SmsNotification>(e, entity.id))?;

        debug!(id = row.id, "Saved SMS notification");
        Ok(row.into())
    }

    async fn find_by_id(&self, id: SmsNotificationId) -> Result<Option<SmsNotification>, PortError> {
        let row = sqlx::query_as::<_, SmsNotificationRow>(&format!(
            "SELECT {COLUMNS} FROM sms_notification WHERE id = $1"
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(row.map(SmsNotification::from))
    }

    async fn find_all(&self) -> Result<Vec<SmsNotification>, PortError> {
        let rows = sqlx::query_as::<_, SmsNotificationRow>(&format!(
            "SELECT {COLUMNS} FROM sms_notification ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(rows.into_iter().map(SmsNotification::from).collect())
    }

    async fn delete_by_id(&self, id: SmsNotificationId) -> Result<bool, PortError> {
        let result = sqlx::query("DELETE FROM sms_notification WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(result.rows_affected() > 0)
    }
}

fn show_id(id: Option<SmsNotificationId>) -> String {
    id.map_or_else(|| "new".to_string(), |id| id.to_string())
}
