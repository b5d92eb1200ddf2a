//! Sensor reading repository
//!
//! Readings own their many-to-many link to temperature sensors. The link
//! rows in `values_temperatures` are rewritten together with the reading
//! inside one transaction, so a reading is never visible with a partial set
//! of sensors.
//!
//! The table is named `values`, a reserved word, and is always quoted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

use core_kernel::{DomainPort, Entity, EntityPort, EntityRef, PortError, TemperatureId, ValuesId};
use domain_devices::Values;

use super::save_error;
use crate::error::DatabaseError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ValuesRow {
    pub id: i64,
    pub value: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct LinkRow {
    values_id: i64,
    temperatures_id: i64,
}

impl ValuesRow {
    fn into_entity(self, temperatures: BTreeSet<EntityRef<TemperatureId>>) -> Values {
        Values {
            id: Some(ValuesId::new(self.id)),
            value: self.value,
            timestamp: self.timestamp,
            temperatures,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgValuesRepository {
    pool: PgPool,
}

impl PgValuesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write(&self, entity: &Values) -> Result<Values, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let row = match entity.id {
            Some(id) => sqlx::query_as::<_, ValuesRow>(
                r#"UPDATE "values" SET value = $2, timestamp = $3 WHERE id = $1 RETURNING id, value, timestamp"#,
            )
            .bind(id.value())
            .bind(entity.value)
            .bind(entity.timestamp)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::not_found(Values::ENTITY_NAME, id))?,
            None => {
                sqlx::query_as::<_, ValuesRow>(
                    r#"INSERT INTO "values" (value, timestamp) VALUES ($1, $2) RETURNING id, value, timestamp"#,
                )
                .bind(entity.value)
                .bind(entity.timestamp)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        replace_links(&mut tx, row.id, entity).await?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        Ok(row.into_entity(entity.temperatures.clone()))
    }

    async fn links_for(&self, ids: &[i64]) -> Result<BTreeMap<i64, BTreeSet<EntityRef<TemperatureId>>>, DatabaseError> {
        let rows = sqlx::query_as::<_, LinkRow>(
            "SELECT values_id, temperatures_id FROM values_temperatures WHERE values_id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut links: BTreeMap<i64, BTreeSet<EntityRef<TemperatureId>>> = BTreeMap::new();
        for link in rows {
            links
                .entry(link.values_id)
                .or_default()
                .insert(EntityRef::new(TemperatureId::new(link.temperatures_id)));
        }
        Ok(links)
    }

    async fn attach_links(&self, rows: Vec<ValuesRow>) -> Result<Vec<Values>, DatabaseError> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut links = self.links_for(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let temperatures = links.remove(&row.id).unwrap_or_default();
                row.into_entity(temperatures)
            })
            .collect())
    }
}

async fn replace_links(
    tx: &mut Transaction<'_, Postgres>,
    values_id: i64,
    entity: &Values,
) -> Result<(), DatabaseError> {
    sqlx::query("DELETE FROM values_temperatures WHERE values_id = $1")
        .bind(values_id)
        .execute(&mut **tx)
        .await?;

    let temperature_ids: Vec<i64> = entity.temperature_ids().map(|id| id.value()).collect();
    if !temperature_ids.is_empty() {
        sqlx::query(
            "INSERT INTO values_temperatures (values_id, temperatures_id) \
             SELECT $1, unnest($2::bigint[])",
        )
        .bind(values_id)
        .bind(&temperature_ids)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

impl DomainPort for PgValuesRepository {}

#[async_trait]
impl EntityPort<Values> for PgValuesRepository {
    #[instrument(skip_all, fields(id = ?entity.id, links = entity.temperatures.len()))]
    async fn save(&self, entity: Values) -> Result<Values, PortError> {
        let saved = self
            .write(&entity)
            .await
            .map_err(|e| save_error::<Values>(e, entity.id))?;
        debug!(id = ?saved.id, "Saved values");
        Ok(saved)
    }

    async fn find_by_id(&self, id: ValuesId) -> Result<Option<Values>, PortError> {
        let row = sqlx::query_as::<_, ValuesRow>(
            r#"SELECT id, value, timestamp FROM "values" WHERE id = $1"#,
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        match row {
            Some(row) => Ok(self.attach_links(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<Values>, PortError> {
        let rows = sqlx::query_as::<_, ValuesRow>(
            r#"SELECT id, value, timestamp FROM "values" ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(self.attach_links(rows).await?)
    }

    /// Link rows go with the reading through `ON DELETE CASCADE`
    async fn delete_by_id(&self, id: ValuesId) -> Result<bool, PortError> {
        let result = sqlx::query(r#"DELETE FROM "values" WHERE id = $1"#)
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
