//! Template persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `templates` table.
//! Required-key specs are stored as JSONB in their wire format.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{from_json, to_json};
use crate::state::TemplateRecord;

/// Insert a new template record.
pub async fn insert(pool: &PgPool, record: &TemplateRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO templates (id, title, one_time_data, iterated_data, iterated_key, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(record.id)
    .bind(&record.title)
    .bind(to_json(&record.one_time_data)?)
    .bind(to_json(&record.iterated_data)?)
    .bind(&record.iterated_key)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Replace the mutable fields of a template. Returns `false` if no row matched.
pub async fn update(pool: &PgPool, record: &TemplateRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE templates
         SET title = $1, one_time_data = $2, iterated_data = $3, iterated_key = $4, updated_at = $5
         WHERE id = $6",
    )
    .bind(&record.title)
    .bind(to_json(&record.one_time_data)?)
    .bind(to_json(&record.iterated_data)?)
    .bind(&record.iterated_key)
    .bind(record.updated_at)
    .bind(record.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a template. Returns `false` if no row matched.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM templates WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all templates into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<TemplateRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TemplateRow>(
        "SELECT id, title, one_time_data, iterated_data, iterated_key, created_at, updated_at
         FROM templates ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(TemplateRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct TemplateRow {
    id: Uuid,
    title: String,
    one_time_data: serde_json::Value,
    iterated_data: serde_json::Value,
    iterated_key: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TemplateRow {
    fn into_record(self) -> Result<TemplateRecord, sqlx::Error> {
        let id = self.id;
        let one_time_data = from_json(self.one_time_data).map_err(|e| {
            tracing::error!(%id, error = %e, "stored template has unreadable oneTimeData");
            e
        })?;
        let iterated_data = from_json(self.iterated_data).map_err(|e| {
            tracing::error!(%id, error = %e, "stored template has unreadable iteratedData");
            e
        })?;
        Ok(TemplateRecord {
            id: self.id,
            title: self.title,
            one_time_data,
            iterated_data,
            iterated_key: self.iterated_key,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
