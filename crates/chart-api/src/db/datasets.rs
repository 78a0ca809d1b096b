//! Dataset persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `datasets` table.
//! Only reconciled documents are ever written here.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{from_json, to_json};
use crate::state::DatasetRecord;

/// Insert a new dataset record.
pub async fn insert(pool: &PgPool, record: &DatasetRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO datasets (id, title, parent_templates, data, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(record.id)
    .bind(&record.title)
    .bind(&record.parent_templates)
    .bind(to_json(&record.data)?)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Replace the mutable fields of a dataset. Returns `false` if no row matched.
pub async fn update(pool: &PgPool, record: &DatasetRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE datasets SET title = $1, parent_templates = $2, data = $3, updated_at = $4
         WHERE id = $5",
    )
    .bind(&record.title)
    .bind(&record.parent_templates)
    .bind(to_json(&record.data)?)
    .bind(record.updated_at)
    .bind(record.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a dataset. Returns `false` if no row matched.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM datasets WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all datasets into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<DatasetRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DatasetRow>(
        "SELECT id, title, parent_templates, data, created_at, updated_at
         FROM datasets ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(DatasetRow::into_record).collect()
}

#[derive(sqlx::FromRow)]
struct DatasetRow {
    id: Uuid,
    title: String,
    parent_templates: Vec<Uuid>,
    data: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DatasetRow {
    fn into_record(self) -> Result<DatasetRecord, sqlx::Error> {
        let id = self.id;
        let data = from_json(self.data).map_err(|e| {
            tracing::error!(%id, error = %e, "stored dataset has unreadable data");
            e
        })?;
        Ok(DatasetRecord {
            id,
            title: self.title,
            parent_templates: self.parent_templates,
            data,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
