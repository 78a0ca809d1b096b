//! # Dataset API
//!
//! Every write runs the compliance engine against the declared parent
//! templates. Only the reconciled document is stored; a non-compliant
//! dataset is rejected with the full violation report.
//!
//! Routes:
//! - POST   /v1/datasets: Create a dataset
//! - GET    /v1/datasets: List datasets, optionally by template
//! - GET    /v1/datasets/{id}: Get a dataset
//! - PUT    /v1/datasets/{id}: Replace a dataset
//! - DELETE /v1/datasets/{id}: Delete a dataset

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chart_core::{DatasetId, DocumentValue, ValueKind};
use chrono::Utc;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::row_written;
use crate::compliance;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, validate_title, Validate};
use crate::state::{AppState, DatasetRecord};

/// Most parent templates a single dataset may declare.
pub const MAX_PARENT_TEMPLATES: usize = 64;

/// Body for creating or replacing a dataset.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRequest {
    pub title: String,
    /// Templates to comply with. Earlier entries win conflicting defaults.
    #[serde(default)]
    pub parent_templates: Vec<Uuid>,
    #[serde(default = "DocumentValue::object")]
    #[schema(value_type = Object)]
    pub data: DocumentValue,
}

impl Validate for DatasetRequest {
    fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        if self.data.kind() != ValueKind::Object {
            return Err(format!("data must be an object, found {}", self.data.kind()));
        }
        if self.parent_templates.len() > MAX_PARENT_TEMPLATES {
            return Err(format!(
                "at most {MAX_PARENT_TEMPLATES} parent templates are allowed"
            ));
        }
        Ok(())
    }
}

/// Query parameters for listing datasets.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DatasetFilter {
    /// Only datasets declaring this template.
    pub template: Option<Uuid>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/datasets", get(list_datasets).post(create_dataset))
        .route(
            "/v1/datasets/{id}",
            get(get_dataset).put(update_dataset).delete(delete_dataset),
        )
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("dataset {id} not found"))
}

/// Parse a path segment as a dataset id; a malformed id is a 422.
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    let id: DatasetId = raw.parse()?;
    Ok(*id.as_uuid())
}

/// POST /v1/datasets: Create a dataset.
#[utoipa::path(
    post,
    path = "/v1/datasets",
    request_body = DatasetRequest,
    responses(
        (status = 201, description = "Dataset created with reconciled data", body = DatasetRecord),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error or non-compliant data", body = crate::error::ErrorBody),
    ),
    tag = "datasets"
)]
pub(crate) async fn create_dataset(
    State(state): State<AppState>,
    body: Result<Json<DatasetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DatasetRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let id = Uuid::new_v4();
    let data = compliance::enforce(&state.templates, req.data, &req.parent_templates)
        .map_err(|err| {
            tracing::info!(dataset_id = %id, error = %err, "dataset create rejected");
            err
        })?;

    let now = Utc::now();
    let record = DatasetRecord {
        id,
        title: req.title,
        parent_templates: req.parent_templates,
        data,
        created_at: now,
        updated_at: now,
    };

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::datasets::insert(pool, &record).await {
            tracing::error!(dataset_id = %id, error = %e, "failed to persist dataset");
            return Err(AppError::Internal("dataset persist failed".to_string()));
        }
    }
    state.datasets.insert(id, record.clone());
    tracing::info!(
        dataset_id = %id,
        templates = record.parent_templates.len(),
        "dataset created"
    );

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /v1/datasets: List datasets, oldest first.
#[utoipa::path(
    get,
    path = "/v1/datasets",
    params(DatasetFilter),
    responses(
        (status = 200, description = "Matching datasets", body = Vec<DatasetRecord>),
    ),
    tag = "datasets"
)]
pub(crate) async fn list_datasets(
    State(state): State<AppState>,
    Query(filter): Query<DatasetFilter>,
) -> Json<Vec<DatasetRecord>> {
    let mut datasets: Vec<DatasetRecord> = state
        .datasets
        .list()
        .into_iter()
        .filter(|d| filter.template.map_or(true, |t| d.declares(&t)))
        .collect();
    datasets.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
    Json(datasets)
}

/// GET /v1/datasets/{id}: Get a dataset.
#[utoipa::path(
    get,
    path = "/v1/datasets/{id}",
    params(("id" = Uuid, Path, description = "Dataset ID")),
    responses(
        (status = 200, description = "Dataset found", body = DatasetRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 422, description = "Malformed dataset id", body = crate::error::ErrorBody),
    ),
    tag = "datasets"
)]
pub(crate) async fn get_dataset(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<DatasetRecord>, AppError> {
    let id = parse_id(&raw)?;
    state.datasets.get(&id).map(Json).ok_or_else(|| not_found(id))
}

/// PUT /v1/datasets/{id}: Replace a dataset and re-run compliance.
#[utoipa::path(
    put,
    path = "/v1/datasets/{id}",
    params(("id" = Uuid, Path, description = "Dataset ID")),
    request_body = DatasetRequest,
    responses(
        (status = 200, description = "Dataset updated with reconciled data", body = DatasetRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error or non-compliant data", body = crate::error::ErrorBody),
    ),
    tag = "datasets"
)]
pub(crate) async fn update_dataset(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    body: Result<Json<DatasetRequest>, JsonRejection>,
) -> Result<Json<DatasetRecord>, AppError> {
    let id = parse_id(&raw)?;
    let req = extract_validated_json(body)?;
    let existing = state.datasets.get(&id).ok_or_else(|| not_found(id))?;
    let data = compliance::enforce(&state.templates, req.data, &req.parent_templates)
        .map_err(|err| {
            tracing::info!(dataset_id = %id, error = %err, "dataset update rejected");
            err
        })?;

    let record = DatasetRecord {
        title: req.title,
        parent_templates: req.parent_templates,
        data,
        updated_at: Utc::now(),
        ..existing
    };

    if let Some(pool) = &state.db_pool {
        row_written(crate::db::datasets::update(pool, &record).await, "dataset", id)?;
    }
    state.datasets.insert(id, record.clone());
    tracing::info!(dataset_id = %id, "dataset updated");

    Ok(Json(record))
}

/// DELETE /v1/datasets/{id}: Delete a dataset.
#[utoipa::path(
    delete,
    path = "/v1/datasets/{id}",
    params(("id" = Uuid, Path, description = "Dataset ID")),
    responses(
        (status = 204, description = "Dataset deleted"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 422, description = "Malformed dataset id", body = crate::error::ErrorBody),
    ),
    tag = "datasets"
)]
pub(crate) async fn delete_dataset(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&raw)?;
    if !state.datasets.contains(&id) {
        return Err(not_found(id));
    }
    if let Some(pool) = &state.db_pool {
        row_written(crate::db::datasets::delete(pool, id).await, "dataset", id)?;
    }
    state.datasets.remove(&id);
    tracing::info!(dataset_id = %id, "dataset deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> DatasetRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn object_data_passes() {
        let req = request(json!({"title": "Q1", "data": {"x": 1}}));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn absent_data_is_empty_object() {
        let req = request(json!({"title": "Q1"}));
        assert_eq!(req.data, DocumentValue::object());
        assert!(req.parent_templates.is_empty());
    }

    #[test]
    fn non_object_data_rejected() {
        let err = request(json!({"title": "Q1", "data": [1, 2]}))
            .validate()
            .unwrap_err();
        assert_eq!(err, "data must be an object, found array");
    }

    #[test]
    fn too_many_parents_rejected() {
        let parents: Vec<Uuid> = (0..=MAX_PARENT_TEMPLATES).map(|_| Uuid::new_v4()).collect();
        let err = request(json!({"title": "Q1", "parentTemplates": parents}))
            .validate()
            .unwrap_err();
        assert!(err.contains("64"));
    }
}
