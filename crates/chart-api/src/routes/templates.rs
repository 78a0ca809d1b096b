//! # Template API
//!
//! Routes:
//! - POST   /v1/templates: Create a template
//! - GET    /v1/templates: List templates
//! - GET    /v1/templates/{id}: Get a template
//! - PUT    /v1/templates/{id}: Replace a template's rules
//! - DELETE /v1/templates/{id}: Delete a template

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chart_core::{RequiredKeySpec, TemplateId};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::row_written;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, validate_title, Validate};
use crate::state::{default_iterated_key, AppState, TemplateRecord};

/// Body for creating or replacing a template.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRequest {
    pub title: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub one_time_data: RequiredKeySpec,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub iterated_data: RequiredKeySpec,
    /// List field `iteratedData` applies to. Defaults to `items`.
    #[serde(default = "default_iterated_key")]
    pub iterated_key: String,
}

impl Validate for TemplateRequest {
    fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        if self.iterated_key.trim().is_empty() {
            return Err("iteratedKey must not be empty".to_string());
        }
        Ok(())
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/templates", get(list_templates).post(create_template))
        .route(
            "/v1/templates/{id}",
            get(get_template).put(update_template).delete(delete_template),
        )
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("template {id} not found"))
}

/// Parse a path segment as a template id; a malformed id is a 422.
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    let id: TemplateId = raw.parse()?;
    Ok(*id.as_uuid())
}

/// POST /v1/templates: Create a template.
#[utoipa::path(
    post,
    path = "/v1/templates",
    request_body = TemplateRequest,
    responses(
        (status = 201, description = "Template created", body = TemplateRecord),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "templates"
)]
pub(crate) async fn create_template(
    State(state): State<AppState>,
    body: Result<Json<TemplateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TemplateRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let now = Utc::now();
    let record = TemplateRecord {
        id: Uuid::new_v4(),
        title: req.title,
        one_time_data: req.one_time_data,
        iterated_data: req.iterated_data,
        iterated_key: req.iterated_key,
        created_at: now,
        updated_at: now,
    };

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::templates::insert(pool, &record).await {
            tracing::error!(template_id = %record.id, error = %e, "failed to persist template");
            return Err(AppError::Internal("template persist failed".to_string()));
        }
    }
    state.templates.insert(record.id, record.clone());
    tracing::info!(template_id = %record.id, "template created");

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /v1/templates: List templates, oldest first.
#[utoipa::path(
    get,
    path = "/v1/templates",
    responses(
        (status = 200, description = "All templates", body = Vec<TemplateRecord>),
    ),
    tag = "templates"
)]
pub(crate) async fn list_templates(State(state): State<AppState>) -> Json<Vec<TemplateRecord>> {
    let mut templates = state.templates.list();
    templates.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
    Json(templates)
}

/// GET /v1/templates/{id}: Get a template.
#[utoipa::path(
    get,
    path = "/v1/templates/{id}",
    params(("id" = Uuid, Path, description = "Template ID")),
    responses(
        (status = 200, description = "Template found", body = TemplateRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 422, description = "Malformed template id", body = crate::error::ErrorBody),
    ),
    tag = "templates"
)]
pub(crate) async fn get_template(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<TemplateRecord>, AppError> {
    let id = parse_id(&raw)?;
    state.templates.get(&id).map(Json).ok_or_else(|| not_found(id))
}

/// PUT /v1/templates/{id}: Replace a template's title and rules.
///
/// Stored datasets are not re-checked; the new rules apply to later writes.
#[utoipa::path(
    put,
    path = "/v1/templates/{id}",
    params(("id" = Uuid, Path, description = "Template ID")),
    request_body = TemplateRequest,
    responses(
        (status = 200, description = "Template updated", body = TemplateRecord),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "templates"
)]
pub(crate) async fn update_template(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    body: Result<Json<TemplateRequest>, JsonRejection>,
) -> Result<Json<TemplateRecord>, AppError> {
    let id = parse_id(&raw)?;
    let req = extract_validated_json(body)?;
    let existing = state.templates.get(&id).ok_or_else(|| not_found(id))?;
    let record = TemplateRecord {
        title: req.title,
        one_time_data: req.one_time_data,
        iterated_data: req.iterated_data,
        iterated_key: req.iterated_key,
        updated_at: Utc::now(),
        ..existing
    };

    if let Some(pool) = &state.db_pool {
        row_written(crate::db::templates::update(pool, &record).await, "template", id)?;
    }
    state.templates.insert(id, record.clone());
    tracing::info!(template_id = %id, "template updated");

    Ok(Json(record))
}

/// DELETE /v1/templates/{id}: Delete a template.
///
/// Datasets that name it keep their stored data but fail their next write.
#[utoipa::path(
    delete,
    path = "/v1/templates/{id}",
    params(("id" = Uuid, Path, description = "Template ID")),
    responses(
        (status = 204, description = "Template deleted"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 422, description = "Malformed template id", body = crate::error::ErrorBody),
    ),
    tag = "templates"
)]
pub(crate) async fn delete_template(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&raw)?;
    if !state.templates.contains(&id) {
        return Err(not_found(id));
    }
    if let Some(pool) = &state.db_pool {
        row_written(crate::db::templates::delete(pool, id).await, "template", id)?;
    }
    state.templates.remove(&id);
    tracing::info!(template_id = %id, "template deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, iterated_key: &str) -> TemplateRequest {
        TemplateRequest {
            title: title.to_string(),
            one_time_data: RequiredKeySpec::default(),
            iterated_data: RequiredKeySpec::default(),
            iterated_key: iterated_key.to_string(),
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request("Sales", "items").validate().is_ok());
    }

    #[test]
    fn blank_title_rejected() {
        let err = request("  ", "items").validate().unwrap_err();
        assert!(err.contains("title"));
    }

    #[test]
    fn blank_iterated_key_rejected() {
        let err = request("Sales", "").validate().unwrap_err();
        assert!(err.contains("iteratedKey"));
    }

    #[test]
    fn request_defaults_missing_fields() {
        let req: TemplateRequest = serde_json::from_value(serde_json::json!({
            "title": "Bare"
        }))
        .unwrap();
        assert!(req.one_time_data.is_empty());
        assert_eq!(req.iterated_key, "items");
    }

    #[test]
    fn path_id_parses_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn malformed_path_id_is_validation_error() {
        match parse_id("not-a-uuid") {
            Err(AppError::Validation(msg)) => assert!(msg.contains("not-a-uuid")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
