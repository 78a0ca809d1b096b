//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI document,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Chart Data API",
        version = "0.1.0",
        description = "Template and dataset storage. Every dataset write is checked against its parent templates.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Templates
        crate::routes::templates::create_template,
        crate::routes::templates::list_templates,
        crate::routes::templates::get_template,
        crate::routes::templates::update_template,
        crate::routes::templates::delete_template,
        // Datasets
        crate::routes::datasets::create_dataset,
        crate::routes::datasets::list_datasets,
        crate::routes::datasets::get_dataset,
        crate::routes::datasets::update_dataset,
        crate::routes::datasets::delete_dataset,
        // Compliance
        crate::routes::compliance::check_compliance,
    ),
    components(schemas(
        crate::state::TemplateRecord,
        crate::state::DatasetRecord,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::templates::TemplateRequest,
        crate::routes::datasets::DatasetRequest,
        crate::routes::compliance::CheckRequest,
        crate::routes::compliance::CheckResponse,
    )),
    tags(
        (name = "templates", description = "Required-key templates"),
        (name = "datasets", description = "Datasets with enforced template compliance"),
        (name = "compliance", description = "Compliance dry runs"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/v1/templates",
            "/v1/templates/{id}",
            "/v1/datasets",
            "/v1/datasets/{id}",
            "/v1/compliance/check",
        ] {
            assert!(paths.iter().any(|p| p.as_str() == expected), "{expected} missing");
        }
    }
}
