//! # Compliance Dry Run
//!
//! Routes:
//! - POST /v1/compliance/check: Check data against templates without storing it

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chart_compliance::{ComplianceReport, Outcome};
use chart_core::{DocumentValue, ValueKind};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::compliance;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::datasets::MAX_PARENT_TEMPLATES;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    #[serde(default = "DocumentValue::object")]
    #[schema(value_type = Object)]
    pub data: DocumentValue,
    #[serde(default)]
    pub parent_templates: Vec<Uuid>,
}

impl Validate for CheckRequest {
    fn validate(&self) -> Result<(), String> {
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

/// Result of a dry run. Exactly one of `data` and `report` is present.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub compliant: bool,
    /// The reconciled document, when compliant.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<DocumentValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub report: Option<ComplianceReport>,
    /// `report` rendered as plain text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_text: Option<String>,
}

impl From<Outcome> for CheckResponse {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Compliant(data) => Self {
                compliant: true,
                data: Some(data),
                report: None,
                report_text: None,
            },
            Outcome::NonCompliant(report) => Self {
                compliant: false,
                data: None,
                report_text: Some(report.render()),
                report: Some(report),
            },
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/compliance/check", post(check_compliance))
}

/// POST /v1/compliance/check: Evaluate data against templates.
///
/// A non-compliant document is a normal 200 response here; unknown
/// templates still fail with 422.
#[utoipa::path(
    post,
    path = "/v1/compliance/check",
    request_body = CheckRequest,
    responses(
        (status = 200, description = "Evaluation result", body = CheckResponse),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error or unknown template", body = crate::error::ErrorBody),
    ),
    tag = "compliance"
)]
pub(crate) async fn check_compliance(
    State(state): State<AppState>,
    body: Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Json<CheckResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let outcome = compliance::dry_run(&state.templates, req.data, &req.parent_templates)?;
    Ok(Json(CheckResponse::from(outcome)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_compliance::{KeyPath, Violation};
    use chart_core::{RequiredKeySpec, Template, TemplateId};

    #[test]
    fn compliant_outcome_carries_data_only() {
        let json = serde_json::to_value(CheckResponse::from(Outcome::Compliant(
            DocumentValue::object(),
        )))
        .unwrap();
        assert_eq!(json, serde_json::json!({"compliant": true, "data": {}}));
    }

    #[test]
    fn non_compliant_outcome_carries_report_and_text() {
        let template = Template::one_time(TemplateId::new(), "T", RequiredKeySpec::default());
        let report = ComplianceReport::from_violations(vec![Violation::missing_key(
            &template,
            KeyPath::root().key("x"),
        )]);
        let json = serde_json::to_value(CheckResponse::from(Outcome::NonCompliant(report))).unwrap();
        assert_eq!(json["compliant"], false);
        assert!(json.get("data").is_none());
        assert!(json["reportText"].as_str().unwrap().starts_with("x violation"));
        assert_eq!(json["report"]["templates"][0]["violations"][0]["keyPath"], "x");
    }

    #[test]
    fn scalar_data_rejected() {
        let req: CheckRequest = serde_json::from_value(serde_json::json!({"data": 3})).unwrap();
        assert!(req.validate().is_err());
    }
}
