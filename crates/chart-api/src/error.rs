//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from chart-core and chart-compliance to HTTP status
//! codes with a JSON body carrying an error code, message and optional
//! details. Internal error details are never exposed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chart_compliance::{ComplianceReport, ResolveError, Violation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "NON_COMPLIANT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for some client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// A declared parent template does not exist (422).
    #[error("validation error: {}", .0.detail)]
    UnknownTemplate(Violation),

    /// The dataset violates its parent templates (422).
    #[error("dataset does not comply with its parent templates ({} violations)", .0.violation_count())]
    NonCompliant(ComplianceReport),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A dependency of the service is unavailable (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) | Self::UnknownTemplate(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
            }
            Self::NonCompliant(_) => (StatusCode::UNPROCESSABLE_ENTITY, "NON_COMPLIANT"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::UnknownTemplate(violation) => serde_json::to_value(violation).ok(),
            Self::NonCompliant(report) => Some(serde_json::json!({
                "report": report,
                "text": report.render(),
            })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<chart_core::ValidationError> for AppError {
    fn from(err: chart_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err.violation() {
            Some(violation) => Self::UnknownTemplate(violation),
            None => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_compliance::KeyPath;
    use chart_core::{RequiredKeySpec, Template, TemplateId};

    fn sample_report() -> ComplianceReport {
        let template = Template::one_time(TemplateId::new(), "Sales", RequiredKeySpec::default());
        ComplianceReport::from_violations(vec![Violation::missing_key(
            &template,
            KeyPath::root().key("region"),
        )])
    }

    #[test]
    fn status_codes_match_variants() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                AppError::Validation("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
            ),
            (
                AppError::NonCompliant(sample_report()),
                StatusCode::UNPROCESSABLE_ENTITY,
                "NON_COMPLIANT",
            ),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (
                AppError::ServiceUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
            ),
            (
                AppError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code), "{err:?}");
        }
    }

    #[test]
    fn error_body_omits_absent_details() {
        let body = ErrorBody {
            error: ErrorDetail {
                code: "TEST".to_string(),
                message: "test message".to_string(),
                details: None,
            },
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("test message"));
        assert!(!json.contains("details"));
    }

    #[test]
    fn unknown_template_resolves_to_validation_error() {
        let id = TemplateId::new();
        let err = AppError::from(ResolveError::TemplateNotFound(id));
        assert!(matches!(err, AppError::UnknownTemplate(_)));
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn backend_resolve_failure_is_internal() {
        let err = AppError::from(ResolveError::Backend("lock poisoned".into()));
        assert!(matches!(err, AppError::Internal(_)));
    }

    // ── into_response tests ──────────────────────────────────────

    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn into_response_not_found() {
        let (status, body) = response_parts(AppError::NotFound("dataset 123".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error.code, "NOT_FOUND");
        assert!(body.error.message.contains("dataset 123"));
        assert!(body.error.details.is_none());
    }

    #[tokio::test]
    async fn into_response_non_compliant_carries_report() {
        let (status, body) = response_parts(AppError::NonCompliant(sample_report())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error.code, "NON_COMPLIANT");
        let details = body.error.details.unwrap();
        assert_eq!(
            details["report"]["templates"][0]["violations"][0]["kind"],
            "MISSING_KEY"
        );
        assert!(details["text"]
            .as_str()
            .unwrap()
            .starts_with("region violation against template Sales"));
    }

    #[tokio::test]
    async fn into_response_unknown_template_carries_violation() {
        let id = TemplateId::new();
        let (status, body) =
            response_parts(AppError::from(ResolveError::TemplateNotFound(id))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error.code, "VALIDATION_ERROR");
        let details = body.error.details.unwrap();
        assert_eq!(details["kind"], "TEMPLATE_NOT_FOUND");
        assert_eq!(details["templateId"], id.to_string());
    }

    #[tokio::test]
    async fn into_response_internal_hides_details() {
        let (status, body) =
            response_parts(AppError::Internal("db connection failed".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert_eq!(body.error.message, "An internal error occurred");
        assert!(body.error.details.is_none());
    }
}
