//! # Request Metrics
//!
//! Counts requests and error responses through the `metrics` facade. The
//! binary installs a Prometheus recorder, which exports them at `/metrics`.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

pub const HTTP_REQUESTS_TOTAL: &str = "chart_http_requests_total";
pub const HTTP_ERRORS_TOTAL: &str = "chart_http_errors_total";

/// Middleware that increments request and error counters.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();

    let response = next.run(request).await;
    let status = response.status();

    metrics::counter!(HTTP_REQUESTS_TOTAL, "method" => method.clone()).increment(1);
    if status.is_client_error() || status.is_server_error() {
        metrics::counter!(HTTP_ERRORS_TOTAL, "method" => method, "status" => status.as_u16().to_string())
            .increment(1);
    }

    response
}
