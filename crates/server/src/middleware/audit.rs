//! Audit logging for state-changing requests

use axum::{body::Body, extract::Request, http::Method, middleware::Next, response::Response};
use std::time::Instant;

use super::request_id::RequestId;

/// Log every POST (chat turns, bookings, account changes) under the `audit` target
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    if request.method() != Method::POST {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let start = Instant::now();
    let response = next.run(request).await;

    tracing::info!(
        target: "audit",
        request_id = %request_id,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "POST request"
    );

    response
}
