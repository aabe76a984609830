// ABOUTME: Request tracing middleware for correlation and structured logging
// ABOUTME: Assigns a request ID, opens an http_request span, and echoes the ID back

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use http::HeaderValue;
use tracing::{debug, Instrument, Span};
use uuid::Uuid;

/// Header carrying the correlation ID in both directions
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Create a tracing span for HTTP requests
pub fn create_request_span(method: &str, path: &str, request_id: &str) -> Span {
    tracing::info_span!(
        "http_request",
        method = %method,
        path = %path,
        request_id = %request_id,
        status_code = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    )
}

/// Wrap every request in an `http_request` span
///
/// A client-supplied `x-request-id` is reused; otherwise one is generated.
/// The span closes when the response head is ready, so a streaming body
/// outlives it.
pub async fn request_tracing(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| format!("req_{}", Uuid::new_v4().simple()), str::to_owned);

    let span = create_request_span(
        request.method().as_str(),
        request.uri().path(),
        &request_id,
    );
    let header_value = HeaderValue::from_str(&request_id).ok();
    if let Some(value) = &header_value {
        request.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    let started = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;

    let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    span.record("status_code", response.status().as_u16());
    span.record("duration_ms", elapsed);
    span.in_scope(|| {
        debug!(
            status = response.status().as_u16(),
            duration_ms = elapsed,
            "request handled"
        );
    });

    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
