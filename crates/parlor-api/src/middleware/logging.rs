use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use std::time::Instant;
use uuid::Uuid;

/// Request logging middleware
///
/// Tags every request with a generated id, logs method/uri/status/latency
/// and echoes the id back as `x-request-id` so log lines can be matched
/// to client reports.
pub async fn log_request(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    // Process request
    let mut response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        "Request processed"
    );

    if let Ok(header) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert("x-request-id", header);
    }

    response
}
