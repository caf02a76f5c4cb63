//! Request trace logging.

use std::time::Instant;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

pub static X_TRACE_ID: &str = "x-trace-id";

/// Tag each request with a trace id (reusing a valid incoming one) and log
/// one line when it starts and one when it finishes.
pub async fn trace_middleware(mut req: Request, next: Next) -> Response {
    let started = Instant::now();
    let trace_id = req
        .headers()
        .get(X_TRACE_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    log::info!(target: "http", "[{trace_id}] -> {method} {path}");
    let header = HeaderValue::from_str(&trace_id.to_string()).ok();
    if let Some(value) = header.clone() {
        req.headers_mut().insert(X_TRACE_ID, value);
    }

    let mut response = next.run(req).await;
    if let Some(value) = header {
        response.headers_mut().insert(X_TRACE_ID, value);
    }

    log::info!(
        target: "http",
        "[{trace_id}] <- {method} {path} {} in {}ms",
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}
