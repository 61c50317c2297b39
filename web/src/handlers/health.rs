//! Health check endpoint for load balancers.

use axum::http::StatusCode;

/// Liveness: 200 OK while the process serves requests.
///
/// Does not check the database or the key-value store.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}
