//! Request ids and request tracing.
//!
//! # Flow
//!
//! 1. **Assign** an `x-request-id` (kept if the client sent one, else UUID v4)
//! 2. **Trace** the request in an `http_request` span carrying that id
//! 3. **Propagate** the id to the response header
//!
//! # Example
//!
//! ```ignore
//! use canteen_web::middleware::with_observability;
//!
//! let app = with_observability(Router::new().route("/health", get(health_check)));
//! ```

use axum::{
    Router,
    body::Body,
    http::{HeaderName, HeaderValue, Request},
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Span;
use uuid::Uuid;

/// Header name for request ids.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Generates UUID v4 request ids.
#[derive(Clone, Copy, Debug, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    // Path only: query strings carry checkout references.
    tracing::info_span!(
        "http_request",
        request_id,
        method = %request.method(),
        path = %request.uri().path(),
    )
}

/// Wrap `router` with request-id assignment, tracing and propagation.
pub fn with_observability<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let header = HeaderName::from_static(REQUEST_ID_HEADER);
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(header.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(PropagateRequestIdLayer::new(header)),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::routing::get;
    use tower::ServiceExt;

    fn app() -> Router {
        with_observability(Router::new().route("/test", get(|| async { "ok" })))
    }

    #[tokio::test]
    async fn test_request_id_generated_if_missing() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = app().oneshot(request).await.unwrap();

        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .expect("Request id header should be present");
        assert!(Uuid::parse_str(request_id.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_request_id_preserved_from_request() {
        let request = Request::builder()
            .uri("/test")
            .header(REQUEST_ID_HEADER, "client-chosen-id")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            "client-chosen-id"
        );
    }
}
