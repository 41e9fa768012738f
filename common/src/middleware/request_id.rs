//! Request ID middleware.
//!
//! Every request runs inside a `request` span carrying its ID, so the
//! discovery and query logs of one request can be told apart. The ID is
//! echoed in the `x-request-id` response header and in `meta.request_id`.

use axum::{
    body::Body,
    http::{header::HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Tags the request with the caller's `x-request-id`, or a fresh UUID when
/// the header is missing or empty.
pub async fn request_id_middleware(mut req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(RequestId(request_id.clone()));

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        uri = %req.uri(),
    );
    // The span must follow the handler future across awaits.
    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
    }
    response
}

/// Request ID, available to handlers as an `Extension`.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/",
                get(|Extension(id): Extension<RequestId>| async move { id.0 }),
            )
            .layer(middleware::from_fn(request_id_middleware))
    }

    #[tokio::test]
    async fn test_incoming_id_is_reused() {
        let req = Request::builder()
            .uri("/")
            .header("x-request-id", "req-7")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.headers()[&REQUEST_ID_HEADER], "req-7");
        let body = axum::body::to_bytes(response.into_body(), 64).await.unwrap();
        assert_eq!(&body[..], b"req-7");
    }

    #[tokio::test]
    async fn test_missing_or_empty_id_is_generated() {
        for req in [
            Request::builder().uri("/").body(Body::empty()).unwrap(),
            Request::builder()
                .uri("/")
                .header("x-request-id", "")
                .body(Body::empty())
                .unwrap(),
        ] {
            let response = app().oneshot(req).await.unwrap();
            let id = response.headers()[&REQUEST_ID_HEADER].to_str().unwrap();
            assert!(Uuid::parse_str(id).is_ok(), "{}", id);
        }
    }
}
