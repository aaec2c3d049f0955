//! Request correlation
//!
//! Every request runs inside an `http_request` span carrying a request id.
//! An incoming `x-request-id` header is reused; otherwise a UUID v4 is
//! generated. The id is echoed back on the response.

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, info_span};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id that handlers can pull from request extensions
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = info_span!(
        "http_request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Extension, Router,
        body::Body,
        http::{Request, StatusCode},
        middleware::from_fn,
        routing::get,
    };
    use tower::ServiceExt;

    async fn test_handler() -> &'static str {
        "ok"
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(test_handler))
            .layer(from_fn(request_id_middleware))
    }

    #[tokio::test]
    async fn test_request_id_generation() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let request_id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
        assert!(Uuid::parse_str(request_id).is_ok());
    }

    #[tokio::test]
    async fn test_request_id_propagation() {
        let request = Request::builder()
            .uri("/")
            .header(REQUEST_ID_HEADER, "req-12345")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-12345");
    }

    #[tokio::test]
    async fn test_request_id_in_extensions() {
        async fn echo(Extension(request_id): Extension<RequestId>) -> String {
            request_id.as_str().to_string()
        }

        let app = Router::new()
            .route("/", get(echo))
            .layer(from_fn(request_id_middleware));

        let request = Request::builder()
            .uri("/")
            .header(REQUEST_ID_HEADER, "from-client")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"from-client");
    }
}
