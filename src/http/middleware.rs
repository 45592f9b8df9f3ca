//! Axum middleware enforcing the admission gate.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::admission::{Limiter, Verdict};

use super::response::TooManyRequests;

/// Admit or reject a request based on the connection's remote address.
///
/// Attach with [`axum::middleware::from_fn_with_state`] to a router served
/// via `into_make_service_with_connect_info::<SocketAddr>()`, and start
/// reclamation once at setup:
///
/// ```ignore
/// let limiter = Arc::new(Limiter::new(Duration::from_secs(1))?);
/// limiter.start_reclamation();
///
/// let app = Router::new()
///     .route("/claim", post(claim_handler))
///     .layer(middleware::from_fn_with_state(limiter, require_admission));
/// ```
///
/// The remote address is the trust decision made here: it cannot be forged
/// without owning the connection. Integrators deriving identity from a
/// header such as `X-Forwarded-For` must supply their own extraction and
/// call [`Limiter::check_and_record`] directly.
pub async fn require_admission(
    State(limiter): State<Arc<Limiter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let client = addr.ip().to_string();

    match limiter.check_and_record(&client) {
        Verdict::Allow => next.run(request).await,
        Verdict::Reject => {
            warn!(client = %client, "rate limit exceeded");
            TooManyRequests.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::http::response::{ErrorBody, REJECTION_MESSAGE};

    fn test_app(limiter: Arc<Limiter>) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                limiter,
                require_admission,
            ))
    }

    fn request_from(ip: &str) -> HttpRequest<Body> {
        let addr: SocketAddr = format!("{ip}:54321").parse().unwrap();
        let mut request = HttpRequest::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    #[tokio::test]
    async fn test_first_request_passes_through() {
        let limiter = Arc::new(Limiter::new(Duration::from_secs(1)).unwrap());
        let app = test_app(limiter);

        let response = app.oneshot(request_from("10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_repeat_request_halted_with_error_body() {
        let limiter = Arc::new(Limiter::new(Duration::from_secs(60)).unwrap());
        let app = test_app(limiter);

        let response = app.clone().oneshot(request_from("10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(request_from("10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, REJECTION_MESSAGE);
    }

    #[tokio::test]
    async fn test_distinct_clients_do_not_interfere() {
        let limiter = Arc::new(Limiter::new(Duration::from_secs(60)).unwrap());
        let app = test_app(limiter);

        let response = app.clone().oneshot(request_from("10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(request_from("10.0.0.2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_same_ip_different_port_is_same_client() {
        let limiter = Arc::new(Limiter::new(Duration::from_secs(60)).unwrap());
        let app = test_app(limiter);

        let response = app.clone().oneshot(request_from("10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let addr: SocketAddr = "10.0.0.1:11111".parse().unwrap();
        let mut request = HttpRequest::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
