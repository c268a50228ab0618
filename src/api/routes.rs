//! API Routes
//!
//! Configures the Axum router with all relay endpoints.

use axum::{
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{get_message_handler, health_handler, send_message_handler, AppState};
use crate::error::{RelayError, Result, INTERNAL_ERROR};
use crate::models::ErrorResponse;

/// Creates the main router with all endpoints configured, allowing any origin.
///
/// # Endpoints
/// - `POST /api/trigger-message` - Store and broadcast a message
/// - `GET /api/messages/:id` - Look up a stored message
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Catch panic: unexpected handler panics become a generic 500
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    build_router(state, cors_layer(None))
}

/// Like [`create_router`], restricting CORS to `allowed_origin` when given.
pub fn create_router_with_cors(state: AppState, allowed_origin: Option<&str>) -> Result<Router> {
    let cors = match allowed_origin {
        Some(origin) => {
            let origin = origin.parse::<HeaderValue>().map_err(|_| {
                RelayError::Validation(format!("Invalid CORS origin: {}", origin))
            })?;
            cors_layer(Some(origin))
        }
        None => cors_layer(None),
    };
    Ok(build_router(state, cors))
}

fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/api/trigger-message", post(send_message_handler))
        .route("/api/messages/:id", get(get_message_handler))
        .route("/health", get(health_handler))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: Option<HeaderValue>) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE];
    match origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers([axum::http::header::CONTENT_TYPE])
            .allow_credentials(true),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any),
    }
}

fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("Unhandled error: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(INTERNAL_ERROR)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::LocalChannel;
    use crate::clock::SystemClock;
    use crate::store::MessageStore;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let store = MessageStore::new(Duration::from_secs(300), Arc::new(SystemClock));
        let state = AppState::new(store, Arc::new(LocalChannel::new("my-channel")));
        create_router(state)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_send_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/trigger-message")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"message":"hello","id":"abc123"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/messages/zzz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_panicking_handler_becomes_500() {
        async fn boom() -> &'static str {
            panic!("handler exploded")
        }

        let app: Router = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(handle_panic));

        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_invalid_cors_origin_rejected() {
        let store = MessageStore::new(Duration::from_secs(300), Arc::new(SystemClock));
        let state = AppState::new(store, Arc::new(LocalChannel::new("my-channel")));
        assert!(create_router_with_cors(state, Some("bad\norigin")).is_err());
    }
}
