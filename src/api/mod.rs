//! # API Module
//!
//! HTTP surface of the service.
//!
//! ## Endpoints
//!
//! - `GET /`: service name, version and health path
//! - `GET /health`: liveness plus cache statistics
//! - `GET /api/v1/stream/{video_id}`: resolve a content ID into a playable audio URL
//!
//! Stream responses use the [`response::ApiResponse`] envelope; failures are
//! rendered through [`response::ApiError`].

pub mod health;
pub mod response;
pub mod stream;

use axum::{http::HeaderValue, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::resolver::ResolutionService;

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<ResolutionService>,
}

impl AppState {
    pub fn new(resolver: Arc<ResolutionService>) -> Self {
        Self { resolver }
    }
}

/// CORS policy from the configured origin list. `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|origin| origin == "*") {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("⚠️ Origen CORS inválido ignorado: {}", origin);
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(allowed))
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/api/v1/stream/{video_id}", get(stream::get_stream))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{StreamCache, StreamCacheConfig};
    use crate::models::Rendition;
    use crate::sources::{ExtractionError, FormatSelector, MockExtractor};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(extractor: MockExtractor) -> Router {
        let resolver = ResolutionService::new(
            StreamCache::new(StreamCacheConfig::default()),
            Arc::new(extractor),
            FormatSelector::default(),
            Duration::from_secs(30),
            Duration::from_secs(21600),
        );
        router(
            AppState::new(Arc::new(resolver)),
            cors_layer(&["*".to_string()]),
        )
    }

    fn idle_extractor() -> MockExtractor {
        let mut extractor = MockExtractor::new();
        extractor.expect_name().return_const("mock");
        extractor.expect_extract().never();
        extractor
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_root() {
        let (status, body) = get_json(app(idle_extractor()), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "YT Music API");
        assert_eq!(body["health"], "/health");
    }

    #[tokio::test]
    async fn test_health_reports_cache() {
        let (status, body) = get_json(app(idle_extractor()), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(body["cache"]["entries"], 0);
    }

    #[tokio::test]
    async fn test_stream_success() {
        let mut extractor = MockExtractor::new();
        extractor.expect_name().return_const("mock");
        extractor.expect_extract().times(1).returning(|_| {
            Ok(vec![Rendition {
                has_audio: true,
                has_video: false,
                ext: Some("m4a".to_string()),
                abr: Some(129.5),
                url: "https://cdn/m4a".to_string(),
            }])
        });

        let (status, body) = get_json(app(extractor), "/api/v1/stream/dQw4w9WgXcQ").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "success": true,
                "data": {
                    "video_id": "dQw4w9WgXcQ",
                    "stream_url": "https://cdn/m4a",
                    "format": "m4a",
                    "quality": "129kbps",
                    "expires_in_seconds": 21600
                }
            })
        );
    }

    #[tokio::test]
    async fn test_invalid_id_rejected_before_extraction() {
        let (status, body) = get_json(app(idle_extractor()), "/api/v1/stream/short").await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_undecodable_path_uses_envelope() {
        let (status, body) = get_json(app(idle_extractor()), "/api/v1/stream/%FF%FE%FD").await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_extraction_failure_is_500() {
        let mut extractor = MockExtractor::new();
        extractor.expect_name().return_const("mock");
        extractor.expect_extract().returning(|_| {
            Err(ExtractionError::ToolFailed {
                status: "exit status: 1".to_string(),
                stderr: "ERROR: Video unavailable".to_string(),
            })
        });

        let (status, body) = get_json(app(extractor), "/api/v1/stream/dQw4w9WgXcQ").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "STREAM_FAILED");
    }

    #[tokio::test]
    async fn test_no_audio_is_404() {
        let mut extractor = MockExtractor::new();
        extractor.expect_name().return_const("mock");
        extractor.expect_extract().returning(|_| {
            Ok(vec![Rendition {
                has_audio: false,
                has_video: true,
                ext: Some("mp4".to_string()),
                abr: None,
                url: "https://cdn/video".to_string(),
            }])
        });

        let (status, body) = get_json(app(extractor), "/api/v1/stream/dQw4w9WgXcQ").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NO_AUDIO_FORMAT");
    }
}
