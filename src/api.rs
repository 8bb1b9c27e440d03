pub(crate) mod health;
pub(crate) mod metrics;
pub(crate) mod recommend;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::app::AppState;

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health/ready", get(health::ready))
        .route("/health/live", get(health::live))
        .route("/metrics", get(metrics::exporter))
        .route("/v1/genres", get(recommend::genres))
        .route("/v1/recommendations", post(recommend::recommend))
        .route("/v1/scenarios/inspect", post(recommend::inspect))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::{
        app::{ComponentRegistry, build_router},
        catalog::{CatalogError, CatalogSource, InMemoryCatalog, SongRecord},
        config::Config,
        embedding::{EmbeddingProvider, HashingEmbeddingProvider},
        observability::Telemetry,
        scenario::ArchetypeTable,
    };

    struct UnreachableCatalog;

    #[async_trait]
    impl CatalogSource for UnreachableCatalog {
        async fn fetch_songs(&self, _limit: Option<u32>) -> Result<Vec<SongRecord>, CatalogError> {
            Err(CatalogError::Query(sqlx::Error::PoolClosed))
        }

        async fn ping(&self) -> Result<(), CatalogError> {
            Err(CatalogError::Query(sqlx::Error::PoolClosed))
        }
    }

    fn song(name: &str, energy: f64, acousticness: f64) -> SongRecord {
        SongRecord {
            track_name: name.to_string(),
            artist_name: "artist".to_string(),
            danceability: 0.4,
            energy,
            valence: 0.5,
            tempo: 95.0,
            acousticness,
            instrumentalness: 0.5,
            speechiness: 0.05,
            loudness: None,
        }
    }

    fn router_with(source: Arc<dyn CatalogSource>) -> axum::Router {
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbeddingProvider::default());
        let table = ArchetypeTable::build(provider.as_ref(), None).expect("table");
        let registry = ComponentRegistry::from_parts(
            Config::with_catalog_path("unused.db"),
            Telemetry::without_tracing().expect("telemetry"),
            provider,
            table,
            source,
        )
        .expect("registry builds");
        build_router(registry)
    }

    fn router() -> axum::Router {
        let songs = (0..150)
            .map(|i| song(&format!("track {i}"), 0.3, 0.7))
            .collect();
        router_with(Arc::new(InMemoryCatalog::new(songs)))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("valid json")
    }

    #[tokio::test]
    async fn recommendations_default_to_ten() {
        let response = router()
            .oneshot(post_json(
                "/v1/recommendations",
                r#"{"input": "Relaxing evening at home"}"#,
            ))
            .await
            .expect("request succeeds");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        let songs = payload.as_array().expect("array");
        assert_eq!(songs.len(), 10);
        assert_eq!(songs[0]["track_name"], "track 0");
        assert!(songs[0].get("speechiness").is_none());
    }

    #[tokio::test]
    async fn top_n_is_clamped_to_configured_maximum() {
        let response = router()
            .oneshot(post_json(
                "/v1/recommendations",
                r#"{"input": "late night coding", "top_n": 1000}"#,
            ))
            .await
            .expect("request succeeds");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload.as_array().expect("array").len(), 100);
    }

    #[tokio::test]
    async fn blank_input_is_rejected() {
        for body in [r#"{"input": "   "}"#, r#"{"genre": "rock"}"#] {
            let response = router()
                .oneshot(post_json("/v1/recommendations", body))
                .await
                .expect("request succeeds");
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let payload = json_body(response).await;
            assert!(payload["error"].as_str().is_some());
        }
    }

    #[tokio::test]
    async fn malformed_bodies_get_json_errors() {
        let cases = [
            (
                "/v1/recommendations",
                r#"{"input": "happy", "top_n": -1}"#,
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                "/v1/recommendations",
                r#"{"input": "happy""#,
                StatusCode::BAD_REQUEST,
            ),
            (
                "/v1/scenarios/inspect",
                r#"{"input": 42}"#,
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];
        for (uri, body, expected) in cases {
            let response = router()
                .oneshot(post_json(uri, body))
                .await
                .expect("request succeeds");
            assert_eq!(response.status(), expected, "{uri} {body}");
            let payload = json_body(response).await;
            assert!(payload["error"].as_str().is_some_and(|error| !error.is_empty()));
        }
    }

    #[tokio::test]
    async fn missing_content_type_is_a_json_error() {
        let request = Request::post("/v1/recommendations")
            .body(Body::from(r#"{"input": "happy"}"#))
            .expect("request builds");
        let response = router().oneshot(request).await.expect("request succeeds");
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(json_body(response).await["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn unknown_genre_is_not_an_error() {
        let response = router()
            .oneshot(post_json(
                "/v1/recommendations",
                r#"{"input": "happy morning", "genre": "polka", "top_n": 3}"#,
            ))
            .await
            .expect("request succeeds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await.as_array().expect("array").len(), 3);
    }

    #[tokio::test]
    async fn catalog_failure_maps_to_service_unavailable() {
        let app = router_with(Arc::new(UnreachableCatalog));
        let response = app
            .clone()
            .oneshot(post_json("/v1/recommendations", r#"{"input": "sad night"}"#))
            .await
            .expect("request succeeds");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let ready = app
            .oneshot(Request::get("/health/ready").body(Body::empty()).expect("request"))
            .await
            .expect("request succeeds");
        assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(ready).await["status"], "degraded");
    }

    #[tokio::test]
    async fn genres_are_listed_in_profile_order() {
        let response = router()
            .oneshot(Request::get("/v1/genres").body(Body::empty()).expect("request"))
            .await
            .expect("request succeeds");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(
            payload["genres"],
            serde_json::json!(["electronic", "acoustic", "hip_hop", "classical", "rock"])
        );
    }

    #[tokio::test]
    async fn inspect_returns_labels_and_ranges() {
        let response = router()
            .oneshot(post_json(
                "/v1/scenarios/inspect",
                r#"{"input": "I'm working out with friends in the late evening."}"#,
            ))
            .await
            .expect("request succeeds");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload["labels"]["activity"], "working");
        assert_eq!(payload["labels"]["time"], "evening");
        assert_eq!(payload["labels"]["social"], "with_friends");
        assert!(payload["labels"]["mood"].is_null());
        assert_eq!(payload["fallback"], false);
        assert!(payload["ranges"].as_object().is_some_and(|ranges| !ranges.is_empty()));
    }

    #[tokio::test]
    async fn probes_and_metrics_respond() {
        let app = router();
        let live = app
            .clone()
            .oneshot(Request::get("/health/live").body(Body::empty()).expect("request"))
            .await
            .expect("request succeeds");
        assert_eq!(live.status(), StatusCode::OK);

        let ready = app
            .clone()
            .oneshot(Request::get("/health/ready").body(Body::empty()).expect("request"))
            .await
            .expect("request succeeds");
        assert_eq!(ready.status(), StatusCode::OK);

        let metrics = app
            .oneshot(Request::get("/metrics").body(Body::empty()).expect("request"))
            .await
            .expect("request succeeds");
        assert_eq!(metrics.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(metrics.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let text = String::from_utf8(bytes.to_vec()).expect("utf8");
        assert!(text.contains("scenario_archetypes_loaded 300"));
    }
}
