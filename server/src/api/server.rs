//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::middleware::{self, AllowedOrigins};
use super::openapi::openapi_json;
use super::routes::{agents, health, ingest};
use crate::core::CoreApp;
use crate::core::constants::DEFAULT_BODY_LIMIT;
use crate::data::MemoryStore;
use crate::domain::agents::AgentActivityService;

pub struct ApiServer {
    app: CoreApp,
    allowed_origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let allowed_origins = AllowedOrigins::new(&app.config.server.host, app.config.server.port);
        Self {
            app,
            allowed_origins,
        }
    }

    /// Returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self {
            app,
            allowed_origins,
        } = self;

        let shutdown = app.shutdown.clone();
        let addr = SocketAddr::new(app.config.server.host.parse()?, app.config.server.port);

        let router = build_router(app.activity.clone(), app.store.clone(), &allowed_origins);

        let listener = TcpListener::bind(addr).await?;
        tracing::debug!(%addr, "API server listening");
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.wait())
        .await?;

        Ok(app)
    }
}

/// Assemble the full HTTP router
pub fn build_router(
    activity: Arc<AgentActivityService>,
    store: Arc<MemoryStore>,
    allowed_origins: &AllowedOrigins,
) -> Router {
    Router::new()
        .route("/api/v1/health", get(health::health))
        .route("/api/openapi.json", get(openapi_json))
        .nest("/api/v1/agents", agents::routes(activity))
        .nest("/api/v1", ingest::routes(store))
        .fallback(middleware::handle_404)
        .layer(CompressionLayer::new())
        .layer(middleware::cors(allowed_origins))
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::core::config::AgentsConfig;

    fn router() -> Router {
        let store = Arc::new(MemoryStore::new(100, 100));
        let activity = Arc::new(AgentActivityService::new(
            store.clone(),
            store.clone(),
            &AgentsConfig::default(),
        ));
        build_router(activity, store, &AllowedOrigins::new("127.0.0.1", 5390))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(
            router(),
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_openapi_json() {
        let (status, body) = send(
            router(),
            Request::builder()
                .uri("/api/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/v1/agents/activity"].is_object());
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, _) = send(
            router(),
            Request::builder()
                .uri("/api/v1/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ingest_then_activity() {
        let router = router();
        let now_nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap();
        let spans = serde_json::json!({
            "spans": [
                {
                    "traceId": "t1",
                    "startTimeUnixNano": now_nanos,
                    "attributes": {
                        "gen_ai.operation.name": "invoke_agent",
                        "gen_ai.agent.name": "planner",
                        "session.id": "s1"
                    }
                },
                {
                    "traceId": "t2",
                    "startTimeUnixNano": now_nanos,
                    "attributes": { "gen_ai.operation.name": "chat" }
                }
            ]
        });
        let evaluations = serde_json::json!({
            "evaluations": [
                { "traceId": "t1", "evaluationName": "relevance", "scoreValue": 0.5 }
            ]
        });

        for (uri, body) in [("/api/v1/spans", spans), ("/api/v1/evaluations", evaluations)] {
            let (status, _) = send(
                router.clone(),
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await;
            assert_eq!(status, StatusCode::ACCEPTED);
        }

        let (status, body) = send(
            router,
            Request::builder()
                .uri("/api/v1/agents/activity?period=24h")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let agents = body["agents"].as_array().unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0]["agentName"], "planner");
        assert_eq!(agents[0]["sessionIds"], serde_json::json!(["s1"]));
        assert_eq!(agents[0]["evalSummary"]["relevance"]["count"], 1);
    }

    #[tokio::test]
    async fn test_ingest_tolerates_null_and_array_attributes() {
        let router = router();
        let now_nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap();
        let spans = serde_json::json!({
            "spans": [{
                "traceId": "t1",
                "startTimeUnixNano": now_nanos,
                "attributes": {
                    "gen_ai.operation.name": "invoke_agent",
                    "gen_ai.agent.name": "planner",
                    "agent.output_size": null,
                    "tags": ["x"]
                }
            }]
        });

        let (status, body) = send(
            router.clone(),
            Request::builder()
                .method("POST")
                .uri("/api/v1/spans")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(spans.to_string()))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["accepted"], 1);

        let (status, body) = send(
            router,
            Request::builder()
                .uri("/api/v1/agents/activity?period=24h")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let planner = &body["agents"][0];
        assert_eq!(planner["agentName"], "planner");
        assert_eq!(planner["invocations"], 1);
        assert_eq!(planner["avgOutputSize"], 0);
        assert_eq!(planner["errors"], 0);
    }
}
