use super::{AppResult, AppState};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use concierge_core::{
    AnswerDetail, AnswerResult, ConciergeError, MemberOverview, Strategy, UpstreamHealth,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ask", post(ask))
        .route("/ask-detailed", post(ask_detailed))
        .route("/members", get(members))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct AskRequest {
    /// Missing is treated like empty and rejected by the engine.
    #[serde(default)]
    question: String,
}

/// Body rejections (bad JSON, wrong content type) use the same error
/// envelope as every other failure.
fn question_from(payload: Result<Json<AskRequest>, JsonRejection>) -> AppResult<String> {
    let Json(req) = payload.map_err(|rejection| {
        ConciergeError::BadInput(format!("Invalid request body: {}", rejection.body_text()))
    })?;
    Ok(req.question)
}

#[derive(Serialize, Deserialize)]
struct RootResponse {
    message: String,
    version: String,
    strategy: Strategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    ai_configured: bool,
}

#[derive(Serialize, Deserialize)]
struct HealthResponse {
    status: String,
    api_status: UpstreamHealth,
    ai_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ai_model: Option<String>,
    cache_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_fetched_at: Option<DateTime<Utc>>,
    uptime_seconds: u64,
    timestamp: DateTime<Utc>,
}

async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: "Member Data Q&A System is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        strategy: state.engine.strategy(),
        model: state.engine.model().map(str::to_string),
        ai_configured: state.engine.is_configured(),
    })
}

async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> AppResult<Json<AnswerResult>> {
    let question = question_from(payload)?;
    Ok(Json(state.engine.answer(&question).await?))
}

async fn ask_detailed(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> AppResult<Json<AnswerDetail>> {
    let question = question_from(payload)?;
    Ok(Json(state.engine.answer_detailed(&question).await?))
}

async fn members(State(state): State<AppState>) -> AppResult<Json<MemberOverview>> {
    Ok(Json(state.engine.members().await?))
}

/// Probes the upstream feed but never calls the completion service.
async fn health(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let api_status = state.store.probe().await;
    let cache = state.store.status()?;

    let ai_status = match state.engine.strategy() {
        Strategy::Local => "not_required",
        Strategy::Llm if state.engine.is_configured() => "configured",
        Strategy::Llm => "not_configured",
    };

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        api_status,
        ai_status: ai_status.to_string(),
        ai_model: state.engine.model().map(str::to_string),
        cache_status: if cache.populated { "populated" } else { "empty" }.to_string(),
        cache_fetched_at: cache.fetched_at,
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConciergeConfig;
    use crate::engine::{Engine, SharedStore};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use concierge_core::*;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct FeedStub {
        batch: Option<MessageBatch>,
    }

    #[async_trait]
    impl MessageSource for FeedStub {
        fn name(&self) -> &str {
            "stub"
        }

        async fn fetch(&self) -> Result<MessageBatch> {
            self.batch
                .clone()
                .ok_or_else(|| ConciergeError::UpstreamUnavailable("connection refused".into()))
        }

        async fn probe(&self) -> UpstreamHealth {
            if self.batch.is_some() {
                UpstreamHealth::Healthy
            } else {
                UpstreamHealth::Unhealthy
            }
        }
    }

    fn make_app(batch: Option<MessageBatch>) -> Router {
        let source: Arc<dyn MessageSource> = Arc::new(FeedStub { batch });
        let store: Arc<SharedStore> = Arc::new(MessageStore::new(source));
        let engine =
            Engine::with_store(&ConciergeConfig::default(), Strategy::Local, store).unwrap();
        create_router(AppState::new(engine))
    }

    fn feed() -> Option<MessageBatch> {
        Some(MessageBatch::new(vec![
            Message::new("Fatima El-Tahir", "Need passes for the Louvre late opening")
                .with_timestamp("2025-02-10T16:00:00"),
            Message::new("Thiago Monteiro", "Reserve a table at Maní for six")
                .with_timestamp("2025-02-11T12:00:00"),
        ]))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_root_reports_strategy() {
        let resp = make_app(feed())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let root: RootResponse = serde_json::from_value(body_json(resp).await).unwrap();
        assert_eq!(root.strategy, Strategy::Local);
        assert!(root.ai_configured);
        assert!(root.model.is_none());
    }

    #[tokio::test]
    async fn test_ask_rejects_blank_question() {
        let resp = make_app(feed())
            .oneshot(post_json("/ask", json!({"question": "   "})))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            json!({"success": false, "error": "Question cannot be empty"})
        );
    }

    #[tokio::test]
    async fn test_ask_rejects_missing_question() {
        let resp = make_app(feed())
            .oneshot(post_json("/ask", json!({})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_envelope() {
        let app = make_app(feed());

        for uri in ["/ask", "/ask-detailed"] {
            let resp = app
                .clone()
                .oneshot(
                    Request::post(uri)
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(Body::from("{\"question\": "))
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
            let body = body_json(resp).await;
            assert_eq!(body["success"], json!(false));
            assert!(body["error"]
                .as_str()
                .unwrap()
                .starts_with("Invalid request body"));
        }
    }

    #[tokio::test]
    async fn test_missing_content_type_uses_error_envelope() {
        let resp = make_app(feed())
            .oneshot(
                Request::post("/ask")
                    .body(Body::from(r#"{"question": "Where is Layla going?"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["success"], json!(false));
    }

    #[tokio::test]
    async fn test_ask_upstream_unavailable_is_bad_gateway() {
        let resp = make_app(None)
            .oneshot(post_json("/ask", json!({"question": "What does Thiago like?"})))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(resp).await;
        assert_eq!(body["success"], json!(false));
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Unable to connect to member data API"));
    }

    #[tokio::test]
    async fn test_ask_answers_from_feed() {
        let resp = make_app(feed())
            .oneshot(post_json(
                "/ask",
                json!({"question": "Which restaurant did Thiago Monteiro book?"}),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(
            body["answer"],
            json!("Thiago Monteiro has made reservations at: Maní six.")
        );
        assert_eq!(body["sources_used"], json!(["member_data_api", "pattern_extraction"]));
        assert!(body.get("confidence").is_none());
    }

    #[tokio::test]
    async fn test_ask_detailed_includes_bookkeeping() {
        let resp = make_app(feed())
            .oneshot(post_json(
                "/ask-detailed",
                json!({"question": "What tickets does Fatima El-Tahir want?"}),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["context_length"], json!(2));
        assert!(body["timestamp"].is_string());
        assert!(body["answer"].as_str().unwrap().contains("Fatima El-Tahir"));
    }

    #[tokio::test]
    async fn test_members_overview() {
        let resp = make_app(feed())
            .oneshot(Request::get("/members").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["total_messages"], json!(2));
        assert_eq!(body["unique_members"], json!(2));
        assert_eq!(body["members"][0]["name"], json!("Fatima El-Tahir"));
    }

    #[tokio::test]
    async fn test_health_reports_cache_status() {
        let app = make_app(feed());

        let resp = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let health: HealthResponse = serde_json::from_value(body_json(resp).await).unwrap();
        assert_eq!(health.cache_status, "empty");
        assert_eq!(health.api_status, UpstreamHealth::Healthy);
        assert_eq!(health.ai_status, "not_required");

        app.clone()
            .oneshot(Request::get("/members").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_value(body_json(resp).await).unwrap();
        assert_eq!(health.cache_status, "populated");
        assert!(health.cache_fetched_at.is_some());
    }

    #[tokio::test]
    async fn test_health_survives_unreachable_upstream() {
        let resp = make_app(None)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let health: HealthResponse = serde_json::from_value(body_json(resp).await).unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.api_status, UpstreamHealth::Unhealthy);
    }

    #[test]
    fn test_error_status_mapping() {
        use crate::http::status_for;
        assert_eq!(status_for(&ConciergeError::UpstreamTimeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for(&ConciergeError::CompletionTimeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for(&ConciergeError::RateLimited), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(&ConciergeError::NotConfigured), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_for(&ConciergeError::Auth), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status_for(&ConciergeError::Internal("lock".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&ConciergeError::Upstream("HTTP 500".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
