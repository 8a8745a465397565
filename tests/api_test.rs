mod common;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::{fixture, pipeline, FakeCortex, TOP_PRODUCTS_STREAM};
use cortex_gateway::application::AgentPipeline;
use cortex_gateway::domain::{AgentPort, QueryResult, WarehousePort};
use cortex_gateway::error::{AgentCallError, QueryError};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct UnreachableAgent;

#[async_trait]
impl AgentPort for UnreachableAgent {
    async fn send(&self, _prompt: &str) -> Result<String, AgentCallError> {
        Err(AgentCallError::Transport("Connection error: refused".to_string()))
    }
}

struct NoWarehouse;

#[async_trait]
impl WarehousePort for NoWarehouse {
    async fn run_statement(&self, _sql: &str) -> Result<QueryResult, QueryError> {
        Err(QueryError::Execution("no warehouse".to_string()))
    }
}

fn offline_app() -> Router {
    let pipeline = AgentPipeline::new(Arc::new(UnreachableAgent), Arc::new(NoWarehouse));
    cortex_gateway::create_app(Arc::new(pipeline))
}

fn post_prompt(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/cortex/agent")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_prompt_endpoint_returns_agent_response() {
    let cortex = FakeCortex::start(TOP_PRODUCTS_STREAM).await;
    let dir = tempfile::tempdir().unwrap();
    let app = cortex_gateway::create_app(pipeline(&cortex, fixture("rsa_key.p8"), &dir).await);

    let response = app
        .oneshot(post_prompt(r#"{"prompt":"top products"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!({
            "text": "",
            "sql": "SELECT name FROM products LIMIT 1",
            "citations": "",
            "table": [{ "name": "Widget" }]
        })
    );
}

#[tokio::test]
async fn test_missing_or_non_string_prompt_is_bad_request() {
    for body in [r#"{}"#, r#"{"prompt":42}"#, r#"{"prompt":null}"#, "not json"] {
        let response = offline_app().oneshot(post_prompt(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);

        let json = read_json(response).await;
        assert!(json["error"].is_string());
        assert!(json.get("stage").is_none());
    }
}

#[tokio::test]
async fn test_blank_prompt_is_bad_request() {
    let response = offline_app()
        .oneshot(post_prompt(r#"{"prompt":"   "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = read_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_agent_failure_is_bad_gateway() {
    let response = offline_app()
        .oneshot(post_prompt(r#"{"prompt":"top products"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = read_json(response).await;
    assert_eq!(json["stage"], "agent");
    assert!(json["error"].as_str().unwrap().contains("refused"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = offline_app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["uptime_seconds"].is_number());
}
