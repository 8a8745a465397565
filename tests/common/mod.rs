#![allow(dead_code)]

use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use cortex_gateway::adapters::cortex_client::CortexAgentClient;
use cortex_gateway::adapters::credential_cache::CredentialCache;
use cortex_gateway::adapters::credential_signer::KeyPairSigner;
use cortex_gateway::adapters::sql_warehouse::SqlWarehouse;
use cortex_gateway::application::AgentPipeline;
use cortex_gateway::config::CortexSettings;
use serde_json::Value;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const TOP_PRODUCTS_STREAM: &str = concat!(
    r#"data: {"delta":{"content":[{"type":"tool_results","tool_results":{"content":[{"type":"json","json":{"sql":"SELECT name FROM products LIMIT 1"}}]}}]}}"#,
    "\n",
    "data: [DONE]\n",
);

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

pub async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

pub fn cortex_settings(agent_url: String) -> CortexSettings {
    CortexSettings {
        agent_url,
        model: "claude-3-5-sonnet".to_string(),
        search_service: "SALES.PUBLIC.DOCS_SEARCH".to_string(),
        semantic_model_file: Some("@SALES.PUBLIC.MODELS/sales.yaml".to_string()),
        semantic_view: None,
        search_tool_name: "vehicles_info_search".to_string(),
        analyst_tool_name: "supply_chain".to_string(),
        search_max_results: 1,
        search_title_column: "title".to_string(),
        search_id_column: "relative_path".to_string(),
    }
}

/// Stand-in for the agent endpoint: records every request and replies with a fixed body
#[derive(Clone)]
pub struct FakeCortex {
    pub agent_url: String,
    requests: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

#[derive(Clone)]
struct FakeCortexState {
    status: StatusCode,
    body: &'static str,
    requests: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

impl FakeCortex {
    pub async fn start(body: &'static str) -> Self {
        Self::start_with_status(StatusCode::OK, body).await
    }

    pub async fn start_with_status(status: StatusCode, body: &'static str) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route(
                "/agent",
                post(
                    |State(state): State<FakeCortexState>,
                     headers: HeaderMap,
                     Json(request): Json<Value>| async move {
                        state.requests.lock().unwrap().push((headers, request));
                        (state.status, state.body)
                    },
                ),
            )
            .with_state(FakeCortexState {
                status,
                body,
                requests: requests.clone(),
            });

        let addr = spawn(router).await;
        Self {
            agent_url: format!("http://{}/agent", addr),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<(HeaderMap, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

/// SQLite warehouse seeded with a small products table
pub async fn products_warehouse(dir: &tempfile::TempDir) -> SqlWarehouse {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("sales.db").display());
    let warehouse = SqlWarehouse::connect(&url, 2, 5).await.unwrap();

    for statement in [
        "CREATE TABLE products (id INTEGER PRIMARY KEY, name TEXT NOT NULL, units INTEGER)",
        "INSERT INTO products (name, units) VALUES ('Widget', 120)",
        "INSERT INTO products (name, units) VALUES ('Gadget', 45)",
    ] {
        sqlx::query(statement)
            .execute(warehouse.pool())
            .await
            .unwrap();
    }
    warehouse
}

/// Full pipeline: fixture key signer, agent client against `cortex`, SQLite warehouse
pub async fn pipeline(
    cortex: &FakeCortex,
    key_path: PathBuf,
    dir: &tempfile::TempDir,
) -> Arc<AgentPipeline> {
    let signer = Arc::new(KeyPairSigner::new(key_path, None, "acme", "bob"));
    let credentials = Arc::new(CredentialCache::new(signer, chrono::Duration::seconds(60)));
    let agent = Arc::new(CortexAgentClient::new(
        &cortex_settings(cortex.agent_url.clone()),
        credentials,
    ));
    let warehouse = Arc::new(products_warehouse(dir).await);
    Arc::new(AgentPipeline::new(agent, warehouse))
}
