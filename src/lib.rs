//! # Cortex Gateway
//!
//! Authenticated gateway in front of a Snowflake Cortex conversational agent. A prompt is
//! forwarded to the agent with a key-pair signed assertion, the streamed answer is reduced
//! to narrative text, the generated SQL and search citations, and the SQL is run against
//! the configured warehouse.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cortex_gateway::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Load configuration
//!     let settings = Settings::new()?;
//!
//!     // Server will start on configured host:port
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Hexagonal layout:
//! - **Domain**: credential, request manifest, stream and response types plus the ports
//! - **Application**: the prompt pipeline
//! - **Adapters**: signer, credential cache, agent client, stream parser, warehouses, HTTP
//! - **Config**: configuration loading and validation

pub mod adapters;
pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;

use crate::adapters::api_handler::{self, ApiState};
use crate::adapters::health_handler::HealthHandler;
use crate::application::AgentPipeline;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Creates the Axum application router.
///
/// # Arguments
///
/// * `pipeline` - Prompt pipeline shared by all requests
///
/// # Returns
///
/// Configured Axum Router
pub fn create_app(pipeline: Arc<AgentPipeline>) -> Router {
    let health_handler = Arc::new(HealthHandler::new());

    let api_router = Router::new()
        .route("/cortex/agent", post(api_handler::run_prompt))
        .with_state(ApiState { pipeline });

    Router::new()
        .route(
            "/health",
            get({
                let handler = health_handler.clone();
                move || {
                    let h = handler.clone();
                    async move { h.health().await }
                }
            }),
        )
        .nest("/api", api_router)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}
