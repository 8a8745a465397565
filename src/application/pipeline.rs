//! Prompt orchestration: agent call, stream extraction, query execution

use std::sync::Arc;

use crate::adapters::stream_parser;
use crate::domain::{AgentPort, AgentResponse, WarehousePort};
use crate::error::GatewayError;

/// Runs one prompt through the agent and the warehouse.
///
/// Stages run strictly in order and any failure aborts the whole request; there is
/// no partial response.
pub struct AgentPipeline {
    agent: Arc<dyn AgentPort>,
    warehouse: Arc<dyn WarehousePort>,
}

impl AgentPipeline {
    pub fn new(agent: Arc<dyn AgentPort>, warehouse: Arc<dyn WarehousePort>) -> Self {
        Self { agent, warehouse }
    }

    pub async fn handle_prompt(&self, prompt: &str) -> Result<AgentResponse, GatewayError> {
        if prompt.trim().is_empty() {
            return Err(GatewayError::InvalidInput(
                "prompt must not be empty".to_string(),
            ));
        }

        let raw = self.agent.send(prompt).await.map_err(|e| {
            tracing::warn!("Agent call failed: {}", e);
            GatewayError::pipeline(e)
        })?;

        let outcome = stream_parser::parse(&raw);

        let table = self.warehouse.execute(&outcome.sql).await.map_err(|e| {
            tracing::warn!("Query execution failed: {}", e);
            GatewayError::pipeline(e)
        })?;

        tracing::info!(
            "Prompt answered: {} chars of text, {} rows",
            outcome.text.len(),
            table.len()
        );

        Ok(AgentResponse::new(outcome, table))
    }
}
