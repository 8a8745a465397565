use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod agent;
pub mod credential;
pub mod response;
pub mod stream;

pub use agent::{AgentRequest, ToolManifest};
pub use credential::Credential;
pub use response::{AgentResponse, ParsedOutcome, QueryResult, Row};
pub use stream::StreamEvent;

use crate::error::{AgentCallError, CredentialError, QueryError};

/// Produces signed assertions
pub trait AssertionSigner: Send + Sync {
    fn sign(&self, issued_at: DateTime<Utc>) -> Result<Credential, CredentialError>;
}

/// Remote conversational agent
#[async_trait]
pub trait AgentPort: Send + Sync {
    /// Submit a prompt and return the raw event-stream body
    async fn send(&self, prompt: &str) -> Result<String, AgentCallError>;
}

/// Backing data warehouse
#[async_trait]
pub trait WarehousePort: Send + Sync {
    /// Run one non-empty statement
    async fn run_statement(&self, sql: &str) -> Result<QueryResult, QueryError>;

    /// Run a statement produced by the agent. Empty query text yields an empty
    /// result without contacting the warehouse.
    async fn execute(&self, sql: &str) -> Result<QueryResult, QueryError> {
        if sql.trim().is_empty() {
            return Ok(QueryResult::empty());
        }
        self.run_statement(sql).await
    }
}
