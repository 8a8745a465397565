//! Error types for the gateway pipeline

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the private key or signing an assertion
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The private key file could not be read
    #[error("Cannot read private key at {}: {source}", path.display())]
    KeyAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The key material could not be parsed (wrong format or passphrase)
    #[error("Invalid private key: {0}")]
    KeyFormat(String),

    /// Cryptographic failure while producing the assertion
    #[error("Signing error: {0}")]
    Signing(String),
}

/// Errors raised by the remote agent call
#[derive(Debug, Error)]
pub enum AgentCallError {
    /// No assertion could be produced for the request
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The endpoint rejected the credential
    #[error("Authentication rejected: {status} - {message}")]
    Authentication { status: u16, message: String },

    /// Network-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Any other non-success response
    #[error("Remote error: {status} - {body}")]
    Remote { status: u16, body: String },
}

impl From<reqwest::Error> for AgentCallError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AgentCallError::Transport(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            AgentCallError::Transport(format!("Connection error: {}", err))
        } else {
            AgentCallError::Transport(err.to_string())
        }
    }
}

/// Errors raised while running a statement against the warehouse
#[derive(Debug, Error)]
pub enum QueryError {
    /// No assertion could be produced for the SQL API request
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The statement failed (syntax, permission, timeout, driver or remote failure)
    #[error("Query execution failed: {0}")]
    Execution(String),
}

impl From<sqlx::Error> for QueryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            // The Any driver has no mapping for temporal and NUMERIC columns
            sqlx::Error::AnyDriverError(e) => QueryError::Execution(format!(
                "Unsupported column type: {}. Cast DATE, TIMESTAMP and NUMERIC columns to text or a float type",
                e
            )),
            other => QueryError::Execution(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        QueryError::Execution(format!("Warehouse request failed: {}", err))
    }
}

/// Pipeline stage that produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Credential,
    Agent,
    Query,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credential => "credential",
            Self::Agent => "agent",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Original cause carried by [`GatewayError::Pipeline`]
#[derive(Debug, Error)]
pub enum StageFailure {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Agent(AgentCallError),

    #[error(transparent)]
    Query(QueryError),
}

impl StageFailure {
    /// Stage the cause belongs to. Credential failures are reported as such even
    /// when raised while calling the agent or the warehouse.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Credential(_) => Stage::Credential,
            Self::Agent(_) => Stage::Agent,
            Self::Query(_) => Stage::Query,
        }
    }
}

impl From<AgentCallError> for StageFailure {
    fn from(err: AgentCallError) -> Self {
        match err {
            AgentCallError::Credential(e) => StageFailure::Credential(e),
            other => StageFailure::Agent(other),
        }
    }
}

impl From<QueryError> for StageFailure {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Credential(e) => StageFailure::Credential(e),
            other => StageFailure::Query(other),
        }
    }
}

/// Terminal error returned by [`crate::application::AgentPipeline::handle_prompt`]
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Prompt rejected before any I/O
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A pipeline stage failed; no partial result is returned
    #[error("Pipeline failed at {stage} stage: {source}")]
    Pipeline {
        stage: Stage,
        #[source]
        source: StageFailure,
    },
}

impl GatewayError {
    /// Wrap a stage failure, deriving the stage from the cause
    pub fn pipeline(cause: impl Into<StageFailure>) -> Self {
        let source = cause.into();
        GatewayError::Pipeline {
            stage: source.stage(),
            source,
        }
    }

    /// Failing stage, if the error came from the pipeline
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::InvalidInput(_) => None,
            Self::Pipeline { stage, .. } => Some(*stage),
        }
    }

    /// Convert to HTTP status code for API responses
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Pipeline { stage: Stage::Agent, .. } => StatusCode::BAD_GATEWAY,
            Self::Pipeline { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type alias for credential operations
pub type CredentialResult<T> = Result<T, CredentialError>;

/// Result type alias for agent calls
pub type AgentCallResult<T> = Result<T, AgentCallError>;
