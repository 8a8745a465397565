//! REST endpoint that answers prompts through the pipeline

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::AgentPipeline;
use crate::error::GatewayError;

/// Shared state for the prompt endpoint
#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<AgentPipeline>,
}

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'static str>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            stage: self.stage().map(|s| s.as_str()),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// POST /api/cortex/agent
pub async fn run_prompt(
    State(state): State<ApiState>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("Rejected prompt request: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: "Request body must be a JSON object with a string \"prompt\" field"
                        .to_string(),
                    stage: None,
                }),
            )
                .into_response();
        }
    };

    match state.pipeline.handle_prompt(&request.prompt).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => e.into_response(),
    }
}
