//! Cortex Agents `agent:run` client

use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;

use crate::adapters::credential_cache::CredentialCache;
use crate::config::CortexSettings;
use crate::domain::credential::{KEYPAIR_JWT, TOKEN_TYPE_HEADER};
use crate::domain::{AgentPort, ToolManifest};
use crate::error::{AgentCallError, AgentCallResult};

/// Authenticated client for the conversational agent endpoint
pub struct CortexAgentClient {
    client: reqwest::Client,
    agent_url: String,
    manifest: ToolManifest,
    credentials: Arc<CredentialCache>,
}

impl CortexAgentClient {
    pub fn new(settings: &CortexSettings, credentials: Arc<CredentialCache>) -> Self {
        Self::with_client(reqwest::Client::new(), settings, credentials)
    }

    pub fn with_client(
        client: reqwest::Client,
        settings: &CortexSettings,
        credentials: Arc<CredentialCache>,
    ) -> Self {
        Self {
            client,
            agent_url: settings.agent_url.clone(),
            manifest: ToolManifest::from_settings(settings),
            credentials,
        }
    }

    pub fn manifest(&self) -> &ToolManifest {
        &self.manifest
    }
}

#[async_trait]
impl AgentPort for CortexAgentClient {
    async fn send(&self, prompt: &str) -> AgentCallResult<String> {
        let credential = self.credentials.current().await?;
        let body = self.manifest.request(prompt);

        tracing::debug!(
            "Calling Cortex agent {} with model {}",
            self.agent_url,
            self.manifest.model()
        );

        let response = self
            .client
            .post(&self.agent_url)
            .header("Authorization", credential.bearer())
            .header(TOKEN_TYPE_HEADER, KEYPAIR_JWT)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                tracing::warn!("Cortex agent rejected the assertion with {}", status);
                self.credentials.invalidate().await;
                return Err(AgentCallError::Authentication {
                    status: status.as_u16(),
                    message: error_text,
                });
            }

            return Err(AgentCallError::Remote {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let raw = response.text().await?;
        tracing::debug!("Cortex agent returned {} bytes", raw.len());
        Ok(raw)
    }
}
