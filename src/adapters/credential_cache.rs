//! Lazily refreshed key-pair credential shared by the remote clients

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{AssertionSigner, Credential};
use crate::error::{CredentialError, CredentialResult};

/// Holds the last issued credential and re-signs on demand.
///
/// The expiry check and any regeneration happen under one lock, so concurrent
/// callers never sign more than once for the same refresh.
pub struct CredentialCache {
    signer: Arc<dyn AssertionSigner>,
    refresh_margin: Duration,
    current: Mutex<Option<Credential>>,
}

impl CredentialCache {
    pub fn new(signer: Arc<dyn AssertionSigner>, refresh_margin: Duration) -> Self {
        Self {
            signer,
            refresh_margin,
            current: Mutex::new(None),
        }
    }

    /// Current credential, signing a new one if none is cached or it is due
    pub async fn current(&self) -> CredentialResult<Credential> {
        self.current_at(Utc::now()).await
    }

    pub async fn current_at(&self, now: DateTime<Utc>) -> CredentialResult<Credential> {
        let mut slot = self.current.lock().await;

        if let Some(credential) = slot.as_ref() {
            if !credential.needs_refresh_at(now, self.refresh_margin) {
                return Ok(credential.clone());
            }
            tracing::debug!(
                "Cached assertion expires at {}, regenerating",
                credential.expires_at()
            );
        }

        // Key decryption and RSA signing block, so they run off the async workers
        let signer = self.signer.clone();
        let fresh = tokio::task::spawn_blocking(move || signer.sign(now))
            .await
            .map_err(|e| CredentialError::Signing(format!("Signing task failed: {}", e)))??;
        *slot = Some(fresh.clone());
        Ok(fresh)
    }

    /// Drop the cached credential so the next call signs a new one
    pub async fn invalidate(&self) {
        let mut slot = self.current.lock().await;
        if slot.take().is_some() {
            tracing::warn!("Discarded cached assertion after it was rejected");
        }
    }
}
