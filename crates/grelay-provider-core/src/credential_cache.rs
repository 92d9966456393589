use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use grelay_common::RelayConfig;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::info;

use crate::errors::{RelayError, RelayResult};

/// Short-lived bearer token derived from long-lived credential material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

impl AccessToken {
    pub fn remaining(&self, now: OffsetDateTime) -> time::Duration {
        self.expires_at - now
    }
}

/// Trades credential material for an access token (identity provider call).
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange(&self, credential: &str, proxy: Option<&str>) -> RelayResult<AccessToken>;
}

/// Process-wide token cache keyed by the raw credential blob.
///
/// Entries are only replaced by a successful refresh and are never evicted.
/// Concurrent misses on the same key each run their own exchange.
pub struct CredentialCache {
    entries: RwLock<HashMap<String, AccessToken>>,
    exchanger: Arc<dyn TokenExchanger>,
    refresh_threshold: Duration,
    exchange_timeout: Duration,
}

impl CredentialCache {
    pub fn new(
        exchanger: Arc<dyn TokenExchanger>,
        refresh_threshold: Duration,
        exchange_timeout: Duration,
    ) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            exchanger,
            refresh_threshold,
            exchange_timeout,
        }
    }

    pub fn from_config(exchanger: Arc<dyn TokenExchanger>, config: &RelayConfig) -> Self {
        Self::new(
            exchanger,
            config.credential_refresh_threshold,
            config.credential_exchange_timeout,
        )
    }

    /// Returns a bearer token for `credential`, exchanging when the cached one
    /// is missing or closer to expiry than the refresh threshold.
    pub async fn resolve(&self, credential: &str, proxy: Option<&str>) -> RelayResult<String> {
        if let Some(token) = self.cached(credential).await {
            return Ok(token);
        }

        let fresh = tokio::time::timeout(
            self.exchange_timeout,
            self.exchanger.exchange(credential, proxy),
        )
        .await
        .map_err(|_| {
            RelayError::credential(
                "credential_exchange_timeout",
                format!(
                    "credential exchange timed out after {}s",
                    self.exchange_timeout.as_secs()
                ),
            )
        })??;

        info!(
            event = "credential_refreshed",
            expires_at = %fresh.expires_at,
        );
        let token = fresh.token.clone();
        self.entries
            .write()
            .await
            .insert(credential.to_string(), fresh);
        Ok(token)
    }

    /// Seeds or replaces an entry without calling the exchanger.
    pub async fn insert(&self, credential: impl Into<String>, token: AccessToken) {
        self.entries.write().await.insert(credential.into(), token);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn cached(&self, credential: &str) -> Option<String> {
        let entries = self.entries.read().await;
        let entry = entries.get(credential)?;
        let remaining = entry.remaining(OffsetDateTime::now_utc());
        if remaining.is_positive() && remaining >= self.refresh_threshold {
            Some(entry.token.clone())
        } else {
            None
        }
    }
}
