use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use grelay_common::RelayConfig;
use grelay_provider_core::{RelayError, RelayResult};

/// Timeout profile of a pooled client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientKind {
    /// Upstream relay calls; bounded by the relay timeout (if any).
    Relay,
    /// Side calls (image fetch, token exchange) with a short fixed timeout.
    Impatient,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    kind: ClientKind,
    proxy: Option<String>,
}

/// `wreq` clients cached per (kind, proxy).
#[derive(Debug)]
pub struct HttpClientPool {
    relay_timeout: Option<Duration>,
    connect_timeout: Duration,
    read_timeout: Duration,
    impatient_timeout: Duration,
    default_proxy: Option<String>,
    clients: Mutex<HashMap<ClientKey, wreq::Client>>,
}

impl HttpClientPool {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            relay_timeout: config.relay_timeout,
            connect_timeout: config.connect_timeout,
            read_timeout: config.stream_idle_timeout,
            impatient_timeout: config.credential_exchange_timeout,
            default_proxy: normalize_proxy(config.proxy.as_deref()),
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Client for `proxy`, falling back to the configured default proxy.
    pub fn client(&self, kind: ClientKind, proxy: Option<&str>) -> RelayResult<wreq::Client> {
        let key = ClientKey {
            kind,
            proxy: normalize_proxy(proxy).or_else(|| self.default_proxy.clone()),
        };

        let mut guard = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = guard.get(&key) {
            return Ok(client.clone());
        }
        let client = self.build_client(&key)?;
        guard.insert(key, client.clone());
        Ok(client)
    }

    fn build_client(&self, key: &ClientKey) -> RelayResult<wreq::Client> {
        let mut builder = wreq::Client::builder().connect_timeout(self.connect_timeout);
        builder = match key.kind {
            ClientKind::Relay => {
                let builder = builder.read_timeout(self.read_timeout);
                match self.relay_timeout {
                    Some(timeout) => builder.timeout(timeout),
                    None => builder,
                }
            }
            ClientKind::Impatient => builder.timeout(self.impatient_timeout),
        };
        if let Some(proxy_url) = key.proxy.as_deref() {
            let proxy = wreq::Proxy::all(proxy_url).map_err(|err| {
                RelayError::config("invalid_proxy", format!("invalid proxy {proxy_url}: {err}"))
            })?;
            builder = builder.proxy(proxy);
        }
        builder
            .build()
            .map_err(|err| RelayError::transport("http_client_build_failed", err.to_string()))
    }
}

fn normalize_proxy(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
}
