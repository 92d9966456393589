use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_STREAM_IDLE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CREDENTIAL_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CREDENTIAL_REFRESH_THRESHOLD: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_VERTEX_LOCATION: &str = "us-east5";

#[derive(Debug, thiserror::Error)]
pub enum RelayConfigError {
    #[error("invalid relay config field {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
}

/// Final, merged relay configuration used by the running process.
///
/// Merge order: CLI > ENV > defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Overall upstream request timeout. `None` means unbounded.
    pub relay_timeout: Option<Duration>,
    pub connect_timeout: Duration,
    /// Longest gap tolerated between two chunks of a streamed upstream body.
    pub stream_idle_timeout: Duration,
    pub credential_exchange_timeout: Duration,
    /// Cached bearer tokens with less remaining lifetime than this are refreshed.
    pub credential_refresh_threshold: Duration,
    /// Default outbound proxy; a per-channel proxy takes precedence.
    pub proxy: Option<String>,
    pub vertex_location: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            relay_timeout: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            stream_idle_timeout: DEFAULT_STREAM_IDLE_TIMEOUT,
            credential_exchange_timeout: DEFAULT_CREDENTIAL_EXCHANGE_TIMEOUT,
            credential_refresh_threshold: DEFAULT_CREDENTIAL_REFRESH_THRESHOLD,
            proxy: None,
            vertex_location: DEFAULT_VERTEX_LOCATION.to_string(),
        }
    }
}

/// Optional layer used for merging relay config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayConfigPatch {
    pub relay_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub stream_idle_timeout: Option<Duration>,
    pub credential_exchange_timeout: Option<Duration>,
    pub credential_refresh_threshold: Option<Duration>,
    pub proxy: Option<String>,
    pub vertex_location: Option<String>,
}

impl RelayConfigPatch {
    pub fn overlay(&mut self, other: RelayConfigPatch) {
        if other.relay_timeout.is_some() {
            self.relay_timeout = other.relay_timeout;
        }
        if other.connect_timeout.is_some() {
            self.connect_timeout = other.connect_timeout;
        }
        if other.stream_idle_timeout.is_some() {
            self.stream_idle_timeout = other.stream_idle_timeout;
        }
        if other.credential_exchange_timeout.is_some() {
            self.credential_exchange_timeout = other.credential_exchange_timeout;
        }
        if other.credential_refresh_threshold.is_some() {
            self.credential_refresh_threshold = other.credential_refresh_threshold;
        }
        if other.proxy.is_some() {
            self.proxy = other.proxy;
        }
        if other.vertex_location.is_some() {
            self.vertex_location = other.vertex_location;
        }
    }

    pub fn into_config(self) -> Result<RelayConfig, RelayConfigError> {
        let defaults = RelayConfig::default();
        let proxy = self
            .proxy
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        if let Some(proxy) = proxy.as_deref()
            && !is_supported_proxy(proxy)
        {
            return Err(RelayConfigError::InvalidField {
                field: "proxy",
                message: format!("unsupported proxy scheme: {proxy}"),
            });
        }
        let vertex_location = self
            .vertex_location
            .map(|value| value.trim().to_string())
            .unwrap_or(defaults.vertex_location);
        if vertex_location.is_empty() {
            return Err(RelayConfigError::InvalidField {
                field: "vertex_location",
                message: "must not be empty".to_string(),
            });
        }
        Ok(RelayConfig {
            // A zero timeout is treated as "no timeout", matching the env/CLI convention.
            relay_timeout: self.relay_timeout.filter(|value| !value.is_zero()),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            stream_idle_timeout: self
                .stream_idle_timeout
                .unwrap_or(defaults.stream_idle_timeout),
            credential_exchange_timeout: self
                .credential_exchange_timeout
                .unwrap_or(defaults.credential_exchange_timeout),
            credential_refresh_threshold: self
                .credential_refresh_threshold
                .unwrap_or(defaults.credential_refresh_threshold),
            proxy,
            vertex_location,
        })
    }
}

impl From<RelayConfig> for RelayConfigPatch {
    fn from(value: RelayConfig) -> Self {
        Self {
            relay_timeout: value.relay_timeout,
            connect_timeout: Some(value.connect_timeout),
            stream_idle_timeout: Some(value.stream_idle_timeout),
            credential_exchange_timeout: Some(value.credential_exchange_timeout),
            credential_refresh_threshold: Some(value.credential_refresh_threshold),
            proxy: value.proxy,
            vertex_location: Some(value.vertex_location),
        }
    }
}

/// Proxy URLs accepted for upstream egress.
pub fn is_supported_proxy(proxy: &str) -> bool {
    ["http://", "https://", "socks5://", "socks5h://"]
        .iter()
        .any(|scheme| proxy.starts_with(scheme))
}
