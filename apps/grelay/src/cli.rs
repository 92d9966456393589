use std::time::Duration;

use clap::Parser;
use grelay_common::RelayConfigPatch;
use grelay_provider_core::RelayMeta;

#[derive(Parser, Debug)]
#[command(name = "grelay", about = "Relay one chat-completion request to an upstream provider")]
pub(crate) struct Cli {
    /// Numeric channel type (1 = OpenAI, 14 = Anthropic, 10003 = Vertex Claude, ...).
    #[arg(long, env = "GRELAY_CHANNEL_TYPE")]
    pub(crate) channel_type: i32,
    /// Upstream API key; Vertex Claude takes `projectId|serviceAccountJSON`.
    #[arg(long, env = "GRELAY_API_KEY", hide_env_values = true)]
    pub(crate) api_key: String,
    /// Overrides the channel's default base URL.
    #[arg(long, env = "GRELAY_BASE_URL")]
    pub(crate) base_url: Option<String>,
    #[arg(long, env = "GRELAY_ORGANIZATION")]
    pub(crate) organization: Option<String>,
    #[arg(long, env = "GRELAY_API_VERSION")]
    pub(crate) api_version: Option<String>,
    #[arg(long, env = "GRELAY_PROXY")]
    pub(crate) proxy: Option<String>,
    /// 0 disables the overall timeout.
    #[arg(long, env = "GRELAY_RELAY_TIMEOUT_SECS")]
    pub(crate) relay_timeout_secs: Option<u64>,
    #[arg(long, env = "GRELAY_CONNECT_TIMEOUT_SECS")]
    pub(crate) connect_timeout_secs: Option<u64>,
    #[arg(long, env = "GRELAY_STREAM_IDLE_TIMEOUT_SECS")]
    pub(crate) stream_idle_timeout_secs: Option<u64>,
    #[arg(long, env = "GRELAY_CREDENTIAL_TIMEOUT_SECS")]
    pub(crate) credential_timeout_secs: Option<u64>,
    #[arg(long, env = "GRELAY_VERTEX_LOCATION")]
    pub(crate) vertex_location: Option<String>,
    #[arg(long, default_value = "/v1/chat/completions")]
    pub(crate) request_path: String,
    /// Canonical request body; `-` reads stdin.
    #[arg(default_value = "-")]
    pub(crate) request: String,
}

impl Cli {
    pub(crate) fn config_patch(&self) -> RelayConfigPatch {
        RelayConfigPatch {
            relay_timeout: self.relay_timeout_secs.map(Duration::from_secs),
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
            stream_idle_timeout: self.stream_idle_timeout_secs.map(Duration::from_secs),
            credential_exchange_timeout: self.credential_timeout_secs.map(Duration::from_secs),
            credential_refresh_threshold: None,
            proxy: self.proxy.clone(),
            vertex_location: self.vertex_location.clone(),
        }
    }

    /// The channel proxy is left unset so the configured default applies.
    pub(crate) fn relay_meta(&self) -> RelayMeta {
        RelayMeta {
            channel_type: self.channel_type,
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            organization: self.organization.clone(),
            api_version: self.api_version.clone(),
            request_path: self.request_path.clone(),
            ..Default::default()
        }
    }
}
