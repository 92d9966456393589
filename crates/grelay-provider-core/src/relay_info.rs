use grelay_protocol::openai::ChatCompletionRequest;
use time::{Duration, OffsetDateTime};

use crate::api_type::{ApiType, supports_stream_options};
use crate::channel::{ChannelRegistry, channel_type};
use crate::errors::{RelayError, RelayResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMode {
    ChatCompletions,
    Unknown,
}

impl RelayMode {
    pub fn from_path(path: &str) -> Self {
        let path = path.split('?').next().unwrap_or_default();
        if path.ends_with("/chat/completions") {
            RelayMode::ChatCompletions
        } else {
            RelayMode::Unknown
        }
    }
}

/// Already-authenticated request metadata handed over by the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct RelayMeta {
    pub channel_type: i32,
    pub channel_id: i64,
    pub token_id: i64,
    pub user_id: i64,
    pub group: String,
    pub token_unlimited: bool,
    /// Per-channel base URL override.
    pub base_url: Option<String>,
    /// Raw `Authorization` value or bare key.
    pub api_key: String,
    pub organization: Option<String>,
    pub proxy: Option<String>,
    pub api_version: Option<String>,
    pub request_path: String,
}

/// Per-request relay state. Owned by the task serving the request.
#[derive(Debug, Clone)]
pub struct RelayInfo {
    /// Correlates log lines of one request.
    pub request_id: String,
    pub channel_type: i32,
    pub channel_id: i64,
    pub token_id: i64,
    pub user_id: i64,
    pub group: String,
    pub token_unlimited: bool,
    pub api_type: ApiType,
    pub relay_mode: RelayMode,
    pub is_stream: bool,
    pub request_model_name: String,
    /// Model id sent upstream; adaptors may rewrite it.
    pub upstream_model_name: String,
    pub request_path: String,
    pub api_version: Option<String>,
    pub api_key: String,
    pub organization: Option<String>,
    /// Never empty and without a trailing slash.
    pub base_url: String,
    pub proxy: Option<String>,
    pub support_stream_options: bool,
    pub should_include_usage: bool,
    pub prompt_tokens: u64,
    pub start_time: OffsetDateTime,
    pub first_response_time: OffsetDateTime,
    first_response_seen: bool,
}

impl RelayInfo {
    /// Resolves API type and base URL for `meta`.
    ///
    /// An explicit base URL wins; otherwise the channel's default is used.
    /// Fails before any network work when neither is available.
    pub fn build(meta: RelayMeta, channels: &ChannelRegistry) -> RelayResult<Self> {
        let base_url = match meta
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            Some(base_url) => base_url.to_string(),
            None => {
                let channel = channels.lookup(meta.channel_type).ok_or_else(|| {
                    RelayError::config(
                        "channel_not_found",
                        format!("channel not exists: {}", meta.channel_type),
                    )
                })?;
                channel.base_url
            }
        };
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(RelayError::config(
                "base_url_missing",
                format!("channel {} requires a base url", meta.channel_type),
            ));
        }

        let (api_type, _) = ApiType::from_channel_type(meta.channel_type);
        let api_key = meta
            .api_key
            .strip_prefix("Bearer ")
            .unwrap_or(&meta.api_key)
            .trim()
            .to_string();
        let api_version = if meta.channel_type == channel_type::AZURE {
            meta.api_version.or_else(|| query_param(&meta.request_path, "api-version"))
        } else {
            meta.api_version
        };
        let start_time = OffsetDateTime::now_utc();

        Ok(Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            channel_type: meta.channel_type,
            channel_id: meta.channel_id,
            token_id: meta.token_id,
            user_id: meta.user_id,
            group: meta.group,
            token_unlimited: meta.token_unlimited,
            api_type,
            relay_mode: RelayMode::from_path(&meta.request_path),
            is_stream: false,
            request_model_name: String::new(),
            upstream_model_name: String::new(),
            request_path: meta.request_path,
            api_version,
            api_key,
            organization: meta.organization.filter(|value| !value.is_empty()),
            base_url,
            proxy: meta
                .proxy
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            support_stream_options: supports_stream_options(meta.channel_type),
            should_include_usage: false,
            prompt_tokens: 0,
            start_time,
            first_response_time: start_time - Duration::SECOND,
            first_response_seen: false,
        })
    }

    /// Copies the per-request fields of the inbound body.
    pub fn bind_request(&mut self, request: &ChatCompletionRequest) {
        self.request_model_name = request.model.clone();
        self.upstream_model_name = request.model.clone();
        self.is_stream = request.stream;
        self.should_include_usage =
            request.stream && self.support_stream_options && request.include_usage();
    }

    pub fn set_prompt_tokens(&mut self, prompt_tokens: u64) {
        self.prompt_tokens = prompt_tokens;
    }

    /// Records the first upstream byte; later calls are ignored.
    pub fn set_first_response_time(&mut self) {
        if !self.first_response_seen {
            self.first_response_time = OffsetDateTime::now_utc();
            self.first_response_seen = true;
        }
    }

    pub fn has_first_response(&self) -> bool {
        self.first_response_seen
    }

    pub fn elapsed(&self) -> std::time::Duration {
        (OffsetDateTime::now_utc() - self.start_time)
            .try_into()
            .unwrap_or_default()
    }
}

fn query_param(path: &str, name: &str) -> Option<String> {
    let (_, query) = path.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name && !value.is_empty()).then(|| value.to_string())
    })
}
