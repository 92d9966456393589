use std::sync::Arc;

use grelay_common::RelayConfig;
use grelay_protocol::openai::ChatCompletionRequest;
use grelay_provider_core::{
    AdaptorRegistry, ChannelRegistry, DownstreamSender, Headers, HttpMethod, RelayError, RelayInfo,
    RelayMeta, RelayResult, UpstreamClient, UpstreamHttpRequest, UsageCounters,
};
use tracing::{info, warn};

use crate::builtin::default_registry;
use crate::client::WreqUpstreamClient;
use crate::http_client::HttpClientPool;
use crate::tokenizer::count_message_tokens;

/// One-request relay pipeline: context, adaptor, upstream call, translation.
pub struct Relay {
    channels: Arc<ChannelRegistry>,
    adaptors: AdaptorRegistry,
    client: Arc<dyn UpstreamClient>,
}

impl Relay {
    pub fn new(
        channels: Arc<ChannelRegistry>,
        adaptors: AdaptorRegistry,
        client: Arc<dyn UpstreamClient>,
    ) -> Self {
        Self {
            channels,
            adaptors,
            client,
        }
    }

    /// Built-in channels and adaptors over a pooled `wreq` client.
    pub fn from_config(config: &RelayConfig) -> Self {
        let pool = Arc::new(HttpClientPool::from_config(config));
        let client = Arc::new(WreqUpstreamClient::new(
            pool.clone(),
            config.stream_idle_timeout,
        ));
        Self::new(
            Arc::new(ChannelRegistry::with_builtin()),
            default_registry(pool, config),
            client,
        )
    }

    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    /// Relays `request` over the channel described by `meta`.
    ///
    /// Output goes to `downstream`: one JSON body, or encoded `data:` records
    /// ending with `[DONE]` when streaming. Errors before the first byte leave
    /// `downstream` untouched so the caller can still send an error envelope.
    pub async fn relay(
        &self,
        meta: RelayMeta,
        request: Option<&ChatCompletionRequest>,
        downstream: &DownstreamSender,
    ) -> RelayResult<UsageCounters> {
        let mut info = RelayInfo::build(meta, &self.channels)?;
        let adaptor = self.adaptors.resolve(&info)?;
        if let Some(request) = request {
            info.bind_request(request);
            info.set_prompt_tokens(count_message_tokens(&request.model, &request.messages));
            adaptor.init(&mut info, request)?;
        }

        let url = adaptor.build_request_url(&info)?;
        let mut headers = Headers::new();
        adaptor.setup_headers(&info, &mut headers).await?;
        let body = adaptor.convert_request(&info, request).await?;

        info!(
            event = "upstream_request",
            trace_id = %info.request_id,
            adaptor = adaptor.name(),
            channel_type = info.channel_type,
            model = %info.upstream_model_name,
            stream = info.is_stream,
            url = %url,
        );
        let upstream = UpstreamHttpRequest {
            method: HttpMethod::Post,
            url,
            headers,
            body: Some(body),
            is_stream: info.is_stream,
            proxy: info.proxy.clone(),
        };
        let response = adaptor.send(self.client.as_ref(), &info, upstream).await?;

        if !response.is_success() {
            let status = response.status;
            let body = response.body.collect().await;
            warn!(
                event = "upstream_response",
                trace_id = %info.request_id,
                status,
                elapsed_ms = info.elapsed().as_millis() as u64,
                body = %String::from_utf8_lossy(&body),
            );
            let status = http::StatusCode::from_u16(status)
                .unwrap_or(http::StatusCode::BAD_GATEWAY);
            return Err(RelayError::Upstream { status, body });
        }

        let result = adaptor.handle_response(&mut info, response, downstream).await;
        match &result {
            Ok(usage) => info!(
                event = "upstream_response",
                trace_id = %info.request_id,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                elapsed_ms = info.elapsed().as_millis() as u64,
            ),
            Err(err) => warn!(
                event = "upstream_response",
                trace_id = %info.request_id,
                code = err.code(),
                error = %err,
                elapsed_ms = info.elapsed().as_millis() as u64,
            ),
        }
        result
    }
}
