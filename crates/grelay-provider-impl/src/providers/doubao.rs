use async_trait::async_trait;
use bytes::Bytes;
use grelay_protocol::openai::ChatCompletionRequest;
use grelay_provider_core::{
    Adaptor, DownstreamSender, Headers, RelayInfo, RelayResult, UpstreamHttpResponse,
    UsageCounters,
};

use super::build_url;
use super::openai::OpenAiAdaptor;

const BOT_MODEL: &str = "Doubao-bot-chat";

/// Volcengine Doubao: OpenAI wire format under the `/api/v3` prefix.
#[derive(Debug, Default)]
pub struct DoubaoAdaptor {
    inner: OpenAiAdaptor,
}

impl DoubaoAdaptor {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Adaptor for DoubaoAdaptor {
    fn name(&self) -> &'static str {
        "doubao"
    }

    fn build_request_url(&self, info: &RelayInfo) -> RelayResult<String> {
        let path = if info.upstream_model_name == BOT_MODEL {
            "/api/v3/bots/chat/completions"
        } else {
            "/api/v3/chat/completions"
        };
        Ok(build_url(&info.base_url, path))
    }

    async fn setup_headers(&self, info: &RelayInfo, headers: &mut Headers) -> RelayResult<()> {
        self.inner.setup_headers(info, headers).await
    }

    async fn convert_request(
        &self,
        info: &RelayInfo,
        request: Option<&ChatCompletionRequest>,
    ) -> RelayResult<Bytes> {
        self.inner.convert_request(info, request).await
    }

    async fn handle_response(
        &self,
        info: &mut RelayInfo,
        response: UpstreamHttpResponse,
        downstream: &DownstreamSender,
    ) -> RelayResult<UsageCounters> {
        self.inner.handle_response(info, response, downstream).await
    }
}
