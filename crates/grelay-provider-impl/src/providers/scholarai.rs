use async_trait::async_trait;
use bytes::Bytes;
use grelay_protocol::openai::ChatCompletionRequest;
use grelay_protocol::scholarai::ScholarAiTextResponse;
use grelay_provider_core::adaptor::{forward, require_request};
use grelay_provider_core::{
    Adaptor, DownstreamSender, Headers, RelayError, RelayInfo, RelayResult, UpstreamHttpResponse,
    UsageCounters, relay_stream,
};
use grelay_transform::generate_content::openai_chat_completions2scholarai::{request, response};

use super::openai::ChunkPassthrough;
use super::{build_url, decode_json, encode_json, expect_stream};
use crate::auth_extractor;
use crate::tokenizer::count_text_tokens;

/// ScholarAI: one flattened user turn up, OpenAI-shaped replies down.
#[derive(Debug, Default)]
pub struct ScholarAiAdaptor;

impl ScholarAiAdaptor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Adaptor for ScholarAiAdaptor {
    fn name(&self) -> &'static str {
        "scholarai"
    }

    fn build_request_url(&self, info: &RelayInfo) -> RelayResult<String> {
        Ok(build_url(&info.base_url, "/v1/chat/completions"))
    }

    async fn setup_headers(&self, info: &RelayInfo, headers: &mut Headers) -> RelayResult<()> {
        auth_extractor::set_bearer(headers, &info.api_key);
        auth_extractor::set_content_type_json(headers);
        auth_extractor::set_accept(headers, info.is_stream);
        Ok(())
    }

    async fn convert_request(
        &self,
        info: &RelayInfo,
        request: Option<&ChatCompletionRequest>,
    ) -> RelayResult<Bytes> {
        let mut body = request::transform_request(require_request(request)?);
        body.model.clone_from(&info.upstream_model_name);
        encode_json(&body)
    }

    async fn handle_response(
        &self,
        info: &mut RelayInfo,
        upstream: UpstreamHttpResponse,
        downstream: &DownstreamSender,
    ) -> RelayResult<UsageCounters> {
        if info.is_stream {
            let translator = ChunkPassthrough::new(info);
            return relay_stream(info, expect_stream(upstream.body), translator, downstream).await;
        }

        let body = upstream.body.collect().await;
        let parsed: ScholarAiTextResponse = decode_json(&body)?;
        info.set_first_response_time();
        let completion_tokens =
            count_text_tokens(&info.upstream_model_name, &response::response_text(&parsed));
        let usage = UsageCounters::new(info.prompt_tokens, completion_tokens);

        let converted = response::transform_response(parsed, usage.into());
        let payload = serde_json::to_vec(&converted)
            .map_err(|err| RelayError::decode("marshal_response_body_failed", err.to_string()))?;
        forward(downstream, Bytes::from(payload)).await?;
        Ok(usage)
    }
}
