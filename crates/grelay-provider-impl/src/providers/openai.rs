use async_trait::async_trait;
use bytes::Bytes;
use grelay_protocol::openai::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse};
use grelay_provider_core::adaptor::{forward, require_request};
use grelay_provider_core::{
    Adaptor, DownstreamSender, Headers, RelayInfo, RelayResult, StreamTranslator, Translated,
    UpstreamHttpResponse, UsageCounters, channel_type, relay_stream,
};

use super::{build_url, decode_json, encode_json, expect_stream};
use crate::auth_extractor;
use crate::tokenizer::count_text_tokens;

const ADAPTOR_NAME: &str = "openai";
const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Passthrough for OpenAI-compatible upstreams.
#[derive(Debug, Default)]
pub struct OpenAiAdaptor;

impl OpenAiAdaptor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Adaptor for OpenAiAdaptor {
    fn name(&self) -> &'static str {
        ADAPTOR_NAME
    }

    fn build_request_url(&self, info: &RelayInfo) -> RelayResult<String> {
        if info.channel_type == channel_type::AZURE {
            let api_version = info.api_version.as_deref().unwrap_or("2024-02-01");
            let deployment = info.upstream_model_name.replace('.', "");
            return Ok(format!(
                "{}/openai/deployments/{deployment}/chat/completions?api-version={api_version}",
                info.base_url
            ));
        }
        let path = info
            .request_path
            .split('?')
            .next()
            .filter(|path| path.starts_with("/v1/"))
            .unwrap_or(CHAT_COMPLETIONS_PATH);
        Ok(build_url(&info.base_url, path))
    }

    async fn setup_headers(&self, info: &RelayInfo, headers: &mut Headers) -> RelayResult<()> {
        if info.channel_type == channel_type::AZURE {
            auth_extractor::set_header(headers, "api-key", &info.api_key);
        } else {
            auth_extractor::set_bearer(headers, &info.api_key);
        }
        if let Some(organization) = info.organization.as_deref() {
            auth_extractor::set_header(headers, "OpenAI-Organization", organization);
        }
        auth_extractor::set_content_type_json(headers);
        auth_extractor::set_accept(headers, info.is_stream);
        Ok(())
    }

    async fn convert_request(
        &self,
        info: &RelayInfo,
        request: Option<&ChatCompletionRequest>,
    ) -> RelayResult<Bytes> {
        let mut request = require_request(request)?.clone();
        request.model.clone_from(&info.upstream_model_name);
        if !info.support_stream_options || !request.stream {
            request.stream_options = None;
        }
        encode_json(&request)
    }

    async fn handle_response(
        &self,
        info: &mut RelayInfo,
        response: UpstreamHttpResponse,
        downstream: &DownstreamSender,
    ) -> RelayResult<UsageCounters> {
        if info.is_stream {
            let translator = ChunkPassthrough::new(info);
            return relay_stream(info, expect_stream(response.body), translator, downstream).await;
        }

        let body = response.body.collect().await;
        let parsed: ChatCompletionResponse = decode_json(&body)?;
        info.set_first_response_time();
        let mut usage = UsageCounters::from(parsed.usage);
        if usage.is_empty() {
            let text: String = parsed
                .choices
                .iter()
                .filter_map(|choice| choice.message.content.as_deref())
                .collect();
            usage = UsageCounters::new(
                info.prompt_tokens,
                count_text_tokens(&info.upstream_model_name, &text),
            );
        }
        forward(downstream, body).await?;
        Ok(usage)
    }
}

/// Forwards OpenAI-format chunks unchanged and tracks usage.
///
/// Usage-only chunks are absorbed; the demux re-emits the totals at the end
/// when the client asked for them. Without upstream usage, completion tokens
/// are counted from the streamed text.
pub(crate) struct ChunkPassthrough {
    model: String,
    prompt_tokens: u64,
    text: String,
    reported: bool,
}

impl ChunkPassthrough {
    pub(crate) fn new(info: &RelayInfo) -> Self {
        Self {
            model: info.upstream_model_name.clone(),
            prompt_tokens: info.prompt_tokens,
            text: String::new(),
            reported: false,
        }
    }
}

impl StreamTranslator for ChunkPassthrough {
    type Frame = ChatCompletionChunk;

    fn translate(&mut self, mut frame: ChatCompletionChunk) -> Translated {
        self.text.push_str(&frame.delta_text());
        let usage = frame.usage.take().map(|usage| {
            self.reported = true;
            UsageCounters::from(usage)
        });
        if frame.choices.is_empty() && usage.is_some() {
            return Translated { chunk: None, usage };
        }
        Translated {
            chunk: Some(frame),
            usage,
        }
    }

    fn finish(&mut self, usage: &mut UsageCounters) {
        if !self.reported {
            usage.add(UsageCounters::new(
                self.prompt_tokens,
                count_text_tokens(&self.model, &self.text),
            ));
        }
    }
}
