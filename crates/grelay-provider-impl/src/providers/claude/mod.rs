use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use grelay_protocol::claude::{ANTHROPIC_VERSION, ClaudeMessagesRequest, ClaudeResponse, ClaudeStreamEvent};
use grelay_protocol::openai::{ChatCompletionRequest, ErrorBody, ErrorEnvelope};
use grelay_provider_core::adaptor::{forward, require_request};
use grelay_provider_core::{
    Adaptor, DownstreamSender, Headers, RelayError, RelayInfo, RelayResult, StreamTranslator,
    Translated, UpstreamHttpResponse, UsageCounters, relay_stream,
};
use grelay_transform::generate_content::openai_chat_completions2claude::{request, response, stream};
use tracing::warn;

use super::{build_url, decode_json, encode_json, expect_stream, now_unix};
use crate::auth_extractor;
use crate::image::ImageFetcher;

/// Anthropic messages API.
#[derive(Debug, Clone)]
pub struct ClaudeAdaptor {
    images: Arc<ImageFetcher>,
}

impl ClaudeAdaptor {
    pub fn new(images: Arc<ImageFetcher>) -> Self {
        Self { images }
    }
}

#[async_trait]
impl Adaptor for ClaudeAdaptor {
    fn name(&self) -> &'static str {
        "claude"
    }

    fn build_request_url(&self, info: &RelayInfo) -> RelayResult<String> {
        Ok(build_url(&info.base_url, "/v1/messages"))
    }

    async fn setup_headers(&self, info: &RelayInfo, headers: &mut Headers) -> RelayResult<()> {
        auth_extractor::set_header(headers, "x-api-key", &info.api_key);
        auth_extractor::set_header(headers, "anthropic-version", ANTHROPIC_VERSION);
        auth_extractor::set_content_type_json(headers);
        auth_extractor::set_accept(headers, info.is_stream);
        Ok(())
    }

    async fn convert_request(
        &self,
        info: &RelayInfo,
        request: Option<&ChatCompletionRequest>,
    ) -> RelayResult<Bytes> {
        let mut body = convert_to_claude(&self.images, info, request).await?;
        body.model.clone_from(&info.upstream_model_name);
        encode_json(&body)
    }

    async fn handle_response(
        &self,
        info: &mut RelayInfo,
        response: UpstreamHttpResponse,
        downstream: &DownstreamSender,
    ) -> RelayResult<UsageCounters> {
        handle_claude_response(info, response, downstream).await
    }
}

/// Fetches referenced images and maps the request to the messages format.
pub(crate) async fn convert_to_claude(
    images: &ImageFetcher,
    info: &RelayInfo,
    request: Option<&ChatCompletionRequest>,
) -> RelayResult<ClaudeMessagesRequest> {
    let request = require_request(request)?;
    let resolved = images.resolve_all(request, info.proxy.as_deref()).await?;
    let mut body = request::transform_request(request, &resolved)?;
    body.stream = info.is_stream;
    Ok(body)
}

/// Decodes a Claude reply (single-shot or stream) into OpenAI output.
pub(crate) async fn handle_claude_response(
    info: &mut RelayInfo,
    upstream: UpstreamHttpResponse,
    downstream: &DownstreamSender,
) -> RelayResult<UsageCounters> {
    if info.is_stream {
        return relay_stream(
            info,
            expect_stream(upstream.body),
            ClaudeStreamTranslator::new(info.request_id.clone()),
            downstream,
        )
        .await;
    }

    let body = upstream.body.collect().await;
    let parsed: ClaudeResponse = decode_json(&body)?;
    info.set_first_response_time();
    if let Some(error) = parsed.error.as_ref().filter(|error| !error.r#type.is_empty()) {
        return Err(upstream_error(&error.r#type, &error.message));
    }

    let usage = UsageCounters::from(response::map_usage(parsed.usage));
    let converted = response::transform_response(parsed, now_unix());
    let payload = serde_json::to_vec(&converted)
        .map_err(|err| RelayError::decode("marshal_response_body_failed", err.to_string()))?;
    forward(downstream, Bytes::from(payload)).await?;
    Ok(usage)
}

/// A provider error delivered with a success status.
fn upstream_error(kind: &str, message: &str) -> RelayError {
    let envelope = ErrorEnvelope {
        error: ErrorBody {
            message: message.to_string(),
            r#type: kind.to_string(),
            param: None,
            code: Some(kind.to_string()),
        },
    };
    let body = serde_json::to_vec(&envelope).unwrap_or_default();
    RelayError::Upstream {
        status: http::StatusCode::BAD_GATEWAY,
        body: Bytes::from(body),
    }
}

pub(crate) struct ClaudeStreamTranslator {
    trace_id: String,
}

impl ClaudeStreamTranslator {
    pub(crate) fn new(trace_id: String) -> Self {
        Self { trace_id }
    }
}

impl StreamTranslator for ClaudeStreamTranslator {
    type Frame = ClaudeStreamEvent;

    fn translate(&mut self, frame: ClaudeStreamEvent) -> Translated {
        let output = stream::transform_stream_event(frame);
        if let Some(error) = output.error {
            warn!(
                event = "upstream_stream_error",
                trace_id = %self.trace_id,
                kind = %error.r#type,
                message = %error.message,
            );
        }
        Translated {
            chunk: output.chunk,
            usage: output
                .usage
                .map(|usage| UsageCounters::from(response::map_usage(usage))),
        }
    }
}
