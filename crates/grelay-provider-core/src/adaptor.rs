use async_trait::async_trait;
use bytes::Bytes;
use grelay_protocol::openai::ChatCompletionRequest;
use tokio::sync::mpsc;

use crate::errors::{RelayError, RelayResult};
use crate::headers::Headers;
use crate::relay_info::RelayInfo;
use crate::upstream::{UpstreamClient, UpstreamHttpRequest, UpstreamHttpResponse};
use crate::usage::UsageCounters;

/// Where translated output goes: one JSON body, or one encoded `data:`
/// record per message when streaming.
pub type DownstreamSender = mpsc::Sender<Bytes>;

/// Per-provider strategy: URL, headers, body conversion, response decoding.
#[async_trait]
pub trait Adaptor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Adjusts relay state before the request is built (model rewrites, ...).
    fn init(&self, _info: &mut RelayInfo, _request: &ChatCompletionRequest) -> RelayResult<()> {
        Ok(())
    }

    fn build_request_url(&self, info: &RelayInfo) -> RelayResult<String>;

    /// Adds auth and content headers; may resolve credentials.
    async fn setup_headers(&self, info: &RelayInfo, headers: &mut Headers) -> RelayResult<()>;

    /// Canonical request → provider body.
    async fn convert_request(
        &self,
        info: &RelayInfo,
        request: Option<&ChatCompletionRequest>,
    ) -> RelayResult<Bytes>;

    async fn send(
        &self,
        client: &dyn UpstreamClient,
        _info: &RelayInfo,
        request: UpstreamHttpRequest,
    ) -> RelayResult<UpstreamHttpResponse> {
        client.send(request).await
    }

    /// Decodes a successful upstream reply into canonical output, single-shot
    /// or streaming depending on `info.is_stream`.
    async fn handle_response(
        &self,
        info: &mut RelayInfo,
        response: UpstreamHttpResponse,
        downstream: &DownstreamSender,
    ) -> RelayResult<UsageCounters>;

    /// Model ids this adaptor knows how to serve.
    fn model_list(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Shared guard for `convert_request` implementations.
pub fn require_request(
    request: Option<&ChatCompletionRequest>,
) -> RelayResult<&ChatCompletionRequest> {
    request.ok_or_else(|| RelayError::invalid_request("request_body_missing", "request is empty"))
}

/// Sends one message downstream; a closed receiver means the client is gone.
pub async fn forward(downstream: &DownstreamSender, payload: Bytes) -> RelayResult<()> {
    downstream
        .send(payload)
        .await
        .map_err(|_| RelayError::transport("downstream_closed", "downstream receiver dropped"))
}
