mod oauth;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use grelay_protocol::claude::VertexClaudeRequest;
use grelay_protocol::openai::ChatCompletionRequest;
use grelay_provider_core::{
    Adaptor, CredentialCache, DownstreamSender, Headers, RelayError, RelayInfo, RelayResult,
    UpstreamHttpResponse, UsageCounters,
};

pub use oauth::ServiceAccountExchanger;

use super::claude::{convert_to_claude, handle_claude_response};
use super::encode_json;
use crate::auth_extractor;
use crate::image::ImageFetcher;

/// Public model id → Vertex publisher model id.
const MODEL_REDIRECTS: &[(&str, &str)] = &[
    ("claude-3-opus-20240229", "claude-3-opus@20240229"),
    ("claude-3-sonnet-20240229", "claude-3-sonnet@20240229"),
    ("claude-3-haiku-20240307", "claude-3-haiku@20240307"),
    ("claude-3-5-sonnet-20240620", "claude-3-5-sonnet@20240620"),
];

/// Claude served through Vertex AI (`streamRawPredict`).
///
/// The channel key is `projectId|serviceAccountJSON`; the JSON half is traded
/// for a bearer token through the shared credential cache.
pub struct VertexClaudeAdaptor {
    credentials: Arc<CredentialCache>,
    images: Arc<ImageFetcher>,
    location: String,
}

impl VertexClaudeAdaptor {
    pub fn new(
        credentials: Arc<CredentialCache>,
        images: Arc<ImageFetcher>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            images,
            location: location.into(),
        }
    }
}

#[async_trait]
impl Adaptor for VertexClaudeAdaptor {
    fn name(&self) -> &'static str {
        "vertex_claude"
    }

    fn init(&self, info: &mut RelayInfo, _request: &ChatCompletionRequest) -> RelayResult<()> {
        info.upstream_model_name = redirect_model(&info.request_model_name)?.to_string();
        Ok(())
    }

    fn build_request_url(&self, info: &RelayInfo) -> RelayResult<String> {
        let model = redirect_model(&info.request_model_name)?;
        let (project_id, _) = split_key(&info.api_key)?;
        let location = &self.location;
        Ok(format!(
            "https://{location}-aiplatform.googleapis.com/v1/projects/{project_id}/locations/{location}/publishers/anthropic/models/{model}:streamRawPredict"
        ))
    }

    async fn setup_headers(&self, info: &RelayInfo, headers: &mut Headers) -> RelayResult<()> {
        let (_, service_account) = split_key(&info.api_key)?;
        let token = self
            .credentials
            .resolve(service_account, info.proxy.as_deref())
            .await?;
        auth_extractor::set_bearer(headers, &token);
        auth_extractor::set_content_type_json(headers);
        auth_extractor::set_accept(headers, info.is_stream);
        Ok(())
    }

    async fn convert_request(
        &self,
        info: &RelayInfo,
        request: Option<&ChatCompletionRequest>,
    ) -> RelayResult<Bytes> {
        let body = convert_to_claude(&self.images, info, request).await?;
        encode_json(&VertexClaudeRequest::from(body))
    }

    async fn handle_response(
        &self,
        info: &mut RelayInfo,
        response: UpstreamHttpResponse,
        downstream: &DownstreamSender,
    ) -> RelayResult<UsageCounters> {
        handle_claude_response(info, response, downstream).await
    }

    fn model_list(&self) -> Vec<String> {
        MODEL_REDIRECTS
            .iter()
            .map(|(model, _)| model.to_string())
            .collect()
    }
}

fn redirect_model(model: &str) -> RelayResult<&'static str> {
    MODEL_REDIRECTS
        .iter()
        .find(|(public, _)| *public == model)
        .map(|(_, vertex)| *vertex)
        .ok_or_else(|| RelayError::config("model_not_found", format!("model {model} not found")))
}

/// `projectId|serviceAccountJSON` → (project id, JSON).
fn split_key(api_key: &str) -> RelayResult<(&str, &str)> {
    api_key
        .split_once('|')
        .map(|(project, json)| (project.trim(), json.trim()))
        .filter(|(project, json)| !project.is_empty() && !json.is_empty())
        .ok_or_else(|| {
            RelayError::config(
                "invalid_api_key",
                "vertex key must be `projectId|serviceAccountJSON`",
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_models_are_redirected() {
        assert_eq!(
            redirect_model("claude-3-5-sonnet-20240620").unwrap(),
            "claude-3-5-sonnet@20240620"
        );
        assert_eq!(
            redirect_model("claude-2.1").unwrap_err().code(),
            "model_not_found"
        );
    }

    fn adaptor() -> VertexClaudeAdaptor {
        let config = grelay_common::RelayConfig::default();
        let pool = Arc::new(crate::http_client::HttpClientPool::from_config(&config));
        let credentials = Arc::new(CredentialCache::from_config(
            Arc::new(ServiceAccountExchanger::new(pool.clone())),
            &config,
        ));
        VertexClaudeAdaptor::new(credentials, Arc::new(ImageFetcher::new(pool)), "us-east5")
    }

    fn info(model: &str) -> RelayInfo {
        let mut info = RelayInfo::build(
            grelay_provider_core::RelayMeta {
                channel_type: grelay_provider_core::channel_type::VERTEX_CLAUDE,
                api_key: "proj|{}".to_string(),
                ..Default::default()
            },
            &grelay_provider_core::ChannelRegistry::with_builtin(),
        )
        .unwrap();
        info.bind_request(&ChatCompletionRequest::new(
            model,
            vec![grelay_protocol::openai::ChatMessage::text("user", "hi")],
        ));
        info
    }

    #[test]
    fn url_redirects_model_without_init() {
        let url = adaptor()
            .build_request_url(&info("claude-3-haiku-20240307"))
            .unwrap();
        assert!(url.ends_with("/projects/proj/locations/us-east5/publishers/anthropic/models/claude-3-haiku@20240307:streamRawPredict"));

        let err = adaptor().build_request_url(&info("gpt-4o")).unwrap_err();
        assert_eq!(err.code(), "model_not_found");
    }

    #[test]
    fn key_needs_both_halves() {
        assert_eq!(split_key(" proj | {} ").unwrap(), ("proj", "{}"));
        assert_eq!(split_key("proj").unwrap_err().code(), "invalid_api_key");
        assert_eq!(split_key("|{}").unwrap_err().code(), "invalid_api_key");
    }
}
