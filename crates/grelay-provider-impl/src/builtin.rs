use std::sync::Arc;

use grelay_common::RelayConfig;
use grelay_provider_core::{AdaptorRegistry, ApiType, CredentialCache, channel_type};

use crate::http_client::HttpClientPool;
use crate::image::ImageFetcher;
use crate::providers::claude::ClaudeAdaptor;
use crate::providers::doubao::DoubaoAdaptor;
use crate::providers::openai::OpenAiAdaptor;
use crate::providers::scholarai::ScholarAiAdaptor;
use crate::providers::vertex_claude::{ServiceAccountExchanger, VertexClaudeAdaptor};

/// Registers every built-in adaptor.
///
/// Channels whose API type resolves to OpenAI share the passthrough; Doubao
/// is keyed by channel because it shares that API type.
pub fn builtin_adaptors(
    pool: Arc<HttpClientPool>,
    credentials: Arc<CredentialCache>,
    vertex_location: &str,
) -> AdaptorRegistry {
    let images = Arc::new(ImageFetcher::new(pool));
    let mut registry = AdaptorRegistry::new();
    registry.register_api_type(ApiType::OpenAI, Arc::new(OpenAiAdaptor::new()));
    registry.register_api_type(ApiType::Anthropic, Arc::new(ClaudeAdaptor::new(images.clone())));
    registry.register_api_type(
        ApiType::VertexClaude,
        Arc::new(VertexClaudeAdaptor::new(credentials, images, vertex_location)),
    );
    registry.register_api_type(ApiType::ScholarAI, Arc::new(ScholarAiAdaptor::new()));
    registry.register_channel(channel_type::DOUBAO, Arc::new(DoubaoAdaptor::new()));
    registry
}

/// Built-in adaptors with a service-account credential cache from `config`.
pub fn default_registry(pool: Arc<HttpClientPool>, config: &RelayConfig) -> AdaptorRegistry {
    let exchanger = Arc::new(ServiceAccountExchanger::new(pool.clone()));
    let credentials = Arc::new(CredentialCache::from_config(exchanger, config));
    builtin_adaptors(pool, credentials, &config.vertex_location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubao_wins_over_openai_passthrough() {
        let config = RelayConfig::default();
        let registry = default_registry(Arc::new(HttpClientPool::from_config(&config)), &config);
        let (api_type, _) = ApiType::from_channel_type(channel_type::DOUBAO);
        assert_eq!(registry.get(channel_type::DOUBAO, api_type).unwrap().name(), "doubao");
        let (api_type, _) = ApiType::from_channel_type(channel_type::MOONSHOT);
        assert_eq!(registry.get(channel_type::MOONSHOT, api_type).unwrap().name(), "openai");
        let (api_type, _) = ApiType::from_channel_type(channel_type::VERTEX_CLAUDE);
        assert_eq!(
            registry.get(channel_type::VERTEX_CLAUDE, api_type).unwrap().name(),
            "vertex_claude"
        );
    }
}
