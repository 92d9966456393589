use crate::channel::channel_type;

/// Wire-protocol family spoken by a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiType {
    OpenAI,
    Anthropic,
    PaLM,
    Baidu,
    Zhipu,
    Ali,
    Xunfei,
    AIProxyLibrary,
    Tencent,
    Gemini,
    ZhipuV4,
    Ollama,
    Perplexity,
    Aws,
    Cohere,
    Dify,
    Jina,
    Cloudflare,
    ScholarAI,
    VertexClaude,
}

impl ApiType {
    /// Protocol family for a channel type.
    ///
    /// Channels without a dedicated family fall back to OpenAI; the flag is
    /// `false` in that case.
    pub fn from_channel_type(channel: i32) -> (ApiType, bool) {
        let api_type = match channel {
            channel_type::OPENAI => ApiType::OpenAI,
            channel_type::ANTHROPIC => ApiType::Anthropic,
            channel_type::BAIDU => ApiType::Baidu,
            channel_type::PALM => ApiType::PaLM,
            channel_type::ZHIPU => ApiType::Zhipu,
            channel_type::ALI => ApiType::Ali,
            channel_type::XUNFEI => ApiType::Xunfei,
            channel_type::AI_PROXY_LIBRARY => ApiType::AIProxyLibrary,
            channel_type::TENCENT => ApiType::Tencent,
            channel_type::GEMINI => ApiType::Gemini,
            channel_type::ZHIPU_V4 => ApiType::ZhipuV4,
            channel_type::OLLAMA => ApiType::Ollama,
            channel_type::PERPLEXITY => ApiType::Perplexity,
            channel_type::AWS => ApiType::Aws,
            channel_type::COHERE => ApiType::Cohere,
            channel_type::DIFY => ApiType::Dify,
            channel_type::JINA => ApiType::Jina,
            channel_type::CLOUDFLARE => ApiType::Cloudflare,
            channel_type::SCHOLAR_AI => ApiType::ScholarAI,
            channel_type::VERTEX_CLAUDE => ApiType::VertexClaude,
            _ => return (ApiType::OpenAI, false),
        };
        (api_type, true)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiType::OpenAI => "openai",
            ApiType::Anthropic => "anthropic",
            ApiType::PaLM => "palm",
            ApiType::Baidu => "baidu",
            ApiType::Zhipu => "zhipu",
            ApiType::Ali => "ali",
            ApiType::Xunfei => "xunfei",
            ApiType::AIProxyLibrary => "aiproxy_library",
            ApiType::Tencent => "tencent",
            ApiType::Gemini => "gemini",
            ApiType::ZhipuV4 => "zhipu_v4",
            ApiType::Ollama => "ollama",
            ApiType::Perplexity => "perplexity",
            ApiType::Aws => "aws",
            ApiType::Cohere => "cohere",
            ApiType::Dify => "dify",
            ApiType::Jina => "jina",
            ApiType::Cloudflare => "cloudflare",
            ApiType::ScholarAI => "scholarai",
            ApiType::VertexClaude => "vertex_claude",
        }
    }
}

/// Whether the channel accepts `stream_options.include_usage`.
pub fn supports_stream_options(channel: i32) -> bool {
    matches!(
        channel,
        channel_type::OPENAI
            | channel_type::ANTHROPIC
            | channel_type::AWS
            | channel_type::GEMINI
            | channel_type::CLOUDFLARE
            | channel_type::VERTEX_CLAUDE
            | channel_type::SCHOLAR_AI
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_channels_fall_back_to_openai() {
        assert_eq!(
            ApiType::from_channel_type(channel_type::DOUBAO),
            (ApiType::OpenAI, false)
        );
        assert_eq!(
            ApiType::from_channel_type(channel_type::MOONSHOT),
            (ApiType::OpenAI, false)
        );
        assert_eq!(
            ApiType::from_channel_type(channel_type::VERTEX_CLAUDE),
            (ApiType::VertexClaude, true)
        );
    }

    #[test]
    fn stream_options_allow_list() {
        assert!(supports_stream_options(channel_type::OPENAI));
        assert!(supports_stream_options(channel_type::SCHOLAR_AI));
        assert!(!supports_stream_options(channel_type::DOUBAO));
        assert!(!supports_stream_options(channel_type::AZURE));
    }
}
