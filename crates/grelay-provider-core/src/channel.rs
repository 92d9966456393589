use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Numeric channel type identifiers.
pub mod channel_type {
    pub const UNKNOWN: i32 = 0;
    pub const OPENAI: i32 = 1;
    pub const MIDJOURNEY: i32 = 2;
    pub const AZURE: i32 = 3;
    pub const OLLAMA: i32 = 4;
    pub const MIDJOURNEY_PLUS: i32 = 5;
    pub const OPENAI_MAX: i32 = 6;
    pub const OH_MY_GPT: i32 = 7;
    pub const CUSTOM: i32 = 8;
    pub const AILS: i32 = 9;
    pub const AI_PROXY: i32 = 10;
    pub const PALM: i32 = 11;
    pub const API2GPT: i32 = 12;
    pub const AIGC2D: i32 = 13;
    pub const ANTHROPIC: i32 = 14;
    pub const BAIDU: i32 = 15;
    pub const ZHIPU: i32 = 16;
    pub const ALI: i32 = 17;
    pub const XUNFEI: i32 = 18;
    pub const AI360: i32 = 19;
    pub const OPEN_ROUTER: i32 = 20;
    pub const AI_PROXY_LIBRARY: i32 = 21;
    pub const FAST_GPT: i32 = 22;
    pub const TENCENT: i32 = 23;
    pub const GEMINI: i32 = 24;
    pub const MOONSHOT: i32 = 25;
    pub const ZHIPU_V4: i32 = 26;
    pub const PERPLEXITY: i32 = 27;
    pub const LING_YI_WAN_WU: i32 = 31;
    pub const AWS: i32 = 33;
    pub const COHERE: i32 = 34;
    pub const MINIMAX: i32 = 35;
    pub const SUNO_API: i32 = 36;
    pub const DIFY: i32 = 37;
    pub const JINA: i32 = 38;
    pub const CLOUDFLARE: i32 = 39;
    pub const SILICON_FLOW: i32 = 40;

    pub const SCHOLAR_AI: i32 = 10001;
    pub const DOUBAO: i32 = 10002;
    pub const VERTEX_CLAUDE: i32 = 10003;
}

/// A configured upstream endpoint family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub channel_type: i32,
    /// Default base URL; empty when the channel has no usable default and
    /// every deployment must supply its own.
    pub base_url: String,
}

impl Channel {
    pub fn new(channel_type: i32, base_url: impl Into<String>) -> Self {
        Self {
            channel_type,
            base_url: base_url.into(),
        }
    }
}

/// Channels known at build time, with their default base URLs.
pub fn builtin_channels() -> Vec<Channel> {
    use channel_type::*;

    [
        (UNKNOWN, ""),
        (OPENAI, "https://api.openai.com"),
        (MIDJOURNEY, "https://oa.api2d.net"),
        (AZURE, ""),
        (OLLAMA, "http://localhost:11434"),
        (MIDJOURNEY_PLUS, "https://api.openai-sb.com"),
        (OPENAI_MAX, "https://api.openaimax.com"),
        (OH_MY_GPT, "https://api.ohmygpt.com"),
        (CUSTOM, ""),
        (AILS, "https://api.caipacity.com"),
        (AI_PROXY, "https://api.aiproxy.io"),
        (PALM, ""),
        (API2GPT, "https://api.api2gpt.com"),
        (AIGC2D, "https://api.aigc2d.com"),
        (ANTHROPIC, "https://api.anthropic.com"),
        (BAIDU, "https://aip.baidubce.com"),
        (ZHIPU, "https://open.bigmodel.cn"),
        (ALI, "https://dashscope.aliyuncs.com"),
        (XUNFEI, ""),
        (AI360, "https://ai.360.cn"),
        (OPEN_ROUTER, "https://openrouter.ai/api"),
        (AI_PROXY_LIBRARY, "https://api.aiproxy.io"),
        (FAST_GPT, "https://fastgpt.run/api/openapi"),
        (TENCENT, "https://hunyuan.cloud.tencent.com"),
        (GEMINI, "https://generativelanguage.googleapis.com"),
        (MOONSHOT, "https://api.moonshot.cn"),
        (ZHIPU_V4, "https://open.bigmodel.cn"),
        (PERPLEXITY, "https://api.perplexity.ai"),
        (LING_YI_WAN_WU, "https://api.lingyiwanwu.com"),
        (AWS, ""),
        (COHERE, "https://api.cohere.ai"),
        (MINIMAX, "https://api.minimax.chat"),
        (SUNO_API, ""),
        (DIFY, ""),
        (JINA, "https://api.jina.ai"),
        (CLOUDFLARE, "https://api.cloudflare.com"),
        (SILICON_FLOW, "https://api.siliconflow.cn"),
        (SCHOLAR_AI, "https://api.scholarai.io"),
        (DOUBAO, "https://ark.cn-beijing.volces.com"),
        (VERTEX_CLAUDE, "https://us-east5-aiplatform.googleapis.com"),
    ]
    .into_iter()
    .map(|(channel_type, base_url)| Channel::new(channel_type, base_url))
    .collect()
}

/// Channel type → channel table.
///
/// Loaded once at startup and read concurrently afterwards. `load` swaps the
/// whole table under the write lock, so readers never see a partial table.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: RwLock<HashMap<i32, Channel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.load(builtin_channels());
        registry
    }

    pub fn load(&self, channels: impl IntoIterator<Item = Channel>) {
        let table: HashMap<i32, Channel> = channels
            .into_iter()
            .map(|channel| (channel.channel_type, channel))
            .collect();
        let mut guard = self
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = table;
    }

    pub fn lookup(&self, channel_type: i32) -> Option<Channel> {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&channel_type)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
