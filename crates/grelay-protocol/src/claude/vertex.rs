use serde::{Deserialize, Serialize};

use crate::claude::request::ClaudeMessagesRequest;
use crate::claude::types::ClaudeMessage;

pub const VERTEX_ANTHROPIC_VERSION: &str = "vertex-2023-10-16";

/// Body of `:rawPredict` / `:streamRawPredict` on Vertex AI.
///
/// Same shape as the messages API, minus `model` (it lives in the URL) and
/// plus the Vertex-specific `anthropic_version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexClaudeRequest {
    pub anthropic_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<ClaudeMessage>,
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

impl From<ClaudeMessagesRequest> for VertexClaudeRequest {
    fn from(value: ClaudeMessagesRequest) -> Self {
        Self {
            anthropic_version: VERTEX_ANTHROPIC_VERSION.to_string(),
            system: value.system,
            messages: value.messages,
            max_tokens: value.max_tokens,
            stop_sequences: value.stop_sequences,
            stream: value.stream,
            temperature: value.temperature,
            top_p: value.top_p,
            top_k: value.top_k,
        }
    }
}
