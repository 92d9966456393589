use serde::{Deserialize, Serialize};

use crate::openai::types::{JsonObject, OBJECT_CHAT_COMPLETION_CHUNK, Usage};

/// One incremental `chat.completion.chunk` frame.
///
/// Every field is defaulted so frames from upstreams that omit `id`/`model`
/// on later chunks still decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub id: String,
    #[serde(default = "default_object")]
    pub object: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl ChatCompletionChunk {
    pub fn with_delta(delta: ChunkDelta, finish_reason: Option<String>) -> Self {
        Self {
            object: default_object(),
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason,
            }],
            ..Default::default()
        }
    }

    /// Concatenated delta text across all choices.
    pub fn delta_text(&self) -> String {
        self.choices
            .iter()
            .filter_map(|choice| choice.delta.content.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

fn default_object() -> String {
    OBJECT_CHAT_COMPLETION_CHUNK.to_string()
}
