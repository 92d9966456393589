use serde::{Deserialize, Serialize};

use crate::claude::types::{ClaudeError, ClaudeUsage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaudeResponse {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub r#type: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Vec<ClaudeResponseBlock>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
    #[serde(default)]
    pub usage: ClaudeUsage,
    /// Present when `type == "error"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ClaudeError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaudeResponseBlock {
    #[serde(rename = "type")]
    pub r#type: String,
    #[serde(default)]
    pub text: String,
}
