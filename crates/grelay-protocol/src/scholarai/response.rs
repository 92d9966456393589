use serde::{Deserialize, Serialize};

use crate::scholarai::request::ScholarAiMessage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScholarAiChoice {
    #[serde(default)]
    pub index: u32,
    pub message: ScholarAiMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScholarAiTextResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<ScholarAiChoice>,
    #[serde(default)]
    pub system_fingerprint: Option<String>,
}
