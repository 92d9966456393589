//! ScholarAI simplified chat API.

pub mod request;
pub mod response;

pub use request::{ScholarAiChatRequest, ScholarAiMessage};
pub use response::{ScholarAiChoice, ScholarAiTextResponse};
