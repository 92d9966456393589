//! OpenAI chat-completions downstream, ScholarAI upstream.

pub mod request;
pub mod response;
