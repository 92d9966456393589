//! OpenAI chat-completions downstream, Claude messages upstream.

pub mod request;
pub mod response;
pub mod stream;
