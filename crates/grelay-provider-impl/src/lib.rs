//! Built-in adaptors and the IO around them.
//!
//! `Relay` ties the pieces together: it builds the relay context, picks the
//! adaptor, performs the upstream call through `WreqUpstreamClient` and
//! streams canonical output back to the caller.

mod auth_extractor;
mod builtin;
mod client;
mod http_client;
mod image;
mod providers;
mod relay;
mod tokenizer;

pub use builtin::{builtin_adaptors, default_registry};
pub use client::WreqUpstreamClient;
pub use http_client::{ClientKind, HttpClientPool};
pub use image::ImageFetcher;
pub use providers::claude::ClaudeAdaptor;
pub use providers::doubao::DoubaoAdaptor;
pub use providers::openai::OpenAiAdaptor;
pub use providers::scholarai::ScholarAiAdaptor;
pub use providers::vertex_claude::{ServiceAccountExchanger, VertexClaudeAdaptor};
pub use relay::Relay;
pub use tokenizer::{count_message_tokens, count_text_tokens};
