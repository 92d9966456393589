//! Core relay abstractions for grelay.
//!
//! Nothing here talks to the network. Adaptors build `UpstreamHttpRequest`
//! values and decode `UpstreamHttpResponse` values; the actual IO lives behind
//! the `UpstreamClient` and `TokenExchanger` traits.

pub mod adaptor;
pub mod api_type;
pub mod channel;
pub mod credential_cache;
pub mod errors;
pub mod headers;
pub mod registry;
pub mod relay_info;
pub mod stream;
pub mod upstream;
pub mod usage;

pub use adaptor::{Adaptor, DownstreamSender};
pub use api_type::{ApiType, supports_stream_options};
pub use channel::{Channel, ChannelRegistry, builtin_channels, channel_type};
pub use credential_cache::{AccessToken, CredentialCache, TokenExchanger};
pub use errors::{RelayError, RelayResult};
pub use headers::{Headers, header_get, header_remove, header_set};
pub use registry::AdaptorRegistry;
pub use relay_info::{RelayInfo, RelayMeta, RelayMode};
pub use stream::{StreamTranslator, Translated, relay_stream};
pub use upstream::{
    ByteStream, HttpMethod, UpstreamBody, UpstreamClient, UpstreamHttpRequest,
    UpstreamHttpResponse,
};
pub use usage::UsageCounters;
