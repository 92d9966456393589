pub mod error;
pub mod request;
pub mod response;
pub mod stream;
pub mod types;

pub use error::{ErrorBody, ErrorEnvelope};
pub use request::{ChatCompletionRequest, StopSequences, StreamOptions};
pub use response::{ChatCompletionChoice, ChatCompletionResponse, ResponseMessage};
pub use stream::{ChatCompletionChunk, ChunkChoice, ChunkDelta};
pub use types::*;
