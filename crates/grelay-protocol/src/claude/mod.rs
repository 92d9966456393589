pub mod request;
pub mod response;
pub mod stream;
pub mod types;
pub mod vertex;

pub use request::ClaudeMessagesRequest;
pub use response::{ClaudeResponse, ClaudeResponseBlock};
pub use stream::{ClaudeBlockDelta, ClaudeMessageDelta, ClaudeStreamEvent, ClaudeStreamMessage};
pub use types::*;
pub use vertex::{VERTEX_ANTHROPIC_VERSION, VertexClaudeRequest};
