use grelay_protocol::claude::{ClaudeBlockDelta, ClaudeError, ClaudeStreamEvent, ClaudeUsage};
use grelay_protocol::openai::{ChatCompletionChunk, ChunkDelta, ROLE_ASSISTANT};

use super::response::map_finish_reason;

/// What one Claude stream event contributes downstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamEventOutput {
    /// Chunk to forward; `id`/`created` are left for the caller to stamp.
    pub chunk: Option<ChatCompletionChunk>,
    /// Token counts reported by this event, to be summed by the caller.
    pub usage: Option<ClaudeUsage>,
    pub error: Option<ClaudeError>,
}

/// Convert a single Claude stream event into an OpenAI chunk.
///
/// Events that carry nothing for the client (`ping`, block start/stop,
/// `message_stop`, tool-input deltas) yield an empty output.
pub fn transform_stream_event(event: ClaudeStreamEvent) -> StreamEventOutput {
    match event {
        ClaudeStreamEvent::MessageStart { message } => {
            let mut chunk = ChatCompletionChunk::with_delta(
                ChunkDelta {
                    role: Some(ROLE_ASSISTANT.to_string()),
                    content: Some(String::new()),
                    ..Default::default()
                },
                None,
            );
            chunk.id = message.id;
            chunk.model = message.model;
            StreamEventOutput {
                chunk: Some(chunk),
                usage: Some(message.usage),
                error: None,
            }
        }
        ClaudeStreamEvent::ContentBlockDelta {
            delta: ClaudeBlockDelta::TextDelta { text },
            ..
        } => StreamEventOutput {
            chunk: Some(ChatCompletionChunk::with_delta(
                ChunkDelta {
                    content: Some(text),
                    ..Default::default()
                },
                None,
            )),
            ..Default::default()
        },
        ClaudeStreamEvent::MessageDelta { delta, usage } => StreamEventOutput {
            chunk: delta.stop_reason.as_deref().map(|reason| {
                ChatCompletionChunk::with_delta(ChunkDelta::default(), Some(map_finish_reason(reason)))
            }),
            usage,
            error: None,
        },
        ClaudeStreamEvent::Error { error } => StreamEventOutput {
            error: Some(error),
            ..Default::default()
        },
        _ => StreamEventOutput::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(value: serde_json::Value) -> ClaudeStreamEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn message_start_opens_assistant_turn() {
        let out = transform_stream_event(event(serde_json::json!({
            "type": "message_start",
            "message": {
                "id": "msg_1",
                "model": "claude-3-haiku-20240307",
                "usage": {"input_tokens": 9, "output_tokens": 1}
            }
        })));
        let chunk = out.chunk.unwrap();
        assert_eq!(chunk.id, "msg_1");
        assert_eq!(chunk.choices[0].delta.role.as_deref(), Some("assistant"));
        assert_eq!(
            out.usage,
            Some(ClaudeUsage {
                input_tokens: 9,
                output_tokens: 1
            })
        );
    }

    #[test]
    fn text_delta_and_finish() {
        let out = transform_stream_event(event(serde_json::json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": {"type": "text_delta", "text": "Hi"}
        })));
        assert_eq!(out.chunk.unwrap().delta_text(), "Hi");

        let out = transform_stream_event(event(serde_json::json!({
            "type": "message_delta",
            "delta": {"stop_reason": "end_turn"},
            "usage": {"output_tokens": 7}
        })));
        assert_eq!(
            out.chunk.unwrap().choices[0].finish_reason.as_deref(),
            Some("stop")
        );
        assert_eq!(out.usage.unwrap().output_tokens, 7);
    }

    #[test]
    fn silent_events_produce_nothing() {
        for value in [
            serde_json::json!({"type": "ping"}),
            serde_json::json!({"type": "content_block_start", "index": 0}),
            serde_json::json!({"type": "message_stop"}),
            serde_json::json!({"type": "something_new"}),
        ] {
            assert_eq!(transform_stream_event(event(value)), StreamEventOutput::default());
        }
    }
}
