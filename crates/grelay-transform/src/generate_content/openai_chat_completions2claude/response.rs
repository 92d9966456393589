use grelay_protocol::claude::{ClaudeResponse, ClaudeUsage};
use grelay_protocol::openai::{
    ChatCompletionChoice, ChatCompletionResponse, OBJECT_CHAT_COMPLETION, ROLE_ASSISTANT,
    ResponseMessage, Usage,
};

/// Convert a Claude message response into an OpenAI chat-completions response.
pub fn transform_response(response: ClaudeResponse, created: i64) -> ChatCompletionResponse {
    let text: String = response
        .content
        .iter()
        .filter(|block| block.r#type == "text")
        .map(|block| block.text.as_str())
        .collect();

    let choice = ChatCompletionChoice {
        index: 0,
        message: ResponseMessage {
            role: ROLE_ASSISTANT.to_string(),
            content: Some(text),
        },
        finish_reason: response.stop_reason.as_deref().map(map_finish_reason),
    };

    ChatCompletionResponse {
        id: response.id,
        object: OBJECT_CHAT_COMPLETION.to_string(),
        created,
        model: response.model,
        choices: vec![choice],
        usage: map_usage(response.usage),
        system_fingerprint: None,
    }
}

pub fn map_finish_reason(stop_reason: &str) -> String {
    match stop_reason {
        "end_turn" | "stop_sequence" => "stop",
        "max_tokens" => "length",
        "tool_use" => "tool_calls",
        "refusal" => "content_filter",
        other => other,
    }
    .to_string()
}

pub fn map_usage(usage: ClaudeUsage) -> Usage {
    Usage {
        prompt_tokens: usage.input_tokens,
        completion_tokens: usage.output_tokens,
        total_tokens: usage.input_tokens.saturating_add(usage.output_tokens),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_blocks_and_usage_are_mapped() {
        let response: ClaudeResponse = serde_json::from_value(serde_json::json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-haiku-20240307",
            "content": [
                {"type": "text", "text": "Hello"},
                {"type": "text", "text": ", world"}
            ],
            "stop_reason": "max_tokens",
            "usage": {"input_tokens": 12, "output_tokens": 5}
        }))
        .unwrap();

        let out = transform_response(response, 1_700_000_000);
        assert_eq!(out.id, "msg_1");
        assert_eq!(out.created, 1_700_000_000);
        assert_eq!(out.choices[0].message.content.as_deref(), Some("Hello, world"));
        assert_eq!(out.choices[0].finish_reason.as_deref(), Some("length"));
        assert_eq!(
            out.usage,
            Usage {
                prompt_tokens: 12,
                completion_tokens: 5,
                total_tokens: 17
            }
        );
    }

    #[test]
    fn stop_reasons() {
        assert_eq!(map_finish_reason("end_turn"), "stop");
        assert_eq!(map_finish_reason("stop_sequence"), "stop");
        assert_eq!(map_finish_reason("tool_use"), "tool_calls");
        assert_eq!(map_finish_reason("pause_turn"), "pause_turn");
    }

    #[test]
    fn usage_total_saturates() {
        let usage = map_usage(ClaudeUsage {
            input_tokens: u64::MAX,
            output_tokens: 1,
        });
        assert_eq!(usage.prompt_tokens, u64::MAX);
        assert_eq!(usage.completion_tokens, 1);
        assert_eq!(usage.total_tokens, u64::MAX);
    }
}
