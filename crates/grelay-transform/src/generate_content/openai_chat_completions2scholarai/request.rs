use grelay_protocol::openai::{ChatCompletionRequest, ROLE_USER};
use grelay_protocol::scholarai::{ScholarAiChatRequest, ScholarAiMessage};

/// Flatten an OpenAI conversation into ScholarAI's single-message form.
///
/// Each turn becomes a `"{role}: {content}\n"` line of one user message.
pub fn transform_request(request: &ChatCompletionRequest) -> ScholarAiChatRequest {
    let mut transcript = String::new();
    for message in &request.messages {
        let role = if message.role.is_empty() {
            ROLE_USER
        } else {
            message.role.as_str()
        };
        transcript.push_str(role);
        transcript.push_str(": ");
        transcript.push_str(&message.text_content());
        transcript.push('\n');
    }

    ScholarAiChatRequest {
        model: request.model.clone(),
        messages: vec![ScholarAiMessage {
            role: ROLE_USER.to_string(),
            content: transcript,
        }],
        stream: request.stream,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grelay_protocol::openai::ChatMessage;

    #[test]
    fn conversation_is_flattened_into_one_user_turn() {
        let mut request = ChatCompletionRequest::new(
            "scholar",
            vec![
                ChatMessage::text("system", "cite sources"),
                ChatMessage::text("user", "what is RNA?"),
                ChatMessage::text("assistant", "a molecule"),
            ],
        );
        request.stream = true;
        let out = transform_request(&request);
        assert!(out.stream);
        assert_eq!(out.messages.len(), 1);
        assert_eq!(out.messages[0].role, "user");
        assert_eq!(
            out.messages[0].content,
            "system: cite sources\nuser: what is RNA?\nassistant: a molecule\n"
        );
    }
}
