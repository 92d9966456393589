use grelay_protocol::openai::{
    ChatCompletionChoice, ChatCompletionResponse, OBJECT_CHAT_COMPLETION, ResponseMessage, Usage,
};
use grelay_protocol::scholarai::ScholarAiTextResponse;

/// Convert a ScholarAI response; ScholarAI reports no usage, so the caller supplies it.
pub fn transform_response(response: ScholarAiTextResponse, usage: Usage) -> ChatCompletionResponse {
    let choices = response
        .choices
        .into_iter()
        .map(|choice| ChatCompletionChoice {
            index: choice.index,
            message: ResponseMessage {
                role: choice.message.role,
                content: Some(choice.message.content),
            },
            finish_reason: choice.finish_reason,
        })
        .collect();

    ChatCompletionResponse {
        id: response.id,
        object: if response.object.is_empty() {
            OBJECT_CHAT_COMPLETION.to_string()
        } else {
            response.object
        },
        created: response.created,
        model: response.model,
        choices,
        usage,
        system_fingerprint: response.system_fingerprint,
    }
}

/// Text of all choices, used for completion token counting.
pub fn response_text(response: &ScholarAiTextResponse) -> String {
    response
        .choices
        .iter()
        .map(|choice| choice.message.content.as_str())
        .collect()
}
