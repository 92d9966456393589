use grelay_protocol::claude::{
    ClaudeContent, ClaudeContentBlock, ClaudeImageSource, ClaudeMessage, ClaudeMessagesRequest,
    DEFAULT_MAX_TOKENS,
};
use grelay_protocol::openai::{
    ChatCompletionRequest, ChatMessage, ContentPart, MessageContent, ROLE_SYSTEM, ROLE_USER,
};

use crate::error::TransformError;
use crate::image::{ResolvedImages, is_remote_url, parse_data_url};

/// Stand-in for empty content; Claude rejects empty messages.
pub const EMPTY_CONTENT_PLACEHOLDER: &str = "...";

/// Convert an OpenAI chat-completions request into a Claude messages request.
///
/// Remote image URLs must already be present in `images`; inline data URLs
/// are decoded here. The caller sets `model`/`stream` for the target upstream.
pub fn transform_request(
    request: &ChatCompletionRequest,
    images: &ResolvedImages,
) -> Result<ClaudeMessagesRequest, TransformError> {
    let mut system_texts = Vec::new();
    let mut conversation = Vec::with_capacity(request.messages.len());

    for message in &request.messages {
        if message.role == ROLE_SYSTEM {
            let text = message.text_content();
            if !text.is_empty() {
                system_texts.push(text);
            }
        } else {
            conversation.push(message);
        }
    }

    let mut messages = Vec::with_capacity(conversation.len());
    for message in merge_same_role(conversation) {
        let content = map_content(message.content, images)?;
        messages.push(ClaudeMessage {
            role: message.role,
            content,
        });
    }

    let system = if system_texts.is_empty() {
        None
    } else {
        Some(system_texts.join("\n"))
    };

    Ok(ClaudeMessagesRequest {
        model: request.model.clone(),
        system,
        messages,
        max_tokens: request
            .max_tokens
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_MAX_TOKENS),
        stop_sequences: request.stop.clone().map(|stop| stop.into_vec()),
        stream: request.stream,
        temperature: request.temperature,
        top_p: request.top_p,
        top_k: request.top_k,
    })
}

/// Folds consecutive text messages of the same role into one, joined by a space.
///
/// Each message is compared against the last *emitted* one, so a run of three
/// becomes a single message. Multi-part content is never merged.
fn merge_same_role(messages: Vec<&ChatMessage>) -> Vec<ChatMessage> {
    let mut merged: Vec<ChatMessage> = Vec::with_capacity(messages.len());

    for message in messages {
        let mut message = message.clone();
        if message.role.is_empty() {
            message.role = ROLE_USER.to_string();
        }

        if let Some(last) = merged.last_mut()
            && last.role == message.role
            && last.is_text_content()
            && message.is_text_content()
        {
            let previous = last.text_content();
            let next = message.text_content();
            let text = match (previous.is_empty(), next.is_empty()) {
                (true, _) => next,
                (false, true) => previous,
                (false, false) => format!("{previous} {next}"),
            };
            last.content = Some(MessageContent::Text(text));
            continue;
        }
        merged.push(message);
    }

    merged
}

fn map_content(
    content: Option<MessageContent>,
    images: &ResolvedImages,
) -> Result<ClaudeContent, TransformError> {
    let parts = match content {
        None => return Ok(placeholder()),
        Some(MessageContent::Text(text)) if text.is_empty() => return Ok(placeholder()),
        Some(MessageContent::Text(text)) => return Ok(ClaudeContent::Text(text)),
        Some(MessageContent::Parts(parts)) => parts,
    };

    let mut blocks = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            ContentPart::Text { text } => {
                if !text.is_empty() {
                    blocks.push(ClaudeContentBlock::Text { text });
                }
            }
            ContentPart::ImageUrl { image_url } => {
                let image = if is_remote_url(&image_url.url) {
                    images
                        .get(&image_url.url)
                        .cloned()
                        .ok_or_else(|| TransformError::ImageNotResolved(image_url.url.clone()))?
                } else {
                    parse_data_url(&image_url.url)?
                };
                blocks.push(ClaudeContentBlock::Image {
                    source: ClaudeImageSource::base64(image.media_type, image.data),
                });
            }
            ContentPart::Unsupported => {}
        }
    }

    if blocks.is_empty() {
        return Ok(placeholder());
    }
    Ok(ClaudeContent::Blocks(blocks))
}

fn placeholder() -> ClaudeContent {
    ClaudeContent::Text(EMPTY_CONTENT_PLACEHOLDER.to_string())
}
