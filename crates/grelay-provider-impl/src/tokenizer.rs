use grelay_protocol::openai::ChatMessage;
use tiktoken_rs::CoreBPE;
use tiktoken_rs::tokenizer::{Tokenizer, get_tokenizer};

const TOKENS_PER_MESSAGE: u64 = 3;
const TOKENS_PER_NAME: u64 = 1;
/// Every reply is primed with `<|start|>assistant<|message|>`.
const REPLY_PRIMING_TOKENS: u64 = 3;

fn bpe_for_model(model: &str) -> &'static CoreBPE {
    match get_tokenizer(model) {
        Some(Tokenizer::Cl100kBase) => tiktoken_rs::cl100k_base_singleton(),
        Some(Tokenizer::P50kBase) => tiktoken_rs::p50k_base_singleton(),
        Some(Tokenizer::R50kBase | Tokenizer::Gpt2) => tiktoken_rs::r50k_base_singleton(),
        _ => tiktoken_rs::o200k_base_singleton(),
    }
}

/// Token count of plain text under the model's encoding (o200k when unknown).
pub fn count_text_tokens(model: &str, text: &str) -> u64 {
    if text.is_empty() {
        return 0;
    }
    bpe_for_model(model).encode_ordinary(text).len() as u64
}

/// Prompt token estimate for a chat conversation.
pub fn count_message_tokens(model: &str, messages: &[ChatMessage]) -> u64 {
    let bpe = bpe_for_model(model);
    let mut total = REPLY_PRIMING_TOKENS;
    for message in messages {
        total += TOKENS_PER_MESSAGE;
        total += bpe.encode_ordinary(&message.role).len() as u64;
        total += bpe.encode_ordinary(&message.text_content()).len() as u64;
        if let Some(name) = &message.name {
            total += TOKENS_PER_NAME + bpe.encode_ordinary(name).len() as u64;
        }
    }
    total
}
