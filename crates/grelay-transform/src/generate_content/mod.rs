pub mod openai_chat_completions2claude;
pub mod openai_chat_completions2scholarai;
