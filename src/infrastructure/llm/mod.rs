//! Language model client implementations

mod openai;

pub use openai::OpenAiChatClient;
