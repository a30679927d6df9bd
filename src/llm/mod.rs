//! Hosted language model integration

pub mod client;
pub mod parser;
pub mod prompts;
pub mod rewriter;

pub use client::{ChatMessage, ChatModel, ChatRequest, OpenAiClient};
pub use parser::LlmBulletParser;
pub use prompts::PromptTemplates;
pub use rewriter::Rewriter;
