//! Model-assisted résumé parsing for layouts the heuristic parser can't follow

use crate::config::LlmConfig;
use crate::error::{Result, ReviewerError};
use crate::input::resume_parser::ParsedBullet;
use crate::llm::client::{ChatMessage, ChatModel, ChatRequest};
use crate::llm::prompts::PromptTemplates;
use crate::processing::text_processor::TextProcessor;
use log::{debug, info};
use regex::Regex;
use std::sync::OnceLock;

fn json_array_regex() -> &'static Regex {
    static ARRAY: OnceLock<Regex> = OnceLock::new();
    ARRAY.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("array regex is valid"))
}

pub struct LlmBulletParser<C: ChatModel> {
    model: C,
    templates: PromptTemplates,
    temperature: f32,
    max_tokens: u32,
    redact_pii: bool,
}

impl<C: ChatModel> LlmBulletParser<C> {
    pub fn new(model: C, config: &LlmConfig) -> Self {
        Self {
            model,
            templates: PromptTemplates::default(),
            temperature: config.temperature,
            max_tokens: config.parse_max_tokens,
            redact_pii: config.redact_pii,
        }
    }

    pub async fn parse(&self, raw_text: &str) -> Result<Vec<ParsedBullet>> {
        let text = if self.redact_pii {
            TextProcessor::new().remove_pii(raw_text)
        } else {
            raw_text.to_string()
        };

        info!("Parsing résumé with the language model ({} chars)", text.len());
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(self.templates.parse_system.clone()),
                ChatMessage::user(self.templates.render_parse_user(&text)),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let content = self.model.complete(&request).await?;
        let bullets = parse_bullet_array(&content)?;
        debug!("Model returned {} bullets", bullets.len());
        Ok(bullets)
    }
}

/// First `[...]` block of the reply, decoded as bullets
pub fn parse_bullet_array(content: &str) -> Result<Vec<ParsedBullet>> {
    let array = json_array_regex().find(content).ok_or_else(|| {
        ReviewerError::Parse(format!("Unable to find a JSON array in model output: {:?}", content))
    })?;

    let bullets: Vec<ParsedBullet> = serde_json::from_str(array.as_str())?;
    Ok(bullets)
}
