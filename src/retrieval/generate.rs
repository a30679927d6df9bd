//! Synthetic sample résumés used to seed the exemplar corpus

use crate::config::LlmConfig;
use crate::error::{Result, ReviewerError};
use crate::llm::client::{ChatMessage, ChatModel, ChatRequest};
use crate::llm::prompts::PromptTemplates;
use crate::retrieval::corpus::build_corpus;
use log::{debug, info, warn};
use serde_json::Value;
use std::path::Path;
use tokio::fs;

pub const DEFAULT_SAMPLE_COUNT: usize = 20;

pub struct SampleGenerator<C: ChatModel> {
    model: C,
    templates: PromptTemplates,
    temperature: f32,
    max_tokens: u32,
}

impl<C: ChatModel> SampleGenerator<C> {
    pub fn new(model: C, config: &LlmConfig) -> Self {
        Self {
            model,
            templates: PromptTemplates::default(),
            temperature: config.generate_temperature,
            max_tokens: config.generate_max_tokens,
        }
    }

    /// Ask the model for `count` résumés in the corpus input schema
    pub async fn generate(&self, count: usize) -> Result<Vec<Value>> {
        if count == 0 {
            return Err(ReviewerError::InvalidInput("Sample count must be at least 1".to_string()));
        }

        info!("Generating {} sample résumés", count);
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(self.templates.generate_system.clone()),
                ChatMessage::user(self.templates.render_generate_user(count)),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let raw = self.model.complete(&request).await?;
        debug!("Raw generation output ({} chars)", raw.len());

        let resumes = parse_resume_array(&raw)?;
        if resumes.len() != count {
            warn!("Asked for {} résumés, model returned {}", count, resumes.len());
        }
        Ok(resumes)
    }

    /// Generate and write pretty-printed JSON; returns the résumé count
    pub async fn generate_file(&self, count: usize, output: &Path) -> Result<usize> {
        let resumes = self.generate(count).await?;
        let json = serde_json::to_string_pretty(&resumes)?;

        let usable = build_corpus(&json)?.len();
        info!("{} usable exemplar bullets in generated résumés", usable);

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(output, json).await?;
        Ok(resumes.len())
    }
}

/// Drop a leading and a trailing ``` fence line, then trim
pub fn strip_code_fences(content: &str) -> String {
    let mut lines: Vec<&str> = content.trim().lines().collect();
    if lines.first().is_some_and(|l| l.trim_start().starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.trim_start().starts_with("```")) {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

/// Completion text to a JSON array of résumé objects
pub fn parse_resume_array(content: &str) -> Result<Vec<Value>> {
    let content = strip_code_fences(content);
    if !content.starts_with('[') {
        let preview: String = content.chars().take(80).collect();
        return Err(ReviewerError::Parse(format!(
            "Expected a JSON array of résumés, got: {}",
            preview
        )));
    }

    let resumes: Vec<Value> = serde_json::from_str(&content)?;
    if let Some(bad) = resumes.iter().position(|r| !r.is_object()) {
        return Err(ReviewerError::Parse(format!("Résumé {} is not a JSON object", bad)));
    }
    Ok(resumes)
}
