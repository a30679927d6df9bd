//! Guarded bullet rewriting and metric suggestion

use crate::config::LlmConfig;
use crate::error::Result;
use crate::llm::client::{ChatMessage, ChatModel, ChatRequest};
use crate::llm::prompts::{PromptTemplates, RewriteParams};
use crate::processing::assessor::BulletIssue;
use log::debug;

/// Rewrites changing fewer words than this are discarded in favour of the original
pub const MIN_WORD_EDITS: usize = 2;

pub struct Rewriter<C: ChatModel> {
    model: C,
    templates: PromptTemplates,
    temperature: f32,
    rewrite_max_tokens: u32,
    metric_max_tokens: u32,
}

impl<C: ChatModel> Rewriter<C> {
    pub fn new(model: C, config: &LlmConfig) -> Self {
        Self {
            model,
            templates: PromptTemplates::default(),
            temperature: config.temperature,
            rewrite_max_tokens: config.rewrite_max_tokens,
            metric_max_tokens: config.metric_max_tokens,
        }
    }

    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Rewrite `original` using only the retrieved examples as material
    pub async fn rewrite(
        &self,
        original: &str,
        examples: &[String],
        job_description: &str,
        do_rewrite: bool,
        issues: &[BulletIssue],
    ) -> Result<String> {
        if !do_rewrite {
            return Ok(original.to_string());
        }

        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(self.templates.render_rewrite_system(issues)),
                ChatMessage::user(self.templates.render_rewrite_user(&RewriteParams {
                    original,
                    examples,
                    job_description,
                })),
            ],
            temperature: self.temperature,
            max_tokens: self.rewrite_max_tokens,
        };

        let rewritten = self.model.complete(&request).await?;
        let rewritten = rewritten.trim();

        if rewritten.is_empty() {
            debug!("Empty rewrite, keeping original");
            return Ok(original.to_string());
        }

        if word_edits(original, rewritten) < MIN_WORD_EDITS {
            debug!("Rewrite changed fewer than {} words, keeping original", MIN_WORD_EDITS);
            return Ok(original.to_string());
        }

        Ok(rewritten.to_string())
    }

    /// One short metric phrase that would fit the bullet
    pub async fn suggest_metric(&self, original: &str, job_description: &str) -> Result<String> {
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(self.templates.metric_system.clone()),
                ChatMessage::user(self.templates.render_metric_user(original, job_description)),
            ],
            temperature: self.temperature,
            max_tokens: self.metric_max_tokens,
        };

        let metric = self.model.complete(&request).await?;
        Ok(metric.trim().trim_matches('"').trim().to_string())
    }
}

/// Case-insensitive word-level edit distance, ignoring surrounding quotes and a final period
pub fn word_edits(a: &str, b: &str) -> usize {
    let words = |s: &str| -> Vec<String> {
        s.trim()
            .trim_matches('"')
            .trim_end_matches('.')
            .split_whitespace()
            .map(str::to_lowercase)
            .collect()
    };
    strsim::generic_levenshtein(&words(a), &words(b))
}
