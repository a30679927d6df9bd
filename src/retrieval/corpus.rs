//! Exemplar corpus built from structured sample résumés

use crate::error::{Result, ReviewerError};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

/// Bullets shorter than this many words are too thin to serve as examples
pub const MIN_BULLET_WORDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech: Option<Vec<String>>,
}

impl CorpusEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), tech: None }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SampleResume {
    #[serde(default)]
    internships: Vec<SampleRole>,
    #[serde(default)]
    experience: Vec<SampleRole>,
    #[serde(default)]
    projects: Vec<SampleRole>,
}

#[derive(Debug, Default, Deserialize)]
struct SampleRole {
    #[serde(default)]
    bullets: Vec<String>,
}

/// Collect internship, experience and project bullets from a JSON array of
/// résumés; keeps substantive bullets once, in first-seen order
pub fn build_corpus(resumes_json: &str) -> Result<Vec<CorpusEntry>> {
    let resumes: Vec<SampleResume> = serde_json::from_str(resumes_json)?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut corpus = Vec::new();

    for resume in &resumes {
        let roles = resume
            .internships
            .iter()
            .chain(resume.experience.iter())
            .chain(resume.projects.iter());

        for bullet in roles.flat_map(|r| r.bullets.iter()) {
            let text = bullet.trim();
            if text.split_whitespace().count() < MIN_BULLET_WORDS {
                continue;
            }
            if seen.insert(text.to_string()) {
                corpus.push(CorpusEntry::new(text));
            }
        }
    }

    Ok(corpus)
}

pub async fn build_corpus_file(input: &Path, output: &Path) -> Result<usize> {
    let raw = fs::read_to_string(input).await?;
    let corpus = build_corpus(&raw)?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(output, serde_json::to_string_pretty(&corpus)?).await?;

    info!("Wrote {} bullets to {}", corpus.len(), output.display());
    Ok(corpus.len())
}

pub async fn load_corpus(path: &Path) -> Result<Vec<CorpusEntry>> {
    let raw = fs::read_to_string(path).await?;
    let corpus: Vec<CorpusEntry> = serde_json::from_str(&raw)?;
    if corpus.is_empty() {
        return Err(ReviewerError::InvalidInput(format!("Corpus is empty: {}", path.display())));
    }
    Ok(corpus)
}
