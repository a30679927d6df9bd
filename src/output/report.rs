//! Report documents wrapping pipeline results with run metadata

use crate::processing::matcher::MatchScore;
use crate::review::ReviewReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
    pub resume_file: String,
    pub job_file: String,
    pub embedding_model: Option<String>,
    pub llm_model: Option<String>,
    pub processing_time_ms: u64,
}

impl ReportMetadata {
    pub fn new(resume_file: &Path, job_file: &Path) -> Self {
        Self {
            generated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            resume_file: resume_file.display().to_string(),
            job_file: job_file.display().to_string(),
            embedding_model: None,
            llm_model: None,
            processing_time_ms: 0,
        }
    }

    pub fn with_models(mut self, embedding_model: Option<String>, llm_model: Option<String>) -> Self {
        self.embedding_model = embedding_model;
        self.llm_model = llm_model;
        self
    }

    pub fn with_processing_time(mut self, ms: u64) -> Self {
        self.processing_time_ms = ms;
        self
    }

    pub fn generated_at_display(&self) -> String {
        self.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }

    pub fn resume_name(&self) -> String {
        file_name(&self.resume_file)
    }

    pub fn job_name(&self) -> String {
        file_name(&self.job_file)
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub total: usize,
    pub needs_work: usize,
    pub already_strong: usize,
    pub rewritten: usize,
}

impl ReviewSummary {
    pub fn from_report(report: &ReviewReport) -> Self {
        Self {
            total: report.results.len(),
            needs_work: report.needs_work().len(),
            already_strong: report.already_strong().len(),
            rewritten: report.rewritten_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDocument {
    pub metadata: ReportMetadata,
    pub summary: ReviewSummary,
    pub review: ReviewReport,
}

impl ReviewDocument {
    pub fn new(metadata: ReportMetadata, review: ReviewReport) -> Self {
        Self {
            metadata,
            summary: ReviewSummary::from_report(&review),
            review,
        }
    }
}

/// Overall match band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBand {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl MatchBand {
    pub fn from_pct(pct: u8) -> Self {
        match pct {
            80..=u8::MAX => MatchBand::Excellent,
            65..=79 => MatchBand::Good,
            50..=64 => MatchBand::Fair,
            _ => MatchBand::Poor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchBand::Excellent => "EXCELLENT",
            MatchBand::Good => "GOOD",
            MatchBand::Fair => "FAIR",
            MatchBand::Poor => "POOR",
        }
    }

    pub fn verdict(&self) -> &'static str {
        match self {
            MatchBand::Excellent => "Strong match. Tailor a few bullets and apply.",
            MatchBand::Good => "Good match with some gaps worth closing.",
            MatchBand::Fair => "Partial match. Several requirements are not evidenced.",
            MatchBand::Poor => "Weak match for this role as written.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDocument {
    pub metadata: ReportMetadata,
    pub score: MatchScore,
    pub overall_pct: u8,
    pub skill_match_pct: u8,
    pub resp_match_pct: u8,
    pub semantic_pct: u8,
    pub band: MatchBand,
}

impl MatchDocument {
    pub fn new(metadata: ReportMetadata, score: MatchScore) -> Self {
        let overall_pct = score.overall_pct();
        Self {
            metadata,
            overall_pct,
            skill_match_pct: score.skill_match_pct(),
            resp_match_pct: score.resp_match_pct(),
            semantic_pct: score.semantic_pct(),
            band: MatchBand::from_pct(overall_pct),
            score,
        }
    }
}
