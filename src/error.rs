//! Error handling for the resume reviewer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("Exemplar index error: {0}")]
    Index(String),

    #[error("Language model error: {0}")]
    Llm(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, ReviewerError>;

/// model2vec-rs reports failures through anyhow; keep the whole context chain
impl From<anyhow::Error> for ReviewerError {
    fn from(err: anyhow::Error) -> Self {
        ReviewerError::Embedding(format!("{:#}", err))
    }
}

impl From<reqwest::Error> for ReviewerError {
    fn from(err: reqwest::Error) -> Self {
        ReviewerError::Network(err.to_string())
    }
}
