//! Résumé reviewer library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod llm;
pub mod output;
pub mod processing;
pub mod retrieval;
pub mod review;

pub use config::Config;
pub use error::{Result, ReviewerError};
