//! Input processing module
//! Handles file detection, text extraction, and résumé structure parsing

pub mod file_detector;
pub mod manager;
pub mod resume_parser;
pub mod text_extractor;

pub use manager::InputManager;
pub use resume_parser::{ParsedBullet, ResumeParser};
