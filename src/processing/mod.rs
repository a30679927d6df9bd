//! Bullet assessment, skill extraction and match scoring

pub mod assessor;
pub mod embeddings;
pub mod matcher;
pub mod skills;
pub mod text_processor;
