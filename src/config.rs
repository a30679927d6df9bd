//! Configuration management for the resume reviewer

use crate::error::{Result, ReviewerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub skills: SkillsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API
    pub api_base: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub temperature: f32,
    pub rewrite_max_tokens: u32,
    pub metric_max_tokens: u32,
    pub parse_max_tokens: u32,
    /// Sample résumé generation runs hotter and needs a long completion
    #[serde(default = "default_generate_temperature")]
    pub generate_temperature: f32,
    #[serde(default = "default_generate_max_tokens")]
    pub generate_max_tokens: u32,
    pub timeout_secs: u64,
    /// Redact emails and phone numbers before text is sent out
    pub redact_pii: bool,
}

fn default_generate_temperature() -> f32 {
    0.7
}

fn default_generate_max_tokens() -> u32 {
    12000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    /// Model2Vec repo id or local folder for the static provider
    pub model: String,
    /// Model name sent to the hosted embeddings endpoint
    pub hosted_model: String,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    Static,
    Hosted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub index_dir: PathBuf,
    pub k: usize,
    /// How many candidates to fetch per requested exemplar when a tech filter applies
    pub fetch_multiplier: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub skill_weight: f32,
    pub responsibility_weight: f32,
    pub text_weight: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillsConfig {
    /// Appended to the built-in list of known technologies
    #[serde(default)]
    pub extra: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
    Html,
}

impl Default for Config {
    fn default() -> Self {
        let index_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("resume-reviewer")
            .join("exemplar_index");

        Self {
            llm: LlmConfig {
                api_base: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
                temperature: 0.0,
                rewrite_max_tokens: 100,
                metric_max_tokens: 20,
                parse_max_tokens: 1500,
                generate_temperature: default_generate_temperature(),
                generate_max_tokens: default_generate_max_tokens(),
                timeout_secs: 60,
                redact_pii: false,
            },
            embedding: EmbeddingConfig {
                provider: EmbeddingProvider::Static,
                model: "minishlab/M2V_base_output".to_string(),
                hosted_model: "text-embedding-3-large".to_string(),
                batch_size: 32,
            },
            retrieval: RetrievalConfig {
                index_dir,
                k: 3,
                fetch_multiplier: 5,
            },
            scoring: ScoringConfig {
                skill_weight: 0.40,
                responsibility_weight: 0.35,
                text_weight: 0.25,
            },
            skills: SkillsConfig::default(),
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
            },
        }
    }
}

impl ScoringConfig {
    /// Weights scaled to sum to one
    pub fn normalized(&self) -> Result<(f32, f32, f32)> {
        let weights = [self.skill_weight, self.responsibility_weight, self.text_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ReviewerError::Configuration(
                "Scoring weights must be finite and non-negative".to_string(),
            ));
        }
        let total: f32 = weights.iter().sum();
        if total <= 0.0 {
            return Err(ReviewerError::Configuration(
                "Scoring weights must not all be zero".to_string(),
            ));
        }
        Ok((weights[0] / total, weights[1] / total, weights[2] / total))
    }
}

impl Config {
    /// Load from the default location, writing defaults on first run
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| ReviewerError::Configuration(format!("Failed to parse config: {}", e)))?;
            config.scoring.normalized()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    /// Overwrite `config_path` with defaults without reading it first, so a
    /// file that no longer parses can still be recovered
    pub fn reset(config_path: &Path) -> Result<Self> {
        let config = Self::default();
        config.save_to(config_path)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ReviewerError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-reviewer")
            .join("config.toml")
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.llm.api_key_env).map_err(|_| {
            ReviewerError::Configuration(format!("Missing {} in environment", self.llm.api_key_env))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_weights_normalize() {
        let config = Config::default();
        let (s, r, t) = config.scoring.normalized().unwrap();
        assert!((s + r + t - 1.0).abs() < 1e-6);
        assert!((s - 0.40).abs() < 1e-6);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let scoring = ScoringConfig {
            skill_weight: -1.0,
            responsibility_weight: 0.5,
            text_weight: 0.5,
        };
        assert!(scoring.normalized().is_err());
    }

    #[test]
    fn test_zero_weights_rejected() {
        let scoring = ScoringConfig {
            skill_weight: 0.0,
            responsibility_weight: 0.0,
            text_weight: 0.0,
        };
        assert!(scoring.normalized().is_err());
    }

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.retrieval.k, 3);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.llm.model, "gpt-4o-mini");
        assert_eq!(reloaded.embedding.provider, EmbeddingProvider::Static);
    }

    #[test]
    fn test_reset_recovers_unloadable_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut bad = Config::default();
        bad.scoring.skill_weight = -1.0;
        let content = toml::to_string_pretty(&bad).unwrap();
        std::fs::write(&path, content).unwrap();
        assert!(Config::load_from(&path).is_err());

        let reset = Config::reset(&path).unwrap();
        assert!((reset.scoring.skill_weight - 0.40).abs() < 1e-6);

        let reloaded = Config::load_from(&path).unwrap();
        assert!((reloaded.scoring.skill_weight - 0.40).abs() < 1e-6);
    }

    #[test]
    fn test_reset_overwrites_broken_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[llm\nmodel = ").unwrap();

        Config::reset(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().llm.model, "gpt-4o-mini");
    }

    #[test]
    fn test_generation_settings_default_when_missing() {
        let mut value = toml::Value::try_from(Config::default()).unwrap();
        let llm = value.get_mut("llm").and_then(|v| v.as_table_mut()).unwrap();
        llm.remove("generate_temperature");
        llm.remove("generate_max_tokens");

        let config: Config = toml::from_str(&toml::to_string(&value).unwrap()).unwrap();
        assert_eq!(config.llm.generate_max_tokens, 12000);
        assert!((config.llm.generate_temperature - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        match Config::load_from(&path) {
            Err(ReviewerError::Configuration(_)) => {}
            other => panic!("expected configuration error, got {:?}", other.map(|_| ())),
        }
    }
}
