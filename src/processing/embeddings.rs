//! Embedding backends: local Model2Vec static model or a hosted endpoint

use crate::config::{Config, EmbeddingProvider};
use crate::error::{Result, ReviewerError};
use crate::llm::client::OpenAiClient;
use anyhow::Context;
use log::{debug, info};
use model2vec_rs::model::StaticModel;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Instant;

/// Turns texts into dense vectors, one per input, in input order
pub trait Embedder {
    fn embed(&self, texts: &[String]) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send;

    fn model_name(&self) -> &str;
}

impl<T: Embedder + Sync> Embedder for &T {
    fn embed(&self, texts: &[String]) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send {
        (**self).embed(texts)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Model2Vec static embeddings with an in-memory cache
pub struct StaticEmbedder {
    model: StaticModel,
    batch_size: usize,
    cache: Mutex<HashMap<String, Vec<f32>>>,
    model_name: String,
}

impl StaticEmbedder {
    /// Load from a local folder or a HuggingFace repo id
    pub fn load(model: &str, batch_size: usize) -> Result<Self> {
        let start_time = Instant::now();
        info!("Loading Model2Vec embedding model: {}", model);

        let static_model = StaticModel::from_pretrained(
            model,
            None, // token
            None, // normalize
            None, // subfolder
        )
        .with_context(|| format!("Failed to load model '{}'", model))?;

        info!("Model loaded in {:.2?}", start_time.elapsed());

        Ok(Self {
            model: static_model,
            batch_size: batch_size.max(1),
            cache: Mutex::new(HashMap::new()),
            model_name: model.to_string(),
        })
    }

    pub fn cache_size(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn encode_cached(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| ReviewerError::Embedding("Embedding cache poisoned".to_string()))?;

        let uncached: Vec<String> = texts
            .iter()
            .filter(|t| !cache.contains_key(*t))
            .cloned()
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();

        debug!("Embedding {} texts ({} cache hits)", texts.len(), texts.len() - uncached.len());

        for batch in uncached.chunks(self.batch_size) {
            let embeddings = self.model.encode(batch);
            for (text, embedding) in batch.iter().zip(embeddings) {
                cache.insert(text.clone(), embedding);
            }
        }

        texts
            .iter()
            .map(|t| {
                cache
                    .get(t)
                    .cloned()
                    .ok_or_else(|| ReviewerError::Embedding(format!("Missing embedding for '{}'", t)))
            })
            .collect()
    }
}

impl Embedder for StaticEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.encode_cached(texts)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Embeddings from an OpenAI-compatible `/embeddings` endpoint
pub struct HostedEmbedder {
    client: OpenAiClient,
    model_name: String,
    batch_size: usize,
}

impl HostedEmbedder {
    pub fn new(client: OpenAiClient, model_name: String, batch_size: usize) -> Self {
        Self {
            client,
            model_name,
            batch_size: batch_size.max(1),
        }
    }
}

impl Embedder for HostedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            out.extend(self.client.embeddings(&self.model_name, batch).await?);
        }
        Ok(out)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Backend chosen at runtime from `[embedding] provider`
pub enum EmbeddingBackend {
    Static(StaticEmbedder),
    Hosted(HostedEmbedder),
}

impl EmbeddingBackend {
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.embedding.provider {
            EmbeddingProvider::Static => Ok(EmbeddingBackend::Static(StaticEmbedder::load(
                &config.embedding.model,
                config.embedding.batch_size,
            )?)),
            EmbeddingProvider::Hosted => {
                let client = OpenAiClient::new(&config.llm, config.api_key()?)?;
                Ok(EmbeddingBackend::Hosted(HostedEmbedder::new(
                    client,
                    config.embedding.hosted_model.clone(),
                    config.embedding.batch_size,
                )))
            }
        }
    }
}

impl Embedder for EmbeddingBackend {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self {
            EmbeddingBackend::Static(e) => e.embed(texts).await,
            EmbeddingBackend::Hosted(e) => e.embed(texts).await,
        }
    }

    fn model_name(&self) -> &str {
        match self {
            EmbeddingBackend::Static(e) => e.model_name(),
            EmbeddingBackend::Hosted(e) => e.model_name(),
        }
    }
}

/// Cosine similarity; zero for empty or zero-norm vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(ReviewerError::Embedding(format!(
            "Embedding dimensions don't match: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    if a.is_empty() {
        return Ok(0.0);
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        Ok(0.0)
    } else {
        Ok(dot_product / (norm_a * norm_b))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Deterministic bag-of-letters embedder for tests
    pub struct LetterEmbedder;

    impl Embedder for LetterEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| letter_histogram(t)).collect())
        }

        fn model_name(&self) -> &str {
            "letters"
        }
    }

    pub fn letter_histogram(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; 26];
        for c in text.to_lowercase().chars() {
            if c.is_ascii_lowercase() {
                v[(c as u8 - b'a') as usize] += 1.0;
            }
        }
        v
    }
}
