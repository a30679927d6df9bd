//! Persisted exemplar index and tech-aware nearest-neighbour retrieval

use crate::error::{Result, ReviewerError};
use crate::processing::embeddings::{cosine_similarity, Embedder};
use crate::processing::skills::SkillExtractor;
use crate::retrieval::corpus::CorpusEntry;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const INDEX_FILE: &str = "index.json";
const BUILD_CHUNK: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub text: String,
    pub tech: Vec<String>,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExemplarIndex {
    pub model: String,
    pub dimension: usize,
    pub entries: Vec<IndexEntry>,
}

impl ExemplarIndex {
    /// Embed every corpus entry; entries without tech tags are tagged here
    pub async fn build<E: Embedder>(
        corpus: &[CorpusEntry],
        embedder: &E,
        skills: &SkillExtractor,
    ) -> Result<Self> {
        if corpus.is_empty() {
            return Err(ReviewerError::Index("Cannot build an index from an empty corpus".to_string()));
        }

        info!("Embedding {} exemplar bullets with {}", corpus.len(), embedder.model_name());
        let progress = ProgressBar::new(corpus.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} bullets ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut entries = Vec::with_capacity(corpus.len());
        for chunk in corpus.chunks(BUILD_CHUNK) {
            let texts: Vec<String> = chunk.iter().map(|c| c.text.clone()).collect();
            let embeddings = embedder.embed(&texts).await?;
            if embeddings.len() != chunk.len() {
                return Err(ReviewerError::Index(format!(
                    "Embedder returned {} vectors for {} texts",
                    embeddings.len(),
                    chunk.len()
                )));
            }

            for (entry, embedding) in chunk.iter().zip(embeddings) {
                let tech = match &entry.tech {
                    Some(tags) => tags.iter().map(|t| t.to_lowercase()).collect(),
                    None => skills.extract(&entry.text),
                };
                entries.push(IndexEntry { text: entry.text.clone(), tech, embedding });
            }
            progress.inc(chunk.len() as u64);
        }
        progress.finish_and_clear();

        let dimension = entries.first().map(|e| e.embedding.len()).unwrap_or(0);
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != dimension) {
            return Err(ReviewerError::Index(format!(
                "Inconsistent embedding dimension for '{}': {} vs {}",
                bad.text,
                bad.embedding.len(),
                dimension
            )));
        }

        Ok(Self {
            model: embedder.model_name().to_string(),
            dimension,
            entries,
        })
    }

    pub fn index_file(dir: &Path) -> PathBuf {
        dir.join(INDEX_FILE)
    }

    pub async fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).await?;
        let path = Self::index_file(dir);
        fs::write(&path, serde_json::to_string(self)?).await?;
        info!("Saved index with {} entries to {}", self.entries.len(), path.display());
        Ok(())
    }

    pub async fn load(dir: &Path) -> Result<Self> {
        let path = Self::index_file(dir);
        if !path.exists() {
            return Err(ReviewerError::Index(format!(
                "No exemplar index at {}; run `index build` first",
                path.display()
            )));
        }

        let raw = fs::read_to_string(&path).await?;
        let index: ExemplarIndex = serde_json::from_str(&raw)?;
        debug!("Loaded {} exemplars ({}-d, {})", index.entries.len(), index.dimension, index.model);
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top `n` entries by cosine similarity, best first; ties keep corpus order
    pub fn similarity_search(&self, query: &[f32], n: usize) -> Result<Vec<(&IndexEntry, f32)>> {
        if query.len() != self.dimension {
            return Err(ReviewerError::Index(format!(
                "Query embedding has dimension {}, index expects {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored = self
            .entries
            .iter()
            .map(|e| Ok((e, cosine_similarity(query, &e.embedding)?)))
            .collect::<Result<Vec<_>>>()?;

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(n);
        Ok(scored)
    }
}

/// Retrieves example bullets similar to a weak bullet
pub struct Retriever<E: Embedder> {
    index: ExemplarIndex,
    embedder: E,
    fetch_multiplier: usize,
}

impl<E: Embedder> Retriever<E> {
    pub fn new(index: ExemplarIndex, embedder: E, fetch_multiplier: usize) -> Self {
        if index.model != embedder.model_name() {
            warn!(
                "Index was built with '{}' but queries use '{}'",
                index.model,
                embedder.model_name()
            );
        }
        Self {
            index,
            embedder,
            fetch_multiplier: fetch_multiplier.max(1),
        }
    }

    pub fn index(&self) -> &ExemplarIndex {
        &self.index
    }

    /// Up to `k` exemplar texts. With a tech filter, exemplars tagged with
    /// every filter technology come first and the rest is padded from the
    /// plain similarity ranking.
    pub async fn get_similar(&self, text: &str, k: usize, tech_filter: &[String]) -> Result<Vec<String>> {
        if k == 0 || self.index.is_empty() {
            return Ok(Vec::new());
        }

        let query = self
            .embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ReviewerError::Embedding("Embedder returned no vector for query".to_string()))?;

        if tech_filter.is_empty() {
            let hits = self.index.similarity_search(&query, k)?;
            return Ok(hits.into_iter().map(|(e, _)| e.text.clone()).collect());
        }

        let hits = self.index.similarity_search(&query, k.saturating_mul(self.fetch_multiplier))?;
        let wanted: HashSet<String> = tech_filter.iter().map(|t| t.to_lowercase()).collect();

        let mut chosen: Vec<usize> = Vec::with_capacity(k.min(hits.len()));
        for (i, (entry, _)) in hits.iter().enumerate() {
            let tags: HashSet<&str> = entry.tech.iter().map(String::as_str).collect();
            if wanted.iter().all(|t| tags.contains(t.as_str())) {
                chosen.push(i);
                if chosen.len() >= k {
                    break;
                }
            }
        }
        debug!("{} of {} candidates matched tech filter {:?}", chosen.len(), hits.len(), tech_filter);

        for i in 0..hits.len() {
            if chosen.len() >= k {
                break;
            }
            if !chosen.contains(&i) {
                chosen.push(i);
            }
        }

        Ok(chosen.into_iter().map(|i| hits[i].0.text.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::embeddings::test_support::{letter_histogram, LetterEmbedder};
    use tempfile::TempDir;

    fn corpus() -> Vec<CorpusEntry> {
        vec![
            CorpusEntry::new("Deployed python services on aws lambda"),
            CorpusEntry::new("Built react dashboards for sales"),
            CorpusEntry::new("Automated python reporting jobs"),
            CorpusEntry {
                text: "Wrote terraform modules".to_string(),
                tech: Some(vec!["Terraform".to_string(), "AWS".to_string()]),
            },
        ]
    }

    async fn index() -> ExemplarIndex {
        ExemplarIndex::build(&corpus(), &LetterEmbedder, &SkillExtractor::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_build_tags_and_dimension() {
        let index = index().await;
        assert_eq!(index.len(), 4);
        assert_eq!(index.dimension, 26);
        assert_eq!(index.model, "letters");
        assert_eq!(index.entries[0].tech, vec!["python", "aws"]);
        assert_eq!(index.entries[3].tech, vec!["terraform", "aws"]);
    }

    #[tokio::test]
    async fn test_empty_corpus_rejected() {
        let result = ExemplarIndex::build(&[], &LetterEmbedder, &SkillExtractor::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let index = index().await;
        index.save(dir.path()).await.unwrap();
        let loaded = ExemplarIndex::load(dir.path()).await.unwrap();
        assert_eq!(loaded, index);
    }

    #[tokio::test]
    async fn test_load_missing_index() {
        let dir = TempDir::new().unwrap();
        assert!(ExemplarIndex::load(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_similarity_search_exact_match_first() {
        let index = index().await;
        let query = letter_histogram("Built react dashboards for sales");
        let hits = index.similarity_search(&query, 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0.text, "Built react dashboards for sales");
        assert!(hits[0].1 >= hits[1].1);
    }

    #[tokio::test]
    async fn test_similarity_search_ties_keep_corpus_order() {
        // anagrams share a letter histogram, so their scores are identical
        let corpus = vec![
            CorpusEntry::new("Shipped mobile releases"),
            CorpusEntry::new("Listen to users weekly"),
            CorpusEntry::new("Silent to users weekly"),
        ];
        let index = ExemplarIndex::build(&corpus, &LetterEmbedder, &SkillExtractor::default())
            .await
            .unwrap();

        let hits = index.similarity_search(&letter_histogram("listen to users weekly"), 3).unwrap();
        assert_eq!(hits[0].1, hits[1].1);
        assert_eq!(hits[0].0.text, "Listen to users weekly");
        assert_eq!(hits[1].0.text, "Silent to users weekly");

        let reversed = vec![corpus[2].clone(), corpus[1].clone()];
        let index = ExemplarIndex::build(&reversed, &LetterEmbedder, &SkillExtractor::default())
            .await
            .unwrap();
        let hits = index.similarity_search(&letter_histogram("listen to users weekly"), 1).unwrap();
        assert_eq!(hits[0].0.text, "Silent to users weekly");
    }

    #[tokio::test]
    async fn test_similarity_search_dimension_mismatch() {
        let index = index().await;
        assert!(index.similarity_search(&[1.0, 0.0], 1).is_err());
    }

    #[tokio::test]
    async fn test_get_similar_without_filter() {
        let retriever = Retriever::new(index().await, LetterEmbedder, 5);
        let results = retriever
            .get_similar("Built react dashboards for sales", 2, &[])
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], "Built react dashboards for sales");
    }

    #[tokio::test]
    async fn test_get_similar_prefers_tagged_then_pads() {
        let retriever = Retriever::new(index().await, LetterEmbedder, 5);
        let filter = vec!["python".to_string()];
        let results = retriever
            .get_similar("Built react dashboards for sales", 3, &filter)
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        let python_hits: Vec<&String> = results[..2].iter().collect();
        assert!(python_hits.iter().all(|t| t.to_lowercase().contains("python")));
        assert!(!results[2].contains("python"));

        let unique: HashSet<&String> = results.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[tokio::test]
    async fn test_get_similar_k_larger_than_index() {
        let retriever = Retriever::new(index().await, LetterEmbedder, 5);
        let results = retriever.get_similar("anything", 10, &[]).await.unwrap();
        assert_eq!(results.len(), 4);
    }

    #[tokio::test]
    async fn test_get_similar_huge_k_with_filter() {
        let retriever = Retriever::new(index().await, LetterEmbedder, 5);
        let filter = vec!["python".to_string()];
        let results = retriever.get_similar("anything", usize::MAX, &filter).await.unwrap();
        assert_eq!(results.len(), 4);
        assert!(results[..2].iter().all(|t| t.contains("python")));
    }
}
