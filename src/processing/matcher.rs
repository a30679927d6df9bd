//! Job description / resume match scoring
//!
//! Three signals are blended with fixed weights:
//! - skill match: share of the job's known technologies present in the resume
//! - responsibility match: embedding similarity between the job's
//!   "What you'll do" lines and the resume bullets
//! - text similarity: TF-IDF cosine of the two full texts

use crate::config::ScoringConfig;
use crate::error::Result;
use crate::processing::embeddings::{cosine_similarity, Embedder};
use crate::processing::skills::SkillExtractor;
use crate::processing::text_processor::TextProcessor;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobProfile {
    pub skills: BTreeSet<String>,
    /// Lowercased responsibility lines, de-duplicated in order
    pub responsibilities: Vec<String>,
    pub full_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeProfile {
    pub skills: BTreeSet<String>,
    /// Trimmed, lowercased bullets, de-duplicated in order
    pub responsibilities: Vec<String>,
    /// Bullets joined by newlines, lowercased
    pub full_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsibilityMethod {
    /// Per-line max cosine averaged over the job's responsibilities
    SemanticLines,
    /// Cosine between whole-document embeddings (no responsibility block found)
    SemanticDocument,
    /// Token coverage, used when embeddings are disabled
    Lexical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub skill_match: f32,
    pub responsibility_match: f32,
    pub text_similarity: f32,
    pub verb_overlap: f32,
    pub overall: f32,
    pub responsibility_method: ResponsibilityMethod,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub responsibilities_found: usize,
}

fn to_pct(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 100.0).round() as u8
}

impl MatchScore {
    pub fn overall_pct(&self) -> u8 {
        to_pct(self.overall)
    }

    pub fn skill_match_pct(&self) -> u8 {
        to_pct(self.skill_match)
    }

    pub fn resp_match_pct(&self) -> u8 {
        to_pct(self.responsibility_match)
    }

    pub fn semantic_pct(&self) -> u8 {
        to_pct(self.text_similarity)
    }
}

fn responsibility_start_regex() -> &'static Regex {
    static START: OnceLock<Regex> = OnceLock::new();
    START.get_or_init(|| {
        Regex::new(r"(?i)^(what you[’']ll do|core responsibilities)").expect("start regex is valid")
    })
}

fn section_header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| Regex::new(r"^[A-Z][A-Za-z &’'\-]*:?$").expect("header regex is valid"))
}

/// Lines under "What you'll do" / "Core responsibilities", up to the next
/// blank line or section header, with bullet markers stripped
pub fn extract_responsibilities(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut in_block = false;

    for line in text.lines() {
        let stripped = line.trim();
        if !in_block {
            if responsibility_start_regex().is_match(stripped) {
                in_block = true;
            }
            continue;
        }

        if stripped.is_empty() || section_header_regex().is_match(stripped) {
            break;
        }

        let item = stripped
            .trim_start_matches(|c: char| matches!(c, '•' | '–' | '-' | '.' | ' ') || c.is_ascii_digit());
        out.push(item.to_string());
    }

    out
}

/// |resume ∩ job| / |job|; zero when the job lists no known skills
pub fn skill_coverage(resume: &BTreeSet<String>, job: &BTreeSet<String>) -> f32 {
    if job.is_empty() {
        return 0.0;
    }
    resume.intersection(job).count() as f32 / job.len() as f32
}

/// For each job line take its best matching resume bullet, then average
pub fn semantic_responsibility_score(job_embeddings: &[Vec<f32>], resume_embeddings: &[Vec<f32>]) -> Result<f32> {
    if job_embeddings.is_empty() || resume_embeddings.is_empty() {
        return Ok(0.0);
    }

    let mut total = 0.0;
    for job_line in job_embeddings {
        let mut best = f32::NEG_INFINITY;
        for bullet in resume_embeddings {
            best = best.max(cosine_similarity(job_line, bullet)?);
        }
        total += best;
    }

    Ok(total / job_embeddings.len() as f32)
}

/// Cosine between the joined responsibility block and the joined bullets
pub async fn responsibility_block_score<E: Embedder>(
    embedder: &E,
    job_responsibilities: &[String],
    resume_bullets: &[String],
) -> Result<f32> {
    if job_responsibilities.is_empty() || resume_bullets.is_empty() {
        return Ok(0.0);
    }
    let texts = vec![job_responsibilities.join(" "), resume_bullets.join(" ")];
    let embeddings = embedder.embed(&texts).await?;
    cosine_similarity(&embeddings[0], &embeddings[1])
}

fn dedup_in_order(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items.into_iter().filter(|i| seen.insert(i.clone())).collect()
}

pub struct MatchScorer {
    skills: SkillExtractor,
    text: TextProcessor,
    weights: (f32, f32, f32),
}

impl MatchScorer {
    pub fn new(skills: SkillExtractor, scoring: &ScoringConfig) -> Result<Self> {
        Ok(Self {
            skills,
            text: TextProcessor::new(),
            weights: scoring.normalized()?,
        })
    }

    pub fn job_profile(&self, job_description: &str) -> JobProfile {
        let cleaned = self.text.clean_lines(job_description);
        let responsibilities = extract_responsibilities(&cleaned)
            .into_iter()
            .map(|r| r.to_lowercase());

        JobProfile {
            skills: self.skills.extract_set(&cleaned),
            responsibilities: dedup_in_order(responsibilities),
            full_text: cleaned,
        }
    }

    pub fn resume_profile<S: AsRef<str>>(&self, bullets: &[S]) -> ResumeProfile {
        let cleaned: Vec<String> = bullets
            .iter()
            .map(|b| self.text.clean_text(b.as_ref()).to_lowercase())
            .collect();
        let joined = cleaned.join("\n");

        ResumeProfile {
            skills: self.skills.extract_set(&joined),
            responsibilities: dedup_in_order(cleaned),
            full_text: joined,
        }
    }

    /// Score resume bullets against a job description.
    /// Without an embedder the responsibility signal falls back to token coverage.
    pub async fn score<E: Embedder>(
        &self,
        job_description: &str,
        resume_bullets: &[String],
        embedder: Option<&E>,
    ) -> Result<MatchScore> {
        let job = self.job_profile(job_description);
        let resume = self.resume_profile(resume_bullets);

        let skill_match = skill_coverage(&resume.skills, &job.skills);
        let text_similarity = self.text.tfidf_cosine(&resume.full_text, &job.full_text);
        let verb_overlap = self.text.token_coverage(&job.responsibilities, &resume.responsibilities);

        let (responsibility_match, responsibility_method) = match embedder {
            Some(embedder) if !job.responsibilities.is_empty() => {
                let job_embeddings = embedder.embed(&job.responsibilities).await?;
                let resume_embeddings = embedder.embed(&resume.responsibilities).await?;
                (
                    semantic_responsibility_score(&job_embeddings, &resume_embeddings)?,
                    ResponsibilityMethod::SemanticLines,
                )
            }
            Some(embedder) => {
                let score = if resume.responsibilities.is_empty() {
                    0.0
                } else {
                    let texts = vec![job.full_text.clone(), resume.full_text.clone()];
                    let embeddings = embedder.embed(&texts).await?;
                    cosine_similarity(&embeddings[0], &embeddings[1])?
                };
                (score, ResponsibilityMethod::SemanticDocument)
            }
            None => {
                let reference = if job.responsibilities.is_empty() {
                    vec![job.full_text.clone()]
                } else {
                    job.responsibilities.clone()
                };
                (
                    self.text.token_coverage(&reference, &resume.responsibilities),
                    ResponsibilityMethod::Lexical,
                )
            }
        };
        let responsibility_match = responsibility_match.clamp(0.0, 1.0);

        let (w_skill, w_resp, w_text) = self.weights;
        let overall = (w_skill * skill_match + w_resp * responsibility_match + w_text * text_similarity).clamp(0.0, 1.0);

        debug!(
            "match: skills={:.3} resp={:.3} ({:?}) text={:.3} overall={:.3}",
            skill_match, responsibility_match, responsibility_method, text_similarity, overall
        );

        Ok(MatchScore {
            skill_match,
            responsibility_match,
            text_similarity,
            verb_overlap,
            overall,
            responsibility_method,
            matched_skills: resume.skills.intersection(&job.skills).cloned().collect(),
            missing_skills: job.skills.difference(&resume.skills).cloned().collect(),
            responsibilities_found: job.responsibilities.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::processing::embeddings::test_support::LetterEmbedder;

    const JOB: &str = "Software Engineer\n\
        We build data products.\n\
        What you\u{2019}ll do\n\
        • Build data pipelines in Python\n\
        - Deploy services to AWS\n\
        3. Automate reporting\n\
        Requirements:\n\
        Docker experience\n";

    fn scorer() -> MatchScorer {
        MatchScorer::new(SkillExtractor::new().unwrap(), &Config::default().scoring).unwrap()
    }

    #[test]
    fn test_extract_responsibilities_stops_at_header() {
        let reps = extract_responsibilities(JOB);
        assert_eq!(
            reps,
            vec!["Build data pipelines in Python", "Deploy services to AWS", "Automate reporting"]
        );
    }

    #[test]
    fn test_extract_responsibilities_straight_apostrophe_and_blank_line() {
        let jd = "CORE RESPONSIBILITIES\n- own the api\n- write tests\n\n- not included";
        assert_eq!(extract_responsibilities(jd), vec!["own the api", "write tests"]);

        let jd = "what you'll do:\n1. ship features";
        assert_eq!(extract_responsibilities(jd), vec!["ship features"]);
    }

    #[test]
    fn test_extract_responsibilities_without_block() {
        assert!(extract_responsibilities("Looking for a Python engineer").is_empty());
    }

    #[test]
    fn test_skill_coverage() {
        let resume: BTreeSet<String> = ["python", "docker"].iter().map(|s| s.to_string()).collect();
        let job: BTreeSet<String> = ["python", "aws", "docker", "sql"].iter().map(|s| s.to_string()).collect();
        assert!((skill_coverage(&resume, &job) - 0.5).abs() < 1e-6);
        assert_eq!(skill_coverage(&resume, &BTreeSet::new()), 0.0);
    }

    #[test]
    fn test_semantic_score_max_then_mean() {
        let job = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let resume = vec![vec![1.0, 0.0], vec![1.0, 1.0]];
        // line 1 best = 1.0, line 2 best = cos(45deg)
        let expected = (1.0 + std::f32::consts::FRAC_1_SQRT_2) / 2.0;
        let score = semantic_responsibility_score(&job, &resume).unwrap();
        assert!((score - expected).abs() < 1e-5);
        assert_eq!(semantic_responsibility_score(&[], &resume).unwrap(), 0.0);
    }

    #[test]
    fn test_profiles() {
        let scorer = scorer();
        let job = scorer.job_profile(JOB);
        assert!(job.skills.contains("python"));
        assert!(job.skills.contains("aws"));
        assert!(job.skills.contains("docker"));
        assert_eq!(job.responsibilities[0], "build data pipelines in python");

        let resume = scorer.resume_profile(&["  Built ETL in Python ", "Built ETL in Python"]);
        assert_eq!(resume.responsibilities, vec!["built etl in python"]);
        assert_eq!(resume.full_text, "built etl in python\nbuilt etl in python");
    }

    #[test]
    fn test_profiles_normalize_typography() {
        let scorer = scorer();
        let jd = "What\u{00A0}you\u{2019}ll do\n\u{2014} Ship\u{00A0}Python  services\n\nPerks";
        let job = scorer.job_profile(jd);
        assert_eq!(job.responsibilities, vec!["ship python services"]);
        assert!(job.skills.contains("python"));

        let resume = scorer.resume_profile(&["Shipped\u{00A0}Python\tservices", "Shipped Python services"]);
        assert_eq!(resume.responsibilities, vec!["shipped python services"]);
    }

    #[tokio::test]
    async fn test_score_with_embeddings() {
        let scorer = scorer();
        let bullets = vec![
            "Built data pipelines in Python processing 2M rows daily".to_string(),
            "Deployed services to AWS with Docker".to_string(),
        ];
        let score = scorer.score(JOB, &bullets, Some(&LetterEmbedder)).await.unwrap();

        assert_eq!(score.responsibility_method, ResponsibilityMethod::SemanticLines);
        assert_eq!(score.responsibilities_found, 3);
        assert!((score.skill_match - 1.0).abs() < 1e-6);
        assert!(score.missing_skills.is_empty());
        assert!(score.responsibility_match > 0.5);
        assert!(score.text_similarity > 0.0);
        assert!(score.overall > 0.0 && score.overall <= 1.0);
        assert_eq!(score.skill_match_pct(), 100);
    }

    #[tokio::test]
    async fn test_score_without_embeddings_is_lexical() {
        let scorer = scorer();
        let bullets = vec!["Wrote marketing copy".to_string()];
        let score = scorer.score::<LetterEmbedder>(JOB, &bullets, None).await.unwrap();

        assert_eq!(score.responsibility_method, ResponsibilityMethod::Lexical);
        assert_eq!(score.skill_match, 0.0);
        assert_eq!(score.missing_skills, vec!["aws", "docker", "python"]);
        assert!(score.overall < 0.2);
    }

    #[tokio::test]
    async fn test_score_document_fallback_when_no_block() {
        let scorer = scorer();
        let bullets = vec!["Built Python services".to_string()];
        let score = scorer
            .score("Looking for a Python engineer", &bullets, Some(&LetterEmbedder))
            .await
            .unwrap();
        assert_eq!(score.responsibility_method, ResponsibilityMethod::SemanticDocument);
        assert_eq!(score.responsibilities_found, 0);
        assert!(score.responsibility_match > 0.0);
    }

    #[tokio::test]
    async fn test_block_score() {
        let job = vec!["build pipelines".to_string()];
        let bullets = vec!["build pipelines".to_string()];
        let score = responsibility_block_score(&LetterEmbedder, &job, &bullets).await.unwrap();
        assert!((score - 1.0).abs() < 1e-5);
        assert_eq!(responsibility_block_score(&LetterEmbedder, &[], &bullets).await.unwrap(), 0.0);
    }
}
