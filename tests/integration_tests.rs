//! Integration tests for the resume reviewer

use resume_reviewer::config::Config;
use resume_reviewer::error::Result;
use resume_reviewer::input::{InputManager, ResumeParser};
use resume_reviewer::llm::client::{ChatModel, ChatRequest};
use resume_reviewer::llm::Rewriter;
use resume_reviewer::processing::assessor::BulletIssue;
use resume_reviewer::processing::embeddings::Embedder;
use resume_reviewer::processing::matcher::{MatchScorer, ResponsibilityMethod};
use resume_reviewer::processing::skills::SkillExtractor;
use resume_reviewer::retrieval::corpus::{build_corpus_file, load_corpus};
use resume_reviewer::retrieval::{ExemplarIndex, Retriever};
use resume_reviewer::review::{ReviewOptions, ReviewPipeline};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// Replays canned completions in order, then returns empty text
#[derive(Default)]
struct CannedChat {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<usize>,
}

impl CannedChat {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl ChatModel for CannedChat {
    async fn complete(&self, _request: &ChatRequest) -> Result<String> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.replies.lock().unwrap().pop_front().unwrap_or_default())
    }
}

/// Letter frequency vectors; similar spellings land close together
struct LetterCounts;

impl Embedder for LetterCounts {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0.0f32; 26];
                for c in t.to_lowercase().chars().filter(char::is_ascii_lowercase) {
                    v[(c as u8 - b'a') as usize] += 1.0;
                }
                v
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "letter-counts"
    }
}

#[tokio::test]
async fn test_text_extraction_from_txt() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_resume.txt");

    let text = manager.extract_text(path).await.unwrap();
    assert!(text.contains("Jane Doe"));
    assert!(text.contains("Backend Engineer"));
    assert!(text.contains("React"));
}

#[tokio::test]
async fn test_text_extraction_from_markdown() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_resume.md");

    let text = manager.extract_text(path).await.unwrap();
    assert!(text.contains("Jane Doe"));
    assert!(text.contains("React"));
    // Markup is gone
    assert!(!text.contains("**"));
    assert!(!text.contains("##"));
}

#[tokio::test]
async fn test_caching_functionality() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_resume.txt");

    let text1 = manager.extract_text(path).await.unwrap();
    assert_eq!(manager.cache_size(), 1);

    let text2 = manager.extract_text(path).await.unwrap();
    assert_eq!(text1, text2);
    assert_eq!(manager.cache_size(), 1);
}

#[tokio::test]
async fn test_unsupported_file_type() {
    let mut manager = InputManager::new();
    let result = manager.extract_text(Path::new("tests/fixtures/unsupported.xyz")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_nonexistent_file() {
    let mut manager = InputManager::new();
    let result = manager.extract_text(Path::new("tests/fixtures/nonexistent.txt")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_parse_fixture_resume() {
    let mut manager = InputManager::new();
    let lines = manager
        .extract_lines(Path::new("tests/fixtures/sample_resume.txt"))
        .await
        .unwrap();

    let parser = ResumeParser::default();
    let bullets = parser.parse_bullets(&lines);

    assert_eq!(bullets.len(), 4);
    assert_eq!(bullets[0].section, "Experience");
    assert_eq!(bullets[0].subsection, "Acme Corp");
    assert_eq!(
        bullets[2].bullet,
        "Worked on deployment scripts using Docker and Kubernetes across three regions"
    );
    assert_eq!(bullets[3].section, "Projects");
    assert_eq!(bullets[3].subsection, "Budget Tracker");
    // Education bullets are not reviewed
    assert!(bullets.iter().all(|b| !b.bullet.contains("honors")));

    let techs = parser.extract_technologies(&lines);
    assert_eq!(techs, vec!["python", "docker", "kubernetes", "react"]);
}

#[tokio::test]
async fn test_markdown_resume_bullets_survive_extraction() {
    let mut manager = InputManager::new();
    let lines = manager
        .extract_lines(Path::new("tests/fixtures/sample_resume.md"))
        .await
        .unwrap();

    let bullets = ResumeParser::default().parse_bullets(&lines);
    assert_eq!(bullets.len(), 3);
    assert_eq!(bullets[0].bullet, "Built REST APIs in Python serving 2 million requests daily");
}

#[tokio::test]
async fn test_corpus_build_and_index_round_trip() {
    let dir = TempDir::new().unwrap();
    let corpus_path = dir.path().join("corpus.json");

    let count = build_corpus_file(Path::new("tests/fixtures/resumes.json"), &corpus_path)
        .await
        .unwrap();
    // "Fixed bugs" is too short and the duplicate ETL bullet is kept once
    assert_eq!(count, 4);

    let corpus = load_corpus(&corpus_path).await.unwrap();
    let skills = SkillExtractor::default();
    let index = ExemplarIndex::build(&corpus, &LetterCounts, &skills).await.unwrap();
    assert_eq!(index.dimension, 26);

    let index_dir = dir.path().join("index");
    index.save(&index_dir).await.unwrap();
    let loaded = ExemplarIndex::load(&index_dir).await.unwrap();
    assert_eq!(loaded, index);
    assert_eq!(loaded.model, "letter-counts");

    let retriever = Retriever::new(loaded, LetterCounts, 5);
    let hits = retriever
        .get_similar("Built data pipelines", 2, &["docker".to_string()])
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0], "Automated Docker image builds cutting release time by 30%");
}

#[tokio::test]
async fn test_missing_index_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(ExemplarIndex::load(dir.path()).await.is_err());
}

#[tokio::test]
async fn test_review_pipeline_on_fixture() {
    let mut manager = InputManager::new();
    let lines = manager
        .extract_lines(Path::new("tests/fixtures/sample_resume.txt"))
        .await
        .unwrap();
    let job = manager
        .extract_text(Path::new("tests/fixtures/sample_job.txt"))
        .await
        .unwrap();

    let config = Config::default();
    let chat = CannedChat::new(&["Maintained the team website serving 500 weekly users", ""]);
    let pipeline: ReviewPipeline<&CannedChat, LetterCounts> = ReviewPipeline::new(
        SkillExtractor::default(),
        None,
        Rewriter::new(&chat, &config.llm),
        ReviewOptions::default(),
    );

    let report = pipeline.review_lines(&lines, &job).await.unwrap();

    assert_eq!(report.results.len(), 4);
    assert_eq!(report.needs_work().len(), 2);
    assert_eq!(report.already_strong().len(), 2);
    assert!(report.tech_filter.contains(&"aws".to_string()));

    // Strong bullets never reach the model
    assert_eq!(chat.calls(), 2);

    let maintenance = &report.results[1];
    assert_eq!(
        maintenance.issues,
        vec![BulletIssue::MissingActionVerb, BulletIssue::NoQuantifiableMetric]
    );
    assert!(maintenance.rewrote);
    assert_eq!(maintenance.rewritten, "Maintained the team website serving 500 weekly users");

    // Empty completion keeps the original
    let deployment = &report.results[2];
    assert_eq!(deployment.issues, vec![BulletIssue::NoQuantifiableMetric]);
    assert!(!deployment.rewrote);
    assert_eq!(deployment.rewritten, deployment.original);
    assert_eq!(report.rewritten_count(), 1);
}

#[tokio::test]
async fn test_review_without_rewrite_makes_no_calls() {
    let config = Config::default();
    let chat = CannedChat::default();
    let options = ReviewOptions { do_rewrite: false, ..ReviewOptions::default() };
    let pipeline: ReviewPipeline<&CannedChat, LetterCounts> =
        ReviewPipeline::new(SkillExtractor::default(), None, Rewriter::new(&chat, &config.llm), options);

    let lines = vec!["Experience", "- Responsible for website maintenance"];
    let report = pipeline.review_lines(&lines, "Python role").await.unwrap();

    assert_eq!(report.results.len(), 1);
    assert!(!report.results[0].rewrote);
    assert_eq!(chat.calls(), 0);
}

#[tokio::test]
async fn test_match_score_lexical() {
    let mut manager = InputManager::new();
    let lines = manager
        .extract_lines(Path::new("tests/fixtures/sample_resume.txt"))
        .await
        .unwrap();
    let job = manager
        .extract_text(Path::new("tests/fixtures/sample_job.txt"))
        .await
        .unwrap();

    let bullets: Vec<String> = ResumeParser::default()
        .parse_bullets(&lines)
        .into_iter()
        .map(|b| b.bullet)
        .collect();

    let scorer = MatchScorer::new(SkillExtractor::default(), &Config::default().scoring).unwrap();
    let score = scorer.score(&job, &bullets, None::<&LetterCounts>).await.unwrap();

    assert_eq!(score.responsibility_method, ResponsibilityMethod::Lexical);
    assert!(score.matched_skills.contains(&"python".to_string()));
    assert!(score.missing_skills.contains(&"aws".to_string()));
    assert!(score.skill_match > 0.0 && score.skill_match < 1.0);
    assert!((0.0..=1.0).contains(&score.overall));
}

#[tokio::test]
async fn test_match_score_with_embeddings() {
    let scorer = MatchScorer::new(SkillExtractor::default(), &Config::default().scoring).unwrap();
    let job = "Core responsibilities\n- Build REST APIs in Python\n- Deploy to AWS";
    let bullets = vec!["Built REST APIs in Python".to_string()];

    let score = scorer.score(job, &bullets, Some(&LetterCounts)).await.unwrap();
    assert_eq!(score.responsibility_method, ResponsibilityMethod::SemanticLines);
    assert!(score.responsibility_match > 0.5);
}
