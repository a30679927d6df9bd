//! End-to-end résumé review: parse, assess, retrieve, rewrite

use crate::error::Result;
use crate::input::resume_parser::{ParsedBullet, ResumeParser};
use crate::llm::client::ChatModel;
use crate::llm::rewriter::Rewriter;
use crate::processing::assessor::{assess_bullet_strength, BulletIssue};
use crate::processing::embeddings::Embedder;
use crate::processing::skills::SkillExtractor;
use crate::retrieval::index::Retriever;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub section: String,
    pub subsection: String,
    pub original: String,
    pub issues: Vec<BulletIssue>,
    pub rewritten: String,
    pub rewrote: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_metric: Option<String>,
}

impl ReviewItem {
    pub fn is_strong(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Bullets of one subsection, in résumé order
#[derive(Debug, Clone, PartialEq)]
pub struct SubsectionGroup<'a> {
    pub name: &'a str,
    pub items: Vec<&'a ReviewItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionGroup<'a> {
    pub name: &'a str,
    pub subsections: Vec<SubsectionGroup<'a>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewReport {
    pub results: Vec<ReviewItem>,
    /// Known technologies found in the job description
    pub tech_filter: Vec<String>,
}

impl ReviewReport {
    pub fn needs_work(&self) -> Vec<&ReviewItem> {
        self.results.iter().filter(|r| !r.is_strong()).collect()
    }

    pub fn already_strong(&self) -> Vec<&ReviewItem> {
        self.results.iter().filter(|r| r.is_strong()).collect()
    }

    pub fn rewritten_count(&self) -> usize {
        self.results.iter().filter(|r| r.rewrote).count()
    }

    /// Group items by section then subsection, both in first-seen order
    pub fn group<'a>(items: &[&'a ReviewItem]) -> Vec<SectionGroup<'a>> {
        let mut sections: Vec<SectionGroup<'a>> = Vec::new();

        for &item in items {
            let section = match sections.iter().position(|s| s.name == item.section) {
                Some(i) => &mut sections[i],
                None => {
                    sections.push(SectionGroup { name: &item.section, subsections: Vec::new() });
                    let last = sections.len() - 1;
                    &mut sections[last]
                }
            };

            match section.subsections.iter_mut().find(|s| s.name == item.subsection) {
                Some(sub) => sub.items.push(item),
                None => section.subsections.push(SubsectionGroup {
                    name: &item.subsection,
                    items: vec![item],
                }),
            }
        }

        sections
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewOptions {
    /// Exemplars retrieved per weak bullet
    pub k: usize,
    pub do_rewrite: bool,
    pub suggest_metrics: bool,
}

impl Default for ReviewOptions {
    fn default() -> Self {
        Self { k: 3, do_rewrite: true, suggest_metrics: false }
    }
}

pub struct ReviewPipeline<C: ChatModel, E: Embedder> {
    parser: ResumeParser,
    skills: SkillExtractor,
    retriever: Option<Retriever<E>>,
    rewriter: Rewriter<C>,
    options: ReviewOptions,
}

impl<C: ChatModel, E: Embedder> ReviewPipeline<C, E> {
    pub fn new(
        skills: SkillExtractor,
        retriever: Option<Retriever<E>>,
        rewriter: Rewriter<C>,
        options: ReviewOptions,
    ) -> Self {
        Self {
            parser: ResumeParser::default(),
            skills,
            retriever,
            rewriter,
            options,
        }
    }

    pub fn with_parser(mut self, parser: ResumeParser) -> Self {
        self.parser = parser;
        self
    }

    /// Review extracted résumé lines using the heuristic bullet parser
    pub async fn review_lines<S: AsRef<str>>(&self, lines: &[S], job_description: &str) -> Result<ReviewReport> {
        let bullets = self.parser.parse_bullets(lines);
        info!("Parsed {} bullets from {} lines", bullets.len(), lines.len());
        self.review_bullets(bullets, job_description).await
    }

    /// Review already-parsed bullets
    pub async fn review_bullets(&self, bullets: Vec<ParsedBullet>, job_description: &str) -> Result<ReviewReport> {
        let tech_filter = self.skills.extract(job_description);
        debug!("Tech filter from job description: {:?}", tech_filter);

        let mut results = Vec::with_capacity(bullets.len());
        for bullet in bullets {
            results.push(self.review_one(bullet, job_description, &tech_filter).await);
        }

        let report = ReviewReport { results, tech_filter };
        info!(
            "Reviewed {} bullets: {} need work, {} rewritten",
            report.results.len(),
            report.needs_work().len(),
            report.rewritten_count()
        );
        Ok(report)
    }

    async fn review_one(&self, bullet: ParsedBullet, job_description: &str, tech_filter: &[String]) -> ReviewItem {
        let assessment = assess_bullet_strength(&bullet.bullet);
        let original = bullet.bullet;

        let (rewritten, rewrote) = if assessment.is_strong || !self.options.do_rewrite {
            (original.clone(), false)
        } else {
            match self.rewrite_weak(&original, job_description, tech_filter, &assessment.issues).await {
                Ok(text) => {
                    let changed = text != original;
                    (text, changed)
                }
                Err(e) => {
                    warn!("Keeping original bullet, rewrite failed: {}", e);
                    (original.clone(), false)
                }
            }
        };

        let suggested_metric =
            if self.options.suggest_metrics && assessment.has_issue(BulletIssue::NoQuantifiableMetric) {
                match self.rewriter.suggest_metric(&original, job_description).await {
                    Ok(metric) if !metric.is_empty() => Some(metric),
                    Ok(_) => None,
                    Err(e) => {
                        warn!("Metric suggestion failed: {}", e);
                        None
                    }
                }
            } else {
                None
            };

        ReviewItem {
            section: bullet.section,
            subsection: bullet.subsection,
            original,
            issues: assessment.issues,
            rewritten,
            rewrote,
            suggested_metric,
        }
    }

    async fn rewrite_weak(
        &self,
        original: &str,
        job_description: &str,
        tech_filter: &[String],
        issues: &[BulletIssue],
    ) -> Result<String> {
        let examples = match &self.retriever {
            Some(retriever) => retriever.get_similar(original, self.options.k, tech_filter).await?,
            None => Vec::new(),
        };
        debug!("Rewriting with {} examples: {}", examples.len(), original);

        self.rewriter
            .rewrite(original, &examples, job_description, true, issues)
            .await
    }
}
