//! Heuristic bullet strength assessment
//!
//! A bullet is strong when it opens with an action verb and carries at least
//! one quantifiable metric (a number, a percentage, a cadence word or an
//! outcome verb such as "reduced").

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

const ACTION_VERBS: &[&str] = &[
    "developed", "engineered", "built", "implemented", "designed", "launched",
    "streamlined", "optimized", "led", "managed", "architected", "deployed",
    "automated", "enhanced", "reduced", "increased", "improved", "consolidated",
];

/// Any of these anywhere in the bullet counts as a quantified outcome
const QUALITATIVE_OUTCOMES: &[&str] = &[
    "reduce", "reducing", "reduced",
    "optimize", "optimizing", "optimized",
    "improve", "improving", "improved",
    "save", "saving", "saved",
    "cut", "cutting",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulletIssue {
    MissingActionVerb,
    NoQuantifiableMetric,
    NoRelevantTechnology,
}

impl BulletIssue {
    /// Stable text key used in reports
    pub fn key(&self) -> &'static str {
        match self {
            BulletIssue::MissingActionVerb => "missing a clear action verb",
            BulletIssue::NoQuantifiableMetric => "no quantifiable metric",
            BulletIssue::NoRelevantTechnology => "no relevant technology mentioned",
        }
    }

    /// Instruction handed to the rewriter
    pub fn fix_instruction(&self) -> &'static str {
        match self {
            BulletIssue::MissingActionVerb => "start with a strong action verb",
            BulletIssue::NoQuantifiableMetric => "include a quantifiable metric",
            BulletIssue::NoRelevantTechnology => "call out a relevant technology",
        }
    }
}

impl fmt::Display for BulletIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulletAssessment {
    pub is_strong: bool,
    pub issues: Vec<BulletIssue>,
}

impl BulletAssessment {
    pub fn has_issue(&self, issue: BulletIssue) -> bool {
        self.issues.contains(&issue)
    }
}

fn action_verbs() -> &'static HashSet<&'static str> {
    static VERBS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    VERBS.get_or_init(|| ACTION_VERBS.iter().copied().collect())
}

fn metric_regex() -> &'static Regex {
    static METRIC: OnceLock<Regex> = OnceLock::new();
    METRIC.get_or_init(|| {
        Regex::new(
            r"(?ix)
              \b
              (?:
                \d{1,3}(?:,\d{3})*(?:\.\d+)?%?    # 1,234 or 75% or 3.5
              |
                daily|weekly|monthly|quarterly|yearly
              )
              \b",
        )
        .expect("metric regex is valid")
    })
}

/// Check a single bullet for an opening action verb and a quantifiable metric
pub fn assess_bullet_strength(bullet: &str) -> BulletAssessment {
    let mut issues = Vec::new();

    if !starts_with_action_verb(bullet) {
        issues.push(BulletIssue::MissingActionVerb);
    }

    if !has_quantifiable_metric(bullet) {
        issues.push(BulletIssue::NoQuantifiableMetric);
    }

    BulletAssessment {
        is_strong: issues.is_empty(),
        issues,
    }
}

pub fn starts_with_action_verb(bullet: &str) -> bool {
    let first = bullet
        .split_whitespace()
        .next()
        .map(|w| w.to_lowercase())
        .unwrap_or_default();
    let first = first.trim_end_matches(['.', ',']);

    !first.is_empty() && (action_verbs().contains(first) || first.ends_with("ed"))
}

pub fn has_quantifiable_metric(bullet: &str) -> bool {
    if metric_regex().is_match(bullet) {
        return true;
    }
    let lower = bullet.to_lowercase();
    QUALITATIVE_OUTCOMES.iter().any(|w| lower.contains(w))
}
