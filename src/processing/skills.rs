//! Known technology keyword extraction

use crate::error::{Result, ReviewerError};
use aho_corasick::AhoCorasick;
use std::collections::BTreeSet;

/// Curated technology keywords recognised in resumes and job descriptions
pub const KNOWN_TECH: &[&str] = &[
    "python", "java", "c#", "c++", "javascript", "node", "react", "angular",
    "rest", "api", "docker", "kubernetes", "aws", "azure", "gcp", "terraform",
    "ci/cd", "jenkins", "git", "sql", "nosql", "spark", "airflow",
];

/// Word-bounded, case-insensitive matcher over the known technology list
#[derive(Clone)]
pub struct SkillExtractor {
    matcher: AhoCorasick,
    skills: Vec<String>,
}

impl SkillExtractor {
    pub fn new() -> Result<Self> {
        Self::with_extra_skills(&[])
    }

    /// Built-in list plus user supplied skills (lowercased, de-duplicated)
    pub fn with_extra_skills(extra: &[String]) -> Result<Self> {
        let mut skills: Vec<String> = KNOWN_TECH.iter().map(|s| s.to_string()).collect();
        for skill in extra {
            let skill = skill.trim().to_lowercase();
            if !skill.is_empty() && !skills.contains(&skill) {
                skills.push(skill);
            }
        }

        // Overlapping search so a rejected long match never hides a valid short one
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&skills)
            .map_err(|e| ReviewerError::Parse(format!("Failed to build skill matcher: {}", e)))?;

        Ok(Self { matcher, skills })
    }

    /// Known skills mentioned in `text`, in order of first appearance
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut hits: Vec<(usize, usize)> = self
            .matcher
            .find_overlapping_iter(text)
            .filter(|m| is_word_bounded(text, m.start(), m.end()))
            .map(|m| (m.start(), m.pattern().as_usize()))
            .collect();
        hits.sort();

        let mut found: Vec<String> = Vec::new();
        for (_, idx) in hits {
            let skill = &self.skills[idx];
            if !found.contains(skill) {
                found.push(skill.clone());
            }
        }
        found
    }

    pub fn extract_set(&self, text: &str) -> BTreeSet<String> {
        self.extract(text).into_iter().collect()
    }

    /// Exact lookup for an already isolated token
    pub fn is_known(&self, token: &str) -> bool {
        let token = token.trim().to_lowercase();
        self.skills.iter().any(|s| *s == token)
    }

    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }
}

impl Default for SkillExtractor {
    fn default() -> Self {
        Self::new().expect("built-in skill list is valid")
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extraction_in_order() {
        let extractor = SkillExtractor::new().unwrap();
        let skills = extractor.extract("Built REST services in Python on AWS, deployed with Docker.");
        assert_eq!(skills, vec!["rest", "python", "aws", "docker"]);
    }

    #[test]
    fn test_word_boundaries() {
        let extractor = SkillExtractor::new().unwrap();
        let skills = extractor.extract_set("JavaScript on GitHub with MySQL");
        assert!(skills.contains("javascript"));
        assert!(!skills.contains("java"));
        assert!(!skills.contains("git"));
        assert!(!skills.contains("sql"));
    }

    #[test]
    fn test_symbol_skills() {
        let extractor = SkillExtractor::new().unwrap();
        let skills = extractor.extract_set("Wrote C++ and C# tooling; owned CI/CD.");
        assert!(skills.contains("c++"));
        assert!(skills.contains("c#"));
        assert!(skills.contains("ci/cd"));
    }

    #[test]
    fn test_nosql_and_sql_both_found() {
        let extractor = SkillExtractor::new().unwrap();
        let skills = extractor.extract_set("Experience with SQL and NoSQL stores");
        assert!(skills.contains("sql"));
        assert!(skills.contains("nosql"));
    }

    #[test]
    fn test_duplicates_collapsed() {
        let extractor = SkillExtractor::new().unwrap();
        let skills = extractor.extract("react react React");
        assert_eq!(skills, vec!["react"]);
    }

    #[test]
    fn test_extra_skills() {
        let extractor = SkillExtractor::with_extra_skills(&["Rust".to_string(), "python".to_string()]).unwrap();
        assert_eq!(extractor.skill_count(), KNOWN_TECH.len() + 1);
        assert!(extractor.extract_set("Services written in rust").contains("rust"));
        assert!(extractor.is_known(" RUST "));
    }
}
