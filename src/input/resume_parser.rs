//! Heuristic résumé structure parser
//!
//! Works on extracted lines and recovers `(section, subsection, bullet)`
//! triples for the sections worth reviewing.

use crate::processing::skills::SkillExtractor;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const DEFAULT_SUBSECTION: &str = "General";

const ALLOWED_SECTIONS: &[&str] = &["Experience", "Internships", "Projects"];
const SKIP_SECTIONS: &[&str] = &[
    "Certifications",
    "Education",
    "Technical Skills",
    "Skills / Technologies",
    "Awards & Recognition",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedBullet {
    pub section: String,
    pub subsection: String,
    pub bullet: String,
}

fn bullet_regex() -> &'static Regex {
    static BULLET: OnceLock<Regex> = OnceLock::new();
    BULLET.get_or_init(|| Regex::new(r"^\s*(?:[•\-\*]|\d+\.)\s+(.*)$").expect("bullet regex is valid"))
}

fn skills_header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"(?i)^(?:technical\s+skills|skills\s*/\s*technologies)\b").expect("skills header regex is valid")
    })
}

fn tech_split_regex() -> &'static Regex {
    static SPLIT: OnceLock<Regex> = OnceLock::new();
    SPLIT.get_or_init(|| Regex::new(r"[,|/]").expect("split regex is valid"))
}

pub struct ResumeParser {
    skills: SkillExtractor,
}

impl ResumeParser {
    pub fn new(skills: SkillExtractor) -> Self {
        Self { skills }
    }

    /// Bullets under Experience, Internships and Projects, tagged with the
    /// nearest subsection title
    pub fn parse_bullets<S: AsRef<str>>(&self, lines: &[S]) -> Vec<ParsedBullet> {
        let bullet_re = bullet_regex();
        let mut section: Option<String> = None;
        let mut subsection: Option<String> = None;
        let mut out: Vec<ParsedBullet> = Vec::new();

        for (i, raw) in lines.iter().enumerate() {
            let raw = raw.as_ref();
            let text = raw.trim();

            if text.is_empty() || text.to_lowercase().starts_with("tech stack") {
                continue;
            }

            if ALLOWED_SECTIONS.contains(&text) {
                section = Some(text.to_string());
                subsection = None;
                continue;
            }
            if SKIP_SECTIONS.contains(&text) {
                section = None;
                subsection = None;
                continue;
            }

            let Some(current_section) = section.as_ref() else {
                continue;
            };

            if let Some(caps) = bullet_re.captures(text) {
                out.push(ParsedBullet {
                    section: current_section.clone(),
                    subsection: subsection.clone().unwrap_or_else(|| DEFAULT_SUBSECTION.to_string()),
                    bullet: caps[1].trim().to_string(),
                });
                continue;
            }

            let indented = raw.starts_with(' ') || raw.starts_with('\t');
            let starts_lower = text.chars().next().is_some_and(char::is_lowercase);
            if let Some(previous) = out.last_mut() {
                if indented || starts_lower {
                    previous.bullet.push(' ');
                    previous.bullet.push_str(text);
                    continue;
                }
            }

            let next_is_bullet = lines.get(i + 1).is_some_and(|next| bullet_re.is_match(next.as_ref()));
            if next_is_bullet {
                subsection = Some(subsection_title(text));
            }
        }

        out
    }

    /// Known technologies listed under a skills heading, first occurrence order
    pub fn extract_technologies<S: AsRef<str>>(&self, lines: &[S]) -> Vec<String> {
        let mut techs: Vec<String> = Vec::new();
        let mut in_skills = false;

        for raw in lines {
            let text = raw.as_ref().trim();

            if skills_header_regex().is_match(text) {
                in_skills = true;
                continue;
            }

            if !in_skills {
                continue;
            }

            if text.is_empty() || is_all_caps(text) {
                break;
            }

            if bullet_regex().is_match(text) {
                continue;
            }

            for part in tech_split_regex().split(text) {
                let key = part.trim().to_lowercase();
                if self.skills.is_known(&key) && !techs.contains(&key) {
                    techs.push(key);
                }
            }
        }

        techs
    }
}

impl Default for ResumeParser {
    fn default() -> Self {
        Self::new(SkillExtractor::default())
    }
}

/// Text before the first `|`, minus a stray trailing single-character token
fn subsection_title(text: &str) -> String {
    let clean = text.split('|').next().unwrap_or_default().trim();
    let mut parts: Vec<&str> = clean.split_whitespace().collect();
    if parts.len() > 1 && parts.last().is_some_and(|p| p.chars().count() == 1) {
        parts.pop();
    }
    parts.join(" ")
}

fn is_all_caps(text: &str) -> bool {
    text.chars().any(char::is_alphabetic) && !text.chars().any(char::is_lowercase)
}
