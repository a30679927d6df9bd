//! Prompt templates for bullet rewriting, metric suggestion, résumé parsing
//! and sample résumé generation

use crate::processing::assessor::BulletIssue;
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Prompt templates with `{placeholder}` substitution
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub rewrite_system: String,
    pub rewrite_user: String,
    pub metric_system: String,
    pub metric_user: String,
    pub parse_system: String,
    pub parse_user: String,
    pub generate_system: String,
    pub generate_user: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            rewrite_system: REWRITE_SYSTEM_TEMPLATE.to_string(),
            rewrite_user: REWRITE_USER_TEMPLATE.to_string(),
            metric_system: METRIC_SYSTEM_TEMPLATE.to_string(),
            metric_user: METRIC_USER_TEMPLATE.to_string(),
            parse_system: PARSE_SYSTEM_TEMPLATE.to_string(),
            parse_user: PARSE_USER_TEMPLATE.to_string(),
            generate_system: GENERATE_SYSTEM_TEMPLATE.to_string(),
            generate_user: GENERATE_USER_TEMPLATE.to_string(),
        }
    }
}

/// Inputs for a rewrite prompt
#[derive(Debug, Clone)]
pub struct RewriteParams<'a> {
    pub original: &'a str,
    pub examples: &'a [String],
    pub job_description: &'a str,
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{(\w+)\}").expect("placeholder regex is valid"))
}

/// Substitute every `{name}` in one pass so inserted text is never re-scanned.
/// Unknown placeholders are left as written.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures<'_>| {
            values
                .iter()
                .find(|(name, _)| *name == &caps[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

impl PromptTemplates {
    /// Guarded system prompt; weak-bullet issues become extra fix instructions
    pub fn render_rewrite_system(&self, issues: &[BulletIssue]) -> String {
        let issue_instructions = if issues.is_empty() {
            String::new()
        } else {
            let fixes: Vec<&str> = issues.iter().map(BulletIssue::fix_instruction).collect();
            format!(" Please also address these issues: {}.", fixes.join(", "))
        };

        fill(&self.rewrite_system, &[("issues", issue_instructions.as_str())])
    }

    pub fn render_rewrite_user(&self, params: &RewriteParams<'_>) -> String {
        let examples: String = params.examples.iter().map(|ex| format!("- {}\n", ex)).collect();

        fill(
            &self.rewrite_user,
            &[
                ("job", params.job_description),
                ("original", params.original),
                ("examples", examples.as_str()),
            ],
        )
    }

    pub fn render_metric_user(&self, original: &str, job_description: &str) -> String {
        fill(&self.metric_user, &[("job", job_description), ("original", original)])
    }

    pub fn render_parse_user(&self, resume_text: &str) -> String {
        fill(&self.parse_user, &[("resume", resume_text)])
    }

    pub fn render_generate_user(&self, count: usize) -> String {
        let count = count.to_string();
        fill(&self.generate_user, &[("count", count.as_str())])
    }
}

const REWRITE_SYSTEM_TEMPLATE: &str = "You are an expert resume coach. ONLY rewrite using the original bullet and the retrieved examples. Do NOT invent any new responsibilities, technologies, or metrics.{issues}";

const REWRITE_USER_TEMPLATE: &str = r#"Job description: "{job}"

Original bullet:
"{original}"

Retrieved examples:
{examples}
Rewrite the original bullet to be concise, metrics-driven, and aligned with the job description. If you would change fewer than two words, just return the original bullet verbatim."#;

const METRIC_SYSTEM_TEMPLATE: &str = "You are a resume coach. Given the bullet point and the job description, suggest exactly one realistic, concise metric phrase (e.g. 'increased page load speed by 25%') that fits this responsibility. Do NOT rewrite any other part.";

const METRIC_USER_TEMPLATE: &str = r#"Job description:
{job}

Bullet:
"{original}"

Metric:"#;

const PARSE_SYSTEM_TEMPLATE: &str = "You are a helpful parser that outputs bare JSON.";

const PARSE_USER_TEMPLATE: &str = r#"You are a resume parser. From the following resume text, extract three sections: "Experience", "Internships", and "Projects".
For each, output ONLY a JSON array of objects, where each object has:
  - "section": the section name,
  - "subsection": either a sub-header or "General",
  - "bullet": the bullet point text.

Example output format (exactly, with no extra prose):
[
  { "section": "Experience", "subsection": "General", "bullet": "Built feature X..." }
]

Resume text:
"""{resume}""""#;

const GENERATE_SYSTEM_TEMPLATE: &str = "You are a helpful assistant that outputs only valid JSON.";

const GENERATE_USER_TEMPLATE: &str = r#"Generate {count} anonymized Software Engineer resumes as a JSON array, each conforming exactly to this schema:
{
  "personal_info": { "name": "", "phone": ""},
  "seniority": "",
  "education": [{ "degree": "", "major": "", "school": "", "location": "", "dates": "" }],
  "technical_skills": [""],
  "experience": [{ "title": "", "company": "", "location": "", "dates": "", "bullets": [""] }],
  "internships": [{ "title": "", "company": "", "location": "", "dates": "", "bullets": [""] }],
  "projects": [{ "name": "", "technologies": [""], "description": "", "bullets": [""] }],
  "leadership_awards": [""]
}
- About a quarter junior (0-2 yrs), half mid (3-5 yrs) and a quarter senior (6+ yrs).
- Set "seniority" to "junior", "mid" or "senior" for each resume.
- For every "bullets" array:
  1. Start with a past-tense action verb (the task).
  2. Where appropriate, include a result, either quantitative ("by 25%") or a clear outcome ("to improve code quality").
  3. Keep bullets to 8-15 words.
  4. Generate 3-5 bullets per role."#;
