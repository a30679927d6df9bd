//! Output formatters for review and match reports

use crate::config::OutputFormat;
use crate::error::{Result, ReviewerError};
use crate::output::report::{MatchBand, MatchDocument, ReviewDocument};
use crate::review::{ReviewItem, ReviewReport, SectionGroup};
use askama::Template;
use colored::{Color, Colorize};
use std::path::Path;

/// Trait for rendering both report kinds in one format
pub trait OutputFormatter {
    fn format_review(&self, doc: &ReviewDocument) -> Result<String>;
    fn format_match(&self, doc: &MatchDocument) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

fn is_general(subsection: &str) -> bool {
    subsection.trim().is_empty() || subsection.eq_ignore_ascii_case("general")
}

fn issue_list(item: &ReviewItem) -> String {
    item.issues.iter().map(|i| i.key()).collect::<Vec<_>>().join(", ")
}

/// Colored terminal output
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

/// JSON formatter for scripting and storage
pub struct JsonFormatter {
    pretty: bool,
}

/// Markdown formatter for sharing
pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// HTML formatter with inline styling
pub struct HtmlFormatter {
    include_styles: bool,
}

/// Dispatches to the formatter for the requested format
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
    html_formatter: HtmlFormatter,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            3 => "▒",
            _ => "░",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            3 => Color::Yellow,
            _ => Color::White,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_band(&self, band: MatchBand) -> String {
        let color = match band {
            MatchBand::Excellent => Color::Green,
            MatchBand::Good => Color::Yellow,
            MatchBand::Fair => Color::BrightYellow,
            MatchBand::Poor => Color::BrightRed,
        };

        if self.use_colors {
            format!("[{}]", band.label().color(color).bold())
        } else {
            format!("[{}]", band.label())
        }
    }

    fn format_weak_groups(&self, groups: &[SectionGroup<'_>], output: &mut String) {
        for section in groups {
            output.push_str(&self.format_header(section.name, 2));
            for sub in &section.subsections {
                if !is_general(sub.name) {
                    output.push_str(&self.format_header(sub.name, 3));
                }
                for item in &sub.items {
                    output.push_str(&format!(
                        "  {} {}\n",
                        self.colorize("Issues:", Color::BrightBlack),
                        self.colorize(&issue_list(item), Color::Yellow)
                    ));
                    output.push_str(&format!("  {} {}\n", self.colorize("Original:  ", Color::Red), item.original));
                    if item.rewrote {
                        output.push_str(&format!(
                            "  {} {}\n",
                            self.colorize("Suggestion:", Color::Green),
                            self.colorize(&item.rewritten, Color::Green)
                        ));
                    } else {
                        output.push_str(&format!(
                            "  {} {}\n",
                            self.colorize("Suggestion:", Color::BrightBlack),
                            self.colorize("(kept as is)", Color::BrightBlack)
                        ));
                    }
                    if let Some(metric) = &item.suggested_metric {
                        output.push_str(&format!("  {} {}\n", self.colorize("Metric idea:", Color::Cyan), metric));
                    }
                    output.push('\n');
                }
            }
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_review(&self, doc: &ReviewDocument) -> Result<String> {
        let mut output = String::new();
        let review = &doc.review;

        output.push_str(&self.format_header("📝 RESUME BULLET REVIEW", 1));
        output.push_str(&format!(
            "Generated: {} | Processing time: {}ms\n",
            doc.metadata.generated_at_display(),
            doc.metadata.processing_time_ms
        ));

        output.push_str(&format!(
            "\n{} {} bullets need improvement\n",
            self.colorize("●", Color::Red),
            doc.summary.needs_work
        ));
        output.push_str(&format!(
            "{} {} bullets already strong\n",
            self.colorize("●", Color::Green),
            doc.summary.already_strong
        ));
        if !review.tech_filter.is_empty() {
            output.push_str(&format!("Job technologies: {}\n", review.tech_filter.join(", ")));
        }

        let weak = review.needs_work();
        if weak.is_empty() {
            output.push_str(&format!(
                "\n{}\n",
                self.colorize("All your bullets are already strong. No changes needed!", Color::Green)
            ));
        } else {
            self.format_weak_groups(&ReviewReport::group(&weak), &mut output);
        }

        let strong = review.already_strong();
        if !strong.is_empty() {
            output.push_str(&self.format_header("✅ Already strong", 2));
            for section in ReviewReport::group(&strong) {
                output.push_str(&format!("{}\n", self.colorize(section.name, Color::Cyan)));
                for sub in &section.subsections {
                    if !is_general(sub.name) {
                        output.push_str(&format!("  {}\n", sub.name));
                    }
                    for item in &sub.items {
                        output.push_str(&format!("    • {}\n", item.original));
                    }
                }
            }
        }

        if self.detailed {
            output.push_str(&format!(
                "\n{} rewritten | embeddings: {} | model: {}\n",
                doc.summary.rewritten,
                doc.metadata.embedding_model.as_deref().unwrap_or("none"),
                doc.metadata.llm_model.as_deref().unwrap_or("none")
            ));
        }

        Ok(output)
    }

    fn format_match(&self, doc: &MatchDocument) -> Result<String> {
        let mut output = String::new();
        let score = &doc.score;

        output.push_str(&self.format_header("📊 ATS MATCH SCORE", 1));
        output.push_str(&format!(
            "Overall match: {}% {}\n",
            doc.overall_pct,
            self.format_band(doc.band)
        ));
        output.push_str(&format!("{}\n", self.colorize(doc.band.verdict(), Color::Cyan)));

        output.push_str(&self.format_header("Score Breakdown", 3));
        output.push_str(&format!("  • Skills match:    {}%\n", doc.skill_match_pct));
        output.push_str(&format!("  • Resp match:      {}%\n", doc.resp_match_pct));
        output.push_str(&format!("  • Text similarity: {}%\n", doc.semantic_pct));

        if !score.matched_skills.is_empty() {
            output.push_str(&format!(
                "\n{} {}\n",
                self.colorize("Matched skills:", Color::Green),
                score.matched_skills.join(", ")
            ));
        }
        if !score.missing_skills.is_empty() {
            output.push_str(&format!(
                "{} {}\n",
                self.colorize("Missing skills:", Color::Red),
                score.missing_skills.join(", ")
            ));
        }

        if self.detailed {
            output.push_str(&self.format_header("Details", 3));
            output.push_str(&format!("Responsibility lines found: {}\n", score.responsibilities_found));
            output.push_str(&format!("Responsibility method: {:?}\n", score.responsibility_method));
            output.push_str(&format!("Verb overlap: {:.1}%\n", score.verb_overlap * 100.0));
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_json<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_review(&self, doc: &ReviewDocument) -> Result<String> {
        self.to_json(doc)
    }

    fn format_match(&self, doc: &MatchDocument) -> Result<String> {
        self.to_json(doc)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn metadata_block(&self, output: &mut String, generated: &str, resume: &str, job: &str) {
        if self.include_metadata {
            output.push_str(&format!("**Generated:** {}\n", generated));
            output.push_str(&format!("**Resume:** `{}` | **Job:** `{}`\n\n", resume, job));
        }
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_review(&self, doc: &ReviewDocument) -> Result<String> {
        let mut output = String::new();
        output.push_str("# 📝 Resume Bullet Review\n\n");
        self.metadata_block(
            &mut output,
            &doc.metadata.generated_at_display(),
            &doc.metadata.resume_name(),
            &doc.metadata.job_name(),
        );

        output.push_str(&format!("### 🔴 {} bullets need improvement\n", doc.summary.needs_work));
        output.push_str(&format!("### 🟢 {} bullets already strong\n\n", doc.summary.already_strong));

        let weak = doc.review.needs_work();
        if weak.is_empty() {
            output.push_str("All your bullets are already strong. No changes needed!\n\n");
        }
        for section in ReviewReport::group(&weak) {
            output.push_str(&format!("## {}\n\n", section.name));
            for sub in &section.subsections {
                if !is_general(sub.name) {
                    output.push_str(&format!("### {}\n\n", sub.name));
                }
                for item in &sub.items {
                    output.push_str(&format!("*Issues: {}*\n\n", issue_list(item)));
                    output.push_str(&format!("- **Original:** {}\n", item.original));
                    output.push_str(&format!("- **Suggestion:** {}\n", item.rewritten));
                    if let Some(metric) = &item.suggested_metric {
                        output.push_str(&format!("- **Metric idea:** {}\n", metric));
                    }
                    output.push_str("\n---\n\n");
                }
            }
        }

        let strong = doc.review.already_strong();
        if !strong.is_empty() {
            output.push_str("## 🟢 Already strong\n\n");
            for section in ReviewReport::group(&strong) {
                output.push_str(&format!("**{}**\n\n", section.name));
                for sub in &section.subsections {
                    if !is_general(sub.name) {
                        output.push_str(&format!("*{}*\n\n", sub.name));
                    }
                    for item in &sub.items {
                        output.push_str(&format!("- {}\n", item.original));
                    }
                    output.push('\n');
                }
            }
        }

        if self.include_metadata {
            output.push_str(&format!("---\n\n*Generated by resume-reviewer v{}*\n", doc.metadata.tool_version));
        }

        Ok(output)
    }

    fn format_match(&self, doc: &MatchDocument) -> Result<String> {
        let mut output = String::new();
        output.push_str("# 📊 ATS Match Score\n\n");
        self.metadata_block(
            &mut output,
            &doc.metadata.generated_at_display(),
            &doc.metadata.resume_name(),
            &doc.metadata.job_name(),
        );

        output.push_str(&format!("**Overall match:** {}% ({})\n\n", doc.overall_pct, doc.band.label()));
        output.push_str(&format!("**Verdict:** {}\n\n", doc.band.verdict()));
        output.push_str("| Component | Score |\n");
        output.push_str("|-----------|-------|\n");
        output.push_str(&format!("| Skills match | {}% |\n", doc.skill_match_pct));
        output.push_str(&format!("| Resp match | {}% |\n", doc.resp_match_pct));
        output.push_str(&format!("| Text similarity | {}% |\n\n", doc.semantic_pct));

        if !doc.score.matched_skills.is_empty() {
            output.push_str(&format!("**Matched skills:** `{}`\n\n", doc.score.matched_skills.join("`, `")));
        }
        if !doc.score.missing_skills.is_empty() {
            output.push_str(&format!("**Missing skills:** `{}`\n\n", doc.score.missing_skills.join("`, `")));
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

struct HtmlItem {
    original: String,
    rewritten: String,
    rewrote: bool,
    issues: String,
    metric: String,
    has_metric: bool,
}

struct HtmlSubsection {
    name: String,
    show_heading: bool,
    items: Vec<HtmlItem>,
}

struct HtmlSection {
    name: String,
    subsections: Vec<HtmlSubsection>,
}

fn html_sections(groups: Vec<SectionGroup<'_>>) -> Vec<HtmlSection> {
    groups
        .into_iter()
        .map(|section| HtmlSection {
            name: section.name.to_string(),
            subsections: section
                .subsections
                .into_iter()
                .map(|sub| HtmlSubsection {
                    name: sub.name.to_string(),
                    show_heading: !is_general(sub.name),
                    items: sub
                        .items
                        .into_iter()
                        .map(|item| HtmlItem {
                            original: item.original.clone(),
                            rewritten: item.rewritten.clone(),
                            rewrote: item.rewrote,
                            issues: issue_list(item),
                            metric: item.suggested_metric.clone().unwrap_or_default(),
                            has_metric: item.suggested_metric.is_some(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

const HTML_STYLES: &str = r#"
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 900px; margin: 0 auto; padding: 20px; background: #f8f9fa; }
        .container { background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
        .header { text-align: center; margin-bottom: 30px; border-bottom: 3px solid #007acc; padding-bottom: 20px; }
        h2 { color: #007acc; border-bottom: 2px solid #e9ecef; padding-bottom: 10px; }
        .bullet { background: #f8f9fa; padding: 15px; margin: 10px 0; border-radius: 6px; border-left: 4px solid #ffc107; }
        .issues { color: #6c757d; font-size: 0.9em; }
        .original { color: #dc3545; }
        .suggestion { color: #28a745; }
        .strong li { color: #495057; }
        .score-badge { display: inline-block; padding: 8px 16px; border-radius: 20px; font-weight: bold; color: white; margin-left: 10px; }
        .score-excellent { background: #28a745; }
        .score-good { background: #17a2b8; }
        .score-fair { background: #ffc107; color: #000; }
        .score-poor { background: #dc3545; }
        .metadata { background: #e9ecef; padding: 15px; border-radius: 6px; margin-top: 30px; font-size: 0.9em; color: #6c757d; }
"#;

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Resume Bullet Review</title>
    {% if include_styles %}<style>{{ styles|safe }}</style>{% endif %}
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>📝 Resume Bullet Review</h1>
            <p>Generated: {{ generated_at }} | Processing time: {{ processing_time }}ms</p>
            <p>🔴 {{ needs_work }} bullets need improvement | 🟢 {{ already_strong }} bullets already strong</p>
        </div>
        {% if weak_sections.is_empty() %}
        <p class="suggestion">All your bullets are already strong. No changes needed!</p>
        {% endif %}
        {% for section in weak_sections %}
        <h2>{{ section.name }}</h2>
        {% for sub in section.subsections %}
        {% if sub.show_heading %}<h3>{{ sub.name }}</h3>{% endif %}
        {% for item in sub.items %}
        <div class="bullet">
            <p class="issues">Issues: {{ item.issues }}</p>
            <p class="original"><strong>Original:</strong> {{ item.original }}</p>
            {% if item.rewrote %}<p class="suggestion"><strong>Suggestion:</strong> {{ item.rewritten }}</p>{% endif %}
            {% if item.has_metric %}<p><strong>Metric idea:</strong> {{ item.metric }}</p>{% endif %}
        </div>
        {% endfor %}
        {% endfor %}
        {% endfor %}
        {% if !strong_sections.is_empty() %}
        <h2>🟢 Already strong</h2>
        <div class="strong">
        {% for section in strong_sections %}
        <h3>{{ section.name }}</h3>
        {% for sub in section.subsections %}
        {% if sub.show_heading %}<h4>{{ sub.name }}</h4>{% endif %}
        <ul>{% for item in sub.items %}<li>{{ item.original }}</li>{% endfor %}</ul>
        {% endfor %}
        {% endfor %}
        </div>
        {% endif %}
        <div class="metadata">
            <p><strong>Generated by resume-reviewer v{{ version }}</strong></p>
            <p><strong>Resume:</strong> {{ resume_file }} | <strong>Job:</strong> {{ job_file }}</p>
        </div>
    </div>
</body>
</html>"#,
    ext = "html"
)]
struct ReviewHtmlTemplate {
    include_styles: bool,
    styles: &'static str,
    generated_at: String,
    processing_time: u64,
    needs_work: usize,
    already_strong: usize,
    weak_sections: Vec<HtmlSection>,
    strong_sections: Vec<HtmlSection>,
    version: String,
    resume_file: String,
    job_file: String,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>ATS Match Score</title>
    {% if include_styles %}<style>{{ styles|safe }}</style>{% endif %}
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>📊 ATS Match Score</h1>
            <p>Generated: {{ generated_at }}</p>
        </div>
        <h2>Overall match: {{ overall_pct }}% <span class="score-badge {{ band_class }}">{{ band_label }}</span></h2>
        <p><strong>Verdict:</strong> {{ verdict }}</p>
        <ul>
            <li>Skills match: {{ skill_match_pct }}%</li>
            <li>Resp match: {{ resp_match_pct }}%</li>
            <li>Text similarity: {{ semantic_pct }}%</li>
        </ul>
        {% if !matched_skills.is_empty() %}<p><strong>Matched skills:</strong> {{ matched_skills }}</p>{% endif %}
        {% if !missing_skills.is_empty() %}<p><strong>Missing skills:</strong> {{ missing_skills }}</p>{% endif %}
        <div class="metadata">
            <p><strong>Generated by resume-reviewer v{{ version }}</strong></p>
            <p><strong>Resume:</strong> {{ resume_file }} | <strong>Job:</strong> {{ job_file }}</p>
        </div>
    </div>
</body>
</html>"#,
    ext = "html"
)]
struct MatchHtmlTemplate {
    include_styles: bool,
    styles: &'static str,
    generated_at: String,
    overall_pct: u8,
    band_class: &'static str,
    band_label: &'static str,
    verdict: &'static str,
    skill_match_pct: u8,
    resp_match_pct: u8,
    semantic_pct: u8,
    matched_skills: String,
    missing_skills: String,
    version: String,
    resume_file: String,
    job_file: String,
}

impl HtmlFormatter {
    pub fn new(include_styles: bool) -> Self {
        Self { include_styles }
    }
}

impl OutputFormatter for HtmlFormatter {
    fn format_review(&self, doc: &ReviewDocument) -> Result<String> {
        let template = ReviewHtmlTemplate {
            include_styles: self.include_styles,
            styles: HTML_STYLES,
            generated_at: doc.metadata.generated_at_display(),
            processing_time: doc.metadata.processing_time_ms,
            needs_work: doc.summary.needs_work,
            already_strong: doc.summary.already_strong,
            weak_sections: html_sections(ReviewReport::group(&doc.review.needs_work())),
            strong_sections: html_sections(ReviewReport::group(&doc.review.already_strong())),
            version: doc.metadata.tool_version.clone(),
            resume_file: doc.metadata.resume_name(),
            job_file: doc.metadata.job_name(),
        };

        template
            .render()
            .map_err(|e| ReviewerError::OutputFormatting(e.to_string()))
    }

    fn format_match(&self, doc: &MatchDocument) -> Result<String> {
        let band_class = match doc.band {
            MatchBand::Excellent => "score-excellent",
            MatchBand::Good => "score-good",
            MatchBand::Fair => "score-fair",
            MatchBand::Poor => "score-poor",
        };

        let template = MatchHtmlTemplate {
            include_styles: self.include_styles,
            styles: HTML_STYLES,
            generated_at: doc.metadata.generated_at_display(),
            overall_pct: doc.overall_pct,
            band_class,
            band_label: doc.band.label(),
            verdict: doc.band.verdict(),
            skill_match_pct: doc.skill_match_pct,
            resp_match_pct: doc.resp_match_pct,
            semantic_pct: doc.semantic_pct,
            matched_skills: doc.score.matched_skills.join(", "),
            missing_skills: doc.score.missing_skills.join(", "),
            version: doc.metadata.tool_version.clone(),
            resume_file: doc.metadata.resume_name(),
            job_file: doc.metadata.job_name(),
        };

        template
            .render()
            .map_err(|e| ReviewerError::OutputFormatting(e.to_string()))
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Html
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::with_options(true, false)
    }

    pub fn with_options(use_colors: bool, detailed: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(true),
            markdown_formatter: MarkdownFormatter::new(true),
            html_formatter: HtmlFormatter::new(true),
        }
    }

    fn formatter(&self, format: OutputFormat) -> &dyn OutputFormatter {
        match format {
            OutputFormat::Console => &self.console_formatter,
            OutputFormat::Json => &self.json_formatter,
            OutputFormat::Markdown => &self.markdown_formatter,
            OutputFormat::Html => &self.html_formatter,
        }
    }

    pub fn render_review(&self, doc: &ReviewDocument, format: OutputFormat) -> Result<String> {
        self.formatter(format).format_review(doc)
    }

    pub fn render_match(&self, doc: &MatchDocument, format: OutputFormat) -> Result<String> {
        self.formatter(format).format_match(doc)
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(file_path, content)?;
    Ok(())
}

/// `<resume stem>_<kind>[_timestamp].<ext>`
pub fn suggest_filename(format: OutputFormat, resume_name: &str, kind: &str, timestamp: bool) -> String {
    let base_name = Path::new(resume_name)
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();

    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    let extension = match format {
        OutputFormat::Console => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "md",
        OutputFormat::Html => "html",
    };

    format!("{}_{}{}.{}", base_name, kind, timestamp_suffix, extension)
}
