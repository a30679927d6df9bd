//! CLI interface for the resume reviewer

use crate::config::OutputFormat;
use crate::retrieval::generate::DEFAULT_SAMPLE_COUNT;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "resume-reviewer")]
#[command(about = "Review résumé bullets against a job description and score ATS match")]
#[command(long_about = "Flags weak résumé bullets, rewrites them with retrieved exemplar bullets and a hosted language model, and computes a job match score")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assess every bullet and rewrite the weak ones
    Review {
        /// Path to resume file (PDF, TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to job description file (TXT, MD)
        #[arg(short, long)]
        job: PathBuf,

        /// Output format: console, json, markdown, html
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Let the language model split the résumé into bullets
        #[arg(long)]
        llm_parse: bool,

        /// Suggest a metric phrase for bullets without one
        #[arg(long)]
        suggest_metrics: bool,

        /// Only assess; keep every bullet as written
        #[arg(long)]
        no_rewrite: bool,

        /// Exemplars retrieved per weak bullet
        #[arg(short, long)]
        k: Option<usize>,

        /// Output detailed analysis
        #[arg(short, long)]
        detailed: bool,
    },

    /// Compute the job match score
    Match {
        /// Path to resume file (PDF, TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to job description file (TXT, MD)
        #[arg(short, long)]
        job: PathBuf,

        /// Output format: console, json, markdown, html
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Use token overlap instead of embeddings for responsibilities
        #[arg(long)]
        no_embeddings: bool,

        /// Output detailed analysis
        #[arg(short, long)]
        detailed: bool,
    },

    /// Check bullet strength without a job description
    Assess {
        /// Bullets to check
        #[arg(required = true)]
        bullets: Vec<String>,
    },

    /// Ask the language model for sample résumés to seed the corpus
    Generate {
        /// resumes.json to write
        #[arg(short, long, default_value = "resumes.json")]
        output: PathBuf,

        /// How many résumés to request
        #[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLE_COUNT)]
        count: usize,
    },

    /// Build an exemplar corpus from a JSON array of sample résumés
    Corpus {
        /// resumes.json
        #[arg(short, long)]
        input: PathBuf,

        /// corpus.json to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Exemplar index commands
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum IndexAction {
    /// Embed a corpus and write the index
    Build {
        /// corpus.json
        #[arg(long)]
        corpus: PathBuf,

        /// Index directory (defaults to the configured one)
        #[arg(short, long)]
        index: Option<PathBuf>,
    },

    /// Show the exemplars closest to a query bullet
    Query {
        /// A sample bullet
        #[arg(short, long)]
        query: String,

        /// How many neighbours to return
        #[arg(short, long)]
        k: Option<usize>,

        /// Comma separated technologies every result should mention
        #[arg(short, long, value_delimiter = ',')]
        tech: Vec<String>,

        /// Index directory (defaults to the configured one)
        #[arg(short, long)]
        index: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        "html" => Ok(OutputFormat::Html),
        _ => Err(format!("Invalid output format: {}. Supported: console, json, markdown, html", format)),
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_output_format() {
        assert_eq!(parse_output_format("MD").unwrap(), OutputFormat::Markdown);
        assert_eq!(parse_output_format("json").unwrap(), OutputFormat::Json);
        assert!(parse_output_format("pdf").is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension(Path::new("cv.PDF"), &["pdf", "txt"]).is_ok());
        assert!(validate_file_extension(Path::new("cv.docx"), &["pdf"]).is_err());
        assert!(validate_file_extension(Path::new("cv"), &["pdf"]).is_err());
    }

    #[test]
    fn test_index_query_tech_list() {
        let cli = Cli::try_parse_from([
            "resume-reviewer",
            "index",
            "query",
            "--query",
            "Built APIs",
            "--tech",
            "python,aws",
        ])
        .unwrap();

        match cli.command {
            Commands::Index { action: IndexAction::Query { tech, k, .. } } => {
                assert_eq!(tech, vec!["python", "aws"]);
                assert_eq!(k, None);
            }
            _ => panic!("expected index query"),
        }
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::try_parse_from(["resume-reviewer", "generate"]).unwrap();
        match cli.command {
            Commands::Generate { output, count } => {
                assert_eq!(output, PathBuf::from("resumes.json"));
                assert_eq!(count, 20);
            }
            _ => panic!("expected generate"),
        }

        let cli = Cli::try_parse_from(["resume-reviewer", "generate", "-n", "5", "-o", "data/r.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Generate { count: 5, .. }));
    }

    #[test]
    fn test_config_reset_parses_with_custom_path() {
        let cli = Cli::try_parse_from(["resume-reviewer", "-c", "bad.toml", "config", "reset"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("bad.toml")));
        assert!(matches!(cli.command, Commands::Config { action: Some(ConfigAction::Reset) }));
    }

    #[test]
    fn test_review_flags() {
        let cli = Cli::try_parse_from([
            "resume-reviewer",
            "-v",
            "review",
            "-r",
            "cv.pdf",
            "-j",
            "job.txt",
            "--no-rewrite",
            "-k",
            "5",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Review { no_rewrite, k, llm_parse, .. } => {
                assert!(no_rewrite);
                assert_eq!(k, Some(5));
                assert!(!llm_parse);
            }
            _ => panic!("expected review"),
        }
    }
}
