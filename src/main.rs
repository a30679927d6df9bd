//! resume-reviewer: résumé bullet review and job match scoring

use clap::Parser;
use colored::Colorize;
use log::{error, info, warn};
use resume_reviewer::cli::{self, Cli, Commands, ConfigAction, IndexAction};
use resume_reviewer::config::{Config, OutputFormat};
use resume_reviewer::error::{Result, ReviewerError};
use resume_reviewer::input::InputManager;
use resume_reviewer::input::ResumeParser;
use resume_reviewer::llm::{LlmBulletParser, OpenAiClient, Rewriter};
use resume_reviewer::output::{
    save_report_to_file, suggest_filename, MatchDocument, ReportGenerator, ReportMetadata, ReviewDocument,
};
use resume_reviewer::processing::assessor::assess_bullet_strength;
use resume_reviewer::processing::embeddings::{EmbeddingBackend, Embedder};
use resume_reviewer::processing::matcher::MatchScorer;
use resume_reviewer::processing::skills::SkillExtractor;
use resume_reviewer::retrieval::corpus::{build_corpus_file, load_corpus};
use resume_reviewer::retrieval::{ExemplarIndex, Retriever, SampleGenerator};
use resume_reviewer::review::{ReviewOptions, ReviewPipeline};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

#[tokio::main]
async fn main() {
    // API keys may live in a local .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);

    // Reset and path must work even when the current file no longer loads
    if let Commands::Config {
        action: Some(action @ (ConfigAction::Reset | ConfigAction::Path)),
    } = &cli.command
    {
        if let Err(e) = run_config_action(action, &config_path) {
            error!("Command failed: {}", e);
            process::exit(1);
        }
        return;
    }

    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("Run `resume-reviewer config reset` to restore defaults at {}", config_path.display());
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, &config_path).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config, config_path: &Path) -> Result<()> {
    match command {
        Commands::Review {
            resume,
            job,
            output,
            save,
            llm_parse,
            suggest_metrics,
            no_rewrite,
            k,
            detailed,
        } => {
            let options = ReviewOptions {
                k: k.unwrap_or(config.retrieval.k),
                do_rewrite: !no_rewrite,
                suggest_metrics,
            };
            run_review(&config, &resume, &job, output, save, llm_parse, options, detailed).await?;
        }

        Commands::Match {
            resume,
            job,
            output,
            save,
            no_embeddings,
            detailed,
        } => {
            run_match(&config, &resume, &job, output, save, no_embeddings, detailed).await?;
        }

        Commands::Assess { bullets } => {
            for bullet in &bullets {
                let assessment = assess_bullet_strength(bullet);
                if assessment.is_strong {
                    println!("{} {}", "✔ strong".green().bold(), bullet);
                } else {
                    let issues: Vec<&str> = assessment.issues.iter().map(|i| i.key()).collect();
                    println!("{} {}", "✘ weak  ".red().bold(), bullet);
                    println!("         {}", issues.join(", ").yellow());
                }
            }
        }

        Commands::Generate { output, count } => {
            let client = OpenAiClient::new(&config.llm, config.api_key()?)?;
            let written = SampleGenerator::new(client, &config.llm).generate_file(count, &output).await?;
            println!("✅ Wrote {} sample résumés to {}", written, output.display());
        }

        Commands::Corpus { input, output } => {
            let count = build_corpus_file(&input, &output).await?;
            println!("✅ Wrote {} bullets to {}", count, output.display());
        }

        Commands::Index { action } => match action {
            IndexAction::Build { corpus, index } => {
                let index_dir = index.unwrap_or_else(|| config.retrieval.index_dir.clone());
                let entries = load_corpus(&corpus).await?;
                let skills = SkillExtractor::with_extra_skills(&config.skills.extra)?;
                let embedder = EmbeddingBackend::from_config(&config)?;

                let start = Instant::now();
                let built = ExemplarIndex::build(&entries, &embedder, &skills).await?;
                built.save(&index_dir).await?;
                println!(
                    "✅ Indexed {} exemplars ({}-d, {}) in {:.2?}",
                    built.len(),
                    built.dimension,
                    built.model,
                    start.elapsed()
                );
                println!("📁 Location: {}", index_dir.display());
            }

            IndexAction::Query { query, k, tech, index } => {
                let index_dir = index.unwrap_or_else(|| config.retrieval.index_dir.clone());
                let k = k.unwrap_or(config.retrieval.k);
                let loaded = ExemplarIndex::load(&index_dir).await?;
                let embedder = EmbeddingBackend::from_config(&config)?;
                let retriever = Retriever::new(loaded, embedder, config.retrieval.fetch_multiplier);

                let tech: Vec<String> = tech.iter().map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty()).collect();
                let results = retriever.get_similar(&query, k, &tech).await?;

                println!("\nTop {} matches for query:\n  \"{}\"\n", k, query);
                for (i, text) in results.iter().enumerate() {
                    println!("{}. {}\n", i + 1, text);
                }
            }
        },

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => show_config(&config, config_path)?,
            Some(action) => run_config_action(&action, config_path)?,
        },
    }

    Ok(())
}

fn run_config_action(action: &ConfigAction, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Reset => {
            Config::reset(config_path)?;
            println!("✅ Configuration reset to defaults at {}", config_path.display());
        }
        ConfigAction::Path => println!("{}", config_path.display()),
        ConfigAction::Show => show_config(&Config::load_from(config_path)?, config_path)?,
    }
    Ok(())
}

fn show_config(config: &Config, config_path: &Path) -> Result<()> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| ReviewerError::Configuration(format!("Failed to serialize config: {}", e)))?;
    println!("⚙️  Current Configuration ({})\n", config_path.display());
    println!("{}", rendered);
    Ok(())
}

fn output_format(output: Option<String>, config: &Config) -> Result<OutputFormat> {
    match output {
        Some(format) => cli::parse_output_format(&format).map_err(ReviewerError::InvalidInput),
        None => Ok(config.output.format),
    }
}

fn validate_inputs(resume: &Path, job: &Path) -> Result<()> {
    cli::validate_file_extension(resume, &["pdf", "txt", "md", "markdown"])
        .map_err(|e| ReviewerError::InvalidInput(format!("Resume file: {}", e)))?;
    cli::validate_file_extension(job, &["txt", "md", "markdown"])
        .map_err(|e| ReviewerError::InvalidInput(format!("Job description file: {}", e)))?;
    Ok(())
}

fn emit(content: &str, save: Option<PathBuf>) -> Result<()> {
    match save {
        Some(path) => {
            save_report_to_file(content, &path)?;
            println!("💾 Report saved to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Load the exemplar index and its embedder; review still runs without them
async fn load_retriever(config: &Config) -> Option<Retriever<EmbeddingBackend>> {
    let index = match ExemplarIndex::load(&config.retrieval.index_dir).await {
        Ok(index) => index,
        Err(e) => {
            warn!("Rewriting without exemplars: {}", e);
            return None;
        }
    };

    match EmbeddingBackend::from_config(config) {
        Ok(embedder) => Some(Retriever::new(index, embedder, config.retrieval.fetch_multiplier)),
        Err(e) => {
            warn!("Rewriting without exemplars: {}", e);
            None
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_review(
    config: &Config,
    resume: &Path,
    job: &Path,
    output: Option<String>,
    save: Option<PathBuf>,
    llm_parse: bool,
    options: ReviewOptions,
    detailed: bool,
) -> Result<()> {
    validate_inputs(resume, job)?;
    let format = output_format(output, config)?;
    let start = Instant::now();

    info!("Reviewing {} against {}", resume.display(), job.display());
    let mut input_manager = InputManager::new();
    let job_text = input_manager.extract_text(job).await?;

    let needs_model = options.do_rewrite || options.suggest_metrics || llm_parse;
    let api_key = if needs_model { config.api_key()? } else { String::new() };
    let client = OpenAiClient::new(&config.llm, api_key)?;

    let skills = SkillExtractor::with_extra_skills(&config.skills.extra)?;
    let retriever = if options.do_rewrite { load_retriever(config).await } else { None };
    let embedding_model = retriever.as_ref().map(|r| r.index().model.clone());

    let pipeline = ReviewPipeline::new(
        skills.clone(),
        retriever,
        Rewriter::new(client.clone(), &config.llm),
        options,
    )
    .with_parser(ResumeParser::new(skills));

    let report = if llm_parse {
        let resume_text = input_manager.extract_text(resume).await?;
        let bullets = LlmBulletParser::new(&client, &config.llm).parse(&resume_text).await?;
        pipeline.review_bullets(bullets, &job_text).await?
    } else {
        let lines = input_manager.extract_lines(resume).await?;
        pipeline.review_lines(&lines, &job_text).await?
    };

    if report.results.is_empty() {
        warn!("No bullets found under Experience, Internships or Projects");
    }

    let llm_model = needs_model.then(|| client.model().to_string());
    let metadata = ReportMetadata::new(resume, job)
        .with_models(embedding_model, llm_model)
        .with_processing_time(start.elapsed().as_millis() as u64);
    let doc = ReviewDocument::new(metadata, report);

    let generator = ReportGenerator::with_options(config.output.color_output && save.is_none(), detailed || config.output.detailed);
    let content = generator.render_review(&doc, format)?;

    let save = save.map(|path| with_default_name(path, format, resume, "review"));
    emit(&content, save)
}

async fn run_match(
    config: &Config,
    resume: &Path,
    job: &Path,
    output: Option<String>,
    save: Option<PathBuf>,
    no_embeddings: bool,
    detailed: bool,
) -> Result<()> {
    validate_inputs(resume, job)?;
    let format = output_format(output, config)?;
    let start = Instant::now();

    let mut input_manager = InputManager::new();
    let job_text = input_manager.extract_text(job).await?;
    let lines = input_manager.extract_lines(resume).await?;

    let skills = SkillExtractor::with_extra_skills(&config.skills.extra)?;
    let parser = ResumeParser::new(skills.clone());
    let mut bullets: Vec<String> = parser.parse_bullets(&lines).into_iter().map(|b| b.bullet).collect();
    if bullets.is_empty() {
        warn!("No bullets found; scoring every résumé line instead");
        bullets = lines.iter().map(|l| l.trim().to_string()).collect();
    }

    let embedder = if no_embeddings {
        None
    } else {
        match EmbeddingBackend::from_config(config) {
            Ok(embedder) => Some(embedder),
            Err(e) => {
                warn!("Falling back to lexical responsibility matching: {}", e);
                None
            }
        }
    };

    let scorer = MatchScorer::new(skills, &config.scoring)?;
    let score = scorer.score(&job_text, &bullets, embedder.as_ref()).await?;

    let metadata = ReportMetadata::new(resume, job)
        .with_models(embedder.as_ref().map(|e| e.model_name().to_string()), None)
        .with_processing_time(start.elapsed().as_millis() as u64);
    let doc = MatchDocument::new(metadata, score);

    let generator = ReportGenerator::with_options(config.output.color_output && save.is_none(), detailed || config.output.detailed);
    let content = generator.render_match(&doc, format)?;

    let save = save.map(|path| with_default_name(path, format, resume, "match"));
    emit(&content, save)
}

/// A directory passed to `--save` gets a generated file name
fn with_default_name(path: PathBuf, format: OutputFormat, resume: &Path, kind: &str) -> PathBuf {
    if path.is_dir() {
        path.join(suggest_filename(format, &resume.to_string_lossy(), kind, true))
    } else {
        path
    }
}
