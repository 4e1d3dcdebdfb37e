//! springshift - classify a Java/Spring codebase and convert representative classes
//!
//! Walks a source tree, asks the configured LLM to describe every class, converts
//! the first controller, service and data-access class, and writes
//! `metadata.json` next to the converted files.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Logs: $XDG_STATE_HOME/springshift/springshift.log (~/.local/state/springshift/springshift.log)
//! - Config: $XDG_CONFIG_HOME/springshift/config.toml (~/.config/springshift/config.toml)

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use springshift_core::pipeline::{self, Survey};
use springshift_core::{llm, Category, Config, Pipeline, PipelineEvent, Report};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "springshift")]
#[command(about = "Classify a Java codebase by role and convert representative classes")]
#[command(version)]
struct Args {
    /// Root of the source tree to analyze
    #[arg(default_value = "./java-codebase")]
    root: PathBuf,

    /// Directory for converted files and the report (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file to use instead of the XDG default
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source file suffix to pick up, e.g. ".java" (overrides config)
    #[arg(short, long)]
    extension: Option<String>,

    /// Dry run - discover and categorize files without calling the LLM
    #[arg(long)]
    dry_run: bool,

    /// Print every analyzed file
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    let _log_guard = springshift_core::logging::init(&config.logging)
        .context("failed to initialize logging")?;

    if let Some(output) = &args.output {
        config.pipeline.output_dir = output.clone();
    }
    if let Some(extension) = &args.extension {
        config.pipeline.source_extension = extension.clone();
    }
    config
        .pipeline
        .validate()
        .context("invalid pipeline configuration")?;

    let run = springshift_core::logging::run_span(&args.root, args.dry_run);
    let _entered = run.enter();
    tracing::info!("springshift starting");

    if args.dry_run {
        let survey = pipeline::survey(&args.root, &config.pipeline)
            .with_context(|| format!("failed to read {}", args.root.display()))?;
        print_survey(&survey, args.verbose);
        return Ok(());
    }

    let llm_config = config.require_llm()?;
    let client = llm::create_client(llm_config).context("failed to create LLM client")?;
    let provider = format!("{:?}", llm_config.provider).to_lowercase();
    run.record("provider", provider.as_str());
    println!("LLM: {:?} / {}", llm_config.provider, llm_config.model);

    let mut pipeline = Pipeline::new(&args.root, config.pipeline, client);
    let progress = ProgressBar::hidden();
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let verbose = args.verbose;
    let report = pipeline
        .run_with_progress(|event| match event {
            PipelineEvent::Discovered { total } => {
                println!("Found {} source file(s) under {}", total, args.root.display());
                progress.set_length(total as u64);
                progress.set_draw_target(indicatif::ProgressDrawTarget::stderr());
            }
            PipelineEvent::Analyzing { path, .. } => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                progress.set_message(name);
            }
            PipelineEvent::Analyzed { record } => {
                progress.inc(1);
                if verbose {
                    progress.println(format!(
                        "  {} -> {}{}",
                        record.file_path.display(),
                        record.category,
                        if record.is_degraded() { " (analysis failed)" } else { "" }
                    ));
                }
            }
            PipelineEvent::Converting {
                category,
                class_name,
            } => {
                progress.finish_and_clear();
                println!("Converting {}: {}", category, class_name);
            }
            PipelineEvent::NoRepresentative { category } => {
                progress.finish_and_clear();
                println!("No {} files found for conversion", category);
            }
            PipelineEvent::Converted {
                record,
                placeholder,
            } => {
                if placeholder {
                    println!(
                        "  ! conversion failed, placeholder saved to {}",
                        record.converted_file.display()
                    );
                } else {
                    println!("  saved {}", record.converted_file.display());
                }
            }
        })
        .with_context(|| format!("analysis of {} failed", args.root.display()))?;
    progress.finish_and_clear();

    print_summary(&report, &pipeline.config().report_path());
    tracing::info!("springshift finished");
    Ok(())
}

fn print_summary(report: &Report, report_path: &std::path::Path) {
    println!("\nAnalysis completed successfully!");
    println!("Total files analyzed: {}", report.analysis.total_files);
    println!("Controllers: {}", report.count(Category::Controller));
    println!("Services: {}", report.count(Category::Service));
    println!("DAOs: {}", report.count(Category::DataAccess));
    let degraded = report.classes.iter().filter(|c| c.is_degraded()).count();
    if degraded > 0 {
        println!("Analysis failures: {}", degraded);
    }
    println!("Conversions completed: {}", report.conversions.len());
    println!("Report: {}", report_path.display());
    println!(
        "Log: {}",
        springshift_core::logging::log_file_path().display()
    );
}

fn print_survey(survey: &Survey, verbose: bool) {
    println!("Dry run - no LLM calls made");
    println!("Total files: {}", survey.total());
    for (category, files) in &survey.files {
        println!("  {}: {}", category, files.len());
        if verbose {
            for file in files {
                println!("    {}", file.display());
            }
        }
    }
    if !survey.unreadable.is_empty() {
        println!("Unreadable files: {}", survey.unreadable.len());
    }
}
