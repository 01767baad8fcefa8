use clap::Parser;
use immolens_cli::{
    cli::{Cli, Command, ExtractArgs, RunArgs},
    config::{Config, OutputFormat, TriggerMode},
    error::Result,
    output::Formatter,
    pipeline::{listing_files, listing_id, Pipeline},
};
use immolens_extractor::{FieldValidator, LlmExtractor};
use immolens_llm::OllamaProvider;
use std::fs;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color = config.settings.color && !cli.no_color;
    let formatter = Formatter::new(format, color);

    match cli.command {
        Command::Extract(args) => execute_extract(args, &config, &formatter).await,
        Command::Run(args) => execute_run(args, &config, &formatter).await,
        Command::Bounds => {
            println!("{}", formatter.format_bounds(&config.bounds)?);
            Ok(())
        }
        Command::CheckLlm => execute_check_llm(&config, &formatter).await,
    }
}

/// Logs go to stderr so JSON output on stdout stays clean.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_pipeline(config: &Config, no_llm: bool) -> Result<Pipeline<OllamaProvider>> {
    let pipeline = Pipeline::new(config)?;
    if no_llm || !config.llm.enabled || config.llm.trigger == TriggerMode::Off {
        return Ok(pipeline);
    }

    let provider = OllamaProvider::new(&config.llm.endpoint, &config.llm.model, &config.extractor.retry)?;
    let llm = LlmExtractor::new(
        provider,
        FieldValidator::new(config.bounds.clone()),
        config.extractor.clone(),
    )?;
    Ok(pipeline.with_llm(llm))
}

async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let pipeline = build_pipeline(config, args.no_llm)?;

    let mut records = Vec::with_capacity(args.files.len());
    for (i, path) in args.files.iter().enumerate() {
        if i > 0 && !config.pipeline.delay().is_zero() {
            tokio::time::sleep(config.pipeline.delay()).await;
        }
        let html = match fs::read_to_string(path) {
            Ok(html) => html,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable listing");
                continue;
            }
        };
        records.push(pipeline.process(&listing_id(path), &html).await);
    }

    println!("{}", formatter.format_records(&records)?);
    Ok(())
}

async fn execute_run(args: RunArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let pipeline = build_pipeline(config, args.no_llm)?;
    let output_dir = args.output.unwrap_or_else(|| config.pipeline.output_dir.clone());

    let files = listing_files(&args.input)?;
    if files.is_empty() {
        println!(
            "{}",
            formatter.warning(&format!("No .html files in {}", args.input.display()))
        );
        return Ok(());
    }

    let report = pipeline
        .run_batch(&files, &output_dir, config.pipeline.top_n)
        .await?;
    println!("{}", formatter.format_report(&report)?);

    if pipeline.llm().is_some_and(|llm| llm.is_disabled()) {
        eprintln!(
            "{}",
            formatter.warning("The model endpoint was unreachable; records were built without it")
        );
    }
    if formatter.format() == OutputFormat::Table {
        println!(
            "{}",
            formatter.info(&format!("Records written to {}", output_dir.display()))
        );
    }
    Ok(())
}

async fn execute_check_llm(config: &Config, formatter: &Formatter) -> Result<()> {
    let provider = OllamaProvider::new(&config.llm.endpoint, &config.llm.model, &config.extractor.retry)?;
    let status = provider.check_availability().await?;
    println!(
        "{}",
        formatter.format_model_status(provider.endpoint(), provider.model(), &status)
    );
    Ok(())
}
