// src/main.rs
use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use snow2notion::output::{deliver, render_extraction, DeliveryTarget, OutputPlan};
use snow2notion::{
    extract_page, CommandLineInput, Extraction, ExternalMediaResolver, NotionHttpClient,
    NotionPageWriter, PageWriter, PipelineConfig,
};
use std::fs;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("snow2notion.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    // stdout is reserved for the dry-run report
    let console_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("console")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Converts the capture, then either reports it or writes it to Notion.
async fn execute_pipeline(config: &PipelineConfig) -> anyhow::Result<()> {
    let html = fs::read_to_string(&config.html_file)
        .with_context(|| format!("Failed to read {}", config.html_file.display()))?;

    let resolver = ExternalMediaResolver::new(config.extraction.base_url.clone());
    let extraction = extract_page(&html, &config.extraction, &resolver).await?;
    report_extraction(&extraction);

    let rendered = render_extraction(&extraction)?;
    let mut plan = OutputPlan::new();
    if let Some(path) = &config.output {
        plan = plan.with_operation(DeliveryTarget::WriteFile {
            path: path.clone(),
            content: rendered.clone(),
        });
    }

    let Some(target) = &config.target else {
        if config.output.is_none() {
            plan = plan.with_operation(DeliveryTarget::PrintToStdout { content: rendered });
        }
        finish_delivery(plan)?;
        return Ok(());
    };
    finish_delivery(plan)?;

    let client = NotionHttpClient::new(&target.api_key)?;
    let writer = NotionPageWriter::new(client);
    let metadata = config.page_metadata(target.database_id.clone(), extraction.first_heading());
    let receipt = writer.write_page(&metadata, &extraction.blocks).await?;

    println!("✓ Created Notion page \"{}\": {}", metadata.title, receipt.url);
    Ok(())
}

fn finish_delivery(plan: OutputPlan) -> anyhow::Result<()> {
    let report = deliver(plan);
    if !report.is_success() {
        let failures: Vec<&str> = report.failed.iter().map(|(_, e)| e.as_str()).collect();
        anyhow::bail!("Failed to write output: {}", failures.join("; "));
    }
    for completed in &report.completed {
        if let DeliveryTarget::WriteFile { path, .. } = completed {
            eprintln!("✓ Extraction saved to {}", path.display());
        }
    }
    Ok(())
}

fn report_extraction(extraction: &Extraction) {
    eprintln!(
        "📄 Converted {} top-level block(s) from '{}'",
        extraction.blocks.len(),
        extraction.selector
    );
    if !extraction.videos.is_empty() {
        eprintln!("🎬 Found {} embedded video(s)", extraction.videos.len());
    }
    for error in &extraction.validation.errors {
        eprintln!("⚠️  {}", error);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = PipelineConfig::resolve(cli)?;

    execute_pipeline(&config).await
}
