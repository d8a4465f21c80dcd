use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use docsift::archive::TextArchive;
use docsift::config::Config;
use docsift::extraction::ocr::{OcrEngine, OcrSettings};
use docsift::extraction::{ExtractionSettings, SourceDocument, TextExtractor};
use docsift::format::classify;
use docsift::keywords::{KeywordExtractor, KeywordSettings};
use docsift::pipeline::{DocumentPipeline, Submission};
use docsift::sanitize::uploader_label;
use docsift::sink::DelimitedFileSink;
use docsift::summarization::Summarizer;

#[derive(Parser)]
#[command(
    name = "docsift-cli",
    about = "Run local files through the docsift pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process a file end to end and print the record as JSON.
    Process {
        path: PathBuf,
        #[arg(long)]
        mime: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        note: Option<String>,
        /// Skip the record sink.
        #[arg(long)]
        no_sink: bool,
        /// Print the submitter reply after the record.
        #[arg(long)]
        reply: bool,
    },
    /// Print the extracted text and method without summarizing.
    Extract {
        path: PathBuf,
        #[arg(long)]
        mime: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Failed to load config from environment")?;

    match cli.command {
        Command::Process {
            path,
            mime,
            username,
            note,
            no_sink,
            reply,
        } => process(&config, &path, mime, username, note, no_sink, reply).await,
        Command::Extract { path, mime } => extract(&config, &path, mime).await,
    }
}

async fn process(
    config: &Config,
    path: &Path,
    mime: Option<String>,
    username: Option<String>,
    note: Option<String>,
    no_sink: bool,
    reply: bool,
) -> Result<()> {
    let (bytes, filename) = read_input(path)?;
    let mut pipeline = DocumentPipeline::new(
        extractor(config),
        Summarizer::from_config(config).context("Failed to build summarizer")?,
        KeywordExtractor::new(KeywordSettings::from_config(config)),
    );
    if !no_sink {
        pipeline = pipeline.with_sink(Arc::new(DelimitedFileSink::new(&config.record_sink_path)));
    }
    if let Some(dir) = &config.text_dir {
        pipeline = pipeline.with_text_archive(TextArchive::new(dir));
    }

    let mut submission = Submission::new(bytes, filename);
    submission.mime_type = mime;
    submission.uploader = uploader_label(username, None);
    submission.note = note;

    let outcome = match pipeline.process(submission).await {
        Ok(outcome) => outcome,
        Err(error) => bail!("{}: {error}", error.user_message()),
    };
    println!("{}", serde_json::to_string_pretty(&outcome.record)?);
    if let Some(diagnostic) = &outcome.diagnostic {
        eprintln!("diagnostic: {diagnostic}");
    }
    if reply {
        println!();
        println!("{}", outcome.reply);
    }
    Ok(())
}

async fn extract(config: &Config, path: &Path, mime: Option<String>) -> Result<()> {
    let (bytes, filename) = read_input(path)?;
    let format = classify(&filename, mime.as_deref());
    if !format.is_supported() {
        bail!("unsupported file type: {filename}");
    }
    let document = SourceDocument::new(bytes, filename, None, mime, format);
    let result = extractor(config)
        .extract(&document)
        .await
        .context("Extraction failed")?;
    eprintln!(
        "method: {}, pages: {}",
        result.method,
        result.pages.map(|pages| pages.to_string()).unwrap_or_else(|| "-".into())
    );
    if let Some(diagnostic) = &result.diagnostic {
        eprintln!("diagnostic: {diagnostic}");
    }
    println!("{}", result.text);
    Ok(())
}

fn extractor(config: &Config) -> TextExtractor {
    TextExtractor::new(
        ExtractionSettings::from_config(config),
        OcrEngine::tesseract(OcrSettings::from_config(config)),
    )
}

fn read_input(path: &Path) -> Result<(Vec<u8>, String)> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} has no usable file name", path.display()))?;
    Ok((bytes, filename))
}
