//! cpty CLI - Command-line interface
//!
//! Usage:
//!   cpty extract [PATH...] [--format json|text]
//!   cpty evaluate <manifest.json> [--ordered] [--ignore-case]
//!   cpty config

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use futures::future::try_join_all;
use serde::Serialize;
use tokio::io::AsyncReadExt;

use cpty_core::{AppConfig, CptyError, LoggingConfig};
use cpty_extractor::metrics::{parse_manifest, AggregateMetrics, Evaluator, GoldDocument};
use cpty_extractor::{CounterpartyExtractor, ExtractionResult, PartyExtractor};

const STDIN: &str = "-";

#[derive(Parser)]
#[command(name = "cpty")]
#[command(about = "Find the counterparties named in swap confirmation text")]
#[command(version)]
struct Cli {
    /// TOML config file; environment variables take precedence
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract counterparties from text files (or stdin)
    Extract {
        /// Text files; none or "-" reads stdin
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Score extraction against a labelled manifest
    Evaluate {
        /// JSON array of {"path" | "text", "counterparties"}
        manifest: PathBuf,

        /// Left and right party must be in gold order
        #[arg(long)]
        ordered: bool,

        /// Compare names case-insensitively
        #[arg(long)]
        ignore_case: bool,

        /// Print metrics as JSON instead of a report
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

/// One extracted file, tagged with where it came from
#[derive(Serialize)]
struct SourcedResult<'a> {
    source: &'a str,
    #[serde(flatten)]
    result: &'a ExtractionResult,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    let extractor = CounterpartyExtractor::with_config(config.extractor.clone());
    tracing::debug!(
        min_line_len = extractor.config().min_line_len,
        min_entity_len = extractor.config().min_entity_len,
        "extractor thresholds"
    );

    match cli.command {
        Commands::Extract { paths, format } => extract(&extractor, paths, format).await?,
        Commands::Evaluate {
            manifest,
            ordered,
            ignore_case,
            json,
        } => {
            let mut evaluator = Evaluator::new().with_ignore_case(ignore_case);
            if ordered {
                evaluator = evaluator.ordered();
            }
            let aggregate = evaluate(&extractor, &evaluator, &manifest).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&aggregate)?);
            } else {
                print!("{}", aggregate.report());
            }
        }
        Commands::Config => print!("{}", config.to_toml()?),
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Read a text file, or stdin for "-"; invalid UTF-8 is replaced, not rejected
async fn read_text(path: &Path) -> cpty_core::Result<String> {
    let bytes = if path.as_os_str() == STDIN {
        let mut buf = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buf)
            .await
            .map_err(|e| CptyError::io(STDIN, e))?;
        buf
    } else {
        tokio::fs::read(path)
            .await
            .map_err(|e| CptyError::io(path, e))?
    };

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

async fn extract(
    extractor: &CounterpartyExtractor,
    mut paths: Vec<PathBuf>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if paths.is_empty() {
        paths.push(PathBuf::from(STDIN));
    }

    let texts = try_join_all(paths.iter().map(|path| read_text(path))).await?;
    let labelled = paths.len() > 1;

    for (path, text) in paths.iter().zip(texts) {
        let source = path.display().to_string();
        let result = extractor.extract(&text);
        tracing::info!(
            source = %source,
            count = result.count,
            via = %result.source,
            "extracted counterparties"
        );

        match format {
            OutputFormat::Json if source == STDIN => {
                println!("{}", serde_json::to_string(&result)?);
            }
            OutputFormat::Json => {
                let sourced = SourcedResult {
                    source: &source,
                    result: &result,
                };
                println!("{}", serde_json::to_string(&sourced)?);
            }
            OutputFormat::Text => {
                for line in text_lines(&source, &result, labelled) {
                    println!("{line}");
                }
            }
        }
    }

    Ok(())
}

fn text_lines(source: &str, result: &ExtractionResult, labelled: bool) -> Vec<String> {
    result
        .counterparties
        .iter()
        .map(|name| {
            if labelled {
                format!("{source}: {name}")
            } else {
                name.clone()
            }
        })
        .collect()
}

/// Manifest paths are relative to the manifest itself
fn resolve_document_path(manifest: &Path, document: &Path) -> PathBuf {
    if document.is_absolute() {
        return document.to_path_buf();
    }
    manifest
        .parent()
        .map(|dir| dir.join(document))
        .unwrap_or_else(|| document.to_path_buf())
}

async fn load_document_text(manifest: &Path, document: &GoldDocument) -> cpty_core::Result<String> {
    match (&document.text, &document.path) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) => read_text(&resolve_document_path(manifest, path)).await,
        (None, None) => Err(CptyError::Manifest(
            "entry has neither \"path\" nor \"text\"".to_string(),
        )),
    }
}

async fn evaluate(
    extractor: &CounterpartyExtractor,
    evaluator: &Evaluator,
    manifest: &Path,
) -> anyhow::Result<AggregateMetrics> {
    let json = tokio::fs::read_to_string(manifest)
        .await
        .map_err(|e| CptyError::io(manifest, e))?;
    let documents = parse_manifest(&json)
        .with_context(|| format!("loading manifest {}", manifest.display()))?;

    let texts = try_join_all(
        documents
            .iter()
            .map(|document| load_document_text(manifest, document)),
    )
    .await?;

    let mut aggregate = AggregateMetrics::default();
    for (index, (document, text)) in documents.iter().zip(texts).enumerate() {
        let result = extractor.extract(&text);
        let metrics = evaluator.evaluate(&result, &document.counterparties);
        if !metrics.is_exact() {
            tracing::warn!(
                document = index,
                expected = ?document.counterparties,
                found = ?result.counterparties,
                "counterparty mismatch"
            );
        }
        aggregate.add(&metrics, result.source);
    }

    Ok(aggregate)
}
