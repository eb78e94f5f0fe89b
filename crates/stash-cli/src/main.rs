use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use serde::Serialize;
use stash_core::app::{AppBuilder, IngestRequest};
use stash_core::impls::{CsvToJson, TextToHtml};
use stash_core::{FileType, Sanitizer, StashConfig, Ttl, classify};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stash")]
#[command(about = "Ephemeral file store: sanitize, classify and ingest uploads", long_about = None)]
struct Args {
    /// Path to the configuration file (TOML). STASH_* environment variables override it.
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the sanitized form of each name
    Sanitize {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Detect the type of a file from its content and name
    Classify {
        file: PathBuf,
        /// Name to classify with instead of the file's own name
        #[arg(long)]
        name: Option<String>,
    },
    /// Store files (optionally converting them) and print the receipts and store status
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Convert to this type before storing (e.g. html, json)
        #[arg(short, long)]
        target: Option<String>,
        /// Time-to-live in seconds, instead of the configured default
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
}

#[derive(Serialize)]
struct Named<'a, T> {
    name: &'a str,
    #[serde(flatten)]
    value: T,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Reads a file, refusing anything larger than `max_size` before loading it.
fn read(path: &Path, max_size: u64) -> Result<Bytes> {
    let len = std::fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?
        .len();
    if len > max_size {
        bail!("{} is {len} bytes, above the {max_size} byte limit", path.display());
    }
    let content = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Bytes::from(content))
}

fn parse_ttl(secs: u64) -> Result<Ttl> {
    match Ttl::from_secs(secs) {
        Some(ttl) => Ok(ttl),
        None => bail!("--ttl-secs must be between 1 and {} (got {secs})", Ttl::MAX_SECS),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG used to control logging level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::default()
            .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let args = Args::parse();
    let config = StashConfig::load(args.config.as_deref()).context("failed to load configuration")?;

    match args.command {
        Command::Sanitize { names } => {
            let sanitizer = Sanitizer::new(config.max_filename_len);
            for name in &names {
                println!("{}", sanitizer.sanitize(name));
            }
        }
        Command::Classify { file, name } => {
            let content = read(&file, config.max_file_size_bytes)?;
            let name = name.unwrap_or_else(|| file_name(&file));
            let classification = classify(&name, &content);
            print_json(&Named {
                name: &name,
                value: classification,
            })?;
        }
        Command::Ingest {
            files,
            target,
            ttl_secs,
        } => {
            let target = target.map(FileType::new);
            let ttl = ttl_secs.map(parse_ttl).transpose()?;

            let max_size = config.max_file_size_bytes;
            let app = AppBuilder::new(config)
                .register_converter(TextToHtml)?
                .register_converter(CsvToJson)?
                .build()?;
            if let Some(target) = &target {
                let producible = app.converters().available().iter().any(|(_, t)| t == target);
                if !producible {
                    bail!("no registered converter produces {target}");
                }
                info!(target = %target, "conversion requested");
            }
            let sweeper = app.spawn_sweeper();
            let ingestor = app.ingestor();

            let mut receipts = Vec::with_capacity(files.len());
            for path in &files {
                let mut req = IngestRequest::new(read(path, max_size)?, file_name(path));
                if let Some(target) = &target {
                    req = req.convert_to(target.clone());
                }
                if let Some(ttl) = ttl {
                    req = req.with_ttl(ttl);
                }
                let receipt = ingestor
                    .ingest(req)
                    .await
                    .with_context(|| format!("failed to ingest {}", path.display()))?;
                receipts.push(receipt);
            }

            print_json(&receipts)?;
            print_json(&app.status())?;
            sweeper.shutdown().await;
        }
    }

    Ok(())
}
