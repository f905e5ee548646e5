//! CLI for eventdex.
//!
//! Reads device events as JSON Lines from a local file or stdin, maps each one
//! to an index document and writes the documents out, either one per line or
//! as a single JSON array ready for a Solr `/update` request. Cumulative
//! counters are kept in a stats file.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use eventdex_core::{AnyDeviceEvent, EventKind, IndexableDocument};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter (e.g. "debug", "eventdex_core=trace"); falls back to RUST_LOG, then "warn"
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map device events to index documents
    Map {
        #[command(subcommand)]
        source: MapSource,
    },
}

#[derive(Subcommand)]
enum MapSource {
    /// Read events from a JSON Lines file
    File {
        /// Input file path
        #[arg(long)]
        path: PathBuf,

        #[command(flatten)]
        options: MapOptions,
    },
    /// Read events from stdin
    Stdin {
        #[command(flatten)]
        options: MapOptions,
    },
}

#[derive(Args, Debug, Clone)]
struct MapOptions {
    /// Start from line number (0-based)
    #[arg(long, default_value = "0")]
    line_offset: u64,

    /// Write documents to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Output layout
    #[arg(long, value_enum, default_value = "jsonl")]
    format: OutputFormat,

    /// Log and count events that cannot be mapped instead of aborting
    #[arg(long)]
    skip_invalid: bool,

    /// Path to the stats file
    #[arg(long, default_value = "data/eventdex.stats.json")]
    stats_file: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    /// One document per line
    Jsonl,
    /// A single JSON array of documents
    SolrJson,
}

#[derive(Serialize, Deserialize, Debug)]
struct MappingStats {
    total_mapped: u64,
    total_failed: u64,
    by_kind: HashMap<String, u64>,
    #[serde(with = "time::serde::iso8601")]
    last_updated: OffsetDateTime,
}

impl Default for MappingStats {
    fn default() -> Self {
        Self {
            total_mapped: 0,
            total_failed: 0,
            by_kind: HashMap::new(),
            last_updated: OffsetDateTime::now_utc(),
        }
    }
}

impl MappingStats {
    fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = File::open(path)?;
        let stats = serde_json::from_reader(file)?;
        Ok(stats)
    }

    fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Merges the counts of a batch whose documents were written.
    fn record_batch(&mut self, batch: &MappedBatch) {
        self.total_mapped += batch.documents.len() as u64;
        self.total_failed += batch.failed;
        for (kind, count) in &batch.by_kind {
            *self.by_kind.entry(kind.as_str().to_string()).or_insert(0) += count;
        }
    }

    fn record_failed(&mut self) {
        self.total_failed += 1;
    }
}

/// An event together with the 0-based input line it came from.
#[derive(Debug)]
struct InputEvent {
    line: u64,
    event: AnyDeviceEvent,
}

#[derive(Debug)]
struct ReadResult {
    events: Vec<InputEvent>,
    next_offset: u64,
}

fn read_events(reader: impl BufRead, offset: u64) -> Result<ReadResult> {
    let mut events = Vec::new();
    let mut lines_read: u64 = 0;

    for (idx, line) in reader.lines().enumerate() {
        let idx = idx as u64;
        if idx < offset {
            continue;
        }
        let line = line.with_context(|| format!("Failed to read line {idx}"))?;
        lines_read += 1;
        if line.trim().is_empty() {
            continue;
        }
        let event: AnyDeviceEvent = serde_json::from_str(&line)
            .with_context(|| format!("Invalid event on line {idx}"))?;
        events.push(InputEvent { line: idx, event });
    }

    let next_offset = offset.checked_add(lines_read).context("Line offset overflow")?;

    Ok(ReadResult {
        events,
        next_offset,
    })
}

/// Documents mapped in one run. Counted into the stats only once written.
#[derive(Debug, Default)]
struct MappedBatch {
    documents: Vec<IndexableDocument>,
    by_kind: HashMap<EventKind, u64>,
    failed: u64,
}

fn map_events(events: &[InputEvent], skip_invalid: bool) -> Result<MappedBatch> {
    let mut batch = MappedBatch {
        documents: Vec::with_capacity(events.len()),
        ..MappedBatch::default()
    };

    for input in events {
        match input.event.to_document() {
            Ok(doc) => {
                *batch.by_kind.entry(input.event.kind()).or_insert(0) += 1;
                batch.documents.push(doc);
            }
            Err(e) if skip_invalid => {
                tracing::warn!(line = input.line, error = %e, "skipping event that cannot be mapped");
                batch.failed += 1;
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to map event on line {}", input.line)));
            }
        }
    }

    Ok(batch)
}

fn write_documents(
    documents: &[IndexableDocument],
    format: OutputFormat,
    mut writer: impl Write,
) -> Result<()> {
    match format {
        OutputFormat::Jsonl => {
            for doc in documents {
                serde_json::to_writer(&mut writer, doc)?;
                writer.write_all(b"\n")?;
            }
        }
        OutputFormat::SolrJson => {
            serde_json::to_writer_pretty(&mut writer, documents)?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn run_map(reader: impl BufRead, options: &MapOptions) -> Result<()> {
    let read = read_events(reader, options.line_offset)?;

    let mut stats = MappingStats::load(&options.stats_file).unwrap_or_else(|e| {
        tracing::warn!(
            path = %options.stats_file.display(),
            error = %e,
            "failed to read stats; starting fresh"
        );
        MappingStats::default()
    });

    let batch = match map_events(&read.events, options.skip_invalid) {
        Ok(batch) => batch,
        Err(e) => {
            stats.record_failed();
            stats.last_updated = OffsetDateTime::now_utc();
            if let Err(save_err) = stats.save(&options.stats_file) {
                tracing::error!(
                    path = %options.stats_file.display(),
                    error = %save_err,
                    "failed to save stats after aborted run"
                );
            }
            return Err(e);
        }
    };

    match &options.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            write_documents(&batch.documents, options.format, BufWriter::new(file))?;
        }
        None => write_documents(&batch.documents, options.format, io::stdout().lock())?,
    }

    stats.record_batch(&batch);
    stats.last_updated = OffsetDateTime::now_utc();
    stats.save(&options.stats_file).context("Failed to save stats")?;

    tracing::info!(
        documents = batch.documents.len(),
        failed = batch.failed,
        events = read.events.len(),
        "mapping run finished"
    );
    eprintln!(
        "Mapped {} events. Resume with --line-offset {}",
        batch.documents.len(),
        read.next_offset
    );

    Ok(())
}

fn init_logging(level: Option<&str>, json: bool) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log filter: {level}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref(), cli.log_json)?;

    match cli.command {
        Commands::Map { source } => match source {
            MapSource::File { path, options } => {
                let f = File::open(&path)
                    .with_context(|| format!("Failed to open input file {}", path.display()))?;
                run_map(BufReader::new(f), &options)
            }
            MapSource::Stdin { options } => run_map(io::stdin().lock(), &options),
        },
    }
}
