use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use pos_ledger::application::engine::LedgerEngine;
use pos_ledger::domain::ports::LedgerRepositoryBox;
use pos_ledger::infrastructure::in_memory::InMemoryLedgerRepository;
use pos_ledger::interfaces::csv::payment_writer::PaymentWriter;
use pos_ledger::interfaces::json::event_reader::EventReader;
use pos_ledger::interfaces::json::ledger_writer;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input event log, one JSON event per line
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Output format of the final ledger
    #[arg(long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Reject events that fail validation instead of applying them
    #[arg(long)]
    strict: bool,
}

fn open_repository(db_path: Option<PathBuf>) -> Result<LedgerRepositoryBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = pos_ledger::infrastructure::rocksdb::RocksDBStore::open(path)
                .into_diagnostic()?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            tracing::warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
            Ok(Box::new(InMemoryLedgerRepository::new()))
        }
        None => Ok(Box::new(InMemoryLedgerRepository::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let engine = LedgerEngine::open(open_repository(cli.db_path)?)
        .await
        .into_diagnostic()?
        .with_strict_validation(cli.strict);

    // Replay events
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = EventReader::new(file);
    for (index, event_result) in reader.events().enumerate() {
        match event_result {
            Ok(event) => {
                let kind = event.kind().to_string();
                if let Err(e) = engine.dispatch(event).await {
                    error!(event = index + 1, kind = %kind, "Error dispatching event: {}", e);
                }
            }
            Err(e) => {
                error!(event = index + 1, "Error reading event: {}", e);
            }
        }
    }

    let ledger = engine.into_results().await.into_diagnostic()?;
    info!(payments = ledger.len(), "replay finished");

    let stdout = io::stdout();
    match cli.format {
        OutputFormat::Csv => PaymentWriter::new(stdout.lock())
            .write_ledger(&ledger)
            .into_diagnostic()?,
        OutputFormat::Json => ledger_writer::write_ledger(stdout.lock(), &ledger).into_diagnostic()?,
    }

    Ok(())
}
