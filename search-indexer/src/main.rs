//! Search Indexer Main Entry Point
//!
//! Command line front end for the batch indexer. Documents are read from stdin
//! and committed to OpenSearch in batches; transient per-document failures are
//! retried with exponential backoff.

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use search_indexer::input::{chunk_size, read_documents};
use search_indexer::{Dependencies, IndexerSettings, IndexingEngine, IndexingError};
use search_indexer_repository::{BatchOutcome, IndexingTask, SearchIndexError};
use search_indexer_shared::DocumentKey;
use std::env;
use tokio::io::BufReader;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "search-indexer")]
#[command(about = "Commit documents to the search index with partial-failure retry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload newline-delimited JSON documents read from stdin
    Upload {
        /// Property holding each document's key
        #[arg(long, default_value = "id")]
        key_field: String,
    },
    /// Delete documents by key
    Delete {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Print the indexing activity completion status
    Status,
}

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), IndexingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("search_indexer=info,search_indexer_repository=info"));

    let json_output = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| IndexingError::config(format!("Failed to initialize tracing: {}", e)))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| IndexingError::config(format!("Failed to initialize tracing: {}", e)))?;
    }

    info!(
        service_name = "search-indexer",
        service_version = env!("CARGO_PKG_VERSION"),
        json = json_output,
        "Tracing initialized"
    );

    Ok(())
}

/// Wait for a spawned submission, cancelling it on Ctrl-C.
async fn await_task(task: IndexingTask) -> Result<BatchOutcome, IndexingError> {
    let cancel = task.cancellation_token();
    let join = task.join();
    tokio::pin!(join);

    tokio::select! {
        result = &mut join => Ok(result?),
        _ = tokio::signal::ctrl_c() => {
            warn!("Received shutdown signal, cancelling indexing task");
            cancel.cancel();
            Ok(join.await?)
        }
    }
}

fn log_outcome(chunk: usize, result: &Result<BatchOutcome, IndexingError>) {
    match result {
        Ok(outcome) => info!(
            chunk = chunk,
            attempts = outcome.attempts,
            documents = outcome.results.len(),
            "Batch committed"
        ),
        Err(e) => error!(chunk = chunk, error = %e, "Batch failed"),
    }
}

/// Record a chunk result, stopping early only when the user cancelled.
fn record_result(
    first_error: &mut Option<IndexingError>,
    result: Result<BatchOutcome, IndexingError>,
) -> Result<(), IndexingError> {
    match result {
        Err(e @ IndexingError::Indexing(SearchIndexError::Cancelled)) => Err(e),
        Err(e) => {
            first_error.get_or_insert(e);
            Ok(())
        }
        Ok(_) => Ok(()),
    }
}

async fn upload(engine: &IndexingEngine, key_field: &str) -> Result<(), IndexingError> {
    let documents = read_documents(BufReader::new(tokio::io::stdin()), key_field).await?;
    let size = chunk_size(engine.client().config());
    info!(documents = documents.len(), chunk_size = size, "Read documents from stdin");

    let mut first_error = None;
    for (chunk, documents) in documents.chunks(size).enumerate() {
        let task = engine.spawn_upload(documents.to_vec()).await?;
        let result = await_task(task).await;
        log_outcome(chunk, &result);
        record_result(&mut first_error, result)?;
    }

    first_error.map_or(Ok(()), Err)
}

async fn delete(engine: &IndexingEngine, keys: Vec<String>) -> Result<(), IndexingError> {
    let keys: Vec<DocumentKey> = keys.into_iter().map(DocumentKey::from).collect();
    let size = chunk_size(engine.client().config());

    let mut first_error = None;
    for (chunk, keys) in keys.chunks(size).enumerate() {
        let task = engine.spawn_delete(keys.to_vec()).await?;
        let result = await_task(task).await;
        log_outcome(chunk, &result);
        record_result(&mut first_error, result)?;
    }

    first_error.map_or(Ok(()), Err)
}

/// Initialize the OpenSearch-backed dependencies.
async fn init_dependencies() -> Result<Dependencies, IndexingError> {
    match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            Ok(deps)
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            Err(e)
        }
    }
}

async fn run(command: Commands) -> Result<(), IndexingError> {
    match command {
        // The activity marker is local; reading it does not need a reachable cluster
        Commands::Status => {
            let settings = IndexerSettings::from_env()?;
            let status = Dependencies::read_activity_status(&settings).await?;
            println!("{}", status);
            Ok(())
        }
        Commands::Upload { key_field } => {
            let deps = init_dependencies().await?;
            let result = upload(&deps.engine, &key_field).await;
            deps.engine.shutdown();
            result
        }
        Commands::Delete { keys } => {
            let deps = init_dependencies().await?;
            let result = delete(&deps.engine, keys).await;
            deps.engine.shutdown();
            result
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    init_tracing()?;

    info!("Starting search indexer");

    match run(cli.command).await {
        Ok(()) => {
            info!("Search indexer completed successfully");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Search indexer failed");
            Err(e)
        }
    }
}
