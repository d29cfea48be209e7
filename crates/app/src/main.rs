use chrono::Utc;
use clap::{Parser, Subcommand};
use meeting_search_core::{
    format_scores, load_schema, CorpusSource, DocumentService, ElasticsearchStore, EngineConfig,
    IndexDeletion, IndexHandle, IndexLifecycle, IngestionPipeline, IngestionSummary,
    QueryService, SearchEngine, SearchResult, DEFAULT_ENDPOINT,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "meeting-search", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Elasticsearch base URL
    #[arg(long, env = "ES_URL", default_value = DEFAULT_ENDPOINT)]
    es_url: String,

    /// Index name
    #[arg(long, env = "ES_INDEX", default_value = "origin-meeting-wiki")]
    index: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "ES_TIMEOUT_SECS", default_value = "30")]
    timeout_secs: u64,

    /// Retries after a failed request before giving up
    #[arg(long, env = "ES_MAX_RETRIES", default_value = "10")]
    max_retries: u32,

    /// Concurrent document writes during a load
    #[arg(long, env = "ES_WRITE_CONCURRENCY", default_value = "1")]
    write_concurrency: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Recreate the index from a schema file and load a JSON meeting collection.
    Init {
        /// Index settings/mappings JSON passed to the engine as-is.
        #[arg(long, default_value = "./setting.json")]
        schema: PathBuf,
        /// JSON object of `{ "<key>": { "text": "..." } }` records.
        #[arg(long, default_value = "../data/meeting_collection.json")]
        corpus: PathBuf,
        /// Run this query after loading and print the scores.
        #[arg(long)]
        sample_query: Option<String>,
    },
    /// Append every .txt file of a folder after the documents already indexed.
    Append {
        /// Folder holding the new transcripts.
        #[arg(long, default_value = "../data/new_data/")]
        folder: PathBuf,
        /// Document printed after loading as a sanity check.
        #[arg(long, default_value = "1")]
        sample_id: String,
    },
    /// Keyword search over document_text.
    Search {
        #[arg(long)]
        query: String,
        /// Number of hits to return.
        #[arg(long, default_value = "10")]
        top_k: usize,
    },
    /// Return every document in the index.
    All,
    /// Print one document.
    Get {
        #[arg(long)]
        id: String,
    },
    /// Check whether a document exists.
    Exists {
        #[arg(long)]
        id: String,
    },
    /// Delete one document and print what was removed.
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Replace a document's text with the contents of a file.
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Print the number of documents in the index.
    Count,
    /// Delete the whole index.
    DropIndex,
    /// Check that the engine answers.
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = EngineConfig::new(&cli.es_url)
        .with_request_timeout(Duration::from_secs(cli.timeout_secs))
        .with_max_retries(cli.max_retries)
        .with_write_concurrency(cli.write_concurrency);
    let engine = ElasticsearchStore::new(config)?;

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        endpoint = %cli.es_url,
        index = %cli.index,
        "meeting-search boot"
    );

    match cli.command {
        Command::Init {
            schema,
            corpus,
            sample_query,
        } => {
            log_engine(&engine).await;
            let handle = IndexHandle::new(&cli.index, load_schema(&schema)?)?;
            let summary = IngestionPipeline::new(&engine)
                .with_write_concurrency(cli.write_concurrency)
                .initialize(&handle, &CorpusSource::Collection(corpus))
                .await?;
            print_summary(&summary);

            if let Some(query) = sample_query {
                let result = QueryService::new(&engine).search(&handle, &query, 10).await?;
                print_result(&result)?;
            }
        }
        Command::Append { folder, sample_id } => {
            log_engine(&engine).await;
            let handle = IndexHandle::named(&cli.index)?;
            let summary = IngestionPipeline::new(&engine)
                .with_write_concurrency(cli.write_concurrency)
                .append(&handle, &CorpusSource::TextDirectory(folder))
                .await?;
            print_summary(&summary);

            match DocumentService::new(&engine).get(&handle, &sample_id).await {
                Ok(record) => println!("sample document {sample_id}:\n{}", record.text),
                Err(error) => warn!(id = %sample_id, error = %error, "sample document unavailable"),
            }
        }
        Command::Search { query, top_k } => {
            let handle = IndexHandle::named(&cli.index)?;
            let result = QueryService::new(&engine).search(&handle, &query, top_k).await?;
            print_result(&result)?;
        }
        Command::All => {
            let handle = IndexHandle::named(&cli.index)?;
            let result = QueryService::new(&engine).match_all(&handle).await?;
            print_result(&result)?;
        }
        Command::Get { id } => {
            let handle = IndexHandle::named(&cli.index)?;
            let record = DocumentService::new(&engine).get(&handle, &id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Exists { id } => {
            let handle = IndexHandle::named(&cli.index)?;
            let exists = DocumentService::new(&engine).exists(&handle, &id).await?;
            println!("{exists}");
        }
        Command::Delete { id } => {
            let handle = IndexHandle::named(&cli.index)?;
            match DocumentService::new(&engine).delete(&handle, &id).await? {
                Some(record) => println!("deleted {id}:\n{}", record.text),
                None => println!("id {id} does not exist in index {}", handle.name),
            }
        }
        Command::Update { id, file } => {
            let handle = IndexHandle::named(&cli.index)?;
            DocumentService::new(&engine)
                .update_from_file(&handle, &id, &file)
                .await?;
            println!("updated doc {id} in {}", handle.name);
        }
        Command::Count => {
            let handle = IndexHandle::named(&cli.index)?;
            let count = DocumentService::new(&engine).count(&handle).await?;
            println!("{count}");
        }
        Command::DropIndex => {
            let handle = IndexHandle::named(&cli.index)?;
            match IndexLifecycle::new(&engine).delete_index(&handle).await? {
                IndexDeletion::Deleted => println!("deleted index {}", handle.name),
                IndexDeletion::Absent => println!("index {} does not exist", handle.name),
            }
        }
        Command::Ping => {
            let reachable = engine.ping().await;
            println!("{reachable}");
            if !reachable {
                anyhow::bail!("engine at {} is not reachable", cli.es_url);
            }
        }
    }

    Ok(())
}

async fn log_engine(engine: &ElasticsearchStore) {
    if !engine.ping().await {
        warn!("engine did not answer ping, requests will retry");
        return;
    }
    match engine.info().await {
        Ok(info) => info!(
            cluster = info.cluster_name.as_deref().unwrap_or("unknown"),
            version = info.version.as_deref().unwrap_or("unknown"),
            "engine reachable"
        ),
        Err(error) => warn!(error = %error, "engine info unavailable"),
    }
}

fn print_summary(summary: &IngestionSummary) {
    let load = &summary.load;
    for failure in &load.failures {
        warn!(
            position = failure.position,
            id = %failure.document_id,
            reason = %failure.reason,
            "document not loaded"
        );
    }

    println!(
        "loaded {}/{} documents (corpus checksum {}); index {} now holds {} documents",
        load.written.len(),
        summary.corpus_len,
        summary.corpus_checksum,
        load.index,
        load.engine_count
    );
    if !load.is_complete() {
        println!("failed ids: {}", load.failed_ids().join(", "));
    }
}

fn print_result(result: &SearchResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    println!("{}", format_scores(result));
    if result.truncated {
        println!("index holds more documents, only the first {} are shown", result.hits.len());
    }
    Ok(())
}
