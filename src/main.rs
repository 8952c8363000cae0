use clap::Parser;
use miette::{IntoDiagnostic, Result};
use orderflow::application::coordinator::IngestionCoordinator;
use orderflow::application::worker::ConsumerWorker;
use orderflow::config::{PipelineArgs, PipelineConfig};
use orderflow::domain::order::Order;
use orderflow::domain::ports::SharedOrderStore;
use orderflow::infrastructure::fifo_queue::InMemoryFifoQueue;
use orderflow::infrastructure::in_memory::InMemoryOrderStore;
#[cfg(feature = "storage-rocksdb")]
use orderflow::infrastructure::rocksdb::RocksDBOrderStore;
use orderflow::interfaces::csv::order_writer::OrderWriter;
use orderflow::interfaces::gateway::Gateway;
use orderflow::interfaces::jsonl::request_reader::RequestReader;
use orderflow::telemetry;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input requests file: one gateway request (JSON) per line
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "ORDERFLOW_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Drain the queue after this many accepted mutations (0 = only at the end)
    #[arg(long, env = "ORDERFLOW_DELIVER_EVERY", default_value_t = 1)]
    deliver_every: usize,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

fn open_store(db_path: Option<PathBuf>) -> Result<SharedOrderStore> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => Ok(Arc::new(RocksDBOrderStore::open(path)?)),
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Arc::new(InMemoryOrderStore::new()))
        }
        None => Ok(Arc::new(InMemoryOrderStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_logging(cli.verbose);

    let config = PipelineConfig::from(&cli.pipeline);
    let store = open_store(cli.db_path)?;
    let queue = InMemoryFifoQueue::new(config.queue.clone());

    let coordinator =
        IngestionCoordinator::new(store.clone(), Arc::new(queue.clone()), config.ingestion);
    let gateway = Gateway::new(Arc::new(coordinator));
    let worker = ConsumerWorker::new(store.clone(), Arc::new(queue.clone()), config.worker);

    // Feed requests through the front door, delivering queued mutations as we go
    let file = File::open(cli.input).into_diagnostic()?;
    let mut undelivered = 0;
    for request in RequestReader::new(file).requests() {
        match request {
            Ok(request) => {
                let mutating = !request.http_method.eq_ignore_ascii_case("GET");
                let response = gateway.handle(request).await;
                if !response.is_success() {
                    eprintln!(
                        "Request rejected ({}): {}",
                        response.status_code,
                        response.reason().unwrap_or("unknown error")
                    );
                } else if mutating {
                    undelivered += 1;
                }

                if cli.deliver_every > 0 && undelivered >= cli.deliver_every {
                    worker.drain().await?;
                    undelivered = 0;
                }
            }
            Err(e) => {
                eprintln!("Error reading request: {}", e);
            }
        }
    }
    worker.drain().await?;

    let dead_letters = queue.dead_letters().await;
    if !dead_letters.is_empty() {
        eprintln!("WARNING: {} message(s) could not be applied", dead_letters.len());
    }

    // Output final state
    let orders = store
        .all()
        .await?
        .iter()
        .map(Order::from_item)
        .collect::<Result<Vec<_>, _>>()?;
    let stdout = io::stdout();
    let mut writer = OrderWriter::new(stdout.lock());
    writer.write_orders(orders)?;

    Ok(())
}
