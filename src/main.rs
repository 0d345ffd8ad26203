use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use txn_etl::app::etl_use_case::EtlUseCase;
use txn_etl::config::EtlConfig;
use txn_etl::domain::CanonicalBatch;
use txn_etl::infra::http_client::ReqwestHttp;
use txn_etl::logging;
use txn_etl::pipeline::ingestion::{ApiExtractor, Extractor, FileExtractor};
use txn_etl::pipeline::storage::{open_sink, JsonFileSink, Sink};
use txn_etl::pipeline::tasks::{run_task, RetryPolicy, TaskId};

#[derive(Parser)]
#[command(name = "txn_etl")]
#[command(about = "Customer transactions ETL: extract, transform, load")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run fetch_data >> transform_data >> load_data against the API and the configured sink
    Run,
    /// Fetch the raw batch from the API and write it as JSON
    Extract {
        #[arg(long)]
        output: PathBuf,
    },
    /// Transform a raw JSON batch file into a canonical JSON batch file
    Transform {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Load a canonical JSON batch file into the configured sink
    Load {
        #[arg(long)]
        input: PathBuf,
    },
}

fn api_extractor(config: &EtlConfig) -> anyhow::Result<Arc<dyn Extractor>> {
    let http = Arc::new(ReqwestHttp::new(Duration::from_secs(config.api.timeout_seconds))?);
    Ok(Arc::new(ApiExtractor::from_config(http, &config.api)?))
}

async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = EtlConfig::load(cli.config.as_deref())?;
    let retry = RetryPolicy::from(&config.retry);

    match cli.command {
        Commands::Run => {
            let use_case = EtlUseCase::with_default_transformer(api_extractor(&config)?, open_sink(&config.sink)?, retry);
            let summary = use_case.run().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Extract { output } => {
            let extractor = api_extractor(&config)?;
            let raw = run_task(TaskId::FetchData, &retry, || extractor.extract()).await?;
            std::fs::write(&output, serde_json::to_vec_pretty(&raw)?)
                .with_context(|| format!("writing {}", output.display()))?;
            info!(records = raw.len(), path = %output.display(), "Raw batch written");
        }
        Commands::Transform { input, output } => {
            let use_case = EtlUseCase::with_default_transformer(
                Arc::new(FileExtractor::new(&input)),
                Arc::new(JsonFileSink::new(&output)),
                retry,
            );
            let summary = use_case.run().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Load { input } => {
            let bytes = std::fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
            let batch = CanonicalBatch::from_json_slice(&bytes)
                .with_context(|| format!("decoding {}", input.display()))?;
            let sink = open_sink(&config.sink)?;
            let rows = run_task(TaskId::LoadData, &retry, || sink.load(&batch)).await?;
            info!(rows, sink = sink.name(), "Load finished");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    logging::init_logging();
    let cli = Cli::parse();

    if let Err(e) = execute(cli).await {
        error!("{:#}", e);
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}
