//! Crossrank evaluation entrypoint.
//!
//! Loads the configured cross-encoder, reranks every query in
//! `CROSSRANK_DATASET` and prints the average metrics as JSON.

use anyhow::Context;
use mimalloc::MiMalloc;

use crossrank::config::Config;
use crossrank::evaluation::{Evaluator, load_dataset};
use crossrank::{CandleBackend, ModelCacheHandle, Reranker, RerankerConfig};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!(
        model = %config.model,
        model_root = %config.model_root.display(),
        top_k = config.top_k,
        batch_size = config.batch_size,
        "Crossrank starting"
    );

    let dataset_path = config
        .dataset_path
        .clone()
        .context("CROSSRANK_DATASET must point at a JSON evaluation dataset")?;

    let backend = CandleBackend::with_max_seq_len(config.model_root.clone(), config.max_seq_len)?;
    let cache = ModelCacheHandle::new(backend);
    let reranker = Reranker::new(cache.clone(), RerankerConfig::from_config(&config))?;

    reranker.initialize().await?;

    let dataset = load_dataset(&dataset_path).await?;
    tracing::info!(queries = dataset.len(), "Dataset loaded");

    let evaluator = Evaluator::new(&reranker, config.k_values.clone());
    let report = evaluator.run(&dataset).await;

    println!("{}", serde_json::to_string_pretty(&report.averages)?);

    if !report.averages.has_valid_results() {
        anyhow::bail!("no query in the dataset produced a ranking");
    }

    cache.evict(None);
    Ok(())
}
