use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_FILTER: &str =
    "chain_replay=info,chain_replay_store=info,chain_replay_kvstore=info,chain_replay_cli=info";

/// Initialize logging and register metric descriptions. No exporter is
/// installed; metrics go to whatever recorder the embedding process sets.
pub fn init_telemetry() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER));

    // A second init (tests, embedding) keeps the existing subscriber.
    if tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }

    metrics::describe_histogram!("chain_replay_block_load_seconds", "Time taken to load a block and its meta from the store");
    metrics::describe_histogram!("chain_replay_block_apply_seconds", "Time taken to execute and commit a block");
    metrics::describe_counter!("chain_replay_blocks_applied_total", "Total number of blocks replayed");
    metrics::describe_counter!("chain_replay_failures_total", "Total number of replay runs that halted on an error");
    metrics::describe_gauge!("chain_replay_height", "Height of the last replayed block");
}
