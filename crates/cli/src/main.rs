use chain_replay::types::Hash;
use chain_replay_cli::commands::{generate, inspect, replay, timeline};
use chain_replay_cli::layout::DataLayout;
use chain_replay_cli::telemetry;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chain-replay")]
#[command(about = "Deterministic block replay: rebuild application state from genesis and a block store", long_about = None)]
struct Cli {
    /// Data directory holding genesis.json, blockstore/ and trace.log.
    #[arg(long, global = true, env = "CHAIN_REPLAY_HOME", default_value = ".")]
    home: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PathArgs {
    /// Genesis file (overrides <home>/genesis.json)
    #[arg(long)]
    genesis: Option<PathBuf>,

    /// Block store directory (overrides <home>/blockstore)
    #[arg(long)]
    blockstore: Option<PathBuf>,

    /// Trace log (overrides <home>/trace.log)
    #[arg(long)]
    trace: Option<PathBuf>,
}

impl PathArgs {
    fn layout(self, home: &std::path::Path) -> DataLayout {
        DataLayout::resolve(home, self.genesis, self.blockstore, self.trace)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Replay every stored block from genesis and verify each commitment.
    Replay {
        #[command(flatten)]
        paths: PathArgs,

        /// Last height to apply
        #[arg(long)]
        stop_height: Option<u64>,

        /// Hex app hash the final state must match
        #[arg(long, value_parser = parse_hash)]
        expect_app_hash: Option<Hash>,
    },
    /// Show the status of the genesis file, block store and trace log.
    Inspect {
        #[command(flatten)]
        paths: PathArgs,
    },
    /// List stored blocks.
    Timeline {
        /// Block store directory (overrides <home>/blockstore)
        #[arg(long)]
        blockstore: Option<PathBuf>,

        /// First height to list
        #[arg(long, default_value_t = 1)]
        from: u64,

        /// Last height to list
        #[arg(long)]
        to: Option<u64>,
    },
    /// Write a demo chain (genesis + block store) into the home directory.
    Generate {
        #[arg(long, default_value = "demo-chain")]
        chain_id: String,

        #[arg(long, default_value_t = 10)]
        blocks: u64,

        #[arg(long, default_value_t = 4)]
        txs_per_block: u64,
    },
}

fn parse_hash(s: &str) -> Result<Hash, String> {
    Hash::from_hex(s).map_err(|e| format!("invalid app hash: {e}"))
}

fn main() -> anyhow::Result<()> {
    telemetry::init_telemetry();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay { paths, stop_height, expect_app_hash } => {
            let args = replay::ReplayArgs { layout: paths.layout(&cli.home), stop_height, expect_app_hash };
            replay::run(args).map(|_| ())
        }
        Commands::Inspect { paths } => inspect::run(&paths.layout(&cli.home)),
        Commands::Timeline { blockstore, from, to } => {
            let dir = blockstore.unwrap_or_else(|| DataLayout::from_home(&cli.home).blockstore);
            timeline::run(&dir, from, to)
        }
        Commands::Generate { chain_id, blocks, txs_per_block } => {
            generate::run(&cli.home, &chain_id, blocks, txs_per_block)
        }
    }
}
