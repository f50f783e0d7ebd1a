use crate::layout::DataLayout;
use anyhow::Context;
use chain_replay::types::Hash;
use chain_replay::{ExhaustReason, ReplayConfig, ReplayDriver, ReplayReport};
use chain_replay_kvstore::KvStoreApp;
use chain_replay_store::{load_genesis, FileBlockStore, TraceLog};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

pub struct ReplayArgs {
    pub layout: DataLayout,
    pub stop_height: Option<u64>,
    pub expect_app_hash: Option<Hash>,
}

pub fn run(args: ReplayArgs) -> anyhow::Result<ReplayReport> {
    let layout = &args.layout;

    let store = FileBlockStore::open(&layout.blockstore)
        .with_context(|| format!("opening block store at {}", layout.blockstore.display()))?;
    let genesis = load_genesis(&layout.genesis)
        .with_context(|| format!("loading genesis from {}", layout.genesis.display()))?;
    let trace = TraceLog::open(&layout.trace)
        .with_context(|| format!("opening trace log at {}", layout.trace.display()))?;

    let config = ReplayConfig { stop_height: args.stop_height, expected_final_app_hash: args.expect_app_hash };

    tracing::info!(
        chain_id = %genesis.chain_id,
        store_height = chain_replay::BlockStore::height(&store),
        stop_height = ?config.stop_height,
        "starting replay"
    );

    let app = KvStoreApp::new().with_trace(Box::new(trace));
    let mut driver = ReplayDriver::new(store, app, genesis, config);

    let report = driver.run().map_err(|e| {
        let at = e.height().map(|h| format!(" at height {h}")).unwrap_or_default();
        let kind = e.kind();
        anyhow::Error::new(e).context(format!("replay halted: {kind} error{at}"))
    })?;

    println!("\nReplay Summary\n");
    println!("{}\n", summary_table(&report));

    Ok(report)
}

pub fn summary_table(report: &ReplayReport) -> Table {
    let reason = match report.exhausted {
        ExhaustReason::EndOfStore => "end of store",
        ExhaustReason::StopHeight => "stop height reached",
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Field", "Value"]);

    table.add_row(vec!["Chain ID".to_string(), report.state.chain_id.clone()]);
    table.add_row(vec!["Final height".to_string(), report.state.last_block_height.to_string()]);
    table.add_row(vec!["App hash".to_string(), report.state.app_hash.to_hex()]);
    table.add_row(vec!["Blocks applied".to_string(), report.blocks_applied.to_string()]);
    table.add_row(vec!["Validators".to_string(), report.state.validators.len().to_string()]);
    table.add_row(vec!["Stopped by".to_string(), reason.to_string()]);
    table.add_row(vec!["Load time".to_string(), format!("{:.3?}", report.timings.load)]);
    table.add_row(vec!["Apply time".to_string(), format!("{:.3?}", report.timings.apply)]);
    table
}
