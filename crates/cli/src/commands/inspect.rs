use crate::layout::DataLayout;
use chain_replay::BlockStore;
use chain_replay_store::{load_genesis, FileBlockStore};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

pub fn run(layout: &DataLayout) -> anyhow::Result<()> {
    println!("\nChain Replay Status Report");
    println!("--------------------------");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["File", "Status", "Details"]);

    // 1. Genesis
    if layout.genesis.exists() {
        match load_genesis(&layout.genesis) {
            Ok(genesis) => {
                let msg = format!(
                    "Chain: {}, Validators: {}, Time: {}, App state: {} bytes",
                    genesis.chain_id,
                    genesis.validators.len(),
                    chrono::DateTime::from_timestamp(genesis.genesis_time, 0)
                        .unwrap_or_default()
                        .to_rfc3339(),
                    genesis.app_state.len()
                );
                table.add_row(vec!["Genesis", "FOUND", &msg]);
            }
            Err(e) => {
                table.add_row(vec!["Genesis", "CORRUPT", &e.to_string()]);
            }
        }
    } else {
        table.add_row(vec!["Genesis", "MISSING", ""]);
    }

    // 2. Block store
    if layout.blockstore.exists() {
        match FileBlockStore::open(&layout.blockstore) {
            Ok(store) => {
                let tip = store
                    .load_block_meta(store.height())
                    .ok()
                    .flatten()
                    .map(|m| m.header.app_hash.to_hex())
                    .unwrap_or_else(|| "-".to_string());
                let msg = format!(
                    "Height: {}, Blocks: {}, Log: {} bytes, Tip app hash: {}",
                    store.height(),
                    store.len(),
                    store.log_size(),
                    tip
                );
                table.add_row(vec!["Block store", "FOUND", &msg]);
            }
            Err(e) => {
                table.add_row(vec!["Block store", "CORRUPT", &e.to_string()]);
            }
        }
    } else {
        table.add_row(vec!["Block store", "MISSING", ""]);
    }

    // 3. Trace
    match std::fs::metadata(&layout.trace) {
        Ok(meta) => {
            table.add_row(vec!["Trace log", "FOUND", &format!("{} bytes", meta.len())]);
        }
        Err(_) => {
            table.add_row(vec!["Trace log", "MISSING", "created on first replay"]);
        }
    }

    println!("{table}\n");
    Ok(())
}
