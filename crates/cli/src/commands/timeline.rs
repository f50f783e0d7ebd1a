use chain_replay::BlockStore;
use chain_replay_store::FileBlockStore;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::path::Path;

/// Lists stored block metas from `from` up to `to` (default: store height).
pub fn run(blockstore: &Path, from: u64, to: Option<u64>) -> anyhow::Result<()> {
    let store = FileBlockStore::open(blockstore)?;
    let to = to.unwrap_or(store.height()).min(store.height());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Height", "Time", "Txs", "Block ID", "App Hash"]);

    let mut gaps = Vec::new();
    for height in from.max(1)..=to {
        let Some(meta) = store.load_block_meta(height)? else {
            gaps.push(height);
            continue;
        };
        let ts = chrono::DateTime::from_timestamp(meta.header.time, 0)
            .unwrap_or_default()
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

        table.add_row(vec![
            height.to_string(),
            ts,
            meta.num_txs.to_string(),
            short(&meta.block_id.0.to_hex()),
            short(&meta.header.app_hash.to_hex()),
        ]);
    }

    if !gaps.is_empty() {
        println!("\n⚠️  WARNING: Store has gaps at heights {gaps:?}. Replay will halt there.\n");
    }

    println!("\nBlock Timeline\n");
    println!("{table}\n");

    Ok(())
}

fn short(hex: &str) -> String {
    hex.chars().take(16).collect()
}
