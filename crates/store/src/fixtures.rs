//! Demo and test chains, produced by running the key-value app live.

use crate::blockstore::BlockStoreWriter;
use crate::genesis::save_genesis;
use anyhow::Context;
use chain_replay::abci::ConsensusConnection;
use chain_replay::types::{BlockMeta, ConsensusParams, GenesisDoc, GenesisValidator, Hash, PubKey, Tx};
use chain_replay::{init_chain, BlockExecutor, ChainState};
use chain_replay_kvstore::{KvStoreApp, KvTx};
use std::fs;
use std::path::{Path, PathBuf};

pub const GENESIS_FILE: &str = "genesis.json";
pub const BLOCKSTORE_DIR: &str = "blockstore";

/// 2024-01-01T00:00:00Z
pub const DEMO_GENESIS_TIME: i64 = 1_704_067_200;
pub const DEMO_BLOCK_INTERVAL: i64 = 5;

pub struct FixturePaths {
    pub genesis: PathBuf,
    pub blockstore: PathBuf,
}

/// What a generated chain committed to.
pub struct GeneratedChain {
    pub paths: FixturePaths,
    pub height: u64,
    pub app_hash: Hash,
}

pub fn demo_genesis(chain_id: &str) -> GenesisDoc {
    GenesisDoc {
        genesis_time: DEMO_GENESIS_TIME,
        chain_id: chain_id.to_string(),
        consensus_params: ConsensusParams::default(),
        validators: vec![
            GenesisValidator { pub_key: PubKey(vec![0xa1; 32]), power: 10, name: "alpha".to_string() },
            GenesisValidator { pub_key: PubKey(vec![0xb2; 32]), power: 10, name: "beta".to_string() },
        ],
        app_hash: Hash::ZERO,
        app_state: br#"{"greeting":"hello"}"#.to_vec(),
    }
}

/// Transactions for `height`. Besides plain writes, height 2 carries a
/// rejected transaction, height 3 adds a validator and height 4 raises
/// the block size limit.
pub fn demo_txs(height: u64, txs_per_block: u64) -> Vec<Tx> {
    let mut txs: Vec<Tx> = (0..txs_per_block)
        .map(|i| KvTx::Set { key: format!("key-{height}-{i}"), value: format!("value-{height}-{i}") }.encode())
        .collect();
    match height {
        2 => txs.push(b"val:not-hex!1".to_vec()),
        3 => txs.push(format!("val:{}!5", PubKey(vec![0xc3; 32]).to_hex()).into_bytes()),
        4 => txs.push(KvTx::MaxBytes(4 * 1024 * 1024).encode()),
        _ => {}
    }
    txs
}

/// Writes `genesis.json` and `blockstore/` under `dir` and fills the store
/// with `blocks` heights executed against a live [`KvStoreApp`].
pub fn generate_chain(dir: &Path, chain_id: &str, blocks: u64, txs_per_block: u64) -> anyhow::Result<GeneratedChain> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let paths = FixturePaths { genesis: dir.join(GENESIS_FILE), blockstore: dir.join(BLOCKSTORE_DIR) };

    let genesis = demo_genesis(chain_id);
    save_genesis(&paths.genesis, &genesis).context("writing genesis")?;

    let mut writer = BlockStoreWriter::open(&paths.blockstore).context("opening block store")?;
    anyhow::ensure!(writer.height() == 0, "block store at {} is not empty", paths.blockstore.display());

    let mut conn = ConsensusConnection::new(KvStoreApp::new());
    conn.start()?;
    let result = execute_chain(&mut conn, &genesis, &mut writer, blocks, txs_per_block);

    // The connection is stopped on every path.
    let stopped = conn.stop();
    let state = match result {
        Ok(state) => {
            stopped?;
            state
        }
        Err(e) => {
            if let Err(stop_err) = stopped {
                tracing::error!(error = %stop_err, "failed to stop connection after generation error");
            }
            return Err(e);
        }
    };

    tracing::info!(height = state.last_block_height, app_hash = %state.app_hash, "generated chain");
    Ok(GeneratedChain { paths, height: state.last_block_height, app_hash: state.app_hash })
}

fn execute_chain(
    conn: &mut ConsensusConnection<KvStoreApp>,
    genesis: &GenesisDoc,
    writer: &mut BlockStoreWriter,
    blocks: u64,
    txs_per_block: u64,
) -> anyhow::Result<ChainState> {
    let mut state = init_chain(conn, genesis)?;
    for height in 1..=blocks {
        let time = genesis.genesis_time + height as i64 * DEMO_BLOCK_INTERVAL;
        let block = state.make_block(time, demo_txs(height, txs_per_block));
        let id = block.id();
        state = BlockExecutor::new(conn)
            .apply_block(&state, &id, &block)
            .with_context(|| format!("executing block {height}"))?;
        writer
            .append(&BlockMeta::new(&block), &block)
            .with_context(|| format!("storing block {height}"))?;
    }
    Ok(state)
}
