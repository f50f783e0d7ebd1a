use anyhow::Context;
use chain_replay_store::fixtures;
use std::path::Path;

pub fn run(home: &Path, chain_id: &str, blocks: u64, txs_per_block: u64) -> anyhow::Result<()> {
    let chain = fixtures::generate_chain(home, chain_id, blocks, txs_per_block)
        .with_context(|| format!("generating demo chain in {}", home.display()))?;

    println!("\nGenerated chain {chain_id:?}");
    println!("  genesis:    {}", chain.paths.genesis.display());
    println!("  blockstore: {}", chain.paths.blockstore.display());
    println!("  height:     {}", chain.height);
    println!("  app hash:   {}\n", chain.app_hash);
    Ok(())
}
