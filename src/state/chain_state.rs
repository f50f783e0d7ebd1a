// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Chain State: "the application as of height H".
//!
//! # Invariants
//! - State at height H is a pure function of (genesis, blocks[1..=H])
//! - Only the block executor produces a successor state; the previous value
//!   is never mutated in place

use crate::types::{Block, BlockId, ConsensusParams, GenesisDoc, GenesisError, Hash, Header, Tx, ValidatorSet};
use crate::verify::txs_hash;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainState {
    pub chain_id: String,

    pub last_block_height: u64,
    pub last_block_id: Option<BlockId>,
    /// Unix seconds. Genesis time at height 0.
    pub last_block_time: i64,

    /// Validators for the next block.
    pub validators: ValidatorSet,
    pub last_height_validators_changed: u64,

    /// Consensus params for the next block.
    pub consensus_params: ConsensusParams,
    pub last_height_params_changed: u64,

    /// Hash of the deliver results of the last block.
    pub last_results_hash: Hash,
    /// Application-state commitment after the last block.
    pub app_hash: Hash,
}

impl ChainState {
    /// Builds the height-0 state. InitChain has not been sent yet; the
    /// validator set may still be empty at this point.
    pub fn from_genesis(genesis: &GenesisDoc) -> Result<Self, GenesisError> {
        genesis.validate()?;

        Ok(Self {
            chain_id: genesis.chain_id.clone(),
            last_block_height: 0,
            last_block_id: None,
            last_block_time: genesis.genesis_time,
            validators: genesis.validator_set()?,
            last_height_validators_changed: 1,
            consensus_params: genesis.consensus_params.clone(),
            last_height_params_changed: 1,
            last_results_hash: Hash::ZERO,
            app_hash: genesis.app_hash,
        })
    }

    pub fn next_height(&self) -> u64 {
        self.last_block_height + 1
    }

    pub fn is_genesis(&self) -> bool {
        self.last_block_height == 0
    }

    /// Builds the next block on top of this state, with every header
    /// commitment taken from the state. This is how a live chain produces
    /// blocks; replay only ever reads them.
    pub fn make_block(&self, time: i64, txs: Vec<Tx>) -> Block {
        let header = Header {
            chain_id: self.chain_id.clone(),
            height: self.next_height(),
            time,
            last_block_id: self.last_block_id,
            data_hash: txs_hash(&txs),
            validators_hash: self.validators.hash(),
            consensus_hash: self.consensus_params.hash(),
            app_hash: self.app_hash,
            last_results_hash: self.last_results_hash,
        };
        Block { header, txs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GenesisValidator, PubKey};

    fn genesis() -> GenesisDoc {
        GenesisDoc {
            genesis_time: 1_600_000_000,
            chain_id: "state-test".to_string(),
            consensus_params: ConsensusParams::default(),
            validators: vec![GenesisValidator { pub_key: PubKey(vec![7; 32]), power: 5, name: "v".to_string() }],
            app_hash: Hash::digest(b"initial"),
            app_state: b"{}".to_vec(),
        }
    }

    #[test]
    fn test_genesis_state() {
        let state = ChainState::from_genesis(&genesis()).unwrap();
        assert!(state.is_genesis());
        assert_eq!(state.next_height(), 1);
        assert_eq!(state.last_block_id, None);
        assert_eq!(state.last_block_time, 1_600_000_000);
        assert_eq!(state.app_hash, Hash::digest(b"initial"));
        assert_eq!(state.validators.total_power(), 5);
    }

    #[test]
    fn test_invalid_genesis_is_rejected() {
        let mut g = genesis();
        g.chain_id.clear();
        assert_eq!(ChainState::from_genesis(&g), Err(GenesisError::EmptyChainId));
    }

    #[test]
    fn test_make_block_commits_to_state() {
        let state = ChainState::from_genesis(&genesis()).unwrap();
        let block = state.make_block(1_600_000_001, vec![b"a=b".to_vec()]);

        assert_eq!(block.header.height, 1);
        assert_eq!(block.header.chain_id, "state-test");
        assert_eq!(block.header.app_hash, state.app_hash);
        assert_eq!(block.header.validators_hash, state.validators.hash());
        assert_eq!(block.header.consensus_hash, state.consensus_params.hash());
        assert_eq!(block.header.data_hash, block.compute_data_hash());
    }
}
