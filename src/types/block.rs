// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Finalized blocks as they come out of the block store.

use crate::types::hash::Hash;
use crate::verify::{header_hash, txs_hash};
use core::fmt;
use serde::{Deserialize, Serialize};

/// Opaque transaction payload.
pub type Tx = Vec<u8>;

/// Identifier of a block: the hash of its header.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockId(pub Hash);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub chain_id: String,
    pub height: u64,
    /// Unix seconds.
    pub time: i64,
    /// `None` only for the first block.
    pub last_block_id: Option<BlockId>,
    /// Commitment to `Block::txs`.
    pub data_hash: Hash,
    /// Validator set that applies to this block.
    pub validators_hash: Hash,
    /// Consensus parameters that apply to this block.
    pub consensus_hash: Hash,
    /// App hash recorded live after the previous block was committed.
    pub app_hash: Hash,
    /// Hash of the previous block's deliver results.
    pub last_results_hash: Hash,
}

impl Header {
    pub fn hash(&self) -> Hash {
        header_hash(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    pub txs: Vec<Tx>,
}

impl Block {
    pub fn id(&self) -> BlockId {
        BlockId(self.header.hash())
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// Recomputes the data hash from the transactions themselves.
    pub fn compute_data_hash(&self) -> Hash {
        txs_hash(&self.txs)
    }

    /// Sum of transaction payload sizes.
    pub fn size_bytes(&self) -> u64 {
        self.txs.iter().map(|tx| tx.len() as u64).sum()
    }
}

/// Metadata stored alongside each block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    pub block_id: BlockId,
    pub header: Header,
    pub num_txs: u64,
    pub block_size: u64,
}

impl BlockMeta {
    pub fn new(block: &Block) -> Self {
        Self {
            block_id: block.id(),
            header: block.header.clone(),
            num_txs: block.txs.len() as u64,
            block_size: block.size_bytes(),
        }
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }
}
