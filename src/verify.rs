//! Deterministic Hashing of block contents.

// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::abci::types::ResponseDeliverTx;
use crate::types::{Hash, Header, Tx};

/// Computes the block identifier hash of a header.
///
/// Every field is fed in declaration order with fixed-width little-endian
/// integers and length-prefixed strings, so the result does not depend on
/// any serializer.
///
/// ```text
/// chain_id (len u64 LE + bytes)
/// height (u64 LE)
/// time (i64 LE)
/// last_block_id (0u8 | 1u8 + 32 bytes)
/// data_hash, validators_hash, consensus_hash, app_hash, last_results_hash
/// ```
pub fn header_hash(header: &Header) -> Hash {
    let mut hasher = blake3::Hasher::new();

    hasher.update(&(header.chain_id.len() as u64).to_le_bytes());
    hasher.update(header.chain_id.as_bytes());
    hasher.update(&header.height.to_le_bytes());
    hasher.update(&header.time.to_le_bytes());

    match &header.last_block_id {
        Some(id) => {
            hasher.update(&[1]);
            hasher.update(id.0.as_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }

    hasher.update(header.data_hash.as_bytes());
    hasher.update(header.validators_hash.as_bytes());
    hasher.update(header.consensus_hash.as_bytes());
    hasher.update(header.app_hash.as_bytes());
    hasher.update(header.last_results_hash.as_bytes());

    Hash::from_hasher(&hasher)
}

/// Commitment to an ordered transaction list.
pub fn txs_hash(txs: &[Tx]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(txs.len() as u64).to_le_bytes());
    for tx in txs {
        hasher.update(&(tx.len() as u64).to_le_bytes());
        hasher.update(tx);
    }
    Hash::from_hasher(&hasher)
}

/// Commitment to the deliver results of a block. Only the deterministic
/// parts (code and data) are covered; logs and gas are informational.
pub fn results_hash(results: &[ResponseDeliverTx]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(results.len() as u64).to_le_bytes());
    for res in results {
        hasher.update(&res.code.to_le_bytes());
        hasher.update(&(res.data.len() as u64).to_le_bytes());
        hasher.update(&res.data);
    }
    Hash::from_hasher(&hasher)
}
