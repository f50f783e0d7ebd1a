// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Request and response messages.

use crate::types::{BlockId, ConsensusParams, ConsensusParamsUpdate, Hash, Header, ValidatorSet, ValidatorUpdate};
use serde::{Deserialize, Serialize};

/// Response code for an accepted transaction.
pub const CODE_OK: u32 = 0;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseInfo {
    pub data: String,
    pub last_block_height: u64,
    pub last_block_app_hash: Hash,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestInitChain {
    /// Unix seconds.
    pub time: i64,
    pub chain_id: String,
    pub consensus_params: ConsensusParams,
    pub validators: Vec<ValidatorUpdate>,
    pub app_state_bytes: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseInitChain {
    /// Replaces the genesis consensus params when present.
    pub consensus_params: Option<ConsensusParams>,
    /// Replaces the genesis validator set when non-empty.
    pub validators: Vec<ValidatorUpdate>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestBeginBlock {
    pub hash: BlockId,
    pub header: Header,
    pub validators: ValidatorSet,
    pub consensus_params: ConsensusParams,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseBeginBlock {}

/// Outcome of a single transaction. A non-zero `code` marks a rejected
/// transaction that is still part of history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDeliverTx {
    pub code: u32,
    pub data: Vec<u8>,
    pub log: String,
    pub gas_used: i64,
}

impl ResponseDeliverTx {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn rejected(code: u32, log: impl Into<String>) -> Self {
        Self { code, log: log.into(), ..Self::default() }
    }

    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestEndBlock {
    pub height: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseEndBlock {
    pub validator_updates: Vec<ValidatorUpdate>,
    pub consensus_param_updates: Option<ConsensusParamsUpdate>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseCommit {
    /// The application-state commitment after this height.
    pub data: Hash,
}
