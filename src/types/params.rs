// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Consensus parameters threaded through every height.

use crate::config::MAX_BLOCK_SIZE_BYTES;
use crate::types::hash::Hash;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamsError {
    #[error("block.max_bytes must be greater than 0")]
    ZeroMaxBytes,
    #[error("block.max_bytes is too big: {got} > {max}")]
    MaxBytesTooBig { got: u64, max: u64 },
    #[error("block.max_gas must be >= -1, got {0}")]
    InvalidMaxGas(i64),
    #[error("evidence.max_age_num_blocks must be greater than 0")]
    ZeroEvidenceAge,
    #[error("validator.pub_key_types must not be empty")]
    NoPubKeyTypes,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockParams {
    pub max_bytes: u64,
    /// -1 means unlimited.
    pub max_gas: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceParams {
    pub max_age_num_blocks: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorParams {
    pub pub_key_types: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusParams {
    pub block: BlockParams,
    pub evidence: EvidenceParams,
    pub validator: ValidatorParams,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            block: BlockParams { max_bytes: 22_020_096, max_gas: -1 },
            evidence: EvidenceParams { max_age_num_blocks: 100_000 },
            validator: ValidatorParams { pub_key_types: vec!["ed25519".to_string()] },
        }
    }
}

/// Partial replacement returned by EndBlock. Absent sections are unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParamsUpdate {
    pub block: Option<BlockParams>,
    pub evidence: Option<EvidenceParams>,
    pub validator: Option<ValidatorParams>,
}

impl ConsensusParamsUpdate {
    pub fn is_empty(&self) -> bool {
        self.block.is_none() && self.evidence.is_none() && self.validator.is_none()
    }
}

impl ConsensusParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.block.max_bytes == 0 {
            return Err(ParamsError::ZeroMaxBytes);
        }
        if self.block.max_bytes > MAX_BLOCK_SIZE_BYTES {
            return Err(ParamsError::MaxBytesTooBig { got: self.block.max_bytes, max: MAX_BLOCK_SIZE_BYTES });
        }
        if self.block.max_gas < -1 {
            return Err(ParamsError::InvalidMaxGas(self.block.max_gas));
        }
        if self.evidence.max_age_num_blocks == 0 {
            return Err(ParamsError::ZeroEvidenceAge);
        }
        if self.validator.pub_key_types.is_empty() {
            return Err(ParamsError::NoPubKeyTypes);
        }
        Ok(())
    }

    /// Returns a copy with the present sections of `update` applied. The
    /// result is not validated.
    pub fn update(&self, update: &ConsensusParamsUpdate) -> Self {
        let mut next = self.clone();
        if let Some(block) = &update.block {
            next.block = block.clone();
        }
        if let Some(evidence) = &update.evidence {
            next.evidence = evidence.clone();
        }
        if let Some(validator) = &update.validator {
            next.validator = validator.clone();
        }
        next
    }

    pub fn hash(&self) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.block.max_bytes.to_le_bytes());
        hasher.update(&self.block.max_gas.to_le_bytes());
        hasher.update(&self.evidence.max_age_num_blocks.to_le_bytes());
        hasher.update(&(self.validator.pub_key_types.len() as u64).to_le_bytes());
        for ty in &self.validator.pub_key_types {
            hasher.update(&(ty.len() as u64).to_le_bytes());
            hasher.update(ty.as_bytes());
        }
        Hash::from_hasher(&hasher)
    }
}
