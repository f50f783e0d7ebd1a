// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! The genesis document: the immutable definition of height 0.

use crate::config::MAX_CHAIN_ID_LEN;
use crate::types::hash::Hash;
use crate::types::params::{ConsensusParams, ParamsError};
use crate::types::validator::{PubKey, Validator, ValidatorSet, ValidatorSetError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenesisError {
    #[error("genesis chain_id is empty")]
    EmptyChainId,
    #[error("genesis chain_id is too long: {len} > {max}")]
    ChainIdTooLong { len: usize, max: usize },
    #[error("genesis validator {name:?} has zero power")]
    ZeroPowerValidator { name: String },
    #[error("invalid genesis validator set: {0}")]
    Validators(#[from] ValidatorSetError),
    #[error("invalid genesis consensus params: {0}")]
    Params(#[from] ParamsError),
    #[error("genesis has no validators and the application did not provide any")]
    NoValidators,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisValidator {
    pub pub_key: PubKey,
    pub power: u64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisDoc {
    /// Unix seconds.
    pub genesis_time: i64,
    pub chain_id: String,
    pub consensus_params: ConsensusParams,
    pub validators: Vec<GenesisValidator>,
    /// Commitment the chain starts from; block 1 records it as its app hash.
    pub app_hash: Hash,
    /// Opaque application payload handed to InitChain.
    pub app_state: Vec<u8>,
}

impl GenesisDoc {
    pub fn validate(&self) -> Result<(), GenesisError> {
        if self.chain_id.is_empty() {
            return Err(GenesisError::EmptyChainId);
        }
        if self.chain_id.len() > MAX_CHAIN_ID_LEN {
            return Err(GenesisError::ChainIdTooLong { len: self.chain_id.len(), max: MAX_CHAIN_ID_LEN });
        }
        self.consensus_params.validate()?;
        if let Some(v) = self.validators.iter().find(|v| v.power == 0) {
            return Err(GenesisError::ZeroPowerValidator { name: v.name.clone() });
        }
        self.validator_set()?;
        Ok(())
    }

    pub fn validator_set(&self) -> Result<ValidatorSet, GenesisError> {
        let validators = self
            .validators
            .iter()
            .map(|v| Validator::new(v.pub_key.clone(), v.power))
            .collect();
        Ok(ValidatorSet::new(validators)?)
    }
}
