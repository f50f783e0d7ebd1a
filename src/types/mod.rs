// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Chain data types: hashes, blocks, validators, consensus parameters and the
//! genesis document.

pub mod hash;
pub mod block;
pub mod validator;
pub mod params;
pub mod genesis;

pub use block::{Block, BlockId, BlockMeta, Header, Tx};
pub use genesis::{GenesisDoc, GenesisError, GenesisValidator};
pub use hash::Hash;
pub use params::{BlockParams, ConsensusParams, ConsensusParamsUpdate, EvidenceParams, ParamsError, ValidatorParams};
pub use validator::{Address, PubKey, Validator, ValidatorSet, ValidatorSetError, ValidatorUpdate};
