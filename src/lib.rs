// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! chain-replay: a deterministic block replay engine.
//!
//! Rebuilds an application's state from genesis by feeding every finalized
//! block, in height order, through an [`abci::Application`] and checks each
//! recomputed commitment against the one recorded in the chain.

pub mod config;
pub mod error;
pub mod types;
pub mod verify;
pub mod codec;
pub mod state;
pub mod abci;
pub mod store;
pub mod executor;
pub mod replay;

pub use config::ReplayConfig;
pub use error::{ErrorKind, ReplayError, Result};
pub use executor::{init_chain, BlockExecutor};
pub use replay::{ExhaustReason, HeightProgress, ReplayDriver, ReplayPhase, ReplayReport, StepOutcome};
pub use state::ChainState;
pub use store::{BlockStore, MemBlockStore};

#[cfg(test)]
mod tests;
