// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.
//!
//! Nothing here is retried. Every variant halts replay and names the height
//! it happened at, if any.

use crate::abci::ConnectionError;
use crate::types::{BlockId, GenesisError, Hash, ParamsError, ValidatorSetError};
use core::fmt;
use thiserror::Error;

/// Coarse classification used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Genesis, chain initialization or connection lifecycle.
    Bootstrap,
    /// A height was skipped, repeated, missing or does not link.
    Sequencing,
    /// Data is present but does not decode or does not match its commitment.
    Corruption,
    /// A recomputed commitment differs from the recorded one.
    Divergence,
    /// The application rejected the block.
    Transition,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Bootstrap => "bootstrap",
            ErrorKind::Sequencing => "sequencing",
            ErrorKind::Corruption => "corruption",
            ErrorKind::Divergence => "divergence",
            ErrorKind::Transition => "transition",
        };
        f.write_str(s)
    }
}

/// Which half of a stored height was absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPart {
    Meta,
    Block,
}

impl fmt::Display for BlockPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockPart::Meta => f.write_str("block meta"),
            BlockPart::Block => f.write_str("block"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("invalid genesis: {0}")]
    Genesis(#[from] GenesisError),

    #[error("InitChain failed: {0}")]
    InitChain(#[source] ConnectionError),

    #[error("chain already initialized: InitChain is sent exactly once per run")]
    AlreadyInitialized,

    #[error("replay has not been bootstrapped from genesis")]
    NotBootstrapped,

    #[error("consensus connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("wrong block height: expected {expected}, got {got}")]
    WrongHeight { expected: u64, got: u64 },

    #[error("missing {part} at height {height} (store height {store_height})")]
    MissingBlock { height: u64, part: BlockPart, store_height: u64 },

    #[error("block {height} does not link to the previous block: expected {expected:?}, got {got:?}")]
    BrokenLink { height: u64, expected: Option<BlockId>, got: Option<BlockId> },

    #[error("block {height} has chain id {got:?}, expected {expected:?}")]
    WrongChainId { height: u64, expected: String, got: String },

    #[error("block {height} is invalid: {reason}")]
    InvalidBlock { height: u64, reason: String },

    #[error("corrupt data at height {height}: {reason}")]
    Corruption { height: u64, reason: String },

    #[error("store error at height {height}: {source}")]
    Store {
        height: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("app hash mismatch at height {height}: recorded {recorded}, replayed {replayed}")]
    AppHashMismatch { height: u64, recorded: Hash, replayed: Hash },

    #[error("last results hash mismatch at height {height}: recorded {recorded}, replayed {replayed}")]
    ResultsHashMismatch { height: u64, recorded: Hash, replayed: Hash },

    #[error("validators hash mismatch at height {height}: recorded {recorded}, replayed {replayed}")]
    ValidatorsHashMismatch { height: u64, recorded: Hash, replayed: Hash },

    #[error("consensus params hash mismatch at height {height}: recorded {recorded}, replayed {replayed}")]
    ConsensusHashMismatch { height: u64, recorded: Hash, replayed: Hash },

    #[error("state transition failed at height {height}: {source}")]
    Transition {
        height: u64,
        #[source]
        source: ConnectionError,
    },

    #[error("invalid validator updates at height {height}: {source}")]
    InvalidValidatorUpdates {
        height: u64,
        #[source]
        source: ValidatorSetError,
    },

    #[error("invalid consensus params at height {height}: {source}")]
    InvalidParams {
        height: u64,
        #[source]
        source: ParamsError,
    },

    #[error("replay already failed at height {height}; no further heights are processed")]
    Halted { height: u64 },
}

impl ReplayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReplayError::Genesis(_)
            | ReplayError::InitChain(_)
            | ReplayError::AlreadyInitialized
            | ReplayError::NotBootstrapped
            | ReplayError::Connection(_)
            | ReplayError::Halted { .. } => ErrorKind::Bootstrap,

            ReplayError::WrongHeight { .. }
            | ReplayError::MissingBlock { .. }
            | ReplayError::BrokenLink { .. }
            | ReplayError::WrongChainId { .. }
            | ReplayError::InvalidBlock { .. } => ErrorKind::Sequencing,

            ReplayError::Corruption { .. } | ReplayError::Store { .. } => ErrorKind::Corruption,

            ReplayError::AppHashMismatch { .. }
            | ReplayError::ResultsHashMismatch { .. }
            | ReplayError::ValidatorsHashMismatch { .. }
            | ReplayError::ConsensusHashMismatch { .. } => ErrorKind::Divergence,

            ReplayError::Transition { .. }
            | ReplayError::InvalidValidatorUpdates { .. }
            | ReplayError::InvalidParams { .. } => ErrorKind::Transition,
        }
    }

    /// Height the failure is attributed to. Genesis-time failures report 0.
    pub fn height(&self) -> Option<u64> {
        match self {
            ReplayError::WrongHeight { got, .. } => Some(*got),
            ReplayError::MissingBlock { height, .. }
            | ReplayError::BrokenLink { height, .. }
            | ReplayError::WrongChainId { height, .. }
            | ReplayError::InvalidBlock { height, .. }
            | ReplayError::Corruption { height, .. }
            | ReplayError::Store { height, .. }
            | ReplayError::AppHashMismatch { height, .. }
            | ReplayError::ResultsHashMismatch { height, .. }
            | ReplayError::ValidatorsHashMismatch { height, .. }
            | ReplayError::ConsensusHashMismatch { height, .. }
            | ReplayError::Transition { height, .. }
            | ReplayError::InvalidValidatorUpdates { height, .. }
            | ReplayError::InvalidParams { height, .. }
            | ReplayError::Halted { height } => Some(*height),
            ReplayError::Genesis(_) | ReplayError::InitChain(_) => Some(0),
            ReplayError::AlreadyInitialized | ReplayError::NotBootstrapped | ReplayError::Connection(_) => None,
        }
    }
}

pub type Result<T> = core::result::Result<T, ReplayError>;
