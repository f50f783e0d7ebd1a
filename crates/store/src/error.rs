use chain_replay::codec::CodecError;
use chain_replay::types::GenesisError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid magic bytes in header")]
    InvalidMagic,
    #[error("Unsupported block log version {0}")]
    UnsupportedVersion(u32),
    #[error("Checksum mismatch at height {height}: expected {expected}, found {found}")]
    ChecksumMismatch {
        height: u64,
        expected: u64,
        found: u64,
    },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
    #[error("Record decode failed: {0}")]
    Codec(#[from] CodecError),
    #[error("Blocks must be appended in order: expected height {expected}, got {got}")]
    HeightGap { expected: u64, got: u64 },
    #[error("Invalid genesis JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid genesis: {0}")]
    Genesis(#[from] GenesisError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
