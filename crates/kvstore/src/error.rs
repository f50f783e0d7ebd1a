// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KvStoreError {
    #[error("Empty transaction")]
    EmptyTx,

    #[error("Transaction is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),

    #[error("Malformed validator update {0:?}: expected val:<hex pubkey>!<power>")]
    MalformedValidator(String),

    #[error("Malformed param update {0:?}: expected param:<name>!<value>")]
    MalformedParam(String),

    #[error("Unknown consensus param {0:?}")]
    UnknownParam(String),

    #[error("Invalid genesis app state: {0}")]
    InvalidAppState(#[from] serde_json::Error),

    #[error("Trace write failed: {0}")]
    Trace(#[from] std::io::Error),
}

impl KvStoreError {
    /// Non-zero response code for transactions that are rejected but stay
    /// in history. `None` for errors that must halt the chain.
    pub fn reject_code(&self) -> Option<u32> {
        match self {
            KvStoreError::MalformedValidator(_) => Some(2),
            KvStoreError::MalformedParam(_) | KvStoreError::UnknownParam(_) => Some(3),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, KvStoreError>;
