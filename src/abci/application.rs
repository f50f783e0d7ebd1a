// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! The state-machine trait implemented by replayable applications.

use crate::abci::types::*;
use std::io::Write;
use thiserror::Error;

/// Append-only sink an application may write execution traces to. The
/// engine hands it over but never reads it.
pub type TraceWriter = Box<dyn Write + Send>;

/// A failure inside the application. Always fatal to replay.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AppError {
    pub message: String,
}

impl AppError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// A deterministic state machine.
///
/// Implementations must not read wall-clock time, the network or any source
/// of randomness: the same calls in the same order must always produce the
/// same commit hashes.
pub trait Application {
    fn info(&self) -> ResponseInfo;

    fn init_chain(&mut self, req: RequestInitChain) -> Result<ResponseInitChain, AppError>;

    fn begin_block(&mut self, req: RequestBeginBlock) -> Result<ResponseBeginBlock, AppError>;

    /// `Err` is reserved for transactions the application cannot process at
    /// all. Rejections that are part of history use a non-zero code.
    fn deliver_tx(&mut self, tx: &[u8]) -> Result<ResponseDeliverTx, AppError>;

    fn end_block(&mut self, req: RequestEndBlock) -> Result<ResponseEndBlock, AppError>;

    fn commit(&mut self) -> Result<ResponseCommit, AppError>;

    /// Called when the connection starts.
    fn on_start(&mut self) -> Result<(), AppError> {
        Ok(())
    }

    /// Called when the connection stops. Flush trace sinks here.
    fn on_stop(&mut self) -> Result<(), AppError> {
        Ok(())
    }
}
