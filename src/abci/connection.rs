// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Ordered, synchronous channel to the application.
//!
//! # Ordering
//! - `init_chain` exactly once, before any block
//! - per height: `begin_block` → `deliver_tx`* → `end_block` → `commit`
//! - begin-block heights strictly increase
//!
//! Every request takes `&mut self`, so two requests can never be in flight
//! on the same connection.

use crate::abci::application::{AppError, Application};
use crate::abci::types::*;
use core::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("consensus connection already started")]
    AlreadyStarted,
    #[error("consensus connection is not running")]
    NotRunning,
    #[error("InitChain was already sent on this connection")]
    InitChainAlreadySent,
    #[error("{request} is out of order: connection is {state}")]
    OutOfOrder { request: &'static str, state: String },
    #[error("{request} failed: {source}")]
    Application {
        request: &'static str,
        #[source]
        source: AppError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingInitChain,
    Ready,
    InBlock(u64),
    BlockEnded(u64),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::AwaitingInitChain => f.write_str("awaiting InitChain"),
            Phase::Ready => f.write_str("between blocks"),
            Phase::InBlock(h) => write!(f, "inside block {h}"),
            Phase::BlockEnded(h) => write!(f, "awaiting Commit for block {h}"),
        }
    }
}

pub struct ConsensusConnection<A: Application> {
    app: A,
    running: bool,
    phase: Phase,
    last_committed: u64,
}

impl<A: Application> ConsensusConnection<A> {
    pub fn new(app: A) -> Self {
        Self {
            app,
            running: false,
            phase: Phase::AwaitingInitChain,
            last_committed: 0,
        }
    }

    pub fn start(&mut self) -> Result<(), ConnectionError> {
        if self.running {
            return Err(ConnectionError::AlreadyStarted);
        }
        self.app
            .on_start()
            .map_err(|source| ConnectionError::Application { request: "Start", source })?;
        self.running = true;
        tracing::debug!("consensus connection started");
        Ok(())
    }

    /// Marks the connection stopped before running the application's stop
    /// hook, so a failing hook still releases the connection.
    pub fn stop(&mut self) -> Result<(), ConnectionError> {
        if !self.running {
            return Err(ConnectionError::NotRunning);
        }
        self.running = false;
        tracing::debug!(last_committed = self.last_committed, "consensus connection stopped");
        self.app
            .on_stop()
            .map_err(|source| ConnectionError::Application { request: "Stop", source })
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Height of the last block committed through this connection.
    pub fn last_committed(&self) -> u64 {
        self.last_committed
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    pub fn into_app(self) -> A {
        self.app
    }

    pub fn info_sync(&mut self) -> Result<ResponseInfo, ConnectionError> {
        self.ensure_running()?;
        Ok(self.app.info())
    }

    pub fn init_chain_sync(&mut self, req: RequestInitChain) -> Result<ResponseInitChain, ConnectionError> {
        self.ensure_running()?;
        if self.phase != Phase::AwaitingInitChain {
            return Err(ConnectionError::InitChainAlreadySent);
        }
        let res = self
            .app
            .init_chain(req)
            .map_err(|source| ConnectionError::Application { request: "InitChain", source })?;
        self.phase = Phase::Ready;
        Ok(res)
    }

    pub fn begin_block_sync(&mut self, req: RequestBeginBlock) -> Result<ResponseBeginBlock, ConnectionError> {
        self.ensure_running()?;
        let height = req.header.height;
        if self.phase != Phase::Ready || height <= self.last_committed {
            return Err(self.out_of_order("BeginBlock"));
        }
        let res = self
            .app
            .begin_block(req)
            .map_err(|source| ConnectionError::Application { request: "BeginBlock", source })?;
        self.phase = Phase::InBlock(height);
        Ok(res)
    }

    pub fn deliver_tx_sync(&mut self, tx: &[u8]) -> Result<ResponseDeliverTx, ConnectionError> {
        self.ensure_running()?;
        if !matches!(self.phase, Phase::InBlock(_)) {
            return Err(self.out_of_order("DeliverTx"));
        }
        self.app
            .deliver_tx(tx)
            .map_err(|source| ConnectionError::Application { request: "DeliverTx", source })
    }

    pub fn end_block_sync(&mut self, req: RequestEndBlock) -> Result<ResponseEndBlock, ConnectionError> {
        self.ensure_running()?;
        let height = match self.phase {
            Phase::InBlock(h) if h == req.height => h,
            _ => return Err(self.out_of_order("EndBlock")),
        };
        let res = self
            .app
            .end_block(req)
            .map_err(|source| ConnectionError::Application { request: "EndBlock", source })?;
        self.phase = Phase::BlockEnded(height);
        Ok(res)
    }

    pub fn commit_sync(&mut self) -> Result<ResponseCommit, ConnectionError> {
        self.ensure_running()?;
        let height = match self.phase {
            Phase::BlockEnded(h) => h,
            _ => return Err(self.out_of_order("Commit")),
        };
        let res = self
            .app
            .commit()
            .map_err(|source| ConnectionError::Application { request: "Commit", source })?;
        self.phase = Phase::Ready;
        self.last_committed = height;
        Ok(res)
    }

    fn ensure_running(&self) -> Result<(), ConnectionError> {
        if self.running {
            Ok(())
        } else {
            Err(ConnectionError::NotRunning)
        }
    }

    fn out_of_order(&self, request: &'static str) -> ConnectionError {
        ConnectionError::OutOfOrder { request, state: self.phase.to_string() }
    }
}
