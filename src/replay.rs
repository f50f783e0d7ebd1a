// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Replay Driver.
//!
//! Rebuilds state from genesis by reading finalized blocks out of a
//! [`BlockStore`] in height order and pushing each one through the
//! [`BlockExecutor`].
//!
//! # Lifecycle
//! `Uninitialized → GenesisApplied → Replaying → (Exhausted | Failed)`
//!
//! Both terminal phases are sticky. Once a height fails, no later height is
//! looked at.

use crate::abci::{Application, ConsensusConnection};
use crate::config::ReplayConfig;
use crate::error::{BlockPart, ReplayError, Result};
use crate::executor::{init_chain, BlockExecutor};
use crate::state::ChainState;
use crate::store::BlockStore;
use crate::types::{Block, BlockId, BlockMeta, GenesisDoc, Hash};
use std::time::{Duration, Instant};

/// Why replay stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustReason {
    /// The next height is not in the store and nothing declares it should be.
    EndOfStore,
    /// The configured stop height has been applied.
    StopHeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayPhase {
    Uninitialized,
    GenesisApplied,
    Replaying,
    Exhausted(ExhaustReason),
    /// Height whose processing failed. 0 for bootstrap failures.
    Failed { height: u64 },
}

impl ReplayPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReplayPhase::Exhausted(_) | ReplayPhase::Failed { .. })
    }
}

/// Cumulative time spent reading blocks versus executing them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayTimings {
    pub load: Duration,
    pub apply: Duration,
}

impl ReplayTimings {
    pub fn total(&self) -> Duration {
        self.load + self.apply
    }
}

/// What one successful step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeightProgress {
    pub height: u64,
    pub block_id: BlockId,
    pub app_hash: Hash,
    pub num_txs: usize,
    pub load: Duration,
    pub apply: Duration,
    /// Running totals including this height.
    pub total: ReplayTimings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Applied(HeightProgress),
    Exhausted(ExhaustReason),
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub state: ChainState,
    pub exhausted: ExhaustReason,
    pub blocks_applied: u64,
    pub timings: ReplayTimings,
}

pub struct ReplayDriver<S: BlockStore, A: Application> {
    store: S,
    conn: ConsensusConnection<A>,
    genesis: GenesisDoc,
    config: ReplayConfig,
    phase: ReplayPhase,
    state: Option<ChainState>,
    timings: ReplayTimings,
    blocks_applied: u64,
}

impl<S: BlockStore, A: Application> ReplayDriver<S, A> {
    pub fn new(store: S, app: A, genesis: GenesisDoc, config: ReplayConfig) -> Self {
        Self {
            store,
            conn: ConsensusConnection::new(app),
            genesis,
            config,
            phase: ReplayPhase::Uninitialized,
            state: None,
            timings: ReplayTimings::default(),
            blocks_applied: 0,
        }
    }

    pub fn phase(&self) -> ReplayPhase {
        self.phase
    }

    /// Last committed state. `None` before bootstrap.
    pub fn state(&self) -> Option<&ChainState> {
        self.state.as_ref()
    }

    pub fn timings(&self) -> ReplayTimings {
        self.timings
    }

    pub fn blocks_applied(&self) -> u64 {
        self.blocks_applied
    }

    pub fn connection(&self) -> &ConsensusConnection<A> {
        &self.conn
    }

    pub fn into_app(self) -> A {
        self.conn.into_app()
    }

    pub fn start(&mut self) -> Result<()> {
        self.conn.start()?;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        self.conn.stop()?;
        Ok(())
    }

    /// Builds the height-0 state and sends InitChain. Only valid once.
    pub fn bootstrap(&mut self) -> Result<&ChainState> {
        if self.phase != ReplayPhase::Uninitialized {
            return Err(ReplayError::AlreadyInitialized);
        }

        match init_chain(&mut self.conn, &self.genesis) {
            Ok(state) => {
                self.phase = ReplayPhase::GenesisApplied;
                Ok(self.state.insert(state))
            }
            Err(e) => {
                self.fail(0, &e);
                Err(e)
            }
        }
    }

    /// Applies the next height, or reports that there is nothing left.
    pub fn step(&mut self) -> Result<StepOutcome> {
        match self.phase {
            ReplayPhase::Uninitialized => return Err(ReplayError::NotBootstrapped),
            ReplayPhase::Exhausted(reason) => return Ok(StepOutcome::Exhausted(reason)),
            ReplayPhase::Failed { height } => return Err(ReplayError::Halted { height }),
            ReplayPhase::GenesisApplied | ReplayPhase::Replaying => {}
        }

        let state = self.state.as_ref().ok_or(ReplayError::NotBootstrapped)?;
        let height = state.next_height();

        if self.config.stop_height.is_some_and(|stop| height > stop) {
            return Ok(self.exhaust(ExhaustReason::StopHeight));
        }

        match self.try_step(height) {
            Ok(Some(progress)) => Ok(StepOutcome::Applied(progress)),
            Ok(None) => Ok(self.exhaust(ExhaustReason::EndOfStore)),
            Err(e) => {
                self.fail(height, &e);
                Err(e)
            }
        }
    }

    /// Starts the connection, bootstraps if needed and steps until a
    /// terminal phase. The connection is stopped on every path.
    pub fn run(&mut self) -> Result<ReplayReport> {
        self.run_with(|_| {})
    }

    /// Like [`run`](Self::run), calling `on_height` after every applied
    /// height.
    pub fn run_with(&mut self, mut on_height: impl FnMut(&HeightProgress)) -> Result<ReplayReport> {
        if !self.conn.is_running() {
            self.start()?;
        }

        let outcome = self.drive(&mut on_height);

        match (outcome, self.conn.stop()) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(stop_err)) => Err(stop_err.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(stop_err)) => {
                tracing::error!(error = %stop_err, "failed to stop consensus connection after replay failure");
                Err(e)
            }
        }
    }

    fn drive(&mut self, on_height: &mut impl FnMut(&HeightProgress)) -> Result<ReplayReport> {
        if self.phase == ReplayPhase::Uninitialized {
            self.bootstrap()?;
        }

        let exhausted = loop {
            match self.step()? {
                StepOutcome::Applied(progress) => on_height(&progress),
                StepOutcome::Exhausted(reason) => break reason,
            }
        };

        let state = self.state.clone().ok_or(ReplayError::NotBootstrapped)?;

        if let Some(expected) = self.config.expected_final_app_hash {
            if state.app_hash != expected {
                let err = ReplayError::AppHashMismatch {
                    height: state.last_block_height,
                    recorded: expected,
                    replayed: state.app_hash,
                };
                self.fail(state.last_block_height, &err);
                return Err(err);
            }
        }

        tracing::info!(
            height = state.last_block_height,
            app_hash = %state.app_hash,
            blocks = self.blocks_applied,
            load_ms = self.timings.load.as_millis() as u64,
            apply_ms = self.timings.apply.as_millis() as u64,
            reason = ?exhausted,
            "replay finished"
        );

        Ok(ReplayReport { state, exhausted, blocks_applied: self.blocks_applied, timings: self.timings })
    }

    /// `Ok(None)` means the store is exhausted at `height`.
    fn try_step(&mut self, height: u64) -> Result<Option<HeightProgress>> {
        let load_start = Instant::now();
        let (meta, block) = match self.load(height)? {
            Some(pair) => pair,
            None => return Ok(None),
        };
        let load = load_start.elapsed();

        if meta.block_id != block.id() {
            return Err(ReplayError::Corruption {
                height,
                reason: format!("stored meta names block {} but the stored block hashes to {}", meta.block_id, block.id()),
            });
        }

        let apply_start = Instant::now();
        let state = self.state.as_ref().ok_or(ReplayError::NotBootstrapped)?;
        let next = BlockExecutor::new(&mut self.conn).apply_block(state, &meta.block_id, &block)?;
        let apply = apply_start.elapsed();

        self.timings.load += load;
        self.timings.apply += apply;
        self.blocks_applied += 1;
        self.phase = ReplayPhase::Replaying;

        metrics::histogram!("chain_replay_block_load_seconds", load.as_secs_f64());
        metrics::histogram!("chain_replay_block_apply_seconds", apply.as_secs_f64());
        metrics::counter!("chain_replay_blocks_applied_total", 1);
        metrics::gauge!("chain_replay_height", height as f64);

        let progress = HeightProgress {
            height,
            block_id: meta.block_id,
            app_hash: next.app_hash,
            num_txs: block.txs.len(),
            load,
            apply,
            total: self.timings,
        };

        tracing::info!(
            height,
            app_hash = %next.app_hash,
            txs = progress.num_txs,
            load_us = load.as_micros() as u64,
            apply_us = apply.as_micros() as u64,
            total_load_ms = self.timings.load.as_millis() as u64,
            total_apply_ms = self.timings.apply.as_millis() as u64,
            "applied block"
        );

        self.state = Some(next);
        Ok(Some(progress))
    }

    fn load(&self, height: u64) -> Result<Option<(BlockMeta, Block)>> {
        let meta = self.store.load_block_meta(height).map_err(|e| store_error(height, e))?;
        let block = self.store.load_block(height).map_err(|e| store_error(height, e))?;

        match (meta, block) {
            (Some(meta), Some(block)) => Ok(Some((meta, block))),
            (meta, _) => {
                let store_height = self.store.height();
                let declared = height <= store_height || self.config.stop_height.is_some_and(|stop| height <= stop);
                if !declared {
                    return Ok(None);
                }
                let part = if meta.is_none() { BlockPart::Meta } else { BlockPart::Block };
                Err(ReplayError::MissingBlock { height, part, store_height })
            }
        }
    }

    fn exhaust(&mut self, reason: ExhaustReason) -> StepOutcome {
        tracing::info!(height = self.state.as_ref().map_or(0, |s| s.last_block_height), ?reason, "replay exhausted");
        self.phase = ReplayPhase::Exhausted(reason);
        StepOutcome::Exhausted(reason)
    }

    fn fail(&mut self, height: u64, err: &ReplayError) {
        tracing::error!(height, kind = %err.kind(), error = %err, "replay failed");
        metrics::counter!("chain_replay_failures_total", 1);
        self.phase = ReplayPhase::Failed { height };
    }
}

fn store_error<E: std::error::Error + Send + Sync + 'static>(height: u64, err: E) -> ReplayError {
    ReplayError::Store { height, source: Box::new(err) }
}
