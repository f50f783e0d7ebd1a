// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Block Executor: applies one height at a time.
//!
//! # Protocol
//! 1. Validate the block against the last committed state
//! 2. BeginBlock → DeliverTx (in block order) → EndBlock
//! 3. Apply validator and consensus-param updates
//! 4. Commit and build the successor state
//!
//! The input state is borrowed immutably and the successor is only returned
//! on success, so a failed height leaves no trace in the chain state.

use crate::abci::{
    Application, ConnectionError, ConsensusConnection, RequestBeginBlock, RequestEndBlock, RequestInitChain,
    ResponseDeliverTx, ResponseEndBlock,
};
use crate::error::{ReplayError, Result};
use crate::state::ChainState;
use crate::types::{Block, BlockId, GenesisDoc, GenesisError, ValidatorSet};
use crate::verify::results_hash;

/// Sends InitChain for `genesis` and returns the height-0 chain state with
/// the application's overrides applied.
pub fn init_chain<A: Application>(conn: &mut ConsensusConnection<A>, genesis: &GenesisDoc) -> Result<ChainState> {
    let mut state = ChainState::from_genesis(genesis)?;

    let req = RequestInitChain {
        time: genesis.genesis_time,
        chain_id: genesis.chain_id.clone(),
        consensus_params: genesis.consensus_params.clone(),
        validators: state.validators.to_updates(),
        app_state_bytes: genesis.app_state.clone(),
    };
    let res = conn.init_chain_sync(req).map_err(ReplayError::InitChain)?;

    if !res.validators.is_empty() {
        state.validators = ValidatorSet::from_updates(&res.validators)
            .map_err(|source| ReplayError::InvalidValidatorUpdates { height: 0, source })?;
        tracing::info!(validators = state.validators.len(), "application replaced genesis validators");
    }
    if state.validators.is_empty() {
        return Err(GenesisError::NoValidators.into());
    }

    if let Some(params) = res.consensus_params {
        params
            .validate()
            .map_err(|source| ReplayError::InvalidParams { height: 0, source })?;
        state.consensus_params = params;
        tracing::info!("application replaced genesis consensus params");
    }

    tracing::info!(
        chain_id = %state.chain_id,
        validators = state.validators.len(),
        app_hash = %state.app_hash,
        "chain initialized from genesis"
    );
    Ok(state)
}

/// Checks everything about `block` that can be decided without the
/// application.
pub fn validate_block(state: &ChainState, block_id: &BlockId, block: &Block) -> Result<()> {
    let header = &block.header;
    let height = header.height;

    let expected = state.next_height();
    if height != expected {
        return Err(ReplayError::WrongHeight { expected, got: height });
    }

    if header.chain_id != state.chain_id {
        return Err(ReplayError::WrongChainId {
            height,
            expected: state.chain_id.clone(),
            got: header.chain_id.clone(),
        });
    }

    if block.id() != *block_id {
        return Err(ReplayError::Corruption {
            height,
            reason: format!("block id {} does not match header hash {}", block_id, block.id()),
        });
    }
    if block.compute_data_hash() != header.data_hash {
        return Err(ReplayError::Corruption {
            height,
            reason: "data hash does not match transactions".to_string(),
        });
    }

    if header.last_block_id != state.last_block_id {
        return Err(ReplayError::BrokenLink { height, expected: state.last_block_id, got: header.last_block_id });
    }

    // Height 1 may share the genesis timestamp; later blocks must move forward.
    let time_ok = if state.is_genesis() {
        header.time >= state.last_block_time
    } else {
        header.time > state.last_block_time
    };
    if !time_ok {
        return Err(ReplayError::InvalidBlock {
            height,
            reason: format!("block time {} is not after last block time {}", header.time, state.last_block_time),
        });
    }

    let max_bytes = state.consensus_params.block.max_bytes;
    if block.size_bytes() > max_bytes {
        return Err(ReplayError::InvalidBlock {
            height,
            reason: format!("block payload of {} bytes exceeds max_bytes {}", block.size_bytes(), max_bytes),
        });
    }

    if header.app_hash != state.app_hash {
        return Err(ReplayError::AppHashMismatch { height, recorded: header.app_hash, replayed: state.app_hash });
    }
    if header.last_results_hash != state.last_results_hash {
        return Err(ReplayError::ResultsHashMismatch {
            height,
            recorded: header.last_results_hash,
            replayed: state.last_results_hash,
        });
    }
    let validators_hash = state.validators.hash();
    if header.validators_hash != validators_hash {
        return Err(ReplayError::ValidatorsHashMismatch {
            height,
            recorded: header.validators_hash,
            replayed: validators_hash,
        });
    }
    let consensus_hash = state.consensus_params.hash();
    if header.consensus_hash != consensus_hash {
        return Err(ReplayError::ConsensusHashMismatch {
            height,
            recorded: header.consensus_hash,
            replayed: consensus_hash,
        });
    }

    Ok(())
}

/// Drives one height through a borrowed consensus connection.
pub struct BlockExecutor<'a, A: Application> {
    conn: &'a mut ConsensusConnection<A>,
}

impl<'a, A: Application> BlockExecutor<'a, A> {
    pub fn new(conn: &'a mut ConsensusConnection<A>) -> Self {
        Self { conn }
    }

    /// Validates, executes and commits `block`, returning the successor of
    /// `state`.
    pub fn apply_block(&mut self, state: &ChainState, block_id: &BlockId, block: &Block) -> Result<ChainState> {
        validate_block(state, block_id, block)?;
        let height = block.header.height;

        let (results, end_block) = self.exec_block(state, block_id, block)?;

        let validators = state
            .validators
            .apply_updates(&end_block.validator_updates)
            .map_err(|source| ReplayError::InvalidValidatorUpdates { height, source })?;
        let validators_changed = !end_block.validator_updates.is_empty();

        let (consensus_params, params_changed) = match &end_block.consensus_param_updates {
            Some(update) if !update.is_empty() => {
                let params = state.consensus_params.update(update);
                params
                    .validate()
                    .map_err(|source| ReplayError::InvalidParams { height, source })?;
                (params, true)
            }
            _ => (state.consensus_params.clone(), false),
        };

        let commit = self.conn.commit_sync().map_err(transition(height))?;

        let invalid = results.iter().filter(|r| !r.is_ok()).count();
        tracing::debug!(
            height,
            valid_txs = results.len() - invalid,
            invalid_txs = invalid,
            app_hash = %commit.data,
            "executed block"
        );

        // Updates returned at height H take effect from H + 1.
        Ok(ChainState {
            chain_id: state.chain_id.clone(),
            last_block_height: height,
            last_block_id: Some(*block_id),
            last_block_time: block.header.time,
            validators,
            last_height_validators_changed: if validators_changed {
                height + 1
            } else {
                state.last_height_validators_changed
            },
            consensus_params,
            last_height_params_changed: if params_changed {
                height + 1
            } else {
                state.last_height_params_changed
            },
            last_results_hash: results_hash(&results),
            app_hash: commit.data,
        })
    }

    fn exec_block(
        &mut self,
        state: &ChainState,
        block_id: &BlockId,
        block: &Block,
    ) -> Result<(Vec<ResponseDeliverTx>, ResponseEndBlock)> {
        let height = block.header.height;

        self.conn
            .begin_block_sync(RequestBeginBlock {
                hash: *block_id,
                header: block.header.clone(),
                validators: state.validators.clone(),
                consensus_params: state.consensus_params.clone(),
            })
            .map_err(transition(height))?;

        let mut results = Vec::with_capacity(block.txs.len());
        for tx in &block.txs {
            results.push(self.conn.deliver_tx_sync(tx).map_err(transition(height))?);
        }

        let end_block = self
            .conn
            .end_block_sync(RequestEndBlock { height })
            .map_err(transition(height))?;

        Ok((results, end_block))
    }
}

fn transition(height: u64) -> impl Fn(ConnectionError) -> ReplayError {
    move |source| ReplayError::Transition { height, source }
}
