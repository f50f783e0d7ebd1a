// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::error::{KvStoreError, Result};
use crate::tx::KvTx;
use chain_replay::abci::*;
use chain_replay::config::MAX_BLOCK_SIZE_BYTES;
use chain_replay::types::{BlockParams, ConsensusParamsUpdate, Hash, ValidatorSet, ValidatorUpdate};
use std::collections::BTreeMap;
use std::io::Write;

/// Deterministic key-value state machine.
pub struct KvStoreApp {
    store: BTreeMap<String, String>,
    /// Validators for the block in progress, from BeginBlock.
    validators: ValidatorSet,
    block_params: BlockParams,
    pending_validators: Vec<ValidatorUpdate>,
    pending_max_bytes: Option<u64>,
    height: u64,
    app_hash: Hash,
    trace: Option<TraceWriter>,
}

impl Default for KvStoreApp {
    fn default() -> Self {
        let store = BTreeMap::new();
        Self {
            app_hash: state_hash(&store),
            store,
            validators: ValidatorSet::default(),
            block_params: BlockParams { max_bytes: 0, max_gas: -1 },
            pending_validators: Vec::new(),
            pending_max_bytes: None,
            height: 0,
            trace: None,
        }
    }
}

impl KvStoreApp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trace(mut self, trace: TraceWriter) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.store.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    /// Hash committed at the last height.
    pub fn app_hash(&self) -> Hash {
        self.app_hash
    }

    fn trace(&mut self, line: std::fmt::Arguments<'_>) -> Result<()> {
        if let Some(trace) = self.trace.as_mut() {
            trace.write_fmt(line)?;
            trace.write_all(b"\n")?;
        }
        Ok(())
    }

    fn apply(&mut self, tx: KvTx) -> Result<ResponseDeliverTx> {
        match tx {
            KvTx::Set { key, value } => {
                self.trace(format_args!("set {key}={value}"))?;
                self.store.insert(key, value);
            }
            KvTx::Validator(update) => {
                let in_set = self.validators.get(&update.pub_key.address()).is_some();
                // Later updates for the same key in one block win.
                let mut next: Vec<ValidatorUpdate> =
                    self.pending_validators.iter().filter(|u| u.pub_key != update.pub_key).cloned().collect();
                let cancels_pending = next.len() < self.pending_validators.len();

                // A removal of a key only added in this block drops the add.
                if update.power > 0 || in_set {
                    next.push(update);
                } else if !cancels_pending {
                    return Ok(ResponseDeliverTx::rejected(4, "cannot remove unknown validator"));
                }

                if let Err(e) = self.validators.apply_updates(&next) {
                    return Ok(ResponseDeliverTx::rejected(4, e.to_string()));
                }
                self.pending_validators = next;
            }
            KvTx::MaxBytes(n) => {
                if n == 0 {
                    return Ok(ResponseDeliverTx::rejected(3, "max_bytes must be positive"));
                }
                if n > MAX_BLOCK_SIZE_BYTES {
                    return Ok(ResponseDeliverTx::rejected(
                        3,
                        format!("max_bytes {n} exceeds {MAX_BLOCK_SIZE_BYTES}"),
                    ));
                }
                self.pending_max_bytes = Some(n);
            }
        }
        Ok(ResponseDeliverTx::ok())
    }
}

impl Application for KvStoreApp {
    fn info(&self) -> ResponseInfo {
        ResponseInfo {
            data: format!("kvstore ({} keys)", self.store.len()),
            last_block_height: self.height,
            last_block_app_hash: self.app_hash,
        }
    }

    fn init_chain(&mut self, req: RequestInitChain) -> std::result::Result<ResponseInitChain, AppError> {
        if !req.app_state_bytes.is_empty() {
            self.store = serde_json::from_slice(&req.app_state_bytes)
                .map_err(|e| AppError::new(KvStoreError::from(e).to_string()))?;
        }
        self.app_hash = state_hash(&self.store);
        tracing::debug!(chain_id = %req.chain_id, keys = self.store.len(), "kvstore initialized");
        Ok(ResponseInitChain::default())
    }

    fn begin_block(&mut self, req: RequestBeginBlock) -> std::result::Result<ResponseBeginBlock, AppError> {
        self.height = req.header.height;
        self.validators = req.validators;
        self.block_params = req.consensus_params.block;
        Ok(ResponseBeginBlock {})
    }

    fn deliver_tx(&mut self, tx: &[u8]) -> std::result::Result<ResponseDeliverTx, AppError> {
        let outcome = KvTx::parse(tx).and_then(|parsed| self.apply(parsed));
        match outcome {
            Ok(res) => Ok(res),
            Err(e) => match e.reject_code() {
                Some(code) => Ok(ResponseDeliverTx::rejected(code, e.to_string())),
                None => Err(AppError::new(e.to_string())),
            },
        }
    }

    fn end_block(&mut self, req: RequestEndBlock) -> std::result::Result<ResponseEndBlock, AppError> {
        let consensus_param_updates = self.pending_max_bytes.take().map(|max_bytes| ConsensusParamsUpdate {
            block: Some(BlockParams { max_bytes, max_gas: self.block_params.max_gas }),
            evidence: None,
            validator: None,
        });
        let validator_updates = std::mem::take(&mut self.pending_validators);
        if !validator_updates.is_empty() {
            tracing::debug!(height = req.height, updates = validator_updates.len(), "validator updates");
        }
        Ok(ResponseEndBlock { validator_updates, consensus_param_updates })
    }

    fn commit(&mut self) -> std::result::Result<ResponseCommit, AppError> {
        self.app_hash = state_hash(&self.store);
        let (height, hash) = (self.height, self.app_hash);
        self.trace(format_args!("commit {height} {hash}"))
            .map_err(|e| AppError::new(e.to_string()))?;
        Ok(ResponseCommit { data: self.app_hash })
    }

    fn on_stop(&mut self) -> std::result::Result<(), AppError> {
        if let Some(trace) = self.trace.as_mut() {
            trace.flush().map_err(|e| AppError::new(format!("trace flush failed: {e}")))?;
        }
        Ok(())
    }
}

/// blake3 over the ordered entries, each length-prefixed.
pub fn state_hash(store: &BTreeMap<String, String>) -> Hash {
    let mut hasher = blake3::Hasher::new();
    for (key, value) in store {
        hasher.update(&(key.len() as u64).to_le_bytes());
        hasher.update(key.as_bytes());
        hasher.update(&(value.len() as u64).to_le_bytes());
        hasher.update(value.as_bytes());
    }
    Hash::from_hasher(&hasher)
}
