// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Shared fixtures: a scriptable application and a live-chain builder.

pub mod e2e_tests;
pub mod lifecycle_tests;

use crate::abci::*;
use crate::executor::{init_chain, BlockExecutor};
use crate::state::ChainState;
use crate::store::MemBlockStore;
use crate::types::*;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub const GENESIS_TIME: i64 = 1_700_000_000;

/// Every request the application saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Start,
    InitChain { validators: Vec<ValidatorUpdate>, params: ConsensusParams, app_state: Vec<u8> },
    BeginBlock(u64),
    DeliverTx(Vec<u8>),
    EndBlock(u64),
    Commit,
    Stop,
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

/// Hash-chain application. Accepted transactions fold into the state hash;
/// empty blocks leave it alone. Transactions starting with `bad` are
/// rejected with code 1.
pub struct MockApp {
    log: CallLog,
    hash: Hash,
    height: u64,
    salt: Option<Vec<u8>>,
    fail_on: Option<Vec<u8>>,
    fail_stop: bool,
    init_validators: Vec<ValidatorUpdate>,
    updates: BTreeMap<u64, Vec<ValidatorUpdate>>,
    param_updates: BTreeMap<u64, ConsensusParamsUpdate>,
}

impl MockApp {
    pub fn new() -> Self {
        Self {
            log: CallLog::default(),
            hash: Hash::ZERO,
            height: 0,
            salt: None,
            fail_on: None,
            fail_stop: false,
            init_validators: Vec::new(),
            updates: BTreeMap::new(),
            param_updates: BTreeMap::new(),
        }
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    /// Mixes extra bytes into every accepted transaction, so commits
    /// differ from a plain app fed the same blocks.
    pub fn salted(mut self, salt: &[u8]) -> Self {
        self.salt = Some(salt.to_vec());
        self
    }

    /// DeliverTx of exactly `tx` fails with an application error.
    pub fn failing_on(mut self, tx: &[u8]) -> Self {
        self.fail_on = Some(tx.to_vec());
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    /// Validators returned from InitChain.
    pub fn with_init_validators(mut self, validators: Vec<ValidatorUpdate>) -> Self {
        self.init_validators = validators;
        self
    }

    pub fn with_validator_updates(mut self, height: u64, updates: Vec<ValidatorUpdate>) -> Self {
        self.updates.insert(height, updates);
        self
    }

    pub fn with_param_update(mut self, height: u64, update: ConsensusParamsUpdate) -> Self {
        self.param_updates.insert(height, update);
        self
    }

    fn record(&self, call: Call) {
        self.log.lock().unwrap().push(call);
    }
}

impl Application for MockApp {
    fn info(&self) -> ResponseInfo {
        ResponseInfo { data: "mock".to_string(), last_block_height: self.height, last_block_app_hash: self.hash }
    }

    fn init_chain(&mut self, req: RequestInitChain) -> Result<ResponseInitChain, AppError> {
        self.record(Call::InitChain {
            validators: req.validators.clone(),
            params: req.consensus_params.clone(),
            app_state: req.app_state_bytes.clone(),
        });
        self.hash = Hash::digest(&req.app_state_bytes);
        Ok(ResponseInitChain { consensus_params: None, validators: self.init_validators.clone() })
    }

    fn begin_block(&mut self, req: RequestBeginBlock) -> Result<ResponseBeginBlock, AppError> {
        self.record(Call::BeginBlock(req.header.height));
        self.height = req.header.height;
        Ok(ResponseBeginBlock {})
    }

    fn deliver_tx(&mut self, tx: &[u8]) -> Result<ResponseDeliverTx, AppError> {
        self.record(Call::DeliverTx(tx.to_vec()));
        if self.fail_on.as_deref() == Some(tx) {
            return Err(AppError::new("cannot process transaction"));
        }
        if tx.starts_with(b"bad") {
            return Ok(ResponseDeliverTx::rejected(1, "rejected"));
        }
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.hash.as_bytes());
        hasher.update(tx);
        if let Some(salt) = &self.salt {
            hasher.update(salt);
        }
        self.hash = Hash::from_hasher(&hasher);
        Ok(ResponseDeliverTx { data: tx.to_vec(), ..ResponseDeliverTx::ok() })
    }

    fn end_block(&mut self, req: RequestEndBlock) -> Result<ResponseEndBlock, AppError> {
        self.record(Call::EndBlock(req.height));
        Ok(ResponseEndBlock {
            validator_updates: self.updates.get(&req.height).cloned().unwrap_or_default(),
            consensus_param_updates: self.param_updates.get(&req.height).cloned(),
        })
    }

    fn commit(&mut self) -> Result<ResponseCommit, AppError> {
        self.record(Call::Commit);
        Ok(ResponseCommit { data: self.hash })
    }

    fn on_start(&mut self) -> Result<(), AppError> {
        self.record(Call::Start);
        Ok(())
    }

    fn on_stop(&mut self) -> Result<(), AppError> {
        self.record(Call::Stop);
        if self.fail_stop {
            return Err(AppError::new("flush failed"));
        }
        Ok(())
    }
}

pub fn validator(seed: u8, power: u64) -> GenesisValidator {
    GenesisValidator { pub_key: PubKey(vec![seed; 32]), power, name: format!("val-{seed}") }
}

pub fn genesis() -> GenesisDoc {
    GenesisDoc {
        genesis_time: GENESIS_TIME,
        chain_id: "replay-test".to_string(),
        consensus_params: ConsensusParams::default(),
        validators: vec![validator(1, 10), validator(2, 5)],
        app_hash: Hash::ZERO,
        app_state: Vec::new(),
    }
}

/// Blocks produced by executing against a live application, plus the
/// state after every height (`states[h]` is the state after height `h`).
pub struct LiveChain {
    pub store: MemBlockStore,
    pub blocks: Vec<Block>,
    pub states: Vec<ChainState>,
}

impl LiveChain {
    pub fn tip(&self) -> &ChainState {
        self.states.last().unwrap()
    }
}

pub fn build_chain(genesis: &GenesisDoc, app: MockApp, batches: Vec<Vec<Tx>>) -> LiveChain {
    let mut conn = ConsensusConnection::new(app);
    conn.start().unwrap();
    let mut state = init_chain(&mut conn, genesis).unwrap();

    let mut store = MemBlockStore::new();
    let mut blocks = Vec::new();
    let mut states = vec![state.clone()];

    for (i, txs) in batches.into_iter().enumerate() {
        let block = state.make_block(genesis.genesis_time + i as i64 + 1, txs);
        let id = block.id();
        state = BlockExecutor::new(&mut conn).apply_block(&state, &id, &block).unwrap();
        store.insert(block.clone());
        blocks.push(block);
        states.push(state.clone());
    }

    conn.stop().unwrap();
    LiveChain { store, blocks, states }
}

/// `n` blocks with two transactions each.
pub fn batches(n: u64) -> Vec<Vec<Tx>> {
    (1..=n)
        .map(|h| vec![format!("k{h}=a").into_bytes(), format!("k{h}=b").into_bytes()])
        .collect()
}

pub fn calls(log: &CallLog) -> Vec<Call> {
    log.lock().unwrap().clone()
}

pub fn count(log: &CallLog, pred: impl Fn(&Call) -> bool) -> usize {
    log.lock().unwrap().iter().filter(|c| pred(c)).count()
}
