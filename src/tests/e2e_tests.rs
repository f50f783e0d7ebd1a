// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use super::*;
use crate::config::ReplayConfig;
use crate::error::ReplayError;
use crate::replay::{ExhaustReason, ReplayDriver};

/// Genesis with validators and params, empty app state, three empty blocks.
#[test]
fn test_three_empty_blocks() {
    let g = genesis();
    let chain = build_chain(&g, MockApp::new(), vec![Vec::new(), Vec::new(), Vec::new()]);

    let app = MockApp::new();
    let log = app.log();
    let report = ReplayDriver::new(&chain.store, app, g.clone(), ReplayConfig::default()).run().unwrap();

    assert_eq!(report.exhausted, ExhaustReason::EndOfStore);
    assert_eq!(report.state.last_block_height, 3);
    assert_eq!(report.state.app_hash, Hash::digest(&[]));

    let seen = calls(&log);
    let init: Vec<&Call> = seen.iter().filter(|c| matches!(c, Call::InitChain { .. })).collect();
    assert_eq!(
        init,
        vec![&Call::InitChain {
            validators: g.validator_set().unwrap().to_updates(),
            params: g.consensus_params.clone(),
            app_state: Vec::new(),
        }]
    );

    let begins: Vec<u64> = seen
        .iter()
        .filter_map(|c| match c {
            Call::BeginBlock(h) => Some(*h),
            _ => None,
        })
        .collect();
    assert_eq!(begins, vec![1, 2, 3]);

    assert_eq!(
        seen,
        vec![
            Call::Start,
            init[0].clone(),
            Call::BeginBlock(1),
            Call::EndBlock(1),
            Call::Commit,
            Call::BeginBlock(2),
            Call::EndBlock(2),
            Call::Commit,
            Call::BeginBlock(3),
            Call::EndBlock(3),
            Call::Commit,
            Call::Stop,
        ]
    );
}

#[test]
fn test_validator_updates_take_effect_next_height() {
    let added = ValidatorUpdate { pub_key: PubKey(vec![3; 32]), power: 7 };
    let removed = ValidatorUpdate { pub_key: PubKey(vec![2; 32]), power: 0 };
    let make_app = || MockApp::new().with_validator_updates(2, vec![added.clone(), removed.clone()]);

    let chain = build_chain(&genesis(), make_app(), batches(4));
    assert_eq!(chain.states[1].validators.total_power(), 15);
    assert_eq!(chain.states[2].validators.total_power(), 17);
    assert_eq!(chain.states[2].last_height_validators_changed, 3);
    assert_ne!(chain.blocks[2].header.validators_hash, chain.blocks[1].header.validators_hash);

    let report = ReplayDriver::new(&chain.store, make_app(), genesis(), ReplayConfig::default()).run().unwrap();
    assert_eq!(&report.state, chain.tip());

    // Without the updates the replayed set disagrees with block 3's header.
    let err = ReplayDriver::new(&chain.store, MockApp::new(), genesis(), ReplayConfig::default())
        .run()
        .unwrap_err();
    assert!(matches!(err, ReplayError::ValidatorsHashMismatch { height: 3, .. }));
}

#[test]
fn test_invalid_validator_update_is_transition_error() {
    let chain = build_chain(&genesis(), MockApp::new(), batches(3));
    let unknown = ValidatorUpdate { pub_key: PubKey(vec![42; 32]), power: 0 };
    let app = MockApp::new().with_validator_updates(2, vec![unknown]);

    let mut driver = ReplayDriver::new(&chain.store, app, genesis(), ReplayConfig::default());
    let err = driver.run().unwrap_err();
    assert!(matches!(err, ReplayError::InvalidValidatorUpdates { height: 2, source: ValidatorSetError::RemoveUnknown(_) }));
    assert_eq!(driver.state(), Some(&chain.states[1]));
}

#[test]
fn test_param_updates_are_threaded() {
    let update = ConsensusParamsUpdate {
        block: Some(BlockParams { max_bytes: 1_000_000, max_gas: 50_000 }),
        evidence: None,
        validator: None,
    };
    let make_app = || MockApp::new().with_param_update(1, update.clone());

    let chain = build_chain(&genesis(), make_app(), batches(3));
    assert_eq!(chain.states[1].consensus_params.block.max_bytes, 1_000_000);
    assert_eq!(chain.states[1].last_height_params_changed, 2);

    let report = ReplayDriver::new(&chain.store, make_app(), genesis(), ReplayConfig::default()).run().unwrap();
    assert_eq!(report.state.consensus_params, chain.tip().consensus_params);

    let err = ReplayDriver::new(&chain.store, MockApp::new(), genesis(), ReplayConfig::default())
        .run()
        .unwrap_err();
    assert!(matches!(err, ReplayError::ConsensusHashMismatch { height: 2, .. }));
}

#[test]
fn test_oversized_block_is_rejected() {
    let update = ConsensusParamsUpdate {
        block: Some(BlockParams { max_bytes: 16, max_gas: -1 }),
        evidence: None,
        validator: None,
    };
    let make_app = || MockApp::new().with_param_update(1, update.clone());
    let mut chain = build_chain(&genesis(), make_app(), vec![vec![b"a=1".to_vec()]]);

    let big = chain.tip().make_block(GENESIS_TIME + 2, vec![vec![b'x'; 64]]);
    chain.store.insert(big);

    let err = ReplayDriver::new(&chain.store, make_app(), genesis(), ReplayConfig::default())
        .run()
        .unwrap_err();
    assert!(matches!(err, ReplayError::InvalidBlock { height: 2, .. }));
}
