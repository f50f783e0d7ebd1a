// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use super::*;
use crate::config::ReplayConfig;
use crate::error::{ErrorKind, ReplayError};
use crate::replay::{ExhaustReason, ReplayDriver, ReplayPhase, StepOutcome};

#[test]
fn test_step_before_bootstrap() {
    let store = MemBlockStore::new();
    let mut driver = ReplayDriver::new(&store, MockApp::new(), genesis(), ReplayConfig::default());
    driver.start().unwrap();

    assert!(matches!(driver.step(), Err(ReplayError::NotBootstrapped)));
    assert_eq!(driver.phase(), ReplayPhase::Uninitialized);
}

#[test]
fn test_init_chain_sent_exactly_once() {
    let chain = build_chain(&genesis(), MockApp::new(), batches(2));
    let app = MockApp::new();
    let log = app.log();
    let mut driver = ReplayDriver::new(&chain.store, app, genesis(), ReplayConfig::default());
    driver.start().unwrap();

    driver.bootstrap().unwrap();
    assert_eq!(driver.phase(), ReplayPhase::GenesisApplied);
    assert!(matches!(driver.bootstrap(), Err(ReplayError::AlreadyInitialized)));

    // run() picks up after a manual bootstrap without re-initializing.
    let report = driver.run().unwrap();
    assert_eq!(report.state.last_block_height, 2);
    assert_eq!(count(&log, |c| matches!(c, Call::InitChain { .. })), 1);
}

#[test]
fn test_manual_stepping() {
    let chain = build_chain(&genesis(), MockApp::new(), batches(2));
    let mut driver = ReplayDriver::new(&chain.store, MockApp::new(), genesis(), ReplayConfig::default());
    driver.start().unwrap();
    driver.bootstrap().unwrap();

    let first = match driver.step().unwrap() {
        StepOutcome::Applied(p) => p,
        other => panic!("expected height 1, got {other:?}"),
    };
    assert_eq!(first.height, 1);
    assert_eq!(first.block_id, chain.blocks[0].id());
    assert_eq!(first.num_txs, 2);
    assert_eq!(driver.phase(), ReplayPhase::Replaying);

    let second = match driver.step().unwrap() {
        StepOutcome::Applied(p) => p,
        other => panic!("expected height 2, got {other:?}"),
    };
    assert_eq!(second.app_hash, chain.states[2].app_hash);
    assert_eq!(second.total, driver.timings());

    assert_eq!(driver.step().unwrap(), StepOutcome::Exhausted(ExhaustReason::EndOfStore));
    // Exhausted is sticky.
    assert_eq!(driver.step().unwrap(), StepOutcome::Exhausted(ExhaustReason::EndOfStore));
    assert_eq!(driver.blocks_applied(), 2);
}

#[test]
fn test_failed_block_leaves_previous_state() {
    let chain = build_chain(&genesis(), MockApp::new(), batches(5));
    let app = MockApp::new().failing_on(b"k4=b");
    let log = app.log();
    let mut driver = ReplayDriver::new(&chain.store, app, genesis(), ReplayConfig::default());

    let err = driver.run().unwrap_err();
    assert!(matches!(err, ReplayError::Transition { height: 4, .. }));
    assert_eq!(err.kind(), ErrorKind::Transition);
    assert_eq!(driver.phase(), ReplayPhase::Failed { height: 4 });
    assert_eq!(driver.state(), Some(&chain.states[3]));

    // Nothing after the failing transaction reached the application.
    assert_eq!(count(&log, |c| matches!(c, Call::BeginBlock(5))), 0);
    assert_eq!(count(&log, |c| matches!(c, Call::EndBlock(4))), 0);
}

#[test]
fn test_no_progress_after_failure() {
    let chain = build_chain(&genesis(), MockApp::new(), batches(3));
    let mut driver =
        ReplayDriver::new(&chain.store, MockApp::new().failing_on(b"k2=a"), genesis(), ReplayConfig::default());
    driver.start().unwrap();
    driver.bootstrap().unwrap();

    assert!(matches!(driver.step(), Ok(StepOutcome::Applied(_))));
    assert!(driver.step().is_err());
    assert!(matches!(driver.step(), Err(ReplayError::Halted { height: 2 })));
    assert_eq!(driver.state().unwrap().last_block_height, 1);
}

#[test]
fn test_connection_stopped_after_failed_run() {
    let mut chain = build_chain(&genesis(), MockApp::new(), batches(3));
    chain.store.remove_block(2);
    let app = MockApp::new();
    let log = app.log();
    let mut driver = ReplayDriver::new(&chain.store, app, genesis(), ReplayConfig::default());

    assert!(driver.run().is_err());
    assert!(!driver.connection().is_running());
    assert_eq!(calls(&log).last(), Some(&Call::Stop));
}

#[test]
fn test_stop_failure_after_success_is_returned() {
    let chain = build_chain(&genesis(), MockApp::new(), batches(1));
    let mut driver = ReplayDriver::new(&chain.store, MockApp::new().failing_stop(), genesis(), ReplayConfig::default());

    let err = driver.run().unwrap_err();
    assert!(matches!(err, ReplayError::Connection(ConnectionError::Application { request: "Stop", .. })));
    assert!(!driver.connection().is_running());
}

#[test]
fn test_stop_failure_keeps_original_error() {
    let chain = build_chain(&genesis(), MockApp::new(), batches(2));
    let app = MockApp::new().failing_on(b"k1=a").failing_stop();
    let mut driver = ReplayDriver::new(&chain.store, app, genesis(), ReplayConfig::default());

    let err = driver.run().unwrap_err();
    assert!(matches!(err, ReplayError::Transition { height: 1, .. }));
}

#[test]
fn test_genesis_without_validators_needs_app() {
    let mut g = genesis();
    g.validators.clear();

    let store = MemBlockStore::new();
    let err = ReplayDriver::new(&store, MockApp::new(), g.clone(), ReplayConfig::default()).run().unwrap_err();
    assert!(matches!(err, ReplayError::Genesis(GenesisError::NoValidators)));
    assert_eq!(err.kind(), ErrorKind::Bootstrap);

    let app = MockApp::new().with_init_validators(vec![ValidatorUpdate { pub_key: PubKey(vec![9; 32]), power: 3 }]);
    let report = ReplayDriver::new(&store, app, g, ReplayConfig::default()).run().unwrap();
    assert_eq!(report.state.validators.total_power(), 3);
}

#[test]
fn test_invalid_genesis_fails_bootstrap() {
    let mut g = genesis();
    g.consensus_params.block.max_bytes = 0;

    let store = MemBlockStore::new();
    let mut driver = ReplayDriver::new(&store, MockApp::new(), g, ReplayConfig::default());
    let err = driver.run().unwrap_err();
    assert!(matches!(err, ReplayError::Genesis(GenesisError::Params(_))));
    assert_eq!(driver.phase(), ReplayPhase::Failed { height: 0 });
}
