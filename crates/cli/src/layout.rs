use chain_replay_store::fixtures::{BLOCKSTORE_DIR, GENESIS_FILE};
use std::path::{Path, PathBuf};

pub const TRACE_FILE: &str = "trace.log";

/// Where replay inputs and outputs live. Everything defaults to a path
/// under the home directory and can be overridden one by one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    pub genesis: PathBuf,
    pub blockstore: PathBuf,
    pub trace: PathBuf,
}

impl DataLayout {
    pub fn from_home(home: &Path) -> Self {
        Self {
            genesis: home.join(GENESIS_FILE),
            blockstore: home.join(BLOCKSTORE_DIR),
            trace: home.join(TRACE_FILE),
        }
    }

    pub fn resolve(
        home: &Path,
        genesis: Option<PathBuf>,
        blockstore: Option<PathBuf>,
        trace: Option<PathBuf>,
    ) -> Self {
        let defaults = Self::from_home(home);
        Self {
            genesis: genesis.unwrap_or(defaults.genesis),
            blockstore: blockstore.unwrap_or(defaults.blockstore),
            trace: trace.unwrap_or(defaults.trace),
        }
    }
}
