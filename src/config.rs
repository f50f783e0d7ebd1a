// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Configuration constants and replay settings.

use crate::types::Hash;

/// Length in bytes of every commitment (BLAKE3 output).
pub const HASH_LEN: usize = 32;

/// Length in bytes of a validator address.
pub const ADDRESS_LEN: usize = 20;

/// Maximum length of a chain identifier.
pub const MAX_CHAIN_ID_LEN: usize = 50;

/// Hard ceiling for `BlockParams::max_bytes` (100 MiB).
pub const MAX_BLOCK_SIZE_BYTES: u64 = 104_857_600;

/// Settings for a single replay run.
#[derive(Debug, Clone, Default)]
pub struct ReplayConfig {
    /// Last height to apply. Heights above it are never processed, and a
    /// missing block at or below it is a sequencing error.
    pub stop_height: Option<u64>,
    /// Commitment the final state must carry once replay is exhausted.
    pub expected_final_app_hash: Option<Hash>,
}

impl ReplayConfig {
    pub fn with_stop_height(mut self, height: u64) -> Self {
        self.stop_height = Some(height);
        self
    }

    pub fn with_expected_final_app_hash(mut self, hash: Hash) -> Self {
        self.expected_final_app_hash = Some(hash);
        self
    }
}
