// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Fixed-size BLAKE3 commitment.

use crate::config::HASH_LEN;
use core::fmt;
use serde::{Deserialize, Serialize};

/// A 32-byte BLAKE3 digest. Used for app hashes, block identifiers and every
/// other commitment carried in a header.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Hash(pub [u8; HASH_LEN]);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; HASH_LEN]);

    /// Hashes `data` in one shot.
    pub fn digest(data: &[u8]) -> Self {
        Hash(*blake3::hash(data).as_bytes())
    }

    pub fn from_hasher(hasher: &blake3::Hasher) -> Self {
        Hash(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LEN]
    }

    /// Uppercase hex, the format progress output uses.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    /// Parses a 64-character hex string (either case).
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut buf = [0u8; HASH_LEN];
        hex::decode_to_slice(s.trim(), &mut buf)?;
        Ok(Hash(buf))
    }
}

impl From<[u8; HASH_LEN]> for Hash {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Hash(bytes)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}
