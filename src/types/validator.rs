// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Validator sets and the updates an application may return from EndBlock.

use crate::config::ADDRESS_LEN;
use crate::types::hash::Hash;
use core::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PubKey(pub Vec<u8>);

impl PubKey {
    /// First 20 bytes of the BLAKE3 hash of the key.
    pub fn address(&self) -> Address {
        let digest = blake3::hash(&self.0);
        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(&digest.as_bytes()[..ADDRESS_LEN]);
        Address(out)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PubKey({})", self.to_hex())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub pub_key: PubKey,
    pub power: u64,
}

impl Validator {
    pub fn new(pub_key: PubKey, power: u64) -> Self {
        Self { pub_key, power }
    }

    pub fn address(&self) -> Address {
        self.pub_key.address()
    }
}

/// Change to a validator's voting power. Power 0 removes the validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub pub_key: PubKey,
    pub power: u64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidatorSetError {
    #[error("validator {0} has zero voting power")]
    ZeroPower(Address),
    #[error("duplicate validator {0}")]
    Duplicate(Address),
    #[error("cannot remove unknown validator {0}")]
    RemoveUnknown(Address),
    #[error("applying the updates would leave the validator set empty")]
    Empty,
}

/// Validators ordered by address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSet {
    validators: Vec<Validator>,
}

impl ValidatorSet {
    /// Builds a set from arbitrary-order validators. An empty set is allowed
    /// here; the application may supply validators at InitChain.
    pub fn new(mut validators: Vec<Validator>) -> Result<Self, ValidatorSetError> {
        validators.sort_by_key(Validator::address);
        for pair in validators.windows(2) {
            if pair[0].address() == pair[1].address() {
                return Err(ValidatorSetError::Duplicate(pair[0].address()));
            }
        }
        if let Some(v) = validators.iter().find(|v| v.power == 0) {
            return Err(ValidatorSetError::ZeroPower(v.address()));
        }
        Ok(Self { validators })
    }

    pub fn from_updates(updates: &[ValidatorUpdate]) -> Result<Self, ValidatorSetError> {
        Self::new(
            updates
                .iter()
                .map(|u| Validator::new(u.pub_key.clone(), u.power))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Validator> {
        self.validators.iter()
    }

    pub fn total_power(&self) -> u64 {
        self.validators.iter().map(|v| v.power).sum()
    }

    pub fn get(&self, address: &Address) -> Option<&Validator> {
        self.validators
            .binary_search_by_key(address, Validator::address)
            .ok()
            .map(|i| &self.validators[i])
    }

    /// The set in the form InitChain carries it.
    pub fn to_updates(&self) -> Vec<ValidatorUpdate> {
        self.validators
            .iter()
            .map(|v| ValidatorUpdate { pub_key: v.pub_key.clone(), power: v.power })
            .collect()
    }

    /// Returns the set produced by applying `updates` in order. `self` is
    /// left untouched, so a rejected batch never leaks into the chain state.
    pub fn apply_updates(&self, updates: &[ValidatorUpdate]) -> Result<Self, ValidatorSetError> {
        if updates.is_empty() {
            return Ok(self.clone());
        }

        let mut next = self.validators.clone();
        for update in updates {
            let address = update.pub_key.address();
            match next.binary_search_by_key(&address, Validator::address) {
                Ok(i) if update.power == 0 => {
                    next.remove(i);
                }
                Ok(i) => next[i].power = update.power,
                Err(_) if update.power == 0 => return Err(ValidatorSetError::RemoveUnknown(address)),
                Err(i) => next.insert(i, Validator::new(update.pub_key.clone(), update.power)),
            }
        }

        if next.is_empty() {
            return Err(ValidatorSetError::Empty);
        }
        Ok(Self { validators: next })
    }

    pub fn hash(&self) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.validators.len() as u64).to_le_bytes());
        for v in &self.validators {
            hasher.update(&v.address().0);
            hasher.update(&(v.pub_key.0.len() as u64).to_le_bytes());
            hasher.update(&v.pub_key.0);
            hasher.update(&v.power.to_le_bytes());
        }
        Hash::from_hasher(&hasher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u8) -> PubKey {
        PubKey(vec![n; 32])
    }

    fn set(powers: &[(u8, u64)]) -> ValidatorSet {
        ValidatorSet::new(powers.iter().map(|(k, p)| Validator::new(key(*k), *p)).collect()).unwrap()
    }

    #[test]
    fn test_order_independent_hash() {
        let a = set(&[(1, 10), (2, 20), (3, 30)]);
        let b = set(&[(3, 30), (1, 10), (2, 20)]);
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_rejects_duplicates_and_zero_power() {
        let dup = ValidatorSet::new(vec![Validator::new(key(1), 1), Validator::new(key(1), 2)]);
        assert!(matches!(dup, Err(ValidatorSetError::Duplicate(_))));

        let zero = ValidatorSet::new(vec![Validator::new(key(1), 0)]);
        assert!(matches!(zero, Err(ValidatorSetError::ZeroPower(_))));
    }

    #[test]
    fn test_apply_updates_upsert_and_remove() {
        let base = set(&[(1, 10), (2, 20)]);
        let updates = vec![
            ValidatorUpdate { pub_key: key(1), power: 0 },
            ValidatorUpdate { pub_key: key(2), power: 25 },
            ValidatorUpdate { pub_key: key(3), power: 5 },
        ];

        let next = base.apply_updates(&updates).unwrap();
        assert_eq!(next.len(), 2);
        assert!(next.get(&key(1).address()).is_none());
        assert_eq!(next.get(&key(2).address()).unwrap().power, 25);
        assert_eq!(next.total_power(), 30);

        // base is untouched
        assert_eq!(base.total_power(), 30);
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_apply_updates_rejects_unknown_removal_and_empty_set() {
        let base = set(&[(1, 10)]);

        let unknown = base.apply_updates(&[ValidatorUpdate { pub_key: key(9), power: 0 }]);
        assert!(matches!(unknown, Err(ValidatorSetError::RemoveUnknown(_))));

        let empty = base.apply_updates(&[ValidatorUpdate { pub_key: key(1), power: 0 }]);
        assert_eq!(empty, Err(ValidatorSetError::Empty));
    }
}
