// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::error::{KvStoreError, Result};
use chain_replay::types::{PubKey, ValidatorUpdate};

pub const VALIDATOR_PREFIX: &str = "val:";
pub const PARAM_PREFIX: &str = "param:";
pub const PARAM_MAX_BYTES: &str = "max_bytes";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvTx {
    /// `key=value`, or a bare `key` stored as its own value.
    Set { key: String, value: String },
    /// `val:<hex pubkey>!<power>`. Power 0 removes the validator.
    Validator(ValidatorUpdate),
    /// `param:max_bytes!<n>`.
    MaxBytes(u64),
}

impl KvTx {
    pub fn parse(tx: &[u8]) -> Result<Self> {
        if tx.is_empty() {
            return Err(KvStoreError::EmptyTx);
        }
        let text = std::str::from_utf8(tx)?;

        if let Some(body) = text.strip_prefix(VALIDATOR_PREFIX) {
            return parse_validator(body).ok_or_else(|| KvStoreError::MalformedValidator(text.to_string()));
        }
        if let Some(body) = text.strip_prefix(PARAM_PREFIX) {
            return parse_param(text, body);
        }

        let (key, value) = match text.split_once('=') {
            Some((k, v)) => (k, v),
            None => (text, text),
        };
        Ok(KvTx::Set { key: key.to_string(), value: value.to_string() })
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            KvTx::Set { key, value } => format!("{key}={value}").into_bytes(),
            KvTx::Validator(u) => format!("{VALIDATOR_PREFIX}{}!{}", u.pub_key.to_hex(), u.power).into_bytes(),
            KvTx::MaxBytes(n) => format!("{PARAM_PREFIX}{PARAM_MAX_BYTES}!{n}").into_bytes(),
        }
    }
}

fn parse_validator(body: &str) -> Option<KvTx> {
    let (key_hex, power) = body.split_once('!')?;
    let pub_key = hex::decode(key_hex).ok()?;
    if pub_key.is_empty() {
        return None;
    }
    let power = power.parse::<u64>().ok()?;
    Some(KvTx::Validator(ValidatorUpdate { pub_key: PubKey(pub_key), power }))
}

fn parse_param(text: &str, body: &str) -> Result<KvTx> {
    let (name, value) = body
        .split_once('!')
        .ok_or_else(|| KvStoreError::MalformedParam(text.to_string()))?;
    if name != PARAM_MAX_BYTES {
        return Err(KvStoreError::UnknownParam(name.to_string()));
    }
    value
        .parse::<u64>()
        .map(KvTx::MaxBytes)
        .map_err(|_| KvStoreError::MalformedParam(text.to_string()))
}
