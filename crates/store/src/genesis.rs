use crate::error::{Result, StoreError};
use chain_replay::types::{ConsensusParams, GenesisDoc, GenesisValidator, Hash, PubKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// `genesis.json` as written on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisFile {
    pub genesis_time: DateTime<Utc>,
    pub chain_id: String,
    #[serde(default)]
    pub consensus_params: ConsensusParams,
    #[serde(default)]
    pub validators: Vec<GenesisValidatorFile>,
    /// Hex. Absent or empty means the zero hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_hash: Option<String>,
    /// Handed to the application as serialized JSON bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_state: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisValidatorFile {
    /// Hex-encoded public key.
    pub pub_key: String,
    pub power: u64,
    #[serde(default)]
    pub name: String,
}

impl GenesisFile {
    /// Converts to the engine's genesis document and validates it.
    pub fn into_doc(self) -> Result<GenesisDoc> {
        let validators = self
            .validators
            .into_iter()
            .map(|v| {
                let key = hex::decode(&v.pub_key)
                    .map_err(|e| StoreError::InvalidFormat(format!("validator {:?} pub_key: {e}", v.name)))?;
                Ok(GenesisValidator { pub_key: PubKey(key), power: v.power, name: v.name })
            })
            .collect::<Result<Vec<_>>>()?;

        let app_hash = match self.app_hash.as_deref() {
            None | Some("") => Hash::ZERO,
            Some(h) => Hash::from_hex(h).map_err(|e| StoreError::InvalidFormat(format!("app_hash: {e}")))?,
        };

        let app_state = match &self.app_state {
            Some(value) => serde_json::to_vec(value)?,
            None => Vec::new(),
        };

        let doc = GenesisDoc {
            genesis_time: self.genesis_time.timestamp(),
            chain_id: self.chain_id,
            consensus_params: self.consensus_params,
            validators,
            app_hash,
            app_state,
        };
        doc.validate()?;
        Ok(doc)
    }

    pub fn from_doc(doc: &GenesisDoc) -> Result<Self> {
        let genesis_time = DateTime::from_timestamp(doc.genesis_time, 0)
            .ok_or_else(|| StoreError::InvalidFormat(format!("genesis time {} out of range", doc.genesis_time)))?;
        let app_state = if doc.app_state.is_empty() {
            None
        } else {
            Some(serde_json::from_slice(&doc.app_state)?)
        };

        Ok(Self {
            genesis_time,
            chain_id: doc.chain_id.clone(),
            consensus_params: doc.consensus_params.clone(),
            validators: doc
                .validators
                .iter()
                .map(|v| GenesisValidatorFile { pub_key: v.pub_key.to_hex(), power: v.power, name: v.name.clone() })
                .collect(),
            app_hash: (!doc.app_hash.is_zero()).then(|| doc.app_hash.to_hex()),
            app_state,
        })
    }
}

pub fn load_genesis(path: impl AsRef<Path>) -> Result<GenesisDoc> {
    let text = fs::read_to_string(path)?;
    let file: GenesisFile = serde_json::from_str(&text)?;
    file.into_doc()
}

pub fn save_genesis(path: impl AsRef<Path>, doc: &GenesisDoc) -> Result<()> {
    let file = GenesisFile::from_doc(doc)?;
    let text = serde_json::to_string_pretty(&file)?;
    fs::write(path, text)?;
    Ok(())
}
