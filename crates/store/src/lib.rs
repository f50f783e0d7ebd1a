pub mod error;
pub mod record;
pub mod blockstore;
pub mod genesis;
pub mod trace;
pub mod fixtures;

pub use blockstore::{BlockStoreWriter, FileBlockStore};
pub use error::{StoreError, Result};
pub use genesis::{load_genesis, save_genesis, GenesisFile};
pub use trace::TraceLog;
