// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod error;
pub mod tx;
pub mod app;

pub use app::KvStoreApp;
pub use error::{KvStoreError, Result};
pub use tx::KvTx;
