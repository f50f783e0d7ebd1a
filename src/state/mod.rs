// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod chain_state;

pub use chain_state::ChainState;
