// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! The contract between the replay engine and the application it drives.
//!
//! The application is only ever reached through a [`ConsensusConnection`],
//! which enforces the message order: InitChain once, then for every height
//! BeginBlock, DeliverTx per transaction, EndBlock, Commit.

pub mod types;
pub mod application;
pub mod connection;

pub use application::{AppError, Application, TraceWriter};
pub use connection::{ConnectionError, ConsensusConnection};
pub use types::*;
