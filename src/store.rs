// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Read side of the block store.

use crate::types::{Block, BlockMeta};
use rustc_hash::FxHashMap;
use std::convert::Infallible;

/// Height-indexed, immutable history of finalized blocks.
///
/// Every method is read-only and returns the same value for the same height
/// on every call. `Ok(None)` means the height was never stored; read or
/// decode failures are errors.
pub trait BlockStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Highest stored height, 0 when empty. Anything at or below it is
    /// declared history: a missing height there is a gap, not the end.
    fn height(&self) -> u64;

    fn load_block_meta(&self, height: u64) -> Result<Option<BlockMeta>, Self::Error>;

    fn load_block(&self, height: u64) -> Result<Option<Block>, Self::Error>;
}

impl<S: BlockStore + ?Sized> BlockStore for &S {
    type Error = S::Error;

    fn height(&self) -> u64 {
        (**self).height()
    }

    fn load_block_meta(&self, height: u64) -> Result<Option<BlockMeta>, Self::Error> {
        (**self).load_block_meta(height)
    }

    fn load_block(&self, height: u64) -> Result<Option<Block>, Self::Error> {
        (**self).load_block(height)
    }
}

/// In-memory store. Metas and bodies are kept apart so either can be absent.
#[derive(Debug, Default, Clone)]
pub struct MemBlockStore {
    metas: FxHashMap<u64, BlockMeta>,
    blocks: FxHashMap<u64, Block>,
}

impl MemBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> Self {
        let mut store = Self::new();
        for block in blocks {
            store.insert(block);
        }
        store
    }

    /// Stores `block` and its meta under the block's own height.
    pub fn insert(&mut self, block: Block) {
        let height = block.height();
        self.insert_at(height, BlockMeta::new(&block), block);
    }

    /// Stores under an explicit height, whatever the header says.
    pub fn insert_at(&mut self, height: u64, meta: BlockMeta, block: Block) {
        self.metas.insert(height, meta);
        self.blocks.insert(height, block);
    }

    pub fn remove_meta(&mut self, height: u64) -> Option<BlockMeta> {
        self.metas.remove(&height)
    }

    pub fn remove_block(&mut self, height: u64) -> Option<Block> {
        self.blocks.remove(&height)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.metas.is_empty()
    }
}

impl BlockStore for MemBlockStore {
    type Error = Infallible;

    fn height(&self) -> u64 {
        self.metas
            .keys()
            .chain(self.blocks.keys())
            .copied()
            .max()
            .unwrap_or(0)
    }

    fn load_block_meta(&self, height: u64) -> Result<Option<BlockMeta>, Infallible> {
        Ok(self.metas.get(&height).cloned())
    }

    fn load_block(&self, height: u64) -> Result<Option<Block>, Infallible> {
        Ok(self.blocks.get(&height).cloned())
    }
}
