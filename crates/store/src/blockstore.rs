use crate::error::{Result, StoreError};
use crate::record::{IndexEntry, LogHeader, RecordHeader, RecordKind, INDEX_FILE, LOG_FILE};
use chain_replay::codec;
use chain_replay::store::BlockStore;
use chain_replay::types::{Block, BlockMeta};
use memmap2::Mmap;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Read-only view of a block store directory.
///
/// The log is memory-mapped once at open time; blocks appended afterwards
/// are not visible until the store is reopened.
pub struct FileBlockStore {
    dir: PathBuf,
    mmap: Mmap,
    index: FxHashMap<u64, IndexEntry>,
    height: u64,
}

impl FileBlockStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let file = File::open(dir.join(LOG_FILE))?;

        // SAFETY: the log is append-only and never truncated while mapped.
        let mmap = unsafe { Mmap::map(&file)? };
        LogHeader::parse(&mmap)?;

        let idx_bytes = fs::read(dir.join(INDEX_FILE))?;
        let entries = IndexEntry::parse_all(&idx_bytes)?;

        let mut index = FxHashMap::default();
        let mut height = 0;
        for entry in entries {
            if index.insert(entry.height, entry).is_some() {
                return Err(StoreError::InvalidFormat(format!("height {} indexed twice", entry.height)));
            }
            height = height.max(entry.height);
        }

        tracing::debug!(dir = %dir.display(), height, blocks = index.len(), "opened block store");
        Ok(Self { dir, mmap, index, height })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of indexed heights.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Size of the mapped log in bytes.
    pub fn log_size(&self) -> u64 {
        self.mmap.len() as u64
    }

    /// Verified payload of the record at `offset`.
    fn record(&self, offset: u64, kind: RecordKind, height: u64) -> Result<&[u8]> {
        let start = usize::try_from(offset)
            .ok()
            .filter(|&o| o >= LogHeader::SIZE && o <= self.mmap.len())
            .ok_or_else(|| StoreError::InvalidFormat(format!("height {height}: offset {offset} outside the log")))?;

        let header = RecordHeader::parse(&self.mmap[start..])?;
        if header.kind != kind || header.height != height {
            return Err(StoreError::InvalidFormat(format!(
                "expected {kind:?} record for height {height}, found {:?} for height {}",
                header.kind, header.height
            )));
        }

        let body = start + RecordHeader::SIZE;
        let end = body + header.payload_len as usize;
        if end > self.mmap.len() {
            return Err(StoreError::InvalidFormat(format!("height {height}: record runs past end of log")));
        }

        let payload = &self.mmap[body..end];
        header.verify(payload)?;
        Ok(payload)
    }

    fn load<T: DeserializeOwned>(&self, height: u64, kind: RecordKind) -> Result<Option<T>> {
        let Some(entry) = self.index.get(&height) else {
            return Ok(None);
        };
        let offset = match kind {
            RecordKind::Meta => entry.meta_offset,
            RecordKind::Block => entry.block_offset,
        };
        let payload = self.record(offset, kind, height)?;
        Ok(Some(codec::decode(payload)?))
    }
}

impl BlockStore for FileBlockStore {
    type Error = StoreError;

    fn height(&self) -> u64 {
        self.height
    }

    fn load_block_meta(&self, height: u64) -> Result<Option<BlockMeta>> {
        self.load(height, RecordKind::Meta)
    }

    fn load_block(&self, height: u64) -> Result<Option<Block>> {
        self.load(height, RecordKind::Block)
    }
}

/// Appends finalized blocks, strictly in height order.
pub struct BlockStoreWriter {
    log: File,
    idx: File,
    height: u64,
}

impl BlockStoreWriter {
    /// Creates the directory and files if needed, otherwise resumes after
    /// the last indexed height.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut log = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(dir.join(LOG_FILE))?;

        if log.metadata()?.len() == 0 {
            log.write_all(&LogHeader::current().to_bytes())?;
            log.sync_data()?;
        } else {
            let mut buf = [0u8; LogHeader::SIZE];
            log.read_exact(&mut buf)?;
            LogHeader::parse(&buf)?;
        }

        let idx_path = dir.join(INDEX_FILE);
        let entries = match fs::read(&idx_path) {
            Ok(bytes) => IndexEntry::parse_all(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        let height = entries.last().map_or(0, |e| e.height);

        let idx = OpenOptions::new().create(true).append(true).open(idx_path)?;

        Ok(Self { log, idx, height })
    }

    /// Last appended height, 0 when empty.
    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn append(&mut self, meta: &BlockMeta, block: &Block) -> Result<()> {
        let expected = self.height + 1;
        for got in [meta.height(), block.height()] {
            if got != expected {
                return Err(StoreError::HeightGap { expected, got });
            }
        }
        if meta.block_id != block.id() {
            return Err(StoreError::InvalidFormat(format!(
                "meta for height {expected} names block {}, block hashes to {}",
                meta.block_id,
                block.id()
            )));
        }

        let meta_bytes = codec::encode(meta)?;
        let block_bytes = codec::encode(block)?;

        let meta_frame = RecordHeader::new(RecordKind::Meta, expected, &meta_bytes).frame(&meta_bytes);
        let block_frame = RecordHeader::new(RecordKind::Block, expected, &block_bytes).frame(&block_bytes);

        // Bytes left by a failed append stay unindexed; start after them.
        let meta_offset = self.log.metadata()?.len();
        let block_offset = meta_offset + meta_frame.len() as u64;

        self.log.write_all(&meta_frame)?;
        self.log.write_all(&block_frame)?;
        self.log.sync_data()?;

        // The index is written last so a torn append leaves the height unindexed.
        let entry = IndexEntry { height: expected, meta_offset, block_offset };
        self.idx.write_all(&entry.to_bytes())?;
        self.idx.sync_data()?;

        self.height = expected;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_replay::types::{BlockId, Hash, Header};
    use tempfile::tempdir;

    fn block(height: u64, last: Option<BlockId>) -> Block {
        let txs = vec![format!("h{height}=x").into_bytes()];
        let header = Header {
            chain_id: "store-test".to_string(),
            height,
            time: 1_000 + height as i64,
            last_block_id: last,
            data_hash: chain_replay::verify::txs_hash(&txs),
            validators_hash: Hash::ZERO,
            consensus_hash: Hash::ZERO,
            app_hash: Hash::ZERO,
            last_results_hash: Hash::ZERO,
        };
        Block { header, txs }
    }

    fn write_chain(dir: &Path, n: u64) -> Vec<Block> {
        let mut writer = BlockStoreWriter::open(dir).unwrap();
        let mut blocks = Vec::new();
        let mut last = None;
        for h in 1..=n {
            let b = block(h, last);
            last = Some(b.id());
            writer.append(&BlockMeta::new(&b), &b).unwrap();
            blocks.push(b);
        }
        blocks
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let blocks = write_chain(dir.path(), 3);

        let store = FileBlockStore::open(dir.path()).unwrap();
        assert_eq!(store.height(), 3);
        assert_eq!(store.len(), 3);
        for b in &blocks {
            assert_eq!(store.load_block(b.height()).unwrap().as_ref(), Some(b));
            assert_eq!(store.load_block_meta(b.height()).unwrap(), Some(BlockMeta::new(b)));
        }
        assert_eq!(store.load_block(4).unwrap(), None);
        assert_eq!(store.load_block_meta(0).unwrap(), None);
    }

    #[test]
    fn test_empty_store() {
        let dir = tempdir().unwrap();
        BlockStoreWriter::open(dir.path()).unwrap();

        let store = FileBlockStore::open(dir.path()).unwrap();
        assert_eq!(store.height(), 0);
        assert!(store.is_empty());
        assert_eq!(store.load_block(1).unwrap(), None);
    }

    #[test]
    fn test_writer_resumes() {
        let dir = tempdir().unwrap();
        let blocks = write_chain(dir.path(), 2);

        let mut writer = BlockStoreWriter::open(dir.path()).unwrap();
        assert_eq!(writer.height(), 2);
        let next = block(3, Some(blocks[1].id()));
        writer.append(&BlockMeta::new(&next), &next).unwrap();

        let store = FileBlockStore::open(dir.path()).unwrap();
        assert_eq!(store.height(), 3);
        assert_eq!(store.load_block(3).unwrap(), Some(next));
    }

    #[test]
    fn test_append_after_unindexed_bytes() {
        let dir = tempdir().unwrap();
        let mut writer = BlockStoreWriter::open(dir.path()).unwrap();
        let first = block(1, None);
        writer.append(&BlockMeta::new(&first), &first).unwrap();

        // Frames that reached the log without an index entry, as after a
        // failed sync on this writer.
        let mut log = OpenOptions::new().append(true).open(dir.path().join(LOG_FILE)).unwrap();
        log.write_all(&[0xab; 37]).unwrap();
        drop(log);

        let second = block(2, Some(first.id()));
        writer.append(&BlockMeta::new(&second), &second).unwrap();

        let store = FileBlockStore::open(dir.path()).unwrap();
        assert_eq!(store.load_block(1).unwrap(), Some(first));
        assert_eq!(store.load_block_meta(2).unwrap(), Some(BlockMeta::new(&second)));
        assert_eq!(store.load_block(2).unwrap(), Some(second));
    }

    #[test]
    fn test_writer_rejects_gap() {
        let dir = tempdir().unwrap();
        let mut writer = BlockStoreWriter::open(dir.path()).unwrap();
        let b = block(2, None);
        let err = writer.append(&BlockMeta::new(&b), &b).unwrap_err();
        assert!(matches!(err, StoreError::HeightGap { expected: 1, got: 2 }));
    }

    #[test]
    fn test_writer_rejects_mismatched_meta() {
        let dir = tempdir().unwrap();
        let mut writer = BlockStoreWriter::open(dir.path()).unwrap();
        let b = block(1, None);
        let mut meta = BlockMeta::new(&b);
        meta.block_id = BlockId(Hash::digest(b"other"));
        assert!(matches!(writer.append(&meta, &b), Err(StoreError::InvalidFormat(_))));
    }

    #[test]
    fn test_flipped_byte_is_checksum_error() {
        let dir = tempdir().unwrap();
        write_chain(dir.path(), 2);

        let log_path = dir.path().join(LOG_FILE);
        let mut bytes = fs::read(&log_path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&log_path, bytes).unwrap();

        let store = FileBlockStore::open(dir.path()).unwrap();
        assert!(store.load_block(1).unwrap().is_some());
        let err = store.load_block(2).unwrap_err();
        assert!(matches!(err, StoreError::ChecksumMismatch { height: 2, .. }));
    }

    #[test]
    fn test_bad_magic() {
        let dir = tempdir().unwrap();
        write_chain(dir.path(), 1);

        let log_path = dir.path().join(LOG_FILE);
        let mut bytes = fs::read(&log_path).unwrap();
        bytes[0..4].copy_from_slice(b"NOPE");
        fs::write(&log_path, bytes).unwrap();

        assert!(matches!(FileBlockStore::open(dir.path()), Err(StoreError::InvalidMagic)));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(FileBlockStore::open(&missing), Err(StoreError::IoError(_))));
    }
}
