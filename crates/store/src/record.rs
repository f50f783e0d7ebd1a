//! On-disk framing for `blocks.log` and `blocks.idx`.
//!
//! Log: `[magic "CRBL"][version u32]` then records of
//! `[kind u8][height u64][len u32][crc64 u64][payload]`.
//! Index: fixed 24-byte entries `[height u64][meta offset u64][block offset u64]`.
//! All integers little-endian.

use crate::error::{Result, StoreError};
use byteorder::{ByteOrder, LittleEndian};
use crc64fast::Digest;

pub const LOG_FILE: &str = "blocks.log";
pub const INDEX_FILE: &str = "blocks.idx";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogHeader {
    pub magic: [u8; 4],
    pub version: u32,
}

impl LogHeader {
    pub const SIZE: usize = 8;
    pub const MAGIC: [u8; 4] = *b"CRBL";
    pub const VERSION: u32 = 1;

    pub fn current() -> Self {
        Self { magic: Self::MAGIC, version: Self::VERSION }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&self.magic);
        LittleEndian::write_u32(&mut buf[4..8], self.version);
        buf
    }

    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(StoreError::InvalidFormat(format!("block log header is {} bytes", buf.len())));
        }
        if buf[0..4] != Self::MAGIC {
            return Err(StoreError::InvalidMagic);
        }
        let version = LittleEndian::read_u32(&buf[4..8]);
        if version != Self::VERSION {
            return Err(StoreError::UnsupportedVersion(version));
        }
        Ok(Self { magic: Self::MAGIC, version })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordKind {
    Meta = 1,
    Block = 2,
}

impl RecordKind {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(RecordKind::Meta),
            2 => Some(RecordKind::Block),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    pub kind: RecordKind,
    pub height: u64,
    pub payload_len: u32,
    pub checksum: u64,
}

impl RecordHeader {
    pub const SIZE: usize = 1 + 8 + 4 + 8; // 21 bytes

    pub fn new(kind: RecordKind, height: u64, payload: &[u8]) -> Self {
        let payload_len = payload.len() as u32;
        Self { kind, height, payload_len, checksum: checksum(kind, height, payload_len, payload) }
    }

    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(StoreError::InvalidFormat("truncated record header".to_string()));
        }
        let kind = RecordKind::from_u8(buf[0])
            .ok_or_else(|| StoreError::InvalidFormat(format!("unknown record kind {}", buf[0])))?;
        Ok(Self {
            kind,
            height: LittleEndian::read_u64(&buf[1..9]),
            payload_len: LittleEndian::read_u32(&buf[9..13]),
            checksum: LittleEndian::read_u64(&buf[13..21]),
        })
    }

    /// Header followed by payload, ready to append.
    pub fn frame(&self, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE + payload.len());
        buf.push(self.kind as u8);
        buf.extend_from_slice(&self.height.to_le_bytes());
        buf.extend_from_slice(&self.payload_len.to_le_bytes());
        buf.extend_from_slice(&self.checksum.to_le_bytes());
        buf.extend_from_slice(payload);
        buf
    }

    /// Checks `payload` against the stored checksum.
    pub fn verify(&self, payload: &[u8]) -> Result<()> {
        let found = checksum(self.kind, self.height, self.payload_len, payload);
        if found != self.checksum {
            return Err(StoreError::ChecksumMismatch { height: self.height, expected: self.checksum, found });
        }
        Ok(())
    }
}

fn checksum(kind: RecordKind, height: u64, payload_len: u32, payload: &[u8]) -> u64 {
    let mut digest = Digest::new();
    digest.write(&[kind as u8]);
    digest.write(&height.to_le_bytes());
    digest.write(&payload_len.to_le_bytes());
    digest.write(payload);
    digest.sum64()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub height: u64,
    pub meta_offset: u64,
    pub block_offset: u64,
}

impl IndexEntry {
    pub const SIZE: usize = 24;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        LittleEndian::write_u64(&mut buf[0..8], self.height);
        LittleEndian::write_u64(&mut buf[8..16], self.meta_offset);
        LittleEndian::write_u64(&mut buf[16..24], self.block_offset);
        buf
    }

    /// Parses a whole index file. A trailing partial entry is an error.
    pub fn parse_all(buf: &[u8]) -> Result<Vec<Self>> {
        if buf.len() % Self::SIZE != 0 {
            return Err(StoreError::InvalidFormat(format!(
                "index length {} is not a multiple of {}",
                buf.len(),
                Self::SIZE
            )));
        }
        Ok(buf
            .chunks_exact(Self::SIZE)
            .map(|chunk| Self {
                height: LittleEndian::read_u64(&chunk[0..8]),
                meta_offset: LittleEndian::read_u64(&chunk[8..16]),
                block_offset: LittleEndian::read_u64(&chunk[16..24]),
            })
            .collect())
    }
}
