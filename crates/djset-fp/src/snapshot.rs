//! Binary store snapshot (.djfp)
//!
//! Layout (little-endian):
//!
//! | field                    | size |
//! |--------------------------|------|
//! | magic `DJFP`             | 4    |
//! | version                  | 2    |
//! | flags (bit 0 compressed) | 2    |
//! | record count             | 4    |
//! | payload size             | 8    |
//! | compressed payload size  | 8    |
//! | CRC-64 of stored payload | 8    |
//! | created_at length        | 2    |
//! | created_at (RFC 3339)    | n    |
//! | payload                  | rest |
//!
//! The payload is the bincode encoding of the track map, zstd-compressed.

use crate::{FpError, StoreFile};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Magic bytes for .djfp files: "DJFP"
pub const MAGIC: [u8; 4] = [0x44, 0x4A, 0x46, 0x50];

/// Current snapshot version
pub const VERSION: u16 = 1;

const FLAG_COMPRESSED: u16 = 0x1;
const FIXED_HEADER_LEN: usize = 38;
const ZSTD_LEVEL: i32 = 3;

const CRC64: crc::Crc<u64> = crc::Crc::<u64>::new(&crc::CRC_64_ECMA_182);

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub flags: u16,
    pub record_count: u32,
    pub payload_size: u64,
    pub payload_size_compressed: u64,
    pub checksum: u64,
    pub created_at: String,
}

impl SnapshotHeader {
    pub fn is_compressed(&self) -> bool {
        (self.flags & FLAG_COMPRESSED) != 0
    }

    fn encoded_len(&self) -> usize {
        FIXED_HEADER_LEN + self.created_at.len()
    }
}

#[derive(Debug, Default)]
pub struct SnapshotWriter {}

impl SnapshotWriter {
    pub fn new() -> Self {
        Self {}
    }

    /// Write a snapshot of `file` to `path`
    pub fn write(&self, path: &Path, file: &StoreFile) -> Result<(), FpError> {
        let payload = bincode::serialize(&file.tracks)?;
        let compressed = zstd::encode_all(&payload[..], ZSTD_LEVEL)?;

        let header = SnapshotHeader {
            magic: MAGIC,
            version: VERSION,
            flags: FLAG_COMPRESSED,
            record_count: record_count(file.len())?,
            payload_size: payload.len() as u64,
            payload_size_compressed: compressed.len() as u64,
            checksum: CRC64.checksum(&compressed),
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        let mut writer = BufWriter::new(File::create(path)?);
        Self::write_header(&mut writer, &header)?;
        writer.write_all(&compressed)?;
        writer.flush()?;
        Ok(())
    }

    fn write_header<W: Write>(writer: &mut W, header: &SnapshotHeader) -> Result<(), FpError> {
        writer.write_all(&header.magic)?;
        writer.write_all(&header.version.to_le_bytes())?;
        writer.write_all(&header.flags.to_le_bytes())?;
        writer.write_all(&header.record_count.to_le_bytes())?;
        writer.write_all(&header.payload_size.to_le_bytes())?;
        writer.write_all(&header.payload_size_compressed.to_le_bytes())?;
        writer.write_all(&header.checksum.to_le_bytes())?;
        writer.write_all(&(header.created_at.len() as u16).to_le_bytes())?;
        writer.write_all(header.created_at.as_bytes())?;
        Ok(())
    }
}

pub struct SnapshotReader;

impl SnapshotReader {
    /// Read a snapshot file into a store file
    pub fn read(path: &Path) -> Result<StoreFile, FpError> {
        let bytes = std::fs::read(path)?;
        Self::decode(&bytes)
    }

    /// Parse only the header, without touching the payload
    pub fn read_header(bytes: &[u8]) -> Result<SnapshotHeader, FpError> {
        if bytes.len() < FIXED_HEADER_LEN {
            return Err(FpError::Truncated("header"));
        }

        let mut cursor = ByteCursor { bytes, pos: 0 };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(cursor.take(4)?);
        if magic != MAGIC {
            return Err(FpError::BadMagic);
        }

        let version = cursor.read_u16()?;
        if version != VERSION {
            return Err(FpError::UnsupportedVersion(version));
        }

        let flags = cursor.read_u16()?;
        let record_count = cursor.read_u32()?;
        let payload_size = cursor.read_u64()?;
        let payload_size_compressed = cursor.read_u64()?;
        let checksum = cursor.read_u64()?;
        let created_len = cursor.read_u16()? as usize;
        let created_at = String::from_utf8_lossy(cursor.take(created_len)?).into_owned();

        Ok(SnapshotHeader {
            magic,
            version,
            flags,
            record_count,
            payload_size,
            payload_size_compressed,
            checksum,
            created_at,
        })
    }

    /// Decode a whole snapshot held in memory
    pub fn decode(bytes: &[u8]) -> Result<StoreFile, FpError> {
        let header = Self::read_header(bytes)?;
        let start = header.encoded_len();
        let end = usize::try_from(header.payload_size_compressed)
            .ok()
            .and_then(|len| start.checked_add(len))
            .ok_or(FpError::Truncated("payload"))?;
        let stored = bytes.get(start..end).ok_or(FpError::Truncated("payload"))?;

        let found = CRC64.checksum(stored);
        if found != header.checksum {
            return Err(FpError::ChecksumMismatch {
                expected: header.checksum,
                found,
            });
        }

        let payload = if header.is_compressed() {
            zstd::decode_all(stored)?
        } else {
            stored.to_vec()
        };

        let tracks: BTreeMap<_, _> = bincode::deserialize(&payload)?;
        Ok(StoreFile { tracks })
    }
}

fn record_count(len: usize) -> Result<u32, FpError> {
    u32::try_from(len).map_err(|_| FpError::TooManyRecords(len))
}

struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], FpError> {
        let slice = self
            .bytes
            .get(self.pos..self.pos.saturating_add(n))
            .ok_or(FpError::Truncated("header"))?;
        self.pos += n;
        Ok(slice)
    }

    fn read_u16(&mut self) -> Result<u16, FpError> {
        let mut buf = [0u8; 2];
        buf.copy_from_slice(self.take(2)?);
        Ok(u16::from_le_bytes(buf))
    }

    fn read_u32(&mut self) -> Result<u32, FpError> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(buf))
    }

    fn read_u64(&mut self) -> Result<u64, FpError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }
}
