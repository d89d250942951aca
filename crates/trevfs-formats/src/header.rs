//! TRE container header
//!
//! The header is 36 little-endian bytes at offset 0:
//!
//! | Offset | Field |
//! |--------|-------|
//! | 0  | magic token (`TREE`) |
//! | 4  | version (`0005` or `0006`) |
//! | 8  | record count |
//! | 12 | record table offset |
//! | 16 | record table compression |
//! | 20 | record table deflated size |
//! | 24 | name block compression |
//! | 28 | name block deflated size |
//! | 32 | name block inflated size |

use crate::error::{TreError, TreResult};
use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};

/// Magic token: the `TREE` tag read as a little-endian u32 (bytes `EERT`)
pub const TRE_MAGIC: u32 = 0x5452_4545;

/// Header size in bytes
pub const HEADER_SIZE: usize = 36;

/// Container format revisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreVersion {
    /// `0005` tag (bytes `5000`)
    V5,
    /// `0006` tag (bytes `6000`)
    V6,
}

impl TreVersion {
    /// Parse the on-disk version tag
    pub fn from_u32(tag: u32) -> Option<Self> {
        match tag {
            0x3030_3035 => Some(Self::V5),
            0x3030_3036 => Some(Self::V6),
            _ => None,
        }
    }

    /// On-disk version tag
    pub fn as_u32(self) -> u32 {
        match self {
            Self::V5 => 0x3030_3035,
            Self::V6 => 0x3030_3036,
        }
    }
}

/// TRE container header
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct TreHeader {
    /// Magic token, always [`TRE_MAGIC`]
    pub magic: u32,
    /// Version tag
    pub version: u32,
    /// Number of records in the table
    pub record_count: u32,
    /// Byte offset of the compressed record table
    pub record_offset: u32,
    /// Compression method of the record table
    pub record_compression: u32,
    /// Compressed size of the record table
    pub record_deflated_size: u32,
    /// Compression method of the name block
    pub name_compression: u32,
    /// Compressed size of the name block
    pub name_deflated_size: u32,
    /// Inflated size of the name block
    pub name_inflated_size: u32,
}

impl TreHeader {
    /// Parse and validate the header at the start of `data`
    pub fn parse(data: &[u8]) -> TreResult<Self> {
        let magic = read_u32(data, 0)?;
        if magic != TRE_MAGIC {
            return Err(TreError::UnsupportedFormat(magic));
        }

        let version = read_u32(data, 4)?;
        if TreVersion::from_u32(version).is_none() {
            return Err(TreError::UnsupportedVersion(version));
        }

        if data.len() < HEADER_SIZE {
            return Err(TreError::corrupt(format!(
                "header needs {HEADER_SIZE} bytes, only {} available",
                data.len()
            )));
        }

        Self::read(&mut Cursor::new(&data[..HEADER_SIZE]))
            .map_err(|e| TreError::corrupt(format!("failed to read header: {e}")))
    }

    /// Serialize the header to its 36-byte form
    pub fn build(&self) -> TreResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(HEADER_SIZE));
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Format revision
    ///
    /// Always `Some` for a header returned by [`parse`](Self::parse).
    pub fn revision(&self) -> Option<TreVersion> {
        TreVersion::from_u32(self.version)
    }

    /// Inflated size of the record table
    pub fn record_table_size(&self) -> TreResult<usize> {
        (self.record_count as usize)
            .checked_mul(crate::record::RECORD_SIZE)
            .ok_or_else(|| TreError::corrupt(format!("record count {} overflows", self.record_count)))
    }
}

fn read_u32(data: &[u8], offset: usize) -> TreResult<u32> {
    data.get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| {
            TreError::corrupt(format!(
                "header truncated at offset {offset}: {} bytes available",
                data.len()
            ))
        })
}
