//! Record table entries

use crate::compression::CompressionMethod;
use binrw::{BinRead, BinWrite};
use std::fmt;

/// Size of one on-disk record in bytes
pub const RECORD_SIZE: usize = 24;

/// Size of one content digest in the trailing digest block
pub const DIGEST_SIZE: usize = 16;

/// On-disk record layout (24 bytes, little-endian)
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct RawRecord {
    /// CRC of the record
    pub checksum: u32,
    /// Size of the payload after inflation
    pub inflated_size: u32,
    /// Offset of the payload in the container file
    pub data_offset: u32,
    /// Compression method of the payload
    pub compression: u32,
    /// Size of the payload as stored
    pub deflated_size: u32,
    /// Offset of the path in the inflated name block
    pub name_offset: u32,
}

/// A fully decoded archive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    /// Logical path, decoded from the name block
    pub path: String,
    /// CRC of the record
    pub checksum: u32,
    /// Size of the payload after inflation
    pub inflated_size: u32,
    /// Offset of the payload in the container file
    pub data_offset: u32,
    /// Compression method code
    pub compression: u32,
    /// Size of the payload as stored; equals `inflated_size` for stored entries
    pub deflated_size: u32,
    /// Offset of the path in the inflated name block
    pub name_offset: u32,
    /// MD5 of the inflated payload
    pub digest: [u8; DIGEST_SIZE],
}

impl ArchiveRecord {
    /// Combine a raw record with its resolved path and digest.
    ///
    /// Stored records take their inflated size as the deflated size,
    /// whatever the table holds.
    pub fn new(raw: RawRecord, path: String, digest: [u8; DIGEST_SIZE]) -> Self {
        let deflated_size = if raw.compression == CompressionMethod::None.as_u32() {
            raw.inflated_size
        } else {
            raw.deflated_size
        };

        Self {
            path,
            checksum: raw.checksum,
            inflated_size: raw.inflated_size,
            data_offset: raw.data_offset,
            compression: raw.compression,
            deflated_size,
            name_offset: raw.name_offset,
            digest,
        }
    }

    /// Compression method, if the code is recognized
    pub fn compression_method(&self) -> Option<CompressionMethod> {
        CompressionMethod::from_u32(self.compression)
    }

    /// Whether the payload is stored without compression
    pub fn is_stored(&self) -> bool {
        self.compression == CompressionMethod::None.as_u32()
    }

    /// Byte range of the payload in the container file
    pub fn data_range(&self) -> std::ops::Range<u64> {
        let start = u64::from(self.data_offset);
        start..start + u64::from(self.deflated_size)
    }

    /// Compare inflated content against the stored digest
    pub fn digest_matches(&self, content: &[u8]) -> DigestStatus {
        if self.digest == [0u8; DIGEST_SIZE] {
            return DigestStatus::Absent;
        }

        let computed = md5::compute(content);
        if computed.0 == self.digest {
            DigestStatus::Match
        } else {
            DigestStatus::Mismatch {
                expected: hex::encode(self.digest),
                actual: hex::encode(computed.0),
            }
        }
    }
}

/// Outcome of a digest check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestStatus {
    /// Content hashes to the stored digest
    Match,
    /// Content does not hash to the stored digest
    Mismatch {
        /// Stored digest, hex
        expected: String,
        /// Computed digest, hex
        actual: String,
    },
    /// The container stores an all-zero digest for this entry
    Absent,
}

impl fmt::Display for DigestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match => write!(f, "match"),
            Self::Mismatch { expected, actual } => {
                write!(f, "mismatch: expected {expected}, got {actual}")
            }
            Self::Absent => write!(f, "no digest"),
        }
    }
}
