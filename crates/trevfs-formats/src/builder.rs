//! In-memory container builder for fixtures
//!
//! Produces the layout read by [`TreArchive::parse`](crate::TreArchive::parse):
//! header, payloads, record table, name block, digests.

use crate::compression::{CompressionMethod, deflate};
use crate::error::{TreError, TreResult};
use crate::header::{HEADER_SIZE, TRE_MAGIC, TreHeader, TreVersion};
use crate::record::{DIGEST_SIZE, RECORD_SIZE, RawRecord};
use binrw::BinWrite;
use binrw::io::Cursor;

/// One file to place in a container
#[derive(Debug, Clone)]
pub struct TreEntry {
    /// Logical path
    pub path: String,
    /// Inflated content
    pub data: Vec<u8>,
    /// Payload compression
    pub compression: CompressionMethod,
    /// Record checksum field
    pub checksum: u32,
    /// Digest override; `None` stores the MD5 of `data`
    pub digest: Option<[u8; DIGEST_SIZE]>,
}

impl TreEntry {
    /// Stored entry with a computed digest
    pub fn new(path: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            data,
            compression: CompressionMethod::None,
            checksum: 0,
            digest: None,
        }
    }

    /// Compress the payload with `ZLib`
    #[must_use]
    pub fn compressed(mut self) -> Self {
        self.compression = CompressionMethod::ZLib;
        self
    }

    /// Set the record checksum field
    #[must_use]
    pub fn with_checksum(mut self, checksum: u32) -> Self {
        self.checksum = checksum;
        self
    }

    /// Store `digest` instead of the computed MD5
    #[must_use]
    pub fn with_digest(mut self, digest: [u8; DIGEST_SIZE]) -> Self {
        self.digest = Some(digest);
        self
    }
}

/// Builder for complete container images
#[derive(Debug, Clone)]
pub struct TreBuilder {
    version: TreVersion,
    record_compression: CompressionMethod,
    name_compression: CompressionMethod,
    entries: Vec<TreEntry>,
}

impl Default for TreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreBuilder {
    /// Version `0005` container with `ZLib` record table and name block
    pub fn new() -> Self {
        Self {
            version: TreVersion::V5,
            record_compression: CompressionMethod::ZLib,
            name_compression: CompressionMethod::ZLib,
            entries: Vec::new(),
        }
    }

    /// Set the format revision
    #[must_use]
    pub fn version(mut self, version: TreVersion) -> Self {
        self.version = version;
        self
    }

    /// Set the record table compression
    #[must_use]
    pub fn record_compression(mut self, method: CompressionMethod) -> Self {
        self.record_compression = method;
        self
    }

    /// Set the name block compression
    #[must_use]
    pub fn name_compression(mut self, method: CompressionMethod) -> Self {
        self.name_compression = method;
        self
    }

    /// Append an entry; duplicate paths are kept as separate records
    #[must_use]
    pub fn entry(mut self, entry: TreEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Assemble the container image
    pub fn build(&self) -> TreResult<Vec<u8>> {
        let mut payloads = Vec::new();
        let mut names = Vec::new();
        let mut records = Cursor::new(Vec::with_capacity(self.entries.len() * RECORD_SIZE));
        let mut digests = Vec::with_capacity(self.entries.len() * DIGEST_SIZE);

        for entry in &self.entries {
            let stored = deflate(&entry.data, entry.compression)?;
            let raw = RawRecord {
                checksum: entry.checksum,
                inflated_size: to_u32(entry.data.len())?,
                data_offset: to_u32(HEADER_SIZE + payloads.len())?,
                compression: entry.compression.as_u32(),
                deflated_size: to_u32(stored.len())?,
                name_offset: to_u32(names.len())?,
            };
            raw.write(&mut records)?;

            payloads.extend_from_slice(&stored);
            names.extend_from_slice(entry.path.as_bytes());
            names.push(0);
            digests.extend_from_slice(
                &entry
                    .digest
                    .unwrap_or_else(|| md5::compute(&entry.data).0),
            );
        }

        let record_table = records.into_inner();
        let record_block = deflate(&record_table, self.record_compression)?;
        let name_block = deflate(&names, self.name_compression)?;

        let header = TreHeader {
            magic: TRE_MAGIC,
            version: self.version.as_u32(),
            record_count: to_u32(self.entries.len())?,
            record_offset: to_u32(HEADER_SIZE + payloads.len())?,
            record_compression: self.record_compression.as_u32(),
            record_deflated_size: to_u32(record_block.len())?,
            name_compression: self.name_compression.as_u32(),
            name_deflated_size: to_u32(name_block.len())?,
            name_inflated_size: to_u32(names.len())?,
        };

        let mut out = header.build()?;
        out.extend_from_slice(&payloads);
        out.extend_from_slice(&record_block);
        out.extend_from_slice(&name_block);
        out.extend_from_slice(&digests);
        Ok(out)
    }
}

fn to_u32(value: usize) -> TreResult<u32> {
    u32::try_from(value).map_err(|_| TreError::corrupt(format!("{value} does not fit in u32")))
}
