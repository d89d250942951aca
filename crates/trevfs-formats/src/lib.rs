//! Parser for TRE archive containers
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! A TRE container packs many game asset files into one file. Its layout,
//! little-endian throughout:
//!
//! - **Header**: 36 bytes of geometry, see [`header`]
//! - **Payloads**: each file's bytes, stored or `ZLib` compressed
//! - **Record table**: 24 bytes per file, compressed as one block
//! - **Name block**: zero-terminated paths, compressed as one block
//! - **Digest block**: one 16-byte MD5 per record, uncompressed
//!
//! [`TreArchive::parse`] decodes the header, record table, name block and
//! digests in one step. Payloads are left in place; callers fetch the byte
//! range described by an [`ArchiveRecord`] and hand it to [`inflate`].
//!
//! # Example
//!
//! ```rust,ignore
//! use trevfs_formats::{TreArchive, inflate};
//!
//! let image = std::fs::read("patch_00.tre")?;
//! let archive = TreArchive::parse(&image)?;
//! let record = archive.records.get("string/en/city.stf").unwrap();
//! let range = record.data_range();
//! let bytes = inflate(
//!     &image[range.start as usize..range.end as usize],
//!     record.compression,
//!     record.deflated_size as usize,
//!     record.inflated_size as usize,
//! )?;
//! ```

#![warn(missing_docs)]

pub mod compression;
pub mod error;
pub mod header;
pub mod record;
pub mod toc;

/// Container builder for producing test fixtures
#[cfg(any(test, feature = "test-support"))]
pub mod builder;

pub use compression::{CompressionMethod, MAX_INFLATED_SIZE, inflate};
pub use error::{TreError, TreResult};
pub use header::{HEADER_SIZE, TRE_MAGIC, TreHeader, TreVersion};
pub use record::{ArchiveRecord, DIGEST_SIZE, DigestStatus, RECORD_SIZE, RawRecord};
pub use toc::{RecordTable, TreArchive};
