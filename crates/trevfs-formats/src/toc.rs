//! Table of contents decoding
//!
//! Starting at the header's record offset the container holds, back to back:
//! the compressed record table, the compressed name block, and one 16-byte
//! digest per record.

use crate::compression::{CompressionMethod, inflate};
use crate::error::{TreError, TreResult};
use crate::header::TreHeader;
use crate::record::{ArchiveRecord, DIGEST_SIZE, RawRecord};
use binrw::BinRead;
use binrw::io::Cursor;
use std::collections::HashMap;
use std::collections::hash_map;

/// Mapping from logical path to record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordTable {
    records: HashMap<String, ArchiveRecord>,
}

impl RecordTable {
    /// Create an empty table with room for `capacity` records
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a record under its path; a later record with the same path wins
    pub fn insert(&mut self, record: ArchiveRecord) -> Option<ArchiveRecord> {
        self.records.insert(record.path.clone(), record)
    }

    /// Look up a record by logical path
    pub fn get(&self, path: &str) -> Option<&ArchiveRecord> {
        self.records.get(path)
    }

    /// Whether `path` is in the table
    pub fn contains(&self, path: &str) -> bool {
        self.records.contains_key(path)
    }

    /// Number of distinct paths
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate the logical paths
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Iterate the records
    pub fn iter(&self) -> hash_map::Values<'_, String, ArchiveRecord> {
        self.records.values()
    }
}

impl<'a> IntoIterator for &'a RecordTable {
    type Item = &'a ArchiveRecord;
    type IntoIter = hash_map::Values<'a, String, ArchiveRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A parsed TRE container: header plus table of contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreArchive {
    /// Container header
    pub header: TreHeader,
    /// Records keyed by logical path
    pub records: RecordTable,
}

impl TreArchive {
    /// Parse a complete container image.
    ///
    /// Either every record decodes or an error is returned; no partial table
    /// is ever produced.
    pub fn parse(data: &[u8]) -> TreResult<Self> {
        let header = TreHeader::parse(data)?;
        let record_count = header.record_count as usize;

        let cursor = header.record_offset as usize;
        let (record_data, cursor) = read_block(
            data,
            cursor,
            header.record_compression,
            header.record_deflated_size,
            header.record_table_size()?,
            "record table",
        )?;
        let (name_block, cursor) = read_block(
            data,
            cursor,
            header.name_compression,
            header.name_deflated_size,
            header.name_inflated_size as usize,
            "name block",
        )?;

        let digest_len = record_count
            .checked_mul(DIGEST_SIZE)
            .ok_or_else(|| TreError::corrupt("digest block size overflows"))?;
        let digests = cursor
            .checked_add(digest_len)
            .and_then(|end| data.get(cursor..end))
            .ok_or_else(|| {
                TreError::corrupt(format!(
                    "digest block needs {digest_len} bytes at offset {cursor}, file is {} bytes",
                    data.len()
                ))
            })?;

        let mut records = RecordTable::with_capacity(record_count);
        let mut reader = Cursor::new(record_data.as_slice());
        for (index, digest) in digests.chunks_exact(DIGEST_SIZE).enumerate() {
            let raw = RawRecord::read(&mut reader)
                .map_err(|e| TreError::corrupt(format!("record {index}: {e}")))?;
            let path = resolve_name(&name_block, raw.name_offset as usize)
                .map_err(|e| TreError::corrupt(format!("record {index}: {e}")))?;

            let mut content_digest = [0u8; DIGEST_SIZE];
            content_digest.copy_from_slice(digest);

            records.insert(ArchiveRecord::new(raw, path, content_digest));
        }

        Ok(Self { header, records })
    }

    /// Sorted list of logical paths
    pub fn sorted_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.records.paths().collect();
        paths.sort_unstable();
        paths
    }
}

/// Inflate one header-described block starting at `cursor`, returning the
/// data and the cursor just past the consumed bytes.
fn read_block(
    data: &[u8],
    cursor: usize,
    method: u32,
    deflated_size: u32,
    inflated_size: usize,
    what: &str,
) -> TreResult<(Vec<u8>, usize)> {
    let source = data.get(cursor..).ok_or_else(|| {
        TreError::corrupt(format!(
            "{what} offset {cursor} is past end of file ({} bytes)",
            data.len()
        ))
    })?;

    let block = inflate(source, method, deflated_size as usize, inflated_size).map_err(|e| match e {
        TreError::CorruptArchive(msg) => TreError::corrupt(format!("{what}: {msg}")),
        other => other,
    })?;

    // `inflate` has already rejected unknown methods
    let consumed = CompressionMethod::from_u32(method)
        .map_or(deflated_size as usize, |m| {
            m.consumed_size(deflated_size as usize, inflated_size)
        });
    let next = cursor
        .checked_add(consumed)
        .ok_or_else(|| TreError::corrupt(format!("{what} end offset overflows")))?;

    Ok((block, next))
}

/// Decode the zero-terminated single-byte string at `offset`
fn resolve_name(names: &[u8], offset: usize) -> Result<String, String> {
    let tail = names.get(offset..).ok_or_else(|| {
        format!(
            "name offset {offset} outside name block of {} bytes",
            names.len()
        )
    })?;
    let end = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| format!("name at offset {offset} has no terminator"))?;

    Ok(tail[..end].iter().map(|&b| char::from(b)).collect())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::builder::{TreBuilder, TreEntry};
    use crate::header::{HEADER_SIZE, TreVersion};
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<u8> {
        TreBuilder::new()
            .entry(TreEntry::new("appearance/a.apt", b"stored bytes".to_vec()))
            .entry(
                TreEntry::new("string/en/b.stf", b"zlib bytes zlib bytes zlib bytes".to_vec())
                    .compressed(),
            )
            .entry(TreEntry::new("empty.iff", Vec::new()))
            .build()
            .expect("Test operation should succeed")
    }

    #[test]
    fn test_parse_lists_all_paths() {
        let archive = TreArchive::parse(&sample()).expect("Test operation should succeed");
        assert_eq!(archive.header.record_count, 3);
        assert_eq!(
            archive.sorted_paths(),
            vec!["appearance/a.apt", "empty.iff", "string/en/b.stf"]
        );
    }

    #[test]
    fn test_record_fields() {
        let archive = TreArchive::parse(&sample()).expect("Test operation should succeed");

        let stored = archive.records.get("appearance/a.apt").expect("record");
        assert!(stored.is_stored());
        assert_eq!(stored.inflated_size, 12);
        assert_eq!(stored.deflated_size, 12);
        assert_eq!(stored.data_offset as usize, HEADER_SIZE);
        assert_eq!(stored.digest, md5::compute(b"stored bytes").0);

        let zlib = archive.records.get("string/en/b.stf").expect("record");
        assert_eq!(zlib.compression_method(), Some(CompressionMethod::ZLib));
        assert_eq!(zlib.inflated_size, 32);
        assert_ne!(zlib.deflated_size, zlib.inflated_size);
    }

    #[test]
    fn test_uncompressed_toc_blocks() {
        let data = TreBuilder::new()
            .version(TreVersion::V6)
            .record_compression(CompressionMethod::None)
            .name_compression(CompressionMethod::None)
            .entry(TreEntry::new("x", b"1".to_vec()))
            .build()
            .expect("build");

        let archive = TreArchive::parse(&data).expect("parse");
        assert_eq!(archive.header.version, TreVersion::V6.as_u32());
        assert!(archive.records.contains("x"));
    }

    #[test]
    fn test_empty_container() {
        let data = TreBuilder::new().build().expect("build");
        let archive = TreArchive::parse(&data).expect("parse");
        assert!(archive.records.is_empty());
    }

    #[test]
    fn test_stored_record_ignores_disk_deflated_size() {
        let mut data = TreBuilder::new()
            .record_compression(CompressionMethod::None)
            .name_compression(CompressionMethod::None)
            .entry(TreEntry::new("s.txt", b"abcdef".to_vec()))
            .build()
            .expect("build");

        // Overwrite the record's deflated size (bytes 16..20 of the record)
        let header = TreHeader::parse(&data).expect("header");
        let field = header.record_offset as usize + 16;
        data[field..field + 4].copy_from_slice(&999u32.to_le_bytes());

        let archive = TreArchive::parse(&data).expect("parse");
        assert_eq!(archive.records.get("s.txt").expect("record").deflated_size, 6);
    }

    #[test]
    fn test_duplicate_paths_last_wins() {
        let data = TreBuilder::new()
            .entry(TreEntry::new("dup.txt", b"first".to_vec()))
            .entry(TreEntry::new("dup.txt", b"second!".to_vec()))
            .build()
            .expect("build");

        let archive = TreArchive::parse(&data).expect("parse");
        assert_eq!(archive.header.record_count, 2);
        assert_eq!(archive.records.len(), 1);
        assert_eq!(archive.records.get("dup.txt").expect("record").inflated_size, 7);
    }

    #[test]
    fn test_names_decode_one_char_per_byte() {
        let names = [b'c', b'a', b'f', 0xE9, 0];
        assert_eq!(resolve_name(&names, 0).expect("name"), "caf\u{e9}");
    }

    #[test]
    fn test_name_offset_out_of_range() {
        assert!(resolve_name(b"abc\0", 10).is_err());
        assert!(resolve_name(b"abc", 0).is_err());
        assert_eq!(resolve_name(b"abc\0def\0", 4).expect("name"), "def");
    }

    #[test]
    fn test_bad_magic() {
        let mut data = sample();
        data[0..4].copy_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(
            TreArchive::parse(&data),
            Err(TreError::UnsupportedFormat(0))
        ));
    }

    #[test]
    fn test_truncated_record_table() {
        let data = sample();
        let header = TreHeader::parse(&data).expect("header");
        let cut = header.record_offset as usize + header.record_deflated_size as usize / 2;
        assert!(matches!(
            TreArchive::parse(&data[..cut]),
            Err(TreError::CorruptArchive(_))
        ));
    }

    #[test]
    fn test_truncated_digest_block() {
        let data = sample();
        assert!(matches!(
            TreArchive::parse(&data[..data.len() - 1]),
            Err(TreError::CorruptArchive(_))
        ));
    }

    #[test]
    fn test_record_offset_past_end() {
        let mut data = sample();
        let len = data.len() as u32;
        data[12..16].copy_from_slice(&(len + 100).to_le_bytes());
        assert!(matches!(
            TreArchive::parse(&data),
            Err(TreError::CorruptArchive(_))
        ));
    }

    #[test]
    fn test_unknown_toc_compression() {
        let mut data = sample();
        data[16..20].copy_from_slice(&1u32.to_le_bytes());
        assert!(matches!(
            TreArchive::parse(&data),
            Err(TreError::UnsupportedCompression(1))
        ));
    }
}
