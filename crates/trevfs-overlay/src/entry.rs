//! Archive entry reads
//!
//! Each read opens the container, maps just the entry's byte range, and
//! inflates it. The map and file handle are dropped before returning, so
//! nothing is held between reads.

use crate::{OverlayError, Result};
use memmap2::MmapOptions;
use std::fs::File;
use std::path::Path;
use tracing::trace;
use trevfs_formats::{ArchiveRecord, inflate};

/// Read and inflate one entry of the container at `container`.
///
/// Returns a buffer of exactly `record.inflated_size` bytes, or
/// [`OverlayError::EntryRead`].
pub fn read_entry(container: &Path, record: &ArchiveRecord) -> Result<Vec<u8>> {
    let fail = |reason: String| OverlayError::EntryRead {
        path: record.path.clone(),
        reason,
    };

    let range = record.data_range();
    trace!(
        "Reading {} from {} at {}..{}",
        record.path,
        container.display(),
        range.start,
        range.end
    );

    let file = File::open(container)
        .map_err(|e| fail(format!("failed to open {}: {e}", container.display())))?;
    let size = file
        .metadata()
        .map_err(|e| fail(format!("failed to get metadata: {e}")))?
        .len();

    if range.end > size {
        return Err(fail(format!(
            "data range {}..{} beyond container size {size}",
            range.start, range.end
        )));
    }

    if record.inflated_size == 0 {
        return inflate(&[], record.compression, 0, 0).map_err(|e| fail(e.to_string()));
    }

    let len = usize::try_from(range.end - range.start)
        .map_err(|_| fail("data range does not fit in memory".to_string()))?;
    if len == 0 {
        return Err(fail(format!(
            "empty data range for {} inflated bytes",
            record.inflated_size
        )));
    }

    // Map only the entry's bytes
    #[allow(unsafe_code)]
    let mmap = unsafe {
        MmapOptions::new()
            .offset(range.start)
            .len(len)
            .map(&file)
            .map_err(|e| fail(format!("failed to mmap entry: {e}")))?
    };

    inflate(
        &mmap,
        record.compression,
        record.deflated_size as usize,
        record.inflated_size as usize,
    )
    .map_err(|e| fail(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use trevfs_formats::builder::{TreBuilder, TreEntry};
    use trevfs_formats::TreArchive;

    fn container(entries: Vec<TreEntry>) -> (NamedTempFile, TreArchive) {
        let mut builder = TreBuilder::new();
        for entry in entries {
            builder = builder.entry(entry);
        }
        let image = builder.build().expect("Test operation should succeed");
        let archive = TreArchive::parse(&image).expect("Test operation should succeed");

        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(&image).expect("write");
        file.flush().expect("flush");
        (file, archive)
    }

    #[test]
    fn test_read_stored_and_zlib() {
        let text = b"a compressed payload, a compressed payload".to_vec();
        let (file, archive) = container(vec![
            TreEntry::new("plain.txt", b"plain".to_vec()),
            TreEntry::new("packed.txt", text.clone()).compressed(),
        ]);

        let plain = archive.records.get("plain.txt").expect("record");
        assert_eq!(read_entry(file.path(), plain).expect("read"), b"plain");

        let packed = archive.records.get("packed.txt").expect("record");
        assert_eq!(read_entry(file.path(), packed).expect("read"), text);
    }

    #[test]
    fn test_read_empty_entry() {
        let (file, archive) = container(vec![TreEntry::new("empty", Vec::new())]);
        let record = archive.records.get("empty").expect("record");
        assert!(read_entry(file.path(), record).expect("read").is_empty());
    }

    #[test]
    fn test_range_beyond_file() {
        let (file, archive) = container(vec![TreEntry::new("a", b"abc".to_vec())]);
        let mut record = archive.records.get("a").expect("record").clone();
        record.data_offset = 1 << 20;

        let err = read_entry(file.path(), &record).expect_err("should fail");
        assert!(matches!(err, OverlayError::EntryRead { ref path, .. } if path == "a"));
    }

    #[test]
    fn test_missing_container() {
        let (file, archive) = container(vec![TreEntry::new("a", b"abc".to_vec())]);
        let record = archive.records.get("a").expect("record").clone();
        let path = file.path().to_path_buf();
        drop(file);

        assert!(matches!(
            read_entry(&path, &record),
            Err(OverlayError::EntryRead { .. })
        ));
    }

    #[test]
    fn test_unsupported_entry_compression() {
        let (file, archive) = container(vec![TreEntry::new("a", b"abc".to_vec())]);
        let mut record = archive.records.get("a").expect("record").clone();
        record.compression = 1;

        assert!(matches!(
            read_entry(file.path(), &record),
            Err(OverlayError::EntryRead { .. })
        ));
    }
}
