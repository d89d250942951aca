//! TRE container source.

use crate::entry::read_entry;
use crate::{OverlayError, Result};
use memmap2::Mmap;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use trevfs_formats::{ArchiveRecord, DigestStatus, TreArchive, TreError, TreHeader};

/// A TRE container with its decoded table of contents.
///
/// Only [`preprocess`](Self::preprocess) constructs one, so a `TreeNode`
/// always has a complete record table. The node keeps the file path, not
/// an open handle.
#[derive(Debug)]
pub struct TreeNode {
    file_path: PathBuf,
    priority: i32,
    archive: TreArchive,
    verify_digests: bool,
}

impl TreeNode {
    /// Decode the container at `file_path`.
    ///
    /// Fails with [`OverlayError::Container`] if the file cannot be read or
    /// any part of its table of contents is invalid.
    pub fn preprocess(file_path: impl AsRef<Path>, priority: i32) -> Result<Self> {
        let file_path = file_path.as_ref().to_path_buf();
        let fail = |source: TreError| OverlayError::Container {
            path: file_path.clone(),
            source,
        };

        debug!("Preprocessing {}", file_path.display());

        let file = File::open(&file_path).map_err(|e| fail(e.into()))?;
        let size = file.metadata().map_err(|e| fail(e.into()))?.len();

        let archive = if size == 0 {
            TreArchive::parse(&[])
        } else {
            #[allow(unsafe_code)]
            let mmap = unsafe { Mmap::map(&file).map_err(|e| fail(e.into()))? };
            TreArchive::parse(&mmap)
        }
        .map_err(fail)?;

        let header = &archive.header;
        debug!(
            "{}: {} records, table at {} ({} bytes, method {}), names {} -> {} bytes (method {})",
            file_path.display(),
            header.record_count,
            header.record_offset,
            header.record_deflated_size,
            header.record_compression,
            header.name_deflated_size,
            header.name_inflated_size,
            header.name_compression
        );
        info!(
            "Registered {} with {} entries at priority {priority}",
            file_path.display(),
            archive.records.len()
        );

        Ok(Self {
            file_path,
            priority,
            archive,
            verify_digests: false,
        })
    }

    /// Check the MD5 of every opened entry and log mismatches.
    #[must_use]
    pub fn with_digest_verification(mut self, enable: bool) -> Self {
        self.verify_digests = enable;
        self
    }

    /// Container file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Resolution priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Parsed container header.
    pub fn header(&self) -> &TreHeader {
        &self.archive.header
    }

    /// Number of distinct entries.
    pub fn entry_count(&self) -> usize {
        self.archive.records.len()
    }

    /// Record for `path`.
    pub fn record(&self, path: &str) -> Option<&ArchiveRecord> {
        self.archive.records.get(path)
    }

    /// Whether the record table has `path`.
    pub fn exists(&self, path: &str) -> bool {
        self.archive.records.contains(path)
    }

    /// All logical paths in the container.
    pub fn list_entries(&self) -> HashSet<String> {
        self.archive.records.paths().map(str::to_owned).collect()
    }

    /// Read and inflate `path`.
    ///
    /// `Ok(None)` when the path is not in the table.
    pub fn try_open(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let Some(record) = self.record(path) else {
            return Ok(None);
        };

        let data = read_entry(&self.file_path, record)?;

        if self.verify_digests
            && let status @ DigestStatus::Mismatch { .. } = record.digest_matches(&data)
        {
            warn!(
                "Digest check failed for {path} in {}: {status}",
                self.file_path.display()
            );
        }

        Ok(Some(data))
    }

    /// Read and inflate `path`; read failures are reported as absent.
    pub fn open(&self, path: &str) -> Option<Vec<u8>> {
        match self.try_open(path) {
            Ok(data) => data,
            Err(e) => {
                warn!("{}: {e}", self.file_path.display());
                None
            }
        }
    }

    /// Read `path` and compare it with its stored digest.
    ///
    /// `Ok(None)` when the path is not in the table.
    pub fn verify(&self, path: &str) -> Result<Option<DigestStatus>> {
        let Some(record) = self.record(path) else {
            return Ok(None);
        };
        let data = read_entry(&self.file_path, record)?;
        Ok(Some(record.digest_matches(&data)))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;
    use trevfs_formats::builder::{TreBuilder, TreEntry};

    fn write_tre(dir: &TempDir, name: &str, builder: &TreBuilder) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, builder.build().expect("Test operation should succeed")).expect("write");
        path
    }

    #[test]
    fn test_preprocess_and_open() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_tre(
            &dir,
            "a.tre",
            &TreBuilder::new()
                .entry(TreEntry::new("one.txt", b"one".to_vec()))
                .entry(TreEntry::new("two.txt", b"two two two two".to_vec()).compressed()),
        );

        let node = TreeNode::preprocess(&path, 7).expect("preprocess");
        assert_eq!(node.priority(), 7);
        assert_eq!(node.entry_count(), 2);
        assert_eq!(
            node.list_entries(),
            HashSet::from(["one.txt".to_string(), "two.txt".to_string()])
        );
        assert_eq!(node.open("one.txt").as_deref(), Some(&b"one"[..]));
        assert_eq!(node.open("two.txt").as_deref(), Some(&b"two two two two"[..]));
        assert!(node.open("three.txt").is_none());
        assert!(!node.exists("three.txt"));
    }

    #[test]
    fn test_preprocess_missing_file() {
        let dir = TempDir::new().expect("tempdir");
        let err = TreeNode::preprocess(dir.path().join("nope.tre"), 0).expect_err("should fail");
        assert!(matches!(err.format_error(), Some(TreError::Io(_))));
    }

    #[test]
    fn test_preprocess_empty_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("empty.tre");
        fs::write(&path, b"").expect("write");
        let err = TreeNode::preprocess(&path, 0).expect_err("should fail");
        assert!(matches!(
            err.format_error(),
            Some(TreError::CorruptArchive(_))
        ));
    }

    #[test]
    fn test_verify_reports_mismatch() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_tre(
            &dir,
            "d.tre",
            &TreBuilder::new()
                .entry(TreEntry::new("good", b"good".to_vec()))
                .entry(TreEntry::new("bad", b"bad".to_vec()).with_digest([1; 16]))
                .entry(TreEntry::new("none", b"none".to_vec()).with_digest([0; 16])),
        );

        let node = TreeNode::preprocess(&path, 0)
            .expect("preprocess")
            .with_digest_verification(true);

        assert_eq!(node.verify("good").expect("verify"), Some(DigestStatus::Match));
        assert!(matches!(
            node.verify("bad").expect("verify"),
            Some(DigestStatus::Mismatch { .. })
        ));
        assert_eq!(node.verify("none").expect("verify"), Some(DigestStatus::Absent));
        assert_eq!(node.verify("missing").expect("verify"), None);

        // Mismatches are reported, the bytes still come back
        assert_eq!(node.open("bad").as_deref(), Some(&b"bad"[..]));
    }

    #[test]
    fn test_open_after_container_truncated() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_tre(
            &dir,
            "t.tre",
            &TreBuilder::new().entry(TreEntry::new("a", vec![9u8; 64])),
        );
        let node = TreeNode::preprocess(&path, 0).expect("preprocess");

        // Drop the payload bytes out from under the node
        fs::write(&path, b"EERT").expect("write");

        assert!(node.exists("a"));
        assert!(matches!(
            node.try_open("a"),
            Err(OverlayError::EntryRead { .. })
        ));
        assert!(node.open("a").is_none());
        assert!(node.exists("a"));
    }
}
