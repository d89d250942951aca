//! Legacy single-file-table source.
//!
//! The on-disk format of this source is not implemented. The node can be
//! registered so configurations naming it still load, but it never has any
//! path.

use std::path::{Path, PathBuf};

/// Placeholder for a `.toc` file table.
#[derive(Debug, Clone)]
pub struct TocNode {
    file_path: PathBuf,
    priority: i32,
}

impl TocNode {
    /// Create a placeholder for the table at `file_path`.
    pub fn new(file_path: impl AsRef<Path>, priority: i32) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            priority,
        }
    }

    /// Table file named by this node.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Resolution priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Always false.
    pub fn exists(&self, _path: &str) -> bool {
        false
    }

    /// Always `None`.
    pub fn open(&self, _path: &str) -> Option<Vec<u8>> {
        None
    }
}
