//! Loose directory source.

use crate::{OverlayError, Result};
use std::path::{Component, Path, PathBuf};
use tracing::trace;

/// Serves regular files under a host directory.
///
/// Logical paths are relative to the root. Absolute paths and paths with
/// `.` or `..` components never match.
#[derive(Debug, Clone)]
pub struct PathNode {
    root: PathBuf,
    priority: i32,
}

impl PathNode {
    /// Create a node over `root`.
    pub fn new(root: impl AsRef<Path>, priority: i32) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            priority,
        }
    }

    /// Directory backing this node.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolution priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Host path for a logical path, if it stays under the root.
    pub fn host_path(&self, path: &str) -> Option<PathBuf> {
        let logical = Path::new(path);
        let mut components = logical.components().peekable();
        components.peek()?;

        if components.all(|c| matches!(c, Component::Normal(_))) {
            Some(self.root.join(logical))
        } else {
            None
        }
    }

    /// Whether a regular file exists at `path`.
    pub fn exists(&self, path: &str) -> bool {
        self.host_path(path).is_some_and(|p| p.is_file())
    }

    /// Read the file at `path`.
    pub fn try_open(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let Some(host) = self.host_path(path).filter(|p| p.is_file()) else {
            return Ok(None);
        };

        trace!("Reading loose file {}", host.display());
        std::fs::read(&host)
            .map(Some)
            .map_err(|e| OverlayError::EntryRead {
                path: path.to_string(),
                reason: format!("failed to read {}: {e}", host.display()),
            })
    }

    /// Read the file at `path`; failures are reported as absent.
    pub fn open(&self, path: &str) -> Option<Vec<u8>> {
        self.try_open(path).ok().flatten()
    }
}
