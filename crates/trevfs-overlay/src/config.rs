//! Configuration for the overlay

use crate::{OverlayError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Kind of backing source named in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Loose directory
    Directory,
    /// TRE container
    Tree,
    /// Legacy single-file table
    Toc,
}

/// One backing source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source kind
    pub kind: SourceKind,
    /// Directory or file path
    pub path: PathBuf,
    /// Resolution priority; higher is consulted first
    #[serde(default)]
    pub priority: i32,
}

impl SourceConfig {
    /// Create a source entry
    pub fn new<P: AsRef<Path>>(kind: SourceKind, path: P, priority: i32) -> Self {
        Self {
            kind,
            path: path.as_ref().to_path_buf(),
            priority,
        }
    }
}

/// Configuration for an [`Overlay`](crate::Overlay)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Backing sources
    pub sources: Vec<SourceConfig>,

    /// Check the MD5 of every entry read from a container
    pub verify_digests: bool,

    /// Leave out containers that fail to preprocess instead of failing
    pub skip_invalid: bool,
}

impl OverlayConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| OverlayError::Config(format!("invalid JSON: {e}")))
    }

    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            OverlayError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| OverlayError::Config(format!("failed to serialize: {e}")))
    }

    /// Add a backing source
    #[must_use]
    pub fn with_source<P: AsRef<Path>>(mut self, kind: SourceKind, path: P, priority: i32) -> Self {
        self.sources.push(SourceConfig::new(kind, path, priority));
        self
    }

    /// Enable or disable digest checks
    #[must_use]
    pub const fn with_verify_digests(mut self, enable: bool) -> Self {
        self.verify_digests = enable;
        self
    }

    /// Enable or disable skipping of invalid containers
    #[must_use]
    pub const fn with_skip_invalid(mut self, enable: bool) -> Self {
        self.skip_invalid = enable;
        self
    }
}
