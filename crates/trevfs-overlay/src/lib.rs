//! Read-only overlay file system over TRE containers and loose directories.
//!
//! An [`Overlay`] holds any number of [`SearchNode`]s, each with a signed
//! priority. A logical path resolves against the nodes from the highest
//! priority down; the first node that has the path serves it.
//!
//! - **Tree**: a TRE container whose table of contents is decoded once by
//!   [`TreeNode::preprocess`]. Entries are mapped and inflated per open.
//! - **Path**: a loose directory on the host file system.
//! - **Toc**: the legacy single-file-table source. Not implemented; it
//!   never has any path.
//!
//! # Example
//!
//! ```rust,ignore
//! use trevfs_overlay::Overlay;
//!
//! # fn example() -> trevfs_overlay::Result<()> {
//! let mut overlay = Overlay::new();
//! overlay.add_tree("data/patch_00.tre", 10)?;
//! overlay.add_tree("data/bottom.tre", 0)?;
//! overlay.add_path("override", 100);
//!
//! if let Some(bytes) = overlay.open("string/en/city.stf") {
//!     println!("{} bytes", bytes.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]

use std::path::PathBuf;
use thiserror::Error;
use trevfs_formats::TreError;

// Configuration
pub mod config;

// Archive entry reads
pub mod entry;

// Backing sources
pub mod node;

// Priority resolution
pub mod overlay;

pub use config::{OverlayConfig, SourceConfig, SourceKind};
pub use node::{NodeKind, PathNode, SearchNode, TocNode, TreeNode};
pub use overlay::Overlay;
pub use trevfs_formats::DigestStatus;

/// Result type for overlay operations.
pub type Result<T> = std::result::Result<T, OverlayError>;

/// Errors that can occur during overlay operations.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// Container could not be preprocessed.
    #[error("{path}: {source}")]
    Container {
        /// Container file
        path: PathBuf,
        /// Format failure
        #[source]
        source: TreError,
    },

    /// A single entry could not be read.
    #[error("failed to read entry {path}: {reason}")]
    EntryRead {
        /// Logical path of the entry
        path: String,
        /// What went wrong
        reason: String,
    },

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OverlayError {
    /// The format error behind a failed preprocessing step, if any.
    pub fn format_error(&self) -> Option<&TreError> {
        match self {
            Self::Container { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Version information for the overlay crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
