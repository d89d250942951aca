//! Backing sources consulted by the overlay.
//!
//! Every source kind answers the same two questions, `exists` and `open`.
//! [`SearchNode`] is the tagged set of kinds the overlay dispatches over:
//! - [`PathNode`]: loose files under a host directory
//! - [`TocNode`]: legacy single-file-table source, not implemented
//! - [`TreeNode`]: a preprocessed TRE container

use crate::Result;
use std::fmt;
use std::path::Path;
use tracing::warn;

pub mod path;
pub mod toc;
pub mod tree;

pub use path::PathNode;
pub use toc::TocNode;
pub use tree::TreeNode;

/// Kind of backing source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Loose directory
    Path,
    /// Legacy single-file table
    Toc,
    /// TRE container
    Tree,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Toc => write!(f, "toc"),
            Self::Tree => write!(f, "tree"),
        }
    }
}

/// One backing source with its priority.
#[derive(Debug)]
pub enum SearchNode {
    /// Loose directory
    Path(PathNode),
    /// Legacy single-file table
    Toc(TocNode),
    /// TRE container
    Tree(TreeNode),
}

impl SearchNode {
    /// Resolution priority; higher values are consulted first.
    pub fn priority(&self) -> i32 {
        match self {
            Self::Path(n) => n.priority(),
            Self::Toc(n) => n.priority(),
            Self::Tree(n) => n.priority(),
        }
    }

    /// Source kind.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Path(_) => NodeKind::Path,
            Self::Toc(_) => NodeKind::Toc,
            Self::Tree(_) => NodeKind::Tree,
        }
    }

    /// Directory or container file backing this node.
    pub fn source_path(&self) -> &Path {
        match self {
            Self::Path(n) => n.root(),
            Self::Toc(n) => n.file_path(),
            Self::Tree(n) => n.file_path(),
        }
    }

    /// Whether this node has `path`.
    pub fn exists(&self, path: &str) -> bool {
        match self {
            Self::Path(n) => n.exists(path),
            Self::Toc(n) => n.exists(path),
            Self::Tree(n) => n.exists(path),
        }
    }

    /// Read `path`, distinguishing "absent" (`Ok(None)`) from "unreadable".
    pub fn try_open(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match self {
            Self::Path(n) => n.try_open(path),
            Self::Toc(n) => Ok(n.open(path)),
            Self::Tree(n) => n.try_open(path),
        }
    }

    /// Read `path`; read failures are logged and reported as absent.
    pub fn open(&self, path: &str) -> Option<Vec<u8>> {
        match self.try_open(path) {
            Ok(data) => data,
            Err(e) => {
                warn!(
                    "{} node {} failed to open {path}: {e}",
                    self.kind(),
                    self.source_path().display()
                );
                None
            }
        }
    }
}

impl From<PathNode> for SearchNode {
    fn from(node: PathNode) -> Self {
        Self::Path(node)
    }
}

impl From<TocNode> for SearchNode {
    fn from(node: TocNode) -> Self {
        Self::Toc(node)
    }
}

impl From<TreeNode> for SearchNode {
    fn from(node: TreeNode) -> Self {
        Self::Tree(node)
    }
}
