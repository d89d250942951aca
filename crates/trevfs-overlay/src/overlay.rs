//! Priority resolution over search nodes.
//!
//! Nodes are kept ordered by descending priority; nodes with equal priority
//! keep their registration order. A lookup walks that order and stops at the
//! first node whose `exists` is true. That node's answer is final: if its
//! read fails the lookup fails, it does not fall through to lower nodes.

use crate::config::{OverlayConfig, SourceKind};
use crate::node::{PathNode, SearchNode, TocNode, TreeNode};
use crate::Result;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Read-only overlay of search nodes.
#[derive(Debug, Default)]
pub struct Overlay {
    nodes: Vec<SearchNode>,
}

impl Overlay {
    /// Create an empty overlay.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Build an overlay from configuration.
    ///
    /// Containers that fail to preprocess abort the build, unless
    /// `skip_invalid` is set, in which case they are logged and left out.
    pub fn from_config(config: &OverlayConfig) -> Result<Self> {
        let mut overlay = Self::new();

        for source in &config.sources {
            match source.kind {
                SourceKind::Directory => overlay.add_path(&source.path, source.priority),
                SourceKind::Toc => overlay.add_toc(&source.path, source.priority),
                SourceKind::Tree => {
                    match TreeNode::preprocess(&source.path, source.priority) {
                        Ok(node) => {
                            overlay.add_node(node.with_digest_verification(config.verify_digests));
                        }
                        Err(e) if config.skip_invalid => {
                            warn!("Skipping container: {e}");
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        Ok(overlay)
    }

    /// Register a node in priority order.
    pub fn add_node(&mut self, node: impl Into<SearchNode>) {
        let node = node.into();
        let priority = node.priority();
        let index = self.nodes.partition_point(|n| n.priority() >= priority);

        debug!(
            "Adding {} node {} at priority {priority}",
            node.kind(),
            node.source_path().display()
        );
        self.nodes.insert(index, node);
    }

    /// Preprocess and register the container at `path`.
    ///
    /// On failure nothing is registered.
    pub fn add_tree(&mut self, path: impl AsRef<Path>, priority: i32) -> Result<()> {
        let node = TreeNode::preprocess(path, priority)?;
        self.add_node(node);
        Ok(())
    }

    /// Register a loose directory.
    pub fn add_path(&mut self, root: impl AsRef<Path>, priority: i32) {
        self.add_node(PathNode::new(root, priority));
    }

    /// Register a legacy file table placeholder.
    pub fn add_toc(&mut self, path: impl AsRef<Path>, priority: i32) {
        self.add_node(TocNode::new(path, priority));
    }

    /// Nodes in resolution order.
    pub fn nodes(&self) -> &[SearchNode] {
        &self.nodes
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no nodes are registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node that serves `path`.
    pub fn resolve(&self, path: &str) -> Option<&SearchNode> {
        self.nodes.iter().find(|n| n.exists(path))
    }

    /// Whether any node has `path`.
    pub fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_some()
    }

    /// Read `path` from the node that serves it.
    ///
    /// `Ok(None)` when no node has the path; `Err` when the serving node
    /// failed to read it.
    pub fn try_open(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match self.resolve(path) {
            Some(node) => node.try_open(path),
            None => Ok(None),
        }
    }

    /// Read `path`; an unreadable entry looks the same as a missing one.
    pub fn open(&self, path: &str) -> Option<Vec<u8>> {
        self.resolve(path).and_then(|node| node.open(path))
    }

    /// Union of the entries of every container.
    pub fn list_entries(&self) -> HashSet<String> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                SearchNode::Tree(tree) => Some(tree.list_entries()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}
