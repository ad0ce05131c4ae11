//! Opened data file and the read-only accessor surface over it
#![allow(clippy::must_use_candidate)]

use crate::node::{Attribute, Node};
use crate::traversal::{Cursor, absolute_path};
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// An opened data file
#[derive(Debug, Clone)]
pub struct DataFile {
    /// Where the file was read from
    path: PathBuf,

    /// Root group of the file
    root: Node,
}

impl DataFile {
    /// Wrap an already-built tree
    pub fn new(path: impl Into<PathBuf>, root: Node) -> Self {
        Self {
            path: path.into(),
            root,
        }
    }

    /// Wrap a tree that has no backing file
    pub fn in_memory(root: Node) -> Self {
        Self::new("<memory>", root)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Root group of the file
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Children of a node
    pub fn children<'a>(&self, node: &'a Node) -> impl Iterator<Item = &'a Node> {
        node.children.iter()
    }

    /// Attributes of a node
    pub fn attributes<'a>(&self, node: &'a Node) -> impl Iterator<Item = &'a Attribute> {
        node.attributes.iter()
    }

    /// Resolve an absolute path to a node
    pub fn resolve(&self, path: &str) -> Result<&Node> {
        Ok(self.cursor(path)?.node())
    }

    /// Nodes along an absolute path, root excluded
    pub fn walk(&self, path: &str) -> Result<Vec<&Node>> {
        let cursor = self.cursor(path)?;
        Ok(cursor.trail()[1..].to_vec())
    }

    /// Cursor positioned at an absolute path
    pub fn cursor(&self, path: &str) -> Result<Cursor<'_>> {
        Cursor::new(&self.root).navigate(path)
    }

    /// Follow a link node to its destination
    ///
    /// Nodes without a link target resolve to themselves. A `target`
    /// attribute naming the node's own path marks the original of a hard
    /// link and also resolves to the node itself.
    pub fn resolve_link<'a>(&'a self, node: &'a Node, own_path: &str) -> Result<&'a Node> {
        match node.link_target() {
            Some(target) if target != own_path => self
                .resolve(target)
                .map_err(|_| Error::node_not_found(target)),
            _ => Ok(node),
        }
    }

    /// Resolve a path that is either absolute or relative to `base`
    pub fn resolve_from(&self, base: &str, path: &str) -> Result<&Node> {
        self.resolve(&absolute_path(base, path))
    }
}
