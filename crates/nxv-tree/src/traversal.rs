//! Cursor and path APIs for navigating the data tree

use crate::node::Node;
use crate::{Error, Result};

/// A cursor for navigating the data tree
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    /// Current node
    node: &'a Node,

    /// Nodes from the cursor origin down to the current node
    trail: Vec<&'a Node>,

    /// Names leading to the current node (for error reporting)
    path: Vec<String>,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor at the file root
    pub fn new(node: &'a Node) -> Self {
        Self {
            node,
            trail: vec![node],
            path: Vec::new(),
        }
    }

    /// Get the current node
    pub fn node(&self) -> &'a Node {
        self.node
    }

    /// Nodes visited from the origin to the current node, origin first
    pub fn trail(&self) -> &[&'a Node] {
        &self.trail
    }

    /// Absolute path of the current node
    pub fn path(&self) -> String {
        if self.path.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", self.path.join("/"))
        }
    }

    /// Navigate to a child node by name
    pub fn child(&self, name: &str) -> Result<Cursor<'a>> {
        let child = self
            .node
            .find_child(name)
            .ok_or_else(|| Error::node_not_found(join_path(&self.path(), name)))?;
        let mut trail = self.trail.clone();
        trail.push(child);
        let mut path = self.path.clone();
        path.push(name.to_string());
        Ok(Cursor {
            node: child,
            trail,
            path,
        })
    }

    /// Navigate using a `/`-separated path relative to the current node
    pub fn navigate(&self, path: &str) -> Result<Cursor<'a>> {
        let mut cursor = self.clone();
        for segment in split_path(path)? {
            cursor = cursor.child(segment)?;
        }
        Ok(cursor)
    }
}

/// Split a data path into its name segments
///
/// Empty and `.` segments are skipped, so `/entry//data` and `entry/./data`
/// both yield `["entry", "data"]`. Parent references are rejected.
pub fn split_path(path: &str) -> Result<Vec<&str>> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(Error::invalid_path(path, "parent references are not supported")),
            name => segments.push(name),
        }
    }
    Ok(segments)
}

/// Append a child name to a parent path
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() || parent == "/" {
        format!("/{name}")
    } else {
        format!("{}/{}", parent.trim_end_matches('/'), name)
    }
}

/// Absolute form of `path`, which may be relative to `base`
pub fn absolute_path(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        return path.to_string();
    }
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .fold(base.to_string(), |acc, segment| join_path(&acc, segment))
}

/// Parent portion of an absolute path
pub fn parent_path(path: &str) -> &str {
    match path.trim_end_matches('/').rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}
