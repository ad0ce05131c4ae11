#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # nxv-tree
//!
//! Read-only data tree model and traversal APIs for NeXus data files.
//!
//! The validator never touches a file format directly. A [`FileBackend`]
//! opens a file into a [`DataFile`], whose tree of [`Node`]s exposes groups,
//! fields, links, attributes, declared types and shapes.

/// File backends that open data files into trees.
pub mod backend;
/// Opened data file and path resolution.
pub mod file;
/// Core tree node model.
pub mod node;
/// Cursor-based navigation and path helpers.
pub mod traversal;

pub use backend::{FileBackend, JsonBackend};
pub use file::DataFile;
pub use node::{Attribute, DataType, NX_CLASS, Node, NodeKind, Value};
pub use traversal::{Cursor, absolute_path, join_path, parent_path, split_path};

use thiserror::Error;

/// Errors that can occur when working with data trees
#[derive(Error, Debug)]
pub enum Error {
    #[error("Node not found at path: {path}")]
    NodeNotFound { path: String },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Cannot open data file {path}: {message}")]
    Open { path: String, message: String },
}

impl Error {
    /// Build a node-not-found error with path context.
    pub fn node_not_found(path: impl Into<String>) -> Self {
        Self::NodeNotFound { path: path.into() }
    }

    /// Build an invalid-path error with input path and parsing reason.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Crate-local result type for tree operations.
pub type Result<T> = std::result::Result<T, Error>;
