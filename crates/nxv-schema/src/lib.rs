//! # nxv-schema
//!
//! Schema model, NXDL loader, and base-definition merge logic.
//!
//! Definitions are fetched by name from an ordered list of
//! [`SchemaSource`]s, parsed from NXDL into a [`Schema`], and merged with
//! every definition they extend:
//! base definition → derived definition → ... → requested definition

pub mod inheritance;
pub mod loader;
pub mod model;
pub mod nxdl;
pub mod source;
pub mod symbols;

pub use loader::SchemaLoader;
pub use model::{
    Category, DimSize, Dimension, Dimensions, NodeKind, Occurrence, Schema, SchemaNode,
};
pub use nxdl::parse_nxdl;
pub use source::{DirectorySource, InMemorySource, SchemaSource};
pub use symbols::{Binding, SymbolTable};

use thiserror::Error;

/// Errors that can occur when working with schemas
#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema not found: {0}")]
    NotFound(String),

    #[error("Invalid definition {definition}: {message}")]
    Parse { definition: String, message: String },

    #[error("Inheritance error: {0}")]
    Inheritance(String),
}

impl Error {
    /// Build a parse error for the named definition.
    pub fn parse(definition: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            definition: definition.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
