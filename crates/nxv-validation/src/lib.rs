#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # nxv-validation
//!
//! Validation engine that matches NeXus data trees against application
//! definitions.
//!
//! A [`ValidationContext`] ties together where definitions come from, how
//! data files are opened, and where log records go. Each run produces a
//! stream of [`LogRecord`]s and an [`Outcome`].
//!
//! ## Example Usage
//!
//! ```rust
//! use nxv_schema::InMemorySource;
//! use nxv_tree::{DataFile, Node};
//! use nxv_validation::{CollectingSink, Outcome, Target, ValidationContext};
//!
//! let definition = r#"<definition name="NXexample">
//!   <group type="NXentry"><field name="title"/></group>
//! </definition>"#;
//!
//! let sink = CollectingSink::new();
//! let mut ctx = ValidationContext::new("definitions");
//! ctx.set_retriever(InMemorySource::new().with("NXexample", definition));
//! ctx.set_logger(sink.clone());
//!
//! let file = DataFile::in_memory(
//!     Node::group("", "").with_child(
//!         Node::group("entry", "NXentry")
//!             .with_child(Node::field("definition", "NXexample"))
//!             .with_child(Node::field("title", "first light")),
//!     ),
//! );
//!
//! let outcome = ctx.validate_file(&file, &Target::default());
//! assert_eq!(outcome, Outcome::Valid);
//! assert_eq!(ctx.counters().errors, 0);
//! ```

pub mod context;
pub mod engine;
pub mod policy;
pub mod reporter;
pub mod rules;
pub mod units;

pub use context::{Outcome, Target, ValidationContext};
pub use engine::ValidationEngine;
pub use policy::ValidationPolicy;
pub use reporter::{
    CollectingSink, Counters, LogRecord, LogSink, Reporter, Severity, StreamSink, TracingSink,
};
pub use rules::{
    RuleResult, is_iso8601, type_accepts, validate_enumeration, validate_name, validate_type,
    validate_value,
};

use thiserror::Error;

/// Conditions that stop a validation run
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] nxv_schema::Error),

    #[error("Start path not found: {0}")]
    PathNotFound(String),

    #[error(transparent)]
    Open(nxv_tree::Error),

    #[error("No application definition named for {0}")]
    NoDefinition(String),
}

impl Error {
    /// Code carried by the log record reporting this error
    pub fn code(&self) -> &'static str {
        match self {
            Error::Schema(nxv_schema::Error::NotFound(_)) => "SCHEMA_NOT_FOUND",
            Error::Schema(nxv_schema::Error::Parse { .. }) => "SCHEMA_INVALID",
            Error::Schema(nxv_schema::Error::Inheritance(_)) => "INHERITANCE_CYCLE",
            Error::PathNotFound(_) => "PATH_NOT_FOUND",
            Error::Open(_) => "FILE_UNREADABLE",
            Error::NoDefinition(_) => "NO_DEFINITION",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
