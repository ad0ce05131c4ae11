//! Schema sources: where definition text comes from

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

/// File suffix of NXDL documents
pub const NXDL_SUFFIX: &str = ".nxdl.xml";

/// Subdirectories of the NeXus definitions layout searched after the root
const LAYOUT_DIRS: [&str; 3] = ["applications", "base_classes", "contributed_definitions"];

/// Supplies the text of a definition by name
pub trait SchemaSource {
    /// Text of the named definition, or `None` when this source does not have it
    fn retrieve(&self, name: &str) -> Option<String>;
}

impl<F> SchemaSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn retrieve(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Looks for `<name>.nxdl.xml` in a directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate file paths for a definition, in search order
    #[must_use]
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let file_name = format!("{name}{NXDL_SUFFIX}");
        std::iter::once(self.root.join(&file_name))
            .chain(LAYOUT_DIRS.iter().map(|dir| self.root.join(dir).join(&file_name)))
            .collect()
    }
}

impl SchemaSource for DirectorySource {
    fn retrieve(&self, name: &str) -> Option<String> {
        for path in self.candidates(name) {
            if !path.is_file() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    trace!("Found definition file: {:?}", path);
                    return Some(text);
                }
                Err(e) => warn!("Cannot read definition file {:?}: {}", path, e),
            }
        }
        None
    }
}

/// Definitions held in memory, keyed by name
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    definitions: HashMap<String, String>,
}

impl InMemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a definition
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.definitions.insert(name.into(), text.into());
    }
}

impl SchemaSource for InMemorySource {
    fn retrieve(&self, name: &str) -> Option<String> {
        self.definitions.get(name).cloned()
    }
}
