//! Schema loader with base-definition support

use crate::inheritance::{check_cycle, merge_schemas};
use crate::model::Schema;
use crate::nxdl::parse_nxdl;
use crate::source::SchemaSource;
use crate::{Error, Result};
use tracing::{debug, info, trace};

/// Resolves definition names to schemas through an ordered list of sources
pub struct SchemaLoader<'s> {
    sources: Vec<&'s dyn SchemaSource>,
}

impl<'s> SchemaLoader<'s> {
    /// Create a loader that consults `sources` in order
    pub fn new(sources: Vec<&'s dyn SchemaSource>) -> Self {
        Self { sources }
    }

    /// Append a source consulted after the existing ones
    #[must_use]
    pub fn with_source(mut self, source: &'s dyn SchemaSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Fetch the text of a definition from the first source that has it
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no source knows the name.
    pub fn fetch(&self, name: &str) -> Result<String> {
        for (idx, source) in self.sources.iter().enumerate() {
            if let Some(text) = source.retrieve(name) {
                trace!("Source {} supplied definition {}", idx, name);
                return Ok(text);
            }
        }
        Err(Error::NotFound(name.to_string()))
    }

    /// Load and parse one definition without resolving its base
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or [`Error::Parse`].
    pub fn load(&self, name: &str) -> Result<Schema> {
        let text = self.fetch(name)?;
        let schema = parse_nxdl(&text)?;
        if schema.name != name {
            debug!(
                "Definition requested as {} declares name {}",
                name, schema.name
            );
        }
        Ok(schema)
    }

    /// Load a definition and merge its whole base chain into it
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the definition or any base is
    /// missing, [`Error::Parse`] when a document is malformed, and
    /// [`Error::Inheritance`] when the extends chain loops.
    pub fn load_with_inheritance(&self, name: &str) -> Result<Schema> {
        info!("Loading definition with inheritance: {}", name);
        let schema = self.load(name)?;
        let chain = self.resolve_inheritance_chain(schema)?;
        merge_chain(chain).ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Walk the extends chain; returns schemas from most basic to most derived
    fn resolve_inheritance_chain(&self, schema: Schema) -> Result<Vec<Schema>> {
        let mut names = vec![schema.name.clone()];
        let mut next_base = schema.base.clone();
        let mut chain = vec![schema];

        while let Some(base_name) = next_base {
            check_cycle(&names, &base_name)?;

            let base = match self.load(&base_name) {
                Ok(base) => base,
                Err(Error::NotFound(_)) => {
                    return Err(Error::NotFound(format!(
                        "{} (base of {})",
                        base_name,
                        names.last().map_or("", String::as_str)
                    )));
                }
                Err(e) => return Err(e),
            };

            debug!("{} extends {}", names.last().map_or("", String::as_str), base.name);
            names.push(base_name);
            next_base = base.base.clone();
            chain.push(base);
        }

        chain.reverse();
        Ok(chain)
    }
}

/// Fold a base-first chain into one schema named after the most derived one
fn merge_chain(chain: Vec<Schema>) -> Option<Schema> {
    let merged = chain.into_iter().reduce(|base, mut derived| {
        merge_schemas(&base, &mut derived);
        derived
    })?;

    if merged.inheritance_chain.len() > 1 {
        info!(
            "Merged inheritance chain into {}: {}",
            merged.name,
            merged.inheritance_chain.join(" -> ")
        );
    }
    Some(merged)
}
