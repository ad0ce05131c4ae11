//! Dimension symbol table
//!
//! Symbols bind to an axis size the first time they are seen during one
//! validation run; every later sighting must agree with that binding.

use std::collections::{BTreeMap, BTreeSet};

/// Outcome of offering a size for a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// First sighting; the symbol is now bound
    New,
    /// Size agrees with the existing binding
    Agrees,
    /// Size disagrees with the existing binding
    Conflict { bound: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    declared: BTreeSet<String>,
    bound: BTreeMap<String, usize>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a symbol declared by the definition
    pub fn declare(&mut self, symbol: impl Into<String>) {
        self.declared.insert(symbol.into());
    }

    #[must_use]
    pub fn is_declared(&self, symbol: &str) -> bool {
        self.declared.contains(symbol)
    }

    pub fn declared(&self) -> impl Iterator<Item = &str> {
        self.declared.iter().map(String::as_str)
    }

    /// Bind `symbol` to `size`, or check it against an earlier binding
    pub fn bind(&mut self, symbol: &str, size: usize) -> Binding {
        match self.bound.get(symbol) {
            Some(&bound) if bound == size => Binding::Agrees,
            Some(&bound) => Binding::Conflict { bound },
            None => {
                self.bound.insert(symbol.to_string(), size);
                Binding::New
            }
        }
    }

    #[must_use]
    pub fn value(&self, symbol: &str) -> Option<usize> {
        self.bound.get(symbol).copied()
    }

    /// Drop all bindings, keeping declarations
    pub fn reset(&mut self) {
        self.bound.clear();
    }

    /// Add the declarations of another table
    pub fn absorb_declarations(&mut self, other: &SymbolTable) {
        self.declared.extend(other.declared.iter().cloned());
    }
}
