//! Base-definition merge logic
//!
//! A derived definition is laid over its base node by node. Nodes are
//! matched by kind plus name, or by class for anonymous groups and for the
//! alternatives of a choice. The derived side wins for every property it
//! sets explicitly; nodes present only in the base are inherited unchanged.
//! The result is a fresh tree, so nothing is shared between the base and
//! the merged schema.

use crate::model::{NodeKind, Schema, SchemaNode};
use crate::{Error, Result};

/// Merge a base schema into a derived schema
pub fn merge_schemas(base: &Schema, derived: &mut Schema) {
    merge_nodes(&base.root, &mut derived.root);
    derived.symbols.absorb_declarations(&base.symbols);

    let mut chain = base.inheritance_chain.clone();
    for name in &derived.inheritance_chain {
        if !chain.contains(name) {
            chain.push(name.clone());
        }
    }
    derived.inheritance_chain = chain;
}

/// Merge a base node into the matching derived node
pub fn merge_nodes(base: &SchemaNode, derived: &mut SchemaNode) {
    if derived.type_constraint.is_none() {
        derived.type_constraint.clone_from(&base.type_constraint);
    }
    if derived.occurrence.is_none() {
        derived.occurrence = base.occurrence;
        derived.recommended |= base.recommended;
    }
    if derived.deprecated.is_none() {
        derived.deprecated.clone_from(&base.deprecated);
    }
    if derived.enumeration.is_none() {
        derived.enumeration.clone_from(&base.enumeration);
    }
    if derived.units.is_none() {
        derived.units.clone_from(&base.units);
    }
    if derived.dimensions.is_none() {
        derived.dimensions.clone_from(&base.dimensions);
    }
    if derived.target.is_none() {
        derived.target.clone_from(&base.target);
    }

    let parent = derived.kind;
    for base_child in &base.children {
        let key = child_key(parent, base_child);
        let existing = derived
            .children
            .iter_mut()
            .find(|c| child_key(parent, c) == key);
        match existing {
            Some(derived_child) => merge_nodes(base_child, derived_child),
            None => derived.children.push(base_child.clone()),
        }
    }
}

/// Alternatives of a choice share the choice's name and differ by class
fn child_key(parent: NodeKind, child: &SchemaNode) -> (NodeKind, &str) {
    match parent {
        NodeKind::Choice => (child.kind, child.type_constraint.as_deref().unwrap_or("")),
        _ => child.merge_key(),
    }
}

/// Fail when `next` already appears in the chain of definitions being resolved
///
/// # Errors
///
/// Returns [`Error::Inheritance`] naming the whole cycle.
pub fn check_cycle(chain: &[String], next: &str) -> Result<()> {
    if chain.iter().any(|name| name == next) {
        let mut cycle = chain.join(" -> ");
        cycle.push_str(" -> ");
        cycle.push_str(next);
        return Err(Error::Inheritance(format!(
            "Circular dependency detected: {cycle}"
        )));
    }
    Ok(())
}
