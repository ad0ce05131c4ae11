//! Severity policy for findings whose severity is configurable

use crate::reporter::Severity;
use serde::{Deserialize, Serialize};

/// Validation policy
///
/// Every field has a default, so a partial configuration document only
/// needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Severity when a data node satisfies more than one choice alternative
    pub ambiguous_choice: Severity,

    /// Severity when a field whose definition declares units has none
    pub missing_units: Severity,

    /// Severity when a recommended node is absent
    pub missing_recommended: Severity,

    /// Severity for data nodes the definition does not describe
    pub undocumented: Severity,

    /// Also report undocumented attributes
    pub report_undocumented_attributes: bool,

    /// Check data node names against the NeXus naming rule
    pub check_names: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            ambiguous_choice: Severity::Warning,
            missing_units: Severity::Warning,
            missing_recommended: Severity::Warning,
            undocumented: Severity::Warning,
            report_undocumented_attributes: true,
            check_names: true,
        }
    }
}

impl ValidationPolicy {
    /// Policy that treats every configurable finding as an error
    pub fn strict() -> Self {
        Self {
            ambiguous_choice: Severity::Error,
            missing_units: Severity::Error,
            missing_recommended: Severity::Error,
            undocumented: Severity::Error,
            ..Self::default()
        }
    }
}
