//! Validation engine
//!
//! The engine walks a merged definition and a data tree side by side.
//! Within one group, named rules and choices claim data children first,
//! wildcard rules then claim what is left, and anything still unclaimed
//! is reported as undocumented.

use crate::policy::ValidationPolicy;
use crate::reporter::{Counters, LogRecord, LogSink, Reporter, Severity};
use crate::rules;
use crate::units;
use nxv_schema::{Binding, DimSize, Dimensions, NodeKind, Schema, SchemaNode, SymbolTable};
use nxv_tree::{
    Attribute, DataFile, DataType, NX_CLASS, Node, NodeKind as DataKind, Value, absolute_path,
    join_path, parent_path, split_path,
};
use tracing::{debug, trace};

/// Attributes the data model itself defines
const RESERVED_ATTRIBUTES: &[&str] = &[NX_CLASS, "target", "units"];

/// Main validation engine
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    policy: ValidationPolicy,
}

impl ValidationEngine {
    /// Create a new validation engine with the default policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a specific policy
    pub fn with_policy(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Validate the entry at `entry_path` against a merged definition
    ///
    /// The definition's symbol bindings are cleared first, so each entry
    /// binds dimension symbols afresh. Returns the counts this entry added.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::PathNotFound`] when `entry_path` does not
    /// resolve.
    pub fn validate_entry(
        &self,
        file: &DataFile,
        entry_path: &str,
        schema: &mut Schema,
        reporter: &mut Reporter<'_>,
    ) -> crate::Result<Counters> {
        let node = file
            .resolve(entry_path)
            .map_err(|_| crate::Error::PathNotFound(entry_path.to_string()))?;
        let before = reporter.counters();

        let mut symbols = schema.symbols.clone();
        symbols.reset();
        let rule = schema.entry_rule(node.nx_class());
        let nxdl = if std::ptr::eq(rule, &schema.root) {
            format!("/{}", schema.name)
        } else {
            format!("/{}/{}", schema.name, segment_for(rule))
        };
        debug!("Validating {} against {}", entry_path, nxdl);

        let mut matcher = Matcher {
            file,
            policy: &self.policy,
            symbols: &mut symbols,
            reporter: &mut *reporter,
        };
        matcher.check_group_content(rule, node, entry_path, &nxdl);
        schema.symbols = symbols;

        Ok(reporter.counters().since(before))
    }

    /// Match one data node against one definition node
    ///
    /// Records go to `sink`; the returned counters cover only this call.
    pub fn match_node(
        &self,
        file: &DataFile,
        rule: &SchemaNode,
        node: &Node,
        path: &str,
        symbols: &mut SymbolTable,
        sink: &mut dyn LogSink,
    ) -> Counters {
        let mut reporter = Reporter::new(sink);
        let mut matcher = Matcher {
            file,
            policy: &self.policy,
            symbols,
            reporter: &mut reporter,
        };
        let nxdl = join_path("/", &segment_for(rule));
        if rule.kind == NodeKind::Group && node.kind == DataKind::Group && rule.name.is_empty() {
            matcher.check_group_content(rule, node, path, &nxdl);
        } else {
            matcher.check_member(rule, node, path, &nxdl);
        }
        reporter.counters()
    }
}

/// Segment a definition node contributes to definition paths
fn segment_for(rule: &SchemaNode) -> String {
    if rule.name.is_empty() {
        rule.type_constraint.clone().unwrap_or_else(|| "*".to_string())
    } else {
        rule.name.clone()
    }
}

/// Human-readable kind of a data node
fn describe(node: &Node) -> String {
    match (node.kind, node.nx_class()) {
        (DataKind::Group, Some(class)) => format!("group {} ({class})", node.name),
        (kind, _) => format!("{kind} {}", node.name),
    }
}

/// Matching state for one validation pass
struct Matcher<'a, 's> {
    file: &'a DataFile,
    policy: &'a ValidationPolicy,
    symbols: &'a mut SymbolTable,
    reporter: &'a mut Reporter<'s>,
}

impl Matcher<'_, '_> {
    fn emit(&mut self, record: LogRecord, nxdl: &str) {
        self.reporter.emit(record.with("nxdl", nxdl));
    }

    fn emit_at(&mut self, level: Severity, code: &str, path: &str, nxdl: &str, message: String) {
        self.emit(LogRecord::new(level, code, path, message), nxdl);
    }

    /// Check attributes and children of a group against a group rule
    fn check_group_content(&mut self, rule: &SchemaNode, node: &Node, path: &str, nxdl: &str) {
        trace!("Matching group {} against {}", path, nxdl);
        self.check_attributes(rule, node, path, nxdl);

        let children: Vec<&Node> = self.file.children(node).collect();
        let mut claimed = vec![false; children.len()];

        if self.policy.check_names {
            for child in &children {
                let result = rules::validate_name(&child.name);
                if !result.is_valid {
                    let message = result.message.unwrap_or_default();
                    self.emit_at(
                        Severity::Warning,
                        "INVALID_NAME",
                        &join_path(path, &child.name),
                        nxdl,
                        message,
                    );
                }
            }
        }

        for member in rule
            .members()
            .filter(|m| m.kind == NodeKind::Choice || !m.is_wildcard())
        {
            if member.kind == NodeKind::Choice {
                self.match_choice(member, &children, &mut claimed, path, nxdl);
            } else {
                self.match_named(member, &children, &mut claimed, path, nxdl);
            }
        }

        for member in rule
            .members()
            .filter(|m| m.kind != NodeKind::Choice && m.is_wildcard())
        {
            self.match_wildcard(member, &children, &mut claimed, path, nxdl);
        }

        for (child, taken) in children.iter().zip(&claimed) {
            if !taken {
                let level = self.policy.undocumented;
                self.emit_at(
                    level,
                    "UNDOCUMENTED",
                    &join_path(path, &child.name),
                    nxdl,
                    format!("undocumented {}", describe(child)),
                );
            }
        }
    }

    /// Claim data children named like a rule and check each
    fn match_named(
        &mut self,
        member: &SchemaNode,
        children: &[&Node],
        claimed: &mut [bool],
        path: &str,
        nxdl: &str,
    ) {
        let member_nxdl = join_path(nxdl, &member.name);
        let member_path = join_path(path, &member.name);
        let found: Vec<usize> = (0..children.len())
            .filter(|&i| !claimed[i] && children[i].name == member.name)
            .collect();
        for &i in &found {
            claimed[i] = true;
        }

        self.check_count(member, found.len(), &member_path, &member_nxdl);
        for i in found {
            self.check_member(member, children[i], &member_path, &member_nxdl);
        }
    }

    /// Claim unclaimed data children that fit an anonymous rule
    fn match_wildcard(
        &mut self,
        member: &SchemaNode,
        children: &[&Node],
        claimed: &mut [bool],
        path: &str,
        nxdl: &str,
    ) {
        let member_nxdl = join_path(nxdl, &segment_for(member));
        let found: Vec<usize> = (0..children.len())
            .filter(|&i| !claimed[i] && fits(member, children[i]))
            .collect();
        for &i in &found {
            claimed[i] = true;
        }

        self.check_count(member, found.len(), path, &member_nxdl);
        for i in found {
            let child_path = join_path(path, &children[i].name);
            self.check_member(member, children[i], &child_path, &member_nxdl);
        }
    }

    /// Resolve a choice: each candidate must satisfy exactly one alternative
    fn match_choice(
        &mut self,
        choice: &SchemaNode,
        children: &[&Node],
        claimed: &mut [bool],
        path: &str,
        nxdl: &str,
    ) {
        let choice_nxdl = join_path(nxdl, &choice.name);
        let found: Vec<usize> = (0..children.len())
            .filter(|&i| {
                !claimed[i]
                    && (choice.name.is_empty() || children[i].name == choice.name)
                    && choice.children.iter().any(|alt| kind_fits(alt, children[i]))
            })
            .collect();
        for &i in &found {
            claimed[i] = true;
        }

        let occurrence = choice.occurrence();
        if found.len() < occurrence.min {
            self.emit(
                LogRecord::error(
                    "CHOICE_MISSING",
                    join_path(path, &choice.name),
                    format!("no alternative of choice {} is present", choice.name),
                )
                .with("expected", alternatives(choice)),
                &choice_nxdl,
            );
        }
        if occurrence.exceeded_by(found.len()) {
            self.emit_at(
                Severity::Error,
                "TOO_MANY",
                &join_path(path, &choice.name),
                &choice_nxdl,
                format!(
                    "{} instances of choice {} exceed the allowed {}",
                    found.len(),
                    choice.name,
                    occurrence
                ),
            );
        }

        for i in found {
            let child = children[i];
            let child_path = join_path(path, &child.name);
            let satisfied: Vec<&SchemaNode> = choice
                .children
                .iter()
                .filter(|alt| fits(alt, child) && self.probe(alt, child, &child_path, &choice_nxdl))
                .collect();

            match satisfied.as_slice() {
                [] => self.emit(
                    LogRecord::error(
                        "CHOICE_UNSATISFIED",
                        child_path.as_str(),
                        format!("no choice alternative satisfied for {}", choice.name),
                    )
                    .with("expected", alternatives(choice))
                    .with("found", describe(child)),
                    &choice_nxdl,
                ),
                [only] => {
                    let alt_nxdl = join_path(&choice_nxdl, &segment_for(only));
                    self.check_member(only, child, &child_path, &alt_nxdl);
                }
                [first, ..] => {
                    let level = self.policy.ambiguous_choice;
                    let names: Vec<String> = satisfied.iter().map(|alt| segment_for(alt)).collect();
                    self.emit(
                        LogRecord::new(
                            level,
                            "AMBIGUOUS_CHOICE",
                            child_path.as_str(),
                            format!(
                                "ambiguous choice {}: satisfies {}",
                                choice.name,
                                names.join(" and ")
                            ),
                        ),
                        &choice_nxdl,
                    );
                    let alt_nxdl = join_path(&choice_nxdl, &segment_for(first));
                    self.check_member(first, child, &child_path, &alt_nxdl);
                }
            }
        }
    }

    /// Trial match with records discarded and symbol bindings rolled back
    fn probe(&mut self, rule: &SchemaNode, node: &Node, path: &str, nxdl: &str) -> bool {
        let mut symbols = self.symbols.clone();
        let mut discard = |_: &LogRecord| {};
        let mut reporter = Reporter::new(&mut discard);
        let mut trial = Matcher {
            file: self.file,
            policy: self.policy,
            symbols: &mut symbols,
            reporter: &mut reporter,
        };
        trial.check_member(rule, node, path, nxdl);
        reporter.counters().errors == 0
    }

    /// Report occurrence violations for a rule that matched `count` nodes
    fn check_count(&mut self, member: &SchemaNode, count: usize, path: &str, nxdl: &str) {
        let occurrence = member.occurrence();
        if count < occurrence.min {
            let message = if count == 0 {
                format!("required {} is missing", member.label())
            } else {
                format!(
                    "{} has {count} instances but needs at least {}",
                    member.label(),
                    occurrence.min
                )
            };
            self.emit(
                LogRecord::error("MISSING_REQUIRED", path, message)
                    .with("expected", occurrence.to_string())
                    .with("found", count.to_string()),
                nxdl,
            );
        } else if count == 0 && member.recommended {
            let level = self.policy.missing_recommended;
            self.emit_at(
                level,
                "MISSING_RECOMMENDED",
                path,
                nxdl,
                format!("recommended {} is missing", member.label()),
            );
        }

        if occurrence.exceeded_by(count) {
            self.emit(
                LogRecord::error(
                    "TOO_MANY",
                    path,
                    format!("{count} instances of {} exceed the allowed number", member.label()),
                )
                .with("expected", occurrence.to_string())
                .with("found", count.to_string()),
                nxdl,
            );
        }
    }

    /// Check one claimed data node against the rule that claimed it
    fn check_member(&mut self, member: &SchemaNode, node: &Node, path: &str, nxdl: &str) {
        if let Some(notice) = &member.deprecated {
            self.emit_at(
                Severity::Warning,
                "DEPRECATED",
                path,
                nxdl,
                format!("{} is deprecated: {notice}", member.label()),
            );
        }

        match member.kind {
            NodeKind::Group => {
                if node.kind != DataKind::Group {
                    self.kind_mismatch(member, node, path, nxdl);
                    return;
                }
                if let Some(expected) = &member.type_constraint {
                    let found = node.nx_class().unwrap_or("");
                    if found != expected {
                        self.emit(
                            LogRecord::error(
                                "GROUP_TYPE_MISMATCH",
                                path,
                                format!("group {} has class {found}, expected {expected}", node.name),
                            )
                            .with("expected", expected.as_str())
                            .with("found", found),
                            nxdl,
                        );
                    }
                }
                self.check_group_content(member, node, path, nxdl);
            }
            NodeKind::Field => {
                if node.kind == DataKind::Group {
                    self.kind_mismatch(member, node, path, nxdl);
                    return;
                }
                let target = if node.kind == DataKind::Link {
                    match self.file.resolve_link(node, path) {
                        Ok(target) => target,
                        Err(_) => {
                            self.dangling(node, path, nxdl);
                            return;
                        }
                    }
                } else {
                    node
                };
                if target.kind == DataKind::Group {
                    self.kind_mismatch(member, target, path, nxdl);
                    return;
                }
                self.check_field(member, target, path, nxdl);
            }
            NodeKind::Link => self.check_link(member, node, path, nxdl),
            NodeKind::Attribute | NodeKind::Choice => {
                trace!("{} cannot claim data node {}", member.label(), path);
            }
        }
    }

    fn kind_mismatch(&mut self, member: &SchemaNode, node: &Node, path: &str, nxdl: &str) {
        self.emit(
            LogRecord::error(
                "KIND_MISMATCH",
                path,
                format!("expected {}, found {}", member.label(), describe(node)),
            )
            .with("expected", member.kind.to_string())
            .with("found", node.kind.to_string()),
            nxdl,
        );
    }

    fn dangling(&mut self, node: &Node, path: &str, nxdl: &str) {
        let target = node.link_target().unwrap_or("");
        self.emit(
            LogRecord::error(
                "DANGLING_LINK",
                path,
                format!("dangling link: target {target} does not exist"),
            )
            .with("found", target),
            nxdl,
        );
    }

    /// Value-level checks shared by fields and attributes
    fn check_leaf(
        &mut self,
        member: &SchemaNode,
        dtype: Option<DataType>,
        value: Option<&Value>,
        shape: &[usize],
        path: &str,
        nxdl: &str,
    ) {
        if let Some(constraint) = &member.type_constraint {
            if !rules::KNOWN_TYPES.contains(&constraint.as_str()) {
                self.emit_at(
                    Severity::Info,
                    "UNKNOWN_TYPE",
                    path,
                    nxdl,
                    format!("type {constraint} is not checked"),
                );
            } else if let Some(dtype) = dtype {
                let result = rules::validate_type(constraint, dtype);
                if result.is_valid {
                    if let Some(value) = value {
                        let result = rules::validate_value(constraint, value);
                        if !result.is_valid {
                            self.emit(
                                LogRecord::error(
                                    "INVALID_VALUE",
                                    path,
                                    result.message.unwrap_or_default(),
                                )
                                .with("expected", constraint.as_str()),
                                nxdl,
                            );
                        }
                    }
                } else {
                    self.emit(
                        LogRecord::error("TYPE_MISMATCH", path, result.message.unwrap_or_default())
                            .with("expected", constraint.as_str())
                            .with("found", dtype.as_str()),
                        nxdl,
                    );
                }
            }
        }

        if let Some(dimensions) = &member.dimensions {
            self.check_dimensions(dimensions, shape, path, nxdl);
        }

        if let (Some(items), Some(value)) = (&member.enumeration, value) {
            let result = rules::validate_enumeration(value, items);
            if !result.is_valid {
                self.emit(
                    LogRecord::error("NOT_IN_ENUMERATION", path, result.message.unwrap_or_default())
                        .with("expected", items.join(", "))
                        .with("found", value.as_literal().unwrap_or_default()),
                    nxdl,
                );
            }
        }
    }

    fn check_field(&mut self, member: &SchemaNode, node: &Node, path: &str, nxdl: &str) {
        let shape = node.data_shape();
        self.check_leaf(
            member,
            node.data_type(),
            node.value.as_ref(),
            &shape,
            path,
            nxdl,
        );

        if let Some(category) = &member.units {
            self.check_units(category, node, path, nxdl);
        }

        self.check_attributes(member, node, path, nxdl);

        if member.name == "depends_on" {
            self.check_depends_on(node, path, nxdl);
        }
    }

    /// Check a shape against rank and per-axis sizes, binding symbols
    fn check_dimensions(&mut self, dimensions: &Dimensions, shape: &[usize], path: &str, nxdl: &str) {
        let expected_rank = match &dimensions.rank {
            Some(DimSize::Literal(rank)) => Some(*rank),
            Some(DimSize::Symbol(symbol)) => {
                self.bind_symbol(symbol, shape.len(), "rank", path, nxdl);
                None
            }
            None if dimensions.dims.is_empty() => None,
            None => Some(dimensions.implied_rank()),
        };

        // Scalars stand in for one-element vectors
        let scalar_as_vector = [1];
        let shape = if shape.is_empty() && expected_rank == Some(1) {
            &scalar_as_vector[..]
        } else {
            shape
        };

        if let Some(rank) = expected_rank {
            if rank != shape.len() {
                self.emit(
                    LogRecord::error(
                        "RANK_MISMATCH",
                        path,
                        format!("rank {} does not match expected rank {rank}", shape.len()),
                    )
                    .with("expected", rank.to_string())
                    .with("found", shape.len().to_string()),
                    nxdl,
                );
                return;
            }
        }

        for dim in &dimensions.dims {
            let Some(size) = &dim.size else {
                continue;
            };
            let Some(&actual) = dim.index.checked_sub(1).and_then(|axis| shape.get(axis)) else {
                self.emit_at(
                    Severity::Error,
                    "RANK_MISMATCH",
                    path,
                    nxdl,
                    format!("axis {} is missing from shape {shape:?}", dim.index),
                );
                continue;
            };
            match size {
                DimSize::Literal(expected) => {
                    if actual != *expected {
                        self.emit(
                            LogRecord::error(
                                "DIMENSION_MISMATCH",
                                path,
                                format!("axis {} has length {actual}, expected {expected}", dim.index),
                            )
                            .with("expected", expected.to_string())
                            .with("found", actual.to_string()),
                            nxdl,
                        );
                    }
                }
                DimSize::Symbol(symbol) => {
                    let what = format!("axis {}", dim.index);
                    self.bind_symbol(symbol, actual, &what, path, nxdl);
                }
            }
        }
    }

    fn bind_symbol(&mut self, symbol: &str, size: usize, what: &str, path: &str, nxdl: &str) {
        match self.symbols.bind(symbol, size) {
            Binding::New => trace!("Bound symbol {} = {} at {}", symbol, size, path),
            Binding::Agrees => {}
            Binding::Conflict { bound } => self.emit(
                LogRecord::error(
                    "DIMENSION_SYMBOL_MISMATCH",
                    path,
                    format!("dimension symbol mismatch: {symbol} is {bound} but {what} has {size}"),
                )
                .with("expected", bound.to_string())
                .with("found", size.to_string())
                .with("symbol", symbol),
                nxdl,
            ),
        }
    }

    fn check_units(&mut self, category: &str, node: &Node, path: &str, nxdl: &str) {
        match node.units() {
            None => {
                let level = self.policy.missing_units;
                self.emit(
                    LogRecord::new(
                        level,
                        "MISSING_UNITS",
                        path,
                        format!("field {} should have units of {category}", node.name),
                    )
                    .with("expected", category),
                    nxdl,
                );
            }
            Some(found) => match units::accepts(category, found) {
                Some(true) => {}
                Some(false) => self.emit(
                    LogRecord::error(
                        "UNITS_MISMATCH",
                        path,
                        format!("units '{found}' are not {category}"),
                    )
                    .with("expected", category)
                    .with("found", found),
                    nxdl,
                ),
                None => trace!("Units category {} is not checked", category),
            },
        }
    }

    /// Check a link rule: the node must point at an existing node
    fn check_link(&mut self, member: &SchemaNode, node: &Node, path: &str, nxdl: &str) {
        let Some(target) = node.link_target() else {
            self.emit(
                LogRecord::error(
                    "NOT_A_LINK",
                    path,
                    format!("expected a link, found {}", describe(node)),
                )
                .with("expected", "link")
                .with("found", node.kind.to_string()),
                nxdl,
            );
            return;
        };

        let Ok(chain) = self.file.walk(target) else {
            self.dangling(node, path, nxdl);
            return;
        };

        if let Some(pattern) = &member.target {
            if !target_matches(pattern, &chain) {
                self.emit(
                    LogRecord::warning(
                        "LINK_TARGET_MISMATCH",
                        path,
                        format!("link target {target} does not match {pattern}"),
                    )
                    .with("expected", pattern.as_str())
                    .with("found", target),
                    nxdl,
                );
            }
        }
    }

    /// Follow a `depends_on` chain until it reaches `.`
    fn check_depends_on(&mut self, node: &Node, path: &str, nxdl: &str) {
        let Some(mut next) = node.value.as_ref().and_then(Value::as_text).map(str::to_string) else {
            return;
        };
        let mut base = parent_path(path).to_string();
        let mut visited: Vec<String> = Vec::new();

        while next != "." && !next.is_empty() {
            let target = absolute_path(&base, &next);
            if visited.contains(&target) {
                self.emit(
                    LogRecord::error(
                        "DEPENDS_ON_CYCLE",
                        path,
                        format!("depends_on chain loops back to {target}"),
                    )
                    .with("found", target),
                    nxdl,
                );
                return;
            }
            let Ok(step) = self.file.resolve(&target) else {
                self.emit(
                    LogRecord::error(
                        "DEPENDS_ON_UNRESOLVED",
                        path,
                        format!("depends_on target {target} does not exist"),
                    )
                    .with("found", target),
                    nxdl,
                );
                return;
            };
            match step.attribute_text("depends_on") {
                Some(following) => next = following.to_string(),
                None => return,
            }
            base = parent_path(&target).to_string();
            visited.push(target);
        }
    }

    /// Check a node's attributes against the attribute rules of `rule`
    fn check_attributes(&mut self, rule: &SchemaNode, node: &Node, path: &str, nxdl: &str) {
        let attributes: Vec<&Attribute> = self.file.attributes(node).collect();
        let mut claimed = vec![false; attributes.len()];

        let (wildcards, named): (Vec<&SchemaNode>, Vec<&SchemaNode>) =
            rule.attributes().partition(|a| a.is_wildcard());

        for attr_rule in named {
            let attr_path = format!("{path}@{}", attr_rule.name);
            let attr_nxdl = format!("{nxdl}@{}", attr_rule.name);
            let found: Vec<usize> = (0..attributes.len())
                .filter(|&i| !claimed[i] && attributes[i].name == attr_rule.name)
                .collect();
            for &i in &found {
                claimed[i] = true;
            }
            self.check_count(attr_rule, found.len(), &attr_path, &attr_nxdl);
            for i in found {
                self.check_attribute(attr_rule, attributes[i], &attr_path, &attr_nxdl);
            }
        }

        for attr_rule in wildcards {
            let attr_nxdl = format!("{nxdl}@*");
            let found: Vec<usize> = (0..attributes.len())
                .filter(|&i| !claimed[i] && !RESERVED_ATTRIBUTES.contains(&attributes[i].name.as_str()))
                .collect();
            for &i in &found {
                claimed[i] = true;
            }
            self.check_count(attr_rule, found.len(), &format!("{path}@*"), &attr_nxdl);
            for i in found {
                let attr_path = format!("{path}@{}", attributes[i].name);
                self.check_attribute(attr_rule, attributes[i], &attr_path, &attr_nxdl);
            }
        }

        if !self.policy.report_undocumented_attributes {
            return;
        }
        for (attribute, taken) in attributes.iter().zip(&claimed) {
            if !taken && !RESERVED_ATTRIBUTES.contains(&attribute.name.as_str()) {
                let level = self.policy.undocumented;
                self.emit_at(
                    level,
                    "UNDOCUMENTED",
                    &format!("{path}@{}", attribute.name),
                    nxdl,
                    format!("undocumented attribute {}", attribute.name),
                );
            }
        }
    }

    fn check_attribute(&mut self, rule: &SchemaNode, attribute: &Attribute, path: &str, nxdl: &str) {
        if let Some(notice) = &rule.deprecated {
            self.emit_at(
                Severity::Warning,
                "DEPRECATED",
                path,
                nxdl,
                format!("{} is deprecated: {notice}", rule.label()),
            );
        }
        let shape = attribute.value.shape();
        self.check_leaf(
            rule,
            attribute.data_type(),
            Some(&attribute.value),
            &shape,
            path,
            nxdl,
        );
    }
}

/// Whether a data node is the right kind for a rule
fn kind_fits(rule: &SchemaNode, node: &Node) -> bool {
    match rule.kind {
        NodeKind::Group => node.kind == DataKind::Group,
        NodeKind::Field => node.kind != DataKind::Group,
        NodeKind::Link => node.kind == DataKind::Link || node.link_target().is_some(),
        NodeKind::Attribute | NodeKind::Choice => false,
    }
}

/// Whether an unclaimed data node falls under an anonymous rule
fn fits(rule: &SchemaNode, node: &Node) -> bool {
    if !kind_fits(rule, node) {
        return false;
    }
    match (rule.kind, &rule.type_constraint) {
        (NodeKind::Group, Some(class)) => node.nx_class() == Some(class.as_str()),
        _ => true,
    }
}

fn alternatives(choice: &SchemaNode) -> String {
    choice
        .children
        .iter()
        .map(segment_for)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Compare the nodes along a link target with a definition target path
///
/// Each segment of the definition path names either the node or its class.
fn target_matches(pattern: &str, chain: &[&Node]) -> bool {
    let Ok(segments) = split_path(pattern) else {
        return false;
    };
    segments.len() == chain.len()
        && segments
            .iter()
            .zip(chain)
            .all(|(segment, node)| node.name == *segment || node.nx_class() == Some(*segment))
}
