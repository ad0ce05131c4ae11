//! Schema model definitions
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

use crate::symbols::SymbolTable;
use std::fmt;

/// A parsed application definition
#[derive(Debug, Clone)]
pub struct Schema {
    /// Definition name, e.g. `NXmx`
    pub name: String,

    /// Definition category
    pub category: Category,

    /// Name of the definition this one extends
    pub base: Option<String>,

    /// Root group of the definition
    pub root: SchemaNode,

    /// Dimension symbols declared by the definition and bound while matching
    pub symbols: SymbolTable,

    /// Definitions merged into this one, most basic first
    pub inheritance_chain: Vec<String>,
}

/// Category of a definition document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    Application,
    Base,
    Contributed,
}

/// Kinds of schema nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Group,
    Field,
    Attribute,
    Link,
    Choice,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Group => "group",
            NodeKind::Field => "field",
            NodeKind::Attribute => "attribute",
            NodeKind::Link => "link",
            NodeKind::Choice => "choice",
        };
        f.write_str(s)
    }
}

/// Bounds on how many sibling instances of a node may appear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub min: usize,
    /// `None` is unbounded
    pub max: Option<usize>,
}

impl Occurrence {
    pub const EXACTLY_ONE: Occurrence = Occurrence {
        min: 1,
        max: Some(1),
    };

    pub fn new(min: usize, max: Option<usize>) -> Self {
        Self { min, max }
    }

    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    pub fn unbounded(min: usize) -> Self {
        Self { min, max: None }
    }

    pub fn is_required(&self) -> bool {
        self.min > 0
    }

    /// Whether `count` instances exceed the upper bound
    pub fn exceeded_by(&self, count: usize) -> bool {
        self.max.is_some_and(|max| count > max)
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}..unbounded", self.min),
        }
    }
}

/// Size of one axis, or the rank of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimSize {
    Literal(usize),
    Symbol(String),
}

impl DimSize {
    /// Parse a literal size or treat the text as a symbol
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        match text.parse::<usize>() {
            Ok(n) => DimSize::Literal(n),
            Err(_) => DimSize::Symbol(text.to_string()),
        }
    }
}

impl fmt::Display for DimSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimSize::Literal(n) => write!(f, "{n}"),
            DimSize::Symbol(s) => f.write_str(s),
        }
    }
}

/// One declared axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    /// 1-based axis position
    pub index: usize,
    /// `None` leaves the axis size unconstrained
    pub size: Option<DimSize>,
}

/// Declared dimensionality of a field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dimensions {
    pub rank: Option<DimSize>,
    pub dims: Vec<Dimension>,
}

impl Dimensions {
    /// Rank implied by the highest declared axis when no rank is given
    pub fn implied_rank(&self) -> usize {
        self.dims.iter().map(|d| d.index).max().unwrap_or(0)
    }
}

/// A node in the schema tree
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: NodeKind,

    /// Empty means the node matches any name
    pub name: String,

    /// NeXus class for groups, `NX_*` type for fields and attributes
    pub type_constraint: Option<String>,

    /// Explicit occurrence; see [`SchemaNode::occurrence`] for defaults
    pub occurrence: Option<Occurrence>,

    /// Missing instances are reported at the recommended severity
    pub recommended: bool,

    /// Deprecation notice
    pub deprecated: Option<String>,

    pub children: Vec<SchemaNode>,

    /// Permitted literal values
    pub enumeration: Option<Vec<String>>,

    /// Unit category, e.g. `NX_LENGTH`
    pub units: Option<String>,

    pub dimensions: Option<Dimensions>,

    /// Link destination pattern (links only)
    pub target: Option<String>,
}

impl SchemaNode {
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            type_constraint: None,
            occurrence: None,
            recommended: false,
            deprecated: None,
            children: Vec::new(),
            enumeration: None,
            units: None,
            dimensions: None,
            target: None,
        }
    }

    /// Group matching by name, or by class alone when `name` is empty
    pub fn group(name: impl Into<String>, nx_class: impl Into<String>) -> Self {
        Self::new(NodeKind::Group, name).with_type(nx_class)
    }

    pub fn field(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Field, name)
    }

    pub fn attribute(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Attribute, name)
    }

    pub fn link(name: impl Into<String>, target: impl Into<String>) -> Self {
        let mut node = Self::new(NodeKind::Link, name);
        node.target = Some(target.into());
        node
    }

    pub fn choice(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Choice, name)
    }

    pub fn with_type(mut self, type_constraint: impl Into<String>) -> Self {
        self.type_constraint = Some(type_constraint.into());
        self
    }

    pub fn with_occurrence(mut self, occurrence: Occurrence) -> Self {
        self.occurrence = Some(occurrence);
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_enumeration<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enumeration = Some(items.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn with_child(mut self, child: SchemaNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn recommended(mut self) -> Self {
        self.recommended = true;
        self.occurrence = Some(Occurrence::new(0, self.occurrence().max));
        self
    }

    /// Whether the node matches any name
    pub fn is_wildcard(&self) -> bool {
        self.name.is_empty()
    }

    /// Effective occurrence, falling back to the per-kind default
    ///
    /// Named nodes default to exactly one. Anonymous groups must appear at
    /// least once but may repeat; wildcard fields and attributes are
    /// entirely optional.
    pub fn occurrence(&self) -> Occurrence {
        self.occurrence.unwrap_or(match (self.kind, self.is_wildcard()) {
            (_, false) | (NodeKind::Choice | NodeKind::Link, true) => Occurrence::EXACTLY_ONE,
            (NodeKind::Group, true) => Occurrence::unbounded(1),
            (NodeKind::Field | NodeKind::Attribute, true) => Occurrence::unbounded(0),
        })
    }

    /// Identity used when merging a derived definition over its base
    pub fn merge_key(&self) -> (NodeKind, &str) {
        if self.is_wildcard() {
            (self.kind, self.type_constraint.as_deref().unwrap_or(""))
        } else {
            (self.kind, self.name.as_str())
        }
    }

    /// Human-readable label for messages
    pub fn label(&self) -> String {
        match (&self.name, &self.type_constraint) {
            (name, Some(ty)) if name.is_empty() => format!("{} {}", self.kind, ty),
            (name, _) if name.is_empty() => format!("{} *", self.kind),
            (name, _) => format!("{} {}", self.kind, name),
        }
    }

    /// Child attribute rules
    pub fn attributes(&self) -> impl Iterator<Item = &SchemaNode> {
        self.children
            .iter()
            .filter(|c| c.kind == NodeKind::Attribute)
    }

    /// Child rules other than attributes
    pub fn members(&self) -> impl Iterator<Item = &SchemaNode> {
        self.children
            .iter()
            .filter(|c| c.kind != NodeKind::Attribute)
    }

    /// Find a direct child by kind and name
    pub fn find_child(&self, kind: NodeKind, name: &str) -> Option<&SchemaNode> {
        self.children
            .iter()
            .find(|c| c.kind == kind && c.name == name)
    }
}

impl Schema {
    pub fn new(name: impl Into<String>, root: SchemaNode) -> Self {
        Self {
            name: name.into(),
            category: Category::Application,
            base: None,
            root,
            symbols: SymbolTable::new(),
            inheritance_chain: Vec::new(),
        }
    }

    /// Group rule that a data group of class `nx_class` is matched against
    ///
    /// Definitions describe their entry group as a child of the root; when
    /// no child of that class exists the root itself is used.
    pub fn entry_rule(&self, nx_class: Option<&str>) -> &SchemaNode {
        nx_class
            .and_then(|class| {
                self.root.children.iter().find(|c| {
                    c.kind == NodeKind::Group && c.type_constraint.as_deref() == Some(class)
                })
            })
            .unwrap_or(&self.root)
    }
}
