//! NXDL document parser
//!
//! Builds a [`Schema`] from the element tree of an NXDL document. Elements
//! are matched by local name so both namespaced and plain documents load.
//! Anything the validator does not understand is rejected rather than
//! silently skipped.

use crate::model::{
    Category, DimSize, Dimension, Dimensions, NodeKind, Occurrence, Schema, SchemaNode,
};
use crate::symbols::SymbolTable;
use crate::{Error, Result};
use roxmltree::{Document, Node};
use tracing::trace;

/// Root class every definition ultimately extends
pub const ROOT_CLASS: &str = "NXobject";

/// Parse NXDL text into a schema without resolving its base definition
///
/// # Errors
///
/// Returns [`Error::Parse`] when the text is not well-formed XML, the root
/// element is not `definition`, or an element or attribute is malformed.
pub fn parse_nxdl(text: &str) -> Result<Schema> {
    let doc = Document::parse(text).map_err(|e| Error::parse("<unknown>", e.to_string()))?;
    let root = doc.root_element();

    if root.tag_name().name() != "definition" {
        return Err(Error::parse(
            "<unknown>",
            format!("expected <definition> root element, found <{}>", root.tag_name().name()),
        ));
    }

    let name = root
        .attribute("name")
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| Error::parse("<unknown>", "definition has no name"))?;

    let parser = Parser {
        definition: name,
        category: parse_category(name, root.attribute("category"))?,
    };
    parser.parse_definition(root)
}

struct Parser<'t> {
    definition: &'t str,
    category: Category,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> Error {
        Error::parse(self.definition, message)
    }

    fn parse_definition(&self, root: Node<'_, '_>) -> Result<Schema> {
        let mut group = SchemaNode::new(NodeKind::Group, "");
        let mut symbols = SymbolTable::new();

        for child in elements(root) {
            match child.tag_name().name() {
                "doc" => {}
                "symbols" => self.parse_symbols(child, &mut symbols)?,
                "group" | "field" | "attribute" | "link" | "choice" => {
                    group.children.push(self.parse_node(child)?);
                }
                other => return Err(self.unexpected(other, "definition")),
            }
        }

        let base = root
            .attribute("extends")
            .map(str::trim)
            .filter(|b| !b.is_empty() && *b != ROOT_CLASS)
            .map(str::to_string);

        trace!(
            "Parsed definition {} ({} top-level nodes, base {:?})",
            self.definition,
            group.children.len(),
            base
        );

        Ok(Schema {
            name: self.definition.to_string(),
            category: self.category,
            base,
            root: group,
            symbols,
            inheritance_chain: vec![self.definition.to_string()],
        })
    }

    fn parse_symbols(&self, element: Node<'_, '_>, symbols: &mut SymbolTable) -> Result<()> {
        for child in elements(element) {
            match child.tag_name().name() {
                "doc" => {}
                "symbol" => {
                    let name = self.required(child, "name")?;
                    symbols.declare(name);
                }
                other => return Err(self.unexpected(other, "symbols")),
            }
        }
        Ok(())
    }

    fn parse_node(&self, element: Node<'_, '_>) -> Result<SchemaNode> {
        let tag = element.tag_name().name();
        let mut node = match tag {
            "group" => {
                let class = self.required(element, "type")?;
                SchemaNode::group(self.optional_name(element), class)
            }
            "field" => {
                let mut field = SchemaNode::field(self.member_name(element)?);
                field.type_constraint = element.attribute("type").map(str::to_string);
                field.units = element.attribute("units").map(str::to_string);
                field
            }
            "attribute" => {
                let mut attr = SchemaNode::attribute(self.member_name(element)?);
                attr.type_constraint = element.attribute("type").map(str::to_string);
                attr
            }
            "link" => {
                let name = self.required(element, "name")?;
                let target = self.required(element, "target")?;
                SchemaNode::link(name, target)
            }
            "choice" => SchemaNode::choice(self.required(element, "name")?),
            other => return Err(self.unexpected(other, "group")),
        };

        node.occurrence = self.parse_occurrence(element, &node)?;
        node.recommended = self.flag(element, "recommended")?;
        node.deprecated = element.attribute("deprecated").map(str::to_string);

        for child in elements(element) {
            let child_tag = child.tag_name().name();
            match (node.kind, child_tag) {
                (_, "doc") => {}
                (NodeKind::Group, "group" | "field" | "attribute" | "link" | "choice")
                | (NodeKind::Field, "attribute") => {
                    node.children.push(self.parse_node(child)?);
                }
                (NodeKind::Choice, "group") => {
                    let mut alternative = self.parse_node(child)?;
                    if alternative.name.is_empty() {
                        alternative.name.clone_from(&node.name);
                    }
                    node.children.push(alternative);
                }
                (NodeKind::Field | NodeKind::Attribute, "dimensions") => {
                    node.dimensions = Some(self.parse_dimensions(child)?);
                }
                (NodeKind::Field | NodeKind::Attribute, "enumeration") => {
                    node.enumeration = self.parse_enumeration(child)?;
                }
                (_, other) => return Err(self.unexpected(other, tag)),
            }
        }

        if node.kind == NodeKind::Choice && node.children.is_empty() {
            return Err(self.error(format!("choice '{}' has no alternatives", node.name)));
        }

        Ok(node)
    }

    /// Name of a field or attribute; `nameType="any"` makes it a wildcard
    fn member_name<'a>(&self, element: Node<'a, '_>) -> Result<&'a str> {
        if element.attribute("nameType") == Some("any") {
            return Ok("");
        }
        self.required(element, "name")
    }

    fn optional_name<'a>(&self, element: Node<'a, '_>) -> &'a str {
        if element.attribute("nameType") == Some("any") {
            ""
        } else {
            element.attribute("name").unwrap_or("")
        }
    }

    fn parse_occurrence(
        &self,
        element: Node<'_, '_>,
        node: &SchemaNode,
    ) -> Result<Option<Occurrence>> {
        let min = element
            .attribute("minOccurs")
            .map(|v| self.count(v, "minOccurs"))
            .transpose()?;
        let max = match element.attribute("maxOccurs") {
            Some("unbounded") => Some(None),
            Some(v) => Some(Some(self.count(v, "maxOccurs")?)),
            None => None,
        };
        let relaxed = self.flag(element, "optional")? || self.flag(element, "recommended")?;

        let default = node.occurrence();
        let occurrence = if min.is_none() && max.is_none() && !relaxed {
            if self.category == Category::Base {
                Some(Occurrence::new(0, default.max))
            } else {
                None
            }
        } else {
            let min = match min {
                Some(min) => min,
                None if relaxed || self.category == Category::Base => 0,
                None => default.min,
            };
            Some(Occurrence::new(min, max.unwrap_or(default.max)))
        };

        if let Some(Occurrence { min, max: Some(max) }) = occurrence {
            if min > max {
                return Err(self.error(format!(
                    "{}: minOccurs {min} exceeds maxOccurs {max}",
                    node.label()
                )));
            }
        }
        Ok(occurrence)
    }

    fn parse_dimensions(&self, element: Node<'_, '_>) -> Result<Dimensions> {
        let mut dimensions = Dimensions {
            rank: element.attribute("rank").map(DimSize::parse),
            dims: Vec::new(),
        };

        for child in elements(element) {
            match child.tag_name().name() {
                "doc" => {}
                "dim" => {
                    let index_text = self.required(child, "index")?;
                    let index = self.count(index_text, "index")?;
                    if index == 0 {
                        return Err(self.error("dim index must start at 1"));
                    }
                    dimensions.dims.push(Dimension {
                        index,
                        size: child.attribute("value").map(DimSize::parse),
                    });
                }
                other => return Err(self.unexpected(other, "dimensions")),
            }
        }

        dimensions.dims.sort_by_key(|d| d.index);
        Ok(dimensions)
    }

    fn parse_enumeration(&self, element: Node<'_, '_>) -> Result<Option<Vec<String>>> {
        let mut items = Vec::new();
        for child in elements(element) {
            match child.tag_name().name() {
                "doc" => {}
                "item" => items.push(self.required(child, "value")?.to_string()),
                other => return Err(self.unexpected(other, "enumeration")),
            }
        }
        Ok((!items.is_empty()).then_some(items))
    }

    fn required<'a>(&self, element: Node<'a, '_>, attr: &str) -> Result<&'a str> {
        element
            .attribute(attr)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                self.error(format!(
                    "<{}> is missing required attribute '{attr}'",
                    element.tag_name().name()
                ))
            })
    }

    fn flag(&self, element: Node<'_, '_>, attr: &str) -> Result<bool> {
        match element.attribute(attr) {
            None | Some("false" | "0") => Ok(false),
            Some("true" | "1") => Ok(true),
            Some(other) => Err(self.error(format!("invalid boolean {attr}=\"{other}\""))),
        }
    }

    fn count(&self, text: &str, attr: &str) -> Result<usize> {
        text.trim()
            .parse()
            .map_err(|_| self.error(format!("invalid {attr} value '{text}'")))
    }

    fn unexpected(&self, tag: &str, parent: &str) -> Error {
        self.error(format!("unexpected element <{tag}> inside <{parent}>"))
    }
}

fn parse_category(definition: &str, category: Option<&str>) -> Result<Category> {
    match category {
        None | Some("application") => Ok(Category::Application),
        Some("base") => Ok(Category::Base),
        Some("contributed") => Ok(Category::Contributed),
        Some(other) => Err(Error::parse(
            definition,
            format!("unknown category '{other}'"),
        )),
    }
}

fn elements<'a, 'i>(node: Node<'a, 'i>) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children().filter(Node::is_element)
}
