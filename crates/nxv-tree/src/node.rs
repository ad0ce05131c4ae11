//! Node types for the data tree
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute holding the NeXus class of a group
pub const NX_CLASS: &str = "NX_class";

/// A node in the data tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node name; empty for the file root
    #[serde(default)]
    pub name: String,

    /// Structural kind
    pub kind: NodeKind,

    /// Declared element type (inferred from `value` when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<DataType>,

    /// Declared shape (inferred from `value` when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,

    /// Field content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Attributes attached to this node
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,

    /// Child nodes (groups only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,

    /// Link destination (links only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Structural kinds of data nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Container of fields and groups
    Group,

    /// Leaf data item
    Field,

    /// Soft link to another node
    Link,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Group => "group",
            NodeKind::Field => "field",
            NodeKind::Link => "link",
        };
        f.write_str(s)
    }
}

/// Named metadata on a group or field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<DataType>,

    pub value: Value,
}

/// Primitive element types of stored data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    String,
    Bool,
    Opaque,
}

/// Values that can be stored in fields and attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Array(Vec<Value>),
}

impl Node {
    fn empty(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            dtype: None,
            shape: None,
            value: None,
            attributes: Vec::new(),
            children: Vec::new(),
            target: None,
        }
    }

    /// Create a group; a non-empty `nx_class` is stored as the `NX_class` attribute
    pub fn group(name: impl Into<String>, nx_class: &str) -> Self {
        let node = Self::empty(name, NodeKind::Group);
        if nx_class.is_empty() {
            node
        } else {
            node.with_attribute(NX_CLASS, nx_class)
        }
    }

    /// Create a field holding a value
    pub fn field(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut node = Self::empty(name, NodeKind::Field);
        node.value = Some(value.into());
        node
    }

    /// Create a soft link pointing at `target`
    pub fn link(name: impl Into<String>, target: impl Into<String>) -> Self {
        let mut node = Self::empty(name, NodeKind::Link);
        node.target = Some(target.into());
        node
    }

    /// Set an attribute, replacing any previous one with the same name
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Append a child node
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Declare the element type explicitly
    pub fn with_dtype(mut self, dtype: DataType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    /// Declare the shape explicitly
    pub fn with_shape(mut self, shape: Vec<usize>) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Add a child node
    pub fn add_child(&mut self, child: Node) -> &mut Self {
        self.children.push(child);
        self
    }

    /// Set an attribute
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => {
                existing.value = value;
                existing.dtype = None;
            }
            None => self.attributes.push(Attribute::new(name, value)),
        }
        self
    }

    /// Find an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Text of a string attribute
    pub fn attribute_text(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(|a| a.value.as_text())
    }

    /// NeXus class of a group
    pub fn nx_class(&self) -> Option<&str> {
        self.attribute_text(NX_CLASS)
    }

    /// Value of the `units` attribute
    pub fn units(&self) -> Option<&str> {
        self.attribute_text("units")
    }

    /// Find a child by name
    pub fn find_child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Element type, declared or inferred from the stored value
    pub fn data_type(&self) -> Option<DataType> {
        self.dtype
            .or_else(|| self.value.as_ref().and_then(Value::infer_dtype))
    }

    /// Shape, declared or inferred from the stored value
    pub fn data_shape(&self) -> Vec<usize> {
        match (&self.shape, &self.value) {
            (Some(shape), _) => shape.clone(),
            (None, Some(value)) => value.shape(),
            (None, None) => Vec::new(),
        }
    }

    /// Destination path of a soft link, or of a hard link marked with a `target` attribute
    pub fn link_target(&self) -> Option<&str> {
        match self.kind {
            NodeKind::Link => self.target.as_deref(),
            _ => self.attribute_text("target"),
        }
    }
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            dtype: None,
            value: value.into(),
        }
    }

    /// Element type, declared or inferred from the value
    pub fn data_type(&self) -> Option<DataType> {
        self.dtype.or_else(|| self.value.infer_dtype())
    }
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Uint8 => "uint8",
            DataType::Uint16 => "uint16",
            DataType::Uint32 => "uint32",
            DataType::Uint64 => "uint64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::String => "string",
            DataType::Bool => "bool",
            DataType::Opaque => "opaque",
        }
    }

    pub fn is_signed_integer(self) -> bool {
        matches!(
            self,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    }

    pub fn is_unsigned_integer(self) -> bool {
        matches!(
            self,
            DataType::Uint8 | DataType::Uint16 | DataType::Uint32 | DataType::Uint64
        )
    }

    pub fn is_integer(self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    pub fn is_float(self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    /// Borrow the text of a string value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Array(items) if items.len() == 1 => items[0].as_text(),
            _ => None,
        }
    }

    /// Literal form of a scalar value; single-element arrays count as scalars
    pub fn as_literal(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Boolean(b) => Some(b.to_string()),
            Value::Array(items) if items.len() == 1 => items[0].as_literal(),
            Value::Array(_) => None,
        }
    }

    /// All scalar leaves in row-major order
    pub fn leaves(&self) -> Vec<&Value> {
        match self {
            Value::Array(items) => items.iter().flat_map(Value::leaves).collect(),
            scalar => vec![scalar],
        }
    }

    /// Shape of the value; scalars have rank zero
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Value::Array(items) => {
                let mut shape = vec![items.len()];
                if let Some(first) = items.first() {
                    shape.extend(first.shape());
                }
                shape
            }
            _ => Vec::new(),
        }
    }

    /// Element type implied by the first scalar leaf
    pub fn infer_dtype(&self) -> Option<DataType> {
        match self {
            Value::Boolean(_) => Some(DataType::Bool),
            Value::Integer(_) => Some(DataType::Int64),
            Value::Float(_) => Some(DataType::Float64),
            Value::Text(_) => Some(DataType::String),
            Value::Array(items) => items.first().and_then(Value::infer_dtype),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_sets_nx_class() {
        let group = Node::group("entry", "NXentry");
        assert_eq!(group.kind, NodeKind::Group);
        assert_eq!(group.nx_class(), Some("NXentry"));

        let plain = Node::group("", "");
        assert!(plain.attributes.is_empty());
    }

    #[test]
    fn test_inferred_shape_and_type() {
        let field = Node::field("data", vec![vec![1_i64, 2, 3], vec![4, 5, 6]]);
        assert_eq!(field.data_shape(), vec![2, 3]);
        assert_eq!(field.data_type(), Some(DataType::Int64));

        let scalar = Node::field("title", "hello");
        assert!(scalar.data_shape().is_empty());
        assert_eq!(scalar.data_type(), Some(DataType::String));
    }

    #[test]
    fn test_declared_type_wins() {
        let field = Node::field("x", vec![1.0, 2.0])
            .with_dtype(DataType::Float32)
            .with_shape(vec![2, 1]);
        assert_eq!(field.data_type(), Some(DataType::Float32));
        assert_eq!(field.data_shape(), vec![2, 1]);
    }

    #[test]
    fn test_set_attribute_replaces() {
        let mut node = Node::field("x", 1.0);
        node.set_attribute("units", "mm");
        node.set_attribute("units", "m");
        assert_eq!(node.attributes.len(), 1);
        assert_eq!(node.units(), Some("m"));
    }

    #[test]
    fn test_link_target() {
        let link = Node::link("data", "/entry/instrument/detector/data");
        assert_eq!(link.link_target(), Some("/entry/instrument/detector/data"));

        let hard = Node::field("data", 1_i64).with_attribute("target", "/entry/data/data");
        assert_eq!(hard.link_target(), Some("/entry/data/data"));

        assert_eq!(Node::field("plain", 1_i64).link_target(), None);
    }

    #[test]
    fn test_value_literal() {
        assert_eq!(Value::from("abc").as_literal(), Some("abc".to_string()));
        assert_eq!(Value::from(3_i64).as_literal(), Some("3".to_string()));
        assert_eq!(Value::from(vec![7_i64]).as_literal(), Some("7".to_string()));
        assert_eq!(Value::from(vec![1_i64, 2]).as_literal(), None);
    }

    #[test]
    fn test_value_leaves() {
        let value = Value::from(vec![vec![1_i64, 2], vec![3, 4]]);
        assert_eq!(value.leaves().len(), 4);
    }

    #[test]
    fn test_datatype_families() {
        assert!(DataType::Int32.is_signed_integer());
        assert!(DataType::Uint16.is_unsigned_integer());
        assert!(DataType::Float32.is_numeric());
        assert!(!DataType::String.is_numeric());
        assert_eq!(DataType::Uint64.to_string(), "uint64");
    }

    #[test]
    fn test_node_json_shape() {
        let json = r#"{
            "name": "entry",
            "kind": "group",
            "attributes": [{"name": "NX_class", "value": "NXentry"}],
            "children": [
                {"name": "count", "kind": "field", "dtype": "int32", "value": [1, 2, 3]}
            ]
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.nx_class(), Some("NXentry"));
        let count = node.find_child("count").unwrap();
        assert_eq!(count.data_type(), Some(DataType::Int32));
        assert_eq!(count.data_shape(), vec![3]);
    }
}
