//! JSON Schema documents parsed into an arena of nodes.
//!
//! A [`SchemaDocument`] owns every [`SchemaNode`] reachable from its root. Nodes refer to
//! each other through [`NodeId`] indices, never through Rust references, so a document
//! whose `$ref`s form a cycle is still a finite value: the cycle lives in the ids.
//!
//! Every schema position is indexed by its JSON pointer (`#`, `#/properties/id`,
//! `#/$defs/Tree`, ...) so that internal references can be located later by the
//! [`resolver`](crate::resolver).

use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Identifier given to a root schema that does not declare its own `$id`
pub const ROOT_SCHEMA_ID: &str = "rootSchema";

/// Index of a node inside its [`SchemaDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        NodeId(index)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// JSON Schema primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl SchemaType {
    /// Parse a `type` keyword value, `None` for names JSON Schema does not define
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "object" => Some(SchemaType::Object),
            "array" => Some(SchemaType::Array),
            "string" => Some(SchemaType::String),
            "number" => Some(SchemaType::Number),
            "integer" => Some(SchemaType::Integer),
            "boolean" => Some(SchemaType::Boolean),
            "null" => Some(SchemaType::Null),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Null => "null",
        }
    }
}

/// A `$ref`, before and after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// The raw pointer text as written in the schema
    Pointer(String),
    /// The node the pointer was resolved to
    Link(NodeId),
}

/// Array item schemas
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Items {
    #[default]
    None,
    /// Every element follows the same schema
    Single(NodeId),
    /// Positional schemas (`prefixItems` or the array form of `items`)
    Tuple(Vec<NodeId>),
}

/// Numeric constraints, exclusive bounds normalised to the draft-6 numeric form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericBounds {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,
}

impl NumericBounds {
    pub fn is_empty(&self) -> bool {
        *self == NumericBounds::default()
    }
}

/// One JSON Schema fragment
#[derive(Debug, Clone, Default)]
pub struct SchemaNode {
    /// JSON pointer of this node within its document
    pub pointer: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Declared types; empty when the schema has no `type` keyword
    pub types: Vec<SchemaType>,
    pub properties: IndexMap<String, NodeId>,
    pub required: Vec<String>,
    pub additional_properties: Option<NodeId>,
    pub items: Items,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub enum_values: Option<Vec<Value>>,
    pub const_value: Option<Value>,
    pub default: Option<Value>,
    pub examples: Vec<Value>,
    pub numeric: NumericBounds,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub format: Option<String>,
    pub all_of: Vec<NodeId>,
    pub any_of: Vec<NodeId>,
    pub one_of: Vec<NodeId>,
    pub not: Option<NodeId>,
    pub reference: Option<Reference>,
    /// Parsed from the boolean schema `false`: no value satisfies it
    pub unsatisfiable: bool,
}

impl SchemaNode {
    /// The first declared type that is not `null`, falling back to `null` itself
    pub fn primary_type(&self) -> Option<SchemaType> {
        self.types
            .iter()
            .copied()
            .find(|t| *t != SchemaType::Null)
            .or_else(|| self.types.first().copied())
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }
}

/// A schema document: the arena of nodes plus its pointer index
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    nodes: Vec<SchemaNode>,
    root: NodeId,
    root_id: String,
    /// The source value, kept so that references into non-schema containers
    /// (for example `#/components/schemas/User`) can be loaded on demand
    raw: Value,
    pointers: HashMap<String, NodeId>,
    anchors: HashMap<String, NodeId>,
    ids: HashMap<String, NodeId>,
}

impl SchemaDocument {
    /// Parse a JSON Schema value into a document.
    ///
    /// The root must be an object or a boolean schema. The root takes its `$id` as the
    /// document identifier, or [`ROOT_SCHEMA_ID`] when it has none.
    pub fn from_value(value: &Value) -> Result<Self> {
        let root_id = match value {
            Value::Object(map) => map
                .get("$id")
                .and_then(Value::as_str)
                .filter(|id| !id.starts_with('#'))
                .map(|id| id.trim_end_matches('#').to_string())
                .unwrap_or_else(|| ROOT_SCHEMA_ID.to_string()),
            Value::Bool(_) => ROOT_SCHEMA_ID.to_string(),
            other => {
                return Err(Error::InvalidSchema(format!(
                    "expected an object or boolean schema, found {}",
                    json_kind(other)
                )))
            }
        };

        let mut document = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            root_id,
            raw: value.clone(),
            pointers: HashMap::new(),
            anchors: HashMap::new(),
            ids: HashMap::new(),
        };
        document.root = document.parse_node(value, "#".to_string());
        document.ids.insert(document.root_id.clone(), document.root);
        debug!(
            "Parsed schema document {} into {} nodes",
            document.root_id,
            document.nodes.len()
        );
        Ok(document)
    }

    /// Parse a JSON text into a document
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Identifier the document is addressable by (`$id` of the root)
    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut SchemaNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Look up an already indexed node by its JSON pointer (`#/properties/id`)
    pub fn node_at(&self, pointer: &str) -> Option<NodeId> {
        self.pointers.get(pointer).copied()
    }

    /// Whether any node still carries an unresolved pointer
    pub fn has_pointers(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| matches!(n.reference, Some(Reference::Pointer(_))))
    }

    /// Locate the node a `$ref` names, loading it from the raw document when the pointer
    /// leads into a container the parser did not walk.
    pub(crate) fn locate(&mut self, reference: &str) -> Result<NodeId> {
        let (base, fragment) = match reference.split_once('#') {
            Some((base, fragment)) => (base, Some(fragment)),
            None => (reference, None),
        };

        if !base.is_empty() && base != self.root_id {
            return match (self.ids.get(base), fragment) {
                (Some(id), None) | (Some(id), Some("")) => Ok(*id),
                (Some(_), Some(_)) => Err(Error::dangling(
                    reference,
                    "pointers into embedded resources are not supported",
                )),
                (None, _) => Err(Error::dangling(
                    reference,
                    format!(
                        "references to other documents are not supported (this document is {})",
                        self.root_id
                    ),
                )),
            };
        }

        let fragment = percent_decode(fragment.unwrap_or(""));
        if fragment.is_empty() {
            return Ok(self.root);
        }
        if !fragment.starts_with('/') {
            return self
                .anchors
                .get(fragment.as_str())
                .copied()
                .ok_or_else(|| Error::dangling(reference, "no schema declares this anchor"));
        }

        let pointer = format!("#{}", fragment);
        if let Some(id) = self.pointers.get(&pointer) {
            return Ok(*id);
        }

        match self.raw.pointer(&fragment).cloned() {
            Some(value @ (Value::Object(_) | Value::Bool(_))) => {
                debug!("Loading referenced schema {} on demand", pointer);
                Ok(self.parse_node(&value, pointer))
            }
            Some(other) => Err(Error::dangling(
                reference,
                format!("target is {}, not a schema", json_kind(&other)),
            )),
            None => Err(Error::dangling(reference, "no node at this path")),
        }
    }

    fn parse_node(&mut self, value: &Value, pointer: String) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SchemaNode {
            pointer: pointer.clone(),
            ..SchemaNode::default()
        });
        self.pointers.insert(pointer.clone(), id);

        let node = match value {
            Value::Object(map) => self.parse_object(map, &pointer, id),
            Value::Bool(accepts) => SchemaNode {
                pointer,
                unsatisfiable: !accepts,
                ..SchemaNode::default()
            },
            other => {
                debug!("Ignoring non-schema value ({}) at {}", json_kind(other), pointer);
                SchemaNode {
                    pointer,
                    ..SchemaNode::default()
                }
            }
        };
        self.nodes[id.0] = node;
        id
    }

    fn parse_object(&mut self, map: &Map<String, Value>, pointer: &str, id: NodeId) -> SchemaNode {
        let mut node = SchemaNode {
            pointer: pointer.to_string(),
            ..SchemaNode::default()
        };

        for (keyword, value) in map {
            match keyword.as_str() {
                "type" => node.types = parse_types(value),
                "title" => node.title = value.as_str().map(str::to_string),
                "description" => node.description = value.as_str().map(str::to_string),
                "properties" => {
                    if let Value::Object(props) = value {
                        for (name, schema) in props {
                            let child_pointer =
                                format!("{}/properties/{}", pointer, escape_token(name));
                            let child = self.parse_node(schema, child_pointer);
                            node.properties.insert(name.clone(), child);
                        }
                    }
                }
                "required" => {
                    node.required = value
                        .as_array()
                        .map(|names| {
                            names
                                .iter()
                                .filter_map(Value::as_str)
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default();
                }
                "additionalProperties" => {
                    if value.is_object() {
                        let child_pointer = format!("{}/additionalProperties", pointer);
                        node.additional_properties = Some(self.parse_node(value, child_pointer));
                    }
                }
                "items" => match value {
                    Value::Array(schemas) => {
                        if matches!(node.items, Items::None) {
                            node.items = Items::Tuple(self.parse_list(schemas, pointer, "items"));
                        }
                    }
                    Value::Object(_) | Value::Bool(_) => {
                        let child_pointer = format!("{}/items", pointer);
                        let child = self.parse_node(value, child_pointer);
                        if matches!(node.items, Items::None) {
                            node.items = Items::Single(child);
                        }
                    }
                    _ => debug!("Ignoring malformed items at {}", pointer),
                },
                "prefixItems" => {
                    if let Value::Array(schemas) = value {
                        node.items = Items::Tuple(self.parse_list(schemas, pointer, "prefixItems"));
                    }
                }
                "minItems" => node.min_items = value.as_u64(),
                "maxItems" => node.max_items = value.as_u64(),
                "enum" => node.enum_values = value.as_array().cloned(),
                "const" => node.const_value = Some(value.clone()),
                "default" => node.default = Some(value.clone()),
                "examples" => node.examples = value.as_array().cloned().unwrap_or_default(),
                "minimum" => node.numeric.minimum = value.as_f64(),
                "maximum" => node.numeric.maximum = value.as_f64(),
                "exclusiveMinimum" => {
                    if let Some(bound) = value.as_f64() {
                        node.numeric.exclusive_minimum = Some(bound);
                    }
                }
                "exclusiveMaximum" => {
                    if let Some(bound) = value.as_f64() {
                        node.numeric.exclusive_maximum = Some(bound);
                    }
                }
                "multipleOf" => node.numeric.multiple_of = value.as_f64().filter(|m| *m > 0.0),
                "minLength" => node.min_length = value.as_u64(),
                "maxLength" => node.max_length = value.as_u64(),
                "pattern" => node.pattern = value.as_str().map(str::to_string),
                "format" => node.format = value.as_str().map(str::to_string),
                "allOf" | "anyOf" | "oneOf" => {
                    if let Value::Array(schemas) = value {
                        let children = self.parse_list(schemas, pointer, keyword);
                        match keyword.as_str() {
                            "allOf" => node.all_of = children,
                            "anyOf" => node.any_of = children,
                            _ => node.one_of = children,
                        }
                    }
                }
                "not" => {
                    let child_pointer = format!("{}/not", pointer);
                    node.not = Some(self.parse_node(value, child_pointer));
                }
                "$defs" | "definitions" => {
                    if let Value::Object(defs) = value {
                        for (name, schema) in defs {
                            let child_pointer =
                                format!("{}/{}/{}", pointer, keyword, escape_token(name));
                            self.parse_node(schema, child_pointer);
                        }
                    }
                }
                "$ref" => {
                    if let Some(target) = value.as_str() {
                        node.reference = Some(Reference::Pointer(target.to_string()));
                    }
                }
                "$id" => {
                    if let Some(declared) = value.as_str() {
                        if let Some(anchor) = declared.strip_prefix('#') {
                            self.anchors.insert(anchor.to_string(), id);
                        } else if pointer != "#" {
                            self.ids.insert(declared.trim_end_matches('#').to_string(), id);
                        }
                    }
                }
                "$anchor" => {
                    if let Some(anchor) = value.as_str() {
                        self.anchors.insert(anchor.to_string(), id);
                    }
                }
                _ => debug!("Ignoring keyword {} at {}", keyword, pointer),
            }
        }

        // Draft-4 boolean exclusive bounds apply to the sibling minimum/maximum.
        if map.get("exclusiveMinimum") == Some(&Value::Bool(true)) {
            node.numeric.exclusive_minimum = node.numeric.minimum.take();
        }
        if map.get("exclusiveMaximum") == Some(&Value::Bool(true)) {
            node.numeric.exclusive_maximum = node.numeric.maximum.take();
        }

        node
    }

    fn parse_list(&mut self, schemas: &[Value], pointer: &str, keyword: &str) -> Vec<NodeId> {
        schemas
            .iter()
            .enumerate()
            .map(|(i, schema)| self.parse_node(schema, format!("{}/{}/{}", pointer, keyword, i)))
            .collect()
    }
}

fn parse_types(value: &Value) -> Vec<SchemaType> {
    let names: Vec<&str> = match value {
        Value::String(name) => vec![name.as_str()],
        Value::Array(names) => names.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    names
        .into_iter()
        .filter_map(|name| {
            let parsed = SchemaType::parse(name);
            if parsed.is_none() {
                debug!("Ignoring unknown type name: {}", name);
            }
            parsed
        })
        .collect()
}

/// Escape a property name as a JSON pointer token (RFC 6901)
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Percent-decode a `$ref` fragment; invalid UTF-8 is replaced, not rejected
fn percent_decode(fragment: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(fragment.as_bytes())).into_owned()
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
