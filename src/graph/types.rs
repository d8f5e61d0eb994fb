//! Core type definitions for the graph model

use crate::document::{Document, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field names of persisted vertex and edge documents
pub(crate) mod fields {
    pub const ID: &str = "id";
    pub const LABEL: &str = "label";
    pub const PROPERTIES: &str = "properties";
    pub const OUT_V: &str = "outV";
    pub const IN_V: &str = "inV";
    pub const REF_COLLECTION: &str = "collection";
    pub const REF_ID: &str = "id";
}

/// Identifier of a vertex or edge, unique within its collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ElementId(pub i64);

impl ElementId {
    pub fn new(id: i64) -> Self {
        ElementId(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ElementId {
    fn from(id: i64) -> Self {
        ElementId(id)
    }
}

impl From<ElementId> for Value {
    fn from(id: ElementId) -> Self {
        Value::Integer(id.0)
    }
}

/// Loose conversion of caller-supplied ids.
///
/// Integers convert directly; other numbers are truncated; strings are parsed
/// as numbers and truncated. Anything else yields `None`.
pub trait IntoElementId {
    fn into_element_id(self) -> Option<ElementId>;
}

impl IntoElementId for ElementId {
    fn into_element_id(self) -> Option<ElementId> {
        Some(self)
    }
}

impl IntoElementId for i64 {
    fn into_element_id(self) -> Option<ElementId> {
        Some(ElementId(self))
    }
}

impl IntoElementId for i32 {
    fn into_element_id(self) -> Option<ElementId> {
        Some(ElementId(self as i64))
    }
}

impl IntoElementId for u32 {
    fn into_element_id(self) -> Option<ElementId> {
        Some(ElementId(self as i64))
    }
}

impl IntoElementId for u64 {
    fn into_element_id(self) -> Option<ElementId> {
        i64::try_from(self).ok().map(ElementId)
    }
}

impl IntoElementId for usize {
    fn into_element_id(self) -> Option<ElementId> {
        i64::try_from(self).ok().map(ElementId)
    }
}

impl IntoElementId for f64 {
    fn into_element_id(self) -> Option<ElementId> {
        if self.is_finite() && self >= i64::MIN as f64 && self < i64::MAX as f64 {
            Some(ElementId(self.trunc() as i64))
        } else {
            None
        }
    }
}

impl IntoElementId for f32 {
    fn into_element_id(self) -> Option<ElementId> {
        (self as f64).into_element_id()
    }
}

impl IntoElementId for &str {
    fn into_element_id(self) -> Option<ElementId> {
        let trimmed = self.trim();
        match trimmed.parse::<i64>() {
            Ok(id) => Some(ElementId(id)),
            Err(_) => trimmed.parse::<f64>().ok()?.into_element_id(),
        }
    }
}

impl IntoElementId for String {
    fn into_element_id(self) -> Option<ElementId> {
        self.as_str().into_element_id()
    }
}

impl IntoElementId for &String {
    fn into_element_id(self) -> Option<ElementId> {
        self.as_str().into_element_id()
    }
}

impl IntoElementId for &Value {
    fn into_element_id(self) -> Option<ElementId> {
        match self {
            Value::Integer(i) => Some(ElementId(*i)),
            Value::Float(f) => f.into_element_id(),
            Value::String(s) => s.as_str().into_element_id(),
            _ => None,
        }
    }
}

/// Traversal direction relative to a vertex or edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Outgoing endpoint
    Out,
    /// Incoming endpoint
    In,
    /// Either endpoint
    Both,
}

impl Direction {
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Out => Direction::In,
            Direction::In => Direction::Out,
            Direction::Both => Direction::Both,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Out => write!(f, "OUT"),
            Direction::In => write!(f, "IN"),
            Direction::Both => write!(f, "BOTH"),
        }
    }
}

/// Which collection an element lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Vertex,
    Edge,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Vertex => write!(f, "Vertex"),
            ElementKind::Edge => write!(f, "Edge"),
        }
    }
}

/// Cross-collection reference: target collection tag plus target id.
///
/// Persisted as `{collection, id}`. Resolving it is always an explicit lookup,
/// and the target may no longer exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub collection: String,
    pub id: ElementId,
}

impl Reference {
    pub fn new(collection: impl Into<String>, id: ElementId) -> Self {
        Reference {
            collection: collection.into(),
            id,
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Document(
            Document::new()
                .with(fields::REF_COLLECTION, self.collection.as_str())
                .with(fields::REF_ID, self.id),
        )
    }

    /// Parse a persisted reference; `None` if the shape does not match
    pub fn from_value(value: &Value) -> Option<Self> {
        let doc = value.as_document()?;
        let collection = doc.get(fields::REF_COLLECTION)?.as_string()?;
        let id = doc.get(fields::REF_ID)?.as_integral()?;
        Some(Reference::new(collection, ElementId(id)))
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}
