//! Property graph over a document store
//!
//! This module implements the property graph data model with:
//! - Vertices and edges kept as documents in two collections
//! - Edges referencing their endpoints by `{collection, id}`
//! - Directional, label-filtered traversal through document queries
//! - Property mutation with read-after-write on the same handle

pub mod edge;
mod element;
pub mod error;
pub mod property;
pub mod store;
pub(crate) mod traversal;
pub mod types;
pub mod vertex;

// Re-export main types
pub use edge::Edge;
pub use element::Element;
pub use error::{GraphError, GraphResult};
pub use property::{PropertyMap, PropertyValue, WriteOutcome};
pub use store::{Features, GraphStore};
pub use types::{Direction, ElementId, ElementKind, IntoElementId, Reference};
pub use vertex::Vertex;
