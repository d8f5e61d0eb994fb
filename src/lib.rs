//! docgraph
//!
//! A property graph layered over a schema-less document store. Vertices and
//! edges are documents in two collections; adjacency is expressed through
//! explicit `{collection, id}` references held by edges and is recovered with
//! document queries.
//!
//! # Layers
//!
//! - [`document`]: the document store contract and its memory and RocksDB backends
//! - [`graph`]: element handles, traversal and the graph manager
//! - [`config`]: collection naming and backend selection
//!
//! ## Example Usage
//!
//! ```rust
//! use docgraph::{Direction, Element, GraphConfig, GraphStore};
//!
//! let graph = GraphStore::open(GraphConfig::default()).unwrap();
//!
//! let pilot = graph.add_vertex(None).unwrap();
//! let plane = graph.add_vertex(None).unwrap();
//! graph.add_edge(None, &pilot, &plane, "flies").unwrap();
//!
//! let flies = pilot.edges(Direction::Out, &["flies"]).unwrap();
//! assert_eq!(flies.len(), 1);
//! assert_eq!(flies[0].in_vertex().unwrap(), Some(plane));
//!
//! let mut pilot = pilot;
//! pilot.set_property("name", "Amelia").unwrap();
//! assert_eq!(pilot.property("name").unwrap().as_string(), Some("Amelia"));
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod document;
pub mod graph;

// Re-export main types for convenience
pub use config::{BackendConfig, ConfigError, GraphConfig};
pub use document::{Document, DocumentStore, Filter, MemoryStore, StoreError, Value};
pub use graph::{
    Direction, Edge, Element, ElementId, ElementKind, Features, GraphError, GraphResult, GraphStore,
    PropertyMap, PropertyValue, Reference, Vertex, WriteOutcome,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
