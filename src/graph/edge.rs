//! Edge handles
//!
//! An edge document carries its label and two vertex references, `outV` (the
//! tail) and `inV` (the head). References are resolved with an explicit lookup
//! and may dangle once the target vertex is deleted.

use super::element::sealed::Sealed;
use super::element::{Element, ElementState};
use super::error::{GraphError, GraphResult};
use super::store::GraphContext;
use super::types::{fields, Direction, ElementKind, Reference};
use super::vertex::Vertex;
use crate::document::Document;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::warn;

/// A directed, labelled edge between two vertices
#[derive(Debug, Clone)]
pub struct Edge {
    state: ElementState,
}

impl Edge {
    pub(crate) fn from_document(graph: Arc<GraphContext>, raw: Document) -> GraphResult<Self> {
        Ok(Self {
            state: ElementState::from_document(graph, ElementKind::Edge, raw)?,
        })
    }

    /// Edge label; never empty on edges created through the graph
    pub fn label(&self) -> &str {
        Element::label(self).unwrap_or_default()
    }

    fn reference(&self, field: &str) -> GraphResult<Reference> {
        self.state
            .raw()
            .get(field)
            .and_then(Reference::from_value)
            .ok_or_else(|| GraphError::malformed(format!("edge {} has no valid {} reference", self.id(), field)))
    }

    /// Reference to the tail vertex
    pub fn out_reference(&self) -> GraphResult<Reference> {
        self.reference(fields::OUT_V)
    }

    /// Reference to the head vertex
    pub fn in_reference(&self) -> GraphResult<Reference> {
        self.reference(fields::IN_V)
    }

    /// Resolve one endpoint: OUT is the tail, IN is the head.
    ///
    /// BOTH is rejected with `Unsupported`. A reference whose vertex no longer
    /// exists yields `None`.
    pub fn vertex(&self, direction: Direction) -> GraphResult<Option<Vertex>> {
        let reference = match direction {
            Direction::Out => self.out_reference()?,
            Direction::In => self.in_reference()?,
            Direction::Both => {
                return Err(GraphError::Unsupported(format!(
                    "edge {} has no single {} endpoint",
                    self.id(),
                    direction
                )))
            }
        };

        let graph = self.state.graph();
        if reference.collection != graph.collection(ElementKind::Vertex) {
            warn!(
                "Edge {} references {} outside vertex collection {}",
                self.id(),
                reference,
                graph.collection(ElementKind::Vertex)
            );
        }

        let vertex = graph.find_vertex(reference.id)?;
        if vertex.is_none() {
            warn!("Edge {}: dangling {} reference {}", self.id(), direction, reference);
        }
        Ok(vertex)
    }

    pub fn out_vertex(&self) -> GraphResult<Option<Vertex>> {
        self.vertex(Direction::Out)
    }

    pub fn in_vertex(&self) -> GraphResult<Option<Vertex>> {
        self.vertex(Direction::In)
    }
}

impl Element for Edge {}

impl Sealed for Edge {
    fn state(&self) -> &ElementState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ElementState {
        &mut self.state
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}
