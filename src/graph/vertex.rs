//! Vertex handles and adjacency traversal

use super::edge::Edge;
use super::element::sealed::Sealed;
use super::element::{Element, ElementState};
use super::error::GraphResult;
use super::store::GraphContext;
use super::traversal;
use super::types::{Direction, ElementKind};
use crate::document::{Document, FindOptions};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;

/// A vertex of the graph.
///
/// Adjacency is not stored on the vertex; [`edges`](Vertex::edges) and
/// [`vertices`](Vertex::vertices) query the edge collection on every call and
/// return an independent result each time.
#[derive(Debug, Clone)]
pub struct Vertex {
    state: ElementState,
}

impl Vertex {
    pub(crate) fn from_document(graph: Arc<GraphContext>, raw: Document) -> GraphResult<Self> {
        Ok(Self {
            state: ElementState::from_document(graph, ElementKind::Vertex, raw)?,
        })
    }

    /// Edges incident to this vertex in `direction` whose label is one of
    /// `labels`. An empty `labels` matches every label.
    pub fn edges(&self, direction: Direction, labels: &[&str]) -> GraphResult<Vec<Edge>> {
        let graph = self.state.graph();
        let filter = traversal::edge_filter(&graph.vertex_ref(self.id()), direction, labels);
        let edges = graph.find_edges(&filter)?;
        debug!("Vertex {}: {} {} edges", self.id(), edges.len(), direction);
        Ok(edges)
    }

    /// Neighbors of this vertex reached through edges matching `direction` and
    /// `labels`, each returned once.
    ///
    /// OUT neighbors are the `outV` endpoints of edges pointing into this
    /// vertex; IN neighbors are the `inV` endpoints of edges leaving it; BOTH
    /// takes whichever endpoint is not this vertex.
    pub fn vertices(&self, direction: Direction, labels: &[&str]) -> GraphResult<Vec<Vertex>> {
        let graph = self.state.graph();
        let filter = traversal::neighbor_edge_filter(&graph.vertex_ref(self.id()), direction, labels);
        let edges = graph
            .store
            .find(graph.collection(ElementKind::Edge), &filter, &FindOptions::new())?;

        let ids = traversal::neighbor_ids(&edges, direction, self.id())?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let vertices = graph.find_vertices(&traversal::vertex_id_filter(&ids))?;
        debug!("Vertex {}: {} {} neighbors", self.id(), vertices.len(), direction);
        Ok(vertices)
    }

    /// Add an edge from this vertex to `in_vertex` with an allocated id
    pub fn add_edge(&self, label: &str, in_vertex: &Vertex) -> GraphResult<Edge> {
        self.state.graph().add_edge(None, self.id(), in_vertex.id(), label)
    }
}

impl Element for Vertex {}

impl Sealed for Vertex {
    fn state(&self) -> &ElementState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ElementState {
        &mut self.state
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}
