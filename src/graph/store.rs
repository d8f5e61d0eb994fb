//! Graph manager over a document store
//!
//! Vertices and edges live in two collections of the backing store. The graph
//! owns:
//! - collection naming (`{database}.{collection}`)
//! - the unique index on `id` in both collections
//! - id allocation and insertion of new elements
//! - construction of [`Vertex`] and [`Edge`] handles

use super::edge::Edge;
use super::element::Element;
use super::error::{GraphError, GraphResult};
use super::types::{fields, ElementId, ElementKind, IntoElementId, Reference};
use super::vertex::Vertex;
use crate::config::GraphConfig;
use crate::document::{Document, DocumentStore, Filter, FindOptions, SortOrder, StoreError};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// State shared by the graph and every handle it creates
pub(crate) struct GraphContext {
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) config: GraphConfig,
    vertex_collection: String,
    edge_collection: String,
}

impl GraphContext {
    pub(crate) fn collection(&self, kind: ElementKind) -> &str {
        match kind {
            ElementKind::Vertex => &self.vertex_collection,
            ElementKind::Edge => &self.edge_collection,
        }
    }

    /// Reference to a vertex of this graph as persisted in edge documents
    pub(crate) fn vertex_ref(&self, id: ElementId) -> Reference {
        Reference::new(self.vertex_collection.as_str(), id)
    }

    /// Highest id currently stored in the collection of `kind`
    fn max_id(&self, kind: ElementKind) -> GraphResult<Option<ElementId>> {
        let options = FindOptions::new().sort(fields::ID, SortOrder::Descending).limit(1);
        let top = self.store.find(self.collection(kind), &Filter::All, &options)?;
        match top.first() {
            None => Ok(None),
            Some(doc) => doc
                .get(fields::ID)
                .and_then(|id| id.into_element_id())
                .map(Some)
                .ok_or_else(|| GraphError::malformed(format!("{} document without numeric id: {}", kind, doc))),
        }
    }

    /// `max + 1` over the collection of `kind`, or 1 if it is empty
    pub(crate) fn next_id(&self, kind: ElementKind) -> GraphResult<ElementId> {
        let next = match self.max_id(kind)? {
            Some(ElementId(max)) => max
                .checked_add(1)
                .map(ElementId)
                .ok_or_else(|| GraphError::invalid(format!("{} id space exhausted", kind)))?,
            None => ElementId(1),
        };
        debug!("Next {} id: {}", kind, next);
        Ok(next)
    }

    fn insert_error(&self, kind: ElementKind, id: ElementId, err: StoreError) -> GraphError {
        match err {
            StoreError::DuplicateKey { .. } => GraphError::DuplicateId {
                collection: self.collection(kind).to_string(),
                id,
            },
            other => GraphError::Store(other),
        }
    }

    /// Insert the document built for `id`, allocating the id when none is given.
    ///
    /// An allocated id that collides with a concurrent insert is re-allocated up
    /// to `id_allocation_retries` times. Explicit ids are inserted once.
    fn insert<F>(&self, kind: ElementKind, id: Option<ElementId>, build: F) -> GraphResult<ElementId>
    where
        F: Fn(ElementId) -> Document,
    {
        let collection = self.collection(kind);

        if let Some(id) = id {
            self.store
                .insert_one(collection, build(id))
                .map_err(|e| self.insert_error(kind, id, e))?;
            debug!("Inserted {} {} into {}", kind, id, collection);
            return Ok(id);
        }

        let mut attempt = 0;
        loop {
            let id = self.next_id(kind)?;
            match self.store.insert_one(collection, build(id)) {
                Ok(()) => {
                    debug!("Inserted {} {} into {}", kind, id, collection);
                    return Ok(id);
                }
                Err(StoreError::DuplicateKey { .. }) if attempt < self.config.id_allocation_retries => {
                    attempt += 1;
                    warn!(
                        "Allocated {} id {} was taken concurrently, retrying ({}/{})",
                        kind, id, attempt, self.config.id_allocation_retries
                    );
                }
                Err(e) => return Err(self.insert_error(kind, id, e)),
            }
        }
    }

    fn fetch(&self, kind: ElementKind, id: ElementId) -> GraphResult<Option<Document>> {
        Ok(self
            .store
            .find_one(self.collection(kind), &Filter::eq(fields::ID, id))?)
    }

    /// Vertex by id; a miss is logged and yields `None`
    pub(crate) fn find_vertex(self: &Arc<Self>, id: ElementId) -> GraphResult<Option<Vertex>> {
        match self.fetch(ElementKind::Vertex, id)? {
            Some(raw) => Ok(Some(Vertex::from_document(self.clone(), raw)?)),
            None => {
                warn!("Vertex {} not found in {}", id, self.vertex_collection);
                Ok(None)
            }
        }
    }

    pub(crate) fn find_vertices(self: &Arc<Self>, filter: &Filter) -> GraphResult<Vec<Vertex>> {
        self.store
            .find(&self.vertex_collection, filter, &FindOptions::new())?
            .into_iter()
            .map(|raw| Vertex::from_document(self.clone(), raw))
            .collect()
    }

    pub(crate) fn find_edges(self: &Arc<Self>, filter: &Filter) -> GraphResult<Vec<Edge>> {
        self.store
            .find(&self.edge_collection, filter, &FindOptions::new())?
            .into_iter()
            .map(|raw| Edge::from_document(self.clone(), raw))
            .collect()
    }

    /// Re-fetch a just-inserted document
    fn fetch_inserted(&self, kind: ElementKind, id: ElementId) -> GraphResult<Document> {
        self.fetch(kind, id)?.ok_or(GraphError::NotFound { kind, id })
    }

    pub(crate) fn add_vertex(self: &Arc<Self>, id: Option<ElementId>, label: Option<&str>) -> GraphResult<Vertex> {
        if let Some(label) = label {
            if label.trim().is_empty() {
                return Err(GraphError::invalid("vertex label can not be empty"));
            }
        }

        let id = self.insert(ElementKind::Vertex, id, |id| {
            let doc = Document::new().with(fields::ID, id);
            match label {
                Some(label) => doc.with(fields::LABEL, label),
                None => doc,
            }
        })?;

        let raw = self.fetch_inserted(ElementKind::Vertex, id)?;
        Vertex::from_document(self.clone(), raw)
    }

    pub(crate) fn add_edge(
        self: &Arc<Self>,
        id: Option<ElementId>,
        out_vertex: ElementId,
        in_vertex: ElementId,
        label: &str,
    ) -> GraphResult<Edge> {
        if label.trim().is_empty() {
            return Err(GraphError::invalid("edge label can not be empty"));
        }

        let out_v = self.vertex_ref(out_vertex).to_value();
        let in_v = self.vertex_ref(in_vertex).to_value();
        let id = self.insert(ElementKind::Edge, id, |id| {
            Document::new()
                .with(fields::ID, id)
                .with(fields::LABEL, label)
                .with(fields::OUT_V, out_v.clone())
                .with(fields::IN_V, in_v.clone())
        })?;

        let raw = self.fetch_inserted(ElementKind::Edge, id)?;
        Edge::from_document(self.clone(), raw)
    }
}

/// Capabilities of a graph, for callers that adapt to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Features {
    pub persistent: bool,
    pub supports_explicit_ids: bool,
    pub supports_vertex_labels: bool,
    pub supports_self_loops: bool,
    pub supports_parallel_edges: bool,
    pub supports_edge_retrieval: bool,
    pub supports_element_removal_by_graph: bool,
    pub supports_bulk_retrieval: bool,
    pub supports_query: bool,
    pub supports_key_indices: bool,
    pub supports_transactions: bool,
}

/// Property graph stored as documents in a vertex and an edge collection
#[derive(Clone)]
pub struct GraphStore {
    context: Arc<GraphContext>,
}

impl GraphStore {
    /// Open the backend named in `config` and attach a graph to it
    pub fn open(config: GraphConfig) -> GraphResult<Self> {
        config.validate()?;
        let store = config.backend.open_store()?;
        Self::new(store, config)
    }

    /// Attach a graph to an existing store.
    ///
    /// Creates the unique index on `id` in both collections; the index is kept
    /// for the lifetime of the store.
    pub fn new(store: Arc<dyn DocumentStore>, config: GraphConfig) -> GraphResult<Self> {
        config.validate()?;
        let vertex_collection = config.qualified_vertex_collection();
        let edge_collection = config.qualified_edge_collection();

        store.create_unique_index(&vertex_collection, fields::ID)?;
        store.create_unique_index(&edge_collection, fields::ID)?;

        info!(
            "Opened graph '{}' (vertices: {}, edges: {}, persistent: {})",
            config.database,
            vertex_collection,
            edge_collection,
            store.is_persistent()
        );

        Ok(Self {
            context: Arc::new(GraphContext {
                store,
                config,
                vertex_collection,
                edge_collection,
            }),
        })
    }

    /// Insert a vertex document holding only its id.
    ///
    /// With `None` the id is allocated as the collection's highest id plus one.
    /// An explicit id that is already taken fails with `DuplicateId`.
    pub fn add_vertex(&self, id: Option<ElementId>) -> GraphResult<Vertex> {
        self.context.add_vertex(id, None)
    }

    /// Insert a vertex document holding its id and `label`
    pub fn add_vertex_with_label(&self, id: Option<ElementId>, label: &str) -> GraphResult<Vertex> {
        self.context.add_vertex(id, Some(label))
    }

    /// Insert an edge `out_vertex -> in_vertex`.
    ///
    /// An empty label fails with `InvalidArgument` before anything is written.
    pub fn add_edge(
        &self,
        id: Option<ElementId>,
        out_vertex: &Vertex,
        in_vertex: &Vertex,
        label: &str,
    ) -> GraphResult<Edge> {
        self.context.add_edge(id, out_vertex.id(), in_vertex.id(), label)
    }

    /// Look up a vertex by an integral, numeric or numeric-string id.
    ///
    /// Ids that cannot be coerced and ids with no stored vertex yield `None`.
    pub fn get_vertex(&self, id: impl IntoElementId) -> GraphResult<Option<Vertex>> {
        match id.into_element_id() {
            Some(id) => self.context.find_vertex(id),
            None => {
                warn!("Could not interpret vertex id");
                Ok(None)
            }
        }
    }

    /// The id the next auto-allocated element of `kind` would receive
    pub fn next_id(&self, kind: ElementKind) -> GraphResult<ElementId> {
        self.context.next_id(kind)
    }

    pub fn get_edge(&self, _id: impl IntoElementId) -> GraphResult<Option<Edge>> {
        Err(GraphError::Unimplemented("get_edge"))
    }

    pub fn remove_vertex(&self, _vertex: &Vertex) -> GraphResult<()> {
        Err(GraphError::Unimplemented("remove_vertex"))
    }

    pub fn remove_edge(&self, _edge: &Edge) -> GraphResult<()> {
        Err(GraphError::Unimplemented("remove_edge"))
    }

    pub fn vertices(&self) -> GraphResult<Vec<Vertex>> {
        Err(GraphError::Unimplemented("vertices"))
    }

    pub fn vertices_with(&self, _key: &str, _value: impl Into<crate::document::Value>) -> GraphResult<Vec<Vertex>> {
        Err(GraphError::Unimplemented("vertices_with"))
    }

    pub fn edges(&self) -> GraphResult<Vec<Edge>> {
        Err(GraphError::Unimplemented("edges"))
    }

    pub fn edges_with(&self, _key: &str, _value: impl Into<crate::document::Value>) -> GraphResult<Vec<Edge>> {
        Err(GraphError::Unimplemented("edges_with"))
    }

    pub fn query(&self, _filter: &Filter) -> GraphResult<Vec<Vertex>> {
        Err(GraphError::Unimplemented("query"))
    }

    pub fn create_key_index(&self, _key: &str, _kind: ElementKind) -> GraphResult<()> {
        Err(GraphError::Unimplemented("create_key_index"))
    }

    pub fn drop_key_index(&self, _key: &str, _kind: ElementKind) -> GraphResult<()> {
        Err(GraphError::Unimplemented("drop_key_index"))
    }

    pub fn indexed_keys(&self, _kind: ElementKind) -> GraphResult<HashSet<String>> {
        Err(GraphError::Unimplemented("indexed_keys"))
    }

    pub fn features(&self) -> Features {
        Features {
            persistent: self.context.store.is_persistent(),
            supports_explicit_ids: true,
            supports_vertex_labels: true,
            supports_self_loops: true,
            supports_parallel_edges: true,
            supports_edge_retrieval: false,
            supports_element_removal_by_graph: false,
            supports_bulk_retrieval: false,
            supports_query: false,
            supports_key_indices: false,
            supports_transactions: false,
        }
    }

    /// The underlying document store
    pub fn raw_store(&self) -> &Arc<dyn DocumentStore> {
        &self.context.store
    }

    /// Store-level name of the vertex collection
    pub fn vertex_collection(&self) -> &str {
        &self.context.vertex_collection
    }

    /// Store-level name of the edge collection
    pub fn edge_collection(&self) -> &str {
        &self.context.edge_collection
    }

    pub fn config(&self) -> &GraphConfig {
        &self.context.config
    }

    pub(crate) fn context(&self) -> &Arc<GraphContext> {
        &self.context
    }

    /// Flush pending writes of the backing store
    pub fn shutdown(&self) -> GraphResult<()> {
        self.context.store.flush()?;
        info!("Graph '{}' shut down", self.context.config.database);
        Ok(())
    }
}

impl fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphStore")
            .field("database", &self.context.config.database)
            .field("vertex_collection", &self.context.vertex_collection)
            .field("edge_collection", &self.context.edge_collection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryStore;

    fn graph() -> (Arc<MemoryStore>, GraphStore) {
        let store = Arc::new(MemoryStore::new());
        let graph = GraphStore::new(store.clone(), GraphConfig::new("aviation", "v", "e")).unwrap();
        (store, graph)
    }

    #[test]
    fn test_collections_are_namespaced_and_indexed() {
        let (store, graph) = graph();
        assert_eq!(graph.vertex_collection(), "aviation.v");
        assert_eq!(graph.edge_collection(), "aviation.e");
        assert_eq!(store.unique_indexes("aviation.v").unwrap(), vec!["id".to_string()]);
        assert_eq!(store.unique_indexes("aviation.e").unwrap(), vec!["id".to_string()]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let store = Arc::new(MemoryStore::new());
        let err = GraphStore::new(store, GraphConfig::new("db", "", "e")).unwrap_err();
        assert!(matches!(err, GraphError::InvalidArgument(_)));
    }

    #[test]
    fn test_allocation_starts_at_one() {
        let (_, graph) = graph();
        assert_eq!(graph.next_id(ElementKind::Vertex).unwrap(), ElementId(1));
        let v = graph.add_vertex(None).unwrap();
        assert_eq!(v.id(), ElementId(1));
        assert_eq!(graph.next_id(ElementKind::Vertex).unwrap(), ElementId(2));
        assert_eq!(graph.next_id(ElementKind::Edge).unwrap(), ElementId(1));
    }

    #[test]
    fn test_allocation_follows_max() {
        let (_, graph) = graph();
        for id in [1, 131312, 1231] {
            graph.add_vertex(Some(ElementId(id))).unwrap();
        }
        assert_eq!(graph.add_vertex(None).unwrap().id(), ElementId(131313));
    }

    #[test]
    fn test_vertex_document_holds_only_id() {
        let (store, graph) = graph();
        graph.add_vertex(Some(ElementId(7))).unwrap();
        let raw = store
            .find_one("aviation.v", &Filter::eq("id", 7))
            .unwrap()
            .unwrap();
        assert_eq!(raw.keys().cloned().collect::<Vec<_>>(), vec!["id".to_string()]);
    }

    #[test]
    fn test_edge_document_shape() {
        let (store, graph) = graph();
        let a = graph.add_vertex(None).unwrap();
        let b = graph.add_vertex(None).unwrap();
        graph.add_edge(None, &a, &b, "knows").unwrap();

        let raw = store.find_one("aviation.e", &Filter::All).unwrap().unwrap();
        assert_eq!(raw.get("id"), Some(&crate::document::Value::Integer(1)));
        assert_eq!(raw.get("label").unwrap().as_string(), Some("knows"));
        let out_v = Reference::from_value(raw.get("outV").unwrap()).unwrap();
        assert_eq!(out_v, Reference::new("aviation.v", ElementId(1)));
    }

    #[test]
    fn test_explicit_duplicate_id() {
        let (_, graph) = graph();
        graph.add_vertex(Some(ElementId(3))).unwrap();
        let err = graph.add_vertex(Some(ElementId(3))).unwrap_err();
        match err {
            GraphError::DuplicateId { collection, id } => {
                assert_eq!(collection, "aviation.v");
                assert_eq!(id, ElementId(3));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_vertex_label_rejected() {
        let (store, graph) = graph();
        assert!(matches!(
            graph.add_vertex_with_label(None, " "),
            Err(GraphError::InvalidArgument(_))
        ));
        assert_eq!(store.count("aviation.v", &Filter::All).unwrap(), 0);
    }

    #[test]
    fn test_get_vertex_coercion() {
        let (_, graph) = graph();
        graph.add_vertex(Some(ElementId(12))).unwrap();
        assert!(graph.get_vertex(12).unwrap().is_some());
        assert!(graph.get_vertex("12").unwrap().is_some());
        assert!(graph.get_vertex(12.0).unwrap().is_some());
        assert!(graph.get_vertex("twelve").unwrap().is_none());
        assert!(graph.get_vertex(13).unwrap().is_none());
    }

    #[test]
    fn test_features() {
        let (_, graph) = graph();
        let features = graph.features();
        assert!(!features.persistent);
        assert!(!features.supports_query);
        let json = serde_json::to_value(features).unwrap();
        assert_eq!(json["supports_explicit_ids"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_shutdown_flushes() {
        let (_, graph) = graph();
        graph.add_vertex(None).unwrap();
        assert!(graph.shutdown().is_ok());
    }
}
