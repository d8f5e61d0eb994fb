//! Element capabilities shared by vertices and edges
//!
//! Each handle holds a snapshot of its backing document. Reads are served from
//! the snapshot only; every mutation writes a single field to the store and then
//! reloads the snapshot, so the same handle observes its own writes.

use super::error::{GraphError, GraphResult};
use super::property::{validate_key, validate_property, PropertyMap, PropertyValue, WriteOutcome};
use super::store::GraphContext;
use super::types::{fields, ElementId, ElementKind, Reference};
use crate::document::{Document, FieldPath, Filter, Update};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Snapshot of one vertex or edge document plus the graph it belongs to
#[derive(Clone)]
pub struct ElementState {
    graph: Arc<GraphContext>,
    kind: ElementKind,
    id: ElementId,
    raw: Document,
    properties: PropertyMap,
}

impl ElementState {
    pub(crate) fn from_document(graph: Arc<GraphContext>, kind: ElementKind, raw: Document) -> GraphResult<Self> {
        let (id, properties) = Self::parse(kind, &raw)?;
        Ok(Self {
            graph,
            kind,
            id,
            raw,
            properties,
        })
    }

    fn parse(kind: ElementKind, raw: &Document) -> GraphResult<(ElementId, PropertyMap)> {
        let id = raw
            .get(fields::ID)
            .and_then(|v| v.as_integral())
            .map(ElementId)
            .ok_or_else(|| GraphError::malformed(format!("{} document without integral id: {}", kind, raw)))?;

        let properties = match raw.get(fields::PROPERTIES) {
            None => PropertyMap::new(),
            Some(value) => value
                .as_document()
                .cloned()
                .ok_or_else(|| GraphError::malformed(format!("{} {} has non-document properties", kind, id)))?,
        };

        if kind == ElementKind::Edge {
            if raw.get(fields::LABEL).and_then(|v| v.as_string()).is_none() {
                return Err(GraphError::malformed(format!("edge {} has no label", id)));
            }
            for field in [fields::OUT_V, fields::IN_V] {
                if raw.get(field).and_then(Reference::from_value).is_none() {
                    return Err(GraphError::malformed(format!("edge {} has no valid {} reference", id, field)));
                }
            }
        }

        Ok((id, properties))
    }

    pub(crate) fn graph(&self) -> &Arc<GraphContext> {
        &self.graph
    }

    pub(crate) fn raw(&self) -> &Document {
        &self.raw
    }

    fn collection(&self) -> &str {
        self.graph.collection(self.kind)
    }

    /// Re-fetch the backing document by id and replace the snapshot.
    ///
    /// If the document is gone the snapshot is left as is and `NotFound` is returned.
    pub(crate) fn reload(&mut self) -> GraphResult<()> {
        let filter = Filter::eq(fields::ID, self.id);
        match self.graph.store.find_one(self.collection(), &filter)? {
            Some(raw) => {
                let (_, properties) = Self::parse(self.kind, &raw)?;
                self.raw = raw;
                self.properties = properties;
                Ok(())
            }
            None => {
                warn!("{} {} vanished from {}", self.kind, self.id, self.collection());
                Err(GraphError::NotFound {
                    kind: self.kind,
                    id: self.id,
                })
            }
        }
    }

    /// Apply one targeted update matched against the current snapshot, then reload
    fn write(&mut self, update: Update) -> GraphResult<WriteOutcome> {
        let result = self
            .graph
            .store
            .update_one(self.collection(), &Filter::identity(&self.raw), &update)?;

        self.reload()?;

        if result.matched == 0 {
            warn!(
                "Update of {} on {} {} matched no document",
                update.path(),
                self.kind,
                self.id
            );
            return Err(GraphError::Conflict {
                kind: self.kind,
                id: self.id,
            });
        }

        if result.modified == 0 {
            debug!("{} {}: {} already up to date", self.kind, self.id, update.path());
            Ok(WriteOutcome::Unchanged)
        } else {
            debug!("{} {}: wrote {}", self.kind, self.id, update.path());
            Ok(WriteOutcome::Applied)
        }
    }

    fn set_property(&mut self, key: &str, value: PropertyValue) -> GraphResult<WriteOutcome> {
        validate_property(self.kind, key, &value)?;
        let path = FieldPath::new(fields::PROPERTIES).child(key);
        self.write(Update::Set(path, value))
    }

    fn remove_property(&mut self, key: &str) -> GraphResult<Option<PropertyValue>> {
        validate_key(self.kind, key)?;
        let Some(previous) = self.properties.get(key).cloned() else {
            return Ok(None);
        };
        let path = FieldPath::new(fields::PROPERTIES).child(key);
        self.write(Update::Unset(path))?;
        Ok(Some(previous))
    }

    fn remove(&self) -> GraphResult<()> {
        let result = self
            .graph
            .store
            .delete_one(self.collection(), &Filter::eq(fields::ID, self.id))?;
        if result.deleted == 0 {
            debug!("{} {} was already removed", self.kind, self.id);
        } else {
            debug!("Removed {} {}", self.kind, self.id);
        }
        Ok(())
    }
}

impl fmt::Debug for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementState")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("raw", &self.raw)
            .finish()
    }
}

pub(super) mod sealed {
    use super::ElementState;

    /// Access to the snapshot; implemented only by this crate's handles
    pub trait Sealed {
        fn state(&self) -> &ElementState;

        fn state_mut(&mut self) -> &mut ElementState;
    }
}

/// Operations common to [`Vertex`](super::Vertex) and [`Edge`](super::Edge).
///
/// Equality and hashing of elements are by id only. The trait is sealed:
///
/// ```compile_fail
/// use docgraph::Element;
///
/// struct Detached;
/// impl Element for Detached {}
/// ```
///
/// and the snapshot type is not reachable from outside the crate:
///
/// ```compile_fail
/// use docgraph::graph::element::ElementState;
/// ```
pub trait Element: sealed::Sealed {
    fn kind(&self) -> ElementKind {
        self.state().kind
    }

    fn id(&self) -> ElementId {
        self.state().id
    }

    /// Label from the last loaded snapshot; always present on edges
    fn label(&self) -> Option<&str> {
        self.state().raw.get(fields::LABEL).and_then(|v| v.as_string())
    }

    /// Property value from the last loaded snapshot
    fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.state().properties.get(key)
    }

    fn property_keys(&self) -> HashSet<String> {
        self.state().properties.keys().cloned().collect()
    }

    fn properties(&self) -> &PropertyMap {
        &self.state().properties
    }

    /// Write one property and reload.
    ///
    /// Fails with `InvalidArgument` for empty or reserved keys, `Null` values
    /// and non-finite floats, `Conflict` if the stored document no longer matches the
    /// snapshot, `NotFound` if it was deleted.
    fn set_property(&mut self, key: &str, value: impl Into<PropertyValue>) -> GraphResult<WriteOutcome>
    where
        Self: Sized,
    {
        self.state_mut().set_property(key, value.into())
    }

    /// Remove one property and reload, returning the value it held.
    ///
    /// Absent keys are a no-op returning `None`.
    fn remove_property(&mut self, key: &str) -> GraphResult<Option<PropertyValue>> {
        self.state_mut().remove_property(key)
    }

    /// Delete the backing document. The snapshot is kept.
    fn remove(&self) -> GraphResult<()> {
        self.state().remove()
    }

    fn reload(&mut self) -> GraphResult<()> {
        self.state_mut().reload()
    }

    fn to_json(&self) -> serde_json::Value {
        self.state().raw.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::sealed::Sealed;
    use super::*;
    use crate::document::{DocumentStore, MemoryStore};
    use crate::graph::{GraphStore, Vertex};
    use crate::config::GraphConfig;

    fn graph() -> (Arc<MemoryStore>, GraphStore) {
        let store = Arc::new(MemoryStore::new());
        let graph = GraphStore::new(store.clone(), GraphConfig::default()).unwrap();
        (store, graph)
    }

    #[test]
    fn test_snapshot_reads() {
        let (store, graph) = graph();
        store
            .insert_one(
                graph.vertex_collection(),
                Document::new()
                    .with("id", 1)
                    .with("properties", Document::new().with("key1", "val1").with("key2", "val2")),
            )
            .unwrap();

        let vertex: Vertex = graph.get_vertex(1).unwrap().unwrap();
        assert_eq!(vertex.property("key1").unwrap().as_string(), Some("val1"));
        assert_eq!(
            vertex.property_keys(),
            HashSet::from(["key1".to_string(), "key2".to_string()])
        );
        assert!(vertex.property("missing").is_none());
    }

    #[test]
    fn test_snapshot_is_not_live() {
        let (store, graph) = graph();
        let mut vertex = graph.add_vertex(None).unwrap();

        store
            .update_one(
                graph.vertex_collection(),
                &Filter::eq("id", vertex.id()),
                &Update::set("properties.key1", "val4"),
            )
            .unwrap();
        assert!(vertex.property("key1").is_none());

        vertex.reload().unwrap();
        assert_eq!(vertex.property("key1").unwrap().as_string(), Some("val4"));
    }

    #[test]
    fn test_malformed_documents() {
        let (store, graph) = graph();
        store
            .insert_one(graph.vertex_collection(), Document::new().with("id", "abc").with("x", 1))
            .unwrap();
        let raw = store.find_one(graph.vertex_collection(), &Filter::eq("x", 1)).unwrap().unwrap();
        let err = ElementState::from_document(graph.context().clone(), ElementKind::Vertex, raw).unwrap_err();
        assert!(matches!(err, GraphError::MalformedDocument(_)));

        let edge = Document::new().with("id", 1).with("label", "knows");
        let err = ElementState::from_document(graph.context().clone(), ElementKind::Edge, edge).unwrap_err();
        assert!(matches!(err, GraphError::MalformedDocument(_)));
    }

    #[test]
    fn test_debug_omits_graph() {
        let (_, graph) = graph();
        let vertex = graph.add_vertex(Some(ElementId(5))).unwrap();
        let rendered = format!("{:?}", vertex.state());
        assert!(rendered.contains("Vertex"));
        assert!(rendered.contains("5"));
    }
}
