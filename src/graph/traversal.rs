//! Adjacency queries over the edge collection
//!
//! Adjacency is not stored on vertices. Every traversal builds a filter over the
//! edge collection from the vertex's reference, the direction and the requested
//! labels, and runs it as a fresh point-in-time query.
//!
//! An empty label set matches edges of any label.

use super::error::{GraphError, GraphResult};
use super::types::{fields, Direction, ElementId, Reference};
use crate::document::{Document, Filter};
use rustc_hash::FxHashSet;

fn label_clause(labels: &[&str]) -> Filter {
    if labels.is_empty() {
        Filter::All
    } else {
        Filter::is_in(fields::LABEL, labels.iter().copied())
    }
}

/// `field == this AND label IN labels`
fn endpoint_filter(field: &str, this: &Reference, labels: &[&str]) -> Filter {
    Filter::eq(field, this.to_value()).and(label_clause(labels))
}

/// Edges incident to `this` in `direction`:
/// OUT matches `outV`, IN matches `inV`, BOTH matches either.
pub(crate) fn edge_filter(this: &Reference, direction: Direction, labels: &[&str]) -> Filter {
    match direction {
        Direction::Out => endpoint_filter(fields::OUT_V, this, labels),
        Direction::In => endpoint_filter(fields::IN_V, this, labels),
        Direction::Both => Filter::or(vec![
            endpoint_filter(fields::OUT_V, this, labels),
            endpoint_filter(fields::IN_V, this, labels),
        ]),
    }
}

/// Edges used to find neighbors of `this` in `direction`.
///
/// This is the direction-swapped counterpart of [`edge_filter`]: OUT neighbors
/// come from edges whose `inV` is `this`, IN neighbors from edges whose `outV`
/// is `this`.
pub(crate) fn neighbor_edge_filter(this: &Reference, direction: Direction, labels: &[&str]) -> Filter {
    edge_filter(this, direction.opposite(), labels)
}

fn endpoint_id(edge: &Document, field: &str) -> GraphResult<ElementId> {
    edge.get(field)
        .and_then(Reference::from_value)
        .map(|reference| reference.id)
        .ok_or_else(|| GraphError::malformed(format!("edge document without valid {}: {}", field, edge)))
}

/// The endpoint of `edge` opposite the field matched by [`neighbor_edge_filter`].
///
/// For BOTH, whichever endpoint differs from `this` by value; a self-loop
/// yields `this`.
pub(crate) fn neighbor_id(edge: &Document, direction: Direction, this: ElementId) -> GraphResult<ElementId> {
    match direction {
        Direction::Out => endpoint_id(edge, fields::OUT_V),
        Direction::In => endpoint_id(edge, fields::IN_V),
        Direction::Both => {
            let in_v = endpoint_id(edge, fields::IN_V)?;
            if in_v != this {
                Ok(in_v)
            } else {
                endpoint_id(edge, fields::OUT_V)
            }
        }
    }
}

/// Distinct neighbor ids over all matched edges, in ascending order
pub(crate) fn neighbor_ids(edges: &[Document], direction: Direction, this: ElementId) -> GraphResult<Vec<ElementId>> {
    let mut seen = FxHashSet::default();
    for edge in edges {
        seen.insert(neighbor_id(edge, direction, this)?);
    }
    let mut ids: Vec<ElementId> = seen.into_iter().collect();
    ids.sort();
    Ok(ids)
}

/// Vertices whose id is in `ids`
pub(crate) fn vertex_id_filter(ids: &[ElementId]) -> Filter {
    Filter::is_in(fields::ID, ids.iter().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    const V: &str = "g.vertices";

    fn edge(id: i64, label: &str, out_v: i64, in_v: i64) -> Document {
        Document::new()
            .with("id", id)
            .with("label", label)
            .with("outV", Reference::new(V, ElementId(out_v)).to_value())
            .with("inV", Reference::new(V, ElementId(in_v)).to_value())
    }

    fn fixture() -> Vec<Document> {
        vec![
            edge(1, "flies", 1, 2),
            edge(2, "maintains", 3, 2),
            edge(3, "knows", 1, 3),
        ]
    }

    fn matching_labels(filter: &Filter) -> Vec<String> {
        fixture()
            .iter()
            .filter(|e| filter.matches(e))
            .map(|e| e.get("label").unwrap().as_string().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_out_filter() {
        let pilot = Reference::new(V, ElementId(1));
        let f = edge_filter(&pilot, Direction::Out, &["flies", "maintains"]);
        assert_eq!(matching_labels(&f), vec!["flies"]);
    }

    #[test]
    fn test_in_filter() {
        let plane = Reference::new(V, ElementId(2));
        let f = edge_filter(&plane, Direction::In, &["flies", "maintains"]);
        assert_eq!(matching_labels(&f), vec!["flies", "maintains"]);
    }

    #[test]
    fn test_both_filter() {
        let mechanic = Reference::new(V, ElementId(3));
        let f = edge_filter(&mechanic, Direction::Both, &["flies", "maintains", "knows"]);
        assert_eq!(matching_labels(&f), vec!["maintains", "knows"]);
    }

    #[test]
    fn test_empty_labels_match_all() {
        let pilot = Reference::new(V, ElementId(1));
        let f = edge_filter(&pilot, Direction::Out, &[]);
        assert_eq!(matching_labels(&f), vec!["flies", "knows"]);
    }

    #[test]
    fn test_reference_collection_must_match() {
        let elsewhere = Reference::new("other.vertices", ElementId(1));
        let f = edge_filter(&elsewhere, Direction::Out, &[]);
        assert!(matching_labels(&f).is_empty());
    }

    #[test]
    fn test_neighbor_filter_is_swapped() {
        let plane = Reference::new(V, ElementId(2));
        let f = neighbor_edge_filter(&plane, Direction::Out, &["flies", "maintains"]);
        assert_eq!(matching_labels(&f), vec!["flies", "maintains"]);

        let matched: Vec<Document> = fixture().into_iter().filter(|e| f.matches(e)).collect();
        let ids = neighbor_ids(&matched, Direction::Out, ElementId(2)).unwrap();
        assert_eq!(ids, vec![ElementId(1), ElementId(3)]);
    }

    #[test]
    fn test_both_neighbor_compares_by_value() {
        let e = edge(1, "knows", 1, 3);
        assert_eq!(neighbor_id(&e, Direction::Both, ElementId(1)).unwrap(), ElementId(3));
        assert_eq!(neighbor_id(&e, Direction::Both, ElementId(3)).unwrap(), ElementId(1));

        let self_loop = edge(2, "knows", 4, 4);
        assert_eq!(neighbor_id(&self_loop, Direction::Both, ElementId(4)).unwrap(), ElementId(4));
    }

    #[test]
    fn test_parallel_edges_yield_one_neighbor() {
        let edges = vec![edge(1, "flies", 1, 2), edge(2, "flies", 1, 2)];
        let ids = neighbor_ids(&edges, Direction::In, ElementId(1)).unwrap();
        assert_eq!(ids, vec![ElementId(2)]);
    }

    #[test]
    fn test_malformed_edge() {
        let broken = Document::new().with("id", 9).with("label", "x");
        assert!(matches!(
            neighbor_id(&broken, Direction::Out, ElementId(1)),
            Err(GraphError::MalformedDocument(_))
        ));
    }
}
