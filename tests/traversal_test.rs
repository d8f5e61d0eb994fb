use docgraph::document::{DocumentStore, Filter, MemoryStore};
use docgraph::{Direction, Edge, Element, ElementId, GraphConfig, GraphError, GraphStore, Vertex};
use std::sync::Arc;

/// pilot(1) -flies-> plane(2), mechanic(3) -maintains-> plane(2), pilot(1) -knows-> mechanic(3)
struct Aviation {
    store: Arc<MemoryStore>,
    graph: GraphStore,
    pilot: Vertex,
    plane: Vertex,
    mechanic: Vertex,
    flies: Edge,
}

fn aviation() -> Aviation {
    let store = Arc::new(MemoryStore::new());
    let graph = GraphStore::new(store.clone(), GraphConfig::new("aviation", "vertices", "edges")).unwrap();

    let pilot = graph.add_vertex_with_label(Some(ElementId(1)), "pilot").unwrap();
    let plane = graph.add_vertex_with_label(Some(ElementId(2)), "plane").unwrap();
    let mechanic = graph.add_vertex_with_label(Some(ElementId(3)), "mechanic").unwrap();

    let flies = graph.add_edge(None, &pilot, &plane, "flies").unwrap();
    graph.add_edge(None, &mechanic, &plane, "maintains").unwrap();
    graph.add_edge(None, &pilot, &mechanic, "knows").unwrap();

    Aviation {
        store,
        graph,
        pilot,
        plane,
        mechanic,
        flies,
    }
}

fn labels(edges: &[Edge]) -> Vec<String> {
    edges.iter().map(|e| e.label().to_string()).collect()
}

fn vertex_labels(vertices: &[Vertex]) -> Vec<String> {
    vertices
        .iter()
        .map(|v| v.label().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_out_edges() {
    let g = aviation();
    let edges = g.pilot.edges(Direction::Out, &["flies", "maintains"]).unwrap();
    assert_eq!(labels(&edges), vec!["flies"]);
    assert_eq!(edges[0], g.flies);
}

#[test]
fn test_in_edges() {
    let g = aviation();
    let edges = g.plane.edges(Direction::In, &["flies", "maintains"]).unwrap();
    assert_eq!(labels(&edges), vec!["flies", "maintains"]);
}

#[test]
fn test_both_edges() {
    let g = aviation();
    let edges = g
        .mechanic
        .edges(Direction::Both, &["flies", "maintains", "knows"])
        .unwrap();
    assert_eq!(labels(&edges), vec!["maintains", "knows"]);
}

#[test]
fn test_label_filter_restricts() {
    let g = aviation();
    assert_eq!(labels(&g.pilot.edges(Direction::Out, &["knows"]).unwrap()), vec!["knows"]);
    assert!(g.pilot.edges(Direction::Out, &["unknown"]).unwrap().is_empty());
    assert!(g.plane.edges(Direction::Out, &["flies"]).unwrap().is_empty());
}

#[test]
fn test_empty_label_set_matches_all() {
    let g = aviation();
    assert_eq!(labels(&g.pilot.edges(Direction::Out, &[]).unwrap()), vec!["flies", "knows"]);
    assert_eq!(
        labels(&g.mechanic.edges(Direction::Both, &[]).unwrap()),
        vec!["maintains", "knows"]
    );
    assert_eq!(vertex_labels(&g.plane.vertices(Direction::Out, &[]).unwrap()), vec!["pilot", "mechanic"]);
}

#[test]
fn test_out_neighbors_of_plane() {
    let g = aviation();
    let neighbors = g.plane.vertices(Direction::Out, &["flies", "maintains"]).unwrap();
    assert_eq!(neighbors, vec![g.pilot.clone(), g.mechanic.clone()]);
    assert!(!neighbors.contains(&g.plane));
}

#[test]
fn test_in_neighbors_of_pilot() {
    let g = aviation();
    let neighbors = g.pilot.vertices(Direction::In, &["flies", "knows"]).unwrap();
    assert_eq!(vertex_labels(&neighbors), vec!["plane", "mechanic"]);

    let only_flies = g.pilot.vertices(Direction::In, &["flies"]).unwrap();
    assert_eq!(only_flies, vec![g.plane.clone()]);
}

#[test]
fn test_both_neighbors_exclude_self() {
    let g = aviation();
    let neighbors = g.mechanic.vertices(Direction::Both, &["maintains", "knows"]).unwrap();
    assert_eq!(vertex_labels(&neighbors), vec!["pilot", "plane"]);
    assert!(!neighbors.contains(&g.mechanic));
}

#[test]
fn test_no_neighbors() {
    let g = aviation();
    assert!(g.pilot.vertices(Direction::Out, &[]).unwrap().is_empty());
    assert!(g.plane.vertices(Direction::In, &[]).unwrap().is_empty());
}

#[test]
fn test_parallel_edges_yield_neighbor_once() {
    let g = aviation();
    g.graph.add_edge(None, &g.pilot, &g.plane, "flies").unwrap();

    assert_eq!(g.plane.edges(Direction::In, &["flies"]).unwrap().len(), 2);
    assert_eq!(g.plane.vertices(Direction::Out, &["flies"]).unwrap(), vec![g.pilot.clone()]);
    assert_eq!(g.pilot.vertices(Direction::Both, &["flies"]).unwrap(), vec![g.plane.clone()]);
}

#[test]
fn test_each_call_is_a_fresh_query() {
    let g = aviation();
    let first = g.plane.edges(Direction::In, &[]).unwrap();
    let second = g.plane.edges(Direction::In, &[]).unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);

    g.graph.add_edge(None, &g.mechanic, &g.plane, "inspects").unwrap();
    assert_eq!(g.plane.edges(Direction::In, &[]).unwrap().len(), 3);
    assert_eq!(first.len(), 2);
}

#[test]
fn test_edge_endpoints() {
    let g = aviation();
    assert_eq!(g.flies.vertex(Direction::Out).unwrap(), Some(g.pilot.clone()));
    assert_eq!(g.flies.vertex(Direction::In).unwrap(), Some(g.plane.clone()));
    assert!(matches!(g.flies.vertex(Direction::Both), Err(GraphError::Unsupported(_))));

    for edge in g.mechanic.edges(Direction::Both, &[]).unwrap() {
        assert!(matches!(edge.vertex(Direction::Both), Err(GraphError::Unsupported(_))));
    }
}

#[test]
fn test_dangling_references_are_tolerated() {
    let g = aviation();
    g.plane.remove().unwrap();

    assert_eq!(g.flies.in_vertex().unwrap(), None);
    assert_eq!(g.flies.out_vertex().unwrap(), Some(g.pilot.clone()));

    // edges survive the vertex; neighbor lookup skips the missing vertex
    assert_eq!(labels(&g.pilot.edges(Direction::Out, &[]).unwrap()), vec!["flies", "knows"]);
    assert_eq!(vertex_labels(&g.pilot.vertices(Direction::In, &[]).unwrap()), vec!["mechanic"]);
}

#[test]
fn test_traversal_reads_current_edges() {
    let g = aviation();
    let flies_id = g.flies.id();
    g.store
        .delete_one(g.graph.edge_collection(), &Filter::eq("id", flies_id))
        .unwrap();

    assert!(g.pilot.edges(Direction::Out, &["flies"]).unwrap().is_empty());
    assert!(g.plane.vertices(Direction::Out, &["flies"]).unwrap().is_empty());
}

#[test]
fn test_graphs_do_not_share_adjacency() {
    let g = aviation();
    let other = GraphStore::new(g.store.clone(), GraphConfig::new("training", "vertices", "edges")).unwrap();
    let student = other.add_vertex(Some(ElementId(1))).unwrap();
    let trainer = other.add_vertex(Some(ElementId(2))).unwrap();
    other.add_edge(None, &student, &trainer, "flies").unwrap();

    assert_eq!(g.pilot.edges(Direction::Out, &["flies"]).unwrap().len(), 1);
    assert_eq!(student.edges(Direction::Out, &[]).unwrap().len(), 1);
    assert_eq!(trainer.vertices(Direction::Out, &[]).unwrap(), vec![student]);
}
