use anyhow::{Context, Result};
use docgraph::{Direction, Element, GraphConfig, GraphStore};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("docgraph=info".parse()?),
        )
        .init();

    println!("docgraph v{}", docgraph::version());
    println!("==========================================");
    println!();

    // Optional YAML config as the first argument
    let config = match std::env::args().nth(1) {
        Some(path) => GraphConfig::from_file(&path).with_context(|| format!("loading config {}", path))?,
        None => GraphConfig::default(),
    };

    let graph = GraphStore::open(config).context("opening graph")?;
    demo_aviation_graph(&graph)?;
    graph.shutdown()?;
    Ok(())
}

fn demo_aviation_graph(graph: &GraphStore) -> Result<()> {
    println!("=== Aviation Graph ===");

    let mut pilot = graph.add_vertex_with_label(None, "pilot")?;
    pilot.set_property("name", "Amelia")?;
    let mut plane = graph.add_vertex_with_label(None, "plane")?;
    plane.set_property("model", "Electra")?;
    let mut mechanic = graph.add_vertex_with_label(None, "mechanic")?;
    mechanic.set_property("name", "Joe")?;
    println!("✓ Created vertices {}, {}, {}", pilot.id(), plane.id(), mechanic.id());

    let mut flies = graph.add_edge(None, &pilot, &plane, "flies")?;
    flies.set_property("hours", 1200i64)?;
    graph.add_edge(None, &mechanic, &plane, "maintains")?;
    pilot.add_edge("knows", &mechanic)?;
    println!("✓ pilot -[flies]-> plane, mechanic -[maintains]-> plane, pilot -[knows]-> mechanic");

    println!("\nEdges into the plane:");
    for edge in plane.edges(Direction::In, &["flies", "maintains"])? {
        let tail = edge.out_vertex()?;
        println!(
            "  {} from {}",
            edge.label(),
            tail.as_ref().and_then(|v| v.label()).unwrap_or("?")
        );
    }

    println!("\nNeighbors of the mechanic:");
    for vertex in mechanic.vertices(Direction::Both, &[])? {
        println!("  {}", vertex.to_json());
    }

    println!("\nFeatures: {}", serde_json::to_string_pretty(&graph.features())?);
    Ok(())
}
