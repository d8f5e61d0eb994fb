//! Graph configuration
//!
//! Names the database and the two collections holding vertices and edges, and
//! selects the document store backend. Loadable from YAML:
//!
//! ```yaml
//! database: aviation
//! vertex_collection: vertices
//! edge_collection: edges
//! id_allocation_retries: 3
//! backend:
//!   type: memory
//! ```

use crate::document::{DocumentStore, MemoryStore};
use crate::graph::{GraphError, GraphResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] GraphError),
}

/// Which document store backs the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Process-local store, lost on drop
    Memory,
    /// RocksDB directory (requires the `persistence` feature)
    #[serde(rename = "rocksdb")]
    RocksDb { path: PathBuf },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Memory
    }
}

impl BackendConfig {
    /// Open the configured store
    pub fn open_store(&self) -> GraphResult<Arc<dyn DocumentStore>> {
        match self {
            BackendConfig::Memory => Ok(Arc::new(MemoryStore::new())),
            #[cfg(feature = "persistence")]
            BackendConfig::RocksDb { path } => {
                Ok(Arc::new(crate::document::RocksStore::open(path)?))
            }
            #[cfg(not(feature = "persistence"))]
            BackendConfig::RocksDb { path } => Err(GraphError::Store(crate::document::StoreError::Backend(format!(
                "cannot open {:?}: built without the `persistence` feature",
                path
            )))),
        }
    }
}

/// Graph configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Database name; namespaces both collections
    pub database: String,
    /// Collection holding vertex documents
    pub vertex_collection: String,
    /// Collection holding edge documents
    pub edge_collection: String,
    /// How many times auto id allocation re-scans after losing an insert race
    pub id_allocation_retries: u32,
    pub backend: BackendConfig,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            database: "graph".to_string(),
            vertex_collection: "vertices".to_string(),
            edge_collection: "edges".to_string(),
            id_allocation_retries: 3,
            backend: BackendConfig::Memory,
        }
    }
}

impl GraphConfig {
    pub fn new(
        database: impl Into<String>,
        vertex_collection: impl Into<String>,
        edge_collection: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            vertex_collection: vertex_collection.into(),
            edge_collection: edge_collection.into(),
            ..Self::default()
        }
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_id_allocation_retries(mut self, retries: u32) -> Self {
        self.id_allocation_retries = retries;
        self
    }

    /// Database, vertex and edge collection names must be non-empty, and the
    /// two collections must differ
    pub fn validate(&self) -> GraphResult<()> {
        if self.database.trim().is_empty()
            || self.vertex_collection.trim().is_empty()
            || self.edge_collection.trim().is_empty()
        {
            return Err(GraphError::InvalidArgument(
                "edge collection, vertex collection and database name can not be empty".to_string(),
            ));
        }
        if self.vertex_collection == self.edge_collection {
            return Err(GraphError::InvalidArgument(format!(
                "vertex and edge collections must differ (both '{}')",
                self.vertex_collection
            )));
        }
        Ok(())
    }

    /// Store-level name of the vertex collection
    pub fn qualified_vertex_collection(&self) -> String {
        format!("{}.{}", self.database, self.vertex_collection)
    }

    /// Store-level name of the edge collection
    pub fn qualified_edge_collection(&self) -> String {
        format!("{}.{}", self.database, self.edge_collection)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: GraphConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
