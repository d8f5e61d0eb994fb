//! Schema-less document store
//!
//! The graph layer keeps vertices and edges as documents in two collections and
//! talks to the backing store only through [`DocumentStore`]:
//! - insert one document
//! - find by filter (equality, membership, and/or, sort, limit)
//! - update one document (single-field set/unset)
//! - delete one document
//! - create a unique index on a field
//!
//! Two backends are provided: [`MemoryStore`] and, with the `persistence`
//! feature, the RocksDB-backed `RocksStore`.

pub mod filter;
pub mod memory;
#[cfg(feature = "persistence")]
pub mod rocks;
pub mod update;
pub mod value;

pub use filter::{Filter, FindOptions, SortOrder, SortSpec};
pub use memory::MemoryStore;
#[cfg(feature = "persistence")]
pub use rocks::RocksStore;
pub use update::Update;
pub use value::{Document, FieldPath, Value};

use thiserror::Error;

/// Document store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique index rejected the write
    #[error("Duplicate key in {collection}: {field} = {value}")]
    DuplicateKey {
        collection: String,
        field: String,
        value: String,
    },

    /// Serialization error
    #[cfg(feature = "persistence")]
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// RocksDB error
    #[cfg(feature = "persistence")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure
    #[error("Backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of [`DocumentStore::update_one`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateResult {
    /// Documents that matched the filter (0 or 1)
    pub matched: u64,
    /// Documents whose content actually changed
    pub modified: u64,
}

/// Outcome of [`DocumentStore::delete_one`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteResult {
    pub deleted: u64,
}

/// Collaborator contract for the backing document store.
///
/// Collections are created implicitly on first use. Documents are returned in
/// insertion order unless a sort is requested.
pub trait DocumentStore: Send + Sync {
    /// Enforce uniqueness of `field` across the collection.
    ///
    /// Idempotent. Fails if existing documents already violate it.
    fn create_unique_index(&self, collection: &str, field: &str) -> StoreResult<()>;

    /// Fields with a unique index on the collection
    fn unique_indexes(&self, collection: &str) -> StoreResult<Vec<String>>;

    fn insert_one(&self, collection: &str, document: Document) -> StoreResult<()>;

    fn find(&self, collection: &str, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Document>>;

    fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let mut found = self.find(collection, filter, &FindOptions::new().limit(1))?;
        Ok(if found.is_empty() { None } else { Some(found.swap_remove(0)) })
    }

    /// Apply `update` to the first document matching `filter`
    fn update_one(&self, collection: &str, filter: &Filter, update: &Update) -> StoreResult<UpdateResult>;

    /// Delete the first document matching `filter`
    fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<DeleteResult>;

    fn count(&self, collection: &str, filter: &Filter) -> StoreResult<usize> {
        Ok(self.find(collection, filter, &FindOptions::new())?.len())
    }

    /// Make all writes durable
    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }

    /// Whether data survives the process
    fn is_persistent(&self) -> bool {
        false
    }
}

/// Check `candidate` against the unique indexes of a collection.
///
/// `others` must not include the stored version of `candidate` itself.
/// A missing field indexes as `Null`.
pub(crate) fn check_unique<'a>(
    collection: &str,
    unique: &[String],
    candidate: &Document,
    others: impl IntoIterator<Item = &'a Document> + Clone,
) -> StoreResult<()> {
    for field in unique {
        let path = FieldPath::from(field.as_str());
        let value = candidate.get_path(&path).unwrap_or(&Value::Null);
        let clash = others
            .clone()
            .into_iter()
            .any(|other| other.get_path(&path).unwrap_or(&Value::Null).loose_eq(value));
        if clash {
            return Err(StoreError::DuplicateKey {
                collection: collection.to_string(),
                field: field.clone(),
                value: value.to_string(),
            });
        }
    }
    Ok(())
}
