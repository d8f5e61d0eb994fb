//! In-memory document store

use super::{
    check_unique, DeleteResult, Document, DocumentStore, Filter, FindOptions, StoreError,
    StoreResult, Update, UpdateResult,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct Collection {
    /// Insertion sequence -> document
    documents: BTreeMap<u64, Document>,
    next_seq: u64,
    unique: Vec<String>,
}

impl Collection {
    fn first_match(&self, filter: &Filter) -> Option<u64> {
        self.documents
            .iter()
            .find(|(_, doc)| filter.matches(doc))
            .map(|(seq, _)| *seq)
    }
}

/// Document store held entirely in process memory.
///
/// Each operation takes the store lock once, so single-document writes are
/// atomic with respect to each other.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<String, Collection>>> {
        self.collections
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<String, Collection>>> {
        self.collections
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    /// Names of collections that have been touched
    pub fn collection_names(&self) -> StoreResult<Vec<String>> {
        let mut names: Vec<String> = self.read()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

impl DocumentStore for MemoryStore {
    fn create_unique_index(&self, collection: &str, field: &str) -> StoreResult<()> {
        let mut collections = self.write()?;
        let coll = collections.entry(collection.to_string()).or_default();
        if coll.unique.iter().any(|f| f == field) {
            return Ok(());
        }

        let index = [field.to_string()];
        let docs: Vec<&Document> = coll.documents.values().collect();
        for (i, doc) in docs.iter().enumerate() {
            check_unique(collection, &index, doc, docs[i + 1..].iter().copied())?;
        }

        coll.unique.push(field.to_string());
        debug!("Created unique index on {}.{}", collection, field);
        Ok(())
    }

    fn unique_indexes(&self, collection: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .read()?
            .get(collection)
            .map(|c| c.unique.clone())
            .unwrap_or_default())
    }

    fn insert_one(&self, collection: &str, document: Document) -> StoreResult<()> {
        let mut collections = self.write()?;
        let coll = collections.entry(collection.to_string()).or_default();
        check_unique(collection, &coll.unique, &document, coll.documents.values())?;

        let seq = coll.next_seq;
        coll.next_seq += 1;
        coll.documents.insert(seq, document);
        Ok(())
    }

    fn find(&self, collection: &str, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Document>> {
        let collections = self.read()?;
        Ok(match collections.get(collection) {
            Some(coll) => options.apply(coll.documents.values(), filter),
            None => Vec::new(),
        })
    }

    fn update_one(&self, collection: &str, filter: &Filter, update: &Update) -> StoreResult<UpdateResult> {
        let mut collections = self.write()?;
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(UpdateResult::default());
        };
        let Some(seq) = coll.first_match(filter) else {
            return Ok(UpdateResult::default());
        };

        let mut updated = coll.documents[&seq].clone();
        if !update.apply(&mut updated) {
            return Ok(UpdateResult { matched: 1, modified: 0 });
        }

        let others = coll
            .documents
            .iter()
            .filter(|(other, _)| **other != seq)
            .map(|(_, doc)| doc);
        check_unique(collection, &coll.unique, &updated, others)?;

        coll.documents.insert(seq, updated);
        Ok(UpdateResult { matched: 1, modified: 1 })
    }

    fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<DeleteResult> {
        let mut collections = self.write()?;
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(DeleteResult::default());
        };
        match coll.first_match(filter) {
            Some(seq) => {
                coll.documents.remove(&seq);
                Ok(DeleteResult { deleted: 1 })
            }
            None => Ok(DeleteResult::default()),
        }
    }
}
