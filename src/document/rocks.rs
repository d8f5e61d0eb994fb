//! RocksDB document store
//!
//! Documents are bincode-encoded into the `documents` column family under
//! `{collection}\0{seq:016x}` keys. Per-collection sequence counters and unique
//! index definitions live in the `meta` column family.

use super::{
    check_unique, DeleteResult, Document, DocumentStore, Filter, FindOptions, StoreError,
    StoreResult, Update, UpdateResult,
};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Options, WriteBatch, DB};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const DOCUMENTS_CF: &str = "documents";
const META_CF: &str = "meta";

/// RocksDB-based persistent document store
pub struct RocksStore {
    db: DB,
    /// Serializes read-check-write sequences (unique checks, sequence allocation)
    write_lock: Mutex<()>,
    path: PathBuf,
}

impl RocksStore {
    /// Open or create a store at `path`
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        info!("Opening document store at: {:?}", path);

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_wal_recovery_mode(rocksdb::DBRecoveryMode::PointInTime);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new("default", Options::default()),
            ColumnFamilyDescriptor::new(DOCUMENTS_CF, Self::documents_cf_options()),
            ColumnFamilyDescriptor::new(META_CF, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, &path, cf_descriptors)?;
        info!("Document store opened successfully");

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn documents_cf_options() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf(&self, name: &str) -> StoreResult<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("missing column family {}", name)))
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Backend("document store lock poisoned".to_string()))
    }

    fn collection_prefix(collection: &str) -> Vec<u8> {
        format!("{}\0", collection).into_bytes()
    }

    fn document_key(collection: &str, seq: u64) -> Vec<u8> {
        format!("{}\0{:016x}", collection, seq).into_bytes()
    }

    fn sequence_key(collection: &str) -> Vec<u8> {
        format!("seq\0{}", collection).into_bytes()
    }

    fn unique_key(collection: &str) -> Vec<u8> {
        format!("unique\0{}", collection).into_bytes()
    }

    /// All documents of a collection in key (insertion) order
    fn scan(&self, collection: &str) -> StoreResult<Vec<(Vec<u8>, Document)>> {
        let cf = self.cf(DOCUMENTS_CF)?;
        let prefix = Self::collection_prefix(collection);
        let mut documents = Vec::new();

        for item in self.db.prefix_iterator_cf(&cf, &prefix) {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            let document: Document = bincode::deserialize(&value)?;
            documents.push((key.to_vec(), document));
        }

        Ok(documents)
    }

    fn next_sequence(&self, collection: &str) -> StoreResult<u64> {
        let cf = self.cf(META_CF)?;
        match self.db.get_cf(&cf, Self::sequence_key(collection))? {
            Some(raw) => Ok(bincode::deserialize(&raw)?),
            None => Ok(0),
        }
    }

    fn load_unique(&self, collection: &str) -> StoreResult<Vec<String>> {
        let cf = self.cf(META_CF)?;
        match self.db.get_cf(&cf, Self::unique_key(collection))? {
            Some(raw) => Ok(bincode::deserialize(&raw)?),
            None => Ok(Vec::new()),
        }
    }
}

impl DocumentStore for RocksStore {
    fn create_unique_index(&self, collection: &str, field: &str) -> StoreResult<()> {
        let _guard = self.lock()?;
        let mut unique = self.load_unique(collection)?;
        if unique.iter().any(|f| f == field) {
            return Ok(());
        }

        let index = [field.to_string()];
        let documents = self.scan(collection)?;
        for (i, (_, doc)) in documents.iter().enumerate() {
            check_unique(collection, &index, doc, documents[i + 1..].iter().map(|(_, d)| d))?;
        }

        unique.push(field.to_string());
        let cf = self.cf(META_CF)?;
        self.db
            .put_cf(&cf, Self::unique_key(collection), bincode::serialize(&unique)?)?;

        debug!("Created unique index on {}.{}", collection, field);
        Ok(())
    }

    fn unique_indexes(&self, collection: &str) -> StoreResult<Vec<String>> {
        self.load_unique(collection)
    }

    fn insert_one(&self, collection: &str, document: Document) -> StoreResult<()> {
        let _guard = self.lock()?;
        let unique = self.load_unique(collection)?;
        if !unique.is_empty() {
            let existing = self.scan(collection)?;
            check_unique(collection, &unique, &document, existing.iter().map(|(_, d)| d))?;
        }

        let seq = self.next_sequence(collection)?;
        let documents = self.cf(DOCUMENTS_CF)?;
        let meta = self.cf(META_CF)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&documents, Self::document_key(collection, seq), bincode::serialize(&document)?);
        batch.put_cf(&meta, Self::sequence_key(collection), bincode::serialize(&(seq + 1))?);
        self.db.write(batch)?;

        debug!("Inserted document {} into {}", seq, collection);
        Ok(())
    }

    fn find(&self, collection: &str, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Document>> {
        let documents = self.scan(collection)?;
        Ok(options.apply(documents.iter().map(|(_, d)| d), filter))
    }

    fn update_one(&self, collection: &str, filter: &Filter, update: &Update) -> StoreResult<UpdateResult> {
        let _guard = self.lock()?;
        let documents = self.scan(collection)?;
        let Some(position) = documents.iter().position(|(_, d)| filter.matches(d)) else {
            return Ok(UpdateResult::default());
        };

        let (key, current) = &documents[position];
        let mut updated = current.clone();
        if !update.apply(&mut updated) {
            return Ok(UpdateResult { matched: 1, modified: 0 });
        }

        let unique = self.load_unique(collection)?;
        let others = documents
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != position)
            .map(|(_, (_, d))| d);
        check_unique(collection, &unique, &updated, others)?;

        let cf = self.cf(DOCUMENTS_CF)?;
        self.db.put_cf(&cf, key, bincode::serialize(&updated)?)?;
        Ok(UpdateResult { matched: 1, modified: 1 })
    }

    fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<DeleteResult> {
        let _guard = self.lock()?;
        let documents = self.scan(collection)?;
        match documents.iter().find(|(_, d)| filter.matches(d)) {
            Some((key, _)) => {
                let cf = self.cf(DOCUMENTS_CF)?;
                self.db.delete_cf(&cf, key)?;
                debug!("Deleted document from {}", collection);
                Ok(DeleteResult { deleted: 1 })
            }
            None => Ok(DeleteResult::default()),
        }
    }

    fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        debug!("Flushed document store to disk");
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{SortOrder, Value};
    use tempfile::TempDir;

    #[test]
    fn test_store_open() {
        let temp_dir = TempDir::new().unwrap();
        let store = RocksStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.path(), temp_dir.path());
        assert!(store.is_persistent());
    }

    #[test]
    fn test_insert_find_update_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = RocksStore::open(temp_dir.path()).unwrap();

        store.insert_one("v", Document::new().with("id", 1)).unwrap();
        store.insert_one("v", Document::new().with("id", 2)).unwrap();

        let result = store
            .update_one("v", &Filter::eq("id", 2), &Update::set("properties.name", "plane"))
            .unwrap();
        assert_eq!(result, UpdateResult { matched: 1, modified: 1 });

        let plane = store.find_one("v", &Filter::eq("id", 2)).unwrap().unwrap();
        assert_eq!(
            plane.get_path(&"properties.name".into()),
            Some(&Value::from("plane"))
        );

        assert_eq!(store.delete_one("v", &Filter::eq("id", 1)).unwrap().deleted, 1);
        assert_eq!(store.count("v", &Filter::All).unwrap(), 1);
    }

    #[test]
    fn test_collections_do_not_leak_into_each_other() {
        let temp_dir = TempDir::new().unwrap();
        let store = RocksStore::open(temp_dir.path()).unwrap();

        store.insert_one("g.v", Document::new().with("id", 1)).unwrap();
        store.insert_one("g.vx", Document::new().with("id", 1)).unwrap();

        assert_eq!(store.count("g.v", &Filter::All).unwrap(), 1);
        assert_eq!(store.count("g.vx", &Filter::All).unwrap(), 1);
    }

    #[test]
    fn test_unique_index_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = RocksStore::open(temp_dir.path()).unwrap();
            store.create_unique_index("v", "id").unwrap();
            store.insert_one("v", Document::new().with("id", 10)).unwrap();
            store.flush().unwrap();
        }

        let store = RocksStore::open(temp_dir.path()).unwrap();
        assert_eq!(store.unique_indexes("v").unwrap(), vec!["id".to_string()]);
        assert!(matches!(
            store.insert_one("v", Document::new().with("id", 10)),
            Err(StoreError::DuplicateKey { .. })
        ));

        store.insert_one("v", Document::new().with("id", 11)).unwrap();
        let top = store
            .find("v", &Filter::All, &FindOptions::new().sort("id", SortOrder::Descending).limit(1))
            .unwrap();
        assert_eq!(top[0].get("id"), Some(&Value::Integer(11)));
    }
}
