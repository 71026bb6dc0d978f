use log::info;

use super::table::HashTable;
use crate::{
    config::{DEFAULT_HASH_CAPACITY, DEFAULT_LOAD_FACTOR},
    index::{IndexKey, Indexer, RowId, RowKeys},
    row_store::RowStore,
};

/// Row index backed by a chained [`HashTable`].
///
/// Keeps its own key-by-row-id list so that a delete by row id can find the bucket to clean.
#[derive(Debug)]
pub struct HashIndex<K> {
    table: HashTable<K>,
    keys: RowKeys<K>,
}

impl<K: IndexKey> HashIndex<K> {
    pub fn new() -> Self {
        Self::with_capacity_and_load_factor(DEFAULT_HASH_CAPACITY, DEFAULT_LOAD_FACTOR)
    }

    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f64) -> Self {
        Self {
            table: HashTable::with_capacity_and_load_factor(capacity, load_factor),
            keys: RowKeys::with_capacity(0),
        }
    }

    /// Bulk-builds the index from a row store snapshot with the default table settings.
    pub fn build<V>(store: &RowStore<K, V>) -> Self {
        Self::build_with(store, DEFAULT_HASH_CAPACITY, DEFAULT_LOAD_FACTOR)
    }

    pub fn build_with<V>(store: &RowStore<K, V>, capacity: usize, load_factor: f64) -> Self {
        let mut index = Self {
            table: HashTable::with_capacity_and_load_factor(capacity, load_factor),
            keys: RowKeys::with_capacity(store.len()),
        };
        for (row_id, key) in store.keys().enumerate() {
            index.keys.set(row_id, key.clone());
            index.table.put(key.clone(), row_id);
        }

        info!(
            "hash index built: {} rows, {} buckets after {} resizes",
            index.table.len(),
            index.table.capacity(),
            index.table.resize_count()
        );
        index
    }

    /// The underlying table, for inspection.
    pub fn table(&self) -> &HashTable<K> {
        &self.table
    }
}

impl<K: IndexKey> Default for HashIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: IndexKey> Indexer<K> for HashIndex<K> {
    fn look_up(&self, key: &K) -> Vec<RowId> {
        // The table answers by hash; drop colliding keys.
        let mut row_ids: Vec<RowId> = self
            .table
            .get(key)
            .into_iter()
            .filter(|(stored, _)| *stored == key)
            .map(|(_, row_id)| row_id)
            .collect();
        row_ids.sort_unstable();
        row_ids
    }

    fn insert(&mut self, key: K, row_id: RowId) {
        if let Some(old) = self.keys.take(row_id) {
            self.table.remove(&old, row_id);
        }
        self.keys.set(row_id, key.clone());
        self.table.put(key, row_id);
    }

    fn delete(&mut self, row_id: RowId) -> bool {
        match self.keys.take(row_id) {
            Some(key) => self.table.remove(&key, row_id),
            None => false,
        }
    }

    fn update(&mut self, row_id: RowId, key: K) {
        if self.keys.get(row_id) == Some(&key) {
            return;
        }
        self.insert(key, row_id);
    }

    fn len(&self) -> usize {
        self.keys.live()
    }

    fn name(&self) -> &'static str {
        "hash"
    }
}
