use log::info;

use crate::{
    index::{IndexKey, Indexer, RowId, RowKeys},
    row_store::RowStore,
};

/// Baseline "index" that scans every row on each look-up.
///
/// Used as the correctness oracle and timing reference for the real indexes.
#[derive(Debug)]
pub struct LinearScan<K> {
    keys: RowKeys<K>,
}

impl<K: IndexKey> LinearScan<K> {
    pub fn new() -> Self {
        Self {
            keys: RowKeys::with_capacity(0),
        }
    }

    pub fn build<V>(store: &RowStore<K, V>) -> Self {
        let mut keys = RowKeys::with_capacity(store.len());
        for (row_id, key) in store.keys().enumerate() {
            keys.set(row_id, key.clone());
        }
        info!("linear scan built: {} rows", keys.live());

        Self { keys }
    }

    /// Size of the row-id space, deleted rows included.
    pub fn row_space(&self) -> usize {
        self.keys.row_space()
    }
}

impl<K: IndexKey> Default for LinearScan<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: IndexKey> Indexer<K> for LinearScan<K> {
    fn look_up(&self, key: &K) -> Vec<RowId> {
        self.keys
            .iter()
            .filter(|(_, stored)| *stored == key)
            .map(|(row_id, _)| row_id)
            .collect()
    }

    fn insert(&mut self, key: K, row_id: RowId) {
        self.keys.set(row_id, key);
    }

    fn delete(&mut self, row_id: RowId) -> bool {
        self.keys.take(row_id).is_some()
    }

    fn update(&mut self, row_id: RowId, key: K) {
        self.keys.set(row_id, key);
    }

    fn len(&self) -> usize {
        self.keys.live()
    }

    fn name(&self) -> &'static str {
        "scan"
    }
}
