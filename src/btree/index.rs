use log::info;

use super::tree::BTree;
use crate::{
    config::DEFAULT_BTREE_DEGREE,
    index::{IndexKey, Indexer, RowId, RowKeys},
    row_store::RowStore,
};

/// Row index backed by a [`BTree`] mapping each key to a single row id.
///
/// The tree keeps one row per key: the lowest live row id carrying it. Other rows with the
/// same key are only recorded in the key-by-row-id list. Deleting the owner hands the key
/// over to the next lowest row, found by scanning that list.
#[derive(Debug)]
pub struct BTreeIndex<K> {
    tree: BTree<K, RowId>,
    keys: RowKeys<K>,
}

impl<K: IndexKey> BTreeIndex<K> {
    pub fn new() -> Self {
        Self::with_degree(DEFAULT_BTREE_DEGREE)
    }

    pub fn with_degree(degree: usize) -> Self {
        Self {
            tree: BTree::with_degree(degree),
            keys: RowKeys::with_capacity(0),
        }
    }

    /// Bulk-builds the index from a row store snapshot with the default degree.
    pub fn build<V>(store: &RowStore<K, V>) -> Self {
        Self::build_with_degree(store, DEFAULT_BTREE_DEGREE)
    }

    pub fn build_with_degree<V>(store: &RowStore<K, V>, degree: usize) -> Self {
        let mut index = Self {
            tree: BTree::with_degree(degree),
            keys: RowKeys::with_capacity(store.len()),
        };
        for (row_id, key) in store.keys().enumerate() {
            index.insert(key.clone(), row_id);
        }

        info!(
            "btree index built: {} rows, {} keys, height {}",
            index.keys.live(),
            index.tree.len(),
            index.tree.height()
        );
        index
    }

    /// The underlying tree, for inspection.
    pub fn tree(&self) -> &BTree<K, RowId> {
        &self.tree
    }
}

impl<K: IndexKey> Default for BTreeIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: IndexKey> Indexer<K> for BTreeIndex<K> {
    fn look_up(&self, key: &K) -> Vec<RowId> {
        self.tree.look_up(key).copied().into_iter().collect()
    }

    fn insert(&mut self, key: K, row_id: RowId) {
        if self.keys.get(row_id).is_some() {
            self.delete(row_id);
        }
        self.keys.set(row_id, key.clone());

        match self.tree.look_up_mut(&key) {
            Some(owner) => *owner = (*owner).min(row_id),
            None => {
                self.tree.insert(key, row_id);
            }
        }
    }

    fn delete(&mut self, row_id: RowId) -> bool {
        let Some(key) = self.keys.take(row_id) else {
            return false;
        };
        // Rows shadowed by the owner never made it into the tree.
        if self.tree.look_up(&key) != Some(&row_id) {
            return true;
        }

        match self.keys.first_row_of(&key) {
            Some(next) => {
                if let Some(owner) = self.tree.look_up_mut(&key) {
                    *owner = next;
                }
            }
            None => {
                self.tree.delete(&key);
            }
        }
        true
    }

    fn update(&mut self, row_id: RowId, key: K) {
        self.insert(key, row_id);
    }

    fn len(&self) -> usize {
        self.keys.live()
    }

    fn name(&self) -> &'static str {
        "btree"
    }
}
