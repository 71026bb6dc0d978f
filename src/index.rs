use std::{fmt::Debug, hash::Hash};

/// Position of a row inside the row store.
pub type RowId = usize;

/// Anything usable as an index key: ordered for the B-tree, hashable for the hash table.
pub trait IndexKey: Ord + Hash + Clone + Debug {}

impl<T: Ord + Hash + Clone + Debug> IndexKey for T {}

/// Common contract of every index built over a row store.
///
/// Absence is never an error: `look_up` of an unknown key returns an empty vector and
/// `delete` of an unknown row returns `false`.
pub trait Indexer<K: IndexKey> {
    /// Row ids carrying `key`, ascending.
    fn look_up(&self, key: &K) -> Vec<RowId>;

    /// Registers `row_id` as carrying `key`.
    ///
    /// A row id beyond the current row space extends it, a vacant (deleted) slot is
    /// reused, and an occupied slot is moved to `key` as if by `update`.
    fn insert(&mut self, key: K, row_id: RowId);

    /// Forgets `row_id`. Returns `false` when the row is unknown or already deleted.
    fn delete(&mut self, row_id: RowId) -> bool;

    /// Moves `row_id` to `key`.
    fn update(&mut self, row_id: RowId, key: K);

    /// Number of live rows tracked by the index.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name used in reports.
    fn name(&self) -> &'static str;
}

/// Key-by-row-id record kept by indexes that must resolve a row id back to its key.
///
/// Deleted rows leave a `None` hole so row ids stay position-stable.
#[derive(Debug, Clone)]
pub(crate) struct RowKeys<K> {
    slots: Vec<Option<K>>,
    live: usize,
}

impl<K: IndexKey> RowKeys<K> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            live: 0,
        }
    }

    pub(crate) fn get(&self, row_id: RowId) -> Option<&K> {
        self.slots.get(row_id).and_then(Option::as_ref)
    }

    /// Stores `key` at `row_id`, growing the row space with holes when needed.
    /// Returns the key previously stored there.
    pub(crate) fn set(&mut self, row_id: RowId, key: K) -> Option<K> {
        if row_id >= self.slots.len() {
            self.slots.resize(row_id + 1, None);
        }
        let old = self.slots[row_id].replace(key);
        if old.is_none() {
            self.live += 1;
        }
        old
    }

    pub(crate) fn take(&mut self, row_id: RowId) -> Option<K> {
        let old = self.slots.get_mut(row_id).and_then(Option::take);
        if old.is_some() {
            self.live -= 1;
        }
        old
    }

    /// Lowest live row id carrying `key`.
    pub(crate) fn first_row_of(&self, key: &K) -> Option<RowId> {
        self.iter()
            .find(|(_, stored)| *stored == key)
            .map(|(row_id, _)| row_id)
    }

    /// Size of the row space, holes included.
    pub(crate) fn row_space(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn live(&self) -> usize {
        self.live
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (RowId, &K)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(row_id, key)| key.as_ref().map(|key| (row_id, key)))
    }
}
