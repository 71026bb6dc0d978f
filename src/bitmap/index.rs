use std::collections::HashMap;

use log::{debug, info};

use super::bits::{word_count, Bitmap, WORD_SIZE};
use crate::{
    index::{IndexKey, Indexer, RowId, RowKeys},
    row_store::RowStore,
};

/// Row index keeping one [`Bitmap`] per distinct key.
///
/// All bitmaps of an index share the same cardinality and number of words. When a new row id crosses the
/// last allocated word, every bitmap is extended by the missing words before the new bit
/// is set. A key whose bitmap runs empty is dropped.
#[derive(Debug)]
pub struct BitmapIndex<K> {
    bitmaps: HashMap<K, Bitmap>,
    keys: RowKeys<K>,
    rows: usize,
}

impl<K: IndexKey> BitmapIndex<K> {
    pub fn new() -> Self {
        Self {
            bitmaps: HashMap::new(),
            keys: RowKeys::with_capacity(0),
            rows: 0,
        }
    }

    /// Bulk-builds the index from a row store snapshot in a single pass.
    pub fn build<V>(store: &RowStore<K, V>) -> Self {
        let rows = store.len();
        let mut index = Self {
            bitmaps: HashMap::new(),
            keys: RowKeys::with_capacity(rows),
            rows,
        };

        for (row_id, key) in store.keys().enumerate() {
            index.keys.set(row_id, key.clone());
            index
                .bitmaps
                .entry(key.clone())
                .or_insert_with(|| Bitmap::new(rows))
                .set_bit(row_id);
        }

        info!(
            "bitmap index built: {} rows, {} distinct keys, {} words per bitmap",
            rows,
            index.bitmaps.len(),
            word_count(rows)
        );
        index
    }

    /// Bitmap of `key`, if the key is currently carried by any row.
    pub fn bitmap(&self, key: &K) -> Option<&Bitmap> {
        self.bitmaps.get(key)
    }

    pub fn distinct_keys(&self) -> usize {
        self.bitmaps.len()
    }

    /// Size of the row-id space the bitmaps cover.
    pub fn row_space(&self) -> usize {
        self.rows
    }

    /// Words allocated per bitmap.
    pub fn words_per_bitmap(&self) -> usize {
        word_count(self.rows)
    }

    /// Extends the row space to `size` rows. Every bitmap takes the new cardinality and gains
    /// words when a word boundary is crossed.
    fn ensure_row_space(&mut self, size: usize) {
        if size <= self.rows {
            return;
        }
        for bitmap in self.bitmaps.values_mut() {
            bitmap.resize(size);
        }
        if size > word_count(self.rows) * WORD_SIZE {
            debug!(
                "bitmap index grew {} bitmaps to {} words",
                self.bitmaps.len(),
                word_count(size)
            );
        }
        self.rows = size;
    }

    /// ORs the flag of `row_id` into the bitmap of `key`, creating it on first sight.
    fn set_row(&mut self, key: K, row_id: RowId) {
        let flag = Bitmap::flag(self.rows, row_id);
        let bitmap = match self.bitmaps.get(&key) {
            Some(bitmap) => bitmap | &flag,
            None => flag,
        };
        self.bitmaps.insert(key, bitmap);
    }

    /// Clears `row_id` from the bitmap of `key` with `bitmap & !flag`.
    fn clear_row(&mut self, key: &K, row_id: RowId) {
        let flag = Bitmap::flag(self.rows, row_id);
        if let Some(bitmap) = self.bitmaps.get_mut(key) {
            *bitmap = &*bitmap & &!&flag;
            if bitmap.is_empty() {
                self.drop_key(key);
            }
        }
    }

    fn drop_key(&mut self, key: &K) {
        self.bitmaps.remove(key);
        debug!("bitmap index dropped empty bitmap of {key:?}");
    }
}

impl<K: IndexKey> Default for BitmapIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: IndexKey> Indexer<K> for BitmapIndex<K> {
    fn look_up(&self, key: &K) -> Vec<RowId> {
        self.bitmaps
            .get(key)
            .map(Bitmap::row_ids)
            .unwrap_or_default()
    }

    fn insert(&mut self, key: K, row_id: RowId) {
        if let Some(old) = self.keys.take(row_id) {
            self.clear_row(&old, row_id);
        }
        self.keys.set(row_id, key.clone());
        self.ensure_row_space(row_id + 1);
        self.set_row(key, row_id);
    }

    fn delete(&mut self, row_id: RowId) -> bool {
        let Some(key) = self.keys.take(row_id) else {
            return false;
        };

        let flag = Bitmap::flag(self.rows, row_id);
        if let Some(bitmap) = self.bitmaps.get_mut(&key) {
            *bitmap = &*bitmap ^ &flag;
            if bitmap.is_empty() {
                self.drop_key(&key);
            }
        }
        true
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
        "bitmap"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_groups_rows_by_key() {
        let store: RowStore<u32, &str> = vec![(1, "A"), (2, "B"), (1, "C")].into_iter().collect();
        let index = BitmapIndex::build(&store);

        assert_eq!(index.look_up(&1), vec![0, 2]);
        assert_eq!(index.look_up(&2), vec![1]);
        assert!(index.look_up(&3).is_empty());
        assert_eq!(index.distinct_keys(), 2);
        assert_eq!(index.words_per_bitmap(), 1);
    }

    #[test]
    fn deleting_last_row_drops_the_key() {
        let store: RowStore<String, ()> = (0..40)
            .map(|row| {
                let key = if row == 5 { "k".to_string() } else { format!("v{}", row % 4) };
                (key, ())
            })
            .collect();
        let mut index = BitmapIndex::build(&store);
        let k = "k".to_string();

        assert_eq!(index.look_up(&k), vec![5]);
        assert!(index.delete(5));
        assert!(index.bitmap(&k).is_none());
        assert!(index.look_up(&k).is_empty());
        assert!(!index.delete(5));

        // Other keys keep their rows.
        assert_eq!(index.look_up(&"v1".to_string()), vec![1, 9, 13, 17, 21, 25, 29, 33, 37]);
    }

    #[test]
    fn appending_across_word_boundary_grows_every_bitmap() {
        let store: RowStore<u8, ()> = (0..32).map(|row| ((row % 2) as u8, ())).collect();
        let mut index = BitmapIndex::build(&store);
        assert_eq!(index.words_per_bitmap(), 1);

        index.insert(7, 32);
        assert_eq!(index.row_space(), 33);
        assert_eq!(index.words_per_bitmap(), 2);
        for key in [0, 1, 7] {
            assert_eq!(index.bitmap(&key).map(Bitmap::word_count), Some(2));
        }
        assert_eq!(index.look_up(&7), vec![32]);
        assert_eq!(index.look_up(&1).len(), 16);

        // Still inside the second word: no further growth.
        index.insert(0, 33);
        assert_eq!(index.words_per_bitmap(), 2);
        assert_eq!(index.look_up(&0).last(), Some(&33));
    }

    #[test]
    fn growth_inside_a_word_keeps_cardinality_uniform() {
        let store: RowStore<u8, ()> = (0..10).map(|row| ((row % 3) as u8, ())).collect();
        let mut index = BitmapIndex::build(&store);

        index.insert(5, 12);
        assert_eq!(index.row_space(), 13);
        assert_eq!(index.words_per_bitmap(), 1);
        for key in [0, 1, 2, 5] {
            let bitmap = index.bitmap(&key).unwrap();
            assert_eq!(bitmap.cardinality(), 13, "key {key}");
            assert_eq!(bitmap.word_count(), 1, "key {key}");
        }

        index.insert(1, 40);
        for key in [0, 1, 2, 5] {
            assert_eq!(index.bitmap(&key).map(Bitmap::cardinality), Some(41), "key {key}");
        }
    }

    #[test]
    fn update_moves_row_between_bitmaps() {
        let mut index = BitmapIndex::new();
        index.insert("a", 0);
        index.insert("b", 1);

        index.update(0, "b");
        assert!(index.bitmap(&"a").is_none());
        assert_eq!(index.look_up(&"b"), vec![0, 1]);

        index.update(1, "c");
        assert_eq!(index.look_up(&"b"), vec![0]);
        assert_eq!(index.look_up(&"c"), vec![1]);
        assert_eq!(index.len(), 2);
    }
}
