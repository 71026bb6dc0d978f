use std::{
    collections::hash_map::DefaultHasher,
    fmt::{self, Debug},
    hash::{Hash, Hasher},
    mem,
};

use log::debug;

use crate::{
    config::{DEFAULT_HASH_CAPACITY, DEFAULT_LOAD_FACTOR},
    index::RowId,
};

/// A link of a bucket chain.
#[derive(Debug)]
struct ChainNode<K> {
    hash: u64,
    key: K,
    row_id: RowId,
    next: Option<Box<ChainNode<K>>>,
}

/// Separate-chaining hash table from keys to row ids.
///
/// Nodes sharing a hash code are kept next to each other in their bucket's chain: a new
/// node is linked right after the first node with the same hash, or appended to the chain
/// when there is none. Lookups return that whole group, so keys that merely collide on the
/// hash are part of the answer and callers must compare keys themselves.
///
/// The bucket count is always a power of two. It doubles once the number of nodes reaches
/// `capacity * load_factor` after a put. After a removal it halves when
/// `size - 1 < capacity * load_factor / 2`, but only while the capacity is above the one the
/// table was created with: that initial capacity is the floor.
pub struct HashTable<K> {
    buckets: Vec<Option<Box<ChainNode<K>>>>,
    size: usize,
    load_factor: f64,
    min_capacity: usize,
    resizes: usize,
}

impl<K: Hash> HashTable<K> {
    /// Creates a table with 16 buckets and a 0.75 load factor.
    pub fn new() -> Self {
        Self::with_capacity_and_load_factor(DEFAULT_HASH_CAPACITY, DEFAULT_LOAD_FACTOR)
    }

    /// # Panics
    ///
    /// Panics if `capacity` is not a power of two or `load_factor` is outside `(0, 1]`.
    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f64) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "Capacity must be a power of two"
        );
        assert!(
            load_factor > 0.0 && load_factor <= 1.0,
            "Load factor must be within (0, 1]"
        );

        Self {
            buckets: empty_buckets(capacity),
            size: 0,
            load_factor,
            min_capacity: capacity,
            resizes: 0,
        }
    }

    /// Spreads the high bits of the key's hash into the low bits used for bucket selection.
    pub fn hash_code(key: &K) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let h = hasher.finish();
        h ^ (h >> 16)
    }

    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// How many times the bucket array has been grown or shrunk.
    pub fn resize_count(&self) -> usize {
        self.resizes
    }

    /// Adds a `key -> row_id` node, growing the table when it gets too loaded.
    pub fn put(&mut self, key: K, row_id: RowId) {
        let node = Box::new(ChainNode {
            hash: Self::hash_code(&key),
            key,
            row_id,
            next: None,
        });
        self.link(node);

        self.size += 1;
        if self.size as f64 >= self.capacity() as f64 * self.load_factor {
            self.resize(self.capacity() * 2);
        }
    }

    /// The `(key, row_id)` pairs whose hash equals the hash of `key`, in chain order.
    pub fn get(&self, key: &K) -> Vec<(&K, RowId)> {
        let hash = Self::hash_code(key);
        let mut cursor = self.buckets[self.index_for(hash)].as_deref();

        while let Some(node) = cursor {
            if node.hash == hash {
                break;
            }
            cursor = node.next.as_deref();
        }

        let mut group = Vec::new();
        while let Some(node) = cursor.filter(|node| node.hash == hash) {
            group.push((&node.key, node.row_id));
            cursor = node.next.as_deref();
        }
        group
    }

    /// Unlinks the node of `row_id` from the hash group of `key`, shrinking the table when it
    /// gets too sparse. Returns `false` if no such node exists.
    pub fn remove(&mut self, key: &K, row_id: RowId) -> bool {
        let hash = Self::hash_code(key);
        let index = self.index_for(hash);

        let Some(position) = self.position_of(index, hash, row_id) else {
            return false;
        };

        // Rewires either the bucket head or the predecessor's link.
        let cursor = self.link_at(index, position);
        if let Some(mut node) = cursor.take() {
            *cursor = node.next.take();
        }

        self.size -= 1;
        // Shrink rule, floored at the initial capacity.
        let capacity = self.capacity();
        if capacity > self.min_capacity
            && (self.size as f64) - 1.0 < capacity as f64 * self.load_factor / 2.0
        {
            self.resize(capacity / 2);
        }

        true
    }
}

// Methods for internal usecases.
impl<K: Hash> HashTable<K> {
    fn index_for(&self, hash: u64) -> usize {
        (hash & (self.capacity() as u64 - 1)) as usize
    }

    /// Position within bucket `index` of the node for `row_id` inside the `hash` group.
    fn position_of(&self, index: usize, hash: u64, row_id: RowId) -> Option<usize> {
        let mut cursor = self.buckets[index].as_deref();
        let mut position = 0;
        let mut in_group = false;

        while let Some(node) = cursor {
            if node.hash == hash {
                if node.row_id == row_id {
                    return Some(position);
                }
                in_group = true;
            } else if in_group {
                // The group is contiguous, nothing further down can match.
                return None;
            }
            position += 1;
            cursor = node.next.as_deref();
        }
        None
    }

    /// Position in bucket `index` where a node with `hash` goes: right after the first node
    /// of its group, or at the end of the chain.
    fn insert_position(&self, index: usize, hash: u64) -> usize {
        let mut cursor = self.buckets[index].as_deref();
        let mut position = 0;

        while let Some(node) = cursor {
            position += 1;
            if node.hash == hash {
                break;
            }
            cursor = node.next.as_deref();
        }
        position
    }

    /// The link slot at `position` in bucket `index`: the bucket head for 0, else the
    /// `next` of the node before it.
    fn link_at(&mut self, index: usize, position: usize) -> &mut Option<Box<ChainNode<K>>> {
        let mut cursor = &mut self.buckets[index];
        for _ in 0..position {
            cursor = &mut cursor
                .as_mut()
                .unwrap_or_else(|| panic!("bucket {index} chain shorter than {position}"))
                .next;
        }
        cursor
    }

    /// Links `node` into its bucket without touching the size or checking the load.
    fn link(&mut self, mut node: Box<ChainNode<K>>) {
        let index = self.index_for(node.hash);
        let position = self.insert_position(index, node.hash);

        let cursor = self.link_at(index, position);
        node.next = cursor.take();
        *cursor = Some(node);
    }

    /// Moves every node into a fresh bucket array of `capacity` buckets.
    fn resize(&mut self, capacity: usize) {
        let old = mem::replace(&mut self.buckets, empty_buckets(capacity));
        for mut chain in old {
            while let Some(mut node) = chain {
                chain = node.next.take();
                self.link(node);
            }
        }

        self.resizes += 1;
        debug!(
            "hash table resized to {} buckets holding {} nodes",
            capacity, self.size
        );
    }
}

impl<K: Hash> Default for HashTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Debug> fmt::Display for HashTable<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, bucket) in self.buckets.iter().enumerate() {
            write!(f, "Bucket {index:2}:")?;
            let mut cursor = bucket.as_deref();
            while let Some(node) = cursor {
                write!(f, " [{:?}]({})({})", node.key, node.hash, node.row_id)?;
                cursor = node.next.as_deref();
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<K: Debug> Debug for HashTable<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashTable")
            .field("capacity", &self.buckets.len())
            .field("size", &self.size)
            .field("load_factor", &self.load_factor)
            .finish()
    }
}

impl<K> Drop for HashTable<K> {
    // Unlink chains iteratively so long chains cannot overflow the stack.
    fn drop(&mut self) {
        for bucket in self.buckets.iter_mut() {
            let mut chain = bucket.take();
            while let Some(mut node) = chain {
                chain = node.next.take();
            }
        }
    }
}

fn empty_buckets<K>(capacity: usize) -> Vec<Option<Box<ChainNode<K>>>> {
    let mut buckets = Vec::with_capacity(capacity);
    buckets.resize_with(capacity, || None);
    buckets
}
