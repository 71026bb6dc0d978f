use crate::error::{Error, Result};

/// Maximum number of children of a B-tree node; a node splits once it holds this many entries.
pub const DEFAULT_BTREE_DEGREE: usize = 4;

/// Smallest degree that still leaves both halves of a split non-empty.
pub const MIN_BTREE_DEGREE: usize = 3;

/// Number of buckets a fresh hash table starts with.
pub const DEFAULT_HASH_CAPACITY: usize = 16;

/// Ratio of stored nodes to buckets that triggers a hash table resize.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// Tuning knobs shared by the index builders.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
    pub btree_degree: usize,
    pub hash_capacity: usize,
    pub hash_load_factor: f64,
}

impl IndexConfig {
    /// Checks that every knob is in its legal range.
    pub fn validate(&self) -> Result<()> {
        if self.btree_degree < MIN_BTREE_DEGREE {
            return Err(Error::Config(format!(
                "btree degree must be at least {MIN_BTREE_DEGREE}, got {}",
                self.btree_degree
            )));
        }
        if !self.hash_capacity.is_power_of_two() {
            return Err(Error::Config(format!(
                "hash capacity must be a power of two, got {}",
                self.hash_capacity
            )));
        }
        if !(self.hash_load_factor > 0.0 && self.hash_load_factor <= 1.0) {
            return Err(Error::Config(format!(
                "hash load factor must be within (0, 1], got {}",
                self.hash_load_factor
            )));
        }
        Ok(())
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            btree_degree: DEFAULT_BTREE_DEGREE,
            hash_capacity: DEFAULT_HASH_CAPACITY,
            hash_load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}
