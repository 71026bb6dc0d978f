//! In-memory Row Indexes
//!
//! This library provides alternative index structures over a flat, append-only row store. Each one maps a record key to the row ids holding that key and trades build cost, memory, and look-up cost differently.
//!
//! # Modules
//!
//! - `btree`: Balanced multiway search tree with split-on-insert and rebalance-on-delete. Keeps the lowest live row per key.
//! - `hash`: Chained hash table with dynamic resizing.
//! - `bitmap`: One packed bit-vector per distinct key over the row-id space.
//! - `linear_scan`: Baseline that scans every row; the correctness oracle.
//! - `row_store`: The row store itself and its `key,value` file format.
//! - `generator`: Synthetic row stores.
//! - `harness`: Builds every index over a snapshot and compares them against the baseline.
//!
//! # Examples
//!
//! ```rust
//! use rowindex::{BitmapIndex, HashIndex, Indexer, RowStore};
//!
//! let store: RowStore<u32, &str> = vec![(1, "A"), (2, "B"), (1, "C")].into_iter().collect();
//!
//! let mut hash = HashIndex::build(&store);
//! let bitmap = BitmapIndex::build(&store);
//!
//! assert_eq!(hash.look_up(&1), vec![0, 2]);
//! assert_eq!(bitmap.look_up(&1), vec![0, 2]);
//!
//! hash.delete(0);
//! assert_eq!(hash.look_up(&1), vec![2]);
//! ```
//!
//! Indexes are independent: each one is built once from a snapshot and then mutated on its own.
//! Nothing keeps several indexes consistent with each other.
//!
//! # Testing
//!
//! ```bash
//! $ cargo test
//! ```

pub mod bitmap;
pub mod btree;
pub mod config;
pub mod error;
pub mod generator;
pub mod harness;
pub mod hash;
pub mod index;
pub mod linear_scan;
pub mod row_store;

pub use bitmap::BitmapIndex;
pub use btree::{BTree, BTreeIndex};
pub use config::IndexConfig;
pub use error::{Error, InvariantViolation, Result};
pub use hash::HashIndex;
pub use index::{IndexKey, Indexer, RowId};
pub use linear_scan::LinearScan;
pub use row_store::{Row, RowStore};


/// Test modules for `hash` module.
#[cfg(test)]
mod hash_tests;
