//! Builds every index over one row store snapshot and compares them against the linear scan.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use log::{info, warn};

use crate::{
    bitmap::BitmapIndex,
    btree::BTreeIndex,
    config::IndexConfig,
    hash::HashIndex,
    index::{IndexKey, Indexer, RowId},
    linear_scan::LinearScan,
    row_store::RowStore,
};

/// Which index structure to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    BTree,
    Hash,
    Bitmap,
    Scan,
}

impl IndexKind {
    pub const ALL: [IndexKind; 4] = [
        IndexKind::Scan,
        IndexKind::BTree,
        IndexKind::Hash,
        IndexKind::Bitmap,
    ];

    /// Bulk-builds this kind of index over `store`.
    pub fn build<K: IndexKey + 'static, V>(
        self,
        store: &RowStore<K, V>,
        config: &IndexConfig,
    ) -> Box<dyn Indexer<K>> {
        match self {
            IndexKind::BTree => Box::new(BTreeIndex::build_with_degree(store, config.btree_degree)),
            IndexKind::Hash => Box::new(HashIndex::build_with(
                store,
                config.hash_capacity,
                config.hash_load_factor,
            )),
            IndexKind::Bitmap => Box::new(BitmapIndex::build(store)),
            IndexKind::Scan => Box::new(LinearScan::build(store)),
        }
    }
}

/// Timings and answers of one index.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub index: &'static str,
    pub build: Duration,
    pub look_up: Duration,
    pub row_ids: Vec<RowId>,
    /// Look-up answer equals the linear scan's.
    pub agrees: bool,
    /// Look-up was not slower than the linear scan.
    pub not_slower: bool,
    /// Insert then delete of a fresh row left the answer as it was.
    pub round_trip: bool,
}

/// Outcome of a full benchmark run.
#[derive(Debug, Clone)]
pub struct Report {
    pub started_at: DateTime<Local>,
    pub rows: usize,
    pub baseline: Measurement,
    pub indexes: Vec<Measurement>,
}

impl Report {
    /// True when every index agreed with the baseline and survived its round trip.
    pub fn is_consistent(&self) -> bool {
        self.indexes
            .iter()
            .all(|measurement| measurement.agrees && measurement.round_trip)
    }
}

/// Builds every index over `store`, times the look-up of `key` and checks each answer
/// against the linear scan.
pub fn run<K: IndexKey + 'static, V>(
    store: &RowStore<K, V>,
    key: &K,
    config: &IndexConfig,
) -> Report {
    let started_at = Local::now();

    let mut baseline = measure(IndexKind::Scan, store, key, config);
    baseline.agrees = true;
    baseline.not_slower = true;

    let indexes: Vec<Measurement> = IndexKind::ALL
        .into_iter()
        .filter(|kind| *kind != IndexKind::Scan)
        .map(|kind| {
            let mut measurement = measure(kind, store, key, config);
            measurement.agrees = agrees(kind, &measurement.row_ids, &baseline.row_ids);
            measurement.not_slower = measurement.look_up <= baseline.look_up;
            if !measurement.not_slower {
                warn!(
                    "{} look-up took {:?}, slower than the linear scan's {:?}",
                    measurement.index, measurement.look_up, baseline.look_up
                );
            }
            measurement
        })
        .collect();

    info!(
        "benchmark over {} rows finished in {:?}",
        store.len(),
        (Local::now() - started_at).to_std().unwrap_or_default()
    );

    Report {
        started_at,
        rows: store.len(),
        baseline,
        indexes,
    }
}

fn measure<K: IndexKey + 'static, V>(
    kind: IndexKind,
    store: &RowStore<K, V>,
    key: &K,
    config: &IndexConfig,
) -> Measurement {
    let started = Instant::now();
    let mut index = kind.build(store, config);
    let build = started.elapsed();

    let started = Instant::now();
    let row_ids = index.look_up(key);
    let look_up = started.elapsed();

    let round_trip = round_trip(kind, index.as_mut(), key, store.len(), &row_ids);

    Measurement {
        index: index.name(),
        build,
        look_up,
        row_ids,
        agrees: false,
        not_slower: false,
        round_trip,
    }
}

/// The B-tree keeps the lowest row per key, so it agrees when it returns exactly the
/// baseline's first row; every other index must return exactly the baseline's rows.
fn agrees(kind: IndexKind, row_ids: &[RowId], baseline: &[RowId]) -> bool {
    match kind {
        IndexKind::BTree => row_ids == &baseline[..baseline.len().min(1)],
        _ => row_ids == baseline,
    }
}

/// Inserts `key` at a fresh row id past every existing row, checks the index answers as
/// it should with that row, deletes it again and checks the index answers as before.
///
/// The fresh row only shows up in the B-tree when the key was absent: a present key keeps
/// its lower owner row.
fn round_trip<K: IndexKey>(
    kind: IndexKind,
    index: &mut dyn Indexer<K>,
    key: &K,
    row_id: RowId,
    before: &[RowId],
) -> bool {
    let mut expected = before.to_vec();
    match kind {
        IndexKind::BTree if !before.is_empty() => {}
        _ => expected.push(row_id),
    }

    index.insert(key.clone(), row_id);
    let inserted = index.look_up(key) == expected;
    let deleted = index.delete(row_id);
    inserted && deleted && index.look_up(key) == before
}
