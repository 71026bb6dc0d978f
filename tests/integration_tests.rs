use rand::{rngs::StdRng, Rng, SeedableRng};
use rowindex::{
    generator::{random_rows, sequential_rows},
    harness::{self, IndexKind},
    BTreeIndex, BitmapIndex, HashIndex, IndexConfig, Indexer, LinearScan, RowStore,
};
use std::{env, fs, path::PathBuf};

fn temp_dir(tag: &str) -> PathBuf {
    let suffix: u64 = rand::thread_rng().gen();
    env::temp_dir().join(format!("rowindex-{tag}-{suffix:x}"))
}

#[test]
fn indexes_agree_with_linear_scan() {
    let mut rng = StdRng::seed_from_u64(42);
    let store = random_rows(2_000, 150, &mut rng);
    let config = IndexConfig::default();

    let scan = LinearScan::build(&store);
    let btree = BTreeIndex::build_with_degree(&store, 5);
    let hash = HashIndex::build_with(&store, config.hash_capacity, config.hash_load_factor);
    let bitmap = BitmapIndex::build(&store);

    for key in 0..=160u64 {
        let expected = scan.look_up(&key);
        assert_eq!(hash.look_up(&key), expected, "hash, key {key}");
        assert_eq!(bitmap.look_up(&key), expected, "bitmap, key {key}");

        // The B-tree answers with the first row carrying the key.
        let first: Vec<usize> = expected.first().copied().into_iter().collect();
        assert_eq!(btree.look_up(&key), first, "btree, key {key}");
    }
    btree.tree().validate().unwrap();
}

#[test]
fn duplicate_keys_scenario() {
    let store: RowStore<u32, &str> = vec![(1, "A"), (2, "B"), (1, "C")].into_iter().collect();
    let config = IndexConfig::default();

    let answers: Vec<(&str, Vec<usize>)> = IndexKind::ALL
        .into_iter()
        .map(|kind| {
            let index = kind.build(&store, &config);
            (index.name(), index.look_up(&1))
        })
        .collect();

    assert_eq!(
        answers,
        vec![
            ("scan", vec![0, 2]),
            ("btree", vec![0]),
            ("hash", vec![0, 2]),
            ("bitmap", vec![0, 2]),
        ]
    );
}

#[test]
fn hash_growth_scenario() {
    let mut index = HashIndex::with_capacity_and_load_factor(16, 0.75);
    for key in 0..13u32 {
        index.insert(key, key as usize);
    }

    assert_eq!(index.table().capacity(), 32);
    assert_eq!(index.table().resize_count(), 1);
    for key in 0..13u32 {
        assert_eq!(index.look_up(&key), vec![key as usize]);
    }
}

#[test]
fn bitmap_unique_key_deletion_scenario() {
    let store: RowStore<String, u32> = (0..40)
        .map(|row| {
            let key = if row == 5 {
                "unique".to_string()
            } else {
                format!("common-{}", row % 3)
            };
            (key, row)
        })
        .collect();
    let mut index = BitmapIndex::build(&store);
    let unique = "unique".to_string();
    assert_eq!(index.words_per_bitmap(), 2);

    assert!(index.delete(5));
    assert!(index.bitmap(&unique).is_none());
    assert!(index.look_up(&unique).is_empty());
    assert_eq!(index.distinct_keys(), 3);
}

#[test]
fn btree_degree_three_scenario() {
    let store: RowStore<u32, ()> = [10, 20, 5, 6, 12, 30, 7, 17]
        .into_iter()
        .map(|key| (key, ()))
        .collect();
    let index = BTreeIndex::build_with_degree(&store, 3);

    let keys: Vec<u32> = index.tree().keys().into_iter().copied().collect();
    assert_eq!(keys, vec![5, 6, 7, 10, 12, 17, 20, 30]);
    assert!(index.tree().height() >= 1);
    index.tree().validate().unwrap();

    assert_eq!(index.look_up(&12), vec![4]);
    assert!(index.look_up(&11).is_empty());
}

#[test]
fn insert_then_delete_restores_answers() {
    let store = sequential_rows(500);
    let config = IndexConfig::default();
    let fresh = store.len();

    for kind in IndexKind::ALL {
        let mut index = kind.build(&store, &config);
        let before = index.look_up(&9_999);
        assert!(before.is_empty());

        index.insert(9_999, fresh);
        assert_eq!(index.look_up(&9_999), vec![fresh], "{}", index.name());
        assert!(index.delete(fresh));
        assert_eq!(index.look_up(&9_999), before, "{}", index.name());
        assert_eq!(index.len(), store.len(), "{}", index.name());
    }
}

#[test]
fn mixed_mutations_keep_indexes_consistent() {
    let mut rng = StdRng::seed_from_u64(2024);
    let store = random_rows(300, 40, &mut rng);

    let mut scan = LinearScan::build(&store);
    let mut hash = HashIndex::build(&store);
    let mut bitmap = BitmapIndex::build(&store);
    let mut btree = BTreeIndex::build_with_degree(&store, 4);

    for _ in 0..2_000 {
        let row_id = rng.gen_range(0..400);
        let key = rng.gen_range(0..50u64);
        match rng.gen_range(0..3) {
            0 => {
                scan.insert(key, row_id);
                hash.insert(key, row_id);
                bitmap.insert(key, row_id);
                btree.insert(key, row_id);
            }
            1 => {
                let deleted = scan.delete(row_id);
                assert_eq!(hash.delete(row_id), deleted);
                assert_eq!(bitmap.delete(row_id), deleted);
                assert_eq!(btree.delete(row_id), deleted);
            }
            _ => {
                scan.update(row_id, key);
                hash.update(row_id, key);
                bitmap.update(row_id, key);
                btree.update(row_id, key);
            }
        }
    }

    for key in 0..50u64 {
        let expected = scan.look_up(&key);
        assert_eq!(hash.look_up(&key), expected, "hash, key {key}");
        assert_eq!(bitmap.look_up(&key), expected, "bitmap, key {key}");
        let first: Vec<usize> = expected.first().copied().into_iter().collect();
        assert_eq!(btree.look_up(&key), first, "btree, key {key}");
    }
    assert_eq!(hash.len(), scan.len());
    assert_eq!(bitmap.len(), scan.len());
    assert_eq!(btree.len(), scan.len());
    btree.tree().validate().unwrap();
}

#[test]
fn btree_key_survives_while_any_row_carries_it() {
    let store: RowStore<u32, &str> = vec![(1, "A"), (2, "B"), (1, "C")].into_iter().collect();
    let mut scan = LinearScan::build(&store);
    let mut btree = BTreeIndex::build(&store);

    assert!(scan.delete(0));
    assert!(btree.delete(0));
    assert_eq!(scan.look_up(&1), vec![2]);
    assert_eq!(btree.look_up(&1), vec![2]);
}

#[test]
fn csv_round_trip_feeds_the_harness() {
    let dir = temp_dir("csv");
    let path = dir.join("rows.csv");

    let mut rng = StdRng::seed_from_u64(3);
    let store = random_rows(250, 30, &mut rng);
    store.write_csv(&path).unwrap();

    let loaded: RowStore<String, String> = RowStore::load_csv(&path).unwrap();
    assert_eq!(loaded.len(), store.len());
    for (row, written) in loaded.iter().zip(store.iter()) {
        assert_eq!(row.key(), &written.key().to_string());
        assert_eq!(row.value(), written.value());
    }

    let key = loaded.get(200).unwrap().key().clone();
    let report = harness::run(&loaded, &key, &IndexConfig::default());
    assert!(report.baseline.row_ids.contains(&200));
    assert!(report.is_consistent(), "{report:?}");

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_row_file_is_an_io_error() {
    let path = temp_dir("missing").join("rows.csv");
    let result = RowStore::<String, String>::load_csv(&path);
    assert!(matches!(result, Err(rowindex::Error::Io { .. })));
}
