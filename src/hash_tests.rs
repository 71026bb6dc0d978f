use crate::{
    hash::{HashIndex, HashTable},
    index::Indexer,
    row_store::RowStore,
};

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Key whose hash only sees the parity of its id, so distinct keys collide on purpose.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Colliding(u32);

impl Hash for Colliding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.0 % 2).hash(state);
    }
}

#[test]
fn hash_code_folds_high_bits() {
    let mut hasher = DefaultHasher::new();
    42u64.hash(&mut hasher);
    let h = hasher.finish();

    assert_eq!(HashTable::<u64>::hash_code(&42), h ^ (h >> 16));
}

#[test]
fn empty_table_answers_empty() {
    let table: HashTable<u32> = HashTable::new();
    assert!(table.get(&7).is_empty());
    assert!(table.is_empty());
    assert_eq!(table.capacity(), 16);
}

#[test]
fn grows_once_past_threshold() {
    let mut table = HashTable::with_capacity_and_load_factor(16, 0.75);

    for key in 0..11u32 {
        table.put(key, key as usize);
    }
    assert_eq!(table.capacity(), 16);
    assert_eq!(table.resize_count(), 0);

    for key in 11..13u32 {
        table.put(key, key as usize);
    }
    assert_eq!(table.len(), 13);
    assert_eq!(table.capacity(), 32);
    assert_eq!(table.resize_count(), 1);
}

#[test]
fn resizing_preserves_lookups() {
    let store: RowStore<u32, ()> = (0..100).map(|key| (key % 40, ())).collect();
    let mut index = HashIndex::build(&store);
    assert_eq!(index.table().capacity(), 256);

    let expected = |key: u32, deleted_upto: usize| -> Vec<usize> {
        (deleted_upto..100).filter(|row| (*row as u32) % 40 == key).collect()
    };
    for key in 0..40 {
        assert_eq!(index.look_up(&key), expected(key, 0));
    }

    // Deleting rows shrinks the table step by step down to its initial capacity.
    let mut capacities = vec![index.table().capacity()];
    for row in 0..100 {
        assert!(index.delete(row));
        if *capacities.last().unwrap() != index.table().capacity() {
            capacities.push(index.table().capacity());
        }
        for key in 0..40 {
            assert_eq!(index.look_up(&key), expected(key, row + 1));
        }
    }
    assert_eq!(capacities, vec![256, 128, 64, 32, 16]);
    assert!(index.table().is_empty());
}

#[test]
fn colliding_keys_stay_grouped() {
    let mut table = HashTable::new();
    for id in 0..6 {
        table.put(Colliding(id), id as usize);
    }

    // Even and odd ids form two hash groups of three.
    let evens: Vec<usize> = table.get(&Colliding(0)).iter().map(|(_, row)| *row).collect();
    let mut sorted = evens.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![0, 2, 4]);
    assert_eq!(evens[0], 0, "first node of the group stays the group head");

    let mut index = HashIndex::new();
    for id in 0..6 {
        index.insert(Colliding(id), id as usize);
    }
    assert_eq!(index.look_up(&Colliding(2)), vec![2]);
    assert_eq!(index.look_up(&Colliding(9)), Vec::<usize>::new());
}

#[test]
fn remove_from_head_and_middle_of_group() {
    let mut table = HashTable::new();
    for id in 0..5 {
        table.put(Colliding(id * 2), id as usize);
    }

    // Group order is head first, then newest to oldest: 0, 4, 3, 2, 1.
    let rows = |table: &HashTable<Colliding>| -> Vec<usize> {
        table.get(&Colliding(0)).iter().map(|(_, row)| *row).collect()
    };
    assert_eq!(rows(&table), vec![0, 4, 3, 2, 1]);

    assert!(table.remove(&Colliding(0), 0));
    assert_eq!(rows(&table), vec![4, 3, 2, 1]);

    assert!(table.remove(&Colliding(6), 3));
    assert_eq!(rows(&table), vec![4, 2, 1]);

    assert!(!table.remove(&Colliding(6), 3));
    assert!(!table.remove(&Colliding(1), 4));
    assert_eq!(table.len(), 3);
}

#[test]
fn index_scenario_with_duplicates() {
    let mut index = HashIndex::new();
    index.insert(1, 0);
    index.insert(2, 1);
    index.insert(1, 2);

    assert_eq!(index.look_up(&1), vec![0, 2]);
    assert_eq!(index.look_up(&2), vec![1]);
    assert!(index.look_up(&3).is_empty());
}

#[test]
fn index_update_and_delete() {
    let store: RowStore<&str, u32> = vec![("a", 1), ("b", 2), ("a", 3)].into_iter().collect();
    let mut index = HashIndex::build(&store);

    index.update(0, "c");
    assert_eq!(index.look_up(&"a"), vec![2]);
    assert_eq!(index.look_up(&"c"), vec![0]);

    // Same key: nothing moves.
    index.update(0, "c");
    assert_eq!(index.look_up(&"c"), vec![0]);

    assert!(index.delete(1));
    assert!(!index.delete(1));
    assert!(!index.delete(99));
    assert!(index.look_up(&"b").is_empty());
    assert_eq!(index.len(), 2);
}

#[test]
fn display_lists_every_bucket() {
    let mut table = HashTable::with_capacity_and_load_factor(4, 1.0);
    table.put(7u32, 0);

    let dump = table.to_string();
    assert_eq!(dump.lines().count(), 4);
    assert!(dump.contains("[7]"));
    assert!(dump.starts_with("Bucket  0:"));
}

#[test]
fn never_shrinks_below_initial_capacity() {
    let mut table = HashTable::with_capacity_and_load_factor(64, 0.75);
    for key in 0..10u32 {
        table.put(key, key as usize);
    }
    for key in 0..10u32 {
        assert!(table.remove(&key, key as usize));
        assert_eq!(table.capacity(), 64);
    }
    assert_eq!(table.resize_count(), 0);
    assert!(table.is_empty());
}
