//! Synthetic row stores for experiments.

use rand::Rng;

use crate::{index::RowId, row_store::RowStore};

const CATEGORIES: [&str; 3] = ["Programming", "Sports", "Music"];

fn category(key: u64) -> String {
    CATEGORIES[(key % 3) as usize].to_string()
}

/// `n` rows with keys `0..n`, each key unique.
pub fn sequential_rows(n: usize) -> RowStore<u64, String> {
    (0..n as u64).map(|key| (key, category(key))).collect()
}

/// `n` rows with keys drawn uniformly from `0..=max_key`; duplicates are expected.
pub fn random_rows<R: Rng>(n: usize, max_key: u64, rng: &mut R) -> RowStore<u64, String> {
    (0..n)
        .map(|_| {
            let key = rng.gen_range(0..=max_key);
            (key, category(key))
        })
        .collect()
}

/// Picks a row id from the right half of the store, or `None` if it is empty.
pub fn item_of_interest<K, V, R: Rng>(store: &RowStore<K, V>, rng: &mut R) -> Option<RowId> {
    if store.is_empty() {
        return None;
    }
    Some(rng.gen_range(store.len() / 2..store.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn sequential_rows_cycle_categories() {
        let store = sequential_rows(4);
        let rows: Vec<_> = store.iter().map(|row| (*row.key(), row.value().as_str())).collect();
        assert_eq!(
            rows,
            vec![(0, "Programming"), (1, "Sports"), (2, "Music"), (3, "Programming")]
        );
    }

    #[test]
    fn random_rows_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let store = random_rows(500, 20, &mut rng);
        assert_eq!(store.len(), 500);
        assert!(store.keys().all(|key| *key <= 20));
    }

    #[test]
    fn item_of_interest_comes_from_right_half() {
        let mut rng = StdRng::seed_from_u64(11);
        let store = sequential_rows(10);
        for _ in 0..50 {
            let row_id = item_of_interest(&store, &mut rng).unwrap();
            assert!((5..10).contains(&row_id));
        }
        assert_eq!(item_of_interest(&RowStore::<u64, String>::new(), &mut rng), None);
    }
}
