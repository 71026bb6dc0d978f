use std::ops::{BitAnd, BitOr, BitXor, Not};

use bit_vec::BitVec;

use crate::index::RowId;

/// Number of bits per storage word.
pub const WORD_SIZE: usize = 32;

/// Number of words needed to address `cardinality` rows.
pub fn word_count(cardinality: usize) -> usize {
    (cardinality + WORD_SIZE - 1) / WORD_SIZE
}

/// Fixed-width bit vector over a row-id space, stored as `ceil(cardinality / 32)` 32-bit words.
///
/// Bit `i` set means row `i` carries the key owning this bitmap. Bits at or past
/// `cardinality` are always clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    cardinality: usize,
    bits: BitVec<u32>,
}

impl Bitmap {
    /// An all-zero bitmap addressing `cardinality` rows.
    pub fn new(cardinality: usize) -> Self {
        Self {
            cardinality,
            bits: BitVec::from_elem(word_count(cardinality) * WORD_SIZE, false),
        }
    }

    /// A bitmap with only `row_id` set.
    pub fn flag(cardinality: usize, row_id: RowId) -> Self {
        let mut bitmap = Self::new(cardinality);
        bitmap.set_bit(row_id);
        bitmap
    }

    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn word_count(&self) -> usize {
        self.bits.len() / WORD_SIZE
    }

    /// Raw 32-bit storage words, lowest row ids first.
    pub fn words(&self) -> impl Iterator<Item = u32> + '_ {
        self.bits.blocks()
    }

    /// Sets bit `k`, widening the cardinality if `k` is past it.
    ///
    /// # Panics
    ///
    /// Panics if `k` lies beyond the allocated words.
    pub fn set_bit(&mut self, k: usize) {
        assert!(
            k < self.bits.len(),
            "bit {k} outside {} allocated words",
            self.word_count()
        );
        self.bits.set(k, true);
        self.cardinality = self.cardinality.max(k + 1);
    }

    pub fn clear_bit(&mut self, k: usize) {
        if k < self.bits.len() {
            self.bits.set(k, false);
        }
    }

    pub fn test_bit(&self, k: usize) -> bool {
        self.bits.get(k).unwrap_or(false)
    }

    /// Grows the bitmap to address `cardinality` rows, appending zeroed words as needed.
    pub fn resize(&mut self, cardinality: usize) {
        let needed = word_count(cardinality) * WORD_SIZE;
        if needed > self.bits.len() {
            self.bits.grow(needed - self.bits.len(), false);
        }
        self.cardinality = self.cardinality.max(cardinality);
    }

    /// True when no bit is set.
    pub fn is_empty(&self) -> bool {
        self.bits.none()
    }

    pub fn count_ones(&self) -> usize {
        self.words().map(|word| word.count_ones() as usize).sum()
    }

    /// Row ids whose bit is set, ascending.
    ///
    /// All-zero words are skipped without testing their bits.
    pub fn row_ids(&self) -> Vec<RowId> {
        let mut row_ids = Vec::new();
        for (index, word) in self.words().enumerate() {
            if word == 0 {
                continue;
            }
            for pos in 0..WORD_SIZE {
                if (word >> pos) & 1 == 1 {
                    row_ids.push(index * WORD_SIZE + pos);
                }
            }
        }
        row_ids
    }

    /// Applies a word-wise operation to two bitmaps of the same word count.
    fn combine(&self, other: &Bitmap, op: impl FnOnce(&mut BitVec<u32>, &BitVec<u32>)) -> Bitmap {
        assert_eq!(
            self.word_count(),
            other.word_count(),
            "bitmaps must have the same number of words"
        );
        let mut product = self.clone();
        op(&mut product.bits, &other.bits);
        product.cardinality = self.cardinality.max(other.cardinality);
        product
    }
}

impl BitOr for &Bitmap {
    type Output = Bitmap;

    fn bitor(self, other: &Bitmap) -> Bitmap {
        self.combine(other, |bits, other| {
            bits.or(other);
        })
    }
}

impl BitAnd for &Bitmap {
    type Output = Bitmap;

    fn bitand(self, other: &Bitmap) -> Bitmap {
        self.combine(other, |bits, other| {
            bits.and(other);
        })
    }
}

impl BitXor for &Bitmap {
    type Output = Bitmap;

    fn bitxor(self, other: &Bitmap) -> Bitmap {
        self.combine(other, |bits, other| {
            bits.xor(other);
        })
    }
}

impl Not for &Bitmap {
    type Output = Bitmap;

    fn not(self) -> Bitmap {
        let mut product = self.clone();
        product.bits.negate();
        // Keep the padding past the cardinality clear.
        for k in product.cardinality..product.bits.len() {
            product.bits.set(k, false);
        }
        product
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_rounds_up() {
        assert_eq!(word_count(0), 0);
        assert_eq!(word_count(1), 1);
        assert_eq!(word_count(32), 1);
        assert_eq!(word_count(33), 2);
        assert_eq!(Bitmap::new(40).word_count(), 2);
    }

    #[test]
    fn set_clear_and_test() {
        let mut bitmap = Bitmap::new(40);
        bitmap.set_bit(3);
        bitmap.set_bit(35);
        assert!(bitmap.test_bit(3));
        assert!(bitmap.test_bit(35));
        assert!(!bitmap.test_bit(4));
        assert!(!bitmap.test_bit(1000));

        bitmap.clear_bit(3);
        assert!(!bitmap.test_bit(3));
        assert_eq!(bitmap.row_ids(), vec![35]);
    }

    #[test]
    fn row_ids_skip_empty_words() {
        let mut bitmap = Bitmap::new(100);
        bitmap.set_bit(0);
        bitmap.set_bit(31);
        bitmap.set_bit(96);

        let words: Vec<u32> = bitmap.words().collect();
        assert_eq!(words, vec![1 | (1 << 31), 0, 0, 1]);
        assert_eq!(bitmap.row_ids(), vec![0, 31, 96]);
        assert_eq!(bitmap.count_ones(), 3);
    }

    #[test]
    fn resize_keeps_bits_and_zeroes_new_words() {
        let mut bitmap = Bitmap::flag(32, 31);
        assert_eq!(bitmap.word_count(), 1);

        bitmap.resize(33);
        assert_eq!(bitmap.word_count(), 2);
        assert_eq!(bitmap.cardinality(), 33);
        assert_eq!(bitmap.words().collect::<Vec<_>>(), vec![1 << 31, 0]);

        // Same word, no reallocation.
        bitmap.resize(60);
        assert_eq!(bitmap.word_count(), 2);
        assert_eq!(bitmap.cardinality(), 60);
    }

    #[test]
    fn bitwise_operations() {
        let mut a = Bitmap::new(40);
        a.set_bit(1);
        a.set_bit(33);
        let mut b = Bitmap::new(40);
        b.set_bit(33);
        b.set_bit(39);

        assert_eq!((&a | &b).row_ids(), vec![1, 33, 39]);
        assert_eq!((&a & &b).row_ids(), vec![33]);
        assert_eq!((&a ^ &b).row_ids(), vec![1, 39]);

        let not_a = !&a;
        assert_eq!(not_a.count_ones(), 38);
        assert!(!not_a.test_bit(1));
        assert!(!not_a.test_bit(40));
    }

    #[test]
    fn xor_with_flag_clears_the_only_bit() {
        let bitmap = Bitmap::flag(40, 5);
        let cleared = &bitmap ^ &Bitmap::flag(40, 5);
        assert!(cleared.is_empty());
        assert!(!bitmap.is_empty());
    }

    #[test]
    #[should_panic(expected = "same number of words")]
    fn mismatched_word_counts_panic() {
        let _ = &Bitmap::new(32) | &Bitmap::new(33);
    }
}
