mod bits;
mod index;

pub use bits::{word_count, Bitmap, WORD_SIZE};
pub use index::BitmapIndex;
