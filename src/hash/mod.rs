mod index;
mod table;

pub use index::HashIndex;
pub use table::HashTable;
