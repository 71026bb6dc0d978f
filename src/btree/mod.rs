mod index;
mod node;
mod tree;

pub use index::BTreeIndex;
pub use node::NodeId;
pub use tree::BTree;
