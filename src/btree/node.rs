/// Stable address of a node inside the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A key/value pair plus the subtree holding every key smaller than it.
#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) left: Option<NodeId>,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, value: V, left: Option<NodeId>) -> Self {
        Self { key, value, left }
    }
}

/// A B-tree node.
///
/// Child slot `i < entries.len()` is `entries[i].left`, slot `entries.len()` is `right_most`.
/// A leaf has no children at all. `parent` is a back-reference into the arena and never owns.
#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) entries: Vec<Entry<K, V>>,
    pub(crate) right_most: Option<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl<K, V> Node<K, V> {
    pub(crate) fn new(parent: Option<NodeId>) -> Self {
        Self {
            entries: Vec::new(),
            right_most: None,
            parent,
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.right_most.is_none()
    }

    pub(crate) fn child(&self, slot: usize) -> Option<NodeId> {
        if slot < self.entries.len() {
            self.entries[slot].left
        } else {
            self.right_most
        }
    }

    pub(crate) fn set_child(&mut self, slot: usize, child: NodeId) {
        if slot < self.entries.len() {
            self.entries[slot].left = Some(child);
        } else {
            self.right_most = Some(child);
        }
    }

    /// Every child id, left to right.
    pub(crate) fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries
            .iter()
            .filter_map(|entry| entry.left)
            .chain(self.right_most)
    }
}

/// Owner of every node of a tree. Freed slots are recycled through a free list.
#[derive(Debug)]
pub(crate) struct Arena<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
}

impl<K, V> Arena<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn alloc(&mut self, node: Node<K, V>) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    pub(crate) fn release(&mut self, id: NodeId) -> Node<K, V> {
        let node = self.slots[id.0]
            .take()
            .unwrap_or_else(|| panic!("btree node {} released twice", id.0));
        self.free.push(id.0);
        node
    }

    pub(crate) fn get(&self, id: NodeId) -> &Node<K, V> {
        self.slots[id.0]
            .as_ref()
            .unwrap_or_else(|| panic!("dangling btree node {}", id.0))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        self.slots[id.0]
            .as_mut()
            .unwrap_or_else(|| panic!("dangling btree node {}", id.0))
    }

    /// Number of nodes currently alive.
    pub(crate) fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}
