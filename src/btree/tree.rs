use std::mem;

use log::debug;

use super::node::{Arena, Entry, Node, NodeId};
use crate::{
    config::{DEFAULT_BTREE_DEGREE, MIN_BTREE_DEGREE},
    error::InvariantViolation,
};

/// A B-tree map keeping one value per key.
///
/// With degree `D` every node holds at most `D - 1` entries and every node but the root
/// holds at least `ceil(D/2) - 1` entries (that is, at least `ceil(D/2)` children).
/// Inserting an existing key is rejected and leaves the tree untouched.
///
/// Nodes live in an arena and refer to each other by [`NodeId`]; the parent link is a
/// plain id used to walk upward while splitting and rebalancing.
#[derive(Debug)]
pub struct BTree<K, V> {
    arena: Arena<K, V>,
    root: NodeId,
    degree: usize,
    height: usize,
    len: usize,
}

impl<K: Ord, V> BTree<K, V> {
    /// Creates an empty tree with the default degree.
    pub fn new() -> Self {
        Self::with_degree(DEFAULT_BTREE_DEGREE)
    }

    /// Creates an empty tree whose nodes split once they reach `degree` entries.
    ///
    /// # Panics
    ///
    /// Panics if `degree` is below 3.
    pub fn with_degree(degree: usize) -> Self {
        assert!(
            degree >= MIN_BTREE_DEGREE,
            "btree degree must be at least {MIN_BTREE_DEGREE}"
        );

        let mut arena = Arena::new();
        let root = arena.alloc(Node::new(None));

        Self {
            arena,
            root,
            degree,
            height: 0,
            len: 0,
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of edges between the root and any leaf.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn node_count(&self) -> usize {
        self.arena.live()
    }

    /// Fewest entries a non-root node may hold.
    pub fn min_entries(&self) -> usize {
        (self.degree + 1) / 2 - 1
    }

    /// Returns the value stored under `key`.
    pub fn look_up(&self, key: &K) -> Option<&V> {
        self.find(key)
            .map(|(id, slot)| &self.arena.get(id).entries[slot].value)
    }

    /// Mutable access to the value stored under `key`. The key itself cannot move.
    pub fn look_up_mut(&mut self, key: &K) -> Option<&mut V> {
        let (id, slot) = self.find(key)?;
        Some(&mut self.arena.get_mut(id).entries[slot].value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Inserts `key`, returning `false` without touching the tree if it is already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let mut id = self.root;
        let slot = loop {
            let node = self.arena.get(id);
            match search(node, &key) {
                Ok(_) => return false,
                Err(slot) => match node.child(slot) {
                    Some(child) => id = child,
                    None => break slot,
                },
            }
        };

        self.arena
            .get_mut(id)
            .entries
            .insert(slot, Entry::new(key, value, None));
        self.len += 1;
        self.split_upward(id);

        true
    }

    /// Removes `key` and returns its value. Removing an absent key is a no-op.
    pub fn delete(&mut self, key: &K) -> Option<V> {
        let (id, slot) = self.find(key)?;

        let left_child = self.arena.get(id).entries[slot].left;
        let (leaf, removed) = match left_child {
            None => (id, self.arena.get_mut(id).entries.remove(slot).value),
            Some(left) => {
                // Swap in the in-order predecessor, then drop it from its leaf.
                let mut leaf = left;
                while let Some(next) = self.arena.get(leaf).right_most {
                    leaf = next;
                }
                let predecessor = self
                    .arena
                    .get_mut(leaf)
                    .entries
                    .pop()
                    .unwrap_or_else(|| panic!("empty non-root leaf {}", leaf.index()));

                let entry = &mut self.arena.get_mut(id).entries[slot];
                entry.key = predecessor.key;
                (leaf, mem::replace(&mut entry.value, predecessor.value))
            }
        };

        self.len -= 1;
        self.rebalance(leaf);

        Some(removed)
    }

    /// All entries in ascending key order.
    pub fn entries(&self) -> Vec<(&K, &V)> {
        let mut out = Vec::with_capacity(self.len);
        self.walk(self.root, &mut out);
        out
    }

    /// All keys in ascending order.
    pub fn keys(&self) -> Vec<&K> {
        self.entries().into_iter().map(|(key, _)| key).collect()
    }

    /// Checks every structural invariant and reports the first one found broken.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        if self.arena.get(self.root).parent.is_some() {
            return Err(violation(self.root, "root has a parent"));
        }

        let count = self.validate_node(self.root, None, None, 0)?;
        if count != self.len {
            return Err(violation(
                self.root,
                &format!("tree holds {count} entries but len is {}", self.len),
            ));
        }

        Ok(())
    }
}

// Methods for internal usecases.
impl<K: Ord, V> BTree<K, V> {
    fn find(&self, key: &K) -> Option<(NodeId, usize)> {
        let mut id = self.root;
        loop {
            let node = self.arena.get(id);
            match search(node, key) {
                Ok(slot) => return Some((id, slot)),
                Err(slot) => id = node.child(slot)?,
            }
        }
    }

    /// Slot of `child` within `parent`.
    fn child_slot(&self, parent: NodeId, child: NodeId) -> usize {
        let node = self.arena.get(parent);
        (0..=node.entries.len())
            .find(|&slot| node.child(slot) == Some(child))
            .unwrap_or_else(|| {
                panic!(
                    "btree node {} is not a child of its parent {}",
                    child.index(),
                    parent.index()
                )
            })
    }

    /// Points every child of `id` back at `id`.
    fn adopt_children(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.arena.get(id).children().collect();
        for child in children {
            self.arena.get_mut(child).parent = Some(id);
        }
    }

    /// Splits `id` while it is full, promoting middle entries toward the root.
    fn split_upward(&mut self, mut id: NodeId) {
        while self.arena.get(id).entries.len() >= self.degree {
            let node = self.arena.get_mut(id);
            let right_entries = node.entries.split_off(self.degree / 2 + 1);
            let middle = node
                .entries
                .pop()
                .unwrap_or_else(|| panic!("splitting empty btree node {}", id.index()));

            // The middle entry's subtree becomes the last child of the left half.
            let right_most = mem::replace(&mut node.right_most, middle.left);
            let parent = node.parent;

            let right = self.arena.alloc(Node {
                entries: right_entries,
                right_most,
                parent,
            });
            self.adopt_children(right);

            let separator = Entry::new(middle.key, middle.value, Some(id));
            match parent {
                Some(parent) => {
                    let slot = self.child_slot(parent, id);
                    let node = self.arena.get_mut(parent);
                    node.entries.insert(slot, separator);
                    node.set_child(slot + 1, right);
                    debug!(
                        "btree split node {} into {} under {}",
                        id.index(),
                        right.index(),
                        parent.index()
                    );
                    id = parent;
                }
                None => {
                    let root = self.arena.alloc(Node {
                        entries: vec![separator],
                        right_most: Some(right),
                        parent: None,
                    });
                    self.arena.get_mut(id).parent = Some(root);
                    self.arena.get_mut(right).parent = Some(root);
                    self.root = root;
                    self.height += 1;
                    debug!(
                        "btree root split, new root {} height {}",
                        root.index(),
                        self.height
                    );
                    return;
                }
            }
        }
    }

    /// Repairs `id` and its ancestors after a removal left `id` under-full.
    fn rebalance(&mut self, mut id: NodeId) {
        let min = self.min_entries();

        loop {
            let node = self.arena.get(id);
            let parent = match node.parent {
                Some(parent) => parent,
                None => return self.collapse_root(),
            };
            if node.entries.len() >= min {
                return;
            }

            let slot = self.child_slot(parent, id);
            let parent_node = self.arena.get(parent);
            let left = slot.checked_sub(1).and_then(|s| parent_node.child(s));
            let right = if slot < parent_node.entries.len() {
                parent_node.child(slot + 1)
            } else {
                None
            };

            let has_surplus = |sibling: &NodeId| self.arena.get(*sibling).entries.len() > min;
            if let Some(right) = right.filter(has_surplus) {
                self.rotate_left(parent, slot, id, right);
                return;
            }
            if let Some(left) = left.filter(has_surplus) {
                self.rotate_right(parent, slot - 1, left, id);
                return;
            }

            match (left, right) {
                (Some(left), _) => self.merge(parent, slot - 1, left, id),
                (None, Some(right)) => self.merge(parent, slot, id, right),
                (None, None) => panic!("btree node {} has no sibling", id.index()),
            }
            id = parent;
        }
    }

    /// Moves the separator at `slot` down into `node` and the first entry of `right` up.
    fn rotate_left(&mut self, parent: NodeId, slot: usize, node: NodeId, right: NodeId) {
        let first = self.arena.get_mut(right).entries.remove(0);

        let separator = &mut self.arena.get_mut(parent).entries[slot];
        let key = mem::replace(&mut separator.key, first.key);
        let value = mem::replace(&mut separator.value, first.value);

        let node_ref = self.arena.get_mut(node);
        let left = mem::replace(&mut node_ref.right_most, first.left);
        node_ref.entries.push(Entry::new(key, value, left));

        if let Some(moved) = first.left {
            self.arena.get_mut(moved).parent = Some(node);
        }
    }

    /// Moves the separator at `slot` down into `node` and the last entry of `left` up.
    fn rotate_right(&mut self, parent: NodeId, slot: usize, left: NodeId, node: NodeId) {
        let left_ref = self.arena.get_mut(left);
        let last = left_ref
            .entries
            .pop()
            .unwrap_or_else(|| panic!("borrowing from empty btree node {}", left.index()));
        let moved = mem::replace(&mut left_ref.right_most, last.left);

        let separator = &mut self.arena.get_mut(parent).entries[slot];
        let key = mem::replace(&mut separator.key, last.key);
        let value = mem::replace(&mut separator.value, last.value);

        self.arena
            .get_mut(node)
            .entries
            .insert(0, Entry::new(key, value, moved));

        if let Some(moved) = moved {
            self.arena.get_mut(moved).parent = Some(node);
        }
    }

    /// Folds the separator at `slot` and all of `right` into `left`, freeing `right`.
    fn merge(&mut self, parent: NodeId, slot: usize, left: NodeId, right: NodeId) {
        let right_node = self.arena.release(right);

        let parent_ref = self.arena.get_mut(parent);
        let separator = parent_ref.entries.remove(slot);
        parent_ref.set_child(slot, left);

        let left_ref = self.arena.get_mut(left);
        let right_most = mem::replace(&mut left_ref.right_most, right_node.right_most);
        left_ref
            .entries
            .push(Entry::new(separator.key, separator.value, right_most));
        left_ref.entries.extend(right_node.entries);
        self.adopt_children(left);

        debug!(
            "btree merged node {} into {} under {}",
            right.index(),
            left.index(),
            parent.index()
        );
    }

    /// Replaces an empty internal root with its only child.
    fn collapse_root(&mut self) {
        let root = self.arena.get(self.root);
        if !root.entries.is_empty() {
            return;
        }
        if let Some(child) = root.right_most {
            self.arena.release(self.root);
            self.arena.get_mut(child).parent = None;
            self.root = child;
            self.height -= 1;
            debug!(
                "btree root collapsed into {} height {}",
                child.index(),
                self.height
            );
        }
    }

    fn walk<'a>(&'a self, id: NodeId, out: &mut Vec<(&'a K, &'a V)>) {
        let node = self.arena.get(id);
        for entry in &node.entries {
            if let Some(left) = entry.left {
                self.walk(left, out);
            }
            out.push((&entry.key, &entry.value));
        }
        if let Some(right_most) = node.right_most {
            self.walk(right_most, out);
        }
    }

    /// Validates the subtree at `id`, whose keys must lie strictly within the bounds.
    /// Returns the number of entries in the subtree.
    fn validate_node(
        &self,
        id: NodeId,
        lower: Option<&K>,
        upper: Option<&K>,
        depth: usize,
    ) -> Result<usize, InvariantViolation> {
        let node = self.arena.get(id);

        if node.entries.len() >= self.degree {
            return Err(violation(id, "node is over-full"));
        }
        if id != self.root && node.entries.len() < self.min_entries() {
            return Err(violation(id, "non-root node is under-full"));
        }
        if node.entries.windows(2).any(|pair| pair[0].key >= pair[1].key) {
            return Err(violation(id, "entries are not strictly ascending"));
        }
        let out_of_bounds = node.entries.iter().any(|entry| {
            lower.map_or(false, |lower| entry.key <= *lower)
                || upper.map_or(false, |upper| entry.key >= *upper)
        });
        if out_of_bounds {
            return Err(violation(id, "key outside the range of its parent slot"));
        }

        if node.is_leaf() {
            if node.entries.iter().any(|entry| entry.left.is_some()) {
                return Err(violation(id, "leaf entry has a child"));
            }
            if depth != self.height {
                return Err(violation(id, "leaf is not at tree height"));
            }
            return Ok(node.entries.len());
        }

        if node.entries.is_empty() {
            return Err(violation(id, "internal node without entries"));
        }

        let mut count = node.entries.len();
        let mut low = lower;
        for slot in 0..=node.entries.len() {
            let child = node
                .child(slot)
                .ok_or_else(|| violation(id, "internal node is missing a child"))?;
            if self.arena.get(child).parent != Some(id) {
                return Err(violation(child, "parent link does not match"));
            }
            let high = node.entries.get(slot).map(|entry| &entry.key).or(upper);
            count += self.validate_node(child, low, high, depth + 1)?;
            low = high;
        }

        Ok(count)
    }
}

impl<K: Ord, V> Default for BTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

fn search<K: Ord, V>(node: &Node<K, V>, key: &K) -> Result<usize, usize> {
    node.entries.binary_search_by(|entry| entry.key.cmp(key))
}

fn violation(id: NodeId, reason: &str) -> InvariantViolation {
    InvariantViolation {
        node: id.index(),
        reason: reason.to_string(),
    }
}
