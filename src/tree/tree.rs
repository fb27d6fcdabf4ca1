// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! B-Tree facade and algorithms.
//!
//! `BTree` binds an order, an optional root and a node store, and implements
//! the full operation set over the store indirection: every structural change
//! reads the affected nodes, edits the copies and writes them back, so the
//! same code drives the volatile and the persistent back-end.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ BTree<S>                                    │
//! ├─────────────────────────────────────────────┤
//! │ - order: Order (max children per node)      │
//! │ - root: Option<NodeId>                      │
//! │ - n_nodes: live node count                  │
//! │ - store: S (owns every node)                │
//! └─────────────────────────────────────────────┘
//!          │ allocate / read / write / free
//!          ▼
//! ┌──────────────────┐      ┌──────────────────────┐
//! │ MemoryStore      │  or  │ FileStore            │
//! └──────────────────┘      └──────────────────────┘
//! ```
//!
//! ## Algorithms
//!
//! - **Search**: binary search per node, descend through the matching child.
//! - **Insert**: descend to a leaf; a node pushed past `t - 1` keys splits
//!   around its median and promotes it, propagating towards the root. A
//!   split root promotes into a fresh root of one key.
//! - **Remove**: a separator in an internal node is replaced by its in-order
//!   predecessor or successor and the replacement is deleted from the
//!   sub-tree; after every return from a child the parent repairs an
//!   underflow by borrowing through itself from a sibling with spare keys,
//!   or by merging the child with a sibling around their separator. An
//!   emptied root collapses, shrinking the height by one.
//!
//! Repairing after the recursive step instead of fortifying ahead of the
//! descent keeps every non-root node within its fill bounds for all orders,
//! including odd ones where two minimum siblings plus a separator would not
//! fit into a single node.

use crate::error::{TreeError, TreeResult};
use crate::store::{FileStore, MemoryStore, NodeStore};
use crate::tree::node::Node;
use crate::tree::types::{InsertOutcome, NodeId, Order, SearchHit};
use std::path::Path;

/// A key, its payload and the sibling created by a node split, on their way
/// into the parent.
struct Split {
    key: i32,
    value: i32,
    right: NodeId,
}

/// Ordered key/value index over a node store.
#[derive(Debug)]
pub struct BTree<S: NodeStore> {
    /// Tree order, fixed at creation.
    order: Order,

    /// Root node ID; `None` for the empty tree.
    root: Option<NodeId>,

    /// Count of live nodes, maintained across allocations and frees.
    n_nodes: u64,

    /// The store owning every node.
    store: S,
}

impl BTree<MemoryStore> {
    /// Create an empty in-memory tree of the given order.
    pub fn new(order: Order) -> Self {
        Self {
            order,
            root: None,
            n_nodes: 0,
            store: MemoryStore::new(order),
        }
    }
}

impl BTree<FileStore> {
    /// Create an empty file-backed tree, truncating any file at `path`.
    ///
    /// ## Error Conditions
    /// - `IoError`: file cannot be created or mapped
    pub fn create<P: AsRef<Path>>(path: P, order: Order) -> TreeResult<Self> {
        let store = FileStore::create(path, order)?;
        Ok(Self {
            order,
            root: None,
            n_nodes: 0,
            store,
        })
    }

    /// Open a tree from an existing index file.
    ///
    /// Order, root and node count are rehydrated from the file header and
    /// slot statuses; nothing about the tree needs to be known externally.
    ///
    /// ## Error Conditions
    /// - `IoError`: file missing or not mappable
    /// - `InvalidFileFormat`: not a keytree index file
    pub fn open<P: AsRef<Path>>(path: P) -> TreeResult<Self> {
        let store = FileStore::open(path)?;
        Ok(Self {
            order: store.order(),
            root: store.root(),
            n_nodes: store.live_nodes(),
            store,
        })
    }
}

impl<S: NodeStore> BTree<S> {
    /// Get the tree order.
    pub fn order(&self) -> Order {
        self.order
    }

    /// Get the count of live nodes.
    pub fn node_count(&self) -> u64 {
        self.n_nodes
    }

    /// Check whether the tree holds no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Get the root node ID, if any.
    pub fn root_id(&self) -> Option<NodeId> {
        self.root
    }

    /// Read a node by ID (resolves a `SearchHit` to its entries).
    pub fn node(&self, id: NodeId) -> TreeResult<Node> {
        self.store.read(id)
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    /// Locate `key` in the tree.
    ///
    /// ## Output
    /// - `Ok(Some(SearchHit))`: node ID and key index of the match
    /// - `Ok(None)`: key not present
    ///
    /// ## Performance
    /// - O(log n) node reads, O(log t) comparisons per node
    ///
    /// Search is read-only and never mutates the store.
    pub fn search(&self, key: i32) -> TreeResult<Option<SearchHit>> {
        let mut current = match self.root {
            Some(id) => id,
            None => return Ok(None),
        };
        loop {
            let node = self.store.read(current)?;
            match node.find_key(key) {
                Ok(idx) => {
                    return Ok(Some(SearchHit {
                        node: node.id,
                        index: idx,
                    }));
                }
                Err(idx) => {
                    if node.is_leaf {
                        return Ok(None);
                    }
                    current = node.children[idx];
                }
            }
        }
    }

    /// Get the payload stored under `key`.
    pub fn get(&self, key: i32) -> TreeResult<Option<i32>> {
        let mut current = match self.root {
            Some(id) => id,
            None => return Ok(None),
        };
        loop {
            let node = self.store.read(current)?;
            match node.find_key(key) {
                Ok(idx) => return Ok(Some(node.values[idx])),
                Err(idx) => {
                    if node.is_leaf {
                        return Ok(None);
                    }
                    current = node.children[idx];
                }
            }
        }
    }

    /// Insert `key` with `value`.
    ///
    /// ## Output
    /// - `Ok(Inserted)`: the key was new
    /// - `Ok(Updated)`: the key existed; its payload was overwritten in
    ///   place with no structural change
    ///
    /// ## Performance
    /// - O(log n) node reads and writes; splits add one write per affected
    ///   level
    pub fn insert(&mut self, key: i32, value: i32) -> TreeResult<InsertOutcome> {
        let root_id = match self.root {
            Some(id) => id,
            None => {
                // First key: a fresh leaf becomes the root.
                let id = self.allocate_node(true)?;
                let mut node = Node::with_capacity(id, true, self.order);
                node.insert_entry(0, key, value);
                self.store.write(&node)?;
                self.set_root(Some(id))?;
                return Ok(InsertOutcome::Inserted);
            }
        };

        let (outcome, promoted) = self.insert_into(root_id, key, value)?;
        if let Some(split) = promoted {
            // The root itself split: promote the median into a new root.
            let new_root_id = self.allocate_node(false)?;
            let mut new_root = Node::with_capacity(new_root_id, false, self.order);
            new_root.keys.push(split.key);
            new_root.values.push(split.value);
            new_root.children.push(root_id);
            new_root.children.push(split.right);
            self.store.write(&new_root)?;
            self.set_root(Some(new_root_id))?;
        }
        Ok(outcome)
    }

    /// Remove `key` from the tree.
    ///
    /// ## Output
    /// - `Ok(())`: key removed, invariants restored
    /// - `Err(KeyNotFound)`: key absent; the tree is unchanged
    ///
    /// ## Performance
    /// - O(log n) node reads; borrows and merges add a bounded number of
    ///   writes per level
    pub fn remove(&mut self, key: i32) -> TreeResult<()> {
        let root_id = match self.root {
            Some(id) => id,
            None => return Err(TreeError::KeyNotFound { key }),
        };
        self.remove_from(root_id, key)?;

        // Collapse an emptied root: a bare leaf empties the tree, an
        // internal root hands over to its single remaining child.
        let root = self.store.read(root_id)?;
        if root.n_keys() == 0 {
            if root.is_leaf {
                self.free_node(root_id)?;
                self.set_root(None)?;
            } else {
                let promoted = root.children[0];
                self.free_node(root_id)?;
                self.set_root(Some(promoted))?;
            }
        }
        Ok(())
    }

    /// Collect the tree level by level, root first.
    ///
    /// Each inner vector holds owned copies of one level's nodes in
    /// left-to-right order. Used by the dump writer and the test walkers.
    pub fn traverse(&self) -> TreeResult<Vec<Vec<Node>>> {
        let mut levels = Vec::new();
        let mut current = match self.root {
            Some(id) => vec![id],
            None => return Ok(levels),
        };
        while !current.is_empty() {
            let mut nodes = Vec::with_capacity(current.len());
            let mut next = Vec::new();
            for id in current {
                let node = self.store.read(id)?;
                next.extend_from_slice(&node.children);
                nodes.push(node);
            }
            levels.push(nodes);
            current = next;
        }
        Ok(levels)
    }

    /// Tear the tree down, releasing every reachable node post-order.
    ///
    /// The file-backed store tombstones each slot; the file handle closes
    /// when the store is dropped, after the walk.
    pub fn destroy(mut self) -> TreeResult<()> {
        if let Some(root_id) = self.root {
            self.free_subtree(root_id)?;
            self.set_root(None)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Allocation bookkeeping
    // ------------------------------------------------------------------

    fn allocate_node(&mut self, is_leaf: bool) -> TreeResult<NodeId> {
        let id = self.store.allocate(is_leaf)?;
        self.n_nodes += 1;
        Ok(id)
    }

    fn free_node(&mut self, id: NodeId) -> TreeResult<()> {
        self.store.free(id)?;
        self.n_nodes -= 1;
        Ok(())
    }

    fn set_root(&mut self, root: Option<NodeId>) -> TreeResult<()> {
        self.root = root;
        self.store.set_root(root)
    }

    fn free_subtree(&mut self, id: NodeId) -> TreeResult<()> {
        let node = self.store.read(id)?;
        for child in &node.children {
            self.free_subtree(*child)?;
        }
        self.free_node(id)
    }

    // ------------------------------------------------------------------
    // Insertion
    // ------------------------------------------------------------------

    /// Insert below `id`; a `Split` travels back up when the node divided.
    fn insert_into(&mut self, id: NodeId, key: i32, value: i32) -> TreeResult<(InsertOutcome, Option<Split>)> {
        let mut node = self.store.read(id)?;
        let idx = match node.find_key(key) {
            Ok(found) => {
                node.values[found] = value;
                self.store.write(&node)?;
                return Ok((InsertOutcome::Updated, None));
            }
            Err(idx) => idx,
        };

        if node.is_leaf {
            node.insert_entry(idx, key, value);
        } else {
            let child_id = node.children[idx];
            let (outcome, promoted) = self.insert_into(child_id, key, value)?;
            let split = match promoted {
                Some(split) => split,
                None => return Ok((outcome, None)),
            };
            // The promoted median slots in exactly where the descent left.
            node.insert_entry(idx, split.key, split.value);
            node.children.insert(idx + 1, split.right);
        }

        if !node.is_overflowing(self.order) {
            self.store.write(&node)?;
            return Ok((InsertOutcome::Inserted, None));
        }

        let split = self.split_overflowing(&mut node)?;
        self.store.write(&node)?;
        Ok((InsertOutcome::Inserted, Some(split)))
    }

    /// Split a node holding `t` keys around its median.
    ///
    /// The node keeps the keys below the median, a freshly allocated right
    /// sibling takes the keys above it, and the median entry is handed back
    /// for the parent. Both halves end at or above the minimum fill for
    /// every valid order.
    fn split_overflowing(&mut self, node: &mut Node) -> TreeResult<Split> {
        let mid = self.order.median_index();
        let key = node.keys[mid];
        let value = node.values[mid];

        let right_keys = node.keys.split_off(mid + 1);
        let right_values = node.values.split_off(mid + 1);
        let right_children = if node.is_leaf {
            Vec::new()
        } else {
            node.children.split_off(mid + 1)
        };
        node.keys.truncate(mid);
        node.values.truncate(mid);

        let right_id = self.allocate_node(node.is_leaf)?;
        let mut right = Node::with_capacity(right_id, node.is_leaf, self.order);
        right.keys = right_keys;
        right.values = right_values;
        right.children = right_children;
        self.store.write(&right)?;

        Ok(Split {
            key,
            value,
            right: right_id,
        })
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    /// Remove `key` from the sub-tree rooted at `id`.
    ///
    /// The node behind `id` may be left under the minimum fill; the caller
    /// repairs it, so only the root ever stays deficient (and the public
    /// entry point collapses an emptied root).
    fn remove_from(&mut self, id: NodeId, key: i32) -> TreeResult<()> {
        let mut node = self.store.read(id)?;
        match node.find_key(key) {
            Ok(idx) => {
                if node.is_leaf {
                    // Case 1: shift the later entries over the vacated slot.
                    node.remove_entry(idx);
                    self.store.write(&node)
                } else {
                    self.remove_separator(node, idx)
                }
            }
            Err(idx) => {
                if node.is_leaf {
                    return Err(TreeError::KeyNotFound { key });
                }
                // Case 3: descend, then repair what the removal left behind.
                let child_id = node.children[idx];
                self.remove_from(child_id, key)?;
                self.repair_child(&mut node, idx)
            }
        }
    }

    /// Case 2: the key sits at `idx` of an internal node.
    ///
    /// The separator is overwritten with its in-order predecessor (2a) or
    /// successor (2b), preferring whichever flanking child holds spare keys,
    /// and the replacement is removed from that child's sub-tree. With both
    /// children at the minimum (2c) the predecessor path is taken anyway;
    /// the repair on unwind restores the child's fill.
    fn remove_separator(&mut self, node: Node, idx: usize) -> TreeResult<()> {
        let left_id = node.children[idx];
        let right_id = node.children[idx + 1];

        let left_has_spare = self.store.read(left_id)?.has_spare(self.order);
        if left_has_spare {
            return self.replace_and_descend(node, idx, left_id, true);
        }

        let right_has_spare = self.store.read(right_id)?.has_spare(self.order);
        if right_has_spare {
            return self.replace_and_descend(node, idx, right_id, false);
        }

        self.replace_and_descend(node, idx, left_id, true)
    }

    /// Overwrite the separator at `idx` with the extreme entry of `child_id`
    /// and delete that entry from the child's sub-tree.
    fn replace_and_descend(
        &mut self,
        mut node: Node,
        idx: usize,
        child_id: NodeId,
        predecessor: bool,
    ) -> TreeResult<()> {
        let (rk, rv) = if predecessor {
            self.rightmost_entry(child_id)?
        } else {
            self.leftmost_entry(child_id)?
        };
        node.keys[idx] = rk;
        node.values[idx] = rv;
        self.store.write(&node)?;

        self.remove_from(child_id, rk)?;

        let child_pos = if predecessor { idx } else { idx + 1 };
        self.repair_child(&mut node, child_pos)
    }

    /// Walk to the largest entry of the sub-tree rooted at `id`.
    fn rightmost_entry(&self, id: NodeId) -> TreeResult<(i32, i32)> {
        let mut current = id;
        loop {
            let node = self.store.read(current)?;
            if node.is_leaf {
                return Ok(node.last_entry());
            }
            current = node.children[node.n_keys()];
        }
    }

    /// Walk to the smallest entry of the sub-tree rooted at `id`.
    fn leftmost_entry(&self, id: NodeId) -> TreeResult<(i32, i32)> {
        let mut current = id;
        loop {
            let node = self.store.read(current)?;
            if node.is_leaf {
                return Ok(node.first_entry());
            }
            current = node.children[0];
        }
    }

    /// Restore the minimum fill of `parent.children[idx]` after a removal
    /// below it.
    ///
    /// - 3a: a sibling with spare keys rotates one entry through the parent
    ///   (left sibling preferred).
    /// - 3b: both siblings minimal: merge with the right sibling, falling
    ///   back to the left one when the deficient child is the rightmost.
    ///
    /// Writes the parent iff it was changed.
    fn repair_child(&mut self, parent: &mut Node, idx: usize) -> TreeResult<()> {
        let deficient = self
            .store
            .read(parent.children[idx])?
            .is_underfull(self.order);
        if !deficient {
            return Ok(());
        }

        if idx > 0 {
            let left_has_spare = self
                .store
                .read(parent.children[idx - 1])?
                .has_spare(self.order);
            if left_has_spare {
                return self.borrow_from_left(parent, idx);
            }
        }

        if idx < parent.n_keys() {
            let right_has_spare = self
                .store
                .read(parent.children[idx + 1])?
                .has_spare(self.order);
            if right_has_spare {
                return self.borrow_from_right(parent, idx);
            }
        }

        let sep = if idx < parent.n_keys() { idx } else { idx - 1 };
        self.merge_children(parent, sep)?;
        self.store.write(parent)
    }

    /// Rotate the left sibling's largest entry through the parent into the
    /// deficient child at `idx`.
    fn borrow_from_left(&mut self, parent: &mut Node, idx: usize) -> TreeResult<()> {
        let mut left = self.store.read(parent.children[idx - 1])?;
        let mut child = self.store.read(parent.children[idx])?;

        let (lk, lv) = left.remove_entry(left.n_keys() - 1);
        child.insert_entry(0, parent.keys[idx - 1], parent.values[idx - 1]);
        parent.keys[idx - 1] = lk;
        parent.values[idx - 1] = lv;

        // The outermost child pointer travels with the rotated entry.
        if !child.is_leaf {
            if let Some(moved) = left.children.pop() {
                child.children.insert(0, moved);
            }
        }

        self.store.write(&left)?;
        self.store.write(&child)?;
        self.store.write(parent)
    }

    /// Rotate the right sibling's smallest entry through the parent into the
    /// deficient child at `idx`.
    fn borrow_from_right(&mut self, parent: &mut Node, idx: usize) -> TreeResult<()> {
        let mut child = self.store.read(parent.children[idx])?;
        let mut right = self.store.read(parent.children[idx + 1])?;

        let (rk, rv) = right.remove_entry(0);
        child.keys.push(parent.keys[idx]);
        child.values.push(parent.values[idx]);
        parent.keys[idx] = rk;
        parent.values[idx] = rv;

        if !child.is_leaf && !right.children.is_empty() {
            child.children.push(right.children.remove(0));
        }

        self.store.write(&child)?;
        self.store.write(&right)?;
        self.store.write(parent)
    }

    /// Merge `parent.children[sep]`, the separator at `sep` and
    /// `parent.children[sep + 1]` into the left node; the right node's slot
    /// is freed.
    ///
    /// The caller writes the parent.
    fn merge_children(&mut self, parent: &mut Node, sep: usize) -> TreeResult<NodeId> {
        let left_id = parent.children[sep];
        let right_id = parent.children[sep + 1];

        let mut left = self.store.read(left_id)?;
        let mut right = self.store.read(right_id)?;

        let (sk, sv) = (parent.keys.remove(sep), parent.values.remove(sep));
        parent.children.remove(sep + 1);

        left.keys.push(sk);
        left.values.push(sv);
        left.keys.append(&mut right.keys);
        left.values.append(&mut right.values);
        left.children.append(&mut right.children);

        self.store.write(&left)?;
        self.free_node(right_id)?;
        Ok(left_id)
    }
}
