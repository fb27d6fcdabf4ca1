// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Volatile node store.
//!
//! Slab of owned nodes: a `NodeId` is an index into the slab, freed slots
//! are kept on a free list and recycled by later allocations, matching the
//! slot discipline of the file-backed store so the tree algorithms observe
//! the same identity behaviour on both back-ends.

use super::NodeStore;
use crate::error::{TreeError, TreeResult};
use crate::tree::node::Node;
use crate::tree::types::{NodeId, Order};

/// In-memory node store backed by a slab.
#[derive(Debug)]
pub struct MemoryStore {
    order: Order,

    /// Slot slab; `None` marks a freed slot.
    nodes: Vec<Option<Node>>,

    /// Freed slot indices, recycled LIFO.
    free_ids: Vec<NodeId>,

    /// Recorded root identity.
    root: Option<NodeId>,
}

impl MemoryStore {
    /// Create an empty store for trees of the given order.
    pub fn new(order: Order) -> Self {
        Self {
            order,
            nodes: Vec::new(),
            free_ids: Vec::new(),
            root: None,
        }
    }

    /// Get the order this store was sized for.
    pub fn order(&self) -> Order {
        self.order
    }

    /// Count live (non-freed) slots.
    pub fn live_nodes(&self) -> u64 {
        self.nodes.iter().filter(|slot| slot.is_some()).count() as u64
    }
}

impl NodeStore for MemoryStore {
    fn allocate(&mut self, is_leaf: bool) -> TreeResult<NodeId> {
        let id = match self.free_ids.pop() {
            Some(recycled) => recycled,
            None => {
                if self.nodes.len() > i32::MAX as usize {
                    return Err(TreeError::AllocationFailed {
                        reason: "slot index space exhausted".to_string(),
                    });
                }
                self.nodes.push(None);
                (self.nodes.len() - 1) as NodeId
            }
        };
        self.nodes[id as usize] = Some(Node::with_capacity(id, is_leaf, self.order));
        Ok(id)
    }

    fn read(&self, id: NodeId) -> TreeResult<Node> {
        match self.nodes.get(id as usize) {
            Some(Some(node)) => Ok(node.clone()),
            _ => Err(TreeError::InvalidNodeId { id }),
        }
    }

    fn write(&mut self, node: &Node) -> TreeResult<()> {
        match self.nodes.get_mut(node.id as usize) {
            Some(slot) if slot.is_some() => {
                *slot = Some(node.clone());
                Ok(())
            }
            _ => Err(TreeError::InvalidNodeId { id: node.id }),
        }
    }

    fn free(&mut self, id: NodeId) -> TreeResult<()> {
        match self.nodes.get_mut(id as usize) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                self.free_ids.push(id);
                Ok(())
            }
            _ => Err(TreeError::InvalidNodeId { id }),
        }
    }

    fn root(&self) -> Option<NodeId> {
        self.root
    }

    fn set_root(&mut self, root: Option<NodeId>) -> TreeResult<()> {
        self.root = root;
        Ok(())
    }
}
