// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Core types for the B-Tree engine.
//!
//! Defines the node identifier, the validated order configuration and the
//! small result types returned by the public tree operations.

use crate::error::{TreeError, TreeResult};

/// Node identifier assigned by a store at allocation.
///
/// 32-bit identifier; the file-backed store encodes it as a signed 32-bit
/// slot index on disc, with -1 standing for "no node".
pub type NodeId = u32;

/// B-Tree order (maximum number of children per node).
///
/// Fixes all capacity bounds of the tree. Higher orders reduce tree height
/// but increase node size and split/merge cost.
///
/// ## Constraints
/// - Minimum order: 3 (allows 2-3 children per internal node)
///
/// ## Derived Bounds
/// - maximum keys per node: `t - 1`
/// - minimum keys per non-root node: `ceil(t/2) - 1`
/// - minimum children per non-root internal node: `ceil(t/2)`
///
/// The root is exempt from the minimum bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order(u16);

impl Order {
    /// Create new order with validation.
    ///
    /// ## Input
    /// - `order`: Desired tree order (must be >= 3)
    ///
    /// ## Output
    /// - `Ok(Order)`: Valid order created
    /// - `Err(TreeError::InvalidOrder)`: Order less than 3
    ///
    /// ## Performance
    /// - O(1) validation
    pub fn new(order: u16) -> TreeResult<Self> {
        if order < 3 {
            return Err(TreeError::InvalidOrder { order, min: 3 });
        }
        Ok(Self(order))
    }

    /// Get raw order value (maximum children per node).
    pub fn value(&self) -> u16 {
        self.0
    }

    /// Get maximum keys per node (`t - 1`).
    ///
    /// ## Performance
    /// - O(1) constant time
    pub fn max_keys(&self) -> usize {
        self.0 as usize - 1
    }

    /// Get minimum keys per non-root node (`ceil(t/2) - 1`).
    ///
    /// Non-root nodes must never drop below this bound; it is what keeps
    /// the height logarithmic.
    ///
    /// ## Performance
    /// - O(1) constant time
    pub fn min_keys(&self) -> usize {
        (self.0 as usize + 1) / 2 - 1
    }

    /// Get minimum children per non-root internal node (`ceil(t/2)`).
    pub fn min_children(&self) -> usize {
        (self.0 as usize + 1) / 2
    }

    /// Get the median index used when splitting a node (`floor((t-1)/2)`).
    ///
    /// Splitting an overflowing node of `t` keys around this index leaves
    /// `floor((t-1)/2)` keys on the left and `ceil((t-1)/2)` keys on the
    /// right, both at or above `min_keys()` for every valid order.
    pub fn median_index(&self) -> usize {
        (self.0 as usize - 1) / 2
    }
}

/// Location of a key found by `BTree::search`.
///
/// The node copy behind `node` can be fetched with `BTree::node` to read
/// the stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit {
    /// ID of the node holding the key.
    pub node: NodeId,

    /// Index of the key inside that node.
    pub index: usize,
}

/// Result of a successful insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The key was new and has been added.
    Inserted,

    /// The key already existed; its payload was overwritten in place.
    Updated,
}
