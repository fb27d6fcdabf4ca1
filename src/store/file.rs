// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! File-backed node store.
//!
//! Persists every node into a fixed-size slot of a single index file,
//! accessed through a memory map. The file grows in chunks of slots and is
//! remapped on demand; every mutation is flushed so a subsequent read of the
//! same ID observes the new bytes.
//!
//! Freed slots are tombstoned in place and recycled by later allocations;
//! the free list and the live-node count are rebuilt by a slot scan when an
//! existing file is opened. The header records the order and the root ID, so
//! a closed tree is rehydrated from the file alone.

use super::slot::{self, Header, HEADER_SIZE, NO_NODE};
use super::NodeStore;
use crate::error::{TreeError, TreeResult};
use crate::tree::node::Node;
use crate::tree::types::{NodeId, Order};
use memmap2::MmapMut;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Number of slots the file grows by when full.
const GROW_SLOTS: usize = 64;

/// Persistent node store over fixed-size file slots.
pub struct FileStore {
    /// Path to the index file.
    path: PathBuf,

    /// File handle, held for the store's lifetime.
    file: File,

    /// Memory-mapped file (writable).
    mmap: MmapMut,

    /// Tree order the file is bound to.
    order: Order,

    /// Total allocated slots, live and tombstoned.
    slot_count: u32,

    /// Recorded root identity.
    root: Option<NodeId>,

    /// Tombstoned slot indices, recycled LIFO.
    free_ids: Vec<NodeId>,

    /// Live slot count.
    live: u64,
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("order", &self.order)
            .field("slot_count", &self.slot_count)
            .field("root", &self.root)
            .field("live", &self.live)
            .finish()
    }
}

impl FileStore {
    /// Create a fresh index file for trees of the given order.
    ///
    /// An existing file at `path` is truncated.
    ///
    /// ## Error Conditions
    /// - Parent directory missing or not writable
    /// - Disk full while sizing the initial chunk
    pub fn create<P: AsRef<Path>>(path: P, order: Order) -> TreeResult<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| TreeError::IoError {
                operation: "create_index".to_string(),
                reason: e.to_string(),
            })?;

        let initial_size = HEADER_SIZE + GROW_SLOTS * slot::slot_size(order);
        file.set_len(initial_size as u64)
            .map_err(|e| TreeError::IoError {
                operation: "size_index".to_string(),
                reason: e.to_string(),
            })?;

        let mmap = unsafe {
            MmapMut::map_mut(&file).map_err(|e| TreeError::IoError {
                operation: "map_index".to_string(),
                reason: e.to_string(),
            })?
        };

        let mut store = Self {
            path,
            file,
            mmap,
            order,
            slot_count: 0,
            root: None,
            free_ids: Vec::new(),
            live: 0,
        };
        store.write_header();
        store.flush("create_index")?;
        Ok(store)
    }

    /// Open an existing index file and rehydrate order, root and free list.
    ///
    /// ## Error Conditions
    /// - `IoError`: file missing or not mappable
    /// - `InvalidFileFormat`: header malformed or truncated slot area
    pub fn open<P: AsRef<Path>>(path: P) -> TreeResult<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| TreeError::IoError {
                operation: "open_index".to_string(),
                reason: e.to_string(),
            })?;

        let mmap = unsafe {
            MmapMut::map_mut(&file).map_err(|e| TreeError::IoError {
                operation: "map_index".to_string(),
                reason: e.to_string(),
            })?
        };

        let header = Header::from_bytes(&mmap)?;
        let order = Order::new(header.order)?;

        let needed = HEADER_SIZE + header.slot_count as usize * slot::slot_size(order);
        if needed > mmap.len() {
            return Err(TreeError::InvalidFileFormat {
                reason: format!(
                    "header claims {} slots but file holds {} bytes",
                    header.slot_count,
                    mmap.len()
                ),
            });
        }

        let root = if header.root == NO_NODE {
            None
        } else {
            Some(header.root as NodeId)
        };

        let mut store = Self {
            path,
            file,
            mmap,
            order,
            slot_count: header.slot_count,
            root,
            free_ids: Vec::new(),
            live: 0,
        };

        // Rebuild free list and live count from the slot statuses.
        for id in 0..store.slot_count {
            if slot::is_live(store.slot_bytes(id)) {
                store.live += 1;
            } else {
                store.free_ids.push(id);
            }
        }

        Ok(store)
    }

    /// Get the order this file is bound to.
    pub fn order(&self) -> Order {
        self.order
    }

    /// Get the index file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Count live (non-tombstoned) slots.
    pub fn live_nodes(&self) -> u64 {
        self.live
    }

    fn slot_offset(&self, id: NodeId) -> usize {
        HEADER_SIZE + id as usize * slot::slot_size(self.order)
    }

    fn slot_bytes(&self, id: NodeId) -> &[u8] {
        let offset = self.slot_offset(id);
        &self.mmap[offset..offset + slot::slot_size(self.order)]
    }

    fn slot_bytes_mut(&mut self, id: NodeId) -> &mut [u8] {
        let offset = self.slot_offset(id);
        let size = slot::slot_size(self.order);
        &mut self.mmap[offset..offset + size]
    }

    /// Rewrite the header bytes from the current metadata.
    fn write_header(&mut self) {
        let header = Header {
            order: self.order.value(),
            slot_count: self.slot_count,
            root: match self.root {
                Some(id) => id as i32,
                None => NO_NODE,
            },
        };
        self.mmap[0..HEADER_SIZE].copy_from_slice(&header.to_bytes());
    }

    /// Grow the file (and remap) until it holds `slots` slots.
    fn ensure_capacity(&mut self, slots: usize) -> TreeResult<()> {
        let needed = HEADER_SIZE + slots * slot::slot_size(self.order);
        if needed <= self.mmap.len() {
            return Ok(());
        }

        let new_size = HEADER_SIZE + (slots + GROW_SLOTS) * slot::slot_size(self.order);
        self.file
            .set_len(new_size as u64)
            .map_err(|e| TreeError::AllocationFailed {
                reason: format!("growing index file failed: {}", e),
            })?;

        self.mmap = unsafe {
            MmapMut::map_mut(&self.file).map_err(|e| TreeError::IoError {
                operation: "remap_index".to_string(),
                reason: e.to_string(),
            })?
        };

        Ok(())
    }

    /// Flush the map so reads observe the written bytes.
    fn flush(&self, operation: &str) -> TreeResult<()> {
        self.mmap.flush().map_err(|e| TreeError::IoError {
            operation: operation.to_string(),
            reason: e.to_string(),
        })
    }

    /// Validate that `id` names a live slot.
    fn check_live(&self, id: NodeId) -> TreeResult<()> {
        if id >= self.slot_count || !slot::is_live(self.slot_bytes(id)) {
            return Err(TreeError::InvalidNodeId { id });
        }
        Ok(())
    }
}

impl NodeStore for FileStore {
    fn allocate(&mut self, is_leaf: bool) -> TreeResult<NodeId> {
        let id = match self.free_ids.pop() {
            Some(recycled) => recycled,
            None => {
                if self.slot_count as i64 > i32::MAX as i64 {
                    return Err(TreeError::AllocationFailed {
                        reason: "slot index space exhausted".to_string(),
                    });
                }
                self.ensure_capacity(self.slot_count as usize + 1)?;
                let id = self.slot_count;
                self.slot_count += 1;
                self.write_header();
                id
            }
        };

        let node = Node::with_capacity(id, is_leaf, self.order);
        let order = self.order;
        slot::encode_node(&node, order, self.slot_bytes_mut(id));
        self.live += 1;
        self.flush("allocate_slot")?;
        Ok(id)
    }

    fn read(&self, id: NodeId) -> TreeResult<Node> {
        self.check_live(id)?;
        slot::decode_node(self.slot_bytes(id), self.order, id)
    }

    fn write(&mut self, node: &Node) -> TreeResult<()> {
        self.check_live(node.id)?;
        let order = self.order;
        slot::encode_node(node, order, self.slot_bytes_mut(node.id));
        self.flush("write_slot")
    }

    fn free(&mut self, id: NodeId) -> TreeResult<()> {
        self.check_live(id)?;
        slot::mark_free(self.slot_bytes_mut(id));
        self.free_ids.push(id);
        self.live -= 1;
        self.flush("free_slot")
    }

    fn root(&self) -> Option<NodeId> {
        self.root
    }

    fn set_root(&mut self, root: Option<NodeId>) -> TreeResult<()> {
        self.root = root;
        self.write_header();
        self.flush("write_header")
    }
}
