// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Level-order tree dump.
//!
//! Renders a tree into the transcript format of the operation-script driver:
//! the root's contents on a `root: ` line, then one line per deeper level
//! with the level's nodes comma-separated. A node prints as
//! `[ key0: v0, key1: v1 ]`; the empty tree prints `Árvore vazia`.

use crate::error::{TreeError, TreeResult};
use crate::store::NodeStore;
use crate::tree::{BTree, Node};
use std::io::Write;

/// Message printed for a tree without a root.
pub const EMPTY_TREE: &str = "Árvore vazia";

fn io_err(e: std::io::Error) -> TreeError {
    TreeError::IoError {
        operation: "write_dump".to_string(),
        reason: e.to_string(),
    }
}

/// Format a single node's entries as `[ k0: v0, k1: v1 ]`.
pub fn format_node(node: &Node) -> String {
    let entries: Vec<String> = node
        .keys
        .iter()
        .zip(node.values.iter())
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect();
    format!("[ {} ]", entries.join(", "))
}

/// Write the level-order dump of `tree` into `sink`.
///
/// ## Output Shape
/// ```text
/// root: [ 10: 100 ]
/// [ 5: 50 ], [ 20: 200, 30: 300 ]
/// ```
///
/// ## Error Conditions
/// - `IoError`: the sink rejected a write
/// - store errors while walking the tree
pub fn write_tree<S: NodeStore, W: Write>(tree: &BTree<S>, sink: &mut W) -> TreeResult<()> {
    let levels = tree.traverse()?;

    let root_level = match levels.first() {
        Some(level) => level,
        None => {
            writeln!(sink, "{}", EMPTY_TREE).map_err(io_err)?;
            return Ok(());
        }
    };

    writeln!(sink, "root: {}", format_node(&root_level[0])).map_err(io_err)?;

    for level in levels.iter().skip(1) {
        let rendered: Vec<String> = level.iter().map(format_node).collect();
        writeln!(sink, "{}", rendered.join(", ")).map_err(io_err)?;
    }

    Ok(())
}
