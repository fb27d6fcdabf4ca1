// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Error types for keytree operations.
//!
//! Provides structured error handling with detailed context for debugging.

use std::fmt;

/// Standard Result type for all keytree operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Error types for keytree operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Invalid B-Tree order (must be at least 3).
    InvalidOrder { order: u16, min: u16 },

    /// Node ID does not name a live slot in the store.
    InvalidNodeId { id: u32 },

    /// Key not present in the tree (search miss during removal).
    KeyNotFound { key: i32 },

    /// Node store could not create a new slot.
    AllocationFailed { reason: String },

    /// I/O error during file operations.
    IoError { operation: String, reason: String },

    /// Slot record failed validation (checksum or field range).
    CorruptedSlot { id: u32, reason: String },

    /// Index file header is malformed or carries the wrong magic bytes.
    InvalidFileFormat { reason: String },

    /// Operation script line could not be parsed.
    ParseError { line: usize, reason: String },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidOrder { order, min } => {
                write!(f, "Invalid B-Tree order: {} (minimum: {})", order, min)
            }
            Self::InvalidNodeId { id } => {
                write!(f, "Invalid node ID: {}", id)
            }
            Self::KeyNotFound { key } => {
                write!(f, "Key {} not found", key)
            }
            Self::AllocationFailed { reason } => {
                write!(f, "Node allocation failed: {}", reason)
            }
            Self::IoError { operation, reason } => {
                write!(f, "I/O error during '{}': {}", operation, reason)
            }
            Self::CorruptedSlot { id, reason } => {
                write!(f, "Corrupted slot {}: {}", id, reason)
            }
            Self::InvalidFileFormat { reason } => {
                write!(f, "Invalid index file: {}", reason)
            }
            Self::ParseError { line, reason } => {
                write!(f, "Parse error at line {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for TreeError {}

// Convenience conversion from std::io::Error
impl From<std::io::Error> for TreeError {
    fn from(err: std::io::Error) -> Self {
        TreeError::IoError {
            operation: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}
