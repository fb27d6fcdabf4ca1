// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

use crate::error::TreeError;

#[test]
fn test_display_invalid_order() {
    let err = TreeError::InvalidOrder { order: 2, min: 3 };
    assert_eq!(err.to_string(), "Invalid B-Tree order: 2 (minimum: 3)");
}

#[test]
fn test_display_key_not_found() {
    let err = TreeError::KeyNotFound { key: 42 };
    assert_eq!(err.to_string(), "Key 42 not found");
}

#[test]
fn test_display_io_error() {
    let err = TreeError::IoError {
        operation: "write_slot".to_string(),
        reason: "disk full".to_string(),
    };
    assert_eq!(err.to_string(), "I/O error during 'write_slot': disk full");
}

#[test]
fn test_display_corrupted_slot() {
    let err = TreeError::CorruptedSlot {
        id: 7,
        reason: "CRC32 mismatch".to_string(),
    };
    assert_eq!(err.to_string(), "Corrupted slot 7: CRC32 mismatch");
}

#[test]
fn test_from_io_error() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: TreeError = io.into();
    match err {
        TreeError::IoError { operation, reason } => {
            assert_eq!(operation, "unknown");
            assert!(reason.contains("denied"));
        }
        other => panic!("Expected IoError, got {:?}", other),
    }
}

#[test]
fn test_error_is_std_error() {
    fn assert_std_error<E: std::error::Error>(_: &E) {}
    let err = TreeError::InvalidNodeId { id: 3 };
    assert_std_error(&err);
}
