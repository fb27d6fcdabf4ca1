// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

use crate::error::{TreeError, TreeResult};
use crate::store::{FileStore, NodeStore};
use crate::tree::types::Order;
use tempfile::tempdir;

fn order4() -> Order {
    Order::new(4).unwrap()
}

#[test]
fn test_create_and_allocate() -> TreeResult<()> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.kt");

    let mut store = FileStore::create(&path, order4())?;
    assert!(path.exists());
    assert_eq!(store.live_nodes(), 0);

    let id = store.allocate(true)?;
    assert_eq!(id, 0);
    assert_eq!(store.live_nodes(), 1);

    let node = store.read(id)?;
    assert!(node.is_leaf);
    assert_eq!(node.n_keys(), 0);

    Ok(())
}

#[test]
fn test_write_then_read_sees_new_bytes() -> TreeResult<()> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.kt");

    let mut store = FileStore::create(&path, order4())?;
    let id = store.allocate(true)?;

    let mut node = store.read(id)?;
    node.keys = vec![10, 20, 30];
    node.values = vec![100, 200, 300];
    store.write(&node)?;

    let reread = store.read(id)?;
    assert_eq!(reread.keys, vec![10, 20, 30]);
    assert_eq!(reread.values, vec![100, 200, 300]);

    Ok(())
}

#[test]
fn test_read_invalid_id() -> TreeResult<()> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.kt");

    let store = FileStore::create(&path, order4())?;
    assert_eq!(store.read(0), Err(TreeError::InvalidNodeId { id: 0 }));

    Ok(())
}

#[test]
fn test_free_tombstones_and_recycles() -> TreeResult<()> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.kt");

    let mut store = FileStore::create(&path, order4())?;
    let a = store.allocate(true)?;
    let b = store.allocate(false)?;

    store.free(a)?;
    assert_eq!(store.read(a), Err(TreeError::InvalidNodeId { id: a }));
    assert_eq!(store.live_nodes(), 1);

    // Tombstoned slot is recycled before the file grows.
    let c = store.allocate(true)?;
    assert_eq!(c, a);
    assert_eq!(store.live_nodes(), 2);
    assert!(store.read(b).is_ok());

    Ok(())
}

#[test]
fn test_grow_past_initial_chunk() -> TreeResult<()> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.kt");

    let mut store = FileStore::create(&path, order4())?;

    // First chunk holds 64 slots; allocate past it to force growth + remap.
    let mut ids = Vec::new();
    for i in 0..130 {
        let id = store.allocate(true)?;
        let mut node = store.read(id)?;
        node.keys = vec![i];
        node.values = vec![i * 2];
        store.write(&node)?;
        ids.push(id);
    }

    for (i, id) in ids.iter().enumerate() {
        let node = store.read(*id)?;
        assert_eq!(node.keys, vec![i as i32]);
    }

    Ok(())
}

#[test]
fn test_open_rehydrates_metadata() -> TreeResult<()> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.kt");

    {
        let mut store = FileStore::create(&path, order4())?;
        let a = store.allocate(true)?;
        let b = store.allocate(true)?;
        let _c = store.allocate(true)?;

        let mut node = store.read(a)?;
        node.keys = vec![1];
        node.values = vec![10];
        store.write(&node)?;

        store.free(b)?;
        store.set_root(Some(a))?;
    }

    let store = FileStore::open(&path)?;
    assert_eq!(store.order().value(), 4);
    assert_eq!(store.root(), Some(0));
    assert_eq!(store.live_nodes(), 2);

    let node = store.read(0)?;
    assert_eq!(node.keys, vec![1]);

    // The tombstoned slot is still rejected after reopen.
    assert_eq!(store.read(1), Err(TreeError::InvalidNodeId { id: 1 }));

    Ok(())
}

#[test]
fn test_reopen_recycles_tombstones() -> TreeResult<()> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.kt");

    {
        let mut store = FileStore::create(&path, order4())?;
        for _ in 0..3 {
            store.allocate(true)?;
        }
        store.free(1)?;
    }

    let mut store = FileStore::open(&path)?;
    let recycled = store.allocate(false)?;
    assert_eq!(recycled, 1);

    Ok(())
}

#[test]
fn test_open_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.kt");
    assert!(matches!(
        FileStore::open(&path),
        Err(TreeError::IoError { .. })
    ));
}

#[test]
fn test_open_rejects_foreign_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("not_an_index.kt");
    std::fs::write(&path, b"definitely not a keytree index file").unwrap();

    assert!(matches!(
        FileStore::open(&path),
        Err(TreeError::InvalidFileFormat { .. })
    ));
}

#[test]
fn test_root_sentinel_roundtrip() -> TreeResult<()> {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.kt");

    {
        let mut store = FileStore::create(&path, order4())?;
        store.set_root(Some(7))?;
        store.set_root(None)?;
    }

    let store = FileStore::open(&path)?;
    assert_eq!(store.root(), None);

    Ok(())
}
