//! Durability scenarios against the file-backed store: building a large
//! index, closing the file, and reading (or continuing to build) through a
//! fresh store over the same file.

use avlstore::{FileStore, TreeBuilder};
use tempfile::tempdir;

#[test]
fn large_file_tree_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.avl");

    let store = FileStore::<i32, String>::create(&path).unwrap();
    let mut builder = TreeBuilder::new(store).unwrap();

    for i in 1..=1750 {
        builder.insert(i, format!("Node {i}")).unwrap();
        let j = 3507 - i;
        builder.insert(j, format!("Node {j}")).unwrap();
    }
    builder.check().unwrap();

    let tree = builder.build().unwrap();

    let entry = tree.get(&413).unwrap().unwrap();
    assert_eq!(*entry.key(), 413);
    assert_eq!(entry.value().unwrap(), "Node 413");

    assert!(tree.get(&5700).unwrap().is_none());
    assert_eq!(tree.get(&3506).unwrap().unwrap().value().unwrap(), "Node 3506");
    assert_eq!(tree.get(&1503).unwrap().unwrap().value().unwrap(), "Node 1503");
    assert_eq!(tree.get(&2800).unwrap().unwrap().value().unwrap(), "Node 2800");

    drop(tree);

    let reopened = FileStore::<i32, String>::open(&path).unwrap();
    let tree = TreeBuilder::new(reopened).unwrap().build().unwrap();

    let entry = tree.get(&702).unwrap().unwrap();
    assert_eq!(*entry.key(), 702);
    assert_eq!(entry.value().unwrap(), "Node 702");
}

fn xorshift64(state: &mut u64) -> u64 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    *state = x;
    x
}

#[test]
fn every_inserted_key_reads_back_after_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.avl");

    let mut keys = Vec::new();
    let mut state = 0x2545_f491_4f6c_dd1du64;
    while keys.len() < 256 {
        let key = (xorshift64(&mut state) % 100_000) as i64;
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    {
        let store = FileStore::<i64, String>::create(&path).unwrap();
        let mut builder = TreeBuilder::new(store).unwrap();
        for &key in &keys {
            builder.insert(key, format!("value for {key}")).unwrap();
        }
        builder.check().unwrap();
    }

    let store = FileStore::<i64, String>::open(&path).unwrap();
    let tree = TreeBuilder::new(store).unwrap().build().unwrap();

    for key in keys {
        let entry = tree.get(&key).unwrap().unwrap();
        assert_eq!(entry.value().unwrap(), format!("value for {key}"));
    }
}

#[test]
fn a_reopened_builder_keeps_inserting_into_the_same_tree() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.avl");

    {
        let store = FileStore::<i32, String>::create(&path).unwrap();
        let mut builder = TreeBuilder::new(store).unwrap();
        for i in 1..=50 {
            builder.insert(i, format!("Node {i}")).unwrap();
        }
        builder.check().unwrap();
    }

    let store = FileStore::<i32, String>::open(&path).unwrap();
    let mut builder = TreeBuilder::new(store).unwrap();
    assert!(!builder.is_empty());

    for i in 51..=100 {
        builder.insert(i, format!("Node {i}")).unwrap();
    }
    builder.check().unwrap();

    let tree = builder.build().unwrap();
    for i in 1..=100 {
        let entry = tree.get(&i).unwrap().unwrap();
        assert_eq!(entry.value().unwrap(), format!("Node {i}"));
    }
}

#[test]
fn scans_read_straight_from_the_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.avl");

    let store = FileStore::<i32, String>::create(&path).unwrap();
    let mut builder = TreeBuilder::new(store).unwrap();
    for i in 0..100 {
        builder.insert(i, format!("Node {i}")).unwrap();
    }

    // Depth 0 leaves no node cached; every step of the scan goes to disk.
    let tree = builder.build_with_cache_depth(0).unwrap();

    let mut expected = 0;
    for entry in tree.range().start_at(0).end_at(99).build() {
        let entry = entry.unwrap();
        assert_eq!(*entry.key(), expected);
        assert_eq!(entry.value().unwrap(), format!("Node {expected}"));
        expected += 1;
    }
    assert_eq!(expected, 100);
}
