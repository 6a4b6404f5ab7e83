//! # Node Stores
//!
//! This module provides the storage plug point of the index: the `NodeStore`
//! trait and its two implementations.
//!
//! - `MemoryStore`: nodes live in a growable slot table; persisting a node
//!   writes its slot back. Useful for small indexes and as the reference
//!   implementation in tests.
//! - `FileStore`: nodes live as fixed-header records in a single
//!   random-access file; persisting rewrites only the mutable header prefix
//!   of an existing record.
//!
//! ## Identifier Discipline
//!
//! Stores issue `NodeId`s and resolve them on demand. Everything above the
//! store works exclusively in identifiers, so a tree built on one store can
//! be reopened later by constructing a fresh store over the same backing file.
//!
//! ## Write Model
//!
//! Allocation and persistence are `&mut self`: a single writer owns the store
//! while the tree is being built. Lookup paths (`find_root`, `load`,
//! `read_value`) are `&self` and safe to share between concurrent readers.

mod file;
mod headers;
mod memory;

pub use file::FileStore;
pub use headers::{
    FileHeader, RecordHeader, RecordLinks, FILE_HEADER_SIZE, FILE_MAGIC, RECORD_HEADER_SIZE,
    RECORD_LINKS_SIZE,
};
pub use memory::MemoryStore;

use eyre::Result;

use crate::node::{Node, NodeId};

/// Storage backend for tree nodes.
///
/// A store owns the durable representation of every node and the root
/// pointer. Structural mutations performed by the builder are pushed through
/// `persist` immediately, one node at a time; there is no batching and no
/// deferred flush.
pub trait NodeStore {
    type Key;
    type Value;

    /// Current root, if the store already holds a tree.
    fn find_root(&self) -> Result<Option<NodeId>>;

    /// Record `root` as the new root of the whole tree.
    fn replace_root(&mut self, root: NodeId) -> Result<()>;

    /// Durably create a new leaf node (height 1, no children).
    fn allocate(&mut self, key: Self::Key, value: Self::Value) -> Result<Node<Self::Key>>;

    /// Materialize the node behind `id`. The value payload is not read.
    fn load(&self, id: NodeId) -> Result<Node<Self::Key>>;

    /// Write back a node's height and child links.
    fn persist(&mut self, node: &Node<Self::Key>) -> Result<()>;

    /// Read the value payload of the node behind `id`.
    fn read_value(&self, id: NodeId) -> Result<Self::Value>;
}
