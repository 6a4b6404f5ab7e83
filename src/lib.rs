//! # avlstore - Embedded File-Backed AVL Index
//!
//! An ordered key/value index that keeps its nodes either fully in memory or
//! paged to a single random-access file, with a shallow in-memory cache of
//! the top tree levels to avoid repeated storage round-trips. Supports point
//! lookup by key and bounded/unbounded in-order range iteration.
//!
//! ## Quick Start
//!
//! ```ignore
//! use avlstore::{FileStore, TreeBuilder};
//!
//! let store = FileStore::<i32, String>::open("./index.avl")?;
//! let mut builder = TreeBuilder::new(store)?;
//!
//! for i in 1..=1000 {
//!     builder.insert(i, format!("Node {i}"))?;
//! }
//!
//! let tree = builder.build()?;
//! let entry = tree.get(&413)?.unwrap();
//! assert_eq!(entry.value()?, "Node 413");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Tree (read facade) / RangeIter     │
//! ├─────────────────────────────────────┤
//! │   TreeBuilder (AVL mutation engine)  │
//! ├─────────────────────────────────────┤
//! │   NodeCache (top levels, in memory)  │
//! ├─────────────────────────────────────┤
//! │   NodeStore trait                    │
//! │   ├── MemoryStore (slot table)       │
//! │   └── FileStore   (record file)      │
//! ├─────────────────────────────────────┤
//! │   Codec (typed value <-> bytes)      │
//! └─────────────────────────────────────┘
//! ```
//!
//! Everything above the store works in `NodeId`s (slot indexes in memory,
//! byte offsets on file), so a tree written through a `FileStore` can be
//! reopened later by pointing a fresh store and builder at the same file.
//!
//! ## Durability Model
//!
//! Every structural change (a new node, a rewritten child link, a root
//! replacement) is pushed to the store the moment it happens. There is no
//! write batching, no deferred flush, and also no multi-record transaction:
//! a crash between the writebacks of one rotation leaves the file
//! inconsistent. Nodes are never deleted and record payloads never move, so
//! the file grows append-only except for small in-place header rewrites.
//!
//! ## Concurrency Model
//!
//! Single writer, shared readers. The builder requires `&mut self` for every
//! mutation; the finished `Tree` takes `&self` everywhere and may be shared
//! between threads when its store allows it. The file store serializes all
//! access on one coarse file lock.
//!
//! ## Module Overview
//!
//! - [`avl`]: tree builder, read facade, range iterator, node cache
//! - [`store`]: the `NodeStore` trait plus memory and file implementations
//! - [`node`]: node and storage-identifier types
//! - [`codec`]: typed value <-> byte conversion for file-backed stores

pub mod avl;
pub mod codec;
pub mod node;
pub mod store;

pub use avl::{Entry, RangeBuilder, RangeIter, Tree, TreeBuilder, DEFAULT_CACHE_DEPTH};
pub use codec::Codec;
pub use node::{Node, NodeId, Side};
pub use store::{FileStore, MemoryStore, NodeStore};
