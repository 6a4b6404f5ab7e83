//! # AVL Index
//!
//! The balanced-tree engine on top of a `NodeStore`:
//!
//! - [`TreeBuilder`]: the single-writer mutation engine. Inserts keys with
//!   AVL rebalancing, persisting every structural change through the store as
//!   it happens, then freezes into a [`Tree`].
//! - [`Tree`]: the immutable read facade. Point lookup and range iteration,
//!   resolving nodes through a shallow in-memory cache of the top levels.
//! - [`RangeIter`]: lazy, pruned in-order traversal over an optional
//!   inclusive `[start, end]` key window.
//!
//! ## Typical Use
//!
//! ```ignore
//! use avlstore::{MemoryStore, TreeBuilder};
//!
//! let mut builder = TreeBuilder::new(MemoryStore::new())?;
//! builder.insert(413, "Node 413".to_string())?;
//! let tree = builder.build()?;
//!
//! let entry = tree.get(&413)?.unwrap();
//! assert_eq!(entry.value()?, "Node 413");
//!
//! for entry in tree.range().start_at(100).end_at(500).build() {
//!     let entry = entry?;
//!     println!("{} = {}", entry.key(), entry.value()?);
//! }
//! ```

mod builder;
mod cache;
mod iter;
mod tree;

pub use builder::TreeBuilder;
pub use iter::{RangeBuilder, RangeIter};
pub use tree::{Entry, Tree};

/// Levels below the root retained in memory by `TreeBuilder::build`
/// (roughly 2^10 nodes).
pub const DEFAULT_CACHE_DEPTH: usize = 10;
