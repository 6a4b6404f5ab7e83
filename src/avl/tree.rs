//! # Read-Only Tree Facade
//!
//! An immutable view over a finished index. Lookups descend from the root in
//! O(log n) comparisons, resolving each node through the top-level cache or,
//! below it, the backing store. Node values stay behind [`Entry::value`] and
//! are only decoded when asked for.
//!
//! Every method takes `&self`; a `Tree` is safe to share between concurrent
//! readers whenever its store is.

use std::cmp::Ordering;

use eyre::Result;

use super::cache::NodeCache;
use super::iter::RangeBuilder;
use crate::node::{Node, NodeId, Side};
use crate::store::NodeStore;

/// Immutable ordered index over a node store.
pub struct Tree<S: NodeStore> {
    store: S,
    root: Option<NodeId>,
    cache: NodeCache<S::Key>,
}

impl<S: NodeStore> Tree<S> {
    pub(crate) fn from_parts(store: S, root: Option<NodeId>, cache: NodeCache<S::Key>) -> Self {
        Self { store, root, cache }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub(crate) fn root_id(&self) -> Option<NodeId> {
        self.root
    }
}

impl<S> Tree<S>
where
    S: NodeStore,
    S::Key: Ord + Clone,
{
    /// Look up a key. With duplicate keys present, the topmost match wins.
    pub fn get(&self, key: &S::Key) -> Result<Option<Entry<'_, S>>> {
        let Some(mut id) = self.root else {
            return Ok(None);
        };

        loop {
            let node = self.node(id)?;
            match key.cmp(node.key()) {
                Ordering::Equal => return Ok(Some(Entry { tree: self, node })),
                Ordering::Less => match node.child(Side::Left) {
                    Some(left) => id = left,
                    None => return Ok(None),
                },
                Ordering::Greater => match node.child(Side::Right) {
                    Some(right) => id = right,
                    None => return Ok(None),
                },
            }
        }
    }

    /// Start building an in-order range scan; bounds are optional and
    /// inclusive.
    pub fn range(&self) -> RangeBuilder<'_, S> {
        RangeBuilder::new(self)
    }

    /// Resolve a node through the cache, falling back to the store.
    pub(crate) fn node(&self, id: NodeId) -> Result<Node<S::Key>> {
        if let Some(node) = self.cache.get(id) {
            return Ok(node.clone());
        }
        self.store.load(id)
    }

    pub(crate) fn read_value(&self, id: NodeId) -> Result<S::Value> {
        self.store.read_value(id)
    }
}

/// Borrowed view of one index entry.
///
/// The key is already materialized; the value is read through the store on
/// every [`Entry::value`] call.
pub struct Entry<'t, S: NodeStore> {
    pub(crate) tree: &'t Tree<S>,
    pub(crate) node: Node<S::Key>,
}

impl<'t, S> Entry<'t, S>
where
    S: NodeStore,
    S::Key: Ord + Clone,
{
    pub fn key(&self) -> &S::Key {
        self.node.key()
    }

    pub fn value(&self) -> Result<S::Value> {
        self.tree.read_value(self.node.id())
    }
}
