//! # Tree Builder
//!
//! The single-writer mutation engine of the index. A builder owns its store
//! exclusively, inserts one key at a time, and persists every structural
//! change the moment it happens; there is no batching and no deferred flush.
//!
//! ## Insertion
//!
//! Standard recursive AVL insertion: strictly-smaller keys descend left,
//! everything else descends right. After the recursive call returns the
//! (possibly rebalanced) subtree root, the parent link is rewritten and the
//! balance factor `height(left) - height(right)` is checked. A factor
//! outside `[-1, 1]` triggers a rebalance on the heavy side.
//!
//! ## Rebalancing
//!
//! The inserted key is compared against the heavy child's key to pick the
//! rotation shape:
//!
//! - straight (left-left / right-right): one rotation of the node toward the
//!   heavy side
//! - zig-zag (left-right / right-left): the heavy child is first rotated
//!   toward the opposite side, then the node is rotated as above
//!
//! A rotation clears all four affected link slots before reassigning them,
//! so a record never transiently points at a node that already moved. The
//! new subtree root bubbles up the recursion; when the root of the whole
//! tree changes, the store's root slot is rewritten.
//!
//! ## Duplicates
//!
//! Keys comparing equal are not rejected: they descend right and the index
//! behaves as a multiset. Lookups return the topmost match; range scans
//! yield every duplicate.

use std::cmp::Ordering;
use std::fmt::Debug;

use eyre::{ensure, eyre, Result};

use super::cache::NodeCache;
use super::tree::Tree;
use super::DEFAULT_CACHE_DEPTH;
use crate::node::{Node, NodeId, Side};
use crate::store::NodeStore;

/// Mutation engine producing immutable [`Tree`]s.
#[derive(Debug)]
pub struct TreeBuilder<S: NodeStore> {
    store: S,
    root: Option<NodeId>,
}

impl<S> TreeBuilder<S>
where
    S: NodeStore,
    S::Key: Ord,
{
    /// Wrap a store, picking up the tree it already holds (if any).
    pub fn new(store: S) -> Result<Self> {
        let root = store.find_root()?;
        Ok(Self { store, root })
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Insert a key/value pair, rebalancing along the insertion path.
    ///
    /// Duplicate keys are retained (multiset behavior).
    pub fn insert(&mut self, key: S::Key, value: S::Value) -> Result<()> {
        self.insert_with(key, || value)
    }

    /// Insert with a value accessor, evaluated once at allocation time.
    pub fn insert_with<F>(&mut self, key: S::Key, value: F) -> Result<()>
    where
        F: FnOnce() -> S::Value,
    {
        let node = self.store.allocate(key, value())?;

        match self.root {
            None => {
                self.root = Some(node.id());
                self.store.replace_root(node.id())?;
            }
            Some(root) => {
                let new_root = self.insert_at(root, &node)?;
                if new_root != root {
                    self.root = Some(new_root);
                    self.store.replace_root(new_root)?;
                }
            }
        }

        Ok(())
    }

    /// Freeze into an immutable [`Tree`], caching the default number of
    /// levels below the root.
    pub fn build(self) -> Result<Tree<S>> {
        self.build_with_cache_depth(DEFAULT_CACHE_DEPTH)
    }

    /// Freeze into an immutable [`Tree`], retaining every node within
    /// `depth` levels of the root (roughly `2^depth` nodes) in memory.
    pub fn build_with_cache_depth(self, depth: usize) -> Result<Tree<S>> {
        let cache = match self.root {
            Some(root) => NodeCache::populate(&self.store, root, depth)?,
            None => NodeCache::new(),
        };
        Ok(Tree::from_parts(self.store, self.root, cache))
    }

    fn insert_at(&mut self, at: NodeId, new: &Node<S::Key>) -> Result<NodeId> {
        let mut node = self.store.load(at)?;

        let side = if new.key() < node.key() {
            Side::Left
        } else {
            Side::Right
        };
        let attached = match node.child(side) {
            Some(child) => self.insert_at(child, new)?,
            None => new.id(),
        };
        self.attach(&mut node, side, Some(attached))?;

        let balance = self.balance_of(&node)?;
        if balance > 1 {
            self.rebalance(node, Side::Left, new.key())
        } else if balance < -1 {
            self.rebalance(node, Side::Right, new.key())
        } else {
            Ok(at)
        }
    }

    fn rebalance(&mut self, node: Node<S::Key>, heavy: Side, inserted: &S::Key) -> Result<NodeId> {
        let child_id = node
            .child(heavy)
            .ok_or_else(|| eyre!("unbalanced node {} has no {:?} child", node.id().raw(), heavy))?;
        let child = self.store.load(child_id)?;

        // Equal keys descend right on insertion, so a tie reads as the
        // right-hand path.
        let straight = match inserted.cmp(child.key()) {
            Ordering::Less => heavy == Side::Left,
            Ordering::Greater | Ordering::Equal => heavy == Side::Right,
        };

        if straight {
            self.rotate(node, heavy)
        } else {
            let new_child = self.rotate(child, heavy.opposite())?;
            let mut node = node;
            self.attach(&mut node, heavy, Some(new_child))?;
            self.rotate(node, heavy)
        }
    }

    /// The child at `side` becomes the new subtree root; its inner subtree
    /// moves under `parent`, and `parent` becomes the new root's opposite
    /// child. Link slots are cleared before reassignment.
    fn rotate(&mut self, mut parent: Node<S::Key>, side: Side) -> Result<NodeId> {
        let pivot_id = parent.child(side).ok_or_else(|| {
            eyre!(
                "rotation at node {} has no {:?} child",
                parent.id().raw(),
                side
            )
        })?;
        let mut pivot = self.store.load(pivot_id)?;
        let inner = pivot.child(side.opposite());

        self.attach(&mut pivot, side.opposite(), None)?;
        self.attach(&mut parent, side, None)?;
        self.attach(&mut parent, side, inner)?;
        self.attach(&mut pivot, side.opposite(), Some(parent.id()))?;

        Ok(pivot.id())
    }

    /// Rewrite one child link, recompute the node's height, and persist.
    fn attach(&mut self, node: &mut Node<S::Key>, side: Side, child: Option<NodeId>) -> Result<()> {
        node.set_child(side, child);
        let left = self.height_of(node.child(Side::Left))?;
        let right = self.height_of(node.child(Side::Right))?;
        node.set_height(1 + left.max(right));
        self.store.persist(node)
    }

    fn height_of(&self, id: Option<NodeId>) -> Result<u32> {
        match id {
            Some(id) => Ok(self.store.load(id)?.height()),
            None => Ok(0),
        }
    }

    fn balance_of(&self, node: &Node<S::Key>) -> Result<i64> {
        let left = self.height_of(node.child(Side::Left))?;
        let right = self.height_of(node.child(Side::Right))?;
        Ok(i64::from(left) - i64::from(right))
    }

    /// Verify BST ordering, height bookkeeping, and balance bounds across
    /// the whole tree, reporting every violation at once.
    ///
    /// Diagnostic only; nothing on the insert path depends on it.
    pub fn check(&self) -> Result<()>
    where
        S::Key: Debug,
    {
        let Some(root) = self.root else {
            return Ok(());
        };

        let mut violations = Vec::new();
        self.check_at(root, &mut violations)?;
        ensure!(
            violations.is_empty(),
            "tree integrity check failed:\n{}",
            violations.join("\n")
        );
        Ok(())
    }

    fn check_at(&self, id: NodeId, violations: &mut Vec<String>) -> Result<()>
    where
        S::Key: Debug,
    {
        let node = self.store.load(id)?;
        let mut left_height = 0;
        let mut right_height = 0;

        if let Some(left_id) = node.child(Side::Left) {
            let left = self.store.load(left_id)?;
            if left.key() > node.key() {
                violations.push(format!(
                    "left child {:?} sorts after parent {:?}",
                    left.key(),
                    node.key()
                ));
            }
            left_height = left.height();
            self.check_at(left_id, violations)?;
        }

        if let Some(right_id) = node.child(Side::Right) {
            let right = self.store.load(right_id)?;
            if right.key() < node.key() {
                violations.push(format!(
                    "right child {:?} sorts before parent {:?}",
                    right.key(),
                    node.key()
                ));
            }
            right_height = right.height();
            self.check_at(right_id, violations)?;
        }

        if node.height() != 1 + left_height.max(right_height) {
            violations.push(format!(
                "height {} at key {:?}, children report {} and {}",
                node.height(),
                node.key(),
                left_height,
                right_height
            ));
        }

        let balance = i64::from(left_height) - i64::from(right_height);
        if !(-1..=1).contains(&balance) {
            violations.push(format!(
                "balance {} out of bounds at key {:?}",
                balance,
                node.key()
            ));
        }

        Ok(())
    }
}
