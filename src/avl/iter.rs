//! # Range Iteration
//!
//! Lazy in-order traversal over an optional inclusive `[start, end]` key
//! window, implemented as an explicit state machine over a frame stack.
//!
//! ## Pruning
//!
//! A subtree is only entered if it could still contain qualifying keys:
//!
//! - left of a node only when `start` is absent or `start <= node.key`
//! - right of a node only when `end` is absent or `end >= node.key`
//!
//! Nodes are materialized as they are visited and nothing is buffered beyond
//! the descent stack, so iterating a narrow window over a large file-backed
//! tree touches a logarithmic number of records. An inverted window
//! (`start > end`) yields an empty sequence without error.
//!
//! The sequence is finite and non-restartable; cancellation is dropping the
//! iterator.

use eyre::Result;
use smallvec::SmallVec;

use super::tree::{Entry, Tree};
use crate::node::{Node, NodeId, Side};
use crate::store::NodeStore;

/// Configures the key window of a range scan.
pub struct RangeBuilder<'t, S: NodeStore> {
    tree: &'t Tree<S>,
    start: Option<S::Key>,
    end: Option<S::Key>,
}

impl<'t, S> RangeBuilder<'t, S>
where
    S: NodeStore,
    S::Key: Ord + Clone,
{
    pub(crate) fn new(tree: &'t Tree<S>) -> Self {
        Self {
            tree,
            start: None,
            end: None,
        }
    }

    /// Lowest key to yield, inclusive.
    pub fn start_at(mut self, key: S::Key) -> Self {
        self.start = Some(key);
        self
    }

    /// Highest key to yield, inclusive.
    pub fn end_at(mut self, key: S::Key) -> Self {
        self.end = Some(key);
        self
    }

    pub fn build(self) -> RangeIter<'t, S> {
        let mut stack = SmallVec::new();
        if let Some(root) = self.tree.root_id() {
            stack.push(Frame::Enter(root));
        }
        RangeIter {
            tree: self.tree,
            start: self.start,
            end: self.end,
            stack,
        }
    }
}

enum Frame<K> {
    /// Visit a subtree: descend its left edge as far as the window allows.
    Enter(NodeId),
    /// Left side done: yield the node if it qualifies, then go right.
    Emit(Node<K>),
}

/// Lazy in-order scan produced by [`RangeBuilder::build`].
pub struct RangeIter<'t, S: NodeStore> {
    tree: &'t Tree<S>,
    start: Option<S::Key>,
    end: Option<S::Key>,
    stack: SmallVec<[Frame<S::Key>; 16]>,
}

impl<'t, S> RangeIter<'t, S>
where
    S: NodeStore,
    S::Key: Ord + Clone,
{
    fn starts_at_or_before(&self, key: &S::Key) -> bool {
        self.start.as_ref().map_or(true, |start| start <= key)
    }

    fn ends_at_or_after(&self, key: &S::Key) -> bool {
        self.end.as_ref().map_or(true, |end| end >= key)
    }
}

impl<'t, S> Iterator for RangeIter<'t, S>
where
    S: NodeStore,
    S::Key: Ord + Clone,
{
    type Item = Result<Entry<'t, S>>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Enter(id) => {
                    let node = match self.tree.node(id) {
                        Ok(node) => node,
                        Err(err) => return Some(Err(err)),
                    };
                    let left = node
                        .child(Side::Left)
                        .filter(|_| self.starts_at_or_before(node.key()));
                    self.stack.push(Frame::Emit(node));
                    if let Some(left) = left {
                        self.stack.push(Frame::Enter(left));
                    }
                }
                Frame::Emit(node) => {
                    if let Some(right) = node.child(Side::Right) {
                        if self.ends_at_or_after(node.key()) {
                            self.stack.push(Frame::Enter(right));
                        }
                    }
                    if self.starts_at_or_before(node.key()) && self.ends_at_or_after(node.key()) {
                        return Some(Ok(Entry {
                            tree: self.tree,
                            node,
                        }));
                    }
                }
            }
        }
        None
    }
}
