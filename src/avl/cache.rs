//! Read-through retention of the top levels of a tree.
//!
//! Built once when a builder freezes into a `Tree`: every node within
//! `depth` levels of the root is loaded eagerly and kept, so lookups and
//! scans resolve the hottest part of the tree without a storage round-trip.
//! Deeper nodes, and all value payloads, stay behind the store.

use eyre::Result;
use hashbrown::HashMap;

use crate::node::{Node, NodeId, Side};
use crate::store::NodeStore;

#[derive(Debug)]
pub struct NodeCache<K> {
    nodes: HashMap<NodeId, Node<K>>,
}

impl<K> NodeCache<K> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    /// Load and retain every node within `depth` levels of `root`.
    ///
    /// `depth` counts the root as level 1; a depth of 0 retains nothing.
    pub fn populate<S>(store: &S, root: NodeId, depth: usize) -> Result<Self>
    where
        S: NodeStore<Key = K>,
    {
        let mut nodes = HashMap::new();
        if depth == 0 {
            return Ok(Self { nodes });
        }

        let mut frontier = vec![(root, 1usize)];
        while let Some((id, level)) = frontier.pop() {
            let node = store.load(id)?;
            if level < depth {
                for side in [Side::Left, Side::Right] {
                    if let Some(child) = node.child(side) {
                        frontier.push((child, level + 1));
                    }
                }
            }
            nodes.insert(id, node);
        }

        Ok(Self { nodes })
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<K>> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn perfect_three_level_store() -> (MemoryStore<i32, i32>, NodeId) {
        let mut store = MemoryStore::new();
        let mut ids = Vec::new();
        for key in [40, 20, 60, 10, 30, 50, 70] {
            ids.push(store.allocate(key, key).unwrap().id());
        }

        let mut root = store.load(ids[0]).unwrap();
        root.set_child(Side::Left, Some(ids[1]));
        root.set_child(Side::Right, Some(ids[2]));
        root.set_height(3);
        store.persist(&root).unwrap();

        for (parent, left, right) in [(1, 3, 4), (2, 5, 6)] {
            let mut node = store.load(ids[parent]).unwrap();
            node.set_child(Side::Left, Some(ids[left]));
            node.set_child(Side::Right, Some(ids[right]));
            node.set_height(2);
            store.persist(&node).unwrap();
        }

        (store, ids[0])
    }

    #[test]
    fn populate_retains_exactly_the_requested_levels() {
        let (store, root) = perfect_three_level_store();

        assert_eq!(NodeCache::populate(&store, root, 1).unwrap().len(), 1);
        assert_eq!(NodeCache::populate(&store, root, 2).unwrap().len(), 3);
        assert_eq!(NodeCache::populate(&store, root, 3).unwrap().len(), 7);
        assert_eq!(NodeCache::populate(&store, root, 10).unwrap().len(), 7);
    }

    #[test]
    fn populate_with_zero_depth_retains_nothing() {
        let (store, root) = perfect_three_level_store();

        let cache = NodeCache::<i32>::populate(&store, root, 0).unwrap();
        assert!(cache.is_empty());
        assert!(cache.get(root).is_none());
    }

    #[test]
    fn cached_nodes_keep_their_links() {
        let (store, root) = perfect_three_level_store();

        let cache = NodeCache::populate(&store, root, 2).unwrap();
        let cached_root = cache.get(root).unwrap();
        assert_eq!(*cached_root.key(), 40);
        assert!(cached_root.child(Side::Left).is_some());
        assert!(cached_root.child(Side::Right).is_some());
    }
}
