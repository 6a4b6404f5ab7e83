//! # In-Memory Node Store
//!
//! Nodes live in a growable slot table; a `NodeId` is the slot index. There
//! is no serialization: keys and values are held as typed data, and
//! "persisting" a node writes its height and child links back into its slot.

use eyre::{eyre, Result};

use super::NodeStore;
use crate::node::{Node, NodeId, Side};

#[derive(Debug)]
struct Slot<K, V> {
    key: K,
    value: V,
    height: u32,
    children: [Option<NodeId>; 2],
}

/// Slot-table store holding the whole tree in memory.
#[derive(Debug)]
pub struct MemoryStore<K, V> {
    slots: Vec<Slot<K, V>>,
    root: Option<NodeId>,
}

impl<K, V> MemoryStore<K, V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            root: None,
        }
    }

    /// Number of nodes ever allocated.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, id: NodeId) -> Result<&Slot<K, V>> {
        self.slots
            .get(id.raw() as usize)
            .ok_or_else(|| eyre!("unknown node id {} in memory store", id.raw()))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot<K, V>> {
        self.slots
            .get_mut(id.raw() as usize)
            .ok_or_else(|| eyre!("unknown node id {} in memory store", id.raw()))
    }
}

impl<K, V> Default for MemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone> NodeStore for MemoryStore<K, V> {
    type Key = K;
    type Value = V;

    fn find_root(&self) -> Result<Option<NodeId>> {
        Ok(self.root)
    }

    fn replace_root(&mut self, root: NodeId) -> Result<()> {
        self.slot(root)?;
        self.root = Some(root);
        Ok(())
    }

    fn allocate(&mut self, key: K, value: V) -> Result<Node<K>> {
        let id = NodeId::new(self.slots.len() as u64);
        self.slots.push(Slot {
            key: key.clone(),
            value,
            height: 1,
            children: [None, None],
        });
        Ok(Node::new(id, key))
    }

    fn load(&self, id: NodeId) -> Result<Node<K>> {
        let slot = self.slot(id)?;
        Ok(Node::with_parts(
            id,
            slot.key.clone(),
            slot.height,
            slot.children[0],
            slot.children[1],
        ))
    }

    fn persist(&mut self, node: &Node<K>) -> Result<()> {
        let slot = self.slot_mut(node.id())?;
        slot.height = node.height();
        slot.children = [node.child(Side::Left), node.child(Side::Right)];
        Ok(())
    }

    fn read_value(&self, id: NodeId) -> Result<V> {
        Ok(self.slot(id)?.value.clone())
    }
}
