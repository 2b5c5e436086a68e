//! Index-based node arena with a free list.
//!
//! Nodes are addressed by [`NodeId`]. Retiring a node pushes its index on a
//! free stack instead of releasing it; the next allocation pops the index
//! and reuses the node's child vectors with their capacity intact. Storage
//! is only released by [`NodeArena::destroy_all`] or when the arena drops.

use crate::error::Error;
use crate::token::Symbol;

/// Handle to a node in a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// The raw index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    #[inline]
    fn slot(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A parse tree node.
#[derive(Debug, Default)]
pub struct Node {
    /// Grammar element, or `None` once the node is on the free list.
    pub(crate) element: Option<Symbol>,
    /// Matched alternative, or `None` until one matched.
    pub(crate) rule: Option<usize>,
    /// Index of the first token the node's match began at.
    pub(crate) start_token: usize,
    /// Token indices matched directly by this node.
    pub(crate) tokens: Vec<usize>,
    /// Child nodes, in match order.
    pub(crate) children: Vec<NodeId>,
    /// Whether the host was told this node matched.
    pub(crate) announced: bool,
}

impl Node {
    #[inline]
    pub fn is_live(&self) -> bool {
        self.element.is_some()
    }
}

/// Arena of reusable parse tree nodes.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
}

impl NodeArena {
    /// Create an empty arena.
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Allocate a node for `element`, recycling a retired one if possible.
    pub fn allocate(&mut self, element: Symbol, start_token: usize) -> Result<NodeId, Error> {
        if let Some(id) = self.free.pop() {
            let node = &mut self.nodes[id.slot()];
            node.element = Some(element);
            node.rule = None;
            node.start_token = start_token;
            node.announced = false;
            return Ok(id);
        }

        let index = u32::try_from(self.nodes.len()).map_err(|_| Error::InsufficientResources)?;
        self.nodes.try_reserve(1)?;
        self.free.try_reserve(self.nodes.len() + 1 - self.free.len())?;
        self.nodes.push(Node {
            element: Some(element),
            start_token,
            ..Node::default()
        });
        Ok(NodeId(index))
    }

    /// Get a live node.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.slot()).filter(|node| node.is_live())
    }

    /// Get a live node mutably.
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, Error> {
        self.nodes
            .get_mut(id.slot())
            .filter(|node| node.is_live())
            .ok_or(Error::StaleNode(id.0))
    }

    /// Append a token index to a node.
    pub(crate) fn push_token(&mut self, id: NodeId, token: usize) -> Result<(), Error> {
        let node = self.get_mut(id)?;
        node.tokens.try_reserve(1)?;
        node.tokens.push(token);
        Ok(())
    }

    /// Append a child node.
    pub(crate) fn push_child(&mut self, id: NodeId, child: NodeId) -> Result<(), Error> {
        let node = self.get_mut(id)?;
        node.children.try_reserve(1)?;
        node.children.push(child);
        Ok(())
    }

    /// Put a node on the free list. Its child lists are emptied but keep
    /// their capacity; the children themselves are not touched.
    pub(crate) fn retire(&mut self, id: NodeId) -> Result<(), Error> {
        let node = self.get_mut(id)?;
        node.element = None;
        node.rule = None;
        node.announced = false;
        node.tokens.clear();
        node.children.clear();
        // Reserved in `allocate`, so this never reallocates.
        self.free.push(id);
        Ok(())
    }

    /// Release every node, live or retired, along with its storage.
    pub fn destroy_all(&mut self) {
        self.nodes = Vec::new();
        self.free = Vec::new();
    }

    /// Number of live nodes.
    pub fn live_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Number of nodes waiting on the free list.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Total number of node slots ever allocated.
    pub fn slot_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_recycle() {
        let mut arena = NodeArena::new();
        let a = arena.allocate(1024, 0).unwrap();
        let b = arena.allocate(1025, 3).unwrap();
        assert_ne!(a, b);
        assert_eq!(arena.live_count(), 2);

        arena.push_token(a, 7).unwrap();
        arena.push_child(a, b).unwrap();
        arena.retire(a).unwrap();
        assert!(arena.get(a).is_none());
        assert_eq!(arena.free_count(), 1);

        let c = arena.allocate(1026, 5).unwrap();
        assert_eq!(c, a);
        let node = arena.get(c).unwrap();
        assert_eq!(node.element, Some(1026));
        assert_eq!(node.start_token, 5);
        assert!(node.tokens.is_empty());
        assert!(node.children.is_empty());
        assert!(node.tokens.capacity() >= 1);
        assert_eq!(arena.slot_count(), 2);
    }

    #[test]
    fn test_double_retire_is_detected() {
        let mut arena = NodeArena::new();
        let a = arena.allocate(1024, 0).unwrap();
        arena.retire(a).unwrap();
        assert!(matches!(arena.retire(a), Err(Error::StaleNode(0))));
        assert_eq!(arena.free_count(), 1);
    }

    #[test]
    fn test_destroy_all() {
        let mut arena = NodeArena::new();
        let a = arena.allocate(1024, 0).unwrap();
        arena.allocate(1024, 0).unwrap();
        arena.retire(a).unwrap();
        arena.destroy_all();
        assert_eq!(arena.slot_count(), 0);
        assert_eq!(arena.free_count(), 0);
        assert!(arena.get(a).is_none());
    }
}
