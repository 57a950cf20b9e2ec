use crate::arena::{Entry, TypedArena};
use std::fmt;

/// A struct representing an internal node of a treap.
///
/// Nodes are owned by the arena of their treap. `left` and `right` point downwards; `parent` is a
/// back link that is only followed when rotating a node upwards or when validating the tree.
pub struct Node<T> {
    pub key: T,
    pub priority: i64,
    pub parent: Option<Entry>,
    pub left: Option<Entry>,
    pub right: Option<Entry>,
}

impl<T> Node<T> {
    pub fn new(key: T, priority: i64) -> Self {
        Node {
            key,
            priority,
            parent: None,
            left: None,
            right: None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.priority)
    }
}

/// A read-only view of a node inside a `Treap<T>`.
///
/// # Examples
///
/// ```
/// use sift_treap::treap::Treap;
///
/// let mut t = Treap::new();
/// t.insert("b", Some(2)).unwrap();
/// t.insert("a", Some(1)).unwrap();
///
/// let root = t.root().unwrap();
/// assert_eq!(root.key(), &"b");
/// assert_eq!(root.left().map(|node| *node.key()), Some("a"));
/// assert_eq!(root.to_string(), "b (2)");
/// ```
pub struct NodeRef<'a, T> {
    arena: &'a TypedArena<Node<T>>,
    entry: Entry,
}

impl<'a, T> NodeRef<'a, T> {
    pub(crate) fn new(arena: &'a TypedArena<Node<T>>, entry: Entry) -> Self {
        NodeRef { arena, entry }
    }

    fn node(&self) -> &'a Node<T> {
        &self.arena[self.entry]
    }

    fn link(&self, entry: Option<Entry>) -> Option<NodeRef<'a, T>> {
        entry.map(|entry| NodeRef::new(self.arena, entry))
    }

    /// Returns the key of the node.
    pub fn key(&self) -> &'a T {
        &self.node().key
    }

    /// Returns the priority of the node.
    pub fn priority(&self) -> i64 {
        self.node().priority
    }

    /// Returns the parent of the node, or `None` for the root.
    pub fn parent(&self) -> Option<NodeRef<'a, T>> {
        self.link(self.node().parent)
    }

    /// Returns the left child of the node.
    pub fn left(&self) -> Option<NodeRef<'a, T>> {
        self.link(self.node().left)
    }

    /// Returns the right child of the node.
    pub fn right(&self) -> Option<NodeRef<'a, T>> {
        self.link(self.node().right)
    }

    /// Checks if the node is the root of its treap.
    pub fn is_root(&self) -> bool {
        self.node().parent.is_none()
    }
}

impl<'a, T> Clone for NodeRef<'a, T> {
    fn clone(&self) -> Self {
        NodeRef::new(self.arena, self.entry)
    }
}

impl<'a, T> Copy for NodeRef<'a, T> {}

impl<'a, T> PartialEq for NodeRef<'a, T> {
    fn eq(&self, other: &NodeRef<'a, T>) -> bool {
        std::ptr::eq(self.arena, other.arena) && self.entry == other.entry
    }
}

impl<'a, T> Eq for NodeRef<'a, T> {}

impl<'a, T: fmt::Display> fmt::Display for NodeRef<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self.node(), f)
    }
}

impl<'a, T: fmt::Debug> fmt::Debug for NodeRef<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("key", self.key())
            .field("priority", &self.priority())
            .finish()
    }
}
