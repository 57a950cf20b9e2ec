use crate::arena::{Entries, Entry, TypedArena};
use crate::treap::node::{Node, NodeRef};
use crate::treap::{Error, PriorityRange, Result};
use log::{debug, trace};
use rand::{Rng, XorShiftRng};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

const CHUNK_SIZE: usize = 1024;

/// An ordered set implemented by a treap.
///
/// A treap is a tree that satisfies both the binary search tree property and a heap property. Each
/// node has a key and a priority. The key of any node is greater than all keys in its left subtree
/// and less than all keys occuring in its right subtree. The priority of a node is greater than or
/// equal to the priority of its children. A new key is first attached as a leaf and then rotated
/// upwards while its priority is strictly greater than its parent's, so among nodes of equal
/// priority the one inserted first stays closer to the root.
///
/// Priorities can be given explicitly, or drawn from a `PriorityRange` using a random number
/// generator supplied by the caller. By randomly generating priorities, the expected height of the
/// tree is proportional to the logarithm of the number of keys.
///
/// # Examples
///
/// ```
/// use sift_treap::treap::{Error, Treap};
///
/// let mut t = Treap::new();
/// t.insert("C", Some(14)).unwrap();
/// t.insert("E", Some(26)).unwrap();
/// t.insert("A", Some(24)).unwrap();
/// t.insert("B", Some(7)).unwrap();
///
/// assert!(t.search("E"));
/// assert!(!t.search("Q"));
/// assert_eq!(t.size(), 4);
/// assert_eq!(t.root().map(|node| *node.key()), Some("E"));
///
/// assert_eq!(t.insert("C", Some(1)), Err(Error::DuplicateKey));
/// assert_eq!(t.insert("D", Some(-1)), Err(Error::InvalidPriority(-1)));
/// assert!(t.is_valid());
/// ```
pub struct Treap<T, R = XorShiftRng> {
    arena: TypedArena<Node<T>>,
    root: Option<Entry>,
    priorities: PriorityRange,
    rng: R,
}

impl<T: Ord> Treap<T> {
    /// Constructs a new, empty `Treap<T>` that draws missing priorities from `0..=1000` using a
    /// randomly seeded generator.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_treap::treap::Treap;
    ///
    /// let t: Treap<u32> = Treap::new();
    /// assert!(t.is_empty());
    /// ```
    pub fn new() -> Self {
        Treap::with_rng(rand::weak_rng())
    }
}

impl<T: Ord> Default for Treap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, R> Treap<T, R>
where
    T: Ord,
    R: Rng,
{
    /// Constructs a new, empty `Treap<T, R>` that draws missing priorities from `0..=1000` using
    /// `rng`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rand::{SeedableRng, XorShiftRng};
    /// use sift_treap::treap::Treap;
    ///
    /// let rng: XorShiftRng = SeedableRng::from_seed([1, 1, 1, 1]);
    /// let mut t = Treap::with_rng(rng);
    /// t.insert(0, None).unwrap();
    /// assert!(t.root().map_or(false, |node| node.priority() <= 1000));
    /// ```
    pub fn with_rng(rng: R) -> Self {
        Treap::with_priorities(PriorityRange::default(), rng)
    }

    /// Constructs a new, empty `Treap<T, R>` that draws missing priorities from `priorities` using
    /// `rng`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rand::{SeedableRng, XorShiftRng};
    /// use sift_treap::treap::{PriorityRange, Treap};
    ///
    /// let rng: XorShiftRng = SeedableRng::from_seed([1, 1, 1, 1]);
    /// let mut t = Treap::with_priorities(PriorityRange::new(5, 5).unwrap(), rng);
    /// t.insert(0, None).unwrap();
    /// assert_eq!(t.root().map(|node| node.priority()), Some(5));
    /// ```
    pub fn with_priorities(priorities: PriorityRange, rng: R) -> Self {
        Treap {
            arena: TypedArena::new(CHUNK_SIZE),
            root: None,
            priorities,
            rng,
        }
    }

    /// Inserts a key into the treap with an optional priority. If no priority is given, one is
    /// drawn from the treap's priority range.
    ///
    /// Returns `Error::DuplicateKey` if the key already exists and `Error::InvalidPriority` if the
    /// explicit priority is negative. In both cases the treap is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_treap::treap::{Error, Treap};
    ///
    /// let mut t = Treap::new();
    /// assert_eq!(t.insert(1, Some(3)), Ok(()));
    /// assert_eq!(t.insert(1, Some(4)), Err(Error::DuplicateKey));
    /// assert_eq!(t.insert(2, Some(-4)), Err(Error::InvalidPriority(-4)));
    /// assert_eq!(t.size(), 1);
    /// ```
    pub fn insert(&mut self, key: T, priority: Option<i64>) -> Result<()> {
        if self.search(&key) {
            return Err(Error::DuplicateKey);
        }
        let priority = match priority {
            Some(priority) if priority < 0 => return Err(Error::InvalidPriority(priority)),
            Some(priority) => priority,
            None => self.priorities.sample(&mut self.rng),
        };

        let new_entry = self.arena.allocate(Node::new(key, priority));
        self.attach(new_entry);
        let rotations = self.sift_up(new_entry);
        debug!(
            "inserted node with priority {} after {} rotations, size is now {}",
            priority,
            rotations,
            self.size(),
        );
        Ok(())
    }
}

impl<T: Ord, R> Treap<T, R> {
    // Places an unlinked node as a leaf according to its key.
    fn attach(&mut self, new_entry: Entry) {
        let mut curr = match self.root {
            Some(root) => root,
            None => {
                self.root = Some(new_entry);
                return;
            }
        };
        loop {
            let go_right = self.arena[new_entry].key > self.arena[curr].key;
            let next = if go_right {
                self.arena[curr].right
            } else {
                self.arena[curr].left
            };
            match next {
                Some(next) => curr = next,
                None => {
                    if go_right {
                        self.arena[curr].right = Some(new_entry);
                    } else {
                        self.arena[curr].left = Some(new_entry);
                    }
                    self.arena[new_entry].parent = Some(curr);
                    return;
                }
            }
        }
    }

    // Rotates a node upwards until its parent's priority is at least its own. Returns the number
    // of rotations performed.
    fn sift_up(&mut self, entry: Entry) -> usize {
        let mut rotations = 0;
        while let Some(parent) = self.arena[entry].parent {
            if self.arena[parent].priority >= self.arena[entry].priority {
                break;
            }
            if self.arena[parent].right == Some(entry) {
                self.rotate_left(parent);
            } else {
                self.rotate_right(parent);
            }
            rotations += 1;
        }
        rotations
    }

    // Lifts the right child of `entry` into its position.
    fn rotate_left(&mut self, entry: Entry) {
        let child = match self.arena[entry].right {
            Some(child) => child,
            None => return,
        };
        trace!("rotating left around {:?}", entry);
        let grandparent = self.arena[entry].parent;
        let inner = self.arena[child].left;

        self.arena[entry].right = inner;
        if let Some(inner) = inner {
            self.arena[inner].parent = Some(entry);
        }
        self.arena[child].left = Some(entry);
        self.arena[entry].parent = Some(child);
        self.replace_child(grandparent, entry, child);
    }

    // Lifts the left child of `entry` into its position.
    fn rotate_right(&mut self, entry: Entry) {
        let child = match self.arena[entry].left {
            Some(child) => child,
            None => return,
        };
        trace!("rotating right around {:?}", entry);
        let grandparent = self.arena[entry].parent;
        let inner = self.arena[child].right;

        self.arena[entry].left = inner;
        if let Some(inner) = inner {
            self.arena[inner].parent = Some(entry);
        }
        self.arena[child].right = Some(entry);
        self.arena[entry].parent = Some(child);
        self.replace_child(grandparent, entry, child);
    }

    // Points whatever referenced `old` (a parent's child slot, or the root) at `new`.
    fn replace_child(&mut self, parent: Option<Entry>, old: Entry, new: Entry) {
        self.arena[new].parent = parent;
        match parent {
            Some(parent) => {
                let parent_node = &mut self.arena[parent];
                if parent_node.left == Some(old) {
                    parent_node.left = Some(new);
                } else {
                    parent_node.right = Some(new);
                }
            }
            None => self.root = Some(new),
        }
    }

    /// Checks if a key exists in the treap.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_treap::treap::Treap;
    ///
    /// let mut t = Treap::new();
    /// t.insert(String::from("a"), None).unwrap();
    /// assert!(t.search("a"));
    /// assert!(!t.search("b"));
    /// ```
    pub fn search<Q>(&self, key: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut curr = self.root;
        while let Some(entry) = curr {
            let node = &self.arena[entry];
            curr = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return true,
            };
        }
        false
    }

    /// Returns the number of keys in the treap.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_treap::treap::Treap;
    ///
    /// let mut t = Treap::new();
    /// t.insert(1, None).unwrap();
    /// assert_eq!(t.size(), 1);
    /// ```
    pub fn size(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` if the treap contains no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the root of the treap, or `None` if it is empty.
    pub fn root(&self) -> Option<NodeRef<'_, T>> {
        self.root.map(|entry| NodeRef::new(&self.arena, entry))
    }

    /// Returns the number of nodes on the longest path from the root to a leaf.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_treap::treap::Treap;
    ///
    /// let mut t = Treap::new();
    /// assert_eq!(t.height(), 0);
    /// for key in 0..4 {
    ///     t.insert(key, Some(1)).unwrap();
    /// }
    /// assert_eq!(t.height(), 4);
    /// ```
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack = Vec::new();
        if let Some(root) = self.root {
            stack.push((root, 1));
        }
        while let Some((entry, depth)) = stack.pop() {
            height = height.max(depth);
            let node = &self.arena[entry];
            stack.extend(node.left.iter().chain(node.right.iter()).map(|child| (*child, depth + 1)));
        }
        height
    }

    /// Returns an iterator over the nodes of the treap in the order their keys were inserted.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_treap::treap::Treap;
    ///
    /// let mut t = Treap::new();
    /// t.insert(2, None).unwrap();
    /// t.insert(1, None).unwrap();
    /// t.insert(3, None).unwrap();
    ///
    /// let keys: Vec<u32> = t.iter().map(|node| *node.key()).collect();
    /// assert_eq!(keys, vec![2, 1, 3]);
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            arena: &self.arena,
            entries: self.arena.entries(),
        }
    }

    /// Checks the treap's structural invariants: keys are in strictly increasing order in an
    /// in-order walk, no child has a greater priority than its parent, every child links back to
    /// its parent, the root has no parent, and every node is reachable from the root.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_treap::treap::Treap;
    ///
    /// let mut t = Treap::new();
    /// for key in "ZYXWVQUPSRKJGBFCMDHILANOTE".chars() {
    ///     t.insert(key, None).unwrap();
    /// }
    /// assert!(t.is_valid());
    /// ```
    pub fn is_valid(&self) -> bool {
        let root = match self.root {
            Some(root) => root,
            None => return self.arena.is_empty(),
        };
        if self.arena[root].parent.is_some() {
            return false;
        }

        let mut reachable = 0;
        let mut prev: Option<&T> = None;
        let mut stack = Vec::new();
        let mut curr = Some(root);
        loop {
            while let Some(entry) = curr {
                stack.push(entry);
                curr = self.arena[entry].left;
            }
            let entry = match stack.pop() {
                Some(entry) => entry,
                None => break,
            };
            let node = &self.arena[entry];
            reachable += 1;

            if prev.map_or(false, |prev| *prev >= node.key) {
                return false;
            }
            prev = Some(&node.key);

            for child in node.left.iter().chain(node.right.iter()) {
                let child_node = &self.arena[*child];
                if child_node.parent != Some(entry) || child_node.priority > node.priority {
                    return false;
                }
            }
            curr = node.right;
        }
        reachable == self.size()
    }
}

impl<T: fmt::Display, R> Treap<T, R> {
    /// Prints the tree structure to standard output. See the `Display` implementation for the
    /// layout.
    pub fn display(&self) {
        print!("{}", self);
    }
}

/// Renders the tree sideways: the right subtree is printed above a node and the left subtree
/// below it, with four spaces of indentation per level.
impl<T: fmt::Display, R> fmt::Display for Treap<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut stack = Vec::new();
        let mut curr = self.root.map(|entry| (entry, 0));
        loop {
            while let Some((entry, depth)) = curr {
                stack.push((entry, depth));
                curr = self.arena[entry].right.map(|right| (right, depth + 1));
            }
            let (entry, depth) = match stack.pop() {
                Some(item) => item,
                None => return Ok(()),
            };
            let node = &self.arena[entry];
            writeln!(f, "{:indent$}{}", "", node, indent = depth * 4)?;
            curr = node.left.map(|left| (left, depth + 1));
        }
    }
}

impl<'a, T, R> IntoIterator for &'a Treap<T, R>
where
    T: 'a + Ord,
{
    type IntoIter = Iter<'a, T>;
    type Item = NodeRef<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator for `Treap<T, R>`.
///
/// This iterator yields a view of every node in the order the keys were inserted.
pub struct Iter<'a, T> {
    arena: &'a TypedArena<Node<T>>,
    entries: Entries<'a, Node<T>>,
}

impl<'a, T> Iterator for Iter<'a, T>
where
    T: 'a,
{
    type Item = NodeRef<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        self.entries.next().map(|entry| NodeRef::new(arena, entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::Treap;
    use crate::treap::{Error, PriorityRange};
    use rand::{SeedableRng, XorShiftRng};

    fn seeded() -> XorShiftRng {
        SeedableRng::from_seed([1, 1, 1, 1])
    }

    fn keys_of<R>(tree: &Treap<char, R>) -> Vec<char> {
        tree.iter().map(|node| *node.key()).collect()
    }

    #[test]
    fn test_new_is_empty() {
        let tree: Treap<u32> = Treap::new();
        assert!(tree.is_empty());
        assert_eq!(tree.size(), 0);
        assert!(tree.root().is_none());
        assert_eq!(tree.iter().next(), None);
        assert!(tree.is_valid());
        assert_eq!(tree.to_string(), "");
    }

    #[test]
    fn test_insert_single() {
        let mut tree = Treap::with_rng(seeded());
        tree.insert('a', Some(7)).unwrap();
        let root = tree.root().unwrap();
        assert_eq!(*root.key(), 'a');
        assert_eq!(root.priority(), 7);
        assert!(root.is_root());
        assert_eq!(tree.size(), 1);
    }

    #[test]
    fn test_rotate_left() {
        let mut tree = Treap::with_rng(seeded());
        tree.insert('a', Some(1)).unwrap();
        tree.insert('b', Some(2)).unwrap();

        let root = tree.root().unwrap();
        assert_eq!(*root.key(), 'b');
        assert_eq!(root.left().map(|node| *node.key()), Some('a'));
        assert!(root.right().is_none());
        assert!(tree.is_valid());
    }

    #[test]
    fn test_rotate_right() {
        let mut tree = Treap::with_rng(seeded());
        tree.insert('b', Some(1)).unwrap();
        tree.insert('a', Some(2)).unwrap();

        let root = tree.root().unwrap();
        assert_eq!(*root.key(), 'a');
        assert_eq!(root.right().map(|node| *node.key()), Some('b'));
        assert!(root.left().is_none());
        assert!(tree.is_valid());
    }

    #[test]
    fn test_rotation_moves_inner_subtree() {
        let mut tree = Treap::with_rng(seeded());
        tree.insert('d', Some(10)).unwrap();
        tree.insert('b', Some(5)).unwrap();
        tree.insert('c', Some(1)).unwrap();
        tree.insert('a', Some(1)).unwrap();
        tree.insert('e', Some(20)).unwrap();

        let root = tree.root().unwrap();
        assert_eq!(*root.key(), 'e');
        let left = root.left().unwrap();
        assert_eq!(*left.key(), 'd');
        assert_eq!(left.parent().map(|node| *node.key()), Some('e'));
        assert!(left.right().is_none());
        assert_eq!(left.left().map(|node| *node.key()), Some('b'));
        assert!(tree.is_valid());

        // 'a' rotates twice; after the first rotation 'b' hangs off 'a' and is handed to 'c'
        let mut tree = Treap::with_rng(seeded());
        tree.insert('c', Some(5)).unwrap();
        tree.insert('b', Some(3)).unwrap();
        tree.insert('a', Some(9)).unwrap();

        let root = tree.root().unwrap();
        assert_eq!(*root.key(), 'a');
        assert!(root.left().is_none());
        let c = root.right().unwrap();
        assert_eq!(*c.key(), 'c');
        assert!(c.right().is_none());
        let b = c.left().unwrap();
        assert_eq!(*b.key(), 'b');
        assert_eq!(b.parent().map(|node| *node.key()), Some('c'));
        assert!(tree.is_valid());
    }

    #[test]
    fn test_equal_priority_does_not_rotate() {
        let mut tree = Treap::with_rng(seeded());
        tree.insert('a', Some(3)).unwrap();
        tree.insert('b', Some(3)).unwrap();
        assert_eq!(tree.root().map(|node| *node.key()), Some('a'));
        assert_eq!(tree.height(), 2);
    }

    #[test]
    fn test_duplicate_key() {
        let mut tree = Treap::with_rng(seeded());
        tree.insert('a', Some(1)).unwrap();
        tree.insert('b', Some(2)).unwrap();
        let before = tree.to_string();

        assert_eq!(tree.insert('a', Some(100)), Err(Error::DuplicateKey));
        assert_eq!(tree.insert('b', None), Err(Error::DuplicateKey));
        assert_eq!(tree.size(), 2);
        assert_eq!(tree.to_string(), before);
        assert_eq!(keys_of(&tree), vec!['a', 'b']);
    }

    #[test]
    fn test_invalid_priority() {
        let mut tree = Treap::with_rng(seeded());
        assert_eq!(tree.insert('a', Some(-1)), Err(Error::InvalidPriority(-1)));
        assert!(tree.is_empty());
        assert!(!tree.search(&'a'));
    }

    #[test]
    fn test_duplicate_checked_before_priority() {
        let mut tree = Treap::with_rng(seeded());
        tree.insert('a', Some(1)).unwrap();
        assert_eq!(tree.insert('a', Some(-1)), Err(Error::DuplicateKey));
    }

    #[test]
    fn test_explicit_priority_outside_range() {
        let range = PriorityRange::new(0, 10).unwrap();
        let mut tree = Treap::with_priorities(range, seeded());
        tree.insert('a', Some(5000)).unwrap();
        assert_eq!(tree.root().map(|node| node.priority()), Some(5000));
    }

    #[test]
    fn test_generated_priorities_in_range() {
        let range = PriorityRange::new(100, 200).unwrap();
        let mut tree = Treap::with_priorities(range, seeded());
        for key in 0..500 {
            tree.insert(key, None).unwrap();
        }
        assert!(tree.iter().all(|node| range.contains(node.priority())));
        assert!(tree.is_valid());
    }

    #[test]
    fn test_search_borrowed() {
        let mut tree = Treap::with_rng(seeded());
        tree.insert(String::from("hello"), None).unwrap();
        tree.insert(String::from("world"), None).unwrap();
        assert!(tree.search("hello"));
        assert!(tree.search("world"));
        assert!(!tree.search("treap"));
    }

    #[test]
    fn test_iter_restartable() {
        let mut tree = Treap::with_rng(seeded());
        for key in "treap".chars() {
            tree.insert(key, None).unwrap();
        }
        assert_eq!(keys_of(&tree), vec!['t', 'r', 'e', 'a', 'p']);
        assert_eq!(keys_of(&tree), vec!['t', 'r', 'e', 'a', 'p']);
        assert_eq!(tree.iter().size_hint(), (5, Some(5)));
        assert_eq!((&tree).into_iter().count(), 5);
    }

    #[test]
    fn test_display() {
        let mut tree = Treap::with_rng(seeded());
        tree.insert('b', Some(3)).unwrap();
        tree.insert('a', Some(2)).unwrap();
        tree.insert('c', Some(1)).unwrap();
        assert_eq!(tree.to_string(), "    c (1)\nb (3)\n    a (2)\n");
    }

    #[test]
    fn test_height_degenerate() {
        let mut tree = Treap::with_rng(seeded());
        for key in 0..10_000 {
            tree.insert(key, Some(0)).unwrap();
        }
        assert_eq!(tree.height(), 10_000);
        assert!(tree.is_valid());
        assert!(tree.search(&9_999));
    }
}
