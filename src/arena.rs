//! Append-only allocator that hands out copyable handles.

use std::ops::{Index, IndexMut};
use std::vec::Vec;

/// A handle to a value allocated in a `TypedArena<T>`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Entry {
    chunk_index: usize,
    block_index: usize,
}

/// A fast, but limited allocator that only allocates a single type of object.
///
/// Objects are stored in fixed-size chunks, so an allocated object never moves when the arena
/// grows and handles stay valid for the lifetime of the arena. Objects cannot be freed
/// individually: all of them are destroyed together with the arena. Because of this, the order
/// of allocation is preserved and can be replayed with `entries`.
///
/// # Examples
///
/// ```
/// use sift_treap::arena::TypedArena;
///
/// let mut arena = TypedArena::new(1024);
///
/// let x = arena.allocate(1);
/// assert_eq!(arena[x], 1);
///
/// arena[x] += 1;
/// assert_eq!(arena[x], 2);
/// assert_eq!(arena.len(), 1);
/// ```
pub struct TypedArena<T> {
    chunks: Vec<Vec<T>>,
    chunk_size: usize,
    size: usize,
}

impl<T> TypedArena<T> {
    fn is_valid_entry(&self, entry: &Entry) -> bool {
        entry.chunk_index < self.chunks.len()
            && entry.block_index < self.chunks[entry.chunk_index].len()
    }

    /// Constructs a new, empty `TypedArena<T>` with a specific number of objects per chunk. A
    /// chunk size of zero is treated as one.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_treap::arena::TypedArena;
    ///
    /// // creates a new TypedArena<T> that contains a maximum of 1024 u32's per chunk
    /// let arena: TypedArena<u32> = TypedArena::new(1024);
    /// ```
    pub fn new(chunk_size: usize) -> Self {
        TypedArena {
            chunks: Vec::new(),
            chunk_size: chunk_size.max(1),
            size: 0,
        }
    }

    /// Allocates an object in the typed arena and returns an `Entry`. The `Entry` can later be
    /// used to retrieve mutable and immutable references to the object.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_treap::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(1024);
    /// let x = arena.allocate(0);
    /// assert_eq!(arena.get(&x), Some(&0));
    /// ```
    pub fn allocate(&mut self, value: T) -> Entry {
        let needs_chunk = match self.chunks.last() {
            Some(chunk) => chunk.len() == self.chunk_size,
            None => true,
        };
        if needs_chunk {
            self.chunks.push(Vec::with_capacity(self.chunk_size));
        }
        self.size += 1;

        let chunk_index = self.chunks.len() - 1;
        let last_chunk = &mut self.chunks[chunk_index];
        last_chunk.push(value);
        Entry {
            chunk_index,
            block_index: last_chunk.len() - 1,
        }
    }

    /// Returns an immutable reference to an object in the typed arena. Returns `None` if the entry
    /// does not correspond to a valid object.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_treap::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(1024);
    /// let x = arena.allocate(0);
    /// assert_eq!(arena.get(&x), Some(&0));
    /// ```
    pub fn get(&self, entry: &Entry) -> Option<&T> {
        if !self.is_valid_entry(entry) {
            return None;
        }
        Some(&self.chunks[entry.chunk_index][entry.block_index])
    }

    /// Returns a mutable reference to an object in the typed arena. Returns `None` if the entry
    /// does not correspond to a valid object.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_treap::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(1024);
    /// let x = arena.allocate(0);
    /// assert_eq!(arena.get_mut(&x), Some(&mut 0));
    /// ```
    pub fn get_mut(&mut self, entry: &Entry) -> Option<&mut T> {
        if !self.is_valid_entry(entry) {
            return None;
        }
        Some(&mut self.chunks[entry.chunk_index][entry.block_index])
    }

    /// Returns the number of objects allocated in the typed arena.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if nothing has been allocated yet.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns an iterator over the entries of every allocated object, in the order they were
    /// allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_treap::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(2);
    /// let entries = vec![arena.allocate('a'), arena.allocate('b'), arena.allocate('c')];
    /// assert_eq!(arena.entries().collect::<Vec<_>>(), entries);
    /// ```
    pub fn entries(&self) -> Entries<'_, T> {
        Entries {
            arena: self,
            next: Entry {
                chunk_index: 0,
                block_index: 0,
            },
        }
    }
}

impl<T> Index<Entry> for TypedArena<T> {
    type Output = T;

    fn index(&self, entry: Entry) -> &Self::Output {
        self.get(&entry).expect("Error: entry out of bounds.")
    }
}

impl<T> IndexMut<Entry> for TypedArena<T> {
    fn index_mut(&mut self, entry: Entry) -> &mut Self::Output {
        self.get_mut(&entry).expect("Error: entry out of bounds.")
    }
}

/// An iterator over the entries of a `TypedArena<T>` in allocation order.
pub struct Entries<'a, T> {
    arena: &'a TypedArena<T>,
    next: Entry,
}

impl<'a, T> Iterator for Entries<'a, T> {
    type Item = Entry;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.arena.chunks.get(self.next.chunk_index)?;
        if self.next.block_index >= chunk.len() {
            return None;
        }
        let ret = self.next;
        self.next.block_index += 1;
        if self.next.block_index == self.arena.chunk_size {
            self.next = Entry {
                chunk_index: self.next.chunk_index + 1,
                block_index: 0,
            };
        }
        Some(ret)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let consumed = self.next.chunk_index * self.arena.chunk_size + self.next.block_index;
        let remaining = self.arena.size.saturating_sub(consumed);
        (remaining, Some(remaining))
    }
}
