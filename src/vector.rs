//! Persistent vector: a 32-way trie with a tail buffer.
//!
//! Writes path-copy through [`Arc::make_mut`], so a node is cloned only
//! while another vector still references it. Appends go to the tail and
//! only touch the trie once every 32 elements.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;
use std::ops;
use std::sync::Arc;

use crate::error::IndexError;
use crate::evolver::{Evolver, Persistent};
use crate::iter::VectorIter;
use crate::node::{self, BITS_PER_LEVEL, BRANCH_FACTOR, Node};

/// Persistent, structurally shared sequence.
pub struct PVector<T> {
    root: Arc<Node<T>>,
    tail: Arc<Vec<T>>,
    shift: u32,
    len: usize,
}

// ---------------------------------------------------------------------------
// Construction & accessors (no trait bounds)
// ---------------------------------------------------------------------------

impl<T> PVector<T> {
    /// Creates an empty vector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Arc::new(Node::Branch(Vec::new())),
            tail: Arc::new(Vec::new()),
            shift: BITS_PER_LEVEL,
            len: 0,
        }
    }

    /// Returns the number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the vector holds no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns a reference to the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        self.chunk_for(index).get(index & node::SLOT_MASK)
    }

    /// Returns the first element.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns the last element.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Returns `true` if both vectors share the same root, tail and length.
    ///
    /// This is identity, not equality: two vectors built separately with
    /// the same elements are equal but not `ptr_eq`.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.len == other.len
            && Arc::ptr_eq(&self.root, &other.root)
            && Arc::ptr_eq(&self.tail, &other.tail)
    }

    /// Returns an iterator over references to the elements, front to back.
    #[must_use]
    pub fn iter(&self) -> VectorIter<'_, T> {
        VectorIter::new(self)
    }

    const fn tail_offset(&self) -> usize {
        if self.len < BRANCH_FACTOR {
            0
        } else {
            ((self.len - 1) >> BITS_PER_LEVEL) << BITS_PER_LEVEL
        }
    }

    /// Returns the 32-aligned run of elements holding `index`.
    ///
    /// `index` must be below `len`.
    pub(crate) fn chunk_for(&self, index: usize) -> &[T] {
        if index >= self.tail_offset() {
            return &self.tail;
        }
        let mut node = &*self.root;
        let mut level = self.shift;
        loop {
            match node {
                Node::Branch(children) => {
                    node = &*children[node::fragment(index, level)];
                    level -= BITS_PER_LEVEL;
                }
                Node::Leaf(items) => return items,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Write operations (T: Clone)
// ---------------------------------------------------------------------------

impl<T: Clone> PVector<T> {
    /// Returns a new vector with `value` appended.
    #[must_use]
    pub fn push_back(&self, value: T) -> Self {
        let mut next = self.clone();
        next.push_back_mut(value);
        next
    }

    /// Returns a new vector with the element at `index` replaced.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] if `index` is out of range.
    pub fn set(&self, index: usize, value: T) -> Result<Self, IndexError> {
        let mut next = self.clone();
        next.set_mut(index, value)?;
        Ok(next)
    }

    /// Returns a new vector with every element of `iter` appended.
    #[must_use]
    pub fn extend<I: IntoIterator<Item = T>>(&self, iter: I) -> Self {
        let mut next = self.clone();
        for value in iter {
            next.push_back_mut(value);
        }
        next
    }

    /// Creates an evolver for batching changes against this vector.
    #[must_use]
    pub fn evolver(&self) -> Evolver<Self> {
        Evolver::new(self.clone())
    }

    /// Appends in place, copying only nodes still shared with other vectors.
    pub(crate) fn push_back_mut(&mut self, value: T) {
        if self.len - self.tail_offset() < BRANCH_FACTOR {
            Arc::make_mut(&mut self.tail).push(value);
            self.len += 1;
            return;
        }

        let full = mem::replace(&mut self.tail, Arc::new(vec![value]));
        let leaf = Arc::new(Node::Leaf(
            Arc::try_unwrap(full).unwrap_or_else(|shared| (*shared).clone()),
        ));

        if (self.len >> BITS_PER_LEVEL) > (1 << self.shift) {
            let grown = new_path(self.shift, leaf);
            let old_root = mem::replace(&mut self.root, Arc::new(Node::Branch(Vec::new())));
            self.root = Arc::new(Node::Branch(vec![old_root, grown]));
            self.shift += BITS_PER_LEVEL;
        } else {
            push_tail(&mut self.root, self.shift, self.len - 1, leaf);
        }
        self.len += 1;
    }

    /// Returns a mutable reference to the element at `index`, unsharing the
    /// path that leads to it.
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len {
            return None;
        }
        let tail_offset = self.tail_offset();
        if index >= tail_offset {
            return Arc::make_mut(&mut self.tail).get_mut(index - tail_offset);
        }
        Some(get_mut_in(&mut self.root, self.shift, index))
    }

    pub(crate) fn set_mut(&mut self, index: usize, value: T) -> Result<(), IndexError> {
        let len = self.len;
        let slot = self.get_mut(index).ok_or(IndexError { index, len })?;
        *slot = value;
        Ok(())
    }
}

fn new_path<T>(level: u32, leaf: Arc<Node<T>>) -> Arc<Node<T>> {
    if level == 0 {
        leaf
    } else {
        Arc::new(Node::Branch(vec![new_path(level - BITS_PER_LEVEL, leaf)]))
    }
}

fn push_tail<T: Clone>(node: &mut Arc<Node<T>>, level: u32, index: usize, leaf: Arc<Node<T>>) {
    let Node::Branch(children) = Arc::make_mut(node) else {
        unreachable!("leaf above level 0");
    };
    let slot = node::fragment(index, level);
    if level == BITS_PER_LEVEL {
        children.push(leaf);
    } else if slot < children.len() {
        push_tail(&mut children[slot], level - BITS_PER_LEVEL, index, leaf);
    } else {
        children.push(new_path(level - BITS_PER_LEVEL, leaf));
    }
}

fn get_mut_in<T: Clone>(node: &mut Arc<Node<T>>, level: u32, index: usize) -> &mut T {
    match Arc::make_mut(node) {
        Node::Branch(children) => get_mut_in(
            &mut children[node::fragment(index, level)],
            level - BITS_PER_LEVEL,
            index,
        ),
        Node::Leaf(items) => &mut items[index & node::SLOT_MASK],
    }
}

impl<T: Clone> Persistent for PVector<T> {
    fn ptr_eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl<T> Clone for PVector<T> {
    fn clone(&self) -> Self {
        Self {
            root: Arc::clone(&self.root),
            tail: Arc::clone(&self.tail),
            shift: self.shift,
            len: self.len,
        }
    }
}

impl<T> Default for PVector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for PVector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for PVector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && (self.ptr_eq(other) || self.iter().eq(other.iter()))
    }
}

impl<T: Eq> Eq for PVector<T> {}

impl<T: Hash> Hash for PVector<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len);
        for item in self {
            item.hash(state);
        }
    }
}

impl<T: Clone> FromIterator<T> for PVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut vector = Self::new();
        for value in iter {
            vector.push_back_mut(value);
        }
        vector
    }
}

impl<T> ops::Index<usize> for PVector<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        self.get(index).expect("index out of range")
    }
}

impl<'a, T> IntoIterator for &'a PVector<T> {
    type Item = &'a T;
    type IntoIter = VectorIter<'a, T>;

    fn into_iter(self) -> VectorIter<'a, T> {
        self.iter()
    }
}
