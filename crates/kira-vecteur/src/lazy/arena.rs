//! Leaf arena for lazy expressions.
//!
//! When a deep operand is collapsed, its values are written here and the
//! expression keeps a [`LeafId`] instead of a reference to the operand. Leaves
//! are bump-allocated into one contiguous buffer and released together when
//! the expression is dropped.
//!
//! Combining two expressions merges their arenas: the right arena is appended
//! to the left one and the right expression's handles are shifted by the
//! returned offset.

use crate::scalar::Element;

/// Handle to a leaf stored in a [`LeafArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafId(u32);

impl LeafId {
    /// Creates a handle from a raw index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Handle shifted by `offset` leaves.
    #[must_use]
    pub(crate) const fn shifted(self, offset: u32) -> Self {
        Self(self.0 + offset)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Span {
    start: usize,
    len: usize,
}

/// Bump storage for evaluated leaves.
#[derive(Clone, Debug)]
pub struct LeafArena<T> {
    /// Values of every leaf, back to back.
    data: Vec<T>,
    /// Location of each leaf in `data`, indexed by `LeafId`.
    spans: Vec<Span>,
}

impl<T: Element> LeafArena<T> {
    /// An empty arena. Does not allocate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            spans: Vec::new(),
        }
    }

    /// Allocates a fresh leaf id for the next span.
    fn fresh_leaf_id(&self) -> LeafId {
        let index = u32::try_from(self.spans.len()).expect("leaf arena overflow");
        LeafId::new(index)
    }

    /// Store a copy of `values` as a new leaf.
    pub fn alloc_slice(&mut self, values: &[T]) -> LeafId {
        let id = self.fresh_leaf_id();
        self.spans.push(Span {
            start: self.data.len(),
            len: values.len(),
        });
        self.data.extend_from_slice(values);
        id
    }

    /// Store `len` values produced by `f(0)..f(len - 1)` as a new leaf.
    pub fn alloc_with(&mut self, len: usize, f: impl FnMut(usize) -> T) -> LeafId {
        let id = self.fresh_leaf_id();
        let start = self.data.len();
        self.data.extend((0..len).map(f));
        self.spans.push(Span { start, len });
        id
    }

    /// The values of a leaf.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this arena.
    #[inline]
    pub fn get(&self, id: LeafId) -> &[T] {
        let span = self.spans[id.index()];
        &self.data[span.start..span.start + span.len]
    }

    /// Append every leaf of `other`, returning the offset to add to its
    /// handles.
    pub fn absorb(&mut self, other: LeafArena<T>) -> u32 {
        let offset = self.fresh_leaf_id().0;
        if other.spans.is_empty() {
            return offset;
        }
        let base = self.data.len();
        self.spans.extend(other.spans.iter().map(|span| Span {
            start: span.start + base,
            len: span.len,
        }));
        self.data.extend(other.data);
        offset
    }

    /// Number of leaves.
    #[inline]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether no leaf has been stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Total number of stored values.
    #[inline]
    pub fn used(&self) -> usize {
        self.data.len()
    }
}

impl<T: Element> Default for LeafArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_alloc_basic() {
        let mut arena = LeafArena::new();
        assert!(arena.is_empty());

        let a = arena.alloc_slice(&[1.0f32, 2.0, 3.0]);
        let b = arena.alloc_with(2, |i| i as f32 * 10.0);

        assert_eq!(arena.len(), 2);
        assert_eq!(arena.used(), 5);
        assert_eq!(arena.get(a), &[1.0, 2.0, 3.0]);
        assert_eq!(arena.get(b), &[0.0, 10.0]);
    }

    #[test]
    fn test_arena_absorb_rebases() {
        let mut left = LeafArena::new();
        let l0 = left.alloc_slice(&[1, 2]);

        let mut right = LeafArena::new();
        let r0 = right.alloc_slice(&[3]);
        let r1 = right.alloc_slice(&[4, 5, 6]);

        let offset = left.absorb(right);
        assert_eq!(offset, 1);
        assert_eq!(left.get(l0), &[1, 2]);
        assert_eq!(left.get(r0.shifted(offset)), &[3]);
        assert_eq!(left.get(r1.shifted(offset)), &[4, 5, 6]);
    }

    #[test]
    fn test_arena_absorb_empty() {
        let mut left = LeafArena::<i64>::new();
        left.alloc_slice(&[1]);
        assert_eq!(left.absorb(LeafArena::new()), 1);
        assert_eq!(left.len(), 1);
    }

    #[test]
    fn test_arena_empty_leaf() {
        let mut arena = LeafArena::<u32>::new();
        let id = arena.alloc_slice(&[]);
        assert!(arena.get(id).is_empty());
        assert_eq!(id.index(), 0);
    }
}
