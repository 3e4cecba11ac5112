//! Element storage.
//!
//! Fixed-length vectors embed their elements in an [`Inline`] array and have
//! plain value semantics. Runtime-length vectors own a [`Heap`] buffer:
//!
//! - cloning duplicates into a fresh allocation;
//! - moving (`std::mem::take`, [`Heap::take`]) transfers the allocation and
//!   leaves an empty buffer behind;
//! - assigning (`clone_from`, [`Buffer::resize`]) reallocates only when the
//!   length changes, so a same-size assignment keeps the buffer address.
//!
//! A zero-length heap buffer performs no allocation.

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::NonNull;

use tracing::trace;

use crate::scalar::Element;

/// Owned, contiguous element storage.
pub trait Buffer<T: Element>: Clone + fmt::Debug + Send + Sync + 'static {
    /// A buffer of `len` copies of `value`.
    ///
    /// For fixed-length storage `len` must equal the fixed length.
    fn filled(len: usize, value: T) -> Self;

    /// A buffer holding a copy of `src`.
    ///
    /// For fixed-length storage `src.len()` must equal the fixed length.
    fn from_slice(src: &[T]) -> Self;

    /// The elements.
    fn as_slice(&self) -> &[T];

    /// The elements, mutably.
    fn as_mut_slice(&mut self) -> &mut [T];

    /// Makes room for exactly `len` elements.
    ///
    /// Reallocates only when `len` differs from the current length; the
    /// contents are unspecified afterwards if it did.
    fn resize(&mut self, len: usize);

    /// Number of elements.
    #[inline]
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Whether the buffer holds no elements.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Inline Storage
// ============================================================================

/// Fixed-length storage embedded in the vector.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(transparent)]
pub struct Inline<T, const N: usize> {
    data: [T; N],
}

impl<T: Element, const N: usize> Inline<T, N> {
    /// Wrap an array.
    #[inline]
    pub const fn new(data: [T; N]) -> Self {
        Inline { data }
    }

    /// Unwrap into the array.
    #[inline]
    pub const fn into_array(self) -> [T; N] {
        self.data
    }
}

impl<T: Element, const N: usize> Buffer<T> for Inline<T, N> {
    #[inline]
    fn filled(len: usize, value: T) -> Self {
        debug_assert_eq!(len, N, "inline storage has a fixed length");
        Inline { data: [value; N] }
    }

    #[inline]
    fn from_slice(src: &[T]) -> Self {
        let mut data = [T::zero(); N];
        data.copy_from_slice(src);
        Inline { data }
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    #[inline]
    fn resize(&mut self, len: usize) {
        debug_assert_eq!(len, N, "inline storage has a fixed length");
    }
}

// ============================================================================
// Heap Storage
// ============================================================================

/// Runtime-length storage with a single owner.
///
/// The allocation uses the natural alignment of `T`.
pub struct Heap<T: Element> {
    ptr: NonNull<T>,
    len: usize,
}

// Safety: `Heap` exclusively owns its allocation, like `Vec<T>`.
unsafe impl<T: Element> Send for Heap<T> {}
unsafe impl<T: Element> Sync for Heap<T> {}

impl<T: Element> Heap<T> {
    /// An empty buffer. Does not allocate.
    #[inline]
    pub const fn new() -> Self {
        Heap {
            ptr: NonNull::dangling(),
            len: 0,
        }
    }

    /// Address of the first element.
    ///
    /// Stable across same-size assignment and across moves.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Move the allocation out, leaving `self` empty.
    #[inline]
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    fn layout(len: usize) -> Layout {
        Layout::array::<T>(len).expect("Invalid layout")
    }

    /// Allocate room for `len` elements, all set to `value`.
    fn allocate(len: usize, value: T) -> NonNull<T> {
        if len == 0 {
            return NonNull::dangling();
        }

        let layout = Self::layout(len);
        let raw = unsafe { alloc::alloc(layout) } as *mut T;
        let Some(ptr) = NonNull::new(raw) else {
            alloc::handle_alloc_error(layout);
        };

        unsafe {
            for i in 0..len {
                ptr.as_ptr().add(i).write(value);
            }
        }
        ptr
    }

    /// Release an allocation made by [`Heap::allocate`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate(len, _)` and not have been released.
    unsafe fn release(ptr: NonNull<T>, len: usize) {
        if len != 0 {
            alloc::dealloc(ptr.as_ptr().cast(), Self::layout(len));
        }
    }
}

impl<T: Element> Default for Heap<T> {
    #[inline]
    fn default() -> Self {
        Heap::new()
    }
}

impl<T: Element> Buffer<T> for Heap<T> {
    fn filled(len: usize, value: T) -> Self {
        Heap {
            ptr: Self::allocate(len, value),
            len,
        }
    }

    fn from_slice(src: &[T]) -> Self {
        let mut heap = Self::filled(src.len(), T::zero());
        heap.as_mut_slice().copy_from_slice(src);
        heap
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    fn resize(&mut self, len: usize) {
        if len == self.len {
            return;
        }
        trace!(from = self.len, to = len, element = T::NAME, "reallocating heap storage");

        // Acquire before releasing, so the new buffer never aliases the old.
        let fresh = Self::allocate(len, T::zero());
        unsafe { Self::release(self.ptr, self.len) };
        self.ptr = fresh;
        self.len = len;
    }
}

impl<T: Element> Clone for Heap<T> {
    fn clone(&self) -> Self {
        Self::from_slice(self.as_slice())
    }

    fn clone_from(&mut self, source: &Self) {
        self.resize(source.len);
        self.as_mut_slice().copy_from_slice(source.as_slice());
    }
}

impl<T: Element> Drop for Heap<T> {
    fn drop(&mut self) {
        unsafe { Self::release(self.ptr, self.len) };
    }
}

impl<T: Element> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
