//! Length-kinds and shape promotion.
//!
//! A vector's length is either fixed at compile time ([`Const<N>`]) or
//! chosen at runtime ([`Dyn`]). The length-kind is a type parameter, so two
//! fixed-length vectors of different lengths cannot be combined: there is no
//! [`Promote`] impl for `Const<N>` and `Const<M>` with `N != M`.
//!
//! | lhs        | rhs        | result     |
//! |------------|------------|------------|
//! | `Const<N>` | `Const<N>` | `Const<N>` |
//! | `Const<N>` | `Dyn`      | `Dyn`      |
//! | `Dyn`      | `Const<N>` | `Dyn`      |
//! | `Dyn`      | `Dyn`      | `Dyn`      |
//!
//! Whenever a runtime length is involved the sizes are compared again at the
//! point of use by [`check_operable`].

use std::fmt;

use crate::error::{Result, VecteurError};
use crate::scalar::Element;
use crate::storage::{Buffer, Heap, Inline};

mod sealed {
    pub trait Sealed {}
    impl<const N: usize> Sealed for super::Const<N> {}
    impl Sealed for super::Dyn {}
}

// ============================================================================
// Extents
// ============================================================================

/// The length-kind of a vector.
pub trait Extent: sealed::Sealed + Copy + Default + fmt::Debug + Send + Sync + 'static {
    /// The fixed length, or `None` for runtime-length vectors.
    const FIXED: Option<usize>;

    /// Storage used for vectors of this length-kind.
    type Buffer<T: Element>: Buffer<T>;

    /// Runtime description of this length-kind.
    fn length() -> Length {
        match Self::FIXED {
            Some(n) => Length::Fixed(n),
            None => Length::Runtime,
        }
    }

    /// Whether the vectorized backend should strip-mine over this extent.
    ///
    /// Runtime-length vectors always qualify; fixed-length ones need at least
    /// four elements.
    fn wide() -> bool {
        match Self::FIXED {
            Some(n) => n >= 4,
            None => true,
        }
    }
}

/// Fixed length `N`, stored inline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Const<const N: usize>;

/// Runtime length, stored on the heap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dyn;

impl<const N: usize> Extent for Const<N> {
    const FIXED: Option<usize> = Some(N);
    type Buffer<T: Element> = Inline<T, N>;
}

impl Extent for Dyn {
    const FIXED: Option<usize> = None;
    type Buffer<T: Element> = Heap<T>;
}

// ============================================================================
// Promotion
// ============================================================================

/// Length-kind of the result of combining `Self` with `Rhs` element-wise.
///
/// Only statically operable pairs implement this trait, so fixed lengths
/// that differ do not combine:
///
/// ```compile_fail
/// use kira_vecteur::prelude::*;
///
/// let a = Vecteur::<f32, Const<3>>::splat(1.0);
/// let b = Vecteur::<f32, Const<4>>::splat(1.0);
/// let _ = &a + &b;
/// ```
///
/// A fixed length combines with a runtime length and yields a runtime length:
///
/// ```
/// use kira_vecteur::prelude::*;
///
/// let a = Vecteur::<f32, Const<3>>::splat(1.0);
/// let b = VecXf::from([1.0, 2.0, 3.0]);
/// let sum: VecXf = &a + &b;
/// assert_eq!(sum.as_slice(), &[2.0, 3.0, 4.0]);
/// ```
pub trait Promote<Rhs: Extent>: Extent {
    /// The promoted length-kind.
    type Output: Extent;
}

impl<const N: usize> Promote<Const<N>> for Const<N> {
    type Output = Const<N>;
}

impl<const N: usize> Promote<Dyn> for Const<N> {
    type Output = Dyn;
}

impl<const N: usize> Promote<Const<N>> for Dyn {
    type Output = Dyn;
}

impl Promote<Dyn> for Dyn {
    type Output = Dyn;
}

/// Shorthand for the promoted length-kind of `L` and `R`.
pub type Promoted<L, R> = <L as Promote<R>>::Output;

/// Values of length-kind `Self` may be stored into a `Dst` vector.
///
/// Fixed into the same fixed length, and anything into runtime length.
/// Runtime into fixed is rejected at compile time:
///
/// ```compile_fail
/// use kira_vecteur::prelude::*;
///
/// let runtime = VecXf::from([1.0, 2.0, 3.0]);
/// let _ = Vec3f::from_expr(&runtime);
/// ```
///
/// ```compile_fail
/// use kira_vecteur::prelude::*;
///
/// let runtime = VecXf::from([1.0, 2.0, 3.0]);
/// let mut fixed = Vec3f::zeros();
/// fixed.assign(&runtime);
/// ```
pub trait Fits<Dst: Extent>: Extent {}

impl<const N: usize> Fits<Const<N>> for Const<N> {}

impl<const N: usize> Fits<Dyn> for Const<N> {}

impl Fits<Dyn> for Dyn {}

// ============================================================================
// Runtime descriptors
// ============================================================================

/// Runtime view of a length-kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Length {
    /// Fixed at compile time.
    Fixed(usize),
    /// Chosen at runtime.
    Runtime,
}

/// Description of an operand: whether it is a vector, and its length-kind.
///
/// Scalars are length-1 operands that combine with anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    /// `false` for scalars.
    pub vector: bool,
    /// The length-kind.
    pub length: Length,
}

impl Shape {
    /// Descriptor of a scalar operand.
    pub const SCALAR: Shape = Shape {
        vector: false,
        length: Length::Fixed(1),
    };

    /// Descriptor of a vector with length-kind `E`.
    pub fn of<E: Extent>() -> Self {
        Shape {
            vector: true,
            length: E::length(),
        }
    }

    /// Whether two operands can be combined element-wise, judging by their
    /// length-kinds alone.
    pub fn statically_operable(self, other: Shape) -> bool {
        if !self.vector || !other.vector {
            return true;
        }
        match (self.length, other.length) {
            (Length::Fixed(a), Length::Fixed(b)) => a == b,
            _ => true,
        }
    }

    /// The descriptor of the result of combining `self` with `other`.
    ///
    /// Returns `None` when the operands are not statically operable.
    pub fn promote(self, other: Shape) -> Option<Shape> {
        if !self.statically_operable(other) {
            return None;
        }
        let promoted = match (self.vector, other.vector) {
            (false, false) => Shape::SCALAR,
            (true, false) => self,
            (false, true) => other,
            (true, true) => match (self.length, other.length) {
                (Length::Fixed(_), Length::Fixed(_)) => self,
                _ => Shape {
                    vector: true,
                    length: Length::Runtime,
                },
            },
        };
        Some(promoted)
    }
}

/// Checks that two operands of sizes `lhs` and `rhs` can be combined and
/// returns the shared size.
#[inline]
pub fn check_operable(lhs: usize, rhs: usize) -> Result<usize> {
    if lhs == rhs {
        Ok(lhs)
    } else {
        Err(VecteurError::SizeMismatch { lhs, rhs })
    }
}
