//! The capability surface shared by every vector-like value.
//!
//! [`VecteurExpr`] is implemented by storage-backed vectors of all backends
//! and by unevaluated [`LazyExpr`](crate::LazyExpr) trees. Implementors
//! supply `size` and `entry`; element access by name, the reductions and the
//! comparisons are provided once here on top of those two.

use num_traits::{Float, One, Zero};

use crate::error::{raise, Result, VecteurError};
use crate::scalar::{Element, Real};
use crate::shape::{check_operable, Extent, Promote, Shape};

/// How a dot product accumulates its partial products.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Accumulation {
    /// `sum = fma(a, b, sum)`, one rounding per step.
    #[default]
    Fused,
    /// `sum = sum + a * b`, two roundings per step.
    Separate,
}

impl Accumulation {
    /// Accumulation used by ordinary runtime evaluation, where a fused
    /// multiply-add is available.
    pub const fn runtime() -> Self {
        Accumulation::Fused
    }

    /// Accumulation matching constant evaluation, which has no fused
    /// instruction.
    pub const fn constant() -> Self {
        Accumulation::Separate
    }

    /// Whether partial products are fused into the running sum.
    pub const fn is_fused(self) -> bool {
        matches!(self, Accumulation::Fused)
    }

    #[inline]
    fn step<T: Element>(self, a: T, b: T, sum: T) -> T {
        match self {
            Accumulation::Fused => a.fused_mul_add(b, sum),
            Accumulation::Separate => sum + a * b,
        }
    }
}

/// A value with a size and per-index entries.
pub trait VecteurExpr {
    /// Element type.
    type Elem: Element;

    /// Length-kind.
    type Extent: Extent;

    /// Number of elements.
    fn size(&self) -> usize;

    /// The element at `index`, computing it if necessary.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.size()`.
    fn entry(&self, index: usize) -> Self::Elem;

    /// The elements as a slice, when they are stored contiguously.
    fn contiguous(&self) -> Option<&[Self::Elem]> {
        None
    }

    /// Whether the value has no elements.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Operand descriptor.
    fn shape(&self) -> Shape {
        Shape::of::<Self::Extent>()
    }

    /// The element at `index`, or an error past the end.
    fn try_entry(&self, index: usize) -> Result<Self::Elem> {
        let size = self.size();
        if index < size {
            Ok(self.entry(index))
        } else {
            Err(VecteurError::IndexOutOfBounds { index, size })
        }
    }

    /// Element at position `I`.
    ///
    /// Fixed-length values shorter than `I + 1` are rejected at compile time:
    ///
    /// ```compile_fail
    /// use kira_vecteur::prelude::*;
    ///
    /// let v = Vec3f::from([1.0, 2.0, 3.0]);
    /// let _ = v.w();
    /// ```
    ///
    /// Runtime-length values are checked when called.
    ///
    /// ```should_panic
    /// use kira_vecteur::prelude::*;
    ///
    /// let v = VecXf::from([1.0, 2.0, 3.0]);
    /// let _ = v.w();
    /// ```
    fn named<const I: usize>(&self) -> Self::Elem {
        const {
            assert!(
                match <Self::Extent as Extent>::FIXED {
                    Some(n) => n > I,
                    None => true,
                },
                "vector is too short for this accessor"
            )
        };
        match self.try_entry(I) {
            Ok(value) => value,
            Err(err) => raise(err),
        }
    }

    /// First element.
    fn x(&self) -> Self::Elem {
        self.named::<0>()
    }

    /// Second element.
    fn y(&self) -> Self::Elem {
        self.named::<1>()
    }

    /// Third element.
    fn z(&self) -> Self::Elem {
        self.named::<2>()
    }

    /// Fourth element.
    fn w(&self) -> Self::Elem {
        self.named::<3>()
    }

    /// Collect the entries.
    fn to_vec(&self) -> Vec<Self::Elem> {
        match self.contiguous() {
            Some(slice) => slice.to_vec(),
            None => (0..self.size()).map(|i| self.entry(i)).collect(),
        }
    }

    // ========================================================================
    // Reductions
    // ========================================================================

    /// Sum of all elements; zero when empty.
    fn hsum(&self) -> Self::Elem {
        fold(self, |acc, x| acc + x).unwrap_or_else(Zero::zero)
    }

    /// Product of all elements; one when empty.
    fn hprod(&self) -> Self::Elem {
        fold(self, |acc, x| acc * x).unwrap_or_else(One::one)
    }

    /// Largest element.
    fn try_hmax(&self) -> Result<Self::Elem> {
        fold(self, Element::max_of).ok_or(VecteurError::EmptyReduction { op: "hmax" })
    }

    /// Largest element.
    ///
    /// # Panics
    ///
    /// Panics if the value is empty.
    fn hmax(&self) -> Self::Elem {
        self.try_hmax().unwrap_or_else(|err| raise(err))
    }

    /// Smallest element.
    fn try_hmin(&self) -> Result<Self::Elem> {
        fold(self, Element::min_of).ok_or(VecteurError::EmptyReduction { op: "hmin" })
    }

    /// Smallest element.
    ///
    /// # Panics
    ///
    /// Panics if the value is empty.
    fn hmin(&self) -> Self::Elem {
        self.try_hmin().unwrap_or_else(|err| raise(err))
    }

    /// Sum of squared elements.
    fn norm2(&self) -> Self::Elem {
        fold_map(self, |x| x * x, |acc, x| acc + x).unwrap_or_else(Zero::zero)
    }

    /// Euclidean length.
    fn norm(&self) -> Self::Elem
    where
        Self::Elem: Real,
    {
        self.norm2().sqrt()
    }

    /// Dot product with the given accumulation.
    fn dot_with<R>(&self, rhs: &R, accumulation: Accumulation) -> Result<Self::Elem>
    where
        R: VecteurExpr<Elem = Self::Elem> + ?Sized,
        Self::Extent: Promote<R::Extent>,
    {
        let size = check_operable(self.size(), rhs.size())?;
        let mut sum = <Self::Elem as Zero>::zero();
        for i in 0..size {
            sum = accumulation.step(self.entry(i), rhs.entry(i), sum);
        }
        Ok(sum)
    }

    /// Dot product, fused.
    fn try_dot<R>(&self, rhs: &R) -> Result<Self::Elem>
    where
        R: VecteurExpr<Elem = Self::Elem> + ?Sized,
        Self::Extent: Promote<R::Extent>,
    {
        self.dot_with(rhs, Accumulation::runtime())
    }

    /// Dot product, fused.
    ///
    /// # Panics
    ///
    /// Panics if the sizes differ.
    fn dot<R>(&self, rhs: &R) -> Self::Elem
    where
        R: VecteurExpr<Elem = Self::Elem> + ?Sized,
        Self::Extent: Promote<R::Extent>,
    {
        self.try_dot(rhs).unwrap_or_else(|err| raise(err))
    }

    // ========================================================================
    // Comparisons
    // ========================================================================

    /// Exact element-wise equality.
    fn try_equals<R>(&self, rhs: &R) -> Result<bool>
    where
        R: VecteurExpr<Elem = Self::Elem> + ?Sized,
        Self::Extent: Promote<R::Extent>,
    {
        let size = check_operable(self.size(), rhs.size())?;
        Ok((0..size).all(|i| self.entry(i) == rhs.entry(i)))
    }

    /// Exact element-wise equality.
    ///
    /// # Panics
    ///
    /// Panics if the sizes differ.
    fn equals<R>(&self, rhs: &R) -> bool
    where
        R: VecteurExpr<Elem = Self::Elem> + ?Sized,
        Self::Extent: Promote<R::Extent>,
    {
        self.try_equals(rhs).unwrap_or_else(|err| raise(err))
    }

    /// Whether the Euclidean distance to `rhs` is at most `epsilon`.
    fn try_near<R>(&self, rhs: &R, epsilon: Self::Elem) -> Result<bool>
    where
        R: VecteurExpr<Elem = Self::Elem> + ?Sized,
        Self::Extent: Promote<R::Extent>,
    {
        let size = check_operable(self.size(), rhs.size())?;
        let mut distance2 = <Self::Elem as Zero>::zero();
        for i in 0..size {
            let (a, b) = (self.entry(i), rhs.entry(i));
            let diff = if a < b { b - a } else { a - b };
            distance2 = distance2 + diff * diff;
        }
        Ok(distance2 <= epsilon * epsilon)
    }

    /// Whether the Euclidean distance to `rhs` is at most `epsilon`.
    ///
    /// # Panics
    ///
    /// Panics if the sizes differ.
    fn near<R>(&self, rhs: &R, epsilon: Self::Elem) -> bool
    where
        R: VecteurExpr<Elem = Self::Elem> + ?Sized,
        Self::Extent: Promote<R::Extent>,
    {
        self.try_near(rhs, epsilon).unwrap_or_else(|err| raise(err))
    }
}

/// Left fold starting from the first entry.
fn fold<V, F>(value: &V, f: F) -> Option<V::Elem>
where
    V: VecteurExpr + ?Sized,
    F: Fn(V::Elem, V::Elem) -> V::Elem,
{
    fold_map(value, |x| x, f)
}

fn fold_map<V, M, F>(value: &V, map: M, f: F) -> Option<V::Elem>
where
    V: VecteurExpr + ?Sized,
    M: Fn(V::Elem) -> V::Elem,
    F: Fn(V::Elem, V::Elem) -> V::Elem,
{
    if let Some(slice) = value.contiguous() {
        let (&first, rest) = slice.split_first()?;
        return Some(rest.iter().fold(map(first), |acc, &x| f(acc, map(x))));
    }
    let size = value.size();
    if size == 0 {
        return None;
    }
    Some((1..size).fold(map(value.entry(0)), |acc, i| f(acc, map(value.entry(i)))))
}
