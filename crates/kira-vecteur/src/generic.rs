//! Eager element-wise operations.
//!
//! Implemented once for every [`Eager`] backend. Each operation checks
//! operability, allocates a result of the promoted length-kind, and fills it
//! in one pass. Addition, `sqrt` and `rsqrt` go through the backend's kernel
//! table so that [`Simd`](crate::Simd) can run them lane by lane.

use std::ops::Neg;

use num_traits::{Float, Signed};

use crate::backend::Eager;
use crate::error::{raise, Result};
use crate::expr::VecteurExpr;
use crate::op::{BinaryOp, UnaryOp};
use crate::scalar::{Element, PromoteElem, PromotedElem, Real};
use crate::shape::{check_operable, Extent, Promote, Promoted};
use crate::vecteur::Vecteur;

// ============================================================================
// Loops
// ============================================================================

/// `out[i] = f(lhs[i], rhs[i])`
#[inline]
pub(crate) fn zip_with<T: Copy>(lhs: &[T], rhs: &[T], out: &mut [T], f: impl Fn(T, T) -> T) {
    for ((slot, &a), &b) in out.iter_mut().zip(lhs).zip(rhs) {
        *slot = f(a, b);
    }
}

/// `out[i] = f(src[i])`
#[inline]
pub(crate) fn map_with<T: Copy>(src: &[T], out: &mut [T], f: impl Fn(T) -> T) {
    for (slot, &x) in out.iter_mut().zip(src) {
        *slot = f(x);
    }
}

// ============================================================================
// Binary Operations
// ============================================================================

impl<T: Element, E: Extent, B: Eager> Vecteur<T, E, B> {
    /// Combine with another vector element-wise.
    ///
    /// Operands of different element types are first converted to their
    /// [`PromotedElem`]. Fails when the sizes differ at runtime.
    pub fn try_binary<U, F>(
        &self,
        op: BinaryOp,
        rhs: &Vecteur<U, F, B>,
    ) -> Result<Vecteur<PromotedElem<T, U>, Promoted<E, F>, B>>
    where
        T: PromoteElem<U>,
        U: Element,
        F: Extent,
        E: Promote<F>,
    {
        let size = check_operable(self.len(), rhs.len())?;
        let lhs_lanes = T::lift_lhs(self.as_slice());
        let rhs_lanes = T::lift_rhs(rhs.as_slice());
        let mut out = Vecteur::<PromotedElem<T, U>, Promoted<E, F>, B>::zeroed(size);
        let wide = <Promoted<E, F> as Extent>::wide();
        match op {
            BinaryOp::Add => B::add(&*lhs_lanes, &*rhs_lanes, out.as_mut_slice(), wide),
            _ => zip_with(&*lhs_lanes, &*rhs_lanes, out.as_mut_slice(), |a, b| {
                op.apply(a, b)
            }),
        }
        Ok(out)
    }

    /// Combine with another vector element-wise.
    ///
    /// # Panics
    ///
    /// Panics when the sizes differ at runtime.
    #[track_caller]
    pub fn binary<U, F>(
        &self,
        op: BinaryOp,
        rhs: &Vecteur<U, F, B>,
    ) -> Vecteur<PromotedElem<T, U>, Promoted<E, F>, B>
    where
        T: PromoteElem<U>,
        U: Element,
        F: Extent,
        E: Promote<F>,
    {
        self.try_binary(op, rhs).unwrap_or_else(|err| raise(err))
    }

    /// `out[i] = self[i] op scalar`
    pub fn binary_scalar(&self, op: BinaryOp, scalar: T) -> Self {
        self.map(|x| op.apply(x, scalar))
    }

    /// `out[i] = scalar op rhs[i]`
    pub fn scalar_binary(scalar: T, op: BinaryOp, rhs: &Self) -> Self {
        rhs.map(|x| op.apply(scalar, x))
    }

    /// Element-wise maximum.
    #[track_caller]
    pub fn max<U, F>(
        &self,
        rhs: &Vecteur<U, F, B>,
    ) -> Vecteur<PromotedElem<T, U>, Promoted<E, F>, B>
    where
        T: PromoteElem<U>,
        U: Element,
        F: Extent,
        E: Promote<F>,
    {
        self.binary(BinaryOp::Max, rhs)
    }

    /// Element-wise minimum.
    #[track_caller]
    pub fn min<U, F>(
        &self,
        rhs: &Vecteur<U, F, B>,
    ) -> Vecteur<PromotedElem<T, U>, Promoted<E, F>, B>
    where
        T: PromoteElem<U>,
        U: Element,
        F: Extent,
        E: Promote<F>,
    {
        self.binary(BinaryOp::Min, rhs)
    }

    /// Element-wise maximum against a scalar.
    pub fn max_scalar(&self, scalar: T) -> Self {
        self.binary_scalar(BinaryOp::Max, scalar)
    }

    /// Element-wise minimum against a scalar.
    pub fn min_scalar(&self, scalar: T) -> Self {
        self.binary_scalar(BinaryOp::Min, scalar)
    }

    // ========================================================================
    // Unary Operations
    // ========================================================================

    /// Apply `f` to every element.
    pub fn map(&self, f: impl Fn(T) -> T) -> Self {
        let mut out = Self::zeroed(self.len());
        map_with(self.as_slice(), out.as_mut_slice(), f);
        out
    }

    /// Apply a named unary operation.
    pub fn unary(&self, op: UnaryOp, f: fn(T) -> T) -> Self {
        tracing::trace!(op = %op, backend = %B::KIND, "eager unary");
        self.map(f)
    }

    /// `x * x`
    pub fn sqr(&self) -> Self {
        self.unary(UnaryOp::Sqr, |x| x * x)
    }

    /// `-x`
    pub fn neg(&self) -> Self
    where
        T: Neg<Output = T>,
    {
        self.unary(UnaryOp::Neg, |x| -x)
    }

    /// `|x|`
    pub fn abs(&self) -> Self
    where
        T: Signed,
    {
        self.unary(UnaryOp::Abs, |x| Signed::abs(&x))
    }
}

impl<T: Real, E: Extent, B: Eager> Vecteur<T, E, B> {
    /// Round up.
    pub fn ceil(&self) -> Self {
        self.unary(UnaryOp::Ceil, Float::ceil)
    }

    /// `e^x`
    pub fn exp(&self) -> Self {
        self.unary(UnaryOp::Exp, Float::exp)
    }

    /// Round down.
    pub fn floor(&self) -> Self {
        self.unary(UnaryOp::Floor, Float::floor)
    }

    /// Natural logarithm.
    pub fn log(&self) -> Self {
        self.unary(UnaryOp::Log, Float::ln)
    }

    /// Round half away from zero.
    pub fn round(&self) -> Self {
        self.unary(UnaryOp::Round, Float::round)
    }

    /// Square root.
    pub fn sqrt(&self) -> Self {
        let mut out = Self::zeroed(self.len());
        B::sqrt(self.as_slice(), out.as_mut_slice(), E::wide());
        out
    }

    /// Reciprocal square root.
    pub fn rsqrt(&self) -> Self {
        let mut out = Self::zeroed(self.len());
        B::rsqrt(self.as_slice(), out.as_mut_slice(), E::wide());
        out
    }

    /// Divide by the Euclidean length.
    ///
    /// A zero vector yields NaN elements.
    pub fn normalize(&self) -> Self {
        self.binary_scalar(BinaryOp::Div, self.norm())
    }
}
