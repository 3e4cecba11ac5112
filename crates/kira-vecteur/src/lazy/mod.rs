//! Deferred evaluation.
//!
//! Operations on [`Lazy`] vectors build a [`LazyExpr`] tree instead of
//! computing a result. The tree implements [`VecteurExpr`], so it can be
//! reduced, compared or combined further, and [`LazyExpr::eval`] walks it
//! once per output element to produce a storage-backed vector.
//!
//! ```
//! use kira_vecteur::prelude::*;
//!
//! let a = Vecteur::<f32, Const<3>, Lazy>::new([1.0, 2.0, 3.0]);
//! let b = Vecteur::<f32, Const<3>, Lazy>::new([4.0, 5.0, 6.0]);
//!
//! let expr = &a * &b + 1.0;
//! assert!(expr.is_fused());
//! assert_eq!(expr.eval().to_array(), [5.0, 11.0, 19.0]);
//! ```
//!
//! # Ownership
//!
//! Leaves are either borrowed from vectors that outlive the expression or
//! owned by the expression's [`LeafArena`]. An operand whose height reaches
//! [`LazyOptions::collapse_height`](crate::config::LazyOptions) is evaluated
//! into the arena before it becomes a child, which bounds the depth of every
//! tree.

pub mod arena;
pub mod node;
pub mod optimizer;

use std::marker::PhantomData;
use std::ops::Neg;

use num_traits::{Float, Signed};
use tracing::trace;

pub use arena::{LeafArena, LeafId};
pub use node::Node;
pub use optimizer::{Optimizer, RewritePattern};

use crate::backend::{Backend, Lazy};
use crate::config::{self, LazyOptions};
use crate::error::{raise, Result, VecteurError};
use crate::expr::VecteurExpr;
use crate::op::{BinaryOp, UnaryOp};
use crate::scalar::{rsqrt, Element, Real};
use crate::shape::{check_operable, Dyn, Extent, Fits, Promote, Promoted};
use crate::vecteur::Vecteur;

/// An unevaluated element-wise expression.
///
/// `'a` bounds the vectors the expression borrows. Expressions built only
/// from owned operands are `'static`.
#[derive(Clone, Debug)]
pub struct LazyExpr<'a, T: Element, E: Extent = Dyn> {
    root: Node<'a, T>,
    leaves: LeafArena<T>,
    size: usize,
    height: usize,
    _extent: PhantomData<E>,
}

impl<'a, T: Element, E: Extent> LazyExpr<'a, T, E> {
    fn from_parts(root: Node<'a, T>, leaves: LeafArena<T>, size: usize) -> Self {
        let height = root.height();
        LazyExpr {
            root,
            leaves,
            size,
            height,
            _extent: PhantomData,
        }
    }

    /// A leaf referring to `vector`.
    pub fn leaf(vector: &'a Vecteur<T, E, Lazy>) -> Self {
        Self::from_parts(Node::Borrowed(vector.as_slice()), LeafArena::new(), vector.len())
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Height of the tree: 1 for a leaf.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Root node.
    #[inline]
    pub fn root(&self) -> &Node<'a, T> {
        &self.root
    }

    /// Leaves evaluated into this expression.
    #[inline]
    pub fn leaves(&self) -> &LeafArena<T> {
        &self.leaves
    }

    /// Whether the root is a fused multiply-add.
    pub fn is_fused(&self) -> bool {
        matches!(self.root, Node::FusedMulAdd { .. })
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Compute every entry into a new vector.
    pub fn eval(&self) -> Vecteur<T, E, Lazy> {
        trace!(size = self.size, height = self.height, "evaluating lazy expression");
        let mut out = Vecteur::zeroed(self.size);
        for (i, slot) in out.as_mut_slice().iter_mut().enumerate() {
            *slot = self.root.entry(&self.leaves, i);
        }
        out
    }

    /// Compute every entry into `out`, resizing a runtime-length target.
    pub fn eval_into<D, B>(&self, out: &mut Vecteur<T, D, B>)
    where
        D: Extent,
        B: Backend,
        E: Fits<D>,
    {
        out.assign(self);
    }

    /// Evaluate into the arena when the tree is at least `threshold` tall.
    fn collapse(self, threshold: usize) -> Self {
        if self.height < threshold {
            return self;
        }
        trace!(size = self.size, height = self.height, "collapsing lazy operand");
        let mut leaves = LeafArena::new();
        let id = leaves.alloc_with(self.size, |i| self.root.entry(&self.leaves, i));
        Self::from_parts(Node::Owned(id), leaves, self.size)
    }

    fn finish<F: Extent>(
        root: Node<'a, T>,
        leaves: LeafArena<T>,
        size: usize,
        options: &LazyOptions,
    ) -> LazyExpr<'a, T, F> {
        let root = Optimizer::from_options(options).optimize(root);
        LazyExpr::from_parts(root, leaves, size)
    }

    // ========================================================================
    // Binary Operations
    // ========================================================================

    /// Combine with another operand element-wise.
    ///
    /// Fails when the sizes differ at runtime.
    pub fn try_binary<R>(
        self,
        op: BinaryOp,
        rhs: R,
    ) -> Result<LazyExpr<'a, T, Promoted<E, R::Extent>>>
    where
        R: IntoExpr<'a, T>,
        E: Promote<R::Extent>,
    {
        let rhs = rhs.into_expr();
        let size = check_operable(self.size, rhs.size)?;

        let options = config::current();
        let threshold = options.effective_collapse_height();
        let lhs = self.collapse(threshold);
        let rhs = rhs.collapse(threshold);

        let LazyExpr {
            root: lhs_root,
            mut leaves,
            ..
        } = lhs;
        let LazyExpr {
            root: mut rhs_root,
            leaves: rhs_leaves,
            ..
        } = rhs;
        let offset = leaves.absorb(rhs_leaves);
        rhs_root.rebase(offset);

        let node = Node::Binary {
            op,
            lhs: Box::new(lhs_root),
            rhs: Box::new(rhs_root),
        };
        Ok(Self::finish(node, leaves, size, &options))
    }

    /// Combine with another operand element-wise.
    ///
    /// # Panics
    ///
    /// Panics when the sizes differ at runtime.
    #[track_caller]
    pub fn binary<R>(self, op: BinaryOp, rhs: R) -> LazyExpr<'a, T, Promoted<E, R::Extent>>
    where
        R: IntoExpr<'a, T>,
        E: Promote<R::Extent>,
    {
        self.try_binary(op, rhs).unwrap_or_else(|err| raise(err))
    }

    /// `out[i] = self[i] op scalar`
    pub fn binary_scalar(self, op: BinaryOp, scalar: T) -> Self {
        let options = config::current();
        let LazyExpr {
            root, leaves, size, ..
        } = self.collapse(options.effective_collapse_height());
        let node = Node::Binary {
            op,
            lhs: Box::new(root),
            rhs: Box::new(Node::Scalar(scalar)),
        };
        Self::finish(node, leaves, size, &options)
    }

    /// `out[i] = scalar op rhs[i]`
    pub fn scalar_binary(scalar: T, op: BinaryOp, rhs: Self) -> Self {
        let options = config::current();
        let LazyExpr {
            root, leaves, size, ..
        } = rhs.collapse(options.effective_collapse_height());
        let node = Node::Binary {
            op,
            lhs: Box::new(Node::Scalar(scalar)),
            rhs: Box::new(root),
        };
        Self::finish(node, leaves, size, &options)
    }

    /// Element-wise maximum.
    #[track_caller]
    pub fn max<R>(self, rhs: R) -> LazyExpr<'a, T, Promoted<E, R::Extent>>
    where
        R: IntoExpr<'a, T>,
        E: Promote<R::Extent>,
    {
        self.binary(BinaryOp::Max, rhs)
    }

    /// Element-wise minimum.
    #[track_caller]
    pub fn min<R>(self, rhs: R) -> LazyExpr<'a, T, Promoted<E, R::Extent>>
    where
        R: IntoExpr<'a, T>,
        E: Promote<R::Extent>,
    {
        self.binary(BinaryOp::Min, rhs)
    }

    /// Element-wise maximum against a scalar.
    pub fn max_scalar(self, scalar: T) -> Self {
        self.binary_scalar(BinaryOp::Max, scalar)
    }

    /// Element-wise minimum against a scalar.
    pub fn min_scalar(self, scalar: T) -> Self {
        self.binary_scalar(BinaryOp::Min, scalar)
    }

    // ========================================================================
    // Unary Operations
    // ========================================================================

    /// Apply a named unary operation lazily.
    pub fn unary(self, op: UnaryOp, f: fn(T) -> T) -> Self {
        let options = config::current();
        let LazyExpr {
            root, leaves, size, ..
        } = self.collapse(options.effective_collapse_height());
        trace!(op = %op, "lazy unary");
        let node = Node::Unary {
            op,
            f,
            operand: Box::new(root),
        };
        Self::from_parts(node, leaves, size)
    }

    /// `x * x`
    pub fn sqr(self) -> Self {
        self.unary(UnaryOp::Sqr, |x| x * x)
    }

    /// `-x`
    pub fn neg(self) -> Self
    where
        T: Neg<Output = T>,
    {
        self.unary(UnaryOp::Neg, |x| -x)
    }

    /// `|x|`
    pub fn abs(self) -> Self
    where
        T: Signed,
    {
        self.unary(UnaryOp::Abs, |x| Signed::abs(&x))
    }
}

impl<'a, T: Real, E: Extent> LazyExpr<'a, T, E> {
    /// Round up.
    pub fn ceil(self) -> Self {
        self.unary(UnaryOp::Ceil, Float::ceil)
    }

    /// `e^x`
    pub fn exp(self) -> Self {
        self.unary(UnaryOp::Exp, Float::exp)
    }

    /// Round down.
    pub fn floor(self) -> Self {
        self.unary(UnaryOp::Floor, Float::floor)
    }

    /// Natural logarithm.
    pub fn log(self) -> Self {
        self.unary(UnaryOp::Log, Float::ln)
    }

    /// Round half away from zero.
    pub fn round(self) -> Self {
        self.unary(UnaryOp::Round, Float::round)
    }

    /// Square root.
    pub fn sqrt(self) -> Self {
        self.unary(UnaryOp::Sqrt, Float::sqrt)
    }

    /// Reciprocal square root.
    pub fn rsqrt(self) -> Self {
        self.unary(UnaryOp::Rsqrt, rsqrt)
    }

    /// Divide by the Euclidean length, computed now.
    ///
    /// A zero vector yields NaN elements.
    pub fn normalize(self) -> Self {
        let norm = self.norm();
        self.binary_scalar(BinaryOp::Div, norm)
    }
}

impl<'a, T: Element, E: Extent> VecteurExpr for LazyExpr<'a, T, E> {
    type Elem = T;
    type Extent = E;

    #[inline]
    fn size(&self) -> usize {
        self.size
    }

    #[inline]
    #[track_caller]
    fn entry(&self, index: usize) -> T {
        if index >= self.size {
            raise(VecteurError::IndexOutOfBounds {
                index,
                size: self.size,
            });
        }
        self.root.entry(&self.leaves, index)
    }
}

impl<T: Element, E: Extent> LazyExpr<'static, T, E> {
    /// A leaf holding the elements of `vector` in the expression's arena.
    pub fn owned(vector: Vecteur<T, E, Lazy>) -> Self {
        let mut leaves = LeafArena::new();
        let id = leaves.alloc_slice(vector.as_slice());
        Self::from_parts(Node::Owned(id), leaves, vector.len())
    }
}

// ============================================================================
// Operands
// ============================================================================

/// Values usable as an operand of a lazy expression living for `'a`.
pub trait IntoExpr<'a, T: Element> {
    /// Length-kind of the operand.
    type Extent: Extent;

    /// Convert into an expression.
    fn into_expr(self) -> LazyExpr<'a, T, Self::Extent>;
}

impl<'a, 'b: 'a, T: Element, E: Extent> IntoExpr<'a, T> for &'b Vecteur<T, E, Lazy> {
    type Extent = E;

    fn into_expr(self) -> LazyExpr<'a, T, E> {
        LazyExpr::leaf(self)
    }
}

impl<'a, T: Element, E: Extent> IntoExpr<'a, T> for Vecteur<T, E, Lazy> {
    type Extent = E;

    fn into_expr(self) -> LazyExpr<'a, T, E> {
        LazyExpr::owned(self)
    }
}

impl<'a, 'b: 'a, T: Element, E: Extent> IntoExpr<'a, T> for LazyExpr<'b, T, E> {
    type Extent = E;

    fn into_expr(self) -> LazyExpr<'a, T, E> {
        self
    }
}

impl<'a, 'b: 'a, 'c, T: Element, E: Extent> IntoExpr<'a, T> for &'c LazyExpr<'b, T, E> {
    type Extent = E;

    fn into_expr(self) -> LazyExpr<'a, T, E> {
        self.clone()
    }
}

// ============================================================================
// Lazy Vectors
// ============================================================================

impl<T: Element, E: Extent> Vecteur<T, E, Lazy> {
    /// A leaf expression borrowing this vector.
    #[inline]
    pub fn lazy(&self) -> LazyExpr<'_, T, E> {
        LazyExpr::leaf(self)
    }

    /// Combine with another operand element-wise, lazily.
    pub fn try_binary<'a, R>(
        &'a self,
        op: BinaryOp,
        rhs: R,
    ) -> Result<LazyExpr<'a, T, Promoted<E, R::Extent>>>
    where
        R: IntoExpr<'a, T>,
        E: Promote<R::Extent>,
    {
        self.lazy().try_binary(op, rhs)
    }

    /// Combine with another operand element-wise, lazily.
    ///
    /// # Panics
    ///
    /// Panics when the sizes differ at runtime.
    #[track_caller]
    pub fn binary<'a, R>(
        &'a self,
        op: BinaryOp,
        rhs: R,
    ) -> LazyExpr<'a, T, Promoted<E, R::Extent>>
    where
        R: IntoExpr<'a, T>,
        E: Promote<R::Extent>,
    {
        self.lazy().binary(op, rhs)
    }

    /// `out[i] = self[i] op scalar`, lazily.
    pub fn binary_scalar(&self, op: BinaryOp, scalar: T) -> LazyExpr<'_, T, E> {
        self.lazy().binary_scalar(op, scalar)
    }

    /// Element-wise maximum.
    #[track_caller]
    pub fn max<'a, R>(&'a self, rhs: R) -> LazyExpr<'a, T, Promoted<E, R::Extent>>
    where
        R: IntoExpr<'a, T>,
        E: Promote<R::Extent>,
    {
        self.lazy().max(rhs)
    }

    /// Element-wise minimum.
    #[track_caller]
    pub fn min<'a, R>(&'a self, rhs: R) -> LazyExpr<'a, T, Promoted<E, R::Extent>>
    where
        R: IntoExpr<'a, T>,
        E: Promote<R::Extent>,
    {
        self.lazy().min(rhs)
    }

    /// Element-wise maximum against a scalar.
    pub fn max_scalar(&self, scalar: T) -> LazyExpr<'_, T, E> {
        self.lazy().max_scalar(scalar)
    }

    /// Element-wise minimum against a scalar.
    pub fn min_scalar(&self, scalar: T) -> LazyExpr<'_, T, E> {
        self.lazy().min_scalar(scalar)
    }

    /// `x * x`
    pub fn sqr(&self) -> LazyExpr<'_, T, E> {
        self.lazy().sqr()
    }

    /// `-x`
    pub fn neg(&self) -> LazyExpr<'_, T, E>
    where
        T: Neg<Output = T>,
    {
        self.lazy().neg()
    }

    /// `|x|`
    pub fn abs(&self) -> LazyExpr<'_, T, E>
    where
        T: Signed,
    {
        self.lazy().abs()
    }
}

impl<T: Real, E: Extent> Vecteur<T, E, Lazy> {
    /// Round up.
    pub fn ceil(&self) -> LazyExpr<'_, T, E> {
        self.lazy().ceil()
    }

    /// `e^x`
    pub fn exp(&self) -> LazyExpr<'_, T, E> {
        self.lazy().exp()
    }

    /// Round down.
    pub fn floor(&self) -> LazyExpr<'_, T, E> {
        self.lazy().floor()
    }

    /// Natural logarithm.
    pub fn log(&self) -> LazyExpr<'_, T, E> {
        self.lazy().log()
    }

    /// Round half away from zero.
    pub fn round(&self) -> LazyExpr<'_, T, E> {
        self.lazy().round()
    }

    /// Square root.
    pub fn sqrt(&self) -> LazyExpr<'_, T, E> {
        self.lazy().sqrt()
    }

    /// Reciprocal square root.
    pub fn rsqrt(&self) -> LazyExpr<'_, T, E> {
        self.lazy().rsqrt()
    }

    /// Divide by the Euclidean length.
    pub fn normalize(&self) -> LazyExpr<'_, T, E> {
        self.lazy().normalize()
    }
}
