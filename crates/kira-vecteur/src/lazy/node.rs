//! Expression tree nodes.

use crate::lazy::arena::{LeafArena, LeafId};
use crate::op::{BinaryOp, UnaryOp};
use crate::scalar::Element;

/// A node of a lazy expression tree.
///
/// Leaves are either borrowed from a live vector or owned by the
/// expression's [`LeafArena`]. Inner nodes own their children.
#[derive(Clone, Debug)]
pub enum Node<'a, T: Element> {
    /// Elements of a vector that outlives the expression.
    Borrowed(&'a [T]),
    /// Elements stored in the expression's arena.
    Owned(LeafId),
    /// A scalar broadcast to every index.
    Scalar(T),
    /// `f(operand[i])`
    Unary {
        /// Which operation `f` performs.
        op: UnaryOp,
        /// Per-element function.
        f: fn(T) -> T,
        /// Operand.
        operand: Box<Node<'a, T>>,
    },
    /// `lhs[i] op rhs[i]`
    Binary {
        /// Operation.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Node<'a, T>>,
        /// Right operand.
        rhs: Box<Node<'a, T>>,
    },
    /// `a[i] * b[i] + c[i]` with a single rounding.
    FusedMulAdd {
        /// First factor.
        a: Box<Node<'a, T>>,
        /// Second factor.
        b: Box<Node<'a, T>>,
        /// Addend.
        c: Box<Node<'a, T>>,
    },
}

impl<'a, T: Element> Node<'a, T> {
    /// 1 for leaves and scalars, otherwise one more than the tallest child.
    pub fn height(&self) -> usize {
        match self {
            Node::Borrowed(_) | Node::Owned(_) | Node::Scalar(_) => 1,
            Node::Unary { operand, .. } => 1 + operand.height(),
            Node::Binary { lhs, rhs, .. } => 1 + lhs.height().max(rhs.height()),
            Node::FusedMulAdd { a, b, c } => 1 + a.height().max(b.height()).max(c.height()),
        }
    }

    /// Whether this node holds values directly.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Borrowed(_) | Node::Owned(_))
    }

    /// Number of nodes in the tree.
    pub fn count(&self) -> usize {
        match self {
            Node::Borrowed(_) | Node::Owned(_) | Node::Scalar(_) => 1,
            Node::Unary { operand, .. } => 1 + operand.count(),
            Node::Binary { lhs, rhs, .. } => 1 + lhs.count() + rhs.count(),
            Node::FusedMulAdd { a, b, c } => 1 + a.count() + b.count() + c.count(),
        }
    }

    /// Shift every arena handle by `offset`.
    pub(crate) fn rebase(&mut self, offset: u32) {
        if offset == 0 {
            return;
        }
        match self {
            Node::Owned(id) => *id = id.shifted(offset),
            Node::Borrowed(_) | Node::Scalar(_) => {}
            Node::Unary { operand, .. } => operand.rebase(offset),
            Node::Binary { lhs, rhs, .. } => {
                lhs.rebase(offset);
                rhs.rebase(offset);
            }
            Node::FusedMulAdd { a, b, c } => {
                a.rebase(offset);
                b.rebase(offset);
                c.rebase(offset);
            }
        }
    }

    /// Value at `index`, computed without materializing intermediates.
    #[inline]
    pub(crate) fn entry(&self, leaves: &LeafArena<T>, index: usize) -> T {
        match self {
            Node::Borrowed(values) => values[index],
            Node::Owned(id) => leaves.get(*id)[index],
            Node::Scalar(value) => *value,
            Node::Unary { f, operand, .. } => f(operand.entry(leaves, index)),
            Node::Binary { op, lhs, rhs } => {
                op.apply(lhs.entry(leaves, index), rhs.entry(leaves, index))
            }
            Node::FusedMulAdd { a, b, c } => a.entry(leaves, index).fused_mul_add(
                b.entry(leaves, index),
                c.entry(leaves, index),
            ),
        }
    }
}
