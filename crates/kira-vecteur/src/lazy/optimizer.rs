//! Tree rewrites applied while a lazy expression is built.
//!
//! Every new binary node passes through [`Optimizer::optimize`] before it is
//! returned to the caller. Detection looks only at the top of the new node,
//! so the cost when nothing matches is a couple of discriminant checks.
//!
//! ## Patterns
//!
//! 1. `(a * b) + c` → `FusedMulAdd(a, b, c)`: one node instead of two and a
//!    single rounding. Only a product in the left operand is matched.

use tracing::debug;

use crate::config::LazyOptions;
use crate::lazy::node::Node;
use crate::op::BinaryOp;
use crate::scalar::Element;

/// A tree shape the optimizer knows how to rewrite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RewritePattern {
    /// `(a * b) + c`
    FusedMulAdd,
}

/// Applies the enabled rewrites to freshly built nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Optimizer {
    fuse_multiply_add: bool,
}

impl Optimizer {
    /// An optimizer with every rewrite enabled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fuse_multiply_add: true,
        }
    }

    /// An optimizer with no rewrites.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            fuse_multiply_add: false,
        }
    }

    /// An optimizer configured from `options`.
    #[must_use]
    pub const fn from_options(options: &LazyOptions) -> Self {
        Self {
            fuse_multiply_add: options.fuse_multiply_add,
        }
    }

    /// The pattern `node` matches, if any.
    pub fn detect<T: Element>(&self, node: &Node<'_, T>) -> Option<RewritePattern> {
        if self.fuse_multiply_add && is_mul_then_add(node) {
            return Some(RewritePattern::FusedMulAdd);
        }
        None
    }

    /// Rewrite `node` if it matches an enabled pattern; otherwise return it
    /// unchanged.
    pub fn optimize<'a, T: Element>(&self, node: Node<'a, T>) -> Node<'a, T> {
        match self.detect(&node) {
            Some(RewritePattern::FusedMulAdd) => fuse_multiply_add(node),
            None => node,
        }
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_mul_then_add<T: Element>(node: &Node<'_, T>) -> bool {
    matches!(
        node,
        Node::Binary { op: BinaryOp::Add, lhs, .. }
            if matches!(**lhs, Node::Binary { op: BinaryOp::Mul, .. })
    )
}

fn fuse_multiply_add<T: Element>(node: Node<'_, T>) -> Node<'_, T> {
    let Node::Binary {
        op: BinaryOp::Add,
        lhs,
        rhs: c,
    } = node
    else {
        return node;
    };
    match *lhs {
        Node::Binary {
            op: BinaryOp::Mul,
            lhs: a,
            rhs: b,
        } => {
            debug!(element = T::NAME, "fusing (a * b) + c into multiply-add");
            Node::FusedMulAdd { a, b, c }
        }
        lhs => Node::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(lhs),
            rhs: c,
        },
    }
}
