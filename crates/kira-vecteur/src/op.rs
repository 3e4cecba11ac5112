//! Operator kinds.
//!
//! Element-wise operations are described by these enums and interpreted per
//! element, both by the eager loops and by lazy expression nodes.

use std::fmt;

use crate::scalar::Element;

/// An element-wise binary operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `a / b`
    Div,
    /// `a % b`
    Rem,
    /// The larger of `a` and `b`.
    Max,
    /// The smaller of `a` and `b`.
    Min,
}

impl BinaryOp {
    /// Apply to a pair of elements.
    #[inline]
    pub fn apply<T: Element>(self, a: T, b: T) -> T {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Rem => a % b,
            BinaryOp::Max => a.max_of(b),
            BinaryOp::Min => a.min_of(b),
        }
    }

    /// Operator symbol or function name.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Max => "max",
            BinaryOp::Min => "min",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An element-wise unary operation.
///
/// The kind names the operation; the function applied per element is chosen
/// for the element type when the operation is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Absolute value.
    Abs,
    /// Round toward positive infinity.
    Ceil,
    /// `e^x`
    Exp,
    /// Round toward negative infinity.
    Floor,
    /// Natural logarithm.
    Log,
    /// Round half away from zero.
    Round,
    /// Square root.
    Sqrt,
    /// Reciprocal square root.
    Rsqrt,
    /// Negation.
    Neg,
    /// `x * x`
    Sqr,
}

impl UnaryOp {
    /// Function name.
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Abs => "abs",
            UnaryOp::Ceil => "ceil",
            UnaryOp::Exp => "exp",
            UnaryOp::Floor => "floor",
            UnaryOp::Log => "log",
            UnaryOp::Round => "round",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Rsqrt => "rsqrt",
            UnaryOp::Neg => "neg",
            UnaryOp::Sqr => "sqr",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
