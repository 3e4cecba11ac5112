//! Kira Vecteur - small numeric vectors with selectable backends
//!
//! A [`Vecteur<T, E, B>`] is identified by its element type `T`, its
//! length-kind `E` ([`Const<N>`] or [`Dyn`]) and its backend `B`:
//!
//! | Backend     | Evaluation | Notes                                          |
//! |-------------|------------|------------------------------------------------|
//! | [`Generic`] | Eager      | One scalar loop per operation                  |
//! | [`Simd`]    | Eager      | Lane kernels for add, sqrt and rsqrt           |
//! | [`Lazy`]    | Deferred   | Builds a [`LazyExpr`] tree, rewritten on build |
//!
//! All three expose the same surface through [`VecteurExpr`] and the
//! standard operator traits, so code written against one backend runs on
//! the others by changing the type.
//!
//! # Example
//!
//! ```
//! use kira_vecteur::prelude::*;
//!
//! // Eager
//! let a = Vec3f::from([1.0, 2.0, 3.0]);
//! let b = Vec3f::from([4.0, 5.0, 6.0]);
//! assert_eq!((&a * &b).hsum(), 32.0);
//!
//! // Deferred: `a * b + c` becomes one fused multiply-add node
//! let a = a.with_backend::<Lazy>();
//! let b = b.with_backend::<Lazy>();
//! let expr = &a * &b + &a;
//! assert!(expr.is_fused());
//! assert_eq!(expr.eval().to_array(), [5.0, 12.0, 21.0]);
//! ```
//!
//! # Errors
//!
//! Operations on runtime-length operands check sizes when they run. The
//! `try_*` methods return [`VecteurError`]; operators, indexing and the
//! non-`try` methods panic with the same message.
//!
//! # Logging
//!
//! Lazy collapse, evaluation and rewrites emit `tracing` events at `trace`
//! and `debug` level. Nothing is logged unless a subscriber is installed.

#![warn(missing_docs)]
#![allow(unsafe_code)] // SIMD kernels and heap storage

pub mod arith;
pub mod backend;
pub mod config;
pub mod error;
pub mod expr;
pub mod generic;
pub mod lazy;
pub mod op;
pub mod scalar;
pub mod shape;
pub mod simd;
pub mod storage;
pub mod vecteur;

pub use backend::{Backend, BackendKind, Eager, Generic, Lazy, Simd};
pub use config::LazyOptions;
pub use error::{Result, VecteurError};
pub use expr::{Accumulation, VecteurExpr};
pub use lazy::{IntoExpr, LazyExpr};
pub use op::{BinaryOp, UnaryOp};
pub use scalar::{Element, PromoteElem, PromotedElem, Real};
pub use shape::{Const, Dyn, Extent, Fits, Promote, Promoted, Shape};
pub use vecteur::Vecteur;

// ============================================================================
// Aliases
// ============================================================================

/// Two `f32`.
pub type Vec2f = Vecteur<f32, Const<2>>;
/// Three `f32`.
pub type Vec3f = Vecteur<f32, Const<3>>;
/// Four `f32`.
pub type Vec4f = Vecteur<f32, Const<4>>;
/// Any number of `f32`.
pub type VecXf = Vecteur<f32, Dyn>;

/// Two `f64`.
pub type Vec2d = Vecteur<f64, Const<2>>;
/// Three `f64`.
pub type Vec3d = Vecteur<f64, Const<3>>;
/// Four `f64`.
pub type Vec4d = Vecteur<f64, Const<4>>;
/// Any number of `f64`.
pub type VecXd = Vecteur<f64, Dyn>;

/// Two `i32`.
pub type Vec2i = Vecteur<i32, Const<2>>;
/// Three `i32`.
pub type Vec3i = Vecteur<i32, Const<3>>;
/// Four `i32`.
pub type Vec4i = Vecteur<i32, Const<4>>;
/// Any number of `i32`.
pub type VecXi = Vecteur<i32, Dyn>;

/// Everything needed for day-to-day use.
pub mod prelude {
    pub use crate::backend::{Generic, Lazy, Simd};
    pub use crate::expr::VecteurExpr;
    pub use crate::lazy::{IntoExpr, LazyExpr};
    pub use crate::op::{BinaryOp, UnaryOp};
    pub use crate::shape::{Const, Dyn};
    pub use crate::vecteur::Vecteur;
    pub use crate::{
        Vec2d, Vec2f, Vec2i, Vec3d, Vec3f, Vec3i, Vec4d, Vec4f, Vec4i, VecXd, VecXf, VecXi,
    };
}
