//! Backend markers.
//!
//! The backend is the third type parameter of [`Vecteur`](crate::Vecteur) and
//! selects how operations run. Selection is static: each marker picks a
//! different set of impls, so there is no runtime dispatch.
//!
//! - [`Generic`]: eager, one scalar loop per operation.
//! - [`Simd`]: eager, with strip-mined lane loops for add, sqrt and rsqrt.
//! - [`Lazy`]: operations build a [`LazyExpr`](crate::LazyExpr) that is
//!   evaluated on demand.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::generic::{map_with, zip_with};
use crate::scalar::{rsqrt, Element, Real};

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Generic {}
    impl Sealed for super::Lazy {}
    impl Sealed for super::Simd {}
}

/// Runtime name of a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Eager scalar loops.
    Generic,
    /// Deferred expression trees.
    Lazy,
    /// Eager lane-parallel loops.
    Simd,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Generic => write!(f, "generic"),
            BackendKind::Lazy => write!(f, "lazy"),
            BackendKind::Simd => write!(f, "simd"),
        }
    }
}

/// A backend marker type.
pub trait Backend: sealed::Sealed + Copy + Default + fmt::Debug + Send + Sync + 'static {
    /// Which backend this is.
    const KIND: BackendKind;
}

/// Eager scalar backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Generic;

/// Deferred-evaluation backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Lazy;

/// Lane-parallel eager backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Simd;

impl Backend for Generic {
    const KIND: BackendKind = BackendKind::Generic;
}

impl Backend for Lazy {
    const KIND: BackendKind = BackendKind::Lazy;
}

impl Backend for Simd {
    const KIND: BackendKind = BackendKind::Simd;
}

// ============================================================================
// Eager Kernels
// ============================================================================

/// Kernel table for backends that compute results immediately.
///
/// The provided methods are the scalar loops. A backend overrides the
/// kernels it can run faster. `wide` tells whether the operand extent
/// qualifies for lane-parallel execution.
pub trait Eager: Backend {
    /// `out[i] = lhs[i] + rhs[i]`
    #[inline]
    fn add<T: Element>(lhs: &[T], rhs: &[T], out: &mut [T], _wide: bool) {
        zip_with(lhs, rhs, out, |a, b| a + b);
    }

    /// `out[i] = sqrt(src[i])`
    #[inline]
    fn sqrt<T: Real>(src: &[T], out: &mut [T], _wide: bool) {
        map_with(src, out, T::sqrt);
    }

    /// `out[i] = 1 / sqrt(src[i])`
    #[inline]
    fn rsqrt<T: Real>(src: &[T], out: &mut [T], _wide: bool) {
        map_with(src, out, rsqrt);
    }
}

impl Eager for Generic {}

impl Eager for Simd {
    #[inline]
    fn add<T: Element>(lhs: &[T], rhs: &[T], out: &mut [T], wide: bool) {
        if wide {
            T::lanes_add(lhs, rhs, out);
        } else {
            zip_with(lhs, rhs, out, |a, b| a + b);
        }
    }

    #[inline]
    fn sqrt<T: Real>(src: &[T], out: &mut [T], wide: bool) {
        if wide {
            T::lanes_sqrt(src, out);
        } else {
            map_with(src, out, T::sqrt);
        }
    }

    #[inline]
    fn rsqrt<T: Real>(src: &[T], out: &mut [T], wide: bool) {
        if wide {
            T::lanes_rsqrt(src, out);
        } else {
            map_with(src, out, rsqrt);
        }
    }
}
