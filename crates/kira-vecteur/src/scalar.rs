//! Element types.
//!
//! [`Element`] covers every numeric type a vector can hold. [`Real`] narrows
//! it to floating-point types, which gate the transcendental operations
//! (`sqrt`, `exp`, `log`, ...) and `normalize`.
//!
//! [`PromoteElem`] picks the element type of a mixed-type operation.
//!
//! Both traits carry the lane-parallel kernels used by the
//! [`Simd`](crate::Simd) backend. The defaults are plain scalar loops; types
//! with hardware support override them with the strip-mined kernels in
//! [`crate::simd`].

use std::borrow::Cow;
use std::fmt;

use num_traits::{Float, MulAdd, Num};

use crate::generic::{map_with, zip_with};
use crate::simd;

// ============================================================================
// Element
// ============================================================================

/// A numeric type that can be stored in a vector.
pub trait Element:
    Num
    + MulAdd<Output = Self>
    + Copy
    + Default
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Send
    + Sync
    + 'static
{
    /// Type name used in diagnostics.
    const NAME: &'static str;

    /// The larger of two values; returns `self` when they compare equal or
    /// are unordered.
    #[inline]
    fn max_of(self, other: Self) -> Self {
        if self < other {
            other
        } else {
            self
        }
    }

    /// The smaller of two values; returns `self` when they compare equal or
    /// are unordered.
    #[inline]
    fn min_of(self, other: Self) -> Self {
        if other < self {
            other
        } else {
            self
        }
    }

    /// `self * a + b` with a single rounding for floating-point types.
    #[inline]
    fn fused_mul_add(self, a: Self, b: Self) -> Self {
        MulAdd::mul_add(self, a, b)
    }

    /// Element-wise addition over whole lanes.
    ///
    /// All three slices have the same length.
    #[inline]
    fn lanes_add(lhs: &[Self], rhs: &[Self], out: &mut [Self]) {
        zip_with(lhs, rhs, out, |a, b| a + b);
    }
}

// ============================================================================
// Real
// ============================================================================

/// A floating-point element type.
pub trait Real: Element + Float {
    /// Element-wise square root over whole lanes.
    #[inline]
    fn lanes_sqrt(src: &[Self], out: &mut [Self]) {
        map_with(src, out, Float::sqrt);
    }

    /// Element-wise reciprocal square root over whole lanes.
    #[inline]
    fn lanes_rsqrt(src: &[Self], out: &mut [Self]) {
        map_with(src, out, rsqrt);
    }
}

/// Reciprocal square root of a single value.
#[inline]
pub fn rsqrt<T: Real>(x: T) -> T {
    x.sqrt().recip()
}

// ============================================================================
// Promotion
// ============================================================================

/// Element type of the result of combining `Self` with `Rhs` element-wise.
///
/// Follows the usual arithmetic conversions. The wider integer wins, an
/// unsigned type wins over a signed type of the same width, any float wins
/// over any integer, and `f64` wins over `f32`. Conversion uses `as`
/// semantics.
///
/// ```
/// use kira_vecteur::prelude::*;
///
/// let ints = Vec3i::from([1, 2, 3]);
/// let halves = Vec3f::from([0.5, 0.5, 0.5]);
/// let sum: Vec3f = &ints + &halves;
/// assert_eq!(sum.to_array(), [1.5, 2.5, 3.5]);
/// ```
pub trait PromoteElem<Rhs: Element>: Element {
    /// The common element type.
    type Output: Element;

    /// Left operand as the common type, borrowed when no conversion is needed.
    fn lift_lhs(src: &[Self]) -> Cow<'_, [<Self as PromoteElem<Rhs>>::Output]>;

    /// Right operand as the common type, borrowed when no conversion is needed.
    fn lift_rhs(src: &[Rhs]) -> Cow<'_, [<Self as PromoteElem<Rhs>>::Output]>;
}

/// Shorthand for the common element type of `L` and `R`.
pub type PromotedElem<L, R> = <L as PromoteElem<R>>::Output;

macro_rules! promote_same {
    ($($t:ty),* $(,)?) => {
        $(
            impl PromoteElem<$t> for $t {
                type Output = $t;

                #[inline]
                fn lift_lhs(src: &[$t]) -> Cow<'_, [$t]> {
                    Cow::Borrowed(src)
                }

                #[inline]
                fn lift_rhs(src: &[$t]) -> Cow<'_, [$t]> {
                    Cow::Borrowed(src)
                }
            }
        )*
    };
}

macro_rules! promote_to {
    ($($narrow:ty => $wide:ty;)*) => {
        $(
            impl PromoteElem<$wide> for $narrow {
                type Output = $wide;

                fn lift_lhs(src: &[$narrow]) -> Cow<'_, [$wide]> {
                    Cow::Owned(src.iter().map(|&x| x as $wide).collect())
                }

                #[inline]
                fn lift_rhs(src: &[$wide]) -> Cow<'_, [$wide]> {
                    Cow::Borrowed(src)
                }
            }

            impl PromoteElem<$narrow> for $wide {
                type Output = $wide;

                #[inline]
                fn lift_lhs(src: &[$wide]) -> Cow<'_, [$wide]> {
                    Cow::Borrowed(src)
                }

                fn lift_rhs(src: &[$narrow]) -> Cow<'_, [$wide]> {
                    Cow::Owned(src.iter().map(|&x| x as $wide).collect())
                }
            }
        )*
    };
}

promote_same!(i32, i64, u32, u64, f32, f64);

promote_to! {
    i32 => u32;
    i32 => i64;
    i32 => u64;
    u32 => i64;
    u32 => u64;
    i64 => u64;
    i32 => f32;
    u32 => f32;
    i64 => f32;
    u64 => f32;
    i32 => f64;
    u32 => f64;
    i64 => f64;
    u64 => f64;
    f32 => f64;
}

// ============================================================================
// Implementations
// ============================================================================

macro_rules! impl_element {
    ($($t:ty),* $(,)?) => {
        $(
            impl Element for $t {
                const NAME: &'static str = stringify!($t);
            }
        )*
    };
}

impl_element!(u32, u64);

impl Element for i32 {
    const NAME: &'static str = "i32";

    #[inline]
    fn lanes_add(lhs: &[Self], rhs: &[Self], out: &mut [Self]) {
        simd::add_i32(lhs, rhs, out);
    }
}

impl Element for i64 {
    const NAME: &'static str = "i64";

    #[inline]
    fn lanes_add(lhs: &[Self], rhs: &[Self], out: &mut [Self]) {
        simd::add_i64(lhs, rhs, out);
    }
}

impl Element for f32 {
    const NAME: &'static str = "f32";

    #[inline]
    fn lanes_add(lhs: &[Self], rhs: &[Self], out: &mut [Self]) {
        simd::add_f32(lhs, rhs, out);
    }
}

impl Element for f64 {
    const NAME: &'static str = "f64";

    #[inline]
    fn lanes_add(lhs: &[Self], rhs: &[Self], out: &mut [Self]) {
        simd::add_f64(lhs, rhs, out);
    }
}

impl Real for f32 {
    #[inline]
    fn lanes_sqrt(src: &[Self], out: &mut [Self]) {
        simd::sqrt_f32(src, out);
    }

    #[inline]
    fn lanes_rsqrt(src: &[Self], out: &mut [Self]) {
        simd::rsqrt_f32(src, out);
    }
}

impl Real for f64 {
    #[inline]
    fn lanes_sqrt(src: &[Self], out: &mut [Self]) {
        simd::sqrt_f64(src, out);
    }

    #[inline]
    fn lanes_rsqrt(src: &[Self], out: &mut [Self]) {
        simd::rsqrt_f64(src, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_min_prefer_lhs_on_ties() {
        assert_eq!(3i32.max_of(5), 5);
        assert_eq!(3i32.min_of(5), 3);
        assert_eq!(4u64.max_of(4), 4);
        assert!(f32::NAN.max_of(1.0).is_nan());
        assert!(f32::NAN.min_of(1.0).is_nan());
    }

    #[test]
    fn test_fused_mul_add_integer() {
        assert_eq!(3i64.fused_mul_add(4, 5), 17);
        assert_eq!(2u32.fused_mul_add(2, 2), 6);
    }

    #[test]
    fn test_fused_mul_add_single_rounding() {
        // 0.1 * 10 - 1 is exactly representable only without the
        // intermediate rounding of the product.
        let a = 0.1f64;
        let fused = a.fused_mul_add(10.0, -1.0);
        assert_eq!(fused, 0.1f64.mul_add(10.0, -1.0));
        assert_ne!(fused, 0.0);
    }

    #[test]
    fn test_rsqrt_scalar() {
        assert_eq!(rsqrt(4.0f64), 0.5);
        assert!((rsqrt(2.0f32) - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-7);
    }

    #[test]
    fn test_promoted_element_types() {
        fn common<L: PromoteElem<R>, R: Element>() -> &'static str {
            <PromotedElem<L, R> as Element>::NAME
        }

        assert_eq!(common::<i32, i32>(), "i32");
        assert_eq!(common::<i32, f32>(), "f32");
        assert_eq!(common::<f32, i32>(), "f32");
        assert_eq!(common::<f32, f64>(), "f64");
        assert_eq!(common::<i64, f32>(), "f32");
        assert_eq!(common::<i32, i64>(), "i64");
        assert_eq!(common::<u32, i64>(), "i64");
        assert_eq!(common::<i32, u32>(), "u32");
        assert_eq!(common::<u64, i64>(), "u64");
    }

    #[test]
    fn test_lift_borrows_matching_side() {
        let ints = [1i32, -2];
        let floats = [0.5f64, 1.5];
        assert!(matches!(<f64 as PromoteElem<i32>>::lift_lhs(&floats), Cow::Borrowed(_)));
        assert_eq!(<f64 as PromoteElem<i32>>::lift_rhs(&ints).as_ref(), &[1.0, -2.0]);
        assert!(matches!(<i32 as PromoteElem<i32>>::lift_rhs(&ints), Cow::Borrowed(_)));
        assert_eq!(<i32 as PromoteElem<u32>>::lift_lhs(&ints).as_ref(), &[1, u32::MAX - 1]);
    }

    #[test]
    fn test_names() {
        assert_eq!(<f32 as Element>::NAME, "f32");
        assert_eq!(<u64 as Element>::NAME, "u64");
    }
}
