//! Strip-mined lane kernels for the [`Simd`](crate::Simd) backend.
//!
//! Each kernel walks its operands `lanes` elements at a time and finishes the
//! `len % lanes` leftover elements with a scalar loop.
//!
//! | Type  | Lanes (AVX) | Lanes (baseline)    |
//! |-------|-------------|---------------------|
//! | `f32` | 8           | 4 (SSE)             |
//! | `f64` | 4           | 2 (SSE2)            |
//! | `i32` | 4           | 4 (SSE2)            |
//! | `i64` | 2           | 2 (SSE2)            |
//!
//! On other architectures the same loops run over plain lane arrays.
//!
//! Results match the scalar loops exactly: add and sqrt are correctly
//! rounded in both, and rsqrt is computed as a lane divide of one by the lane
//! square root rather than with the hardware estimate. Integer lanes follow
//! scalar `+`: overflow panics when debug assertions are on and wraps
//! otherwise.
//!
//! # Panics
//!
//! Every kernel panics if its slices differ in length.

use std::ops::Range;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use num_traits::CheckedAdd;
use tracing::trace;

// ============================================================================
// Strip Mining
// ============================================================================

/// Splits `0..len` into whole lanes and a scalar remainder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StripMine {
    lanes: usize,
    body: usize,
    len: usize,
}

impl StripMine {
    /// Plan a loop over `len` elements in steps of `lanes`.
    ///
    /// # Panics
    ///
    /// Panics if `lanes` is zero.
    pub fn new(len: usize, lanes: usize) -> Self {
        assert!(lanes > 0, "lane width must be positive");
        StripMine {
            lanes,
            body: len - len % lanes,
            len,
        }
    }

    /// Start index of every whole lane.
    pub fn chunks(&self) -> impl Iterator<Item = usize> {
        (0..self.body).step_by(self.lanes)
    }

    /// Indices left over for the scalar loop.
    pub fn remainder(&self) -> Range<usize> {
        self.body..self.len
    }

    /// Lane width.
    pub fn lanes(&self) -> usize {
        self.lanes
    }
}

// ============================================================================
// Lane Widths
// ============================================================================

/// Lane width used for `f32` kernels on this machine.
pub fn lanes_f32() -> usize {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx") {
            return 8;
        }
    }
    4
}

/// Lane width used for `f64` kernels on this machine.
pub fn lanes_f64() -> usize {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx") {
            return 4;
        }
    }
    2
}

// ============================================================================
// Kernels
// ============================================================================

#[track_caller]
fn check_lengths<T>(lhs: &[T], rhs: &[T], out: &[T]) {
    assert_eq!(lhs.len(), out.len(), "lane operands must have equal lengths");
    assert_eq!(rhs.len(), out.len(), "lane operands must have equal lengths");
}

#[track_caller]
fn check_unary<T>(src: &[T], out: &[T]) {
    assert_eq!(src.len(), out.len(), "lane operands must have equal lengths");
}

/// Integer lanes always wrap; reject what scalar `+` would reject.
#[track_caller]
fn check_overflow<T: CheckedAdd>(lhs: &[T], rhs: &[T]) {
    if cfg!(debug_assertions) && lhs.iter().zip(rhs).any(|(a, b)| a.checked_add(b).is_none()) {
        panic!("attempt to add with overflow");
    }
}

/// `out[i] = lhs[i] + rhs[i]` over `f32` lanes.
#[track_caller]
pub fn add_f32(lhs: &[f32], rhs: &[f32], out: &mut [f32]) {
    check_lengths(lhs, rhs, out);
    let lanes = lanes_f32();
    trace!(lanes, len = out.len(), "simd add f32");

    #[cfg(target_arch = "x86_64")]
    unsafe {
        if lanes == 8 {
            x86::add_f32_avx(lhs, rhs, out);
        } else {
            x86::add_f32_sse(lhs, rhs, out);
        }
    }

    #[cfg(not(target_arch = "x86_64"))]
    portable::zip::<f32, 4>(lhs, rhs, out, |a, b| a + b);
}

/// `out[i] = lhs[i] + rhs[i]` over `f64` lanes.
#[track_caller]
pub fn add_f64(lhs: &[f64], rhs: &[f64], out: &mut [f64]) {
    check_lengths(lhs, rhs, out);
    let lanes = lanes_f64();
    trace!(lanes, len = out.len(), "simd add f64");

    #[cfg(target_arch = "x86_64")]
    unsafe {
        if lanes == 4 {
            x86::add_f64_avx(lhs, rhs, out);
        } else {
            x86::add_f64_sse2(lhs, rhs, out);
        }
    }

    #[cfg(not(target_arch = "x86_64"))]
    portable::zip::<f64, 2>(lhs, rhs, out, |a, b| a + b);
}

/// `out[i] = lhs[i] + rhs[i]` over `i32` lanes.
#[track_caller]
pub fn add_i32(lhs: &[i32], rhs: &[i32], out: &mut [i32]) {
    check_lengths(lhs, rhs, out);
    check_overflow(lhs, rhs);

    #[cfg(target_arch = "x86_64")]
    unsafe {
        x86::add_i32_sse2(lhs, rhs, out);
    }

    #[cfg(not(target_arch = "x86_64"))]
    portable::zip::<i32, 4>(lhs, rhs, out, i32::wrapping_add);
}

/// `out[i] = lhs[i] + rhs[i]` over `i64` lanes.
#[track_caller]
pub fn add_i64(lhs: &[i64], rhs: &[i64], out: &mut [i64]) {
    check_lengths(lhs, rhs, out);
    check_overflow(lhs, rhs);

    #[cfg(target_arch = "x86_64")]
    unsafe {
        x86::add_i64_sse2(lhs, rhs, out);
    }

    #[cfg(not(target_arch = "x86_64"))]
    portable::zip::<i64, 2>(lhs, rhs, out, i64::wrapping_add);
}

/// `out[i] = sqrt(src[i])` over `f32` lanes.
#[track_caller]
pub fn sqrt_f32(src: &[f32], out: &mut [f32]) {
    check_unary(src, out);

    #[cfg(target_arch = "x86_64")]
    unsafe {
        if lanes_f32() == 8 {
            x86::sqrt_f32_avx(src, out);
        } else {
            x86::sqrt_f32_sse(src, out);
        }
    }

    #[cfg(not(target_arch = "x86_64"))]
    portable::map::<f32, 4>(src, out, f32::sqrt);
}

/// `out[i] = sqrt(src[i])` over `f64` lanes.
#[track_caller]
pub fn sqrt_f64(src: &[f64], out: &mut [f64]) {
    check_unary(src, out);

    #[cfg(target_arch = "x86_64")]
    unsafe {
        if lanes_f64() == 4 {
            x86::sqrt_f64_avx(src, out);
        } else {
            x86::sqrt_f64_sse2(src, out);
        }
    }

    #[cfg(not(target_arch = "x86_64"))]
    portable::map::<f64, 2>(src, out, f64::sqrt);
}

/// `out[i] = 1 / sqrt(src[i])` over `f32` lanes.
#[track_caller]
pub fn rsqrt_f32(src: &[f32], out: &mut [f32]) {
    check_unary(src, out);

    #[cfg(target_arch = "x86_64")]
    unsafe {
        if lanes_f32() == 8 {
            x86::rsqrt_f32_avx(src, out);
        } else {
            x86::rsqrt_f32_sse(src, out);
        }
    }

    #[cfg(not(target_arch = "x86_64"))]
    portable::map::<f32, 4>(src, out, |x| x.sqrt().recip());
}

/// `out[i] = 1 / sqrt(src[i])` over `f64` lanes.
#[track_caller]
pub fn rsqrt_f64(src: &[f64], out: &mut [f64]) {
    check_unary(src, out);

    #[cfg(target_arch = "x86_64")]
    unsafe {
        if lanes_f64() == 4 {
            x86::rsqrt_f64_avx(src, out);
        } else {
            x86::rsqrt_f64_sse2(src, out);
        }
    }

    #[cfg(not(target_arch = "x86_64"))]
    portable::map::<f64, 2>(src, out, |x| x.sqrt().recip());
}

// ============================================================================
// x86_64 Intrinsics
// ============================================================================

#[cfg(target_arch = "x86_64")]
mod x86 {
    use super::*;

    // The public wrappers check slice lengths. The `avx` kernels also
    // require the feature to have been detected.

    #[target_feature(enable = "sse")]
    pub unsafe fn add_f32_sse(lhs: &[f32], rhs: &[f32], out: &mut [f32]) {
        let strip = StripMine::new(out.len(), 4);
        for i in strip.chunks() {
            let a = _mm_loadu_ps(lhs.as_ptr().add(i));
            let b = _mm_loadu_ps(rhs.as_ptr().add(i));
            _mm_storeu_ps(out.as_mut_ptr().add(i), _mm_add_ps(a, b));
        }
        for i in strip.remainder() {
            out[i] = lhs[i] + rhs[i];
        }
    }

    #[target_feature(enable = "avx")]
    pub unsafe fn add_f32_avx(lhs: &[f32], rhs: &[f32], out: &mut [f32]) {
        let strip = StripMine::new(out.len(), 8);
        for i in strip.chunks() {
            let a = _mm256_loadu_ps(lhs.as_ptr().add(i));
            let b = _mm256_loadu_ps(rhs.as_ptr().add(i));
            _mm256_storeu_ps(out.as_mut_ptr().add(i), _mm256_add_ps(a, b));
        }
        for i in strip.remainder() {
            out[i] = lhs[i] + rhs[i];
        }
    }

    #[target_feature(enable = "sse2")]
    pub unsafe fn add_f64_sse2(lhs: &[f64], rhs: &[f64], out: &mut [f64]) {
        let strip = StripMine::new(out.len(), 2);
        for i in strip.chunks() {
            let a = _mm_loadu_pd(lhs.as_ptr().add(i));
            let b = _mm_loadu_pd(rhs.as_ptr().add(i));
            _mm_storeu_pd(out.as_mut_ptr().add(i), _mm_add_pd(a, b));
        }
        for i in strip.remainder() {
            out[i] = lhs[i] + rhs[i];
        }
    }

    #[target_feature(enable = "avx")]
    pub unsafe fn add_f64_avx(lhs: &[f64], rhs: &[f64], out: &mut [f64]) {
        let strip = StripMine::new(out.len(), 4);
        for i in strip.chunks() {
            let a = _mm256_loadu_pd(lhs.as_ptr().add(i));
            let b = _mm256_loadu_pd(rhs.as_ptr().add(i));
            _mm256_storeu_pd(out.as_mut_ptr().add(i), _mm256_add_pd(a, b));
        }
        for i in strip.remainder() {
            out[i] = lhs[i] + rhs[i];
        }
    }

    #[target_feature(enable = "sse2")]
    pub unsafe fn add_i32_sse2(lhs: &[i32], rhs: &[i32], out: &mut [i32]) {
        let strip = StripMine::new(out.len(), 4);
        for i in strip.chunks() {
            let a = _mm_loadu_si128(lhs.as_ptr().add(i).cast());
            let b = _mm_loadu_si128(rhs.as_ptr().add(i).cast());
            _mm_storeu_si128(out.as_mut_ptr().add(i).cast(), _mm_add_epi32(a, b));
        }
        for i in strip.remainder() {
            out[i] = lhs[i].wrapping_add(rhs[i]);
        }
    }

    #[target_feature(enable = "sse2")]
    pub unsafe fn add_i64_sse2(lhs: &[i64], rhs: &[i64], out: &mut [i64]) {
        let strip = StripMine::new(out.len(), 2);
        for i in strip.chunks() {
            let a = _mm_loadu_si128(lhs.as_ptr().add(i).cast());
            let b = _mm_loadu_si128(rhs.as_ptr().add(i).cast());
            _mm_storeu_si128(out.as_mut_ptr().add(i).cast(), _mm_add_epi64(a, b));
        }
        for i in strip.remainder() {
            out[i] = lhs[i].wrapping_add(rhs[i]);
        }
    }

    #[target_feature(enable = "sse")]
    pub unsafe fn sqrt_f32_sse(src: &[f32], out: &mut [f32]) {
        let strip = StripMine::new(out.len(), 4);
        for i in strip.chunks() {
            let x = _mm_loadu_ps(src.as_ptr().add(i));
            _mm_storeu_ps(out.as_mut_ptr().add(i), _mm_sqrt_ps(x));
        }
        for i in strip.remainder() {
            out[i] = src[i].sqrt();
        }
    }

    #[target_feature(enable = "avx")]
    pub unsafe fn sqrt_f32_avx(src: &[f32], out: &mut [f32]) {
        let strip = StripMine::new(out.len(), 8);
        for i in strip.chunks() {
            let x = _mm256_loadu_ps(src.as_ptr().add(i));
            _mm256_storeu_ps(out.as_mut_ptr().add(i), _mm256_sqrt_ps(x));
        }
        for i in strip.remainder() {
            out[i] = src[i].sqrt();
        }
    }

    #[target_feature(enable = "sse2")]
    pub unsafe fn sqrt_f64_sse2(src: &[f64], out: &mut [f64]) {
        let strip = StripMine::new(out.len(), 2);
        for i in strip.chunks() {
            let x = _mm_loadu_pd(src.as_ptr().add(i));
            _mm_storeu_pd(out.as_mut_ptr().add(i), _mm_sqrt_pd(x));
        }
        for i in strip.remainder() {
            out[i] = src[i].sqrt();
        }
    }

    #[target_feature(enable = "avx")]
    pub unsafe fn sqrt_f64_avx(src: &[f64], out: &mut [f64]) {
        let strip = StripMine::new(out.len(), 4);
        for i in strip.chunks() {
            let x = _mm256_loadu_pd(src.as_ptr().add(i));
            _mm256_storeu_pd(out.as_mut_ptr().add(i), _mm256_sqrt_pd(x));
        }
        for i in strip.remainder() {
            out[i] = src[i].sqrt();
        }
    }

    #[target_feature(enable = "sse")]
    pub unsafe fn rsqrt_f32_sse(src: &[f32], out: &mut [f32]) {
        let strip = StripMine::new(out.len(), 4);
        let one = _mm_set1_ps(1.0);
        for i in strip.chunks() {
            let x = _mm_loadu_ps(src.as_ptr().add(i));
            _mm_storeu_ps(out.as_mut_ptr().add(i), _mm_div_ps(one, _mm_sqrt_ps(x)));
        }
        for i in strip.remainder() {
            out[i] = src[i].sqrt().recip();
        }
    }

    #[target_feature(enable = "avx")]
    pub unsafe fn rsqrt_f32_avx(src: &[f32], out: &mut [f32]) {
        let strip = StripMine::new(out.len(), 8);
        let one = _mm256_set1_ps(1.0);
        for i in strip.chunks() {
            let x = _mm256_loadu_ps(src.as_ptr().add(i));
            _mm256_storeu_ps(
                out.as_mut_ptr().add(i),
                _mm256_div_ps(one, _mm256_sqrt_ps(x)),
            );
        }
        for i in strip.remainder() {
            out[i] = src[i].sqrt().recip();
        }
    }

    #[target_feature(enable = "sse2")]
    pub unsafe fn rsqrt_f64_sse2(src: &[f64], out: &mut [f64]) {
        let strip = StripMine::new(out.len(), 2);
        let one = _mm_set1_pd(1.0);
        for i in strip.chunks() {
            let x = _mm_loadu_pd(src.as_ptr().add(i));
            _mm_storeu_pd(out.as_mut_ptr().add(i), _mm_div_pd(one, _mm_sqrt_pd(x)));
        }
        for i in strip.remainder() {
            out[i] = src[i].sqrt().recip();
        }
    }

    #[target_feature(enable = "avx")]
    pub unsafe fn rsqrt_f64_avx(src: &[f64], out: &mut [f64]) {
        let strip = StripMine::new(out.len(), 4);
        let one = _mm256_set1_pd(1.0);
        for i in strip.chunks() {
            let x = _mm256_loadu_pd(src.as_ptr().add(i));
            _mm256_storeu_pd(
                out.as_mut_ptr().add(i),
                _mm256_div_pd(one, _mm256_sqrt_pd(x)),
            );
        }
        for i in strip.remainder() {
            out[i] = src[i].sqrt().recip();
        }
    }
}

// ============================================================================
// Portable Lanes
// ============================================================================

#[cfg(not(target_arch = "x86_64"))]
mod portable {
    use super::StripMine;

    pub fn zip<T: Copy + Default, const L: usize>(
        lhs: &[T],
        rhs: &[T],
        out: &mut [T],
        f: impl Fn(T, T) -> T,
    ) {
        let strip = StripMine::new(out.len(), L);
        for i in strip.chunks() {
            let mut lane = [T::default(); L];
            for (j, slot) in lane.iter_mut().enumerate() {
                *slot = f(lhs[i + j], rhs[i + j]);
            }
            out[i..i + L].copy_from_slice(&lane);
        }
        for i in strip.remainder() {
            out[i] = f(lhs[i], rhs[i]);
        }
    }

    pub fn map<T: Copy + Default, const L: usize>(src: &[T], out: &mut [T], f: impl Fn(T) -> T) {
        let strip = StripMine::new(out.len(), L);
        for i in strip.chunks() {
            let mut lane = [T::default(); L];
            for (j, slot) in lane.iter_mut().enumerate() {
                *slot = f(src[i + j]);
            }
            out[i..i + L].copy_from_slice(&lane);
        }
        for i in strip.remainder() {
            out[i] = f(src[i]);
        }
    }
}
