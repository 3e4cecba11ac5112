//! Storage-backed vectors.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use num_traits::AsPrimitive;

use crate::backend::{Backend, Generic};
use crate::error::{raise, Result, VecteurError};
use crate::expr::VecteurExpr;
use crate::scalar::Element;
use crate::shape::{Const, Dyn, Extent, Fits};
use crate::storage::{Buffer, Heap, Inline};

/// A numeric vector.
///
/// - `T`: element type.
/// - `E`: length-kind, [`Const<N>`] or [`Dyn`].
/// - `B`: backend, [`Generic`], [`Lazy`](crate::Lazy) or
///   [`Simd`](crate::Simd).
///
/// The length-kind and backend are part of the type and never change for a
/// value.
///
/// # Examples
///
/// ```
/// use kira_vecteur::prelude::*;
///
/// let a = Vec3i::from([1, 2, 3]);
/// let b = Vec3i::from([3, 2, 1]);
/// assert_eq!(&a + &b, Vec3i::from([4, 4, 4]));
/// assert_eq!(a.dot(&b), 10);
/// ```
pub struct Vecteur<T: Element, E: Extent = Dyn, B: Backend = Generic> {
    storage: E::Buffer<T>,
    _backend: PhantomData<B>,
}

// ============================================================================
// Construction
// ============================================================================

impl<T: Element, E: Extent, B: Backend> Vecteur<T, E, B> {
    #[inline]
    pub(crate) fn from_storage(storage: E::Buffer<T>) -> Self {
        Vecteur {
            storage,
            _backend: PhantomData,
        }
    }

    /// A vector of `len` zeros. `len` must match a fixed length.
    #[inline]
    pub(crate) fn zeroed(len: usize) -> Self {
        Self::from_storage(<E::Buffer<T> as Buffer<T>>::filled(len, T::zero()))
    }

    /// Copy a slice into a new vector.
    ///
    /// A fixed-length target requires `src.len()` to equal its length; a
    /// runtime-length target adopts the slice length.
    pub fn try_from_slice(src: &[T]) -> Result<Self> {
        if let Some(expected) = E::FIXED {
            if src.len() != expected {
                return Err(VecteurError::LengthMismatch {
                    expected,
                    got: src.len(),
                });
            }
        }
        Ok(Self::from_storage(<E::Buffer<T> as Buffer<T>>::from_slice(src)))
    }

    /// Materialize any vector or expression with a compatible length-kind.
    ///
    /// This is also how a vector moves between backends.
    pub fn from_expr<S>(src: &S) -> Self
    where
        S: VecteurExpr<Elem = T> + ?Sized,
        S::Extent: Fits<E>,
    {
        let mut out = Self::zeroed(src.size());
        out.fill_from(src);
        out
    }

    /// Materialize a vector or expression of another element type,
    /// converting each element with `as` semantics.
    pub fn cast_from<S>(src: &S) -> Self
    where
        S: VecteurExpr + ?Sized,
        S::Elem: AsPrimitive<T>,
        S::Extent: Fits<E>,
    {
        let mut out = Self::zeroed(src.size());
        for (i, slot) in out.as_mut_slice().iter_mut().enumerate() {
            *slot = src.entry(i).as_();
        }
        out
    }

    /// Convert every element to `U` with `as` semantics.
    pub fn cast<U: Element>(&self) -> Vecteur<U, E, B>
    where
        T: AsPrimitive<U>,
    {
        let mut out = Vecteur::<U, E, B>::zeroed(self.len());
        for (slot, &x) in out.as_mut_slice().iter_mut().zip(self.as_slice()) {
            *slot = x.as_();
        }
        out
    }

    /// A copy of this vector.
    ///
    /// Storage-backed vectors are already evaluated; this exists so that
    /// vectors and [`LazyExpr`](crate::LazyExpr) trees can be materialized
    /// with the same call.
    pub fn eval(&self) -> Self {
        self.clone()
    }

    /// Reinterpret under another backend without copying.
    #[inline]
    pub fn with_backend<C: Backend>(self) -> Vecteur<T, E, C> {
        Vecteur::from_storage(self.storage)
    }

    // ========================================================================
    // Assignment
    // ========================================================================

    /// Overwrite with the entries of `src`.
    ///
    /// A runtime-length vector reallocates only when the size changes, so a
    /// same-size assignment keeps [`as_ptr`](Self::as_ptr) stable.
    pub fn assign<S>(&mut self, src: &S)
    where
        S: VecteurExpr<Elem = T> + ?Sized,
        S::Extent: Fits<E>,
    {
        self.storage.resize(src.size());
        self.fill_from(src);
    }

    /// Overwrite with the entries of `src`, converting each element with `as`
    /// semantics.
    pub fn assign_cast<S>(&mut self, src: &S)
    where
        S: VecteurExpr + ?Sized,
        S::Elem: AsPrimitive<T>,
        S::Extent: Fits<E>,
    {
        self.storage.resize(src.size());
        for (i, slot) in self.as_mut_slice().iter_mut().enumerate() {
            *slot = src.entry(i).as_();
        }
    }

    fn fill_from<S>(&mut self, src: &S)
    where
        S: VecteurExpr<Elem = T> + ?Sized,
    {
        let out = self.storage.as_mut_slice();
        match src.contiguous() {
            Some(slice) => out.copy_from_slice(slice),
            None => {
                for (i, slot) in out.iter_mut().enumerate() {
                    *slot = src.entry(i);
                }
            }
        }
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether the vector has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// The elements as a borrowed span.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.storage.as_slice()
    }

    /// The elements as a mutable span.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.storage.as_mut_slice()
    }

    /// Address of the first element.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.as_slice().as_ptr()
    }

    /// Iterate over the elements.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Iterate mutably over the elements.
    #[inline]
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// The element at `index`, if any.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// The element at `index`, mutably, if any.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: T) {
        self.as_mut_slice().fill(value);
    }

    fn named_mut<const I: usize>(&mut self) -> &mut T {
        const {
            assert!(
                match E::FIXED {
                    Some(n) => n > I,
                    None => true,
                },
                "vector is too short for this accessor"
            )
        };
        &mut self[I]
    }

    /// First element, mutably.
    pub fn x_mut(&mut self) -> &mut T {
        self.named_mut::<0>()
    }

    /// Second element, mutably.
    pub fn y_mut(&mut self) -> &mut T {
        self.named_mut::<1>()
    }

    /// Third element, mutably.
    pub fn z_mut(&mut self) -> &mut T {
        self.named_mut::<2>()
    }

    /// Fourth element, mutably.
    pub fn w_mut(&mut self) -> &mut T {
        self.named_mut::<3>()
    }
}

impl<T: Element, const N: usize, B: Backend> Vecteur<T, Const<N>, B> {
    /// A vector holding `data`.
    #[inline]
    pub const fn new(data: [T; N]) -> Self {
        Vecteur {
            storage: Inline::new(data),
            _backend: PhantomData,
        }
    }

    /// `N` copies of `value`.
    #[inline]
    pub fn splat(value: T) -> Self {
        Self::new([value; N])
    }

    /// `N` zeros.
    #[inline]
    pub fn zeros() -> Self {
        Self::splat(T::zero())
    }

    /// An owned copy of the elements.
    #[inline]
    pub fn to_array(&self) -> [T; N] {
        self.storage.into_array()
    }

    /// Copy into a runtime-length vector.
    pub fn to_dyn(&self) -> Vecteur<T, Dyn, B> {
        Vecteur::from_storage(Heap::from_slice(self.as_slice()))
    }
}

impl<T: Element, B: Backend> Vecteur<T, Dyn, B> {
    /// An empty vector. Does not allocate.
    #[inline]
    pub const fn new() -> Self {
        Vecteur {
            storage: Heap::new(),
            _backend: PhantomData,
        }
    }

    /// `len` zeros.
    pub fn with_len(len: usize) -> Self {
        Self::zeroed(len)
    }

    /// `len` copies of `value`.
    pub fn filled(len: usize, value: T) -> Self {
        Self::from_storage(Heap::filled(len, value))
    }

    /// Move the buffer out, leaving `self` empty.
    ///
    /// The returned vector keeps the original buffer address.
    #[inline]
    pub fn take(&mut self) -> Self {
        Self::from_storage(self.storage.take())
    }

    /// An owned copy of the elements.
    pub fn to_array(&self) -> Vec<T> {
        self.as_slice().to_vec()
    }
}

impl<T: Element, E: Extent, B: Backend> Default for Vecteur<T, E, B> {
    fn default() -> Self {
        Self::zeroed(E::FIXED.unwrap_or(0))
    }
}

impl<T: Element, E: Extent, B: Backend> Clone for Vecteur<T, E, B> {
    fn clone(&self) -> Self {
        Self::from_storage(self.storage.clone())
    }

    fn clone_from(&mut self, source: &Self) {
        self.storage.clone_from(&source.storage);
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl<T: Element, const N: usize, B: Backend> From<[T; N]> for Vecteur<T, Const<N>, B> {
    fn from(data: [T; N]) -> Self {
        Self::new(data)
    }
}

impl<T: Element, const N: usize, B: Backend> From<[T; N]> for Vecteur<T, Dyn, B> {
    fn from(data: [T; N]) -> Self {
        Self::from_storage(Heap::from_slice(&data))
    }
}

impl<T: Element, B: Backend> From<&[T]> for Vecteur<T, Dyn, B> {
    fn from(data: &[T]) -> Self {
        Self::from_storage(Heap::from_slice(data))
    }
}

impl<T: Element, B: Backend> From<Vec<T>> for Vecteur<T, Dyn, B> {
    fn from(data: Vec<T>) -> Self {
        Self::from(data.as_slice())
    }
}

impl<T: Element, const N: usize, B: Backend> From<Vecteur<T, Const<N>, B>> for Vecteur<T, Dyn, B> {
    fn from(fixed: Vecteur<T, Const<N>, B>) -> Self {
        fixed.to_dyn()
    }
}

impl<T: Element, B: Backend> FromIterator<T> for Vecteur<T, Dyn, B> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let data: Vec<T> = iter.into_iter().collect();
        Self::from(data)
    }
}

impl<T: Element, E: Extent, B: Backend> AsRef<[T]> for Vecteur<T, E, B> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Element, E: Extent, B: Backend> AsMut<[T]> for Vecteur<T, E, B> {
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<'a, T: Element, E: Extent, B: Backend> IntoIterator for &'a Vecteur<T, E, B> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T: Element, E: Extent, B: Backend> IntoIterator for &'a mut Vecteur<T, E, B> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

// ============================================================================
// Indexing
// ============================================================================

impl<T: Element, E: Extent, B: Backend> Index<usize> for Vecteur<T, E, B> {
    type Output = T;

    #[inline]
    #[track_caller]
    fn index(&self, index: usize) -> &T {
        let size = self.len();
        match self.as_slice().get(index) {
            Some(value) => value,
            None => raise(VecteurError::IndexOutOfBounds { index, size }),
        }
    }
}

impl<T: Element, E: Extent, B: Backend> IndexMut<usize> for Vecteur<T, E, B> {
    #[inline]
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut T {
        let size = self.len();
        match self.as_mut_slice().get_mut(index) {
            Some(value) => value,
            None => raise(VecteurError::IndexOutOfBounds { index, size }),
        }
    }
}

// ============================================================================
// Capability Surface
// ============================================================================

impl<T: Element, E: Extent, B: Backend> VecteurExpr for Vecteur<T, E, B> {
    type Elem = T;
    type Extent = E;

    #[inline]
    fn size(&self) -> usize {
        self.len()
    }

    #[inline]
    fn entry(&self, index: usize) -> T {
        self[index]
    }

    #[inline]
    fn contiguous(&self) -> Option<&[T]> {
        Some(self.as_slice())
    }
}

/// Equal when the sizes agree and every element compares equal.
impl<T, E, F, B, C> PartialEq<Vecteur<T, F, C>> for Vecteur<T, E, B>
where
    T: Element,
    E: Extent,
    F: Extent,
    B: Backend,
    C: Backend,
{
    fn eq(&self, other: &Vecteur<T, F, C>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Element, E: Extent, B: Backend> fmt::Display for Vecteur<T, E, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, value) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "}}")
    }
}

impl<T: Element, E: Extent, B: Backend> fmt::Debug for Vecteur<T, E, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vecteur")
            .field("backend", &B::KIND)
            .field("length", &E::length())
            .field("data", &self.as_slice())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Lazy, Simd};
    use crate::shape::Length;

    type V3 = Vecteur<i32, Const<3>>;
    type VX = Vecteur<f32, Dyn>;

    #[test]
    fn test_vecteur_fixed_construction() {
        let v = V3::new([1, 2, 3]);
        assert_eq!(v.len(), 3);
        assert_eq!(v.to_array(), [1, 2, 3]);
        assert_eq!(V3::splat(7).as_slice(), &[7, 7, 7]);
        assert_eq!(V3::zeros(), V3::default());
    }

    #[test]
    fn test_vecteur_dynamic_construction() {
        assert!(VX::new().is_empty());
        assert_eq!(VX::with_len(10).as_slice(), &[0.0; 10]);
        assert_eq!(VX::filled(10, 11.0).as_slice(), &[11.0; 10]);
        assert_eq!(VX::from([1.0, 2.0]).len(), 2);
        assert_eq!(VX::from(vec![1.0, 2.0, 3.0]).len(), 3);
        assert_eq!((0..4).map(|i| i as f32).collect::<VX>().to_array(), vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_vecteur_try_from_slice() {
        assert_eq!(V3::try_from_slice(&[1, 2, 3]), Ok(V3::new([1, 2, 3])));
        assert_eq!(
            V3::try_from_slice(&[1, 2]),
            Err(VecteurError::LengthMismatch {
                expected: 3,
                got: 2
            })
        );
        assert_eq!(VX::try_from_slice(&[1.0; 5]).map(|v| v.len()), Ok(5));
    }

    #[test]
    fn test_vecteur_fixed_into_dynamic() {
        let fixed = Vecteur::<f32, Const<3>>::new([1.0, 2.0, 3.0]);
        let dynamic: VX = fixed.clone().into();
        assert_eq!(dynamic.as_slice(), fixed.as_slice());
        assert_eq!(VX::from_expr(&fixed), dynamic);
    }

    #[test]
    fn test_vecteur_index_and_named() {
        let mut v = Vecteur::<i32, Const<4>>::new([1, 2, 3, 4]);
        assert_eq!((v.x(), v.y(), v.z(), v.w()), (1, 2, 3, 4));
        *v.x_mut() = 10;
        *v.w_mut() += 1;
        v[1] = 20;
        assert_eq!(v.to_array(), [10, 20, 3, 5]);
        assert_eq!(v.get(4), None);
    }

    #[test]
    #[should_panic(expected = "index 3 out of bounds for vector of size 3")]
    fn test_vecteur_index_out_of_bounds() {
        let v = V3::new([1, 2, 3]);
        let _ = v[3];
    }

    #[test]
    fn test_vecteur_same_size_assign_keeps_buffer() {
        let mut dst = VX::from([1.0, 2.0, 3.0]);
        let src = VX::from([4.0, 5.0, 6.0]);
        let before = dst.as_ptr();

        dst.assign(&src);
        assert_eq!(dst.as_ptr(), before);
        assert_eq!(dst, src);

        dst.clone_from(&src);
        assert_eq!(dst.as_ptr(), before);
    }

    #[test]
    fn test_vecteur_resize_assign_moves_buffer() {
        let mut dst = VX::from([1.0, 2.0, 3.0]);
        let before = dst.as_ptr();

        dst.assign(&VX::from([1.0; 8]));
        assert_ne!(dst.as_ptr(), before);
        assert_eq!(dst.len(), 8);

        dst.assign(&Vecteur::<f32, Const<2>>::new([7.0, 8.0]));
        assert_eq!(dst.as_slice(), &[7.0, 8.0]);
    }

    #[test]
    fn test_vecteur_take_round_trip_keeps_buffer() {
        // Moving a binding into itself is rejected by the borrow checker, so
        // only `take` and `mem::take` round trips are observable here.
        let mut src = VX::from([1.0, 2.0, 3.0]);
        let before = src.as_ptr();

        let moved = src.take();
        assert_eq!(moved.as_ptr(), before);
        assert!(src.is_empty());

        let mut v = moved;
        v = std::mem::take(&mut v);
        assert_eq!(v.as_ptr(), before);
        assert_eq!(v.as_slice(), &[1.0, 2.0, 3.0]);

        v.assign(&v.clone());
        assert_eq!(v.as_ptr(), before);
        assert_eq!(v.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_vecteur_cast() {
        let ints = Vecteur::<i32, Const<3>>::new([1, -2, 3]);
        let floats: Vecteur<f64, Const<3>> = ints.cast();
        assert_eq!(floats.to_array(), [1.0, -2.0, 3.0]);

        let mut dynamic = VX::new();
        dynamic.assign_cast(&ints);
        assert_eq!(dynamic.as_slice(), &[1.0, -2.0, 3.0]);

        let truncated = Vecteur::<i32, Dyn>::cast_from(&VX::from([1.7, -2.2]));
        assert_eq!(truncated.as_slice(), &[1, -2]);
    }

    #[test]
    fn test_vecteur_cast_any_extent() {
        fn widen<E: Extent, B: Backend>(v: &Vecteur<i32, E, B>) -> Vecteur<f64, E, B> {
            v.cast()
        }

        assert_eq!(widen(&Vecteur::<i32, Const<2>>::new([4, -5])).to_array(), [4.0, -5.0]);
        let lazy = Vecteur::<i32, Dyn, Lazy>::from([7, 8, 9]);
        assert_eq!(widen(&lazy).as_slice(), &[7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_vecteur_backend_switch() {
        let v = Vecteur::<f32, Dyn, Generic>::from([1.0, 2.0]);
        let before = v.as_ptr();
        let simd: Vecteur<f32, Dyn, Simd> = v.with_backend();
        assert_eq!(simd.as_ptr(), before);
        let lazy = Vecteur::<f32, Dyn, Lazy>::from_expr(&simd);
        assert_eq!(lazy, simd);
    }

    #[test]
    fn test_vecteur_equality_across_extents() {
        let fixed = Vecteur::<f32, Const<3>>::new([1.0, 2.0, 3.0]);
        let dynamic = VX::from([1.0, 2.0, 3.0]);
        assert_eq!(fixed, dynamic);
        assert_ne!(dynamic, VX::from([1.0, 2.0]));
    }

    #[test]
    fn test_vecteur_formatting() {
        let v = V3::new([1, 2, 3]);
        assert_eq!(v.to_string(), "{1, 2, 3}");
        assert_eq!(VX::new().to_string(), "{}");
        assert!(format!("{v:?}").contains("Generic"));
        assert_eq!(<Const<3> as Extent>::length(), Length::Fixed(3));
    }
}
