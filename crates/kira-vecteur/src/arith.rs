//! Operator routing.
//!
//! `+ - * / %` and unary `-` are implemented once per operand form and
//! forwarded to the backend named in the vector's type:
//!
//! - [`Eager`] backends compute a new [`Vecteur`] immediately.
//! - [`Lazy`] vectors and [`LazyExpr`] trees build a new expression.
//!
//! Eager vectors of different element types combine into their
//! [`PromotedElem`](crate::PromotedElem). Expression trees hold one element
//! type; convert with [`Vecteur::cast`] before mixing.
//!
//! Scalars combine on either side and take the vector's element type, so an
//! unsuffixed literal never widens the result. Scalar impls are generated per
//! element type, since a blanket `impl Add<Vecteur<T, ..>> for T` is not
//! allowed.
//!
//! Size mismatches between runtime-length operands panic; use
//! [`Vecteur::try_binary`] or [`LazyExpr::try_binary`] to handle them.

use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

use crate::backend::{Eager, Lazy};
use crate::lazy::{IntoExpr, LazyExpr};
use crate::op::{BinaryOp, UnaryOp};
use crate::scalar::{Element, PromoteElem, PromotedElem};
use crate::shape::{Extent, Promote, Promoted};
use crate::vecteur::Vecteur;

// ============================================================================
// Vector and Vector
// ============================================================================

macro_rules! route_binary {
    ($($Trait:ident::$method:ident => $op:expr;)*) => {$(
        impl<'l, 'r, T, U, E, F, B> $Trait<&'r Vecteur<U, F, B>> for &'l Vecteur<T, E, B>
        where
            T: PromoteElem<U>,
            U: Element,
            E: Promote<F>,
            F: Extent,
            B: Eager,
        {
            type Output = Vecteur<PromotedElem<T, U>, Promoted<E, F>, B>;

            #[track_caller]
            fn $method(self, rhs: &'r Vecteur<U, F, B>) -> Self::Output {
                self.binary($op, rhs)
            }
        }

        impl<'r, T, U, E, F, B> $Trait<&'r Vecteur<U, F, B>> for Vecteur<T, E, B>
        where
            T: PromoteElem<U>,
            U: Element,
            E: Promote<F>,
            F: Extent,
            B: Eager,
        {
            type Output = Vecteur<PromotedElem<T, U>, Promoted<E, F>, B>;

            #[track_caller]
            fn $method(self, rhs: &'r Vecteur<U, F, B>) -> Self::Output {
                self.binary($op, rhs)
            }
        }

        impl<'l, T, U, E, F, B> $Trait<Vecteur<U, F, B>> for &'l Vecteur<T, E, B>
        where
            T: PromoteElem<U>,
            U: Element,
            E: Promote<F>,
            F: Extent,
            B: Eager,
        {
            type Output = Vecteur<PromotedElem<T, U>, Promoted<E, F>, B>;

            #[track_caller]
            fn $method(self, rhs: Vecteur<U, F, B>) -> Self::Output {
                self.binary($op, &rhs)
            }
        }

        impl<T, U, E, F, B> $Trait<Vecteur<U, F, B>> for Vecteur<T, E, B>
        where
            T: PromoteElem<U>,
            U: Element,
            E: Promote<F>,
            F: Extent,
            B: Eager,
        {
            type Output = Vecteur<PromotedElem<T, U>, Promoted<E, F>, B>;

            #[track_caller]
            fn $method(self, rhs: Vecteur<U, F, B>) -> Self::Output {
                self.binary($op, &rhs)
            }
        }

        impl<'a, T, E, R> $Trait<R> for LazyExpr<'a, T, E>
        where
            T: Element,
            E: Promote<R::Extent>,
            R: IntoExpr<'a, T>,
        {
            type Output = LazyExpr<'a, T, Promoted<E, R::Extent>>;

            #[track_caller]
            fn $method(self, rhs: R) -> Self::Output {
                self.binary($op, rhs)
            }
        }

        impl<'a, 'c, T, E, R> $Trait<R> for &'c LazyExpr<'a, T, E>
        where
            T: Element,
            E: Promote<R::Extent>,
            R: IntoExpr<'a, T>,
        {
            type Output = LazyExpr<'a, T, Promoted<E, R::Extent>>;

            #[track_caller]
            fn $method(self, rhs: R) -> Self::Output {
                self.clone().binary($op, rhs)
            }
        }

        impl<'a, T, E, R> $Trait<R> for &'a Vecteur<T, E, Lazy>
        where
            T: Element,
            E: Promote<R::Extent>,
            R: IntoExpr<'a, T>,
        {
            type Output = LazyExpr<'a, T, Promoted<E, R::Extent>>;

            #[track_caller]
            fn $method(self, rhs: R) -> Self::Output {
                LazyExpr::leaf(self).binary($op, rhs)
            }
        }
    )*};
}

route_binary! {
    Add::add => BinaryOp::Add;
    Sub::sub => BinaryOp::Sub;
    Mul::mul => BinaryOp::Mul;
    Div::div => BinaryOp::Div;
    Rem::rem => BinaryOp::Rem;
}

// ============================================================================
// Vector and Scalar
// ============================================================================

macro_rules! route_scalar {
    ($($scalar:ty),*) => {$(
        route_scalar!(@ops $scalar;
            Add::add => BinaryOp::Add;
            Sub::sub => BinaryOp::Sub;
            Mul::mul => BinaryOp::Mul;
            Div::div => BinaryOp::Div;
            Rem::rem => BinaryOp::Rem;
        );
    )*};

    (@ops $scalar:ty; $($Trait:ident::$method:ident => $op:expr;)*) => {$(
        impl<'l, E: Extent, B: Eager> $Trait<$scalar> for &'l Vecteur<$scalar, E, B> {
            type Output = Vecteur<$scalar, E, B>;

            fn $method(self, rhs: $scalar) -> Self::Output {
                self.binary_scalar($op, rhs)
            }
        }

        impl<E: Extent, B: Eager> $Trait<$scalar> for Vecteur<$scalar, E, B> {
            type Output = Vecteur<$scalar, E, B>;

            fn $method(self, rhs: $scalar) -> Self::Output {
                self.binary_scalar($op, rhs)
            }
        }

        impl<'r, E: Extent, B: Eager> $Trait<&'r Vecteur<$scalar, E, B>> for $scalar {
            type Output = Vecteur<$scalar, E, B>;

            fn $method(self, rhs: &'r Vecteur<$scalar, E, B>) -> Self::Output {
                Vecteur::<$scalar, E, B>::scalar_binary(self, $op, rhs)
            }
        }

        impl<E: Extent, B: Eager> $Trait<Vecteur<$scalar, E, B>> for $scalar {
            type Output = Vecteur<$scalar, E, B>;

            fn $method(self, rhs: Vecteur<$scalar, E, B>) -> Self::Output {
                Vecteur::<$scalar, E, B>::scalar_binary(self, $op, &rhs)
            }
        }

        impl<'a, E: Extent> $Trait<$scalar> for LazyExpr<'a, $scalar, E> {
            type Output = LazyExpr<'a, $scalar, E>;

            fn $method(self, rhs: $scalar) -> Self::Output {
                self.binary_scalar($op, rhs)
            }
        }

        impl<'a, 'c, E: Extent> $Trait<$scalar> for &'c LazyExpr<'a, $scalar, E> {
            type Output = LazyExpr<'a, $scalar, E>;

            fn $method(self, rhs: $scalar) -> Self::Output {
                self.clone().binary_scalar($op, rhs)
            }
        }

        impl<'a, E: Extent> $Trait<$scalar> for &'a Vecteur<$scalar, E, Lazy> {
            type Output = LazyExpr<'a, $scalar, E>;

            fn $method(self, rhs: $scalar) -> Self::Output {
                LazyExpr::leaf(self).binary_scalar($op, rhs)
            }
        }

        impl<E: Extent> $Trait<$scalar> for Vecteur<$scalar, E, Lazy> {
            type Output = LazyExpr<'static, $scalar, E>;

            fn $method(self, rhs: $scalar) -> Self::Output {
                LazyExpr::owned(self).binary_scalar($op, rhs)
            }
        }

        impl<'a, E: Extent> $Trait<LazyExpr<'a, $scalar, E>> for $scalar {
            type Output = LazyExpr<'a, $scalar, E>;

            fn $method(self, rhs: LazyExpr<'a, $scalar, E>) -> Self::Output {
                LazyExpr::scalar_binary(self, $op, rhs)
            }
        }

        impl<'a, 'c, E: Extent> $Trait<&'c LazyExpr<'a, $scalar, E>> for $scalar {
            type Output = LazyExpr<'a, $scalar, E>;

            fn $method(self, rhs: &'c LazyExpr<'a, $scalar, E>) -> Self::Output {
                LazyExpr::scalar_binary(self, $op, rhs.clone())
            }
        }

        impl<'a, E: Extent> $Trait<&'a Vecteur<$scalar, E, Lazy>> for $scalar {
            type Output = LazyExpr<'a, $scalar, E>;

            fn $method(self, rhs: &'a Vecteur<$scalar, E, Lazy>) -> Self::Output {
                LazyExpr::scalar_binary(self, $op, LazyExpr::leaf(rhs))
            }
        }

        impl<E: Extent> $Trait<Vecteur<$scalar, E, Lazy>> for $scalar {
            type Output = LazyExpr<'static, $scalar, E>;

            fn $method(self, rhs: Vecteur<$scalar, E, Lazy>) -> Self::Output {
                LazyExpr::scalar_binary(self, $op, LazyExpr::owned(rhs))
            }
        }
    )*};
}

route_scalar!(i32, i64, u32, u64, f32, f64);

// ============================================================================
// Negation
// ============================================================================

impl<'l, T, E, B> Neg for &'l Vecteur<T, E, B>
where
    T: Element + Neg<Output = T>,
    E: Extent,
    B: Eager,
{
    type Output = Vecteur<T, E, B>;

    fn neg(self) -> Self::Output {
        self.unary(UnaryOp::Neg, |x| -x)
    }
}

impl<T, E, B> Neg for Vecteur<T, E, B>
where
    T: Element + Neg<Output = T>,
    E: Extent,
    B: Eager,
{
    type Output = Vecteur<T, E, B>;

    fn neg(self) -> Self::Output {
        self.unary(UnaryOp::Neg, |x| -x)
    }
}

impl<'a, T, E> Neg for LazyExpr<'a, T, E>
where
    T: Element + Neg<Output = T>,
    E: Extent,
{
    type Output = LazyExpr<'a, T, E>;

    fn neg(self) -> Self::Output {
        self.unary(UnaryOp::Neg, |x| -x)
    }
}

impl<'a, 'c, T, E> Neg for &'c LazyExpr<'a, T, E>
where
    T: Element + Neg<Output = T>,
    E: Extent,
{
    type Output = LazyExpr<'a, T, E>;

    fn neg(self) -> Self::Output {
        self.clone().unary(UnaryOp::Neg, |x| -x)
    }
}

impl<'a, T, E> Neg for &'a Vecteur<T, E, Lazy>
where
    T: Element + Neg<Output = T>,
    E: Extent,
{
    type Output = LazyExpr<'a, T, E>;

    fn neg(self) -> Self::Output {
        LazyExpr::leaf(self).unary(UnaryOp::Neg, |x| -x)
    }
}

impl<T, E> Neg for Vecteur<T, E, Lazy>
where
    T: Element + Neg<Output = T>,
    E: Extent,
{
    type Output = LazyExpr<'static, T, E>;

    fn neg(self) -> Self::Output {
        LazyExpr::owned(self).unary(UnaryOp::Neg, |x| -x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Generic, Simd};
    use crate::expr::VecteurExpr;
    use crate::shape::{Const, Dyn};

    type V3f = Vecteur<f32, Const<3>>;
    type L3f = Vecteur<f32, Const<3>, Lazy>;
    type VXi = Vecteur<i32, Dyn>;

    #[test]
    fn test_eager_operators() {
        let a = V3f::new([1.0, 2.0, 3.0]);
        let b = V3f::new([4.0, 5.0, 6.0]);
        assert_eq!((&a + &b).to_array(), [5.0, 7.0, 9.0]);
        assert_eq!((&b - &a).to_array(), [3.0, 3.0, 3.0]);
        assert_eq!((&a * &b).to_array(), [4.0, 10.0, 18.0]);
        assert_eq!((&b / &a).to_array(), [4.0, 2.5, 2.0]);
        assert_eq!((&b % &a).to_array(), [0.0, 1.0, 0.0]);
        assert_eq!((a.clone() + b.clone()).to_array(), [5.0, 7.0, 9.0]);
        assert_eq!((-&a).to_array(), [-1.0, -2.0, -3.0]);
    }

    #[test]
    fn test_eager_scalar_operators() {
        let v = VXi::from([1, 2, 3]);
        assert_eq!((&v + 1).as_slice(), &[2, 3, 4]);
        assert_eq!((&v * 2).as_slice(), &[2, 4, 6]);
        assert_eq!((10 - &v).as_slice(), &[9, 8, 7]);
        assert_eq!((7 % v.clone()).as_slice(), &[0, 1, 1]);
        assert_eq!((v / 2).as_slice(), &[0, 1, 1]);
    }

    #[test]
    fn test_eager_promotion() {
        let fixed = Vecteur::<f64, Const<2>, Simd>::new([1.0, 2.0]);
        let dynamic = Vecteur::<f64, Dyn, Simd>::from([3.0, 4.0]);
        let sum: Vecteur<f64, Dyn, Simd> = &fixed + &dynamic;
        assert_eq!(sum.as_slice(), &[4.0, 6.0]);
    }

    #[test]
    fn test_eager_mixed_element_operators() {
        let ints = Vecteur::<i32, Const<3>>::new([1, 2, 3]);
        let floats = V3f::new([0.5, 0.25, 0.125]);
        let sum: V3f = &ints + &floats;
        assert_eq!(sum.to_array(), [1.5, 2.25, 3.125]);
        let product: V3f = &floats * ints.clone();
        assert_eq!(product.to_array(), [0.5, 0.5, 0.375]);

        let doubles = Vecteur::<f64, Dyn, Simd>::from([1.0, 1.0, 1.0, 1.0]);
        let singles = Vecteur::<f32, Const<4>, Simd>::new([0.5, 1.5, 2.5, 3.5]);
        let sum: Vecteur<f64, Dyn, Simd> = singles - doubles;
        assert_eq!(sum.as_slice(), &[-0.5, 0.5, 1.5, 2.5]);

        let lazy = ints.cast::<f32>().with_backend::<Lazy>();
        let floats = floats.with_backend::<Lazy>();
        assert_eq!((&lazy + &floats).eval().to_array(), [1.5, 2.25, 3.125]);
    }

    #[test]
    #[should_panic(expected = "size mismatch")]
    fn test_eager_operator_size_mismatch() {
        let _ = VXi::from([1, 2]) + VXi::from([1, 2, 3]);
    }

    #[test]
    fn test_lazy_operators() {
        let a = L3f::new([1.0, 2.0, 3.0]);
        let b = L3f::new([4.0, 5.0, 6.0]);

        let expr = &a + &b;
        assert_eq!(expr.height(), 2);
        assert_eq!(expr.eval().to_array(), [5.0, 7.0, 9.0]);

        let expr = (&a - &b) / &a;
        assert_eq!(expr.eval().to_array(), [-3.0, -1.5, -1.0]);

        let expr = &(&a * 2.0) + &b;
        assert!(expr.is_fused());
        assert_eq!(expr.eval().to_array(), [6.0, 9.0, 12.0]);
    }

    #[test]
    fn test_lazy_scalar_operators() {
        let a = L3f::new([1.0, 2.0, 4.0]);
        assert_eq!((&a + 1.0).eval().to_array(), [2.0, 3.0, 5.0]);
        assert_eq!((8.0 / &a).eval().to_array(), [8.0, 4.0, 2.0]);
        assert_eq!((1.0 - (&a * 2.0)).eval().to_array(), [-1.0, -3.0, -7.0]);
        assert_eq!((a.clone() * 0.5).eval().to_array(), [0.5, 1.0, 2.0]);
        assert_eq!((-&a).eval().to_array(), [-1.0, -2.0, -4.0]);
        assert_eq!((-(&a + &a)).eval().to_array(), [-2.0, -4.0, -8.0]);
    }

    #[test]
    fn test_lazy_owned_rhs() {
        let a = L3f::new([1.0, 2.0, 3.0]);
        let expr = &a + L3f::splat(1.0);
        assert_eq!(expr.eval().to_array(), [2.0, 3.0, 4.0]);
        let expr = 2.0 * L3f::splat(3.0);
        assert_eq!(expr.hsum(), 18.0);
    }

    #[test]
    fn test_generic_and_lazy_agree() {
        let g = Vecteur::<i64, Dyn, Generic>::from([3, -1, 4, 1, -5]);
        let l = g.clone().with_backend::<Lazy>();

        let eager = &(&g * &g) + &g;
        let lazy = (&l * &l + &l).eval();
        assert_eq!(eager, lazy);
    }
}
