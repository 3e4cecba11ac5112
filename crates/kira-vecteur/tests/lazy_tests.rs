//! Lazy expression tests
//!
//! Tree construction, collapse, rewriting and evaluation of lazy
//! expressions, checked against the eager backends.

use kira_vecteur::config::{self, LazyOptions};
use kira_vecteur::lazy::Node;
use kira_vecteur::prelude::*;
use kira_vecteur::VecteurError;

type LX = Vecteur<f32, Dyn, Lazy>;
type L3 = Vecteur<f32, Const<3>, Lazy>;

/// Conductor Fresnel reflectance, written once for every backend.
macro_rules! fresnel_conductor {
    ($cos_theta_i:expr, $eta_i:expr, $eta_t:expr, $k:expr) => {{
        let cos_theta_i = $cos_theta_i;
        let eta = ($eta_t / $eta_i).eval();
        let etak = ($k / $eta_i).eval();

        let c2 = cos_theta_i * cos_theta_i;
        let si = 1.0 - c2;
        let eta2 = (&eta * &eta).eval();
        let etak2 = &etak * &etak;
        let t0 = &eta2 - &etak2 - si;
        let apb = (&t0 * &t0 + &eta2 * &etak2 * 4.0).sqrt();
        let t1 = &apb + c2;
        let a = ((&apb + &t0) * 0.5).sqrt();
        let t2 = &a * cos_theta_i * 2.0;
        let rs = (&t1 - &t2) / (&t1 + &t2);
        let t3 = si * si + &apb * c2;
        let t4 = &t2 * si;
        let rp = &rs * (&t3 - &t4) / (&t3 + &t4);
        let reflectance = ((rp + &rs) * 0.5).eval();
        reflectance
    }};
}

fn assert_close(expected: &[f32], actual: &[f32]) {
    assert_eq!(expected.len(), actual.len());
    for (i, (e, a)) in expected.iter().zip(actual).enumerate() {
        let tolerance = 1e-4 * 1.0f32.max(e.abs());
        assert!(
            (e - a).abs() <= tolerance,
            "mismatch at {}: expected {}, got {}",
            i,
            e,
            a
        );
    }
}

// ============================================================
// Fresnel reflectance
// ============================================================

mod fresnel {
    use super::*;

    #[test]
    fn test_fresnel_fixed_generic_and_lazy() {
        let eta_i = Vec3f::new([1.0, 1.1, 1.2]);
        let eta_t = Vec3f::new([1.5, 1.6, 1.7]);
        let k = Vec3f::new([0.3, 0.4, 0.5]);
        let generic = fresnel_conductor!(0.5f32, &eta_i, &eta_t, &k);

        let eta_i = L3::new([1.0, 1.1, 1.2]);
        let eta_t = L3::new([1.5, 1.6, 1.7]);
        let k = L3::new([0.3, 0.4, 0.5]);
        let lazy = fresnel_conductor!(0.5f32, &eta_i, &eta_t, &k);

        assert_close(generic.as_slice(), lazy.as_slice());
        assert!(generic.iter().all(|r| (0.0..=1.0).contains(r)));
    }

    #[test]
    fn test_fresnel_runtime_length() {
        let n = 67;
        let eta_i: Vec<f32> = (0..n).map(|i| 1.0 + (i % 7) as f32 * 0.1).collect();
        let eta_t: Vec<f32> = (0..n).map(|i| 1.3 + (i % 11) as f32 * 0.07).collect();
        let k: Vec<f32> = (0..n).map(|i| 0.1 + (i % 5) as f32 * 0.2).collect();

        let generic = fresnel_conductor!(
            0.5f32,
            &VecXf::from(eta_i.as_slice()),
            &VecXf::from(eta_t.as_slice()),
            &VecXf::from(k.as_slice())
        );
        let simd = fresnel_conductor!(
            0.5f32,
            &Vecteur::<f32, Dyn, Simd>::from(eta_i.as_slice()),
            &Vecteur::<f32, Dyn, Simd>::from(eta_t.as_slice()),
            &Vecteur::<f32, Dyn, Simd>::from(k.as_slice())
        );
        let lazy = fresnel_conductor!(
            0.5f32,
            &LX::from(eta_i.as_slice()),
            &LX::from(eta_t.as_slice()),
            &LX::from(k.as_slice())
        );
        let truth = fresnel_conductor!(
            0.5f64,
            &VecXf::from(eta_i.as_slice()).cast::<f64>(),
            &VecXf::from(eta_t.as_slice()).cast::<f64>(),
            &VecXf::from(k.as_slice()).cast::<f64>()
        )
        .cast::<f32>();

        assert_eq!(lazy.len(), n);
        assert_close(generic.as_slice(), simd.as_slice());
        assert_close(generic.as_slice(), lazy.as_slice());
        assert_close(truth.as_slice(), lazy.as_slice());
    }
}

// ============================================================
// Tree shape
// ============================================================

mod tree_shape {
    use super::*;

    #[test]
    fn test_heights_grow_then_collapse() {
        let v = LX::from([1.0, 2.0, 3.0]);
        let h2 = &v + &v;
        assert_eq!(h2.height(), 2);
        let h3 = &h2 - &v;
        assert_eq!(h3.height(), 3);
        let h4 = &h3 / &v;
        assert_eq!(h4.height(), 4);
        assert!(h4.leaves().is_empty());

        // The height-4 operand is evaluated into the arena.
        let next = &h4 * &v;
        assert_eq!(next.height(), 2);
        assert_eq!(next.leaves().len(), 1);
        assert_eq!(next.eval().as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_long_chain_stays_shallow() {
        let v = LX::from([0.5, 1.0, 1.5, 2.0]);
        let mut expr = v.lazy();
        for _ in 0..100 {
            expr = expr + &v;
            assert!(expr.height() <= LazyOptions::DEFAULT_COLLAPSE_HEIGHT);
        }
        assert_eq!(expr.eval().as_slice(), &[50.5, 101.0, 151.5, 202.0]);
    }

    #[test]
    fn test_owned_expression_outlives_operands() {
        fn assert_static<T: 'static>(_: &T) {}

        let owned = {
            let tmp = LX::from([1.0, 2.0]);
            let deep = ((&tmp + &tmp) * &tmp - &tmp) / &tmp;
            deep.eval().into_expr() * 2.0
        };
        assert_static(&owned);
        assert_eq!(owned.eval().as_slice(), &[2.0, 6.0]);
    }

    #[test]
    fn test_fused_node_shape() {
        let a = L3::new([1.0, 2.0, 3.0]);
        let b = L3::new([4.0, 5.0, 6.0]);
        let c = L3::new([7.0, 8.0, 9.0]);

        let expr = &a * &b + &c;
        match expr.root() {
            Node::FusedMulAdd { a, b, c } => {
                assert!(a.is_leaf() && b.is_leaf() && c.is_leaf());
            }
            other => panic!("expected fused node, got {:?}", other),
        }
        assert_eq!(expr.size(), 3);
        assert_eq!(expr.eval().to_array(), [11.0, 18.0, 27.0]);

        // Only a product in the left operand is fused.
        let expr = &c + &a * &b;
        assert!(!expr.is_fused());
        assert_eq!(expr.eval().to_array(), [11.0, 18.0, 27.0]);
    }

    #[test]
    fn test_fusion_can_be_disabled() {
        let a = LX::from([1.5, 2.5]);
        let opts = LazyOptions::default().with_fuse_multiply_add(false);
        let expr = config::with_options(opts, || &a * &a + &a);
        assert!(!expr.is_fused());
        assert_eq!(expr.height(), 3);
        assert_eq!(expr.eval().as_slice(), &[3.75, 8.75]);
    }
}

// ============================================================
// Errors and mixed length-kinds
// ============================================================

mod errors {
    use super::*;

    #[test]
    fn test_runtime_size_mismatch() {
        let a = LX::from([1.0, 2.0, 3.0]);
        let b = LX::from([1.0, 2.0]);
        let err = a.try_binary(BinaryOp::Add, &b).err();
        assert_eq!(err, Some(VecteurError::SizeMismatch { lhs: 3, rhs: 2 }));
    }

    #[test]
    #[should_panic(expected = "size mismatch: lhs has 2 elements, rhs has 3")]
    fn test_operator_size_mismatch_panics() {
        let a = LX::from([1.0, 2.0]);
        let b = LX::from([1.0, 2.0, 3.0]);
        let _ = &a - &b;
    }

    #[test]
    fn test_fixed_and_runtime_promote() {
        let fixed = L3::new([1.0, 2.0, 3.0]);
        let dynamic = LX::from([3.0, 2.0, 1.0]);
        let expr: LazyExpr<'_, f32, Dyn> = &fixed + &dynamic;
        assert_eq!(expr.eval().as_slice(), &[4.0, 4.0, 4.0]);

        let mismatched = LX::from([1.0]);
        assert!(fixed.try_binary(BinaryOp::Mul, &mismatched).is_err());
    }

    #[test]
    fn test_eval_into_existing_vector() {
        let a = LX::from([1.0, 4.0, 9.0]);
        let mut out = VecXf::new();
        a.sqrt().eval_into(&mut out);
        assert_eq!(out.as_slice(), &[1.0, 2.0, 3.0]);

        let before = out.as_ptr();
        (&a * 2.0).eval_into(&mut out);
        assert_eq!(out.as_ptr(), before);
        assert_eq!(out.as_slice(), &[2.0, 8.0, 18.0]);
    }
}
