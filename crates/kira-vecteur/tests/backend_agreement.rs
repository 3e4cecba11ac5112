//! Property tests for backend agreement
//!
//! Every element-wise operation must give the same answer on the generic,
//! lazy and SIMD backends: bit-for-bit on integers, and within `1e-4`
//! relative tolerance on floats.

use kira_vecteur::prelude::*;
use proptest::prelude::*;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-4 * 1.0f32.max(a.abs()).max(b.abs())
}

fn float_pair() -> impl Strategy<Value = (Vec<f32>, Vec<f32>)> {
    (0usize..48).prop_flat_map(|n| {
        (
            prop::collection::vec(-100.0f32..100.0, n),
            prop::collection::vec(0.5f32..100.0, n),
        )
    })
}

fn int_pair() -> impl Strategy<Value = (Vec<i32>, Vec<i32>)> {
    (0usize..48).prop_flat_map(|n| {
        (
            prop::collection::vec(-1000i32..1000, n),
            prop::collection::vec(1i32..100, n),
        )
    })
}

fn float_triple() -> impl Strategy<Value = (Vec<f32>, Vec<f32>, Vec<f32>)> {
    (1usize..32).prop_flat_map(|n| {
        (
            prop::collection::vec(0.01f32..100.0, n),
            prop::collection::vec(0.01f32..100.0, n),
            prop::collection::vec(0.01f32..100.0, n),
        )
    })
}

const OPS: [BinaryOp; 7] = [
    BinaryOp::Add,
    BinaryOp::Sub,
    BinaryOp::Mul,
    BinaryOp::Div,
    BinaryOp::Rem,
    BinaryOp::Max,
    BinaryOp::Min,
];

// ============================================================
// Element-wise binary operations
// ============================================================

proptest! {
    #[test]
    fn float_binary_ops_agree((a, b) in float_pair()) {
        let ga = VecXf::from(a.as_slice());
        let gb = VecXf::from(b.as_slice());
        let sa = ga.clone().with_backend::<Simd>();
        let sb = gb.clone().with_backend::<Simd>();
        let la = ga.clone().with_backend::<Lazy>();
        let lb = gb.clone().with_backend::<Lazy>();

        for op in OPS {
            let g = ga.binary(op, &gb);
            let s = sa.binary(op, &sb);
            let l = la.binary(op, &lb).eval();
            prop_assert_eq!(g.len(), a.len());
            for i in 0..a.len() {
                // (a op b)[i] == a[i] op b[i]
                prop_assert!(approx_eq(g[i], op.apply(a[i], b[i])), "{} at {}", op, i);
                prop_assert!(approx_eq(g[i], s[i]), "generic/simd {} at {}", op, i);
                prop_assert!(approx_eq(g[i], l[i]), "generic/lazy {} at {}", op, i);
            }
        }
    }

    #[test]
    fn int_binary_ops_agree_exactly((a, b) in int_pair()) {
        let ga = VecXi::from(a.as_slice());
        let gb = VecXi::from(b.as_slice());
        let sa = ga.clone().with_backend::<Simd>();
        let sb = gb.clone().with_backend::<Simd>();
        let la = ga.clone().with_backend::<Lazy>();
        let lb = gb.clone().with_backend::<Lazy>();

        for op in OPS {
            let g = ga.binary(op, &gb);
            prop_assert_eq!(&g, &sa.binary(op, &sb));
            prop_assert_eq!(&g, &la.binary(op, &lb).eval());
        }
    }

    #[test]
    fn fixed_length_ops_agree(a in prop::array::uniform4(-50.0f32..50.0), b in prop::array::uniform4(0.5f32..50.0)) {
        let ga = Vec4f::new(a);
        let gb = Vec4f::new(b);
        let sa = Vecteur::<f32, Const<4>, Simd>::new(a);
        let sb = Vecteur::<f32, Const<4>, Simd>::new(b);
        let la = Vecteur::<f32, Const<4>, Lazy>::new(a);
        let lb = Vecteur::<f32, Const<4>, Lazy>::new(b);

        let g = (&ga + &gb).to_array();
        let s = (&sa + &sb).to_array();
        let l = (&la + &lb).eval().to_array();
        for i in 0..4 {
            prop_assert_eq!(g[i], a[i] + b[i]);
            prop_assert_eq!(g[i], s[i]);
            prop_assert_eq!(g[i], l[i]);
        }
    }
}

// ============================================================
// Unary operations and reductions
// ============================================================

proptest! {
    #[test]
    fn sqrt_and_rsqrt_agree((_, b) in float_pair()) {
        let g = VecXf::from(b.as_slice());
        let s = g.clone().with_backend::<Simd>();
        let l = g.clone().with_backend::<Lazy>();

        prop_assert_eq!(g.sqrt(), s.sqrt());
        prop_assert_eq!(g.rsqrt(), s.rsqrt());
        let lazy_sqrt = l.sqrt().eval();
        let lazy_rsqrt = l.rsqrt().eval();
        for i in 0..b.len() {
            prop_assert!(approx_eq(g.sqrt()[i], lazy_sqrt[i]));
            prop_assert!(approx_eq(g.rsqrt()[i], lazy_rsqrt[i]));
        }
    }

    #[test]
    fn reductions_agree((a, b) in int_pair()) {
        let g = VecXi::from(a.as_slice());
        let l = VecXi::from(b.as_slice()).with_backend::<Lazy>();
        let expr = &l * 2;

        let doubled: Vec<i32> = b.iter().map(|x| x * 2).collect();
        prop_assert_eq!(expr.hsum(), doubled.iter().sum::<i32>());
        prop_assert_eq!(expr.to_vec(), doubled.clone());
        prop_assert_eq!(g.hsum(), a.iter().sum::<i32>());
        prop_assert_eq!(
            g.dot(&VecXi::from(doubled.as_slice())),
            a.iter().zip(&doubled).map(|(x, y)| x * y).sum::<i32>()
        );
        if !a.is_empty() {
            prop_assert_eq!(g.hmax(), *a.iter().max().unwrap());
            prop_assert_eq!(g.hmin(), *a.iter().min().unwrap());
        }
    }
}

// ============================================================
// Fused multiply-add
// ============================================================

proptest! {
    #[test]
    fn fused_multiply_add_matches_fma((a, b, c) in float_triple()) {
        let la = VecXf::from(a.as_slice()).with_backend::<Lazy>();
        let lb = VecXf::from(b.as_slice()).with_backend::<Lazy>();
        let lc = VecXf::from(c.as_slice()).with_backend::<Lazy>();

        let expr = &la * &lb + &lc;
        prop_assert!(expr.is_fused());
        let fused = expr.eval();

        for i in 0..a.len() {
            prop_assert_eq!(fused[i], a[i].mul_add(b[i], c[i]));
            let unfused = a[i] * b[i] + c[i];
            let bound = f32::EPSILON * fused[i].abs().max(unfused.abs());
            prop_assert!((fused[i] - unfused).abs() <= bound);
        }
    }
}

// ============================================================
// Integer overflow
// ============================================================

#[test]
fn integer_add_overflow_agrees() {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    let mut lhs = [0i32; 8];
    let mut rhs = [0i32; 8];
    lhs[0] = i32::MAX;
    rhs[0] = 1;

    let g = Vecteur::<i32, Const<8>, Generic>::new(lhs);
    let s = g.clone().with_backend::<Simd>();
    let l = g.clone().with_backend::<Lazy>();
    let g_rhs = Vecteur::<i32, Const<8>, Generic>::new(rhs);
    let s_rhs = g_rhs.clone().with_backend::<Simd>();
    let l_rhs = g_rhs.clone().with_backend::<Lazy>();

    let generic = catch_unwind(AssertUnwindSafe(|| (&g + &g_rhs).to_array()));
    let simd = catch_unwind(AssertUnwindSafe(|| (&s + &s_rhs).to_array()));
    let lazy = catch_unwind(AssertUnwindSafe(|| (&l + &l_rhs).eval().to_array()));

    assert_eq!(generic.is_ok(), simd.is_ok());
    assert_eq!(generic.is_ok(), lazy.is_ok());
    if let (Ok(generic), Ok(simd), Ok(lazy)) = (generic, simd, lazy) {
        assert_eq!(generic, simd);
        assert_eq!(generic, lazy);
        assert_eq!(generic[0], i32::MIN);
    }
}
