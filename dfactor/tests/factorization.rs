//! End-to-end factorization scenarios.

use dfactor::algebra::coeff::Coeff;
use dfactor::algebra::numberfield::{FieldRegistry, NfElem};
use dfactor::algebra::poly::Poly;
use dfactor::algebra::ratfunc::RatFunc;
use dfactor::algebra::rational::{rat_i64, Rat};
use dfactor::dop::{Dop, RatDop};
use dfactor::driver::{factor_rational, right_factor, FactorConfig, lift_rational_dop};
use dfactor::monodromy::SymbolicOnlyEngine;
use dfactor::shortcut::{try_rational, try_van_hoeij};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

type K = NfElem;

fn p(cs: &[i64]) -> Poly<K> {
    Poly::new(cs.iter().map(|&c| NfElem::rational(rat_i64(c))).collect())
}

fn pq(cs: &[i64]) -> Poly<Rat> {
    Poly::new(cs.iter().map(|&c| rat_i64(c)).collect())
}

fn product(factors: &[RatDop<K>]) -> RatDop<K> {
    let mut acc = RatDop::from_dop(&Dop::from_poly(Poly::one()));
    for f in factors {
        acc = acc.mul(f);
    }
    acc
}

fn check_factorization(l: &Dop<Rat>, factors: &[RatDop<K>]) {
    let lifted = lift_rational_dop(l);
    assert_eq!(product(factors), RatDop::from_dop(&lifted), "product mismatch");
    let total: usize = factors.iter().map(RatDop::order).sum();
    assert_eq!(total, l.order(), "order additivity");
    let cfg = FactorConfig::default();
    for f in factors {
        let fd = f.clear_denominators();
        let rf = right_factor(&fd, &SymbolicOnlyEngine, &cfg).unwrap();
        assert!(rf.is_none(), "factor {fd} is reducible");
    }
}

/// E1: D*z*D factors as [z*D + 1, D].
#[test]
fn factor_d_z_d() {
    let _ = env_logger::builder().is_test(true).try_init();
    let l = Dop::<Rat>::new(vec![pq(&[]), pq(&[1]), pq(&[0, 1])]);
    let cfg = FactorConfig::default();
    let factors = factor_rational(&l, &SymbolicOnlyEngine, &cfg).unwrap();
    assert_eq!(factors.len(), 2);
    assert_eq!(factors[0].clear_denominators(), Dop::new(vec![p(&[1]), p(&[0, 1])]));
    assert_eq!(factors[1].clear_denominators(), Dop::new(vec![p(&[]), p(&[1])]));
    check_factorization(&l, &factors);
}

/// E2: the hypergeometric operator has monic right factor D + 1/(z-1).
#[test]
fn hypergeometric_right_factor() {
    let l = Dop::new(vec![p(&[-1]), p(&[1, -3]), p(&[0, 1, -1])]);
    let cfg = FactorConfig::default();
    let r = right_factor(&l, &SymbolicOnlyEngine, &cfg)
        .unwrap()
        .expect("right factor");
    // (z - 1) D + 1, i.e. monic D + 1/(z - 1).
    assert_eq!(r, Dop::new(vec![p(&[1]), p(&[-1, 1])]));
    let monic = RatDop::from_dop(&r).monic();
    assert_eq!(
        monic.coeff(0),
        RatFunc::new(Poly::one(), p(&[-1, 1]))
    );
}

/// E3: the Dawson operator factors through the trivial-monodromy
/// fallback into two order-one pieces.
#[test]
fn factor_dawson() {
    let l = Dop::<Rat>::new(vec![pq(&[2]), pq(&[0, 2]), pq(&[1])]);
    let cfg = FactorConfig::default();
    let factors = factor_rational(&l, &SymbolicOnlyEngine, &cfg).unwrap();
    assert_eq!(factors.len(), 2);
    // The right factor is proportional to D + 2z (i.e. 1/2 D + z).
    assert_eq!(
        factors[1].clear_denominators(),
        Dop::new(vec![p(&[0, 2]), p(&[1])])
    );
    check_factorization(&l, &factors);
}

/// E4: the ssw operator has the rational-solution right factor t*D + 2.
#[test]
fn ssw_right_factor() {
    let l = Dop::new(vec![
        p(&[0, 96]),
        p(&[-15, 0, 288]),
        p(&[0, -9, 0, 144]),
        p(&[0, 0, -1, 0, 16]),
    ]);
    let cfg = FactorConfig::default();
    let r = right_factor(&l, &SymbolicOnlyEngine, &cfg)
        .unwrap()
        .expect("right factor");
    assert_eq!(r, Dop::new(vec![p(&[2]), p(&[0, 1])]));
}

/// E5: Melczer's order-5 operator admits no shortcut factor; both
/// symbolic probes come back empty.
#[test]
fn melczer_shortcuts_fail() {
    let l = Dop::new(vec![
        p(&[162]),
        p(&[102, 3726]),
        p(&[8, 573, 9315]),
        p(&[0, 19, 594, 6075]),
        p(&[0, 0, 9, 175, 1296]),
        p(&[0, 0, 0, 1, 14, 81]),
    ]);
    assert_eq!(l.order(), 5);
    let mut reg = FieldRegistry::new();
    assert!(try_rational(&l, &mut reg, 300).unwrap().is_none());
    assert!(try_van_hoeij(&l, &mut reg, 300).unwrap().is_none());
}

/// E6: an order-one operator without rational solutions is returned
/// whole.
#[test]
fn order_one_is_kept() {
    let l = Dop::<Rat>::new(vec![pq(&[-1]), pq(&[0, 2])]);
    let cfg = FactorConfig::default();
    let factors = factor_rational(&l, &SymbolicOnlyEngine, &cfg).unwrap();
    assert_eq!(factors.len(), 1);
    assert_eq!(factors[0].clear_denominators(), lift_rational_dop(&l).normalized());
}

/// Base-point invariance: factoring a shifted operator gives the shifted
/// factorization.
#[test]
fn base_point_invariance() {
    let l = Dop::<Rat>::new(vec![pq(&[]), pq(&[1]), pq(&[0, 1])]);
    let shift = rat_i64(3);
    let shifted = l.compose_shift(&shift);
    let cfg = FactorConfig::default();
    let factors = factor_rational(&shifted, &SymbolicOnlyEngine, &cfg).unwrap();
    assert_eq!(factors.len(), 2);
    let back: Vec<Dop<K>> = factors
        .iter()
        .map(|f| {
            f.clear_denominators()
                .compose_shift(&NfElem::rational(-shift.clone()))
                .normalized()
        })
        .collect();
    assert_eq!(back[0], Dop::new(vec![p(&[1]), p(&[0, 1])]));
    assert_eq!(back[1], Dop::new(vec![p(&[]), p(&[1])]));
}

/// Adjoint symmetry: the reversed adjoints of the factors of `L` form a
/// factorization of `L*` into irreducible pieces.
#[test]
fn adjoint_symmetry() {
    let l = Dop::<Rat>::new(vec![pq(&[]), pq(&[1]), pq(&[0, 1])]);
    let cfg = FactorConfig::default();
    let factors = factor_rational(&l, &SymbolicOnlyEngine, &cfg).unwrap();
    let reversed_adjoints: Vec<Dop<K>> = factors
        .iter()
        .rev()
        .map(|f| f.clear_denominators().adjoint())
        .collect();
    let mut prod = Dop::from_poly(Poly::one());
    for f in &reversed_adjoints {
        prod = prod.mul(f);
    }
    let adj = lift_rational_dop(&l.adjoint());
    assert_eq!(prod.normalized(), adj.normalized());
    for f in &reversed_adjoints {
        let rf = right_factor(f, &SymbolicOnlyEngine, &cfg).unwrap();
        assert!(rf.is_none(), "adjoint factor {f} is reducible");
    }
}

/// Property: products of first-order operators with rational kernels
/// recompose exactly.
#[test]
fn random_products_recompose() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    for _ in 0..5 {
        let mut firsts = Vec::new();
        for _ in 0..2 {
            // f = (z + a) / (z + b) with a != b gives the factor
            // den*D - num from f'/f.
            let a = rng.gen_range(-4i64..=4);
            let mut b = rng.gen_range(-4i64..=4);
            if a == b {
                b += 1;
            }
            let f = RatFunc::new(pq(&[a, 1]), pq(&[b, 1]));
            let logderiv = &f.derivative() * &f.inverse();
            let r = Dop::new(vec![-logderiv.numer(), logderiv.denom().clone()]).normalized();
            assert_eq!(r.order(), 1);
            firsts.push(r);
        }
        let l = firsts[0].mul(&firsts[1]);
        let cfg = FactorConfig::default();
        let factors = factor_rational(&l, &SymbolicOnlyEngine, &cfg).unwrap();
        check_factorization(&l, &factors);
        assert_eq!(factors.len(), 2);
    }
}
