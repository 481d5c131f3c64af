//! Annihilator reconstruction: from a numeric candidate vector in the
//! solution space to a verified right factor.
//!
//! The candidate's coordinates are first recognized symbolically
//! (rationals by stable smallest-denominator search, algebraic numbers by
//! stable integer relations), then composed with the local solution basis
//! and fed to the guessing layer or to Hermite-Pade approximants. Every
//! candidate factor is checked by exact right division before being
//! returned.

use std::sync::Arc;

use log::debug;

use dfactor_algebra::ball::{Accuracy, CBall, PrecisionError};
use dfactor_algebra::coeff::Coeff;
use dfactor_algebra::factorize::factor_q;
use dfactor_algebra::lattice::algdep;
use dfactor_algebra::matrix::{orbit, reduced_row_echelon, CMat};
use dfactor_algebra::numberfield::{
    common_field, AlgebraicNumber, FieldRegistry, NfElem, NumberField,
};
use dfactor_algebra::poly::Poly;
use dfactor_algebra::rational::{rat, Rat};
use dfactor_algebra::roots::{complex_roots_rat, nearest_root_index};
use dfactor_algebra::series::Series;

use crate::dop::Dop;
use crate::guessing::{guess, minimal_approximant_basis};

pub type K = NfElem;

/// Result of one annihilator attempt.
#[derive(Clone, Debug)]
pub enum AnnOutcome {
    /// A verified proper right factor.
    Factor(Dop<K>),
    /// The vector generates the whole solution space.
    Whole,
    /// Nothing usable at the current parameters.
    Inconclusive,
}

/// Reconstructs a right factor of `dop` annihilating the solution
/// selected by the ball vector `ic` (coefficients against the canonical
/// local basis at the ordinary origin).
pub fn annihilator(
    dop: &Dop<K>,
    ic: &[CBall],
    order: usize,
    _bound: i64,
    alg_degree: usize,
    mono: Option<&[CMat]>,
    registry: &mut FieldRegistry,
) -> Result<AnnOutcome, PrecisionError> {
    let r = dop.order();
    let mut d = r.saturating_sub(1).max(1);
    let mut vec = ic.to_vec();
    if let Some(mats) = mono {
        let orb = orbit(mats, &[vec.clone()])?;
        d = orb.len();
        if d == 0 {
            return Err(PrecisionError);
        }
        if d == r {
            return Ok(AnnOutcome::Whole);
        }
        let reduced = reduced_row_echelon(orb)?;
        vec = reduced[0].clone();
    }
    let Some((symb, field)) = guess_symbolic_coefficients(&vec, alg_degree, registry)? else {
        return Ok(AnnOutcome::Inconclusive);
    };
    let base_rational = dop
        .coeffs()
        .iter()
        .all(|p| p.coeffs.iter().all(|c| c.as_rat().is_some()));
    if !base_rational && field.is_some() {
        // Composite of two nontrivial fields: out of scope, retry later
        // with different parameters.
        return Ok(AnnOutcome::Inconclusive);
    }
    let sol_basis = dop.series_basis(order + d);
    if sol_basis.len() < r {
        return Ok(AnnOutcome::Inconclusive);
    }
    let mut f = Series::zero(order + d);
    for (c, basis) in symb.iter().zip(&sol_basis) {
        f = f.add(&basis.scale(c));
    }
    let Some(v) = f.valuation() else {
        return Ok(AnnOutcome::Inconclusive);
    };
    if field.is_none() && base_rational {
        if let Some(cand) = guess(&f.coeffs[v..], d) {
            let shifted = cand.euler_substitution(&K::from_i64(-(v as i64)));
            let shifted = shifted.normalized();
            if shifted.order() > 0 && shifted.order() < r && dop.is_divisible_by(&shifted) {
                debug!("annihilator: guessed order-{} factor", shifted.order());
                return Ok(AnnOutcome::Factor(shifted));
            }
        }
    }
    // Hermite-Pade on the successive derivatives of f.
    if order > d {
        let mut column = Vec::with_capacity(d + 1);
        let mut der = f.clone();
        for i in 0..=d {
            if i > 0 {
                der = der.derivative();
            }
            column.push(der.truncated(order));
        }
        let basis = minimal_approximant_basis(&column, order);
        let max_deg = *basis.row_degrees.iter().max().expect("nonempty");
        let min_deg = *basis.row_degrees.iter().min().expect("nonempty");
        if max_deg > 1 + min_deg {
            let row = basis.rows[basis.min_degree_row()].clone();
            let cand = Dop::new(row).normalized();
            if cand.order() > 0 && cand.order() < r && dop.is_divisible_by(&cand) {
                debug!("annihilator: Hermite-Pade factor of order {}", cand.order());
                return Ok(AnnOutcome::Factor(cand));
            }
        }
    }
    Ok(AnnOutcome::Inconclusive)
}

/// Recognizes the entries of a ball vector as exact elements of `Q` or of
/// a common number field. Returns `None` when nothing stable is found.
pub fn guess_symbolic_coefficients(
    vec: &[CBall],
    alg_degree: usize,
    registry: &mut FieldRegistry,
) -> Result<Option<(Vec<K>, Option<Arc<NumberField>>)>, PrecisionError> {
    // Fast path: stable rational recognition at two tolerance levels.
    let mut v1 = Vec::with_capacity(vec.len());
    let mut v2 = Vec::with_capacity(vec.len());
    for x in vec {
        if !x.imag_contains_zero() {
            break;
        }
        let err1 = x.rad.clone();
        let err2 = &x.rad * rat(2, 3);
        v1.push(x.nearby_rational_real(&err1));
        v2.push(x.nearby_rational_real(&err2));
    }
    if v1.len() == vec.len() && v1 == v2 {
        debug!("symbolic recognition: rational coefficients");
        return Ok(Some((
            v1.into_iter().map(NfElem::rational).collect(),
            None,
        )));
    }
    let p = vec.customized_accuracy();
    if p < 30 {
        return Ok(None);
    }
    for deg in 2..=alg_degree.max(1) {
        let mut polys1 = Vec::with_capacity(vec.len());
        let mut stable = true;
        for x in vec {
            let p1 = algdep(x, deg, p - 10);
            let p2 = algdep(x, deg, p - 20);
            match (p1, p2) {
                (Some(a), Some(b)) if a == b => polys1.push(a),
                _ => {
                    stable = false;
                    break;
                }
            }
        }
        if !stable {
            continue;
        }
        let mut values = Vec::with_capacity(vec.len());
        let mut ok = true;
        for (x, cand) in vec.iter().zip(&polys1) {
            match select_conjugate(cand, x, p) {
                Some(alg) => values.push(alg),
                None => {
                    ok = false;
                    break;
                }
            }
        }
        if !ok {
            continue;
        }
        if let Some((field, elems)) = common_field(registry, &values, p) {
            debug!(
                "symbolic recognition: algebraic coefficients of degree {}",
                field.as_ref().map_or(1, |f| f.degree())
            );
            return Ok(Some((elems, field)));
        }
    }
    Ok(None)
}

/// Splits an algdep candidate into irreducible factors and selects the
/// one whose root matches the enclosure.
fn select_conjugate(cand: &Poly<Rat>, x: &CBall, prec: u32) -> Option<AlgebraicNumber> {
    let mut best: Option<AlgebraicNumber> = None;
    for (factor, _) in factor_q(cand) {
        let roots = complex_roots_rat(&factor, prec).ok()?;
        if roots.is_empty() {
            continue;
        }
        let balls: Vec<CBall> = roots.into_iter().map(|(b, _)| b).collect();
        let idx = nearest_root_index(&balls, x);
        let chosen = AlgebraicNumber {
            minpoly: factor.clone(),
            approx: balls[idx].clone(),
        };
        let dist_ok = x.contains_point(&chosen.approx.re, &chosen.approx.im)
            || chosen.approx.contains_point(&x.re, &x.im);
        if dist_ok {
            best = Some(chosen);
            break;
        }
        if best.is_none() {
            best = Some(chosen);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfactor_algebra::rational::{pow2, rat_i64};

    fn p(cs: &[i64]) -> Poly<K> {
        Poly::new(cs.iter().map(|&c| NfElem::rational(rat_i64(c))).collect())
    }

    fn ball(q: Rat, prec: u32, rad_bits: i64) -> CBall {
        CBall::from_rat(&q, prec).with_rad(pow2(-rad_bits))
    }

    #[test]
    fn test_recognize_rationals() {
        let mut reg = FieldRegistry::new();
        let v = vec![ball(rat_i64(1), 100, 60), ball(rat(2, 3), 100, 60)];
        let (symb, field) = guess_symbolic_coefficients(&v, 2, &mut reg)
            .unwrap()
            .expect("recognized");
        assert!(field.is_none());
        assert_eq!(symb[0].as_rat(), Some(rat_i64(1)));
        assert_eq!(symb[1].as_rat(), Some(rat(2, 3)));
    }

    #[test]
    fn test_recognize_sqrt2() {
        let mut reg = FieldRegistry::new();
        // sqrt(2) to ~100 bits, plus the rational 3.
        let s = dfactor_algebra::rational::sqrt_lower(&rat_i64(2), 100);
        let v = vec![
            CBall::exact(s, Rat::zero(), 128).with_rad(pow2(-95)),
            ball(rat_i64(3), 128, 95),
        ];
        let (symb, field) = guess_symbolic_coefficients(&v, 2, &mut reg)
            .unwrap()
            .expect("recognized");
        let f = field.expect("quadratic field");
        assert_eq!(f.degree(), 2);
        // First element squares to 2.
        let sq = symb[0].clone() * symb[0].clone();
        assert_eq!(sq.as_rat(), Some(rat_i64(2)));
        assert_eq!(symb[1].as_rat(), Some(rat_i64(3)));
    }

    #[test]
    fn test_nothing_found_on_fuzz() {
        let mut reg = FieldRegistry::new();
        // Accuracy below 30 bits and unstable rationals.
        let v = vec![ball(rat(1_234_567, 1_000_003), 40, 8)];
        let out = guess_symbolic_coefficients(&v, 3, &mut reg).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_annihilator_from_exact_vector() {
        let mut reg = FieldRegistry::new();
        // L = (D - 2)(D - 1); the vector (1, 2) selects exp(2z).
        let d_minus_1 = Dop::new(vec![p(&[-1]), p(&[1])]);
        let d_minus_2 = Dop::new(vec![p(&[-2]), p(&[1])]);
        let l = d_minus_2.mul(&d_minus_1);
        let ic = vec![ball(rat_i64(1), 120, 100), ball(rat_i64(2), 120, 100)];
        let out = annihilator(&l, &ic, 24, 10, 2, None, &mut reg).unwrap();
        match out {
            AnnOutcome::Factor(rf) => {
                assert_eq!(rf.normalized(), d_minus_2.normalized());
            }
            other => panic!("expected factor, got {other:?}"),
        }
    }

    #[test]
    fn test_annihilator_whole_space() {
        let mut reg = FieldRegistry::new();
        // With monodromy whose orbit fills the space, the answer is
        // Whole.
        let l = Dop::new(vec![p(&[]), p(&[]), p(&[1])]); // D^2
        let prec = 100;
        let m = dfactor_algebra::matrix::Mat::from_rows(vec![
            vec![CBall::one(prec), CBall::one(prec)],
            vec![CBall::zero(prec), CBall::one(prec)],
        ]);
        let ic = vec![ball(rat_i64(1), prec, 90), ball(rat_i64(1), prec, 90)];
        let out = annihilator(&l, &ic, 16, 10, 2, Some(&[m]), &mut reg).unwrap();
        assert!(matches!(out, AnnOutcome::Whole));
    }
}
