//! Symbolic shortcuts: rational-solution factors and the van Hoeij-style
//! probe on exponential parts of multiplicity one.

use log::debug;

use dfactor_algebra::ball::PrecisionError;
use dfactor_algebra::coeff::Coeff;
use dfactor_algebra::factorize::distinct_root_count;
use dfactor_algebra::matrix::Mat;
use dfactor_algebra::numberfield::{FieldRegistry, NfElem};
use dfactor_algebra::poly::Poly;
use dfactor_algebra::ratfunc::RatFunc;
use dfactor_algebra::roots::complex_roots_rat;

use crate::dop::{Dop, RatDop};
use crate::spectral::{
    difference_non_integer, exponents, integer_exponents, singular_places, LocalExponent, Place,
};

pub type K = NfElem;

/// All rational-function solutions of the operator, by the classical
/// two-step method: a denominator bound from the negative integer
/// exponents at the finite singularities, then polynomial solutions of
/// the twisted operator by exact linear algebra under the degree bound
/// from infinity.
pub fn rational_solutions(
    dop: &Dop<K>,
    registry: &mut FieldRegistry,
    prec: u32,
) -> Result<Vec<RatFunc<K>>, PrecisionError> {
    let dop = dop.normalized();
    if dop.order() == 0 {
        return Ok(Vec::new());
    }
    let mut den = Poly::<K>::one();
    for (f, _) in singular_places(&dop) {
        let ints = integer_exponents(&dop, &Place::Finite(f.clone()), registry, prec)?;
        if let Some(&emin) = ints.first() {
            if emin < 0 {
                den = &den * &f.pow((-emin) as usize);
            }
        }
    }
    // Operator annihilating den * y for every solution y.
    let twisted = RatDop::from_dop(&dop)
        .mul(&RatDop::new(vec![RatFunc::new(Poly::one(), den.clone())]))
        .clear_denominators();
    let inf_ints = integer_exponents(&twisted, &Place::Infinity, registry, prec)?;
    let Some(&smin) = inf_ints.first() else {
        return Ok(Vec::new());
    };
    if smin > 0 {
        return Ok(Vec::new());
    }
    let max_deg = (-smin) as usize;
    // Stack the coefficient vectors of twisted(z^j).
    let images: Vec<Poly<K>> = (0..=max_deg)
        .map(|j| twisted.apply_poly(&Poly::monomial(<K as Coeff>::one(), j)))
        .collect();
    let height = images.iter().map(Poly::len).max().unwrap_or(0).max(1);
    let mut mat = Mat::zeros(height, max_deg + 1);
    for (j, img) in images.iter().enumerate() {
        for (i, c) in img.coeffs.iter().enumerate() {
            *mat.entry_mut(i, j) = c.clone();
        }
    }
    let kernel = mat.exact_kernel();
    let mut out = Vec::new();
    for v in kernel {
        let g = Poly::new(v);
        if g.is_zero() {
            continue;
        }
        out.push(RatFunc::new(g, den.clone()));
    }
    Ok(out)
}

/// A first-order right factor from a rational solution: for `L f = 0`
/// with `f` rational, the logarithmic derivative `f'/f = num/den` gives
/// the factor `den*D - num`.
pub fn try_rational(
    dop: &Dop<K>,
    registry: &mut FieldRegistry,
    prec: u32,
) -> Result<Option<Dop<K>>, PrecisionError> {
    for f in rational_solutions(dop, registry, prec)? {
        if f.is_zero() {
            continue;
        }
        let logderiv = &f.derivative() * &f.inverse();
        let r = Dop::new(vec![-logderiv.numer(), logderiv.denom().clone()]).normalized();
        if dop.is_divisible_by(&r) {
            debug!("rational solution shortcut found an order-1 factor");
            return Ok(Some(r));
        }
    }
    Ok(None)
}

/// An exponential part of multiplicity one: a place together with a
/// simple exponent differing from every other exponent at that place by
/// a non-integer.
fn search_exp_part_with_mult1(
    dop: &Dop<K>,
    registry: &mut FieldRegistry,
    prec: u32,
) -> Result<Option<(Place, K)>, PrecisionError> {
    let mut places: Vec<Place> = singular_places(dop)
        .into_iter()
        .map(|(f, _)| Place::Finite(f))
        .collect();
    places.push(Place::Infinity);
    for place in places {
        let exps = exponents(dop, &place, registry, prec)?;
        'candidates: for (i, (e, mult)) in exps.iter().enumerate() {
            if *mult != 1 {
                continue;
            }
            let LocalExponent::Exact(exact) = e else {
                continue;
            };
            for (j, (other, _)) in exps.iter().enumerate() {
                if i == j {
                    continue;
                }
                match difference_non_integer(e, other, prec) {
                    Some(true) => {}
                    _ => continue 'candidates,
                }
            }
            return Ok(Some((place, exact.clone())));
        }
    }
    Ok(None)
}

/// The van Hoeij-style probe: move a multiplicity-one exponential part
/// to an integer exponent at the origin and reconstruct the factor from
/// series coefficients, on the operator or on its adjoint.
pub fn try_van_hoeij(
    dop: &Dop<K>,
    registry: &mut FieldRegistry,
    prec: u32,
) -> Result<Option<Dop<K>>, PrecisionError> {
    let r = dop.order();
    if r < 2 {
        return Ok(None);
    }
    let normalized = dop.normalized();
    let Some((place, e0)) = search_exp_part_with_mult1(&normalized, registry, prec)? else {
        return Ok(None);
    };
    debug!("van Hoeij probe at {place:?}");
    enum Undo {
        Shift(K),
        Inverse,
    }
    let (moved, e, undo) = match &place {
        Place::Infinity => {
            let l1 = normalized.compose_inverse_z();
            // Re-find a usable exponent at the (now finite) origin.
            let Some((p0, e1)) = search_exp_part_with_mult1(&l1, registry, prec)? else {
                return Ok(None);
            };
            if p0 != Place::Finite(Poly::x()) {
                return Ok(None);
            }
            (l1, e1, Undo::Inverse)
        }
        Place::Finite(f) if f.degree_plus_one() == 2 => {
            let s = -f.coeff(0);
            (normalized.compose_shift(&s), e0, Undo::Shift(s))
        }
        Place::Finite(f) => {
            // A place of higher degree: move to one of its roots in the
            // corresponding number field.
            let rat_f: Option<Vec<_>> = f.coeffs.iter().map(Coeff::as_rat).collect();
            let Some(cs) = rat_f else {
                return Ok(None);
            };
            let minpoly = Poly::new(cs);
            let root = complex_roots_rat(&minpoly, prec)?
                .into_iter()
                .next()
                .ok_or(PrecisionError)?
                .0;
            let field = registry.intern(minpoly, root);
            let alpha = NfElem::generator(&field);
            (normalized.compose_shift(&alpha), e0, Undo::Shift(alpha))
        }
    };
    let e_is_integer = e.as_rat().map_or(false, |q| q.is_integer());
    let l2 = moved.euler_substitution(&e).normalized();
    let Some(r2) = guess_via_series(&l2, e_is_integer, registry, prec)? else {
        return Ok(None);
    };
    // Undo the Euler shift and the base-point change.
    let r1 = r2.euler_substitution(&(-e)).normalized();
    let candidate = match undo {
        Undo::Shift(s) => r1.compose_shift(&(-s)).normalized(),
        Undo::Inverse => r1.compose_inverse_z(),
    };
    if candidate.order() > 0 && candidate.order() < r && dop.is_divisible_by(&candidate) {
        debug!("van Hoeij factor of order {}", candidate.order());
        return Ok(Some(candidate));
    }
    Ok(None)
}

/// Reconstructs a factor of order `r - 1` from the first power-series
/// solution, retrying on the formal adjoint when the direct attempt
/// fails.
fn guess_via_series(
    l2: &Dop<K>,
    e_is_integer: bool,
    registry: &mut FieldRegistry,
    prec: u32,
) -> Result<Option<Dop<K>>, PrecisionError> {
    let r = l2.order();
    if !e_is_integer {
        if let Some(rf) = try_rational(l2, registry, prec)? {
            return Ok(Some(rf));
        }
    }
    let t = distinct_root_count(&l2.normalized().lead());
    let rm1 = r.saturating_sub(1);
    let rm2 = r.saturating_sub(2);
    let b = (rm1 * rm1 * rm2 * t.saturating_sub(1)).clamp(50, 1000);
    if let Some(cand) = guess_first_solution(l2, b, rm1) {
        if cand.order() > 0 && cand.order() < r && l2.is_divisible_by(&cand) {
            return Ok(Some(cand));
        }
    }
    // Adjoint retry: a right factor of the adjoint maps back through
    // adjoint(L* // R*).
    let adj = l2.adjoint().normalized();
    if let Some(cand) = guess_first_solution(&adj, b, rm1) {
        if cand.order() > 0 && cand.order() < r && adj.is_divisible_by(&cand) {
            if let Some(q) = adj.exact_div(&cand) {
                let back = q.clear_denominators().adjoint().normalized();
                if back.order() > 0 && back.order() < r && l2.is_divisible_by(&back) {
                    return Ok(Some(back));
                }
            }
        }
    }
    Ok(None)
}

fn guess_first_solution(dop: &Dop<K>, b: usize, order: usize) -> Option<Dop<K>> {
    let basis = dop.series_basis(b);
    let first = basis.first()?;
    let v = first.valuation()?;
    crate::guessing::guess(&first.coeffs[v..], order).map(|d| d.normalized())
}
