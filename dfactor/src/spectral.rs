//! Spectral data of an operator: indicial polynomials, local exponents,
//! the Fuchsian test, Newton polygon, and the degree bound for right
//! factors.

use num::{BigInt, Signed, ToPrimitive};

use dfactor_algebra::ball::{CBall, PrecisionError};
use dfactor_algebra::coeff::Coeff;
use dfactor_algebra::factorize::{factor_q, squarefree_decomposition, valuation};
use dfactor_algebra::numberfield::{lift_poly, FieldRegistry, NfElem};
use dfactor_algebra::poly::Poly;
use dfactor_algebra::rational::Rat;
use dfactor_algebra::roots::complex_roots_ball;

use crate::dop::Dop;

pub type K = NfElem;

/// A place of the coefficient field: a monic factor of the leading
/// coefficient, or the point at infinity.
#[derive(Clone, Debug, PartialEq)]
pub enum Place {
    Finite(Poly<K>),
    Infinity,
}

/// A local exponent: exact when it lies in the working field, otherwise a
/// ball enclosure.
#[derive(Clone, Debug)]
pub enum LocalExponent {
    Exact(K),
    Approx(CBall),
}

impl LocalExponent {
    pub fn embed(&self, prec: u32) -> CBall {
        match self {
            LocalExponent::Exact(e) => e.embed(prec),
            LocalExponent::Approx(b) => b.clone(),
        }
    }

    pub fn as_rat(&self) -> Option<Rat> {
        match self {
            LocalExponent::Exact(e) => e.as_rat(),
            LocalExponent::Approx(_) => None,
        }
    }

    pub fn is_integer(&self) -> Option<bool> {
        match self {
            LocalExponent::Exact(e) => match e.as_rat() {
                Some(q) => Some(q.is_integer()),
                None => Some(false),
            },
            LocalExponent::Approx(b) => {
                if !b.imag_contains_zero() {
                    return Some(false);
                }
                let nearest = b.re.round();
                if b.contains_point(&nearest, &Rat::zero()) {
                    None // cannot certify either way
                } else {
                    Some(false)
                }
            }
        }
    }
}

/// Whether the difference of two exponents is certainly not an integer
/// (`Some(false)` means it *is* an integer; `None` means undecidable at
/// this precision).
pub fn difference_non_integer(a: &LocalExponent, b: &LocalExponent, prec: u32) -> Option<bool> {
    if let (Some(x), Some(y)) = (a.as_rat(), b.as_rat()) {
        return Some(!(x - y).is_integer());
    }
    if let (LocalExponent::Exact(x), LocalExponent::Exact(y)) = (a, b) {
        let d = x.clone() - y.clone();
        if let Some(q) = d.as_rat() {
            return Some(!q.is_integer());
        }
    }
    let d = a.embed(prec).sub(&b.embed(prec));
    if !d.imag_contains_zero() {
        return Some(true);
    }
    let nearest = d.re.round();
    if d.contains_point(&nearest, &Rat::zero()) {
        None
    } else {
        Some(true)
    }
}

/// Monic factors (with multiplicity) of the leading coefficient of the
/// normalized operator: the finite singular places.
pub fn singular_places(dop: &Dop<K>) -> Vec<(Poly<K>, usize)> {
    let lead = dop.normalized().lead();
    factor_places(&lead)
}

fn factor_places(p: &Poly<K>) -> Vec<(Poly<K>, usize)> {
    if p.degree_plus_one() <= 1 {
        return Vec::new();
    }
    let rational: Option<Vec<Rat>> = p.coeffs.iter().map(Coeff::as_rat).collect();
    match rational {
        Some(cs) => factor_q(&Poly::new(cs))
            .into_iter()
            .map(|(f, m)| (lift_poly(&f), m))
            .collect(),
        None => squarefree_decomposition(p),
    }
}

/// Indicial polynomial at a place. For a finite place of degree >= 2 the
/// operator is extended to the field generated by one root of the place
/// polynomial.
pub fn indicial_polynomial(
    dop: &Dop<K>,
    place: &Place,
    registry: &mut FieldRegistry,
    prec: u32,
) -> Result<Poly<K>, PrecisionError> {
    match place {
        Place::Infinity => Ok(dop.compose_inverse_z().indicial_at_zero()),
        Place::Finite(f) if f.degree_plus_one() == 2 => {
            let s = -f.coeff(0);
            Ok(dop.compose_shift(&s).indicial_at_zero())
        }
        Place::Finite(f) => {
            let rat_f: Option<Vec<Rat>> = f.coeffs.iter().map(Coeff::as_rat).collect();
            let Some(cs) = rat_f else {
                return Err(PrecisionError);
            };
            let minpoly = Poly::new(cs);
            let root = dfactor_algebra::roots::complex_roots_rat(&minpoly, prec)?
                .into_iter()
                .next()
                .ok_or(PrecisionError)?
                .0;
            let field = registry.intern(minpoly, root);
            let alpha = NfElem::generator(&field);
            Ok(dop.compose_shift(&alpha).indicial_at_zero())
        }
    }
}

/// Rational roots of a polynomial over the working field, through the
/// gcd of its rational coordinate polynomials.
pub fn rational_roots_generic(p: &Poly<K>) -> Vec<(Rat, usize)> {
    if p.degree_plus_one() <= 1 {
        return Vec::new();
    }
    // Coordinate polynomials over Q.
    let max_coord = p
        .coeffs
        .iter()
        .map(|c| c.coords().len())
        .max()
        .unwrap_or(0);
    let mut g = Poly::<Rat>::zero();
    for j in 0..max_coord.max(1) {
        let coord = Poly::new(p.coeffs.iter().map(|c| c.coords().coeff(j)).collect());
        if !coord.is_zero() {
            g = if g.is_zero() { coord } else { g.gcd(&coord) };
        }
    }
    dfactor_algebra::factorize::rational_roots(&g)
        .into_iter()
        .filter(|(r, _)| p.eval(&NfElem::rational(r.clone())).is_zero())
        .map(|(r, _)| {
            // Recompute the true multiplicity in p.
            let lin = Poly::new(vec![NfElem::rational(-r.clone()), <K as Coeff>::one()]);
            (r, valuation(p, &lin))
        })
        .collect()
}

/// Local exponents (roots of the indicial polynomial) with
/// multiplicities.
pub fn exponents(
    dop: &Dop<K>,
    place: &Place,
    registry: &mut FieldRegistry,
    prec: u32,
) -> Result<Vec<(LocalExponent, usize)>, PrecisionError> {
    let ind = indicial_polynomial(dop, place, registry, prec)?;
    exponents_of_indicial(&ind, prec)
}

fn exponents_of_indicial(
    ind: &Poly<K>,
    prec: u32,
) -> Result<Vec<(LocalExponent, usize)>, PrecisionError> {
    let mut out: Vec<(LocalExponent, usize)> = Vec::new();
    if ind.is_zero() || ind.degree_plus_one() <= 1 {
        return Ok(out);
    }
    for (part, mult) in squarefree_decomposition(ind) {
        let mut rest = part;
        if rest.degree_plus_one() == 2 {
            let root = -(rest.coeff(0));
            out.push((LocalExponent::Exact(root), mult));
            continue;
        }
        for (r, _) in rational_roots_generic(&rest) {
            let lin = Poly::new(vec![NfElem::rational(-r.clone()), <K as Coeff>::one()]);
            rest = rest.div_rem(&lin).0;
            out.push((LocalExponent::Exact(NfElem::rational(r)), mult));
        }
        if rest.degree_plus_one() == 2 {
            out.push((LocalExponent::Exact(-(rest.monic().coeff(0))), mult));
        } else if rest.degree_plus_one() > 2 {
            let ball_poly = rest.map_coeffs(|c| c.embed(prec));
            for (b, m) in complex_roots_ball(&ball_poly, prec)? {
                debug_assert_eq!(m, 1);
                out.push((LocalExponent::Approx(b), mult));
            }
        }
    }
    Ok(out)
}

/// Integer roots of the indicial polynomial at a place.
pub fn integer_exponents(
    dop: &Dop<K>,
    place: &Place,
    registry: &mut FieldRegistry,
    prec: u32,
) -> Result<Vec<i64>, PrecisionError> {
    let ind = indicial_polynomial(dop, place, registry, prec)?;
    let mut out: Vec<i64> = rational_roots_generic(&ind)
        .into_iter()
        .filter_map(|(r, _)| r.is_integer().then(|| r.to_integer().to_i64()).flatten())
        .collect();
    out.sort_unstable();
    Ok(out)
}

/// The Fuchsian (regular-singularity) test: at every finite place `f` of
/// multiplicity `m`, every coefficient satisfies
/// `val_f(a_k) >= k - r + m`, and the same holds at infinity after
/// `z -> 1/z`.
pub fn is_fuchsian(dop: &Dop<K>) -> bool {
    let dop = dop.normalized();
    if regular_at_finite_places(&dop) {
        regular_at_finite_places(&dop.compose_inverse_z())
    } else {
        false
    }
}

fn regular_at_finite_places(dop: &Dop<K>) -> bool {
    let r = dop.order() as i64;
    for (f, m) in singular_places(dop) {
        for k in 0..dop.order() {
            let bound = k as i64 - r + m as i64;
            if bound <= 0 {
                continue;
            }
            let a = dop.coeff(k);
            if a.is_zero() {
                continue;
            }
            if (valuation(&a, &f) as i64) < bound {
                return false;
            }
        }
    }
    true
}

/// Largest `ceil(|e|)` over all local exponents at every singularity of
/// the desingularized leading coefficient, including infinity.
pub fn largest_exponent_modulus(
    dop: &Dop<K>,
    registry: &mut FieldRegistry,
    prec: u32,
) -> Result<u64, PrecisionError> {
    let normalized = dop.normalized();
    let mut places: Vec<Place> = singular_places(&normalized)
        .into_iter()
        .map(|(f, _)| Place::Finite(f))
        .collect();
    places.push(Place::Infinity);
    let mut out: u64 = 0;
    for place in &places {
        for (e, _) in exponents(&normalized, place, registry, prec)? {
            let bound = match &e {
                LocalExponent::Exact(x) => match x.as_rat() {
                    Some(q) => q.abs().ceil().to_integer(),
                    None => x.embed(prec).modulus_upper().ceil().to_integer(),
                },
                LocalExponent::Approx(b) => b.modulus_upper().ceil().to_integer(),
            };
            let bound = bound.to_u64().ok_or(PrecisionError)?;
            out = out.max(bound);
        }
    }
    Ok(out)
}

/// Degree bound for right factors:
/// `B = r^2 (S+1) E + r S + r^2 (r-1)(S-1)/2` with `r = order - 1`,
/// `S` the number of singularities of the leading coefficient in the
/// algebraic closure and `E` the largest exponent modulus.
pub fn degree_bound_for_right_factor(
    dop: &Dop<K>,
    registry: &mut FieldRegistry,
    prec: u32,
) -> Result<i64, PrecisionError> {
    let r = BigInt::from(dop.order() as i64 - 1);
    let s = BigInt::from(dfactor_algebra::factorize::distinct_root_count(
        &dop.normalized().lead(),
    ));
    let e = BigInt::from(largest_exponent_modulus(dop, registry, prec)?);
    let one = BigInt::from(1);
    let two = BigInt::from(2);
    let bound = &r * &r * (&s + &one) * &e
        + &r * &s
        + &r * &r * (&r - &one) * (&s - &one) / &two;
    Ok(bound.to_i64().ok_or(PrecisionError)?.max(0))
}

/// One edge of the Newton polygon at the origin.
#[derive(Clone, Debug)]
pub struct NewtonEdge {
    pub slope: Rat,
    pub start: (usize, i64),
    pub length: usize,
    pub poly: Poly<K>,
}

/// Newton polygon of the operator at the origin. The first edge is
/// horizontal and carries the full indicial polynomial; subsequent edges
/// follow the lower convex hull of `(k, val_z(a_k) - k)` with their
/// reduced characteristic polynomials.
pub fn newton_polygon(dop: &Dop<K>) -> Vec<NewtonEdge> {
    let r = dop.order();
    let mut points: Vec<(usize, i64)> = Vec::new();
    for k in 0..=r {
        let a = dop.coeff(k);
        if let Some(v) = a.valuation() {
            points.push((k, v as i64 - k as i64));
        }
    }
    if points.is_empty() {
        return Vec::new();
    }
    let qmin = points.iter().map(|&(_, q)| q).min().expect("nonempty");
    let flat: Vec<usize> = points
        .iter()
        .filter(|&&(_, q)| q == qmin)
        .map(|&(k, _)| k)
        .collect();
    let first_k = *flat.first().expect("nonempty");
    let last_k = *flat.last().expect("nonempty");
    let mut edges = vec![NewtonEdge {
        slope: Rat::zero(),
        start: (first_k, qmin),
        length: last_k - first_k,
        poly: dop.indicial_at_zero(),
    }];
    // Hull above the flat part: repeatedly take the smallest positive
    // slope reachable from the current vertex.
    let mut cur = (last_k, qmin);
    loop {
        let mut best: Option<(Rat, (usize, i64))> = None;
        for &(k, q) in &points {
            if k <= cur.0 {
                continue;
            }
            let slope = Rat::new(BigInt::from(q - cur.1), BigInt::from((k - cur.0) as i64));
            let better = match &best {
                None => true,
                Some((bs, _)) => slope < *bs,
            };
            if better {
                best = Some((slope, (k, q)));
            }
        }
        let Some((slope, next)) = best else { break };
        let poly = Poly::new(
            points
                .iter()
                .filter(|&&(k, q)| {
                    k >= cur.0
                        && k <= next.0
                        && Rat::new(BigInt::from(q - cur.1), BigInt::from(1))
                            == &slope * &Rat::new(BigInt::from((k - cur.0) as i64), BigInt::from(1))
                })
                .fold(
                    vec![<K as Coeff>::zero(); next.0 - cur.0 + 1],
                    |mut acc, &(k, _)| {
                        let a = dop.coeff(k);
                        let v = a.valuation().expect("nonzero coefficient");
                        acc[k - cur.0] = a.coeff(v);
                        acc
                    },
                ),
        );
        edges.push(NewtonEdge {
            slope,
            start: cur,
            length: next.0 - cur.0,
            poly,
        });
        cur = next;
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfactor_algebra::numberfield::NfElem;
    use dfactor_algebra::rational::rat_i64;

    fn p(cs: &[i64]) -> Poly<K> {
        Poly::new(
            cs.iter()
                .map(|&c| NfElem::rational(rat_i64(c)))
                .collect(),
        )
    }

    fn dop(coeffs: Vec<Poly<K>>) -> Dop<K> {
        Dop::new(coeffs)
    }

    /// The ssw operator
    /// `(16t^4 - t^2) D^3 + (144t^3 - 9t) D^2 + (288t^2 - 15) D + 96t`.
    fn ssw() -> Dop<K> {
        dop(vec![
            p(&[0, 96]),
            p(&[-15, 0, 288]),
            p(&[0, -9, 0, 144]),
            p(&[0, 0, -1, 0, 16]),
        ])
    }

    #[test]
    fn test_singular_places_ssw() {
        // lead = t^2 (16 t^2 - 1): places t (mult 2), t - 1/4, t + 1/4.
        let places = singular_places(&ssw());
        assert_eq!(places.len(), 3);
        assert!(places.contains(&(p(&[0, 1]), 2)));
    }

    #[test]
    fn test_exponents_at_zero_ssw() {
        let mut reg = FieldRegistry::new();
        let exps = exponents(&ssw(), &Place::Finite(p(&[0, 1])), &mut reg, 64).unwrap();
        // Indicial polynomial at 0 has roots including -2 (t*D + 2 is a
        // right factor with solution t^-2).
        let has_minus_two = exps.iter().any(|(e, _)| {
            e.as_rat().map_or(false, |q| q == Rat::from_integer((-2).into()))
        });
        assert!(has_minus_two, "exponents: {exps:?}");
    }

    #[test]
    fn test_integer_exponents() {
        let mut reg = FieldRegistry::new();
        // zD - 2: indicial X - 2 at 0.
        let l = dop(vec![p(&[-2]), p(&[0, 1])]);
        let ints = integer_exponents(&l, &Place::Finite(p(&[0, 1])), &mut reg, 64).unwrap();
        assert_eq!(ints, vec![2]);
    }

    #[test]
    fn test_is_fuchsian() {
        // The Euler operator z^2 D^2 + z D is Fuchsian.
        let euler = dop(vec![p(&[]), p(&[0, 1]), p(&[0, 0, 1])]);
        assert!(is_fuchsian(&euler));
        // Dawson D^2 + 2zD + 2 has an irregular singularity at infinity.
        let dawson = dop(vec![p(&[2]), p(&[0, 2]), p(&[1])]);
        assert!(!is_fuchsian(&dawson));
    }

    #[test]
    fn test_largest_exponent_modulus() {
        let mut reg = FieldRegistry::new();
        // zD - 2: exponent 2 at zero; at infinity the exponent is -2.
        let l = dop(vec![p(&[-2]), p(&[0, 1])]);
        let e = largest_exponent_modulus(&l, &mut reg, 64).unwrap();
        assert_eq!(e, 2);
    }

    #[test]
    fn test_degree_bound_positive() {
        let mut reg = FieldRegistry::new();
        let b = degree_bound_for_right_factor(&ssw(), &mut reg, 64).unwrap();
        assert!(b > 0);
    }

    #[test]
    fn test_newton_polygon_regular() {
        // Euler operator: single horizontal edge carrying the indicial
        // polynomial X^2 (i.e. X(X-1) + X).
        let euler = dop(vec![p(&[]), p(&[0, 1]), p(&[0, 0, 1])]);
        let edges = newton_polygon(&euler);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].slope, Rat::zero());
        assert_eq!(edges[0].poly, p(&[0, 0, 1]));
    }

    #[test]
    fn test_newton_polygon_irregular() {
        // z^3 D^2 + 1: a flat edge at q=0 (constant indicial) and a
        // positive-slope edge of horizontal length 2.
        let l = dop(vec![p(&[1]), p(&[]), p(&[0, 0, 0, 1])]);
        let edges = newton_polygon(&l);
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].slope, Rat::zero());
        assert_eq!(edges[1].length, 2);
        assert_eq!(edges[1].slope, Rat::new(BigInt::from(1), BigInt::from(2)));
    }
}
