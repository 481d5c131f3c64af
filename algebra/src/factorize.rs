//! Squarefree decomposition and factorization over `Q`.
//!
//! Rational and quadratic factors are split off exactly; a squarefree
//! factor of degree >= 3 without rational roots is kept whole and treated
//! downstream as a single place. Valuation tests against such a factor are
//! minima over its conjugate roots, which keeps every `forall`-style test
//! (in particular the Fuchsian criterion) exact.

use itertools::iproduct;
use num::integer::Roots;
use num::traits::SaturatingMul;
use num::{BigInt, One, Signed, Zero};

use crate::coeff::Coeff;
use crate::poly::Poly;
use crate::rational::Rat;

/// Yun's squarefree decomposition: `f = c * prod a_i^i` with the `a_i`
/// squarefree, pairwise coprime, monic. Returns the nonconstant `a_i`.
pub fn squarefree_decomposition<F: Coeff>(f: &Poly<F>) -> Vec<(Poly<F>, usize)> {
    let mut out = Vec::new();
    if f.degree_plus_one() <= 1 {
        return out;
    }
    let f = f.monic();
    let df = f.derivative();
    let g = f.gcd(&df);
    let mut b = f.div_rem(&g).0;
    let mut c = df.div_rem(&g).0;
    let mut d = &c - &b.derivative();
    let mut i = 1usize;
    while b.degree_plus_one() > 1 {
        let a = b.gcd(&d);
        if a.degree_plus_one() > 1 {
            out.push((a.clone(), i));
        }
        b = b.div_rem(&a).0;
        c = d.div_rem(&a).0;
        d = &c - &b.derivative();
        i += 1;
    }
    out
}

/// The product of the distinct irreducible factors of `f` (monic).
pub fn radical<F: Coeff>(f: &Poly<F>) -> Poly<F> {
    if f.degree_plus_one() <= 1 {
        return Poly::one();
    }
    let g = f.gcd(&f.derivative());
    f.div_rem(&g).0.monic()
}

/// Number of distinct roots of `f` in the algebraic closure.
pub fn distinct_root_count<F: Coeff>(f: &Poly<F>) -> usize {
    let r = radical(f);
    r.degree_plus_one().saturating_sub(1)
}

/// Largest `k` such that `g^k` divides `f`.
pub fn valuation<F: Coeff>(f: &Poly<F>, g: &Poly<F>) -> usize {
    assert!(g.degree_plus_one() > 1, "valuation at a constant");
    if f.is_zero() {
        return usize::MAX;
    }
    let mut k = 0;
    let mut h = f.clone();
    loop {
        let (q, r) = h.div_rem(g);
        if !r.is_zero() {
            return k;
        }
        k += 1;
        h = q;
    }
}

/// `Some(sqrt(q))` iff the nonnegative rational is a perfect square.
pub fn exact_sqrt(q: &Rat) -> Option<Rat> {
    if q.is_negative() {
        return None;
    }
    let sn = q.numer().sqrt();
    let sd = q.denom().sqrt();
    (&sn * &sn == *q.numer() && &sd * &sd == *q.denom()).then(|| Rat::new(sn, sd))
}

fn divisors_u64(n: u64) -> Vec<u64> {
    let mut divs = vec![1];
    let mut m = n;
    let mut p = 2u64;
    let mut factors: Vec<(u64, u32)> = Vec::new();
    while p * p <= m {
        if m % p == 0 {
            let mut e = 0;
            while m % p == 0 {
                m /= p;
                e += 1;
            }
            factors.push((p, e));
        }
        p += 1;
    }
    if m > 1 {
        factors.push((m, 1));
    }
    for (p, e) in factors {
        let prev = divs.clone();
        let mut pk = 1u64;
        for _ in 0..e {
            pk = pk.saturating_mul(p);
            divs.extend(prev.iter().map(|d| d.saturating_mul(&pk)));
        }
    }
    divs.sort_unstable();
    divs.dedup();
    divs
}

const ROOT_SEARCH_LIMIT: u64 = 1 << 40;

/// Rational roots of a squarefree rational polynomial, by the rational
/// root theorem on the primitive integer form. Coefficients too large to
/// enumerate divisors yield no roots (the factor then stays whole).
fn rational_roots_squarefree(f: &Poly<Rat>) -> Vec<Rat> {
    let mut roots = Vec::new();
    if f.degree_plus_one() <= 1 {
        return roots;
    }
    let mut g = f.trimmed();
    if let Some(v) = g.valuation() {
        if v > 0 {
            roots.push(<Rat as Coeff>::zero());
            g = Poly::new(g.coeffs[v..].to_vec());
        }
    }
    if g.degree_plus_one() <= 1 {
        return roots;
    }
    // Clear denominators to a primitive integer polynomial.
    let mut den = BigInt::one();
    for c in &g.coeffs {
        den = num::integer::lcm(den, c.denom().clone());
    }
    let ints: Vec<BigInt> = g
        .coeffs
        .iter()
        .map(|c| (c * Rat::from_integer(den.clone())).to_integer())
        .collect();
    let mut content = BigInt::zero();
    for c in &ints {
        content = num::integer::gcd(content, c.clone());
    }
    let ints: Vec<BigInt> = ints.iter().map(|c| c / &content).collect();
    let a0 = ints[0].abs();
    let an = ints.last().expect("nonconstant").abs();
    let (a0, an) = match (u64::try_from(&a0), u64::try_from(&an)) {
        (Ok(a), Ok(b)) if a < ROOT_SEARCH_LIMIT && b < ROOT_SEARCH_LIMIT => (a, b),
        _ => return roots,
    };
    debug_assert!(a0 != 0);
    let g = Poly::<Rat>::new(ints.iter().map(|c| Rat::from_integer(c.clone())).collect());
    let (dp, dq) = (divisors_u64(a0), divisors_u64(an));
    if dp.len().saturating_mul(dq.len()) > 10_000 {
        return roots;
    }
    for (&p, &q) in iproduct!(&dp, &dq) {
        if num::integer::gcd(p, q) != 1 {
            continue;
        }
        for sign in [1i64, -1] {
            let cand = Rat::new(BigInt::from(sign) * BigInt::from(p), BigInt::from(q));
            if Coeff::is_zero(&g.eval(&cand)) {
                roots.push(cand);
            }
        }
    }
    roots.sort();
    roots.dedup();
    roots
}

/// Rational roots of `f` with multiplicities.
pub fn rational_roots(f: &Poly<Rat>) -> Vec<(Rat, usize)> {
    let mut out = Vec::new();
    for (part, mult) in squarefree_decomposition(f) {
        for r in rational_roots_squarefree(&part) {
            out.push((r, mult));
        }
    }
    out
}

/// Monic factors of `f` over `Q` with multiplicities. Linear and quadratic
/// factors are irreducible; higher-degree factors are squarefree and
/// rational-root free but possibly reducible (treated as single places by
/// the callers).
pub fn factor_q(f: &Poly<Rat>) -> Vec<(Poly<Rat>, usize)> {
    let mut out = Vec::new();
    for (part, mult) in squarefree_decomposition(f) {
        let mut rest = part;
        for r in rational_roots_squarefree(&rest) {
            let lin = Poly::new(vec![-r, <Rat as Coeff>::one()]);
            rest = rest.div_rem(&lin).0;
            out.push((lin, mult));
        }
        if rest.degree_plus_one() > 1 {
            // Rational roots are gone, so a remaining quadratic is
            // irreducible; higher degrees stay whole.
            out.push((rest.monic(), mult));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::{rat, rat_i64};

    fn p(cs: &[i64]) -> Poly<Rat> {
        Poly::new(cs.iter().map(|&c| rat_i64(c)).collect())
    }

    #[test]
    fn test_squarefree_decomposition() {
        // (z-1)^2 (z+2)^3
        let f = &p(&[-1, 1]).pow(2) * &p(&[2, 1]).pow(3);
        let dec = squarefree_decomposition(&f);
        assert_eq!(dec.len(), 2);
        assert_eq!(dec[0], (p(&[-1, 1]), 2));
        assert_eq!(dec[1], (p(&[2, 1]), 3));
    }

    #[test]
    fn test_radical() {
        let f = &p(&[0, 1]).pow(3) * &p(&[-1, 1]);
        assert_eq!(radical(&f), &p(&[0, 1]) * &p(&[-1, 1]));
        assert_eq!(distinct_root_count(&f), 2);
    }

    #[test]
    fn test_valuation() {
        let f = &p(&[0, 1]).pow(2) * &p(&[3, 1]);
        assert_eq!(valuation(&f, &p(&[0, 1])), 2);
        assert_eq!(valuation(&f, &p(&[3, 1])), 1);
        assert_eq!(valuation(&f, &p(&[7, 1])), 0);
    }

    #[test]
    fn test_rational_roots() {
        // 16 z^2 - 1 has roots +-1/4
        let f = p(&[-1, 0, 16]);
        let roots = rational_roots(&f);
        assert_eq!(roots.len(), 2);
        assert!(roots.contains(&(rat(1, 4), 1)));
        assert!(roots.contains(&(rat(-1, 4), 1)));
    }

    #[test]
    fn test_factor_q() {
        // z^2 (16 z^2 - 1): places z, z - 1/4, z + 1/4
        let f = &p(&[0, 0, 1]) * &p(&[-1, 0, 16]);
        let fac = factor_q(&f);
        assert_eq!(fac.len(), 3);
        assert!(fac.contains(&(p(&[0, 1]), 2)));
        // z^2 + 1 stays whole
        let g = p(&[1, 0, 1]);
        let fac = factor_q(&g);
        assert_eq!(fac, vec![(p(&[1, 0, 1]), 1)]);
    }

    #[test]
    fn test_exact_sqrt() {
        assert_eq!(exact_sqrt(&rat(9, 4)), Some(rat(3, 2)));
        assert_eq!(exact_sqrt(&rat(2, 1)), None);
        assert_eq!(exact_sqrt(&rat(-4, 1)), None);
    }
}
