//! Integer lattice reduction and integer-relation recovery.
//!
//! A small exact-arithmetic LLL (delta = 3/4) over `BigInt` vectors with
//! rational Gram-Schmidt data, and `algdep`, which recovers a candidate
//! minimal polynomial of a complex enclosure from `known_bits` of its
//! midpoint via the standard two-column (real/imaginary) lattice.

use num::{BigInt, One, Signed, Zero};

use crate::ball::CBall;
use crate::poly::Poly;
use crate::rational::{pow2, Rat};

fn dot(a: &[BigInt], b: &[BigInt]) -> BigInt {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

struct Gso {
    mu: Vec<Vec<Rat>>,
    norms: Vec<Rat>,
}

fn gram_schmidt(basis: &[Vec<BigInt>]) -> Gso {
    let n = basis.len();
    let dim = basis[0].len();
    let mut mu = vec![vec![Rat::zero(); n]; n];
    let mut star: Vec<Vec<Rat>> = Vec::with_capacity(n);
    let mut norms = vec![Rat::zero(); n];
    for i in 0..n {
        let mut v: Vec<Rat> = basis[i]
            .iter()
            .map(|x| Rat::from_integer(x.clone()))
            .collect();
        for j in 0..i {
            if norms[j].is_zero() {
                continue;
            }
            let num: Rat = basis[i]
                .iter()
                .zip(&star[j])
                .map(|(x, y)| Rat::from_integer(x.clone()) * y)
                .sum();
            let m = num / &norms[j];
            for k in 0..dim {
                let t = &v[k] - &(&m * &star[j][k]);
                v[k] = t;
            }
            mu[i][j] = m;
        }
        norms[i] = v.iter().map(|x| x * x).sum();
        star.push(v);
    }
    Gso { mu, norms }
}

/// In-place LLL reduction with delta = 3/4. Exact, quadratic-size safe
/// for the small lattices used here.
pub fn lll_reduce(basis: &mut Vec<Vec<BigInt>>) {
    let n = basis.len();
    if n <= 1 {
        return;
    }
    let delta = Rat::new(BigInt::from(3), BigInt::from(4));
    let half = Rat::new(BigInt::from(1), BigInt::from(2));
    let mut gso = gram_schmidt(basis);
    let mut k = 1;
    while k < n {
        for j in (0..k).rev() {
            if gso.mu[k][j].abs() > half {
                let r = gso.mu[k][j].round().to_integer();
                let bj = basis[j].clone();
                for (x, y) in basis[k].iter_mut().zip(&bj) {
                    *x -= &r * y;
                }
                gso = gram_schmidt(basis);
            }
        }
        let lovasz = (&delta - &(&gso.mu[k][k - 1] * &gso.mu[k][k - 1])) * &gso.norms[k - 1];
        if gso.norms[k] >= lovasz {
            k += 1;
        } else {
            basis.swap(k, k - 1);
            gso = gram_schmidt(basis);
            k = k.max(2) - 1;
        }
    }
}

fn scaled_int(x: &Rat, bits: u32) -> BigInt {
    (x * pow2(bits as i64)).round().to_integer()
}

/// Recovers a primitive integer polynomial of degree at most `degree`
/// having (an approximation of) `x` as a root, from `known_bits` correct
/// bits of the midpoint. Returns `None` when the reduced relation is
/// trivial.
pub fn algdep(x: &CBall, degree: usize, known_bits: u32) -> Option<Poly<Rat>> {
    assert!(degree >= 1);
    let n = degree + 1;
    // Powers of the midpoint, exactly.
    let mut pow_re = Vec::with_capacity(n);
    let mut pow_im = Vec::with_capacity(n);
    let mut re = Rat::one();
    let mut im = Rat::zero();
    for _ in 0..n {
        pow_re.push(re.clone());
        pow_im.push(im.clone());
        let nre = &re * &x.re - &im * &x.im;
        let nim = &re * &x.im + &im * &x.re;
        re = nre;
        im = nim;
    }
    let mut basis: Vec<Vec<BigInt>> = Vec::with_capacity(n);
    for i in 0..n {
        let mut row = vec![BigInt::zero(); n + 2];
        row[i] = BigInt::one();
        row[n] = scaled_int(&pow_re[i], known_bits);
        row[n + 1] = scaled_int(&pow_im[i], known_bits);
        basis.push(row);
    }
    lll_reduce(&mut basis);
    // The shortest vector encodes the relation.
    let best = basis
        .iter()
        .min_by_key(|v| dot(v, v))
        .expect("nonempty basis");
    let coeffs: Vec<Rat> = best[..n]
        .iter()
        .map(|c| Rat::from_integer(c.clone()))
        .collect();
    let mut p = Poly::new(coeffs);
    if p.degree_plus_one() <= 1 {
        return None;
    }
    // Normalize to a primitive polynomial with positive leading term.
    let mut content = BigInt::zero();
    for c in &p.coeffs {
        content = num::integer::gcd(content, c.numer().clone());
    }
    if !content.is_zero() && content != BigInt::one() {
        let inv = Rat::new(BigInt::one(), content);
        p = p.scale(&inv);
    }
    if p.lead().is_negative() {
        p = p.scale(&Rat::from_integer(BigInt::from(-1)));
    }
    Some(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::{rat, rat_i64, sqrt_lower};

    #[test]
    fn test_lll_short_vector() {
        // A lattice with an obvious short vector (1, 0, 0).
        let mut basis = vec![
            vec![BigInt::from(1), BigInt::from(0), BigInt::from(0)],
            vec![BigInt::from(1), BigInt::from(1_000_000), BigInt::from(0)],
            vec![BigInt::from(0), BigInt::from(0), BigInt::from(1_000_000)],
        ];
        lll_reduce(&mut basis);
        let shortest = basis.iter().min_by_key(|v| dot(v, v)).unwrap();
        assert_eq!(dot(shortest, shortest), BigInt::from(1));
    }

    #[test]
    fn test_algdep_sqrt2() {
        // sqrt(2) to ~100 bits.
        let approx = sqrt_lower(&rat_i64(2), 110);
        let x = CBall::exact(approx, Rat::zero(), 128);
        let p = algdep(&x, 2, 90).expect("relation found");
        // X^2 - 2
        assert_eq!(p.coeffs, vec![rat_i64(-2), rat_i64(0), rat_i64(1)]);
    }

    #[test]
    fn test_algdep_rational() {
        let x = CBall::from_rat(&rat(7, 3), 128);
        let p = algdep(&x, 2, 60).expect("relation found");
        // Divisible by 3X - 7.
        let lin = Poly::new(vec![rat_i64(-7), rat_i64(3)]);
        assert!(lin.divides(&p) || p == lin);
    }

    #[test]
    fn test_algdep_gaussian() {
        // i satisfies X^2 + 1.
        let x = CBall::exact(Rat::zero(), rat_i64(1), 128);
        let p = algdep(&x, 2, 80).expect("relation found");
        assert_eq!(p.coeffs, vec![rat_i64(1), rat_i64(0), rat_i64(1)]);
    }
}
