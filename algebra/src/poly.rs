//! Dense univariate polynomials over a coefficient field.

use std::cmp::max;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::coeff::Coeff;

/// A polynomial in coefficient form, low degree first.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "F: Serialize + serde::de::DeserializeOwned")]
pub struct Poly<F: Coeff> {
    pub coeffs: Vec<F>,
}

impl<F: Coeff> Poly<F> {
    /// Builds a polynomial, dropping trailing zero coefficients.
    pub fn new(mut coeffs: Vec<F>) -> Self {
        while coeffs.last().map_or(false, F::is_zero) {
            coeffs.pop();
        }
        Poly { coeffs }
    }

    pub fn empty() -> Self {
        Poly { coeffs: Vec::new() }
    }

    pub fn zero() -> Self {
        Self::empty()
    }

    pub fn constant(c: F) -> Self {
        Self::new(vec![c])
    }

    pub fn one() -> Self {
        Self::constant(F::one())
    }

    /// The monomial `z`.
    pub fn x() -> Self {
        Self::new(vec![F::zero(), F::one()])
    }

    /// `c * z^k`.
    pub fn monomial(c: F, k: usize) -> Self {
        let mut coeffs = vec![F::zero(); k];
        coeffs.push(c);
        Self::new(coeffs)
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(F::is_zero)
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    /// Degree of the polynomial + 1, or 0 for the zero polynomial.
    pub fn degree_plus_one(&self) -> usize {
        (0..self.len())
            .rev()
            .find(|&i| !self.coeffs[i].is_zero())
            .map_or(0, |i| i + 1)
    }

    pub fn degree(&self) -> usize {
        self.degree_plus_one()
            .checked_sub(1)
            .expect("deg(0) is undefined")
    }

    /// Leading coefficient, or zero for the zero polynomial.
    pub fn lead(&self) -> F {
        self.coeffs
            .iter()
            .rev()
            .find(|c| !c.is_zero())
            .cloned()
            .unwrap_or_else(F::zero)
    }

    pub fn coeff(&self, k: usize) -> F {
        self.coeffs.get(k).cloned().unwrap_or_else(F::zero)
    }

    /// Index of the lowest nonzero coefficient.
    pub fn valuation(&self) -> Option<usize> {
        self.coeffs.iter().position(|c| !c.is_zero())
    }

    pub fn trim(&mut self) {
        self.coeffs.truncate(self.degree_plus_one());
    }

    pub fn trimmed(&self) -> Self {
        Self {
            coeffs: self.coeffs[..self.degree_plus_one()].to_vec(),
        }
    }

    pub fn eval(&self, x: &F) -> F {
        self.coeffs
            .iter()
            .rev()
            .fold(F::zero(), |acc, c| acc * x.clone() + c.clone())
    }

    pub fn derivative(&self) -> Self {
        let coeffs = self
            .coeffs
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, c)| c.clone() * F::from_i64(i as i64))
            .collect();
        Self::new(coeffs)
    }

    pub fn scale(&self, c: &F) -> Self {
        Self::new(self.coeffs.iter().map(|x| x.clone() * c.clone()).collect())
    }

    /// Multiplies by `z^k`.
    pub fn shift_up(&self, k: usize) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        let mut coeffs = vec![F::zero(); k];
        coeffs.extend(self.coeffs.iter().cloned());
        Self::new(coeffs)
    }

    /// The composition `f(z + s)`.
    pub fn shift(&self, s: &F) -> Self {
        let mut acc = Self::zero();
        for c in self.coeffs.iter().rev() {
            // acc <- acc * (z + s) + c
            let mut next = acc.shift_up(1);
            next = &next + &acc.scale(s);
            next = &next + &Self::constant(c.clone());
            acc = next;
        }
        acc
    }

    /// General composition `f(g(z))`.
    pub fn compose(&self, g: &Self) -> Self {
        let mut acc = Self::zero();
        for c in self.coeffs.iter().rev() {
            acc = &(&acc * g) + &Self::constant(c.clone());
        }
        acc
    }

    /// `z^deg * f(1/z)`, the coefficient reversal.
    pub fn reverse(&self) -> Self {
        Self::new(self.trimmed().coeffs.into_iter().rev().collect())
    }

    pub fn map_coeffs<G: Coeff>(&self, f: impl Fn(&F) -> G) -> Poly<G> {
        Poly::new(self.coeffs.iter().map(f).collect())
    }

    /// Euclidean division; panics on a zero divisor.
    pub fn div_rem(&self, b: &Self) -> (Self, Self) {
        let b = b.trimmed();
        let (na, nb) = (self.degree_plus_one(), b.degree_plus_one());
        if nb == 0 {
            panic!("division by zero polynomial");
        }
        if na == 0 {
            return (Self::zero(), Self::zero());
        }
        if na < nb {
            return (Self::zero(), self.clone());
        }
        let mut quotient = vec![F::zero(); na - nb + 1];
        let mut rem = self.trimmed();
        let lead_inv = b.lead().inverse();
        while !rem.is_zero() && rem.degree_plus_one() >= nb {
            let k = rem.degree_plus_one() - nb;
            let q = rem.lead() * lead_inv.clone();
            quotient[k] = q.clone();
            for (i, c) in b.coeffs.iter().enumerate() {
                let t = rem.coeffs[k + i].clone() - q.clone() * c.clone();
                rem.coeffs[k + i] = t;
            }
            rem.trim();
        }
        (Self::new(quotient), rem)
    }

    pub fn rem(&self, b: &Self) -> Self {
        self.div_rem(b).1
    }

    pub fn divides(&self, other: &Self) -> bool {
        other.rem(self).is_zero()
    }

    pub fn monic(&self) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        self.scale(&self.lead().inverse())
    }

    /// Monic greatest common divisor.
    pub fn gcd(&self, other: &Self) -> Self {
        let mut a = self.trimmed();
        let mut b = other.trimmed();
        while !b.is_zero() {
            let r = a.rem(&b);
            a = b;
            b = r;
        }
        a.monic()
    }

    /// Extended gcd: returns monic `g` and `(u, v)` with `u*a + v*b = g`.
    pub fn extended_gcd(&self, other: &Self) -> (Self, Self, Self) {
        let (mut r0, mut r1) = (self.trimmed(), other.trimmed());
        let (mut u0, mut u1) = (Self::one(), Self::zero());
        let (mut v0, mut v1) = (Self::zero(), Self::one());
        while !r1.is_zero() {
            let (q, r) = r0.div_rem(&r1);
            let u = &u0 - &(&q * &u1);
            let v = &v0 - &(&q * &v1);
            r0 = r1;
            r1 = r;
            u0 = u1;
            u1 = u;
            v0 = v1;
            v1 = v;
        }
        if r0.is_zero() {
            return (Self::zero(), Self::zero(), Self::zero());
        }
        let c = r0.lead().inverse();
        (r0.scale(&c), u0.scale(&c), v0.scale(&c))
    }

    pub fn pow(&self, mut e: usize) -> Self {
        let mut base = self.clone();
        let mut acc = Self::one();
        while e > 0 {
            if e & 1 == 1 {
                acc = &acc * &base;
            }
            base = &base * &base;
            e >>= 1;
        }
        acc
    }
}

impl<F: Coeff> PartialEq for Poly<F> {
    fn eq(&self, other: &Self) -> bool {
        let n = max(self.len(), other.len());
        (0..n).all(|i| self.coeff(i) == other.coeff(i))
    }
}

impl<F: Coeff> Add for &Poly<F> {
    type Output = Poly<F>;

    fn add(self, rhs: Self) -> Poly<F> {
        let n = max(self.len(), rhs.len());
        Poly::new((0..n).map(|i| self.coeff(i) + rhs.coeff(i)).collect())
    }
}

impl<F: Coeff> Sub for &Poly<F> {
    type Output = Poly<F>;

    fn sub(self, rhs: Self) -> Poly<F> {
        let n = max(self.len(), rhs.len());
        Poly::new((0..n).map(|i| self.coeff(i) - rhs.coeff(i)).collect())
    }
}

impl<F: Coeff> Neg for &Poly<F> {
    type Output = Poly<F>;

    fn neg(self) -> Poly<F> {
        Poly::new(self.coeffs.iter().map(|c| -c.clone()).collect())
    }
}

impl<F: Coeff> Mul for &Poly<F> {
    type Output = Poly<F>;

    fn mul(self, rhs: Self) -> Poly<F> {
        if self.is_zero() || rhs.is_zero() {
            return Poly::zero();
        }
        let mut coeffs = vec![F::zero(); self.len() + rhs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in rhs.coeffs.iter().enumerate() {
                let t = coeffs[i + j].clone() + a.clone() * b.clone();
                coeffs[i + j] = t;
            }
        }
        Poly::new(coeffs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::{rat, rat_i64, Rat};

    fn p(cs: &[i64]) -> Poly<Rat> {
        Poly::new(cs.iter().map(|&c| rat_i64(c)).collect())
    }

    #[test]
    fn test_arith() {
        let a = p(&[1, 2, 1]); // (1+z)^2
        let b = p(&[1, 1]);
        assert_eq!(&b * &b, a);
        assert_eq!(&a - &a, Poly::zero());
        assert_eq!((&a + &a).coeff(1), rat_i64(4));
    }

    #[test]
    fn test_div_rem() {
        let a = p(&[2, 0, -3, 1, 4]);
        let b = p(&[1, -1, 2]);
        let (q, r) = a.div_rem(&b);
        assert_eq!(&(&q * &b) + &r, a);
        assert!(r.degree_plus_one() < b.degree_plus_one());
    }

    #[test]
    fn test_gcd() {
        let a = &p(&[-1, 1]) * &p(&[2, 1]); // (z-1)(z+2)
        let b = &p(&[-1, 1]) * &p(&[5, 3]); // (z-1)(3z+5)
        assert_eq!(a.gcd(&b), p(&[-1, 1]));
        let (g, u, v) = a.extended_gcd(&b);
        assert_eq!(g, p(&[-1, 1]));
        assert_eq!(&(&u * &a) + &(&v * &b), g);
    }

    #[test]
    fn test_shift_compose() {
        let f = p(&[0, 0, 1]); // z^2
        assert_eq!(f.shift(&rat_i64(1)), p(&[1, 2, 1]));
        let g = p(&[3, 2]);
        assert_eq!(f.compose(&g), &g * &g);
        assert_eq!(f.shift(&rat_i64(1)).eval(&rat(1, 2)), rat(9, 4));
    }

    #[test]
    fn test_reverse_valuation() {
        let f = p(&[0, 0, 5, 7]);
        assert_eq!(f.valuation(), Some(2));
        assert_eq!(f.reverse(), p(&[7, 5]));
        assert_eq!(p(&[0]).valuation(), None);
    }

    #[test]
    fn test_derivative() {
        let f = p(&[5, 3, 0, 2]);
        assert_eq!(f.derivative(), p(&[3, 0, 6]));
    }
}
