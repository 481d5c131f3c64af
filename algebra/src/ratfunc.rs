//! Rational functions: reduced fractions of polynomials with monic
//! denominator.

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::coeff::Coeff;
use crate::poly::Poly;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "F: Serialize + serde::de::DeserializeOwned")]
pub struct RatFunc<F: Coeff> {
    num: Poly<F>,
    den: Poly<F>,
}

impl<F: Coeff> RatFunc<F> {
    pub fn new(num: Poly<F>, den: Poly<F>) -> Self {
        assert!(!den.is_zero(), "zero denominator");
        if num.is_zero() {
            return Self {
                num: Poly::zero(),
                den: Poly::one(),
            };
        }
        let g = num.gcd(&den);
        let (num, _) = num.div_rem(&g);
        let (den, _) = den.div_rem(&g);
        let c = den.lead().inverse();
        Self {
            num: num.scale(&c),
            den: den.scale(&c),
        }
    }

    pub fn from_poly(p: Poly<F>) -> Self {
        Self {
            num: p,
            den: Poly::one(),
        }
    }

    pub fn constant(c: F) -> Self {
        Self::from_poly(Poly::constant(c))
    }

    pub fn zero() -> Self {
        Self::from_poly(Poly::zero())
    }

    pub fn one() -> Self {
        Self::from_poly(Poly::one())
    }

    pub fn numer(&self) -> &Poly<F> {
        &self.num
    }

    pub fn denom(&self) -> &Poly<F> {
        &self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    /// `Some(p)` iff the fraction is a polynomial.
    pub fn as_poly(&self) -> Option<&Poly<F>> {
        (self.den.degree_plus_one() == 1).then_some(&self.num)
    }

    pub fn inverse(&self) -> Self {
        assert!(!self.is_zero(), "inverse of zero rational function");
        Self::new(self.den.clone(), self.num.clone())
    }

    pub fn derivative(&self) -> Self {
        let num = &(&self.num.derivative() * &self.den) - &(&self.num * &self.den.derivative());
        Self::new(num, &self.den * &self.den)
    }

    pub fn eval(&self, x: &F) -> Option<F> {
        let d = self.den.eval(x);
        if d.is_zero() {
            return None;
        }
        Some(self.num.eval(x) * d.inverse())
    }

    pub fn scale(&self, c: &F) -> Self {
        Self {
            num: self.num.scale(c),
            den: self.den.clone(),
        }
    }
}

impl<F: Coeff> Add for &RatFunc<F> {
    type Output = RatFunc<F>;

    fn add(self, rhs: Self) -> RatFunc<F> {
        RatFunc::new(
            &(&self.num * &rhs.den) + &(&rhs.num * &self.den),
            &self.den * &rhs.den,
        )
    }
}

impl<F: Coeff> Sub for &RatFunc<F> {
    type Output = RatFunc<F>;

    fn sub(self, rhs: Self) -> RatFunc<F> {
        self + &-rhs
    }
}

impl<F: Coeff> Neg for &RatFunc<F> {
    type Output = RatFunc<F>;

    fn neg(self) -> RatFunc<F> {
        RatFunc {
            num: -&self.num,
            den: self.den.clone(),
        }
    }
}

impl<F: Coeff> Mul for &RatFunc<F> {
    type Output = RatFunc<F>;

    fn mul(self, rhs: Self) -> RatFunc<F> {
        RatFunc::new(&self.num * &rhs.num, &self.den * &rhs.den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::{rat_i64, Rat};

    fn p(cs: &[i64]) -> Poly<Rat> {
        Poly::new(cs.iter().map(|&c| rat_i64(c)).collect())
    }

    #[test]
    fn test_reduction() {
        // (z^2 - 1) / (z - 1) = z + 1
        let f = RatFunc::new(p(&[-1, 0, 1]), p(&[-1, 1]));
        assert_eq!(f.as_poly(), Some(&p(&[1, 1])));
    }

    #[test]
    fn test_field_ops() {
        let f = RatFunc::new(p(&[1]), p(&[0, 1])); // 1/z
        let g = RatFunc::from_poly(p(&[0, 1])); // z
        assert_eq!(&f * &g, RatFunc::one());
        let s = &f + &g; // (1 + z^2)/z
        assert_eq!(s.numer(), &p(&[1, 0, 1]));
        assert_eq!(s.denom(), &p(&[0, 1]));
        assert_eq!(&s - &s, RatFunc::zero());
        assert_eq!(f.inverse(), g);
    }

    #[test]
    fn test_derivative() {
        // d/dz (1/z) = -1/z^2
        let f = RatFunc::new(p(&[1]), p(&[0, 1]));
        let d = f.derivative();
        assert_eq!(d.numer(), &p(&[-1]));
        assert_eq!(d.denom(), &p(&[0, 0, 1]));
    }
}
