//! Complex balls with exact dyadic midpoints.
//!
//! A ball is a complex disc `mid ± rad` whose midpoint components and
//! radius are exact rationals. Arithmetic rounds the midpoint back to the
//! working precision and absorbs the rounding error into the radius, so
//! every enclosure is rigorous. The *customized accuracy* of a ball is the
//! number of correct leading bits of the midpoint relative to its
//! magnitude.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num::{Signed, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::coeff::Coeff;
use crate::rational::{
    dyadic_round, log2_lower, log2_upper, nearby_rational, round_rad_up, sqrt_lower, sqrt_upper,
    Rat,
};

/// Precision value meaning "inherit from the other operand".
pub const PREC_UNSET: u32 = u32::MAX;

/// A numeric sub-operation could not reach the requested accuracy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrecisionError;

impl fmt::Display for PrecisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "insufficient working precision")
    }
}

impl std::error::Error for PrecisionError {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CBall {
    pub re: Rat,
    pub im: Rat,
    pub rad: Rat,
    pub prec: u32,
}

impl CBall {
    pub fn new(re: Rat, im: Rat, prec: u32) -> Self {
        CBall {
            re,
            im,
            rad: Rat::zero(),
            prec,
        }
        .rounded()
    }

    /// An exact ball: midpoint kept verbatim, radius zero.
    pub fn exact(re: Rat, im: Rat, prec: u32) -> Self {
        CBall {
            re,
            im,
            rad: Rat::zero(),
            prec,
        }
    }

    pub fn from_rat(q: &Rat, prec: u32) -> Self {
        Self::exact(q.clone(), Rat::zero(), prec)
    }

    pub fn zero(prec: u32) -> Self {
        Self::exact(Rat::zero(), Rat::zero(), prec)
    }

    pub fn one(prec: u32) -> Self {
        Self::exact(Rat::one(), Rat::zero(), prec)
    }

    /// Re-targets the working precision (and rounds accordingly).
    pub fn at_prec(mut self, prec: u32) -> Self {
        self.prec = prec;
        self.rounded()
    }

    pub fn with_rad(mut self, rad: Rat) -> Self {
        debug_assert!(!rad.is_negative());
        self.rad = rad;
        self
    }

    pub fn add_error(mut self, err: &Rat) -> Self {
        self.rad += err;
        self.rounded()
    }

    /// Rounds the midpoint to the working precision, growing the radius by
    /// the exact rounding error.
    pub fn rounded(self) -> Self {
        if self.prec == PREC_UNSET {
            return self;
        }
        let (re, e1) = dyadic_round(&self.re, self.prec + 2);
        let (im, e2) = dyadic_round(&self.im, self.prec + 2);
        let rad = if self.rad.is_zero() && e1.is_zero() && e2.is_zero() {
            Rat::zero()
        } else {
            round_rad_up(&(&self.rad + e1 + e2))
        };
        CBall {
            re,
            im,
            rad,
            prec: self.prec,
        }
    }

    pub fn mid_is_zero(&self) -> bool {
        self.re.is_zero() && self.im.is_zero()
    }

    /// Whether the disc contains the origin.
    pub fn contains_zero(&self) -> bool {
        &self.re * &self.re + &self.im * &self.im <= &self.rad * &self.rad
    }

    /// Whether the disc contains the exact point `re + i*im`.
    pub fn contains_point(&self, re: &Rat, im: &Rat) -> bool {
        let dr = &self.re - re;
        let di = &self.im - im;
        &dr * &dr + &di * &di <= &self.rad * &self.rad
    }

    /// Whether the imaginary part can vanish inside the disc.
    pub fn imag_contains_zero(&self) -> bool {
        self.im.abs() <= self.rad
    }

    /// Upper bound on the modulus of the midpoint.
    pub fn mid_modulus_upper(&self) -> Rat {
        sqrt_upper(&(&self.re * &self.re + &self.im * &self.im), 32)
    }

    /// Lower bound on the modulus of the midpoint.
    pub fn mid_modulus_lower(&self) -> Rat {
        sqrt_lower(&(&self.re * &self.re + &self.im * &self.im), 32)
    }

    /// Upper bound on the modulus over the whole disc.
    pub fn modulus_upper(&self) -> Rat {
        self.mid_modulus_upper() + &self.rad
    }

    pub fn conj(&self) -> Self {
        CBall {
            re: self.re.clone(),
            im: -self.im.clone(),
            rad: self.rad.clone(),
            prec: self.prec,
        }
    }

    pub fn neg(&self) -> Self {
        CBall {
            re: -self.re.clone(),
            im: -self.im.clone(),
            rad: self.rad.clone(),
            prec: self.prec,
        }
    }

    pub fn add(&self, rhs: &Self) -> Self {
        CBall {
            re: &self.re + &rhs.re,
            im: &self.im + &rhs.im,
            rad: &self.rad + &rhs.rad,
            prec: self.prec.min(rhs.prec),
        }
        .rounded()
    }

    pub fn sub(&self, rhs: &Self) -> Self {
        self.add(&rhs.neg())
    }

    pub fn mul(&self, rhs: &Self) -> Self {
        let re = &self.re * &rhs.re - &self.im * &rhs.im;
        let im = &self.re * &rhs.im + &self.im * &rhs.re;
        let rad = self.mid_modulus_upper() * &rhs.rad
            + rhs.mid_modulus_upper() * &self.rad
            + &self.rad * &rhs.rad;
        CBall {
            re,
            im,
            rad,
            prec: self.prec.min(rhs.prec),
        }
        .rounded()
    }

    pub fn scale(&self, q: &Rat) -> Self {
        CBall {
            re: &self.re * q,
            im: &self.im * q,
            rad: &self.rad * q.abs(),
            prec: self.prec,
        }
        .rounded()
    }

    /// Inverts the ball; fails when the disc comes too close to zero.
    pub fn inverse(&self) -> Result<Self, PrecisionError> {
        let low = self.mid_modulus_lower();
        if low <= self.rad {
            return Err(PrecisionError);
        }
        let m2 = &self.re * &self.re + &self.im * &self.im;
        let re = &self.re / &m2;
        let im = -&self.im / &m2;
        // |1/z - 1/m| <= rad / (low * (low - rad)) over the disc.
        let rad = &self.rad / (&low * (&low - &self.rad));
        Ok(CBall {
            re,
            im,
            rad,
            prec: self.prec,
        }
        .rounded())
    }

    pub fn div(&self, rhs: &Self) -> Result<Self, PrecisionError> {
        Ok(self.mul(&rhs.inverse()?))
    }

    /// Smallest-denominator rational inside the real trace of the disc.
    pub fn nearby_rational_real(&self, max_err: &Rat) -> Rat {
        nearby_rational(&self.re, max_err)
    }
}

impl fmt::Display for CBall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let re = self.re.to_f64().unwrap_or(f64::NAN);
        let im = self.im.to_f64().unwrap_or(f64::NAN);
        let rad = self.rad.to_f64().unwrap_or(f64::NAN);
        write!(f, "[{re:.6e} + {im:.6e}*I +/- {rad:.2e}]")
    }
}

impl Add for CBall {
    type Output = CBall;

    fn add(self, rhs: Self) -> CBall {
        CBall::add(&self, &rhs)
    }
}

impl Sub for CBall {
    type Output = CBall;

    fn sub(self, rhs: Self) -> CBall {
        CBall::sub(&self, &rhs)
    }
}

impl Mul for CBall {
    type Output = CBall;

    fn mul(self, rhs: Self) -> CBall {
        CBall::mul(&self, &rhs)
    }
}

impl Neg for CBall {
    type Output = CBall;

    fn neg(self) -> CBall {
        CBall::neg(&self)
    }
}

/// Balls form a (partial) coefficient field: inversion fails on discs
/// containing zero, and equality is structural. This powers the generic
/// polynomial and matrix code; rigorous zero tests go through
/// [`CBall::contains_zero`] instead.
impl Coeff for CBall {
    fn zero() -> Self {
        CBall::zero(PREC_UNSET)
    }

    fn one() -> Self {
        CBall::one(PREC_UNSET)
    }

    fn is_zero(&self) -> bool {
        self.mid_is_zero() && self.rad.is_zero()
    }

    fn from_rat(q: Rat) -> Self {
        CBall::exact(q, Rat::zero(), PREC_UNSET)
    }

    fn try_inverse(&self) -> Option<Self> {
        self.inverse().ok()
    }

    fn as_rat(&self) -> Option<Rat> {
        None
    }

    fn embed(&self, _prec: u32) -> CBall {
        self.clone()
    }
}

/// Correct leading bits of a ball quantity relative to its magnitude,
/// clamped to `[0, prec]`; compound structures take the minimum over their
/// scalar entries.
pub trait Accuracy {
    fn customized_accuracy(&self) -> u32;
}

impl Accuracy for CBall {
    fn customized_accuracy(&self) -> u32 {
        if self.mid_is_zero() {
            return self.prec;
        }
        if self.rad.is_zero() {
            return self.prec;
        }
        let mid_mag = self.re.abs().max(self.im.abs());
        let acc = log2_lower(&mid_mag) - log2_upper(&self.rad);
        acc.clamp(0, self.prec as i64) as u32
    }
}

impl Accuracy for [CBall] {
    fn customized_accuracy(&self) -> u32 {
        self.iter()
            .map(Accuracy::customized_accuracy)
            .min()
            .unwrap_or(0)
    }
}

impl Accuracy for Vec<CBall> {
    fn customized_accuracy(&self) -> u32 {
        self.as_slice().customized_accuracy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::{pow2, rat, rat_i64};

    fn ball(n: i64, d: i64, prec: u32) -> CBall {
        CBall::from_rat(&rat(n, d), prec)
    }

    #[test]
    fn test_add_mul_enclosure() {
        let a = ball(1, 3, 64).with_rad(pow2(-40));
        let b = ball(2, 7, 64).with_rad(pow2(-40));
        let s = a.add(&b);
        assert!(s.contains_point(&rat(13, 21), &Rat::zero()));
        let p = a.mul(&b);
        assert!(p.contains_point(&rat(2, 21), &Rat::zero()));
    }

    #[test]
    fn test_inverse() {
        let a = ball(3, 1, 64).with_rad(pow2(-30));
        let inv = a.inverse().unwrap();
        assert!(inv.contains_point(&rat(1, 3), &Rat::zero()));
        let tight = a.mul(&inv);
        assert!(tight.contains_point(&rat_i64(1), &Rat::zero()));
        // A ball straddling zero cannot be inverted.
        let z = CBall::zero(64).with_rad(pow2(-10));
        assert_eq!(z.inverse(), Err(PrecisionError));
    }

    #[test]
    fn test_customized_accuracy() {
        let exact = ball(5, 2, 100);
        assert_eq!(exact.customized_accuracy(), 100);
        let fuzzy = ball(1, 1, 100).with_rad(pow2(-20));
        let acc = fuzzy.customized_accuracy();
        assert!((18..=22).contains(&acc), "acc = {acc}");
        let zero_mid = CBall::zero(100).with_rad(rat(1, 2));
        assert_eq!(zero_mid.customized_accuracy(), 100);
    }

    #[test]
    fn test_contains_zero() {
        assert!(CBall::zero(64).contains_zero());
        assert!(ball(1, 1000, 64).with_rad(rat(1, 100)).contains_zero());
        assert!(!ball(1, 2, 64).with_rad(rat(1, 100)).contains_zero());
    }

    #[test]
    fn test_rounding_is_rigorous() {
        // 1/3 is not dyadic: rounding must produce a nonzero radius
        // covering the true value.
        let a = CBall::new(rat(1, 3), Rat::zero(), 24);
        assert!(a.contains_point(&rat(1, 3), &Rat::zero()));
        assert!(!a.rad.is_zero());
    }
}
