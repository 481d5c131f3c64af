//! Exact rational helpers on top of `num`.
//!
//! Everything numeric in this crate bottoms out in `BigRational`: exact
//! field arithmetic, dyadic rounding for the ball layer, and the
//! smallest-denominator search used for rational recognition.

use num::bigint::Sign;
use num::integer::Roots;
use num::{BigInt, BigRational, One, Signed, Zero};

pub type Rat = BigRational;

pub fn rat_i64(n: i64) -> Rat {
    Rat::from_integer(BigInt::from(n))
}

pub fn rat(n: i64, d: i64) -> Rat {
    Rat::new(BigInt::from(n), BigInt::from(d))
}

/// `2^e` as an exact rational, for any sign of `e`.
pub fn pow2(e: i64) -> Rat {
    let one = BigInt::one();
    if e >= 0 {
        Rat::from_integer(one << e as usize)
    } else {
        Rat::new(one.clone(), one << (-e) as usize)
    }
}

pub fn factorial(n: usize) -> BigInt {
    let mut out = BigInt::one();
    for k in 2..=n {
        out *= BigInt::from(k);
    }
    out
}

pub fn binomial(n: usize, k: usize) -> BigInt {
    if k > n {
        return BigInt::zero();
    }
    let k = k.min(n - k);
    let mut out = BigInt::one();
    for i in 0..k {
        out = out * BigInt::from(n - i) / BigInt::from(i + 1);
    }
    out
}

fn bitlen(x: &BigInt) -> i64 {
    x.bits() as i64
}

/// A lower bound on `log2(|x|)`, exact to within one bit. Panics on zero.
pub fn log2_lower(x: &Rat) -> i64 {
    assert!(!x.is_zero());
    bitlen(x.numer()) - bitlen(x.denom()) - 1
}

/// An upper bound on `log2(|x|)`, exact to within one bit. Panics on zero.
pub fn log2_upper(x: &Rat) -> i64 {
    assert!(!x.is_zero());
    bitlen(x.numer()) - bitlen(x.denom())
}

/// Rounds `x` to a dyadic rational with roughly `bits` significant bits.
/// Returns the rounded value and the exact absolute rounding error.
pub fn dyadic_round(x: &Rat, bits: u32) -> (Rat, Rat) {
    if x.is_zero() {
        return (Rat::zero(), Rat::zero());
    }
    let t = bits as i64 - log2_upper(x);
    let scaled = x * pow2(t);
    let m = scaled.round().to_integer();
    let rounded = Rat::from_integer(m) * pow2(-t);
    let err = (x - &rounded).abs();
    (rounded, err)
}

const RAD_BITS: u32 = 10;
static_assertions::const_assert!(RAD_BITS <= 32);

/// Rounds a nonnegative radius *up* to a coarse dyadic, so that radius
/// denominators stay small across long computations.
pub fn round_rad_up(x: &Rat) -> Rat {
    assert!(!x.is_negative());
    if x.is_zero() {
        return Rat::zero();
    }
    let t = RAD_BITS as i64 - log2_upper(x);
    let m = (x * pow2(t)).ceil().to_integer();
    Rat::from_integer(m) * pow2(-t)
}

/// An upper bound on `sqrt(x)` with roughly `bits` fractional bits.
pub fn sqrt_upper(x: &Rat, bits: u32) -> Rat {
    assert!(!x.is_negative());
    if x.is_zero() {
        return Rat::zero();
    }
    let t = bits as i64;
    let n = (x * pow2(2 * t)).ceil().to_integer();
    Rat::from_integer(n.sqrt() + BigInt::one()) * pow2(-t)
}

/// A lower bound on `sqrt(x)` with roughly `bits` fractional bits.
pub fn sqrt_lower(x: &Rat, bits: u32) -> Rat {
    assert!(!x.is_negative());
    if x.is_zero() {
        return Rat::zero();
    }
    let t = bits as i64;
    let n = (x * pow2(2 * t)).floor().to_integer();
    if n.sign() == Sign::Minus {
        return Rat::zero();
    }
    Rat::from_integer(n.sqrt()) * pow2(-t)
}

/// The rational with smallest denominator (then smallest numerator) in
/// `[x - max_err, x + max_err]`.
pub fn nearby_rational(x: &Rat, max_err: &Rat) -> Rat {
    assert!(!max_err.is_negative());
    simplest_in(x - max_err, x + max_err)
}

fn simplest_in(lo: Rat, hi: Rat) -> Rat {
    debug_assert!(lo <= hi);
    if !lo.is_positive() && !hi.is_negative() {
        Rat::zero()
    } else if hi.is_negative() {
        -simplest_pos(-hi, -lo)
    } else {
        simplest_pos(lo, hi)
    }
}

// Continued-fraction walk: 0 < lo <= hi.
fn simplest_pos(lo: Rat, hi: Rat) -> Rat {
    let c = lo.ceil();
    if c <= hi {
        return c;
    }
    let n = lo.floor();
    let inv_hi = (hi - &n).recip();
    let inv_lo = (lo - &n).recip();
    n + simplest_pos(inv_hi, inv_lo).recip()
}
