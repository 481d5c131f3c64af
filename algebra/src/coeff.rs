//! The coefficient-field abstraction.
//!
//! Everything downstream (polynomials, operators, series) is generic over a
//! `Coeff`: an exact field of characteristic zero together with a
//! complex-ball embedding. The two implementations are `Rat` (the hot
//! path) and `NfElem` (embedded number fields).

use std::fmt::{Debug, Display};
use std::ops::{Add, Mul, Neg, Sub};

use num::{One, Zero};

use crate::ball::CBall;
use crate::rational::Rat;

pub trait Coeff:
    Sized
    + Clone
    + PartialEq
    + Debug
    + Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
{
    fn zero() -> Self;
    fn one() -> Self;
    fn is_zero(&self) -> bool;

    fn is_one(&self) -> bool {
        *self == Self::one()
    }

    fn from_rat(q: Rat) -> Self;

    fn from_i64(n: i64) -> Self {
        Self::from_rat(Rat::from_integer(n.into()))
    }

    /// The multiplicative inverse, or `None` for zero.
    fn try_inverse(&self) -> Option<Self>;

    fn inverse(&self) -> Self {
        self.try_inverse().expect("inverse of zero")
    }

    fn div(self, rhs: &Self) -> Self {
        self * rhs.inverse()
    }

    /// `Some(q)` iff the element lies in the prime field.
    fn as_rat(&self) -> Option<Rat>;

    /// Image of the element under the distinguished complex embedding.
    fn embed(&self, prec: u32) -> CBall;

    /// Denominator of the element over `Z` (an lcm basis for clearing
    /// denominators in coefficient sequences).
    fn denom(&self) -> num::BigInt {
        num::BigInt::from(1)
    }

    /// Integer content of the element (a gcd basis; zero for zero).
    fn int_content(&self) -> num::BigInt {
        if self.is_zero() {
            num::BigInt::from(0)
        } else {
            num::BigInt::from(1)
        }
    }

    /// Deterministic sign used to pick a canonical unit (`1` or `-1`).
    fn sign_hint(&self) -> i32 {
        1
    }
}

impl Coeff for Rat {
    fn zero() -> Self {
        <Rat as Zero>::zero()
    }

    fn one() -> Self {
        <Rat as One>::one()
    }

    fn is_zero(&self) -> bool {
        <Rat as Zero>::is_zero(self)
    }

    fn from_rat(q: Rat) -> Self {
        q
    }

    fn try_inverse(&self) -> Option<Self> {
        if <Rat as Zero>::is_zero(self) {
            None
        } else {
            Some(self.recip())
        }
    }

    fn as_rat(&self) -> Option<Rat> {
        Some(self.clone())
    }

    fn embed(&self, prec: u32) -> CBall {
        CBall::from_rat(self, prec)
    }

    fn denom(&self) -> num::BigInt {
        Rat::denom(self).clone()
    }

    fn int_content(&self) -> num::BigInt {
        use num::Signed;
        Rat::numer(self).abs()
    }

    fn sign_hint(&self) -> i32 {
        use num::Signed;
        if self.is_negative() {
            -1
        } else {
            1
        }
    }
}
