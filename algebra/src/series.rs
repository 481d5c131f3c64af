//! Truncated power series over a coefficient field.
//!
//! A series carries exactly `len` known coefficients; the truncation
//! order is implicit in the length.

use serde::{Deserialize, Serialize};

use crate::coeff::Coeff;
use crate::poly::Poly;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "F: Serialize + serde::de::DeserializeOwned")]
pub struct Series<F: Coeff> {
    pub coeffs: Vec<F>,
}

impl<F: Coeff> Series<F> {
    pub fn new(coeffs: Vec<F>) -> Self {
        Series { coeffs }
    }

    pub fn zero(order: usize) -> Self {
        Series {
            coeffs: vec![F::zero(); order],
        }
    }

    pub fn order(&self) -> usize {
        self.coeffs.len()
    }

    pub fn coeff(&self, k: usize) -> F {
        self.coeffs.get(k).cloned().unwrap_or_else(F::zero)
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(F::is_zero)
    }

    /// Index of the first nonzero known coefficient.
    pub fn valuation(&self) -> Option<usize> {
        self.coeffs.iter().position(|c| !c.is_zero())
    }

    pub fn truncated(&self, n: usize) -> Self {
        Series {
            coeffs: self.coeffs[..n.min(self.coeffs.len())].to_vec(),
        }
    }

    /// The known coefficients as a polynomial.
    pub fn to_poly(&self) -> Poly<F> {
        Poly::new(self.coeffs.clone())
    }

    pub fn derivative(&self) -> Self {
        if self.coeffs.is_empty() {
            return self.clone();
        }
        Series {
            coeffs: self
                .coeffs
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, c)| c.clone() * F::from_i64(i as i64))
                .collect(),
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        let n = self.order().min(other.order());
        Series {
            coeffs: (0..n).map(|i| self.coeff(i) + other.coeff(i)).collect(),
        }
    }

    pub fn scale(&self, c: &F) -> Self {
        Series {
            coeffs: self.coeffs.iter().map(|x| x.clone() * c.clone()).collect(),
        }
    }

    pub fn mul_trunc(&self, other: &Self, n: usize) -> Self {
        let mut coeffs = vec![F::zero(); n];
        for (i, a) in self.coeffs.iter().enumerate().take(n) {
            if a.is_zero() {
                continue;
            }
            for (j, b) in other.coeffs.iter().enumerate() {
                if i + j >= n {
                    break;
                }
                let t = coeffs[i + j].clone() + a.clone() * b.clone();
                coeffs[i + j] = t;
            }
        }
        Series { coeffs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::{rat, rat_i64, Rat};

    fn s(cs: &[i64]) -> Series<Rat> {
        Series::new(cs.iter().map(|&c| rat_i64(c)).collect())
    }

    #[test]
    fn test_mul_trunc() {
        // (1 + z)(1 - z) = 1 - z^2
        let a = s(&[1, 1, 0, 0]);
        let b = s(&[1, -1, 0, 0]);
        assert_eq!(a.mul_trunc(&b, 4), s(&[1, 0, -1, 0]));
    }

    #[test]
    fn test_derivative_valuation() {
        let f = s(&[0, 0, 3, 4]);
        assert_eq!(f.valuation(), Some(2));
        assert_eq!(f.derivative(), s(&[0, 6, 12]));
        assert_eq!(f.derivative().coeff(1), rat(6, 1));
    }
}
