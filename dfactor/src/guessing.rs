//! The guessing layer: minimal approximant bases, Hermite-Pade
//! approximants, and operator reconstruction from series coefficients.

use dfactor_algebra::coeff::Coeff;
use dfactor_algebra::poly::Poly;
use dfactor_algebra::series::Series;

use crate::dop::Dop;

/// A row basis of the module of vectors `p` with `p * F = O(z^sigma)`,
/// with its row degrees.
#[derive(Clone, Debug)]
pub struct ApproximantBasis<F: Coeff> {
    pub rows: Vec<Vec<Poly<F>>>,
    pub row_degrees: Vec<usize>,
}

impl<F: Coeff> ApproximantBasis<F> {
    /// Index of a row of minimal degree.
    pub fn min_degree_row(&self) -> usize {
        (0..self.row_degrees.len())
            .min_by_key(|&i| self.row_degrees[i])
            .expect("nonempty basis")
    }
}

/// Iterative order-basis computation: processes one order condition at a
/// time, eliminating residuals against the row of minimal degree.
pub fn minimal_approximant_basis<F: Coeff>(
    column: &[Series<F>],
    sigma: usize,
) -> ApproximantBasis<F> {
    let m = column.len();
    assert!(m > 0, "empty column");
    for f in column {
        assert!(f.order() >= sigma, "series too short for the order");
    }
    let mut rows: Vec<Vec<Poly<F>>> = (0..m)
        .map(|i| {
            (0..m)
                .map(|j| if i == j { Poly::one() } else { Poly::zero() })
                .collect()
        })
        .collect();
    let mut rdeg = vec![0usize; m];
    for k in 0..sigma {
        // Residual of each row at order k.
        let residuals: Vec<F> = rows
            .iter()
            .map(|row| {
                let mut r = F::zero();
                for (j, p) in row.iter().enumerate() {
                    for (t, c) in p.coeffs.iter().enumerate() {
                        if t > k {
                            break;
                        }
                        if !c.is_zero() {
                            r = r + c.clone() * column[j].coeff(k - t);
                        }
                    }
                }
                r
            })
            .collect();
        let nonzero: Vec<usize> = (0..m).filter(|&i| !residuals[i].is_zero()).collect();
        let Some(&pivot) = nonzero.iter().min_by_key(|&&i| rdeg[i]) else {
            continue;
        };
        let inv = residuals[pivot].inverse();
        for &i in &nonzero {
            if i == pivot {
                continue;
            }
            let f = residuals[i].clone() * inv.clone();
            for j in 0..m {
                let t = &rows[i][j] - &rows[pivot][j].scale(&f);
                rows[i][j] = t;
            }
        }
        for j in 0..m {
            rows[pivot][j] = rows[pivot][j].shift_up(1);
        }
        rdeg[pivot] += 1;
    }
    ApproximantBasis {
        rows,
        row_degrees: rdeg,
    }
}

/// Hermite-Pade approximants: the minimal-degree relation among the given
/// series at the given order.
pub fn hermite_pade_approximants<F: Coeff>(
    series: &[Series<F>],
    sigma: usize,
) -> Vec<Poly<F>> {
    let basis = minimal_approximant_basis(series, sigma);
    basis.rows[basis.min_degree_row()].clone()
}

/// Guesses an operator of order at most `order` annihilating the given
/// series coefficients. The candidate is checked against every supplied
/// coefficient before being returned.
pub fn guess<F: Coeff>(coeffs: &[F], order: usize) -> Option<Dop<F>> {
    if order == 0 || coeffs.len() <= order + 1 {
        return None;
    }
    let f = Series::new(coeffs.to_vec());
    let sigma = coeffs.len() - order;
    let mut column = Vec::with_capacity(order + 1);
    let mut der = f.clone();
    for i in 0..=order {
        if i > 0 {
            der = der.derivative();
        }
        column.push(der.truncated(sigma));
    }
    let basis = minimal_approximant_basis(&column, sigma);
    // A genuine relation leaves a visible degree gap; balanced degrees
    // mean the basis only fitted the truncation.
    let max_deg = *basis.row_degrees.iter().max().expect("nonempty");
    let min_deg = *basis.row_degrees.iter().min().expect("nonempty");
    if max_deg <= 1 + min_deg {
        return None;
    }
    let row = &basis.rows[basis.min_degree_row()];
    let cand = Dop::new(row.clone());
    if cand.is_zero() || cand.order() == 0 {
        return None;
    }
    let check = cand.apply_series(&f);
    (check.order() > 0 && check.is_zero()).then_some(cand)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfactor_algebra::rational::{rat, rat_i64, Rat};

    fn p(cs: &[i64]) -> Poly<Rat> {
        Poly::new(cs.iter().map(|&c| rat_i64(c)).collect())
    }

    /// exp(2z) truncated.
    fn exp2(n: usize) -> Vec<Rat> {
        let mut out = vec![rat_i64(1)];
        for k in 1..n {
            let prev = out[k - 1].clone();
            out.push(prev * rat(2, k as i64));
        }
        out
    }

    #[test]
    fn test_guess_exponential() {
        let r = guess(&exp2(20), 1).expect("found operator");
        // D - 2 up to normalization.
        assert_eq!(r.normalized(), Dop::new(vec![p(&[-2]), p(&[1])]));
    }

    #[test]
    fn test_guess_geometric() {
        // 1/(1-z): (z-1)D + 1 annihilates it.
        let coeffs: Vec<Rat> = (0..20).map(|_| rat_i64(1)).collect();
        let r = guess(&coeffs, 1).expect("found operator");
        assert_eq!(r.normalized(), Dop::new(vec![p(&[1]), p(&[-1, 1])]));
    }

    #[test]
    fn test_guess_rejects_noise() {
        // A generic sequence of growing factorials is not annihilated at
        // order 1 with tiny degrees.
        let coeffs: Vec<Rat> = (0..8).map(|k| rat_i64((k * k * k + 7) as i64)).collect();
        assert!(guess(&coeffs, 1).is_none());
    }

    #[test]
    fn test_hermite_pade_relation() {
        // Column (f, f') for f = exp(2z): relation (-2, 1).
        let f = Series::new(exp2(16));
        let col = vec![f.truncated(12), f.derivative().truncated(12)];
        let rel = hermite_pade_approximants(&col, 12);
        // rel[0]*f + rel[1]*f' = O(z^12) means rel ~ (-2, 1) up to scale.
        let combo = f
            .mul_trunc(&Series::new(rel[0].coeffs.clone()), 10)
            .add(&f.derivative().mul_trunc(&Series::new(rel[1].coeffs.clone()), 10));
        assert!(combo.is_zero());
    }

    #[test]
    fn test_min_basis_row_degrees() {
        // For the column (1, z) at order 4: the relation z*1 - 1*z = 0
        // keeps one row degree small.
        let one = Series::new(vec![rat_i64(1), rat_i64(0), rat_i64(0), rat_i64(0)]);
        let z = Series::new(vec![rat_i64(0), rat_i64(1), rat_i64(0), rat_i64(0)]);
        let basis = minimal_approximant_basis(&[one, z], 4);
        let min = *basis.row_degrees.iter().min().unwrap();
        assert!(min <= 2);
        // Every basis row really annihilates the column to order 4.
        for row in &basis.rows {
            let mut acc = Series::zero(4);
            let col = [
                Series::new(vec![rat_i64(1), rat_i64(0), rat_i64(0), rat_i64(0)]),
                Series::new(vec![rat_i64(0), rat_i64(1), rat_i64(0), rat_i64(0)]),
            ];
            for (j, pcoef) in row.iter().enumerate() {
                acc = acc.add(&col[j].mul_trunc(&Series::new(pcoef.coeffs.clone()), 4));
            }
            assert!(acc.is_zero(), "row fails: {row:?}");
        }
    }
}
