//! Invariant-subspace strategies over the monodromy generators.
//!
//! Three strategies are tried in order: one-dimensional eigenspaces of a
//! random combination, a simple eigenvalue (with its adjoint dual), and
//! the general invariant-subspace search for multiple eigenvalues.

use log::debug;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use dfactor_algebra::ball::{Accuracy, CBall, PrecisionError};
use dfactor_algebra::coeff::Coeff;
use dfactor_algebra::matrix::{eigenspace, gen_eigenspaces, invariant_subspace, CMat, Mat};
use dfactor_algebra::numberfield::{FieldRegistry, NfElem};
use dfactor_algebra::ratfunc::RatFunc;
use dfactor_algebra::rational::{factorial, Rat};

use crate::annihilator::{annihilator, AnnOutcome};
use crate::dop::Dop;

pub type K = NfElem;

/// Outcome of one strategy attempt.
#[derive(Clone, Debug)]
pub enum SubOutcome {
    Factor(Dop<K>),
    Irreducible,
    NotGoodConditions,
    Inconclusive,
}

/// A random combination `sum r_i M_i` with Gaussian-rational weights of
/// bit size bounded by the common accuracy.
pub fn random_combination(
    mono: &[CMat],
    rng: &mut ChaCha8Rng,
) -> Result<CMat, PrecisionError> {
    let prec = mono.customized_accuracy();
    if prec < 10 {
        return Err(PrecisionError);
    }
    let bits = prec.min(48);
    let n = mono[0].nrows();
    let mut acc = Mat::zeros(n, n);
    for m in mono {
        let coeff = CBall::exact(random_rat(rng, bits), random_rat(rng, bits), prec);
        acc = acc.add(&m.map(|b| b.mul(&coeff)));
    }
    Ok(acc)
}

fn random_rat(rng: &mut ChaCha8Rng, bits: u32) -> Rat {
    let span = 1i64 << bits.min(40);
    let num = rng.gen_range(-span..=span);
    let den = rng.gen_range(1..=span);
    Rat::new(num.into(), den.into())
}

/// Strategy 1: every eigenspace of a random combination is a line.
pub fn one_dimensional_eigenspaces(
    dop: &Dop<K>,
    mono: &[CMat],
    order: usize,
    bound: i64,
    alg_degree: usize,
    rng: &mut ChaCha8Rng,
    registry: &mut FieldRegistry,
) -> Result<SubOutcome, PrecisionError> {
    let mat = random_combination(mono, rng)?;
    let prec = mono.customized_accuracy();
    let spaces = gen_eigenspaces(&mat, prec)?;
    let mut conclusive = true;
    for space in &spaces {
        let eig = eigenspace(&mat, &space.eigenvalue, prec)?;
        if eig.len() > 1 {
            return Ok(SubOutcome::NotGoodConditions);
        }
        if eig.is_empty() {
            return Err(PrecisionError);
        }
        match annihilator(dop, &eig[0], order, bound, alg_degree, Some(mono), registry)? {
            AnnOutcome::Factor(r) => return Ok(SubOutcome::Factor(r)),
            AnnOutcome::Whole => {}
            AnnOutcome::Inconclusive => conclusive = false,
        }
    }
    if conclusive {
        Ok(SubOutcome::Irreducible)
    } else {
        Ok(SubOutcome::Inconclusive)
    }
}

/// Strategy 2: one eigenvalue of algebraic multiplicity one, with the
/// dual (adjoint) problem as a second chance.
pub fn simple_eigenvalue(
    dop: &Dop<K>,
    mono: &[CMat],
    order: usize,
    bound: i64,
    alg_degree: usize,
    rng: &mut ChaCha8Rng,
    registry: &mut FieldRegistry,
) -> Result<SubOutcome, PrecisionError> {
    let mat = random_combination(mono, rng)?;
    let prec = mono.customized_accuracy();
    let spaces = gen_eigenspaces(&mat, prec)?;
    let mut goodconditions = false;
    for space in &spaces {
        if space.multiplicity != 1 {
            continue;
        }
        goodconditions = true;
        let ic = space.basis[0].clone();
        let primal = annihilator(dop, &ic, order, bound, alg_degree, Some(mono), registry)?;
        if let AnnOutcome::Factor(r) = &primal {
            return Ok(SubOutcome::Factor(r.clone()));
        }
        // Dual problem on the formal adjoint.
        let adj_dop = dop.adjoint().normalized();
        let q = match transition_matrix_for_adjoint(dop) {
            Some(q) => q,
            None => return Ok(SubOutcome::Inconclusive),
        };
        let qb = q.map(|c| c.embed(prec));
        let qb_inv = qb.inverse_ball()?;
        let adj_mat = qb.mul(&mat.transpose()).mul(&qb_inv);
        let adj_mono: Vec<CMat> = mono
            .iter()
            .map(|m| qb.mul(&m.transpose()).mul(&qb_inv))
            .collect();
        let eig = eigenspace(&adj_mat, &space.eigenvalue, prec)?;
        if eig.is_empty() {
            return Ok(SubOutcome::Inconclusive);
        }
        if eig.len() > 1 {
            break;
        }
        let dual = annihilator(
            &adj_dop,
            &eig[0],
            order,
            bound,
            alg_degree,
            Some(&adj_mono),
            registry,
        )?;
        match (&primal, &dual) {
            (_, AnnOutcome::Factor(radj)) => {
                if let Some(quotient) = adj_dop.exact_div(radj) {
                    let back = quotient.clear_denominators().adjoint().normalized();
                    if back.order() > 0
                        && back.order() < dop.order()
                        && dop.is_divisible_by(&back)
                    {
                        debug!("simple eigenvalue: factor recovered through the adjoint");
                        return Ok(SubOutcome::Factor(back));
                    }
                }
                return Ok(SubOutcome::Inconclusive);
            }
            (AnnOutcome::Whole, AnnOutcome::Whole) => return Ok(SubOutcome::Irreducible),
            _ => break,
        }
    }
    if goodconditions {
        Ok(SubOutcome::Inconclusive)
    } else {
        Ok(SubOutcome::NotGoodConditions)
    }
}

/// Strategy 3: general invariant-subspace search.
pub fn multiple_eigenvalue(
    dop: &Dop<K>,
    mono: &[CMat],
    order: usize,
    bound: i64,
    alg_degree: usize,
    registry: &mut FieldRegistry,
) -> Result<SubOutcome, PrecisionError> {
    let prec = mono.customized_accuracy();
    let Some(basis) = invariant_subspace(mono, prec)? else {
        return Ok(SubOutcome::Irreducible);
    };
    match annihilator(dop, &basis[0], order, bound, alg_degree, Some(mono), registry)? {
        AnnOutcome::Factor(r) if r.order() < dop.order() => Ok(SubOutcome::Factor(r)),
        _ => Ok(SubOutcome::Inconclusive),
    }
}

/// The constant matrix `Q = Delta * P(0) * Delta` relating the local
/// bases of an operator and its adjoint: transporting a monodromy matrix
/// `M` of `dop` gives `Q * M^T * Q^{-1}` for the adjoint. Assumes the
/// origin is an ordinary point.
pub fn transition_matrix_for_adjoint(dop: &Dop<K>) -> Option<Mat<K>> {
    let r = dop.order();
    if r == 0 {
        return None;
    }
    // Companion matrix of the monic form, transposed.
    let lead = RatFunc::from_poly(dop.lead());
    let mut at = vec![vec![RatFunc::<K>::zero(); r]; r];
    for i in 0..r.saturating_sub(1) {
        // A[i][i+1] = 1 -> A^T[i+1][i] = 1.
        at[i + 1][i] = RatFunc::one();
    }
    for j in 0..r {
        // A[r-1][j] = -a_j / a_r -> A^T[j][r-1].
        let c = &RatFunc::from_poly(dop.coeff(j)) * &lead.inverse();
        at[j][r - 1] = -&c;
    }
    // P_k = P_{k-1}' - P_{k-1} * A^T, P_0 = I; P stacks the last rows.
    let mut pk: Vec<Vec<RatFunc<K>>> = (0..r)
        .map(|i| {
            (0..r)
                .map(|j| {
                    if i == j {
                        RatFunc::one()
                    } else {
                        RatFunc::zero()
                    }
                })
                .collect()
        })
        .collect();
    let mut last_rows: Vec<Vec<RatFunc<K>>> = vec![pk[r - 1].clone()];
    for _ in 1..r {
        let mut next = vec![vec![RatFunc::<K>::zero(); r]; r];
        for i in 0..r {
            for j in 0..r {
                let mut acc = pk[i][j].derivative();
                for t in 0..r {
                    acc = &acc - &(&pk[i][t] * &at[t][j]);
                }
                next[i][j] = acc;
            }
        }
        pk = next;
        last_rows.push(pk[r - 1].clone());
    }
    // Evaluate at the (ordinary) origin and sandwich with diag(1/k!).
    let zero = <K as Coeff>::zero();
    let mut p0 = Mat::zeros(r, r);
    for i in 0..r {
        for j in 0..r {
            *p0.entry_mut(i, j) = last_rows[i][j].eval(&zero)?;
        }
    }
    let mut q = p0;
    for i in 0..r {
        let di = K::from_rat(Rat::new(1.into(), factorial(i)));
        for j in 0..r {
            let dj = K::from_rat(Rat::new(1.into(), factorial(j)));
            let t = q.entry(i, j).clone() * di.clone() * dj;
            *q.entry_mut(i, j) = t;
        }
    }
    Some(q)
}

/// `ceil(log10(max_i cond(M_i)))`, the condition-number report logged
/// after a conclusive monodromy method; `None` when a matrix is
/// numerically singular.
pub fn condition_number_digits(mono: &[CMat]) -> Option<i64> {
    let mut best: Option<Rat> = None;
    for m in mono {
        let inv = m.inverse_ball().ok()?;
        let c = m.frobenius_upper() * inv.frobenius_upper();
        if best.as_ref().map_or(true, |b| &c > b) {
            best = Some(c);
        }
    }
    let c = best?;
    if c <= Rat::from_integer(1.into()) {
        return Some(0);
    }
    // log10(c) = log2(c) * log10(2), with log10(2) ~ 0.30103.
    let bits = dfactor_algebra::rational::log2_upper(&c).max(0);
    Some((bits * 30_103 + 99_999) / 100_000)
}
