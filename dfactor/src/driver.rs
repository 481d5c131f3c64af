//! The recursive driver: `right_factor` and `factor`.
//!
//! The monodromy pipeline is an iterative retry loop whose variant
//! `(precision, order, alg_degree)` grows monotonically toward the
//! caller-configured caps; hitting every cap surfaces
//! `PrecisionExhausted`. Every returned factor has been verified by
//! exact right division.

use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use dfactor_algebra::ball::PrecisionError;
use dfactor_algebra::coeff::Coeff;
use dfactor_algebra::numberfield::{FieldRegistry, NfElem};
use dfactor_algebra::rational::Rat;

use crate::dop::{Dop, RatDop};
use crate::error::FactorError;
use crate::guessing::minimal_approximant_basis;
use crate::monodromy::{compute_monodromy, MonoData, MonoOutcome, MonodromyEngine};
use crate::normalize::normalize;
use crate::shortcut::{try_rational, try_van_hoeij};
use crate::spectral::degree_bound_for_right_factor;
use crate::subspace::{
    condition_number_digits, multiple_eigenvalue, one_dimensional_eigenspaces, simple_eigenvalue,
    SubOutcome,
};

pub type K = NfElem;

/// Caller-configurable resource ceilings and the PRNG seed.
#[derive(Clone, Debug)]
pub struct FactorConfig {
    pub max_precision: u32,
    pub max_order: usize,
    pub max_alg_degree: usize,
    pub seed: u64,
}

impl Default for FactorConfig {
    fn default() -> Self {
        FactorConfig {
            max_precision: 20_000,
            max_order: 10_000,
            max_alg_degree: 6,
            seed: 0xD1FF_AC70,
        }
    }
}

/// Lifts an operator over `Q` into the working field.
pub fn lift_rational_dop(dop: &Dop<Rat>) -> Dop<K> {
    dop.map_coeffs(|c| NfElem::rational(c.clone()))
}

/// A proper right factor of `dop`, or `None` when the operator is
/// irreducible. Termination is guaranteed for Fuchsian operators
/// (within the configured caps).
pub fn right_factor(
    dop: &Dop<K>,
    engine: &dyn MonodromyEngine,
    config: &FactorConfig,
) -> Result<Option<Dop<K>>, FactorError> {
    if dop.is_zero() {
        return Err(FactorError::InvalidOperator("zero operator".into()));
    }
    let mut registry = FieldRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    right_factor_inner(dop, engine, config, &mut registry, &mut rng)
}

fn right_factor_inner(
    dop: &Dop<K>,
    engine: &dyn MonodromyEngine,
    config: &FactorConfig,
    registry: &mut FieldRegistry,
    rng: &mut ChaCha8Rng,
) -> Result<Option<Dop<K>>, FactorError> {
    let r = dop.order();
    if r < 2 {
        return Ok(None);
    }
    let shortcut_prec = 50 * (r as u32 + 1);
    match try_rational(dop, registry, shortcut_prec) {
        Ok(Some(factor)) => return Ok(Some(factor)),
        Ok(None) | Err(PrecisionError) => {}
    }
    match try_van_hoeij(dop, registry, shortcut_prec) {
        Ok(Some(factor)) => return Ok(Some(factor)),
        Ok(None) | Err(PrecisionError) => {}
    }
    info!("trying to factor an operator of order {r}");
    let (shifted, s) = normalize(&RatDop::from_dop(dop))?;
    if shifted.lead().eval(&<K as Coeff>::zero()).is_zero() {
        return Err(FactorError::InvalidOperator(
            "base point is singular after normalization".into(),
        ));
    }
    let Some(found) = monodromy_pipeline(&shifted, engine, config, registry, rng)? else {
        return Ok(None);
    };
    let back = found.compose_shift(&-s).normalized();
    if back.order() > 0 && back.order() < r && dop.is_divisible_by(&back) {
        Ok(Some(back))
    } else {
        Err(FactorError::InvalidOperator(
            "unverified candidate factor escaped the pipeline".into(),
        ))
    }
}

fn monodromy_pipeline(
    dop: &Dop<K>,
    engine: &dyn MonodromyEngine,
    config: &FactorConfig,
    registry: &mut FieldRegistry,
    rng: &mut ChaCha8Rng,
) -> Result<Option<Dop<K>>, FactorError> {
    let r = dop.order();
    let deg = dop.degree();
    let bound = degree_bound(dop, registry)?;
    debug!("degree bound for right factor: {bound}");
    let order_cap = ((bound as usize).saturating_mul(r + 1) + 1).min(config.max_order);
    let mut order = (r * deg).min(100).min(order_cap).max(1);
    let mut alg_degree = base_field_degree(dop);
    let mut precision: u32 = 50 * (r as u32 + 1);
    let mut data = MonoData::default();
    loop {
        if precision > config.max_precision {
            return Err(FactorError::PrecisionExhausted);
        }
        debug!(
            "monodromy pipeline: order {order}, precision {precision}, algebraic degree {alg_degree}"
        );
        match compute_monodromy(&mut data, engine, dop, precision, config.max_precision) {
            MonoOutcome::Exhausted => return Err(FactorError::PrecisionExhausted),
            MonoOutcome::Trivial => {
                return trivial_monodromy_fallback(dop, order, config);
            }
            MonoOutcome::Generators(mats) => {
                let mut hit_precision_error = false;
                for upto in 1..=mats.len() {
                    let mono = &mats[..upto];
                    let outcome = run_strategies(
                        dop, mono, order, bound, alg_degree, rng, registry,
                    );
                    match outcome {
                        Err(PrecisionError) => {
                            hit_precision_error = true;
                            break;
                        }
                        Ok(SubOutcome::Factor(factor)) => {
                            if let Some(digits) = condition_number_digits(mono) {
                                debug!("condition number around 10^{digits}");
                            }
                            return Ok(Some(factor));
                        }
                        Ok(SubOutcome::Irreducible) => {
                            if let Some(digits) = condition_number_digits(mono) {
                                debug!("condition number around 10^{digits}");
                            }
                            return Ok(None);
                        }
                        Ok(SubOutcome::Inconclusive) | Ok(SubOutcome::NotGoodConditions) => {}
                    }
                }
                precision = precision.saturating_add(150.max(precision.saturating_sub(data.loss)));
                if !hit_precision_error {
                    order = (order * 2).min(order_cap.max(1));
                    alg_degree = (alg_degree + 1).min(config.max_alg_degree.max(1));
                }
            }
        }
    }
}

fn run_strategies(
    dop: &Dop<K>,
    mono: &[dfactor_algebra::matrix::CMat],
    order: usize,
    bound: i64,
    alg_degree: usize,
    rng: &mut ChaCha8Rng,
    registry: &mut FieldRegistry,
) -> Result<SubOutcome, PrecisionError> {
    let mut method = "one_dimensional";
    let out = one_dimensional_eigenspaces(dop, mono, order, bound, alg_degree, rng, registry)?;
    let out = match out {
        SubOutcome::NotGoodConditions => {
            method = "simple_eigenvalue";
            simple_eigenvalue(dop, mono, order, bound, alg_degree, rng, registry)?
        }
        other => other,
    };
    let out = match out {
        SubOutcome::NotGoodConditions => {
            method = "multiple_eigenvalue";
            multiple_eigenvalue(dop, mono, order, bound, alg_degree, registry)?
        }
        other => other,
    };
    if matches!(out, SubOutcome::Factor(_) | SubOutcome::Irreducible) {
        debug!("concluded with the {method} method");
    }
    Ok(out)
}

fn degree_bound(dop: &Dop<K>, registry: &mut FieldRegistry) -> Result<i64, FactorError> {
    for prec in [128u32, 512] {
        if let Ok(b) = degree_bound_for_right_factor(dop, registry, prec) {
            return Ok(b);
        }
    }
    Err(FactorError::PrecisionExhausted)
}

fn base_field_degree(dop: &Dop<K>) -> usize {
    dop.coeffs()
        .iter()
        .flat_map(|p| p.coeffs.iter())
        .filter_map(|c| c.field().map(|f| f.degree()))
        .max()
        .unwrap_or(1)
}

/// The symbolic fallback for a monodromy group generated by homotheties:
/// Hermite-Pade approximants on the first local solution, doubling the
/// truncation order until the candidate divides.
fn trivial_monodromy_fallback(
    dop: &Dop<K>,
    order: usize,
    config: &FactorConfig,
) -> Result<Option<Dop<K>>, FactorError> {
    let r = dop.order();
    let mut order = order.max(1);
    debug!("trivial monodromy: symbolic approximants at order {order}");
    loop {
        if order > config.max_order {
            return Err(FactorError::PrecisionExhausted);
        }
        let basis = dop.series_basis(order + r);
        if let Some(first) = basis.first() {
            let sigma = (order / r).max(1);
            let mut column = Vec::with_capacity(r);
            let mut der = first.clone();
            for i in 0..r {
                if i > 0 {
                    der = der.derivative();
                }
                column.push(der.truncated(sigma));
            }
            if column.iter().all(|s| s.order() >= sigma) {
                let basis_mat = minimal_approximant_basis(&column, sigma);
                let row = basis_mat.rows[basis_mat.min_degree_row()].clone();
                let cand = Dop::new(row).normalized();
                if cand.order() > 0 && cand.order() < r && dop.is_divisible_by(&cand) {
                    return Ok(Some(cand));
                }
            }
        }
        order *= 2;
    }
}

/// Decomposes the operator into irreducible factors whose exact product
/// (over the fraction field) is the input.
pub fn factor(
    dop: &Dop<K>,
    engine: &dyn MonodromyEngine,
    config: &FactorConfig,
) -> Result<Vec<RatDop<K>>, FactorError> {
    if dop.is_zero() {
        return Err(FactorError::InvalidOperator("zero operator".into()));
    }
    let mut registry = FieldRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    factor_rec(
        RatDop::from_dop(dop),
        engine,
        config,
        &mut registry,
        &mut rng,
    )
}

/// Convenience entry point for operators over `Q`.
pub fn factor_rational(
    dop: &Dop<Rat>,
    engine: &dyn MonodromyEngine,
    config: &FactorConfig,
) -> Result<Vec<RatDop<K>>, FactorError> {
    factor(&lift_rational_dop(dop), engine, config)
}

fn factor_rec(
    level: RatDop<K>,
    engine: &dyn MonodromyEngine,
    config: &FactorConfig,
    registry: &mut FieldRegistry,
    rng: &mut ChaCha8Rng,
) -> Result<Vec<RatDop<K>>, FactorError> {
    let normal = level.clear_denominators();
    let Some(right) = right_factor_inner(&normal, engine, config, registry, rng)? else {
        return Ok(vec![level]);
    };
    info!("found a right factor of order {}", right.order());
    let (quotient, rem) = level.right_div_rem(&RatDop::from_dop(&right));
    if !rem.is_zero() {
        return Err(FactorError::InvalidOperator(
            "verified factor does not divide the full operator".into(),
        ));
    }
    let mut out = factor_rec(quotient, engine, config, registry, rng)?;
    out.extend(factor_rec(
        RatDop::from_dop(&right),
        engine,
        config,
        registry,
        rng,
    )?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monodromy::SymbolicOnlyEngine;
    use dfactor_algebra::poly::Poly;
    use dfactor_algebra::rational::rat_i64;

    fn p(cs: &[i64]) -> Poly<K> {
        Poly::new(cs.iter().map(|&c| NfElem::rational(rat_i64(c))).collect())
    }

    #[test]
    fn test_right_factor_low_order() {
        let cfg = FactorConfig::default();
        let l = Dop::new(vec![p(&[1]), p(&[0, 1])]);
        let r = right_factor(&l, &SymbolicOnlyEngine, &cfg).unwrap();
        assert!(r.is_none());
    }

    #[test]
    fn test_right_factor_rejects_zero() {
        let cfg = FactorConfig::default();
        let z = Dop::<K>::zero();
        assert!(matches!(
            right_factor(&z, &SymbolicOnlyEngine, &cfg),
            Err(FactorError::InvalidOperator(_))
        ));
    }

    #[test]
    fn test_trivial_fallback_dawson() {
        // D^2 + 2zD + 2: the fallback finds the factor proportional to
        // D + 2z (i.e. 1/2 D + z).
        let cfg = FactorConfig::default();
        let dawson = Dop::new(vec![p(&[2]), p(&[0, 2]), p(&[1])]);
        let r = trivial_monodromy_fallback(&dawson, 10, &cfg)
            .unwrap()
            .expect("factor");
        assert_eq!(r, Dop::new(vec![p(&[0, 2]), p(&[1])]));
        assert!(dawson.is_divisible_by(&r));
    }
}
