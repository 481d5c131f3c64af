//! Operator normalization: polynomial normal form and base-point shift.

use dfactor_algebra::coeff::Coeff;

use crate::dop::{Dop, RatDop};
use crate::error::FactorError;

/// Clears denominators and content, then shifts `z <- z + s` for the
/// smallest nonnegative integer `s` making the origin an ordinary point.
/// Returns the normalized operator and the shift.
pub fn normalize<F: Coeff>(input: &RatDop<F>) -> Result<(Dop<F>, F), FactorError> {
    if input.is_zero() {
        return Err(FactorError::InvalidOperator("zero operator".into()));
    }
    let dop = input.clear_denominators();
    let lead = dop.lead();
    let mut s = 0i64;
    loop {
        let at = lead.eval(&F::from_i64(s));
        if !at.is_zero() {
            break;
        }
        s += 1;
    }
    let shift = F::from_i64(s);
    let shifted = if s == 0 {
        dop
    } else {
        dop.compose_shift(&shift).normalized()
    };
    Ok((shifted, shift))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfactor_algebra::poly::Poly;
    use dfactor_algebra::rational::{rat_i64, Rat};

    fn p(cs: &[i64]) -> Poly<Rat> {
        Poly::new(cs.iter().map(|&c| rat_i64(c)).collect())
    }

    #[test]
    fn test_rejects_zero() {
        let z = RatDop::<Rat>::zero();
        assert!(matches!(
            normalize(&z),
            Err(FactorError::InvalidOperator(_))
        ));
    }

    #[test]
    fn test_ordinary_origin_untouched() {
        // lead = z - 1 does not vanish at 0.
        let l = Dop::new(vec![p(&[1]), p(&[-1, 1])]);
        let (n, s) = normalize(&RatDop::from_dop(&l)).unwrap();
        assert_eq!(s, rat_i64(0));
        assert_eq!(n, l);
    }

    #[test]
    fn test_shifts_off_singularity() {
        // lead = z(z - 1): 0 and 1 are singular, 2 is the first
        // ordinary integer.
        let lead = &p(&[0, 1]) * &p(&[-1, 1]);
        let l = Dop::new(vec![p(&[1]), lead]);
        let (n, s) = normalize(&RatDop::from_dop(&l)).unwrap();
        assert_eq!(s, rat_i64(2));
        assert!(!n.lead().eval(&rat_i64(0)).is_zero());
        // Shifting back recovers the original.
        assert_eq!(n.compose_shift(&rat_i64(-2)).normalized(), l.normalized());
    }
}
