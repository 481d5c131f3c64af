//! Error taxonomy of the factorization pipeline.
//!
//! Only two conditions escape to callers: an invalid input operator and a
//! terminal precision exhaustion after every retry cap is hit. The
//! strategy sentinels (`Inconclusive`, `NotGoodConditions`) are ordinary
//! enum variants inside the pipeline and never cross the public boundary.

use std::fmt;

pub use dfactor_algebra::ball::PrecisionError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FactorError {
    /// The input violates a precondition (zero operator, or a singular
    /// base point reaching the monodromy pipeline).
    InvalidOperator(String),
    /// Working precision, truncation order, and algebraic degree all hit
    /// their configured caps without a definitive answer.
    PrecisionExhausted,
}

impl fmt::Display for FactorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorError::InvalidOperator(msg) => write!(f, "invalid operator: {msg}"),
            FactorError::PrecisionExhausted => {
                write!(f, "working precision exhausted without a definitive answer")
            }
        }
    }
}

impl std::error::Error for FactorError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = FactorError::InvalidOperator("zero operator".into());
        assert!(e.to_string().contains("zero operator"));
        assert!(FactorError::PrecisionExhausted.to_string().contains("precision"));
    }
}
