//! Sample sizes from the two-sided Hoeffding bound.
//!
//! For N independent Bernoulli trials with success probability θ, the empirical
//! frequency θ̂ satisfies
//!
//! ```text
//! P(|θ̂ - θ| > ε) ≤ 2·exp(-2Nε²)
//! ```
//!
//! Setting the right-hand side to α = 1 - confidence and solving for N gives
//! N ≥ -ln(α/2) / (2ε²). The result is advisory: callers may run fewer trials
//! for quick iteration, at a correspondingly wider error band.

use crate::error::{invalid, Result};

fn check_confidence(confidence: f64) -> Result<f64> {
    if confidence > 0.0 && confidence < 1.0 {
        Ok(1.0 - confidence)
    } else {
        Err(invalid(format!(
            "confidence {} is outside the open interval (0, 1)",
            confidence
        )))
    }
}

/// Minimum number of trials so that θ̂ is within `epsilon` of θ with probability `confidence`.
pub fn minimum_trials(epsilon: f64, confidence: f64) -> Result<usize> {
    if !(epsilon > 0.0 && epsilon.is_finite()) {
        return Err(invalid(format!("epsilon {} must be positive and finite", epsilon)));
    }
    let alpha = check_confidence(confidence)?;
    let n = (-(alpha / 2.0).ln() / (2.0 * epsilon * epsilon)).ceil();
    if !n.is_finite() || n > usize::MAX as f64 {
        return Err(invalid(format!(
            "epsilon {} at confidence {} needs more trials than can be counted",
            epsilon, confidence
        )));
    }
    Ok(n as usize)
}

/// Error half-width guaranteed by `trials` samples at the given confidence.
///
/// Inverse of [`minimum_trials`]: ε = sqrt(-ln(α/2) / (2N)).
pub fn achieved_epsilon(trials: usize, confidence: f64) -> Result<f64> {
    if trials == 0 {
        return Err(invalid("trial count must be positive"));
    }
    let alpha = check_confidence(confidence)?;
    Ok((-(alpha / 2.0).ln() / (2.0 * trials as f64)).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(epsilon: f64, confidence: f64) -> usize {
        let alpha: f64 = 1.0 - confidence;
        (-(alpha / 2.0).ln() / (2.0 * epsilon.powi(2))).ceil() as usize
    }

    #[test]
    fn test_reference_value() {
        // ceil(-ln(0.025) / 0.0002) = ceil(18444.397...)
        assert_eq!(minimum_trials(0.01, 0.95).unwrap(), 18445);
    }

    #[test]
    fn test_formula_matches_for_several_pairs() {
        for &(eps, conf) in &[(0.05, 0.90), (0.02, 0.99), (0.1, 0.5), (0.005, 0.999)] {
            assert_eq!(
                minimum_trials(eps, conf).unwrap(),
                reference(eps, conf),
                "Mismatch for epsilon={}, confidence={}",
                eps,
                conf
            );
        }
        assert_eq!(minimum_trials(0.05, 0.90).unwrap(), 600);
    }

    #[test]
    fn test_tighter_tolerance_needs_more_trials() {
        let loose = minimum_trials(0.05, 0.95).unwrap();
        let tight = minimum_trials(0.01, 0.95).unwrap();
        assert!(tight > loose);
        let confident = minimum_trials(0.05, 0.99).unwrap();
        assert!(confident > loose);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(minimum_trials(0.0, 0.95).is_err());
        assert!(minimum_trials(-0.01, 0.95).is_err());
        assert!(minimum_trials(f64::NAN, 0.95).is_err());
        assert!(minimum_trials(0.01, 0.0).is_err());
        assert!(minimum_trials(0.01, 1.0).is_err());
        assert!(minimum_trials(0.01, 1.2).is_err());
        assert!(achieved_epsilon(0, 0.95).is_err());
    }

    #[test]
    fn test_tiny_epsilon_overflows_trial_count() {
        assert!(minimum_trials(1e-200, 0.95).is_err());
        assert!(minimum_trials(f64::MIN_POSITIVE / 4.0, 0.95).is_err());
        // ~1.8e14 trials: huge but still countable.
        assert!(minimum_trials(1e-7, 0.95).is_ok());
    }

    #[test]
    fn test_achieved_epsilon_inverts_minimum_trials() {
        let n = minimum_trials(0.01, 0.95).unwrap();
        let eps = achieved_epsilon(n, 0.95).unwrap();
        assert!(eps <= 0.01 && eps > 0.0099, "Got epsilon {}", eps);

        // 500 trials (the quick-iteration default) gives roughly ±6%.
        let quick = achieved_epsilon(500, 0.95).unwrap();
        assert!((quick - 0.0607).abs() < 1e-3, "Got epsilon {}", quick);
    }
}
