//! Monte Carlo simulation: random grids, flood fill, percolation probability sweep.
//!
//! For each occupation probability p, N independent L×L grids are generated and
//! checked for a top-to-bottom path. The percolation probability θ(p) is
//! estimated by the fraction of grids that percolate. N is typically taken from
//! the Hoeffding bound (see [`crate::hoeffding`]), which makes |θ̂ - θ| ≤ ε hold
//! with the requested confidence.
//!
//! Trials are independent, so the sweep parallelises across trials. Each trial
//! gets its own ChaCha8 stream seeded from (base seed, p index, trial index),
//! which keeps results identical regardless of thread count or scheduling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{debug, info, warn};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::cluster::{check, percolates, PercolationResult};
use crate::config::StudyConfig;
use crate::error::{check_probability, invalid, Result};
use crate::grid::Grid;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Log a progress line every this many sweep points.
const PROGRESS_INTERVAL: usize = 10;

/// Estimated percolation probability at one occupation probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    /// Occupation probability.
    pub p: f64,
    /// Fraction of trials that percolated.
    pub theta_hat: f64,
}

/// Result of a sweep that may have been cancelled part-way.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    /// Completed points, in input order. Always a prefix of the full sweep.
    pub points: Vec<SweepPoint>,
    pub cancelled: bool,
}

/// Run a single Monte Carlo trial.
///
/// Returns true if the random grid percolates.
pub fn run_trial<R: RngCore + ?Sized>(size: usize, p: f64, rng: &mut R) -> Result<bool> {
    let grid = Grid::generate(size, p, rng)?;
    Ok(percolates(&grid))
}

/// Generate one grid and run the full flood fill, keeping the grid and flow mask.
pub fn sample<R: RngCore + ?Sized>(size: usize, p: f64, rng: &mut R) -> Result<PercolationResult> {
    Ok(check(Grid::generate(size, p, rng)?))
}

/// Estimate θ(p) from `trials` trials drawn sequentially from `rng`.
pub fn estimate_point<R: RngCore + ?Sized>(
    size: usize,
    p: f64,
    trials: usize,
    rng: &mut R,
) -> Result<SweepPoint> {
    if size == 0 {
        return Err(invalid("grid size L must be positive"));
    }
    if trials == 0 {
        return Err(invalid("trial count N_sim must be positive"));
    }
    check_probability(p)?;

    let mut successes = 0;
    for _ in 0..trials {
        if run_trial(size, p, rng)? {
            successes += 1;
        }
    }
    Ok(SweepPoint {
        p,
        theta_hat: successes as f64 / trials as f64,
    })
}

/// Run the full sweep sequentially, drawing every trial from `rng`.
///
/// Returns one point per entry of `config.p_values`, in the same order.
/// Duplicated p-values are evaluated again, independently.
pub fn estimate<R: RngCore + ?Sized>(config: &StudyConfig, rng: &mut R) -> Result<Vec<SweepPoint>> {
    config.validate()?;
    config
        .p_values
        .iter()
        .map(|&p| estimate_point(config.size, p, config.trials, &mut *rng))
        .collect()
}

/// Estimate the critical probability as the first upward crossing of θ̂ = 0.5.
///
/// Linearly interpolates between the two bracketing points. Returns None if
/// the sweep never crosses.
pub fn estimate_threshold(points: &[SweepPoint]) -> Option<f64> {
    for window in points.windows(2) {
        let (a, b) = (&window[0], &window[1]);
        if a.theta_hat < 0.5 && b.theta_hat >= 0.5 {
            let frac = (0.5 - a.theta_hat) / (b.theta_hat - a.theta_hat);
            return Some(a.p + frac * (b.p - a.p));
        }
    }
    None
}

/// Seed for one trial, mixed from the base seed and the trial's coordinates (SplitMix64).
pub fn trial_seed(base: u64, point_index: usize, trial: usize) -> u64 {
    let mut z = base
        ^ (point_index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (trial as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// A validated study, ready to run with per-trial seeded random streams.
#[derive(Debug, Clone)]
pub struct Estimator {
    config: StudyConfig,
}

impl Estimator {
    /// Validate the config once, before any trial runs.
    pub fn new(config: StudyConfig) -> Result<Self> {
        config.validate()?;
        let required = config.hoeffding_trials()?;
        if config.trials < required {
            warn!(
                "N_sim = {} is below the Hoeffding minimum {} for epsilon={}, confidence={}",
                config.trials, required, config.epsilon, config.confidence
            );
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    /// Run with the configured seed, or a fresh random one if none is set.
    pub fn run(&self) -> Result<Vec<SweepPoint>> {
        let seed = self.config.seed.unwrap_or_else(rand::random);
        self.estimate_seeded(seed)
    }

    /// Run the whole sweep. Output depends only on the config and `seed`.
    pub fn estimate_seeded(&self, seed: u64) -> Result<Vec<SweepPoint>> {
        let never = AtomicBool::new(false);
        Ok(self.estimate_until(seed, &never)?.points)
    }

    /// Run the sweep, checking `cancel` before each p-value.
    ///
    /// On cancellation the points completed so far are returned unchanged.
    pub fn estimate_until(&self, seed: u64, cancel: &AtomicBool) -> Result<SweepOutcome> {
        self.estimate_observed(seed, cancel, |_| {})
    }

    /// Like [`Estimator::estimate_until`], calling `on_point` after each completed point.
    pub fn estimate_observed<F>(
        &self,
        seed: u64,
        cancel: &AtomicBool,
        mut on_point: F,
    ) -> Result<SweepOutcome>
    where
        F: FnMut(&SweepPoint),
    {
        let config = &self.config;
        let total = config.p_values.len();
        info!(
            "Percolation study: L={}, N_sim={}, {} p-values, seed={}",
            config.size, config.trials, total, seed
        );

        let start = Instant::now();
        let mut points = Vec::with_capacity(total);
        for (i, &p) in config.p_values.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                info!("Sweep cancelled after {}/{} points", points.len(), total);
                return Ok(SweepOutcome {
                    points,
                    cancelled: true,
                });
            }

            let successes = self.count_successes(i, p, seed)?;
            let point = SweepPoint {
                p,
                theta_hat: successes as f64 / config.trials as f64,
            };
            debug!("p={:.4} -> {}/{} percolated", p, successes, config.trials);
            if i % PROGRESS_INTERVAL == 0 {
                info!("Progress: p={:.2} -> theta={:.3}", point.p, point.theta_hat);
            }
            on_point(&point);
            points.push(point);
        }

        info!("Finished {} points in {:.2} s", total, start.elapsed().as_secs_f64());
        Ok(SweepOutcome {
            points,
            cancelled: false,
        })
    }

    fn trial(&self, point_index: usize, p: f64, seed: u64, trial: usize) -> Result<usize> {
        let mut rng = ChaCha8Rng::seed_from_u64(trial_seed(seed, point_index, trial));
        Ok(run_trial(self.config.size, p, &mut rng)? as usize)
    }

    #[cfg(feature = "parallel")]
    fn count_successes(&self, point_index: usize, p: f64, seed: u64) -> Result<usize> {
        (0..self.config.trials)
            .into_par_iter()
            .map(|t| self.trial(point_index, p, seed, t))
            .sum()
    }

    #[cfg(not(feature = "parallel"))]
    fn count_successes(&self, point_index: usize, p: f64, seed: u64) -> Result<usize> {
        (0..self.config.trials)
            .map(|t| self.trial(point_index, p, seed, t))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    fn small_config(p_values: Vec<f64>, trials: usize) -> StudyConfig {
        StudyConfig {
            size: 8,
            epsilon: 0.05,
            confidence: 0.95,
            trials,
            p_values,
            seed: Some(42),
        }
    }

    #[test]
    fn test_zero_probability_never_percolates() {
        let mut rng = StdRng::seed_from_u64(1);
        let point = estimate_point(6, 0.0, 100, &mut rng).unwrap();
        assert_eq!(point.theta_hat, 0.0, "p=0 should produce zero percolating grids");
    }

    #[test]
    fn test_unit_probability_always_percolates() {
        let mut rng = StdRng::seed_from_u64(1);
        let point = estimate_point(6, 1.0, 100, &mut rng).unwrap();
        assert_eq!(point.theta_hat, 1.0);
    }

    #[test]
    fn test_estimate_preserves_order_and_duplicates() {
        let ps = vec![0.9, 0.1, 0.9, 0.0, 1.0];
        let config = small_config(ps.clone(), 50);
        let mut rng = StdRng::seed_from_u64(3);
        let points = estimate(&config, &mut rng).unwrap();

        assert_eq!(points.len(), ps.len());
        for (point, &p) in points.iter().zip(&ps) {
            assert_eq!(point.p, p);
            assert!((0.0..=1.0).contains(&point.theta_hat));
        }
        assert_eq!(points[3].theta_hat, 0.0);
        assert_eq!(points[4].theta_hat, 1.0);
    }

    #[test]
    fn test_sequential_estimate_reproducible() {
        let config = small_config(vec![0.55, 0.6, 0.65], 100);
        let a = estimate(&config, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = estimate(&config, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_config_rejected_before_trials() {
        let config = small_config(vec![0.5, 1.2], 10);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(estimate(&config, &mut rng).is_err());
        assert!(Estimator::new(config).is_err());
        assert!(estimate_point(0, 0.5, 10, &mut rng).is_err());
        assert!(estimate_point(5, 0.5, 0, &mut rng).is_err());
    }

    #[test]
    fn test_seeded_estimator_reproducible() {
        let estimator = Estimator::new(small_config(vec![0.5, 0.6, 0.7], 200)).unwrap();
        let a = estimator.estimate_seeded(42).unwrap();
        let b = estimator.estimate_seeded(42).unwrap();
        assert_eq!(a, b, "Same seed must give identical sweeps");
        assert_eq!(estimator.run().unwrap(), a, "run() should use the configured seed");
    }

    #[test]
    fn test_sweep_monotonic_within_noise() {
        let ps: Vec<f64> = (3..=9).map(|i| i as f64 * 0.1).collect();
        let estimator = Estimator::new(StudyConfig {
            size: 10,
            ..small_config(ps, 400)
        })
        .unwrap();
        let points = estimator.estimate_seeded(2024).unwrap();

        for w in points.windows(2) {
            assert!(
                w[1].theta_hat >= w[0].theta_hat - 0.1,
                "theta dropped from {} at p={} to {} at p={}",
                w[0].theta_hat,
                w[0].p,
                w[1].theta_hat,
                w[1].p
            );
        }
        assert!(points.first().unwrap().theta_hat < points.last().unwrap().theta_hat);
    }

    #[test]
    fn test_cancelled_sweep_returns_completed_prefix() {
        let estimator = Estimator::new(small_config(vec![0.2, 0.6, 0.9], 20)).unwrap();
        let cancel = AtomicBool::new(true);
        let outcome = estimator.estimate_until(1, &cancel).unwrap();
        assert!(outcome.cancelled);
        assert!(outcome.points.is_empty());

        let cancel = AtomicBool::new(false);
        let outcome = estimator.estimate_until(1, &cancel).unwrap();
        assert!(!outcome.cancelled);
        assert_eq!(outcome.points.len(), 3);
    }

    #[test]
    fn test_cancel_mid_sweep_keeps_completed_points() {
        let ps: Vec<f64> = (0..8).map(|i| 0.45 + i as f64 * 0.03).collect();
        let estimator = Estimator::new(small_config(ps, 60)).unwrap();
        let full = estimator.estimate_seeded(11).unwrap();

        let cancel = AtomicBool::new(false);
        let mut seen = 0;
        let outcome = estimator
            .estimate_observed(11, &cancel, |_| {
                seen += 1;
                if seen == 3 {
                    cancel.store(true, Ordering::Relaxed);
                }
            })
            .unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.points.len(), 3);
        assert_eq!(
            outcome.points[..],
            full[..3],
            "Completed points must match an uncancelled run with the same seed"
        );
    }

    #[test]
    fn test_trial_seed_distinct() {
        let a = trial_seed(7, 0, 0);
        assert_ne!(a, trial_seed(7, 0, 1));
        assert_ne!(a, trial_seed(7, 1, 0));
        assert_ne!(a, trial_seed(8, 0, 0));
        assert_eq!(a, trial_seed(7, 0, 0));
    }

    #[test]
    fn test_sample_keeps_grid_and_flow() {
        let mut rng = StdRng::seed_from_u64(12);
        let result = sample(20, 0.6, &mut rng).unwrap();
        assert_eq!(result.grid.size(), 20);
        assert_eq!(result.flow.size(), 20);
        assert!(result.wet_count() <= result.grid.open_count());
    }

    #[test]
    fn test_estimate_threshold() {
        let points = vec![
            SweepPoint { p: 0.50, theta_hat: 0.10 },
            SweepPoint { p: 0.55, theta_hat: 0.40 },
            SweepPoint { p: 0.60, theta_hat: 0.60 },
            SweepPoint { p: 0.65, theta_hat: 0.90 },
        ];
        let t = estimate_threshold(&points).unwrap();
        assert!((t - 0.575).abs() < 1e-9, "Threshold should interpolate to 0.575, got {}", t);
        assert!(estimate_threshold(&points[..2]).is_none());
    }
}
