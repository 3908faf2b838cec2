//! Study configuration and p-value sweep construction.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{check_probability, invalid, Result};
use crate::grid::cell_count;
use crate::hoeffding::minimum_trials;

/// Configuration for a percolation study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyConfig {
    /// Grid side length L (L×L sites).
    pub size: usize,
    /// Target estimation error ε.
    pub epsilon: f64,
    /// Target confidence level, in (0, 1).
    pub confidence: f64,
    /// Number of Monte Carlo trials per p-value.
    pub trials: usize,
    /// Occupation probabilities to evaluate, in output order.
    pub p_values: Vec<f64>,
    /// Base seed for reproducible runs. `None` draws one from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for StudyConfig {
    /// 50×50 grid, ε = 1%, 95% confidence, 500 trials over the critical-region sweep.
    fn default() -> Self {
        Self {
            size: 50,
            epsilon: 0.01,
            confidence: 0.95,
            trials: 500,
            p_values: critical_region_sweep(),
            seed: None,
        }
    }
}

impl StudyConfig {
    /// Build a config whose trial count comes from the Hoeffding bound.
    pub fn from_tolerance(
        size: usize,
        epsilon: f64,
        confidence: f64,
        p_values: Vec<f64>,
    ) -> Result<Self> {
        let config = Self {
            size,
            epsilon,
            confidence,
            trials: minimum_trials(epsilon, confidence)?,
            p_values,
            seed: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Override the trial count (faster iteration, weaker guarantee).
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Trials required by the Hoeffding bound for this config's ε and confidence.
    pub fn hoeffding_trials(&self) -> Result<usize> {
        minimum_trials(self.epsilon, self.confidence)
    }

    /// Check every field. A single bad p-value rejects the whole config.
    pub fn validate(&self) -> Result<()> {
        cell_count(self.size)?;
        // Delegates the ε and confidence checks.
        minimum_trials(self.epsilon, self.confidence)?;
        if self.trials == 0 {
            return Err(invalid("trial count N_sim must be positive"));
        }
        if self.p_values.is_empty() {
            return Err(invalid("p-value sweep is empty"));
        }
        for (i, &p) in self.p_values.iter().enumerate() {
            check_probability(p).map_err(|_| {
                invalid(format!("p_values[{}] = {} is outside [0, 1]", i, p))
            })?;
        }
        Ok(())
    }

    /// Load and validate a JSON config file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}

/// `count` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Piecewise sweep builder: concatenate segments, then sort and deduplicate.
#[derive(Debug, Clone, Default)]
pub struct SweepBuilder {
    values: Vec<f64>,
}

impl SweepBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` evenly spaced points over [start, end].
    pub fn segment(mut self, start: f64, end: f64, count: usize) -> Self {
        self.values.extend(linspace(start, end, count));
        self
    }

    pub fn point(mut self, p: f64) -> Self {
        self.values.push(p);
        self
    }

    /// Sorted ascending, exact duplicates removed.
    pub fn build(mut self) -> Vec<f64> {
        self.values.sort_by(f64::total_cmp);
        self.values.dedup();
        self.values
    }
}

/// Default sweep: coarse on [0, 0.5] and [0.66, 1], dense on [0.51, 0.65] around p_c ≈ 0.5927.
pub fn critical_region_sweep() -> Vec<f64> {
    SweepBuilder::new()
        .segment(0.0, 0.5, 10)
        .segment(0.51, 0.65, 30)
        .segment(0.66, 1.0, 10)
        .build()
}
