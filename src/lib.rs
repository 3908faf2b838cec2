//! # percolation-sim
//!
//! Monte Carlo estimation of the site percolation probability θ(p) on an L×L
//! square grid.
//!
//! Each site is independently open with probability p. A grid percolates when a
//! 4-connected path of open sites joins the top row to the bottom row, which is
//! detected with a breadth-first flood fill from the top face.
//!
//! ## Statistics
//!
//! - **Estimator**: θ̂(p) = (percolating grids) / N
//! - **Sample size**: N = ⌈-ln(α/2) / (2ε²)⌉ from the two-sided Hoeffding bound,
//!   guaranteeing |θ̂ - θ| ≤ ε with probability 1 - α
//! - **Threshold**: p_c ≈ 0.5927 for the infinite square lattice
//!
//! ## Usage
//!
//! ```no_run
//! use percolation_sim::prelude::*;
//!
//! let config = StudyConfig::from_tolerance(50, 0.01, 0.95, critical_region_sweep())
//!     .unwrap()
//!     .with_trials(500)
//!     .with_seed(42);
//! let points = Estimator::new(config).unwrap().run().unwrap();
//! for point in &points {
//!     println!("p = {:.3}  theta = {:.3}", point.p, point.theta_hat);
//! }
//! ```

pub mod error;
pub mod grid;
pub mod cluster;
pub mod hoeffding;
pub mod config;
pub mod simulation;

pub use error::{PercolationError, Result};

pub mod prelude {
    pub use crate::error::*;
    pub use crate::grid::*;
    pub use crate::cluster::*;
    pub use crate::hoeffding::*;
    pub use crate::config::*;
    pub use crate::simulation::*;
}
