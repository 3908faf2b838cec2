//! Percolation study runner: sweep p, estimate θ(p), report the phase transition.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;
use rand::rngs::StdRng;
use rand::SeedableRng;

use percolation_sim::prelude::*;

/// Reference critical probability for 2D site percolation on the square lattice.
const P_CRITICAL: f64 = 0.592746;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON study configuration; command-line values override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Grid side length L
    #[arg(short = 'L', long)]
    size: Option<usize>,

    /// Target estimation error
    #[arg(short, long)]
    epsilon: Option<f64>,

    /// Target confidence level in (0, 1)
    #[arg(long)]
    confidence: Option<f64>,

    /// Trials per p-value (defaults to 500; use --hoeffding for the bound)
    #[arg(short = 'n', long, conflicts_with = "hoeffding")]
    trials: Option<usize>,

    /// Run the number of trials required by the Hoeffding bound
    #[arg(long)]
    hoeffding: bool,

    /// Base seed for reproducible runs
    #[arg(short, long)]
    seed: Option<u64>,

    /// Print the sweep as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Also run one illustrative flood fill at each of these p-values
    #[arg(long, value_delimiter = ',')]
    sample_p: Vec<f64>,
}

fn build_config(args: &Args) -> percolation_sim::Result<StudyConfig> {
    let mut config = match &args.config {
        Some(path) => StudyConfig::from_json_file(path)?,
        None => StudyConfig::default(),
    };
    if let Some(size) = args.size {
        config.size = size;
    }
    if let Some(epsilon) = args.epsilon {
        config.epsilon = epsilon;
    }
    if let Some(confidence) = args.confidence {
        config.confidence = confidence;
    }
    if let Some(trials) = args.trials {
        config.trials = trials;
    }
    if args.hoeffding {
        config.trials = config.hoeffding_trials()?;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    config.validate()?;
    Ok(config)
}

fn print_table(config: &StudyConfig, points: &[SweepPoint]) -> percolation_sim::Result<()> {
    let band = achieved_epsilon(config.trials, config.confidence)?;

    println!("━━━ Site Percolation on {}×{} ━━━", config.size, config.size);
    println!();
    println!("  Trials per point:   {}", config.trials);
    println!(
        "  Hoeffding minimum:  {} (ε = {}, confidence = {})",
        config.hoeffding_trials()?,
        config.epsilon,
        config.confidence
    );
    println!("  Achieved band:      ±{:.4}", band);
    println!();
    println!("  {:>8}  {:>8}", "p", "θ̂(p)");
    println!("  {:─>8}  {:─>8}", "", "");
    for point in points {
        println!("  {:>8.4}  {:>8.4}", point.p, point.theta_hat);
    }
    println!();

    match estimate_threshold(points) {
        Some(pc) => println!(
            "  Estimated p_c ≈ {:.4}  (reference {:.4}, Δ = {:+.4})",
            pc,
            P_CRITICAL,
            pc - P_CRITICAL
        ),
        None => println!("  θ̂ never crosses 0.5 in this sweep"),
    }
    Ok(())
}

fn print_samples(config: &StudyConfig, ps: &[f64], seed: u64) -> percolation_sim::Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    println!();
    println!("━━━ Sample grids ━━━");
    for &p in ps {
        let result = sample(config.size, p, &mut rng)?;
        println!(
            "  p = {:.2}: percolates = {:<5}  open = {:>5}  wet = {:>5}  spanning columns = {}",
            p,
            result.percolates,
            result.grid.open_count(),
            result.wet_count(),
            result.spanning_columns().len()
        );
    }
    Ok(())
}

fn run(args: &Args) -> percolation_sim::Result<()> {
    let mut config = build_config(args)?;
    let seed = *config.seed.get_or_insert_with(rand::random);

    let points = Estimator::new(config.clone())?.run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&points)?);
    } else {
        print_table(&config, &points)?;
    }
    if !args.sample_p.is_empty() {
        print_samples(&config, &args.sample_p, seed)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
