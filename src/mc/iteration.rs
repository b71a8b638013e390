// src/mc/iteration.rs
//! Outer-Iteration Controller
//!
//! # Two-Level Scheme
//!
//! `m` independent batches of `n` trials each. Batch `j` samples with seed
//! `base_seed + j`, so one batch reproduces a direct estimator call with
//! `base_seed`. With per-batch results `(Pⱼ, σⱼ²)`:
//!
//! ```text
//! price          = (1/m) Σ Pⱼ
//! variance       = (1/m) Σ σⱼ²
//! standard_error = (1/m) Σ √(σⱼ² / n)
//! predictedᵢ     = (Σⱼ Σ_trials Sᵢ·xᵢ) / (m·n)
//! ```
//!
//! Rejected trials pay nothing but still count in `n`. A run that rejects more
//! than [`MAX_REJECTED_FRACTION`] of its trials fails instead of reporting a
//! price that is biased low.

use crate::error::{validation::*, McError, McResult, MonteCarloError};
use crate::finance::payoff::PayoffFunction;
use crate::geometry::domain::Domain;
use crate::geometry::sampler::{PointSampler, DEFAULT_PARALLEL_THRESHOLD};
use crate::mc::estimator::{estimate_price, EstimationResult};
use crate::rng::CounterRng;
use rayon::prelude::*;
use tracing::{info, warn};

pub const DEFAULT_ITERATIONS: usize = 10;

/// Largest share of rejected trials an aggregated run may carry
pub const MAX_REJECTED_FRACTION: f64 = 1e-3;

#[derive(Debug, Clone)]
pub struct IterationConfig {
    pub num_iterations: usize,
    pub num_simulations: usize,
    pub seed: u64,
    /// Run the batches on the rayon global pool instead of one after another
    pub concurrent: bool,
    /// Dimension from which a single point fans out over worker threads
    pub parallel_threshold: usize,
}

impl IterationConfig {
    pub fn validate(&self) -> McResult<()> {
        validate_iterations(self.num_iterations)?;
        validate_simulations(self.num_simulations)?;
        Ok(())
    }

    /// Sampler seed of batch `iteration`
    pub fn iteration_seed(&self, iteration: usize) -> u64 {
        self.seed.wrapping_add(iteration as u64)
    }
}

impl Default for IterationConfig {
    fn default() -> Self {
        IterationConfig {
            num_iterations: DEFAULT_ITERATIONS,
            num_simulations: 1_000_000,
            seed: 12345,
            concurrent: false,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

/// Average of the outer iterations
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedResult {
    pub price: f64,
    pub variance: f64,
    pub standard_error: f64,
    pub predicted_asset_prices: Vec<f64>,
    pub points_rejected: usize,
    pub num_iterations: usize,
    pub num_simulations: usize,
}

/// Running sums folded one batch at a time
#[derive(Debug, Clone)]
struct Accumulator {
    price_sum: f64,
    variance_sum: f64,
    standard_error_sum: f64,
    predicted_sums: Vec<f64>,
    points_rejected: usize,
    folded: usize,
}

impl Accumulator {
    fn new(dimension: usize) -> Self {
        Self {
            price_sum: 0.0,
            variance_sum: 0.0,
            standard_error_sum: 0.0,
            predicted_sums: vec![0.0; dimension],
            points_rejected: 0,
            folded: 0,
        }
    }

    fn fold(&mut self, batch: &EstimationResult) {
        self.price_sum += batch.price_estimate;
        self.variance_sum += batch.variance;
        self.standard_error_sum += (batch.variance / batch.num_simulations as f64).sqrt();
        for (total, sum) in self.predicted_sums.iter_mut().zip(&batch.predicted_price_sums) {
            *total += sum;
        }
        self.points_rejected += batch.points_rejected;
        self.folded += 1;
    }

    fn finish(self, num_simulations: usize) -> AggregatedResult {
        let m = self.folded as f64;
        let trials = m * num_simulations as f64;
        AggregatedResult {
            price: self.price_sum / m,
            variance: self.variance_sum / m,
            standard_error: self.standard_error_sum / m,
            predicted_asset_prices: self.predicted_sums.iter().map(|s| s / trials).collect(),
            points_rejected: self.points_rejected,
            num_iterations: self.folded,
            num_simulations,
        }
    }
}

fn run_batch<F>(
    domain: &Domain,
    payoff: &PayoffFunction,
    law: &F,
    cfg: &IterationConfig,
    iteration: usize,
) -> McResult<EstimationResult>
where
    F: Fn(usize, &mut CounterRng) -> f64 + Sync,
{
    let sampler = PointSampler::with_parallel_threshold(
        domain.dimension(),
        cfg.iteration_seed(iteration),
        cfg.parallel_threshold,
    )?;
    estimate_price(domain, payoff, &sampler, law, cfg.num_simulations)
}

/// Run `cfg.num_iterations` independent pricing batches and average them
///
/// `progress` is called with the completed percentage after each batch (in
/// iteration order, after all batches when running concurrently).
pub fn run_iterations<F, P>(
    domain: &Domain,
    payoff: &PayoffFunction,
    law: F,
    cfg: &IterationConfig,
    mut progress: P,
) -> McResult<AggregatedResult>
where
    F: Fn(usize, &mut CounterRng) -> f64 + Sync,
    P: FnMut(f64),
{
    cfg.validate()?;
    if payoff.asset_count() != domain.dimension() {
        return Err(McError::InvalidConfiguration {
            field: "payoff".to_string(),
            reason: "payoff and domain dimensions differ".to_string(),
        });
    }

    info!(
        iterations = cfg.num_iterations,
        simulations = cfg.num_simulations,
        seed = cfg.seed,
        concurrent = cfg.concurrent,
        "starting Monte Carlo iterations"
    );

    let mut acc = Accumulator::new(domain.dimension());
    let percent = |j: usize| (j + 1) as f64 / cfg.num_iterations as f64 * 100.0;

    if cfg.concurrent {
        let batches = (0..cfg.num_iterations)
            .into_par_iter()
            .map(|j| run_batch(domain, payoff, &law, cfg, j))
            .collect::<McResult<Vec<_>>>()?;
        for (j, batch) in batches.iter().enumerate() {
            acc.fold(batch);
            progress(percent(j));
        }
    } else {
        for j in 0..cfg.num_iterations {
            let batch = run_batch(domain, payoff, &law, cfg, j)?;
            acc.fold(&batch);
            progress(percent(j));
        }
    }

    let result = acc.finish(cfg.num_simulations);
    let trials = result.num_iterations * result.num_simulations;
    if result.points_rejected as f64 > MAX_REJECTED_FRACTION * trials as f64 {
        warn!(
            rejected = result.points_rejected,
            trials, "too many trials outside the domain"
        );
        return Err(MonteCarloError::ExcessiveRejection {
            rejected: result.points_rejected,
            trials,
        }
        .into());
    }
    info!(
        price = result.price,
        standard_error = result.standard_error,
        rejected = result.points_rejected,
        "Monte Carlo iterations complete"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::asset::Asset;
    use crate::finance::payoff::OptionType;
    use approx::assert_relative_eq;

    fn setup() -> (Domain, PayoffFunction) {
        let asset = Asset::new("A", 0.0, 0.01, 100.0, 252).unwrap();
        let payoff =
            PayoffFunction::new(OptionType::European, &[asset], 100.0, 0.0, 1.0).unwrap();
        (Domain::hyperrectangle(vec![0.0, 2.0]).unwrap(), payoff)
    }

    fn uniform_law(rng: &mut CounterRng) -> f64 {
        rng.uniform_in(0.5, 1.5)
    }

    #[test]
    fn test_single_iteration_matches_direct_call() {
        let (domain, payoff) = setup();
        let cfg = IterationConfig {
            num_iterations: 1,
            num_simulations: 5_000,
            seed: 77,
            ..Default::default()
        };

        let aggregated =
            run_iterations(&domain, &payoff, |_, rng| uniform_law(rng), &cfg, |_| {}).unwrap();

        let sampler = PointSampler::new(1, 77).unwrap();
        let direct =
            estimate_price(&domain, &payoff, &sampler, |_, rng| uniform_law(rng), 5_000).unwrap();

        assert_relative_eq!(aggregated.price, direct.price_estimate, epsilon = 1e-12);
        assert_relative_eq!(aggregated.variance, direct.variance, epsilon = 1e-12);
        assert_relative_eq!(
            aggregated.standard_error,
            (direct.variance / 5_000.0).sqrt(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            aggregated.predicted_asset_prices[0],
            direct.predicted_price_sums[0] / 5_000.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_concurrent_matches_sequential() {
        let (domain, payoff) = setup();
        let sequential = IterationConfig {
            num_iterations: 4,
            num_simulations: 2_000,
            seed: 5,
            ..Default::default()
        };
        let concurrent = IterationConfig {
            concurrent: true,
            ..sequential.clone()
        };

        let mut seen = Vec::new();
        let a = run_iterations(&domain, &payoff, |_, rng| uniform_law(rng), &sequential, |p| {
            seen.push(p)
        })
        .unwrap();
        let b =
            run_iterations(&domain, &payoff, |_, rng| uniform_law(rng), &concurrent, |_| {}).unwrap();

        assert_eq!(a, b);
        assert_eq!(seen, vec![25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn test_predicted_prices_average_over_all_trials() {
        let (domain, payoff) = setup();
        let cfg = IterationConfig {
            num_iterations: 3,
            num_simulations: 1_000,
            seed: 1,
            ..Default::default()
        };
        let result = run_iterations(&domain, &payoff, |_, _| 1.1, &cfg, |_| {}).unwrap();
        assert_relative_eq!(result.predicted_asset_prices[0], 110.0, epsilon = 1e-9);
        assert_relative_eq!(result.price, 10.0, epsilon = 1e-9);
        assert_eq!(result.num_iterations, 3);
    }

    #[test]
    fn test_rejected_trials_fail_the_run() {
        let (domain, payoff) = setup();
        let cfg = IterationConfig {
            num_iterations: 2,
            num_simulations: 1_000,
            seed: 9,
            ..Default::default()
        };

        // a law centred on the upper bound loses about half its trials
        let spill = |_: usize, rng: &mut CounterRng| rng.uniform_in(1.5, 2.5);
        let err = run_iterations(&domain, &payoff, spill, &cfg, |_| {}).unwrap_err();
        match err {
            McError::MonteCarlo(MonteCarloError::ExcessiveRejection { rejected, trials }) => {
                assert_eq!(trials, 2_000);
                assert!(rejected > 800 && rejected < 1_200, "rejected {}", rejected);
            }
            other => panic!("expected ExcessiveRejection, got {:?}", other),
        }

        // a degenerate box that misses a constant law rejects everything
        let point = Domain::hyperrectangle(vec![1.002, 1.002]).unwrap();
        assert!(matches!(
            run_iterations(&point, &payoff, |_, _| 1.504, &cfg, |_| {}),
            Err(McError::MonteCarlo(MonteCarloError::ExcessiveRejection {
                rejected: 2_000,
                trials: 2_000
            }))
        ));

        // one rejection in 2 000 trials stays under the limit
        let result = run_iterations(
            &domain,
            &payoff,
            |_, rng| if rng.uniform() < 1e-4 { 3.0 } else { 1.0 },
            &cfg,
            |_| {},
        );
        assert!(result.map(|r| r.points_rejected <= 2).unwrap_or(false));
    }

    #[test]
    fn test_invalid_config() {
        let (domain, payoff) = setup();
        let cfg = IterationConfig {
            num_iterations: 0,
            ..Default::default()
        };
        assert!(run_iterations(&domain, &payoff, |_, _| 1.0, &cfg, |_| {}).is_err());

        let cfg = IterationConfig {
            num_simulations: 0,
            ..Default::default()
        };
        assert!(matches!(
            run_iterations(&domain, &payoff, |_, _| 1.0, &cfg, |_| {}),
            Err(McError::InsufficientSamples { .. })
        ));
    }
}
