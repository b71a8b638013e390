// src/mc/estimator.rs
//! Single-Batch Monte Carlo Estimators
//!
//! # Modes
//!
//! | Mode      | Per inside point     | Result                                     |
//! |-----------|----------------------|--------------------------------------------|
//! | volume    | count                | `inside / n · V_box`                       |
//! | integral  | `f(x)`               | `V_box · (1/n) Σ f(x)·1_inside`            |
//! | price     | discounted payoff    | `(1/n) Σ payoff(x)·1_inside`               |
//!
//! Every batch also reports the plain Monte Carlo variance
//!
//! ```text
//! σ² = (1/n) Σ y² − ȳ²
//! ```
//!
//! # Rejected Points
//!
//! The sampler reports rejected points as the all-zero vector. They are never
//! evaluated: they add zero to every sum and still count towards `n`.

use crate::error::{validation::*, McError, McResult};
use crate::expression::Expression;
use crate::finance::payoff::PayoffFunction;
use crate::geometry::domain::Domain;
use crate::geometry::sampler::{PointSampler, SampledPoint};
use crate::rng::CounterRng;
use tracing::debug;

/// Outcome of one pricing batch
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationResult {
    /// Mean discounted payoff over all trials
    pub price_estimate: f64,
    /// Sample variance of the per-trial payoff
    pub variance: f64,
    pub payoff_sum: f64,
    pub points_inside: usize,
    pub points_rejected: usize,
    pub num_simulations: usize,
    /// Σ over trials of each asset's simulated price, not yet averaged
    pub predicted_price_sums: Vec<f64>,
}

/// Outcome of a volume batch
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeEstimate {
    pub approximate_volume: f64,
    pub exact_volume: f64,
    pub points_inside: usize,
    pub num_simulations: usize,
    pub standard_error: f64,
}

impl VolumeEstimate {
    pub fn absolute_error(&self) -> f64 {
        (self.approximate_volume - self.exact_volume).abs()
    }
}

/// Outcome of an integral batch
#[derive(Debug, Clone, PartialEq)]
pub struct IntegralEstimate {
    pub integral: f64,
    /// Sample variance of `f(x)·1_inside`
    pub variance: f64,
    pub standard_error: f64,
    pub points_inside: usize,
    pub num_simulations: usize,
}

/// Mean and variance from running sums, with the usual rounding guard
fn finalize_moments(method: &str, sum: f64, sum_sq: f64, n: usize) -> McResult<(f64, f64)> {
    let mean = sum / n as f64;
    let mut variance = sum_sq / n as f64 - mean * mean;

    // Handle numerical precision issues that can cause negative variance
    if variance < 0.0 {
        if variance > -1e-10 {
            variance = 0.0;
        } else {
            return Err(McError::instability(format!(
                "{}: variance estimate became significantly negative: {}",
                method, variance
            )));
        }
    }

    if !mean.is_finite() {
        return Err(McError::instability(format!(
            "{}: estimate is not finite: {}",
            method, mean
        )));
    }
    if !variance.is_finite() {
        return Err(McError::instability(format!(
            "{}: variance estimate is not finite: {}",
            method, variance
        )));
    }

    Ok((mean, variance))
}

/// Estimate the volume of `domain` from `n` uniform draws
pub fn estimate_volume(
    domain: &Domain,
    sampler: &PointSampler,
    n: usize,
) -> McResult<VolumeEstimate> {
    validate_simulations(n)?;

    let mut point = SampledPoint::new(domain.dimension());
    let mut points_inside = 0usize;
    for draw in 0..n {
        sampler.sample_uniform_into(domain, draw as u64, &mut point)?;
        if point.is_inside() {
            points_inside += 1;
        }
    }

    let approximate_volume = domain.approximate_volume(points_inside, n)?;
    let p = points_inside as f64 / n as f64;
    let standard_error = domain.bounding_volume() * (p * (1.0 - p) / n as f64).sqrt();

    debug!(
        domain = domain.name(),
        n, points_inside, approximate_volume, "volume batch done"
    );

    Ok(VolumeEstimate {
        approximate_volume,
        exact_volume: domain.exact_volume(),
        points_inside,
        num_simulations: n,
        standard_error,
    })
}

/// Estimate `∫_domain f` where `integrand` is compiled over one variable per axis
pub fn estimate_integral(
    domain: &Domain,
    integrand: &Expression,
    sampler: &PointSampler,
    n: usize,
) -> McResult<IntegralEstimate> {
    validate_simulations(n)?;
    if integrand.variables().len() != domain.dimension() {
        return Err(McError::InvalidConfiguration {
            field: "integrand".to_string(),
            reason: format!(
                "integrand binds {} variables but the domain has {} axes",
                integrand.variables().len(),
                domain.dimension()
            ),
        });
    }

    let mut point = SampledPoint::new(domain.dimension());
    let (mut sum, mut sum_sq) = (0.0, 0.0);
    let mut points_inside = 0usize;
    for draw in 0..n {
        sampler.sample_uniform_into(domain, draw as u64, &mut point)?;
        if !point.is_inside() {
            continue;
        }
        points_inside += 1;
        let y = integrand.evaluate(point.coordinates())?;
        sum += y;
        sum_sq += y * y;
    }

    let (mean, variance) = finalize_moments("integral", sum, sum_sq, n)?;
    let box_volume = domain.bounding_volume();

    Ok(IntegralEstimate {
        integral: box_volume * mean,
        variance,
        standard_error: box_volume * (variance / n as f64).sqrt(),
        points_inside,
        num_simulations: n,
    })
}

/// Price `payoff` over `domain` from `n` trials, coordinates drawn with `law`
///
/// # Errors
///
/// - `InsufficientSamples` when `n == 0`
/// - `InvalidConfiguration` when payoff, domain and sampler disagree on dimension
/// - `MonteCarloError` when a point cannot be generated or the statistics degenerate
pub fn estimate_price<F>(
    domain: &Domain,
    payoff: &PayoffFunction,
    sampler: &PointSampler,
    law: F,
    n: usize,
) -> McResult<EstimationResult>
where
    F: Fn(usize, &mut CounterRng) -> f64 + Sync,
{
    validate_simulations(n)?;
    let dimension = domain.dimension();
    if payoff.asset_count() != dimension {
        return Err(McError::InvalidConfiguration {
            field: "payoff".to_string(),
            reason: format!(
                "payoff covers {} assets but the domain has {} axes",
                payoff.asset_count(),
                dimension
            ),
        });
    }

    let spots = payoff.spot_prices();
    let mut point = SampledPoint::new(dimension);
    let mut scratch = Vec::with_capacity(2 * dimension + 3);
    let mut predicted_price_sums = vec![0.0; dimension];
    let (mut payoff_sum, mut payoff_sum_sq) = (0.0, 0.0);
    let mut points_inside = 0usize;

    for draw in 0..n {
        sampler.sample_into(domain, draw as u64, &law, &mut point)?;
        if !point.is_inside() {
            continue;
        }
        points_inside += 1;

        let value = payoff.evaluate_with(point.coordinates(), &mut scratch)?;
        payoff_sum += value;
        payoff_sum_sq += value * value;

        for ((sum, factor), spot) in predicted_price_sums
            .iter_mut()
            .zip(point.coordinates())
            .zip(spots)
        {
            *sum += spot * factor;
        }
    }

    let (price_estimate, variance) = finalize_moments("price", payoff_sum, payoff_sum_sq, n)?;

    debug!(
        seed = sampler.seed(),
        n,
        points_inside,
        price_estimate,
        variance,
        "pricing batch done"
    );

    Ok(EstimationResult {
        price_estimate,
        variance,
        payoff_sum,
        points_inside,
        points_rejected: n - points_inside,
        num_simulations: n,
        predicted_price_sums,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::asset::Asset;
    use crate::finance::payoff::OptionType;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_simulations() {
        let ball = Domain::hypersphere(2, 1.0).unwrap();
        let sampler = PointSampler::new(2, 1).unwrap();
        assert!(matches!(
            estimate_volume(&ball, &sampler, 0),
            Err(McError::InsufficientSamples { requested: 0 })
        ));
    }

    #[test]
    fn test_disc_volume() {
        let disc = Domain::hypersphere(2, 1.0).unwrap();
        let sampler = PointSampler::new(2, 2024).unwrap();
        let estimate = estimate_volume(&disc, &sampler, 200_000).unwrap();
        assert!(
            estimate.absolute_error() < 4.0 * estimate.standard_error,
            "{:?}",
            estimate
        );
    }

    #[test]
    fn test_cube_volume_has_no_sampling_error() {
        let cube = Domain::hypercube(3, 0.5).unwrap();
        let sampler = PointSampler::new(3, 1).unwrap();
        let estimate = estimate_volume(&cube, &sampler, 1_000).unwrap();
        assert_eq!(estimate.points_inside, 1_000);
        assert_eq!(estimate.approximate_volume, 1.0);
        assert_eq!(estimate.standard_error, 0.0);
    }

    #[test]
    fn test_integral_of_linear_function() {
        // ∫_{[0,2]×[0,1]} (x + y) = 2·1·(1 + 0.5) = 3
        let rect = Domain::hyperrectangle(vec![0.0, 2.0, 0.0, 1.0]).unwrap();
        let f = Expression::compile("x0 + x1", &["x0", "x1"]).unwrap();
        let sampler = PointSampler::new(2, 8).unwrap();
        let estimate = estimate_integral(&rect, &f, &sampler, 100_000).unwrap();
        assert_relative_eq!(estimate.integral, 3.0, epsilon = 4.0 * estimate.standard_error);

        let wrong = Expression::compile("x0", &["x0"]).unwrap();
        assert!(estimate_integral(&rect, &wrong, &sampler, 10).is_err());
    }

    #[test]
    fn test_price_of_deterministic_point() {
        // every trial lands on x = 1.2: payoff = max(0, 100·1.2 − 100) = 20
        let asset = Asset::new("A", 0.0, 0.01, 100.0, 252).unwrap();
        let payoff =
            PayoffFunction::new(OptionType::European, &[asset], 100.0, 0.0, 1.0).unwrap();
        let rect = Domain::hyperrectangle(vec![0.0, 2.0]).unwrap();
        let sampler = PointSampler::new(1, 3).unwrap();

        let result = estimate_price(&rect, &payoff, &sampler, |_, _| 1.2, 500).unwrap();
        assert_relative_eq!(result.price_estimate, 20.0, epsilon = 1e-9);
        assert_relative_eq!(result.variance, 0.0, epsilon = 1e-9);
        assert_eq!(result.points_inside, 500);
        assert_relative_eq!(result.predicted_price_sums[0], 500.0 * 120.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rejected_trials_contribute_nothing() {
        let asset = Asset::new("A", 0.0, 0.01, 100.0, 252).unwrap();
        let payoff =
            PayoffFunction::new(OptionType::European, &[asset], 50.0, 0.0, 1.0).unwrap();
        let rect = Domain::hyperrectangle(vec![0.9, 1.1]).unwrap();
        let sampler = PointSampler::new(1, 3).unwrap();

        // alternate between an accepted factor and one outside the bounds
        let result = estimate_price(
            &rect,
            &payoff,
            &sampler,
            |_, rng| if rng.uniform() < 0.5 { 1.0 } else { 3.0 },
            2_000,
        )
        .unwrap();
        assert!(result.points_rejected > 0);
        assert_eq!(result.points_inside + result.points_rejected, 2_000);
        // accepted trials pay 100 − 50; rejected ones pay nothing
        assert_relative_eq!(result.payoff_sum, 50.0 * result.points_inside as f64, epsilon = 1e-6);
        assert_relative_eq!(
            result.predicted_price_sums[0],
            100.0 * result.points_inside as f64,
            epsilon = 1e-6
        );
    }
}
