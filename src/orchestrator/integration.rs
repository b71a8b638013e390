// src/orchestrator/integration.rs
//! Geometric mode: volume of a domain and, optionally, the integral of a
//! user formula over it. The formula sees one variable per axis, `x0..x{d-1}`.

use crate::config::IntegrationConfig;
use crate::error::McResult;
use crate::expression::Expression;
use crate::geometry::sampler::PointSampler;
use crate::math_utils::Timer;
use crate::mc::estimator::{estimate_integral, estimate_volume, IntegralEstimate, VolumeEstimate};
use tracing::info;

#[derive(Debug, Clone)]
pub struct IntegrationReport {
    pub domain: &'static str,
    pub dimension: usize,
    pub volume: VolumeEstimate,
    pub integrand: Option<String>,
    pub integral: Option<IntegralEstimate>,
    pub seed: u64,
    pub elapsed_ms: f64,
}

/// `x0, x1, ...` for a `dimension`-dimensional domain
pub fn axis_variables(dimension: usize) -> Vec<String> {
    (0..dimension).map(|i| format!("x{}", i)).collect()
}

pub fn integrate(cfg: &IntegrationConfig) -> McResult<IntegrationReport> {
    cfg.validate()?;
    let mut timer = Timer::new();
    timer.start();

    let domain = cfg.build_domain()?;
    let seed = cfg.resolved_seed();
    let sampler =
        PointSampler::with_parallel_threshold(domain.dimension(), seed, cfg.parallel_threshold)?;
    info!(
        domain = domain.name(),
        dimension = domain.dimension(),
        simulations = cfg.num_simulations,
        seed,
        "estimating volume"
    );

    let volume = estimate_volume(&domain, &sampler, cfg.num_simulations)?;

    let integral = match &cfg.integrand {
        Some(formula) => {
            let names = axis_variables(domain.dimension());
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let expression = Expression::compile(formula, &refs)?;
            info!(formula = formula.as_str(), "estimating integral");
            Some(estimate_integral(&domain, &expression, &sampler, cfg.num_simulations)?)
        }
        None => None,
    };

    Ok(IntegrationReport {
        domain: domain.name(),
        dimension: domain.dimension(),
        volume,
        integrand: cfg.integrand.clone(),
        integral,
        seed,
        elapsed_ms: timer.elapsed_ms(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DomainShape;
    use crate::error::McError;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_ball_volume_and_integral() {
        let cfg = IntegrationConfig {
            dimension: 3,
            integrand: Some("1".to_string()),
            num_simulations: 100_000,
            seed: Some(3),
            ..Default::default()
        };
        let report = integrate(&cfg).unwrap();
        assert_eq!(report.domain, "hypersphere");
        let exact = 4.0 / 3.0 * std::f64::consts::PI;
        assert_relative_eq!(report.volume.exact_volume, exact, epsilon = 1e-12);

        // ∫ 1 over the ball is the same estimate as the volume
        let integral = report.integral.unwrap();
        assert_relative_eq!(
            integral.integral,
            report.volume.approximate_volume,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_rectangle_integral() {
        // ∫_{[0,1]×[0,3]} x0·x1 = 0.5 · 4.5 = 2.25
        let cfg = IntegrationConfig {
            shape: DomainShape::Rectangle,
            bounds: vec![0.0, 1.0, 0.0, 3.0],
            integrand: Some("x0 * x1".to_string()),
            num_simulations: 100_000,
            seed: Some(11),
            ..Default::default()
        };
        let report = integrate(&cfg).unwrap();
        assert_eq!(report.dimension, 2);
        assert_eq!(report.volume.approximate_volume, 3.0);
        let integral = report.integral.unwrap();
        assert_relative_eq!(integral.integral, 2.25, epsilon = 4.0 * integral.standard_error);
    }

    #[test]
    fn test_unknown_variable() {
        let cfg = IntegrationConfig {
            dimension: 2,
            integrand: Some("x0 + x2".to_string()),
            num_simulations: 10,
            seed: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            integrate(&cfg),
            Err(McError::Evaluation { .. })
        ));
    }
}
