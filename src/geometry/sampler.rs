// src/geometry/sampler.rs
//! Parallel Point Sampler
//!
//! # Algorithm
//!
//! One sampled point is produced per call:
//!
//! 1. Coordinate `i` of draw `t` is generated by worker `i` from its private
//!    stream `RngFactory::worker_rng(t, i)`
//! 2. Each worker reports a partial `(xᵢ², lowerᵢ ≤ xᵢ ≤ upperᵢ)`
//! 3. The partials are reduced into one sum of squares and one bounds flag
//! 4. The domain decides membership; a rejected point is overwritten with zeros
//!
//! # Threading
//!
//! High-dimensional points fan out over a rayon pool sized to
//! `min(dimension, cores)`, built once per sampler. Low-dimensional points are
//! generated inline on the calling thread. Since streams are keyed by
//! coordinate index rather than by thread, both paths produce the same
//! coordinates.

use crate::error::{McError, McResult};
use crate::geometry::domain::Domain;
use crate::rng::{CounterRng, RngFactory};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

/// Dimension from which coordinates are generated on the worker pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 16;

/// One candidate point, with its membership verdict
#[derive(Debug, Clone, PartialEq)]
pub struct SampledPoint {
    coords: Vec<f64>,
    inside: bool,
}

impl SampledPoint {
    pub fn new(dimension: usize) -> Self {
        Self {
            coords: vec![0.0; dimension],
            inside: false,
        }
    }

    pub fn coordinates(&self) -> &[f64] {
        &self.coords
    }

    pub fn is_inside(&self) -> bool {
        self.inside
    }

    pub fn dimension(&self) -> usize {
        self.coords.len()
    }

    pub fn into_coordinates(self) -> Vec<f64> {
        self.coords
    }

    fn reject(&mut self) {
        self.coords.fill(0.0);
        self.inside = false;
    }
}

/// Per-worker partial result folded by the reduction
#[derive(Debug, Clone, Copy)]
struct AxisPartial {
    sum_of_squares: f64,
    in_bounds: bool,
    first_non_finite: Option<usize>,
}

impl AxisPartial {
    fn identity() -> Self {
        Self {
            sum_of_squares: 0.0,
            in_bounds: true,
            first_non_finite: None,
        }
    }

    fn of(domain: &Domain, axis: usize, value: f64) -> Self {
        Self {
            sum_of_squares: value * value,
            in_bounds: domain.axis_contains(axis, value),
            first_non_finite: (!value.is_finite()).then_some(axis),
        }
    }

    fn merge(a: Self, b: Self) -> Self {
        Self {
            sum_of_squares: a.sum_of_squares + b.sum_of_squares,
            in_bounds: a.in_bounds && b.in_bounds,
            first_non_finite: match (a.first_non_finite, b.first_non_finite) {
                (Some(x), Some(y)) => Some(x.min(y)),
                (x, y) => x.or(y),
            },
        }
    }
}

/// Generates sampled points with one independent random stream per coordinate
pub struct PointSampler {
    factory: RngFactory,
    dimension: usize,
    pool: Option<ThreadPool>,
}

impl PointSampler {
    pub fn new(dimension: usize, seed: u64) -> McResult<Self> {
        Self::with_parallel_threshold(dimension, seed, DEFAULT_PARALLEL_THRESHOLD)
    }

    /// Sampler that uses the worker pool once `dimension >= threshold`
    pub fn with_parallel_threshold(
        dimension: usize,
        seed: u64,
        threshold: usize,
    ) -> McResult<Self> {
        if dimension == 0 {
            return Err(McError::invalid_domain("sampler dimension must be at least 1"));
        }

        let pool = if dimension >= threshold.max(1) {
            let workers = dimension.min(num_cpus::get()).max(1);
            let pool = ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("mci-sampler-{}", i))
                .build()
                .map_err(|e| McError::point_generation(format!("worker pool: {}", e)))?;
            debug!(dimension, workers, "built sampler worker pool");
            Some(pool)
        } else {
            None
        };

        Ok(Self {
            factory: RngFactory::new(seed),
            dimension,
            pool,
        })
    }

    pub fn seed(&self) -> u64 {
        self.factory.base_seed()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn workers(&self) -> usize {
        self.pool.as_ref().map_or(1, |p| p.current_num_threads())
    }

    /// Uniform draw over the domain's axis ranges
    pub fn sample_uniform_into(
        &self,
        domain: &Domain,
        draw: u64,
        point: &mut SampledPoint,
    ) -> McResult<()> {
        self.sample_into(
            domain,
            draw,
            |axis, rng| {
                // axes are checked against the domain below; NaN surfaces as a generation error
                domain
                    .axis_range(axis)
                    .map_or(f64::NAN, |(low, high)| rng.uniform_in(low, high))
            },
            point,
        )
    }

    /// Draw point number `draw`, coordinate `i` being `law(i, worker_rng)`
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` when the point or domain dimension does not match
    /// - `MonteCarloError::PointGenerationFailed` when the law yields a non-finite value
    pub fn sample_into<F>(
        &self,
        domain: &Domain,
        draw: u64,
        law: F,
        point: &mut SampledPoint,
    ) -> McResult<()>
    where
        F: Fn(usize, &mut CounterRng) -> f64 + Sync,
    {
        if domain.dimension() != self.dimension || point.dimension() != self.dimension {
            return Err(McError::InvalidConfiguration {
                field: "dimension".to_string(),
                reason: format!(
                    "sampler has {} axes, domain {}, point {}",
                    self.dimension,
                    domain.dimension(),
                    point.dimension()
                ),
            });
        }

        let factory = self.factory;
        let fill = |axis: usize, slot: &mut f64| {
            let mut rng = factory.worker_rng(draw, axis as u64);
            *slot = law(axis, &mut rng);
            AxisPartial::of(domain, axis, *slot)
        };

        let partial = match &self.pool {
            Some(pool) => pool.install(|| {
                point
                    .coords
                    .par_iter_mut()
                    .enumerate()
                    .map(|(axis, slot)| fill(axis, slot))
                    .reduce(AxisPartial::identity, AxisPartial::merge)
            }),
            None => point
                .coords
                .iter_mut()
                .enumerate()
                .map(|(axis, slot)| fill(axis, slot))
                .fold(AxisPartial::identity(), AxisPartial::merge),
        };

        if let Some(axis) = partial.first_non_finite {
            return Err(McError::point_generation(format!(
                "draw {} produced a non-finite value on axis {}",
                draw, axis
            )));
        }

        point.inside = domain.accepts(partial.sum_of_squares, partial.in_bounds);
        if !point.inside {
            point.reject();
        }
        Ok(())
    }
}
