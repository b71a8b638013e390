// src/geometry/domain.rs
//! Bounded Sampling Domains
//!
//! # Shapes
//!
//! | Shape            | Axis range        | Membership                | Volume                          |
//! |------------------|-------------------|---------------------------|---------------------------------|
//! | `HyperSphere`    | `[-r, r]`         | `Σ xᵢ² ≤ r²`              | `π^(d/2) / Γ(d/2 + 1) · r^d`    |
//! | `HyperCube`      | `[-s, s]`         | always                    | `(2s)^d`                        |
//! | `HyperRectangle` | `[lowerᵢ, upperᵢ]`| `lowerᵢ ≤ xᵢ ≤ upperᵢ`    | `Π (upperᵢ − lowerᵢ)`           |
//!
//! Points are drawn inside the bounding box spanned by the axis ranges, so the
//! approximate volume of a shape is the accepted fraction of draws times the
//! volume of that box.

use crate::error::{McError, McResult};
use crate::geometry::sampler::{PointSampler, SampledPoint};
use crate::math_utils::n_ball_volume;

/// Ball of radius `radius` centred at the origin
#[derive(Debug, Clone, PartialEq)]
pub struct HyperSphere {
    dimension: usize,
    radius: f64,
}

impl HyperSphere {
    pub fn new(dimension: usize, radius: f64) -> McResult<Self> {
        check_dimension(dimension)?;
        check_extent("radius", radius)?;
        Ok(Self { dimension, radius })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

/// Axis-aligned cube `[-side, side]^d`
#[derive(Debug, Clone, PartialEq)]
pub struct HyperCube {
    dimension: usize,
    side: f64,
}

impl HyperCube {
    pub fn new(dimension: usize, side: f64) -> McResult<Self> {
        check_dimension(dimension)?;
        check_extent("side", side)?;
        Ok(Self { dimension, side })
    }

    pub fn side(&self) -> f64 {
        self.side
    }
}

/// Axis-aligned box with independent bounds per axis
///
/// Bounds are stored interleaved: `[lower₀, upper₀, lower₁, upper₁, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperRectangle {
    bounds: Vec<f64>,
}

impl HyperRectangle {
    pub fn new(bounds: Vec<f64>) -> McResult<Self> {
        if bounds.is_empty() {
            return Err(McError::invalid_domain(
                "a hyperrectangle needs at least one pair of bounds",
            ));
        }
        if bounds.len() % 2 != 0 {
            return Err(McError::invalid_domain(format!(
                "expected lower/upper pairs, got {} bound values",
                bounds.len()
            )));
        }
        for (axis, pair) in bounds.chunks_exact(2).enumerate() {
            let (lower, upper) = (pair[0], pair[1]);
            if !lower.is_finite() || !upper.is_finite() {
                return Err(McError::invalid_domain(format!(
                    "axis {} has non-finite bounds [{}, {}]",
                    axis, lower, upper
                )));
            }
            if lower > upper {
                return Err(McError::invalid_domain(format!(
                    "axis {} has inverted bounds: lower {} > upper {}",
                    axis, lower, upper
                )));
            }
        }
        Ok(Self { bounds })
    }

    /// Build from `(lower, upper)` pairs
    pub fn from_pairs(pairs: &[(f64, f64)]) -> McResult<Self> {
        Self::new(pairs.iter().flat_map(|&(lo, hi)| [lo, hi]).collect())
    }

    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// `None` when `axis` is not below the dimension
    pub fn axis_bounds(&self, axis: usize) -> Option<(f64, f64)> {
        if axis >= self.bounds.len() / 2 {
            return None;
        }
        Some((self.bounds[2 * axis], self.bounds[2 * axis + 1]))
    }
}

fn check_dimension(dimension: usize) -> McResult<()> {
    if dimension < 1 {
        Err(McError::invalid_domain("dimension must be at least 1"))
    } else {
        Ok(())
    }
}

fn check_extent(name: &str, value: f64) -> McResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(McError::invalid_domain(format!(
            "{} must be positive and finite, got {}",
            name, value
        )))
    }
}

/// Sampling domain, dispatched by shape
#[derive(Debug, Clone, PartialEq)]
pub enum Domain {
    HyperSphere(HyperSphere),
    HyperCube(HyperCube),
    HyperRectangle(HyperRectangle),
}

impl Domain {
    pub fn hypersphere(dimension: usize, radius: f64) -> McResult<Self> {
        HyperSphere::new(dimension, radius).map(Domain::HyperSphere)
    }

    pub fn hypercube(dimension: usize, side: f64) -> McResult<Self> {
        HyperCube::new(dimension, side).map(Domain::HyperCube)
    }

    pub fn hyperrectangle(bounds: Vec<f64>) -> McResult<Self> {
        HyperRectangle::new(bounds).map(Domain::HyperRectangle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Domain::HyperSphere(_) => "hypersphere",
            Domain::HyperCube(_) => "hypercube",
            Domain::HyperRectangle(_) => "hyperrectangle",
        }
    }

    pub fn dimension(&self) -> usize {
        match self {
            Domain::HyperSphere(s) => s.dimension,
            Domain::HyperCube(c) => c.dimension,
            Domain::HyperRectangle(r) => r.bounds.len() / 2,
        }
    }

    /// Interval uniform draws are taken from on `axis`, `None` past the last axis
    pub fn axis_range(&self, axis: usize) -> Option<(f64, f64)> {
        if axis >= self.dimension() {
            return None;
        }
        match self {
            Domain::HyperSphere(s) => Some((-s.radius, s.radius)),
            Domain::HyperCube(c) => Some((-c.side, c.side)),
            Domain::HyperRectangle(r) => r.axis_bounds(axis),
        }
    }

    /// Axis-by-axis part of the membership test
    #[inline]
    pub fn axis_contains(&self, axis: usize, value: f64) -> bool {
        self.axis_range(axis)
            .map_or(false, |(lower, upper)| lower <= value && value <= upper)
    }

    /// Membership decision from a reduced sum of squares and axis checks
    pub(crate) fn accepts(&self, sum_of_squares: f64, in_bounds: bool) -> bool {
        match self {
            Domain::HyperSphere(s) => sum_of_squares <= s.radius * s.radius,
            // draws never leave the axis ranges, so this holds for every sampled point
            Domain::HyperCube(_) | Domain::HyperRectangle(_) => in_bounds,
        }
    }

    pub fn contains(&self, point: &[f64]) -> bool {
        if point.len() != self.dimension() {
            return false;
        }
        let sum_of_squares = point.iter().map(|x| x * x).sum::<f64>();
        let in_bounds = point
            .iter()
            .enumerate()
            .all(|(axis, &x)| self.axis_contains(axis, x));
        self.accepts(sum_of_squares, in_bounds)
    }

    /// Closed-form volume of the shape
    pub fn exact_volume(&self) -> f64 {
        match self {
            Domain::HyperSphere(s) => n_ball_volume(s.dimension, s.radius),
            Domain::HyperCube(c) => (2.0 * c.side).powi(c.dimension as i32),
            Domain::HyperRectangle(r) => r
                .bounds
                .chunks_exact(2)
                .map(|pair| pair[1] - pair[0])
                .product(),
        }
    }

    /// Volume of the box points are drawn from
    pub fn bounding_volume(&self) -> f64 {
        match self {
            Domain::HyperSphere(s) => (2.0 * s.radius).powi(s.dimension as i32),
            Domain::HyperCube(_) | Domain::HyperRectangle(_) => self.exact_volume(),
        }
    }

    /// Volume estimate from `points_inside` accepted draws out of `n`
    pub fn approximate_volume(&self, points_inside: usize, n: usize) -> McResult<f64> {
        if n == 0 {
            return Err(McError::InsufficientSamples { requested: n });
        }
        Ok(points_inside as f64 / n as f64 * self.bounding_volume())
    }

    /// Draw one point uniformly in the bounding box and keep it only if it is
    /// inside the shape; rejected points come back as the all-zero vector.
    pub fn generate_point_if_inside(
        &self,
        sampler: &PointSampler,
        draw: u64,
    ) -> McResult<SampledPoint> {
        let mut point = SampledPoint::new(self.dimension());
        sampler.sample_uniform_into(self, draw, &mut point)?;
        Ok(point)
    }
}
