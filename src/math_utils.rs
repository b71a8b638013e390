// src/math_utils.rs
use statrs::function::{erf, gamma};
use std::f64::consts::{PI, SQRT_2};

pub fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf::erf(x / SQRT_2))
}

/// Volume of the `d`-ball of radius `r`: π^(d/2) / Γ(d/2 + 1) · r^d
pub fn n_ball_volume(dimension: usize, radius: f64) -> f64 {
    let half = dimension as f64 / 2.0;
    PI.powf(half) / gamma::gamma(half + 1.0) * radius.powi(dimension as i32)
}

pub struct Timer {
    start_time: std::time::Instant,
}

impl Timer {
    pub fn new() -> Timer {
        Timer {
            start_time: std::time::Instant::now(),
        }
    }

    pub fn start(&mut self) {
        self.start_time = std::time::Instant::now();
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
