// src/mc/mod.rs
pub mod estimator;
pub mod iteration;

pub use estimator::{
    estimate_integral, estimate_price, estimate_volume, EstimationResult, IntegralEstimate,
    VolumeEstimate,
};
pub use iteration::{run_iterations, AggregatedResult, IterationConfig};
