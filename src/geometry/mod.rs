//! Geometric sampling domains and the parallel point sampler.

pub mod domain;
pub mod sampler;

pub use domain::{Domain, HyperCube, HyperRectangle, HyperSphere};
pub use sampler::{PointSampler, SampledPoint};
