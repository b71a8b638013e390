//! # fast-mci: Parallel Monte Carlo Integration and Basket Option Pricing
//!
//! A Rust library for estimating integrals over hyper-dimensional domains by
//! Monte Carlo sampling, and for pricing options by treating the discounted
//! expected payoff as such an integral over simulated asset returns.
//!
//! ## Key Features
//!
//! - **Geometric Domains**: hyperspheres, hypercubes and hyperrectangles with exact volumes
//! - **Parallel Sampling**: per-coordinate random streams fanned out on a cached Rayon pool
//! - **Reproducible**: counter-based streams, a pinned seed reproduces a run bit for bit
//! - **Option Pricing**: European and Asian basket calls from CSV price histories
//! - **Error Estimates**: outer iterations averaged into a price and a standard error
//! - **Cross-Check**: Black-Scholes closed form for single-asset European calls
//!
//! ## Quick Start
//!
//! ```rust
//! use fast_mci::geometry::{Domain, PointSampler};
//! use fast_mci::mc::estimate_volume;
//!
//! let ball = Domain::hypersphere(3, 1.0).expect("valid domain");
//! let sampler = PointSampler::new(ball.dimension(), 42).expect("valid sampler");
//! let estimate = estimate_volume(&ball, &sampler, 100_000).expect("valid batch");
//! println!(
//!     "volume ≈ {:.4} ± {:.4} (exact {:.4})",
//!     estimate.approximate_volume, estimate.standard_error, estimate.exact_volume
//! );
//! ```
//!
//! ## Mathematical Foundation
//!
//! For a domain `D` inside a bounding box `B`, with `n` points drawn uniformly in `B`:
//!
//! ```text
//! ∫_D f ≈ V(B) · (1/n) Σ f(xᵢ)·1_D(xᵢ)
//! ```
//!
//! The pricing mode draws each coordinate from an asset's return law instead,
//! restricted to a box of `k` standard deviations around the mean.

// Module declarations
pub mod analytics;
pub mod config;
pub mod console;
pub mod error;
pub mod expression;
pub mod finance;
pub mod geometry;
pub mod math_utils;
pub mod mc;
pub mod orchestrator;
pub mod output;
pub mod rng;

// Re-export commonly used types for convenience
pub use error::{McError, McResult};
