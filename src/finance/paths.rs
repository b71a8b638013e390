// src/finance/paths.rs
//! Simulated Price Factors
//!
//! # Model
//!
//! Daily returns of asset `i` are i.i.d. `N(μᵢ, σᵢ)`. After `d` trading days the
//! price factor (price / last close) is the simple cumulative return
//!
//! ```text
//! Fᵢ(d) = 1 + Σ_{j ≤ d} rᵢⱼ
//! ```
//!
//! - **European**: only `Fᵢ(H)` matters, and a sum of `H` i.i.d. normals is
//!   itself normal, so one draw suffices: `Fᵢ(H) ~ N(1 + Hμᵢ, √H·σᵢ)`
//! - **Asian**: the payoff depends on the arithmetic average
//!   `(1/H) Σ_{d=1..H} Fᵢ(d)`, which needs the whole path (`H` draws)
//!
//! # Fit to the Sampling Box
//!
//! The pricing box only holds `μᵢ ± k·σᵢ` around 1, while the drawn factor has
//! mean `mᵢ` and deviation `sᵢ`:
//!
//! ```text
//! European: mᵢ = 1 + Hμᵢ,           sᵢ = σᵢ·√H
//! Asian:    mᵢ = 1 + μᵢ(H + 1)/2,   sᵢ = σᵢ·√((H + 1)(2H + 1) / 6H)
//! ```
//!
//! Draws outside the box score nothing, so a run is only accepted when
//! `mᵢ ± 6·sᵢ` lies inside every axis range.

use crate::error::{McError, McResult};
use crate::finance::asset::{Asset, TRADING_DAYS_PER_YEAR};
use crate::finance::payoff::OptionType;
use crate::geometry::domain::Domain;
use crate::rng::CounterRng;
use rand_distr::{Distribution, StandardNormal};

/// Default simulation horizon: one trading year
pub const DEFAULT_HORIZON_DAYS: usize = TRADING_DAYS_PER_YEAR;

/// Deviations of the drawn factor that must fit inside each axis range
pub const CONTAINMENT_STD_DEVS: f64 = 6.0;

/// Mean and standard deviation of the factor drawn over `horizon_days`
fn factor_moments(
    option_type: OptionType,
    mean: f64,
    std_dev: f64,
    horizon_days: usize,
) -> (f64, f64) {
    let h = horizon_days as f64;
    match option_type {
        OptionType::European => (1.0 + h * mean, h.sqrt() * std_dev),
        OptionType::Asian => (
            1.0 + mean * (h + 1.0) / 2.0,
            std_dev * ((h + 1.0) * (2.0 * h + 1.0) / (6.0 * h)).sqrt(),
        ),
    }
}

fn fits(moments: (f64, f64), (lower, upper): (f64, f64)) -> bool {
    let (mean, std_dev) = moments;
    let spread = CONTAINMENT_STD_DEVS * std_dev;
    // rounding slack for degenerate (zero-width) ranges
    let slack = 1e-12 * (1.0 + lower.abs().max(upper.abs()));
    mean - spread >= lower - slack && mean + spread <= upper + slack
}

/// Draws one price factor per asset axis
#[derive(Debug, Clone)]
pub struct ReturnLaw {
    drifts: Vec<(f64, f64)>,
    option_type: OptionType,
    horizon_days: usize,
}

impl ReturnLaw {
    pub fn new(assets: &[Asset], option_type: OptionType, horizon_days: usize) -> McResult<Self> {
        if horizon_days == 0 {
            return Err(McError::InvalidConfiguration {
                field: "horizon_days".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(Self {
            drifts: assets
                .iter()
                .map(|a| (a.return_mean(), a.return_std_dev()))
                .collect(),
            option_type,
            horizon_days,
        })
    }

    pub fn dimension(&self) -> usize {
        self.drifts.len()
    }

    pub fn horizon_days(&self) -> usize {
        self.horizon_days
    }

    /// Mean and standard deviation of the factor drawn on `axis`
    pub fn moments(&self, axis: usize) -> Option<(f64, f64)> {
        self.drifts.get(axis).map(|&(mean, std_dev)| {
            factor_moments(self.option_type, mean, std_dev, self.horizon_days)
        })
    }

    /// Longest horizon, up to the configured one, whose draws stay inside `domain`
    ///
    /// `None` when not even a single day fits.
    pub fn longest_fitting_horizon(&self, domain: &Domain) -> Option<usize> {
        (1..=self.horizon_days).rev().find(|&days| {
            self.drifts.iter().enumerate().all(|(axis, &(mean, std_dev))| {
                domain.axis_range(axis).map_or(false, |range| {
                    fits(factor_moments(self.option_type, mean, std_dev, days), range)
                })
            })
        })
    }

    /// Fail unless every axis keeps `mean ± 6·std` of its draws inside `domain`
    ///
    /// Otherwise a noticeable share of trials would be rejected, and since
    /// rejected trials pay nothing the price would come out biased low.
    pub fn check_fits(&self, domain: &Domain) -> McResult<()> {
        if domain.dimension() != self.dimension() {
            return Err(McError::InvalidConfiguration {
                field: "domain".to_string(),
                reason: format!(
                    "return law covers {} assets but the domain has {} axes",
                    self.dimension(),
                    domain.dimension()
                ),
            });
        }

        for axis in 0..self.dimension() {
            let (Some(moments), Some(range)) = (self.moments(axis), domain.axis_range(axis)) else {
                continue;
            };
            if fits(moments, range) {
                continue;
            }
            let supported = match self.longest_fitting_horizon(domain) {
                Some(days) => format!("horizon_days <= {}", days),
                None => "no horizon".to_string(),
            };
            return Err(McError::Bounds {
                reason: format!(
                    "a {}-day horizon puts axis {} outside [{:.6}, {:.6}] \
                     (factor mean {:.6}, std {:.6}); the price history supports {}",
                    self.horizon_days, axis, range.0, range.1, moments.0, moments.1, supported
                ),
            });
        }
        Ok(())
    }

    /// Price factor for the asset on `axis`, drawn from that worker's stream
    pub fn draw(&self, axis: usize, rng: &mut CounterRng) -> f64 {
        let (mean, std_dev) = self.drifts[axis];
        let h = self.horizon_days as f64;

        match self.option_type {
            OptionType::European => {
                let z: f64 = StandardNormal.sample(rng);
                1.0 + h * mean + h.sqrt() * std_dev * z
            }
            OptionType::Asian => {
                let mut cumulative = 0.0;
                let mut factor_sum = 0.0;
                for _ in 0..self.horizon_days {
                    let z: f64 = StandardNormal.sample(rng);
                    cumulative += mean + std_dev * z;
                    factor_sum += 1.0 + cumulative;
                }
                factor_sum / h
            }
        }
    }
}
