// src/finance/bounds.rs
//! Integration Bounds from Asset Statistics
//!
//! # Formula
//!
//! Each asset spans one axis of the pricing hyperrectangle, expressed as a price
//! factor relative to the last close (baseline 1.0):
//!
//! ```text
//! lowerᵢ = μᵢ − k·σᵢ + 1
//! upperᵢ = μᵢ + k·σᵢ + 1
//! k      = 24 × months,   months = ⌊observations / 21⌋
//! ```
//!
//! where μᵢ, σᵢ are the mean and standard deviation of daily returns and 21 is
//! the number of trading days in a month.

use crate::error::{McError, McResult};
use crate::finance::asset::Asset;

pub const TRADING_DAYS_PER_MONTH: usize = 21;
pub const STD_DEVS_PER_MONTH: usize = 24;

/// Whole months covered by `observations` daily returns
pub fn observed_months(observations: usize) -> usize {
    observations / TRADING_DAYS_PER_MONTH
}

/// k = 24 × months
pub fn std_dev_multiplier(months: usize) -> usize {
    STD_DEVS_PER_MONTH * months
}

/// Interleaved `[lower₀, upper₀, lower₁, upper₁, ...]` bounds for `assets`
pub fn integration_bounds(assets: &[Asset], std_dev_from_mean: f64) -> McResult<Vec<f64>> {
    if assets.is_empty() {
        return Err(McError::Bounds {
            reason: "no assets to derive bounds from".to_string(),
        });
    }
    if !std_dev_from_mean.is_finite() || std_dev_from_mean < 0.0 {
        return Err(McError::Bounds {
            reason: format!("invalid standard deviation multiplier {}", std_dev_from_mean),
        });
    }

    let mut bounds = Vec::with_capacity(2 * assets.len());
    for asset in assets {
        let spread = std_dev_from_mean * asset.return_std_dev();
        let lower = asset.return_mean() - spread + 1.0;
        let upper = asset.return_mean() + spread + 1.0;
        if !lower.is_finite() || !upper.is_finite() {
            return Err(McError::Bounds {
                reason: format!("non-finite bounds for asset '{}'", asset.name()),
            });
        }
        bounds.push(lower);
        bounds.push(upper);
    }
    Ok(bounds)
}

/// Multiplier for a set of assets, from the shortest history among them
///
/// Fails when that history covers less than one month, since the bounds would
/// collapse to a single point.
pub fn multiplier_for(assets: &[Asset]) -> McResult<usize> {
    let observations = assets
        .iter()
        .map(Asset::observations)
        .min()
        .ok_or_else(|| McError::Bounds {
            reason: "no assets to derive bounds from".to_string(),
        })?;

    let k = std_dev_multiplier(observed_months(observations));
    if k == 0 {
        return Err(McError::Bounds {
            reason: format!(
                "{} daily returns cover less than one month ({} trading days)",
                observations, TRADING_DAYS_PER_MONTH
            ),
        });
    }
    Ok(k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_one_year_bounds() {
        let months = observed_months(252);
        assert_eq!(months, 12);
        let k = std_dev_multiplier(months);
        assert_eq!(k, 288);

        let asset = Asset::new("X", 0.01, 0.02, 100.0, 252).unwrap();
        let bounds = integration_bounds(&[asset], k as f64).unwrap();
        assert_relative_eq!(bounds[0], -4.75, epsilon = 1e-12);
        assert_relative_eq!(bounds[1], 5.77, epsilon = 1e-12);
    }

    #[test]
    fn test_bounds_are_interleaved_per_asset() {
        let a = Asset::new("A", 0.0, 0.01, 10.0, 42).unwrap();
        let b = Asset::new("B", 0.001, 0.0, 20.0, 63).unwrap();
        let k = multiplier_for(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(k, 48);

        let bounds = integration_bounds(&[a, b], k as f64).unwrap();
        assert_eq!(bounds.len(), 4);
        assert_relative_eq!(bounds[0], 0.52, epsilon = 1e-12);
        assert_relative_eq!(bounds[1], 1.48, epsilon = 1e-12);
        assert_relative_eq!(bounds[2], 1.001, epsilon = 1e-12);
        assert_relative_eq!(bounds[3], 1.001, epsilon = 1e-12);
    }

    #[test]
    fn test_bounds_failures() {
        assert!(matches!(integration_bounds(&[], 10.0), Err(McError::Bounds { .. })));
        let short = Asset::new("S", 0.0, 0.01, 10.0, 20).unwrap();
        assert!(matches!(multiplier_for(&[short]), Err(McError::Bounds { .. })));
        assert!(multiplier_for(&[]).is_err());
    }
}
