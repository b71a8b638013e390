// src/finance/asset.rs
use crate::error::{validation::*, McError, McResult};
use statrs::statistics::Statistics;

/// Trading days used to annualise daily statistics
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// Daily-return statistics of one underlying
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    name: String,
    return_mean: f64,
    return_std_dev: f64,
    last_close: f64,
    observations: usize,
}

impl Asset {
    pub fn new(
        name: impl Into<String>,
        return_mean: f64,
        return_std_dev: f64,
        last_close: f64,
        observations: usize,
    ) -> McResult<Self> {
        validate_finite("return_mean", return_mean)?;
        validate_finite("return_std_dev", return_std_dev)?;
        if return_std_dev < 0.0 {
            return Err(McError::InvalidConfiguration {
                field: "return_std_dev".to_string(),
                reason: format!("must be non-negative (≥ 0), got {}", return_std_dev),
            });
        }
        validate_positive("last_close", last_close)?;
        validate_finite("last_close", last_close)?;
        if observations == 0 {
            return Err(McError::InvalidConfiguration {
                field: "observations".to_string(),
                reason: "an asset needs at least one daily return".to_string(),
            });
        }

        Ok(Self {
            name: name.into(),
            return_mean,
            return_std_dev,
            last_close,
            observations,
        })
    }

    /// Mean and population standard deviation of `daily_returns`
    pub fn from_daily_returns(
        name: impl Into<String>,
        daily_returns: &[f64],
        last_close: f64,
    ) -> McResult<Self> {
        if daily_returns.is_empty() {
            return Err(McError::InvalidConfiguration {
                field: "daily_returns".to_string(),
                reason: "no daily returns".to_string(),
            });
        }
        let mean = daily_returns.iter().mean();
        let std_dev = daily_returns.iter().population_std_dev();
        Self::new(name, mean, std_dev, last_close, daily_returns.len())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_mean(&self) -> f64 {
        self.return_mean
    }

    pub fn return_std_dev(&self) -> f64 {
        self.return_std_dev
    }

    pub fn last_close(&self) -> f64 {
        self.last_close
    }

    /// Number of daily returns the statistics were computed from
    pub fn observations(&self) -> usize {
        self.observations
    }

    /// σ_daily · √252
    pub fn annualized_volatility(&self) -> f64 {
        self.return_std_dev * (TRADING_DAYS_PER_YEAR as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_population_statistics() {
        let asset = Asset::from_daily_returns("ACME", &[0.01, -0.01, 0.03, -0.03], 120.0).unwrap();
        assert_relative_eq!(asset.return_mean(), 0.0, epsilon = 1e-15);
        // population variance: (1 + 1 + 9 + 9) e-4 / 4 = 5e-4
        assert_relative_eq!(asset.return_std_dev(), 5e-4f64.sqrt(), epsilon = 1e-12);
        assert_eq!(asset.observations(), 4);
        assert_eq!(asset.name(), "ACME");
    }

    #[test]
    fn test_invalid_assets() {
        assert!(Asset::new("X", 0.0, -0.1, 10.0, 5).is_err());
        assert!(Asset::new("X", 0.0, 0.1, 0.0, 5).is_err());
        assert!(Asset::new("X", f64::NAN, 0.1, 10.0, 5).is_err());
        assert!(Asset::new("X", 0.0, 0.1, 10.0, 0).is_err());
        assert!(Asset::from_daily_returns("X", &[], 10.0).is_err());
    }

    #[test]
    fn test_annualized_volatility() {
        let asset = Asset::new("X", 0.0, 0.01, 50.0, 252).unwrap();
        assert_relative_eq!(asset.annualized_volatility(), 0.01 * 252f64.sqrt(), epsilon = 1e-15);
    }
}
