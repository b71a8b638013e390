// src/finance/payoff.rs
//! Option Payoff Functions
//!
//! # Mathematical Definition
//!
//! The payoff of a basket call over `n` assets, discounted to today:
//!
//! ```text
//! payoff(x) = e^(−rT) · max(0, Σᵢ cᵢ·xᵢ − K)
//! ```
//!
//! - `xᵢ`: simulated price factor of asset `i` (price / last close)
//! - `cᵢ = wᵢ · Sᵢ`: basket weight times last close, so `cᵢ·xᵢ` is the weighted price
//! - `K`: strike, `r`: risk-free rate, `T`: maturity in years
//!
//! The same formula serves both option types; what differs is how `xᵢ` is drawn
//! (terminal factor for European, path-averaged factor for Asian).

use crate::error::{validation::*, McError, McResult};
use crate::expression::Expression;
use crate::finance::asset::Asset;
use std::fmt;
use std::str::FromStr;

/// Exercise style of the priced option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    /// Payoff on the terminal basket value
    European,
    /// Payoff on the path-averaged basket value
    Asian,
}

impl OptionType {
    /// Simulations per outer iteration when none are configured
    pub fn default_simulations(&self) -> usize {
        match self {
            OptionType::European => 1_000_000,
            OptionType::Asian => 100_000,
        }
    }
}

impl TryFrom<u32> for OptionType {
    type Error = McError;

    fn try_from(choice: u32) -> McResult<Self> {
        match choice {
            1 => Ok(OptionType::European),
            2 => Ok(OptionType::Asian),
            other => Err(McError::InvalidSelection {
                what: "option type".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for OptionType {
    type Err = McError;

    fn from_str(s: &str) -> McResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "european" => Ok(OptionType::European),
            "2" | "asian" => Ok(OptionType::Asian),
            other => Err(McError::InvalidSelection {
                what: "option type".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::European => write!(f, "European"),
            OptionType::Asian => write!(f, "Asian"),
        }
    }
}

/// Equally weighted at-the-money basket level: Σᵢ Sᵢ / n
pub fn at_the_money_strike(assets: &[Asset]) -> f64 {
    if assets.is_empty() {
        return 0.0;
    }
    assets.iter().map(Asset::last_close).sum::<f64>() / assets.len() as f64
}

/// `exp(-r*T) * max(0, c0*x0 + ... - K)` for `n` assets
pub fn basket_call_formula(n: usize) -> String {
    let basket = (0..n)
        .map(|i| format!("c{i}*x{i}"))
        .collect::<Vec<_>>()
        .join(" + ");
    format!("exp(-r*T) * max(0, {} - K)", basket)
}

/// Discounted payoff of an equally weighted basket call
#[derive(Debug, Clone)]
pub struct PayoffFunction {
    option_type: OptionType,
    expression: Expression,
    coefficients: Vec<f64>,
    spot_prices: Vec<f64>,
    strike: f64,
    rate: f64,
    maturity: f64,
}

impl PayoffFunction {
    pub fn new(
        option_type: OptionType,
        assets: &[Asset],
        strike: f64,
        rate: f64,
        maturity: f64,
    ) -> McResult<Self> {
        if assets.is_empty() {
            return Err(McError::InvalidConfiguration {
                field: "assets".to_string(),
                reason: "a payoff needs at least one asset".to_string(),
            });
        }
        validate_positive("strike", strike)?;
        validate_finite("strike", strike)?;
        validate_finite("risk_free_rate", rate)?;
        validate_positive("maturity", maturity)?;

        let n = assets.len();
        let weight = 1.0 / n as f64;
        let spot_prices: Vec<f64> = assets.iter().map(Asset::last_close).collect();
        let coefficients = spot_prices.iter().map(|s| weight * s).collect();

        let mut names: Vec<String> = (0..n).map(|i| format!("x{}", i)).collect();
        names.extend((0..n).map(|i| format!("c{}", i)));
        names.extend(["K", "r", "T"].iter().map(|s| s.to_string()));
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();

        let expression = Expression::compile(&basket_call_formula(n), &name_refs)?;

        Ok(Self {
            option_type,
            expression,
            coefficients,
            spot_prices,
            strike,
            rate,
            maturity,
        })
    }

    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    pub fn formula(&self) -> &str {
        self.expression.formula()
    }

    pub fn asset_count(&self) -> usize {
        self.spot_prices.len()
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn spot_prices(&self) -> &[f64] {
        &self.spot_prices
    }

    pub fn strike(&self) -> f64 {
        self.strike
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn maturity(&self) -> f64 {
        self.maturity
    }

    /// Discounted payoff at `point`, reusing `scratch` for the variable bindings
    pub fn evaluate_with(&self, point: &[f64], scratch: &mut Vec<f64>) -> McResult<f64> {
        if point.len() != self.asset_count() {
            return Err(McError::Evaluation {
                formula: self.formula().to_string(),
                reason: format!(
                    "point has {} coordinates, payoff expects {}",
                    point.len(),
                    self.asset_count()
                ),
            });
        }
        scratch.clear();
        scratch.extend_from_slice(point);
        scratch.extend_from_slice(&self.coefficients);
        scratch.extend_from_slice(&[self.strike, self.rate, self.maturity]);
        self.expression.evaluate(scratch)
    }

    pub fn evaluate(&self, point: &[f64]) -> McResult<f64> {
        let mut scratch = Vec::with_capacity(2 * self.asset_count() + 3);
        self.evaluate_with(point, &mut scratch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assets() -> Vec<Asset> {
        vec![
            Asset::new("A", 0.0, 0.01, 80.0, 252).unwrap(),
            Asset::new("B", 0.0, 0.01, 120.0, 252).unwrap(),
        ]
    }

    #[test]
    fn test_formula_shape() {
        assert_eq!(basket_call_formula(1), "exp(-r*T) * max(0, c0*x0 - K)");
        assert_eq!(
            basket_call_formula(2),
            "exp(-r*T) * max(0, c0*x0 + c1*x1 - K)"
        );
    }

    #[test]
    fn test_basket_payoff() {
        let assets = assets();
        let strike = at_the_money_strike(&assets);
        assert_eq!(strike, 100.0);

        let payoff = PayoffFunction::new(OptionType::European, &assets, strike, 0.0, 1.0).unwrap();
        assert_eq!(payoff.coefficients(), &[40.0, 60.0]);
        // basket = 40 * 1.5 + 60 * 1.0 = 120
        assert_relative_eq!(payoff.evaluate(&[1.5, 1.0]).unwrap(), 20.0, epsilon = 1e-12);
        assert_eq!(payoff.evaluate(&[0.5, 0.5]).unwrap(), 0.0);
        assert!(payoff.evaluate(&[1.0]).is_err());
    }

    #[test]
    fn test_discounting() {
        let assets = vec![Asset::new("A", 0.0, 0.01, 100.0, 252).unwrap()];
        let payoff = PayoffFunction::new(OptionType::Asian, &assets, 100.0, 0.05, 2.0).unwrap();
        let expected = (-0.1f64).exp() * 10.0;
        assert_relative_eq!(payoff.evaluate(&[1.1]).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_payoffs() {
        assert!(PayoffFunction::new(OptionType::European, &[], 100.0, 0.0, 1.0).is_err());
        assert!(PayoffFunction::new(OptionType::European, &assets(), 0.0, 0.0, 1.0).is_err());
        assert!(PayoffFunction::new(OptionType::European, &assets(), 100.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_option_type_selection() {
        assert_eq!(OptionType::try_from(1).unwrap(), OptionType::European);
        assert_eq!(OptionType::try_from(2).unwrap(), OptionType::Asian);
        assert!(matches!(
            OptionType::try_from(0),
            Err(McError::InvalidSelection { .. })
        ));
        assert_eq!("asian".parse::<OptionType>().unwrap(), OptionType::Asian);
        assert_eq!(OptionType::European.default_simulations(), 1_000_000);
        assert_eq!(OptionType::Asian.default_simulations(), 100_000);
    }
}
