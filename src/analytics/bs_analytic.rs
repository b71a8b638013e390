// src/analytics/bs_analytic.rs
//! Analytical Black-Scholes price used to cross-check single-asset European runs
//!
//! # Mathematical Foundation
//!
//! Under the Black-Scholes model, the underlying asset follows:
//! ```text
//! dS_t = r S_t dt + σ S_t dW_t
//! ```
//!
//! The risk-neutral pricing formula gives:
//! ```text
//! V(S,t) = e^(-r(T-t)) * E^Q[payoff(S_T) | S_t = S]
//! ```
//!
//! For European options, this has closed-form solutions involving
//! the cumulative normal distribution function Φ(x).

use crate::error::{validation::*, McResult};
use crate::finance::asset::Asset;
use crate::math_utils::norm_cdf;

/// Black-Scholes European call option price
///
/// # Formula
/// ```text
/// C(S,K,r,σ,T) = S*Φ(d₁) - K*e^(-rT)*Φ(d₂)
/// ```
///
/// Where:
/// ```text
/// d₁ = [ln(S/K) + (r + σ²/2)T] / (σ√T)
/// d₂ = d₁ - σ√T
/// ```
///
/// # Parameters
/// - `s`: Current stock price
/// - `k`: Strike price
/// - `r`: Risk-free rate
/// - `sigma`: Volatility
/// - `t`: Time to expiration
///
/// A zero volatility degenerates to the discounted intrinsic value
/// `max(S - K e^(-rT), 0)`.
pub fn bs_call_price(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    if sigma <= 0.0 {
        return (s - k * (-r * t).exp()).max(0.0);
    }
    let d1 = ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / (sigma * t.sqrt());
    let d2 = d1 - sigma * t.sqrt();
    s * norm_cdf(d1) - k * (-r * t).exp() * norm_cdf(d2)
}

/// Call price on `asset` with spot = last close and σ = annualised daily volatility
pub fn bs_call_price_for_asset(asset: &Asset, k: f64, r: f64, t: f64) -> McResult<f64> {
    validate_positive("strike", k)?;
    validate_positive("maturity", t)?;
    validate_finite("risk_free_rate", r)?;
    Ok(bs_call_price(
        asset.last_close(),
        k,
        r,
        asset.annualized_volatility(),
        t,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bs_call_reference_value() {
        // S = K = 100, r = 5%, σ = 20%, T = 1
        let price = bs_call_price(100.0, 100.0, 0.05, 0.2, 1.0);
        assert_relative_eq!(price, 10.450583572185565, epsilon = 1e-6);
    }

    #[test]
    fn test_bs_call_bounds() {
        let price = bs_call_price(120.0, 100.0, 0.01, 0.3, 0.5);
        assert!(price > 120.0 - 100.0 * (-0.005f64).exp());
        assert!(price < 120.0);
        assert_eq!(bs_call_price(90.0, 100.0, 0.0, 0.0, 1.0), 0.0);
        assert_relative_eq!(bs_call_price(110.0, 100.0, 0.0, 0.0, 1.0), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_asset_wrapper() {
        let asset = Asset::new("A", 0.0, 0.2 / 252f64.sqrt(), 100.0, 252).unwrap();
        let price = bs_call_price_for_asset(&asset, 100.0, 0.05, 1.0).unwrap();
        assert_relative_eq!(price, 10.450583572185565, epsilon = 1e-6);
        assert!(bs_call_price_for_asset(&asset, 0.0, 0.05, 1.0).is_err());
    }
}
