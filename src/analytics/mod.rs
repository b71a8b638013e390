//! Closed-form reference prices.

pub mod bs_analytic;
