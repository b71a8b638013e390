//! End-to-end runs built from validated configuration: option pricing and
//! geometric integration.

pub mod integration;
pub mod pricing;

pub use integration::{integrate, IntegrationReport};
pub use pricing::{price_option, PricingOrchestrator, PricingReport};
