//! Asset statistics, integration bounds and payoff construction for option pricing.

pub mod asset;
pub mod bounds;
pub mod loader;
pub mod paths;
pub mod payoff;

pub use asset::Asset;
pub use loader::{load_assets, AssetCountType};
pub use payoff::{OptionType, PayoffFunction};
