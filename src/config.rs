// src/config.rs
//! Run configuration for the pricing and integration modes
//!
//! Both structs follow the same pattern: plain public fields, a `Default`
//! carrying the standard run, and `validate()` called before any work starts.
//! The CLI and the console menus only fill these in.

use crate::error::{validation::*, McError, McResult};
use crate::finance::loader::AssetCountType;
use crate::finance::paths::DEFAULT_HORIZON_DAYS;
use crate::finance::payoff::OptionType;
use crate::geometry::domain::Domain;
use crate::geometry::sampler::DEFAULT_PARALLEL_THRESHOLD;
use crate::mc::iteration::{IterationConfig, DEFAULT_ITERATIONS};
use crate::rng::entropy_seed;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

/// Results file written next to the working directory when none is given
pub const DEFAULT_OUTPUT_FILE: &str = "output.txt";

/// Resolve an optional seed, drawing and logging a fresh one when absent
fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        let seed = entropy_seed();
        info!(seed, "no seed configured, drew one from entropy");
        seed
    })
}

#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub option_type: OptionType,
    pub asset_count: AssetCountType,
    /// Directory holding one `.csv` price history per asset
    pub data_dir: PathBuf,
    /// At-the-money basket level when `None`
    pub strike: Option<f64>,
    pub risk_free_rate: f64,
    /// Years to expiry, used for discounting
    pub maturity: f64,
    /// Trading days simulated per trial
    pub horizon_days: usize,
    pub num_iterations: usize,
    /// Per-option-type default when `None`
    pub num_simulations: Option<usize>,
    /// Drawn from entropy when `None`
    pub seed: Option<u64>,
    pub concurrent_iterations: bool,
    pub parallel_threshold: usize,
    /// No results file when `None`
    pub output_path: Option<PathBuf>,
}

impl PricingConfig {
    pub fn validate(&self) -> McResult<()> {
        if let Some(strike) = self.strike {
            validate_positive("strike", strike)?;
        }
        validate_finite("risk_free_rate", self.risk_free_rate)?;
        validate_positive("maturity", self.maturity)?;
        validate_iterations(self.num_iterations)?;
        validate_simulations(self.simulations())?;
        if self.horizon_days == 0 {
            return Err(McError::InvalidConfiguration {
                field: "horizon_days".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Simulations per outer iteration
    pub fn simulations(&self) -> usize {
        self.num_simulations
            .unwrap_or_else(|| self.option_type.default_simulations())
    }

    /// Iteration settings with the seed resolved
    pub fn iteration_config(&self) -> IterationConfig {
        IterationConfig {
            num_iterations: self.num_iterations,
            num_simulations: self.simulations(),
            seed: resolve_seed(self.seed),
            concurrent: self.concurrent_iterations,
            parallel_threshold: self.parallel_threshold,
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            option_type: OptionType::European,
            asset_count: AssetCountType::Multiple,
            data_dir: PathBuf::from("data"),
            strike: None,
            risk_free_rate: 0.05,
            maturity: 1.0,
            horizon_days: DEFAULT_HORIZON_DAYS,
            num_iterations: DEFAULT_ITERATIONS,
            num_simulations: None,
            seed: None,
            concurrent_iterations: false,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            output_path: Some(PathBuf::from(DEFAULT_OUTPUT_FILE)),
        }
    }
}

/// Shape of the integration domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainShape {
    Sphere,
    Cube,
    Rectangle,
}

impl TryFrom<u32> for DomainShape {
    type Error = McError;

    fn try_from(choice: u32) -> McResult<Self> {
        match choice {
            1 => Ok(DomainShape::Sphere),
            2 => Ok(DomainShape::Cube),
            3 => Ok(DomainShape::Rectangle),
            other => Err(McError::InvalidSelection {
                what: "domain shape".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for DomainShape {
    type Err = McError;

    fn from_str(s: &str) -> McResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "sphere" | "hypersphere" => Ok(DomainShape::Sphere),
            "2" | "cube" | "hypercube" => Ok(DomainShape::Cube),
            "3" | "rectangle" | "hyperrectangle" => Ok(DomainShape::Rectangle),
            other => Err(McError::InvalidSelection {
                what: "domain shape".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for DomainShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainShape::Sphere => write!(f, "hypersphere"),
            DomainShape::Cube => write!(f, "hypercube"),
            DomainShape::Rectangle => write!(f, "hyperrectangle"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    pub shape: DomainShape,
    /// Ignored for rectangles, whose dimension comes from `bounds`
    pub dimension: usize,
    pub radius: f64,
    /// Half-width of the cube
    pub side: f64,
    /// Interleaved `[lower_0, upper_0, lower_1, upper_1, ...]`
    pub bounds: Vec<f64>,
    /// Formula over `x0..x{d-1}`; volume only when `None`
    pub integrand: Option<String>,
    pub num_simulations: usize,
    pub seed: Option<u64>,
    pub parallel_threshold: usize,
}

impl IntegrationConfig {
    pub fn validate(&self) -> McResult<()> {
        validate_simulations(self.num_simulations)?;
        self.build_domain().map(|_| ())
    }

    pub fn build_domain(&self) -> McResult<Domain> {
        match self.shape {
            DomainShape::Sphere => Domain::hypersphere(self.dimension, self.radius),
            DomainShape::Cube => Domain::hypercube(self.dimension, self.side),
            DomainShape::Rectangle => Domain::hyperrectangle(self.bounds.clone()),
        }
    }

    pub fn resolved_seed(&self) -> u64 {
        resolve_seed(self.seed)
    }
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        IntegrationConfig {
            shape: DomainShape::Sphere,
            dimension: 3,
            radius: 1.0,
            side: 1.0,
            bounds: Vec::new(),
            integrand: None,
            num_simulations: 1_000_000,
            seed: None,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}
