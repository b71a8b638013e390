// src/error.rs
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading asset statistics from a CSV directory
#[derive(Debug, Error)]
pub enum LoadAssetError {
    /// The asset directory could not be opened or listed
    #[error("could not open asset directory '{}': {source}", path.display())]
    DirectoryOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The directory was readable but held no usable `.csv` file
    #[error("no valid .csv files found in '{}'", path.display())]
    NoValidFiles { path: PathBuf },

    /// A single asset file could not be read or parsed
    #[error("error reading the file '{}': {reason}", file.display())]
    FileRead { file: PathBuf, reason: String },
}

/// Failures inside a Monte Carlo batch
#[derive(Debug, Clone, Error)]
pub enum MonteCarloError {
    #[error("point generation failed: {reason}")]
    PointGenerationFailed { reason: String },

    #[error("numerical instability: {reason}")]
    NumericalInstability { reason: String },

    /// Too many trials fell outside the domain for the estimate to be trusted
    #[error("{rejected} of {trials} trials fell outside the integration domain")]
    ExcessiveRejection { rejected: usize, trials: usize },
}

/// Custom error types for the fast-mci library
#[derive(Debug, Error)]
pub enum McError {
    /// Bad geometric parameters
    #[error("invalid domain: {reason}")]
    InvalidDomain { reason: String },

    /// Zero simulations requested for a batch
    #[error("insufficient samples: {requested} simulations requested, at least 1 required")]
    InsufficientSamples { requested: usize },

    #[error(transparent)]
    LoadAsset(#[from] LoadAssetError),

    #[error("Monte Carlo simulation error: {0}")]
    MonteCarlo(#[from] MonteCarloError),

    /// Menu or command-line selection outside the accepted values
    #[error("invalid {what} selection: {value}")]
    InvalidSelection { what: String, value: String },

    /// Integration bounds could not be derived from the asset statistics
    #[error("error setting the integration bounds: {reason}")]
    Bounds { reason: String },

    /// Malformed formula or failed evaluation
    #[error("cannot evaluate '{formula}': {reason}")]
    Evaluation { formula: String, reason: String },

    #[error("invalid configuration for '{field}': {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl McError {
    pub(crate) fn invalid_domain(reason: impl Into<String>) -> Self {
        McError::InvalidDomain {
            reason: reason.into(),
        }
    }

    pub(crate) fn point_generation(reason: impl Into<String>) -> Self {
        McError::MonteCarlo(MonteCarloError::PointGenerationFailed {
            reason: reason.into(),
        })
    }

    pub(crate) fn instability(reason: impl Into<String>) -> Self {
        McError::MonteCarlo(MonteCarloError::NumericalInstability {
            reason: reason.into(),
        })
    }
}

/// Result type alias for fast-mci operations
pub type McResult<T> = Result<T, McError>;

/// Validation utilities
pub mod validation {
    use super::{McError, McResult};

    /// Largest batch accepted by a single estimator call
    pub const MAX_SIMULATIONS: usize = 1_000_000_000;

    /// Validate that a parameter is positive
    pub fn validate_positive(name: &str, value: f64) -> McResult<()> {
        if value <= 0.0 || value.is_nan() {
            Err(McError::InvalidConfiguration {
                field: name.to_string(),
                reason: format!("must be positive (> 0), got {}", value),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a value is finite and not NaN
    pub fn validate_finite(name: &str, value: f64) -> McResult<()> {
        if !value.is_finite() {
            Err(McError::InvalidConfiguration {
                field: name.to_string(),
                reason: format!("must be finite (not NaN or infinite), got {}", value),
            })
        } else {
            Ok(())
        }
    }

    /// Validate the number of simulations in one batch
    pub fn validate_simulations(simulations: usize) -> McResult<()> {
        if simulations == 0 {
            Err(McError::InsufficientSamples {
                requested: simulations,
            })
        } else if simulations > MAX_SIMULATIONS {
            Err(McError::InvalidConfiguration {
                field: "num_simulations".to_string(),
                reason: format!("exceeds maximum allowed ({})", MAX_SIMULATIONS),
            })
        } else {
            Ok(())
        }
    }

    /// Validate the number of outer iterations
    pub fn validate_iterations(iterations: usize) -> McResult<()> {
        if iterations == 0 {
            Err(McError::InvalidConfiguration {
                field: "num_iterations".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::validation::*;
    use super::*;

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive("radius", 0.5).is_ok());
        assert!(validate_positive("radius", 0.0).is_err());
        assert!(validate_positive("radius", -1.0).is_err());
        assert!(validate_positive("radius", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_finite() {
        assert!(validate_finite("value", 1.0).is_ok());
        assert!(validate_finite("value", f64::NAN).is_err());
        assert!(validate_finite("value", f64::INFINITY).is_err());
        assert!(validate_finite("value", f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_zero_simulations_is_insufficient() {
        match validate_simulations(0) {
            Err(McError::InsufficientSamples { requested }) => assert_eq!(requested, 0),
            other => panic!("expected InsufficientSamples, got {:?}", other),
        }
        assert!(validate_simulations(1).is_ok());
        assert!(validate_simulations(MAX_SIMULATIONS + 1).is_err());
    }

    #[test]
    fn test_error_display() {
        let error = McError::InvalidSelection {
            what: "option type".to_string(),
            value: "7".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("option type"));
        assert!(display.contains('7'));

        let error: McError = MonteCarloError::PointGenerationFailed {
            reason: "coordinate 2 is NaN".to_string(),
        }
        .into();
        assert!(error.to_string().contains("coordinate 2 is NaN"));
    }

    #[test]
    fn test_load_error_kinds_are_distinct() {
        let open = LoadAssetError::DirectoryOpen {
            path: PathBuf::from("missing"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        let empty = LoadAssetError::NoValidFiles {
            path: PathBuf::from("data"),
        };
        assert!(open.to_string().contains("could not open"));
        assert!(empty.to_string().contains("no valid .csv"));
    }
}
