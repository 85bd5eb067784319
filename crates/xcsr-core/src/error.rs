//! Error types for the XCSR core library

use thiserror::Error;

/// Core error type for classifier-system operations
#[derive(Error, Debug)]
pub enum XcsError {
    /// Configuration could not be built or loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// A hyperparameter is outside its legal range
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name as it appears in the configuration
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Environment-related errors
    #[error("Environment error: {0}")]
    Environment(String),

    /// Action outside the environment's action space
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Action selection found no action with a defined prediction.
    ///
    /// Covering guarantees at least `theta_mna` actions in every match set,
    /// so hitting this means the population invariant is broken.
    #[error("No eligible actions in the prediction array")]
    NoEligibleActions,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl XcsError {
    /// Shorthand for an [`XcsError::InvalidParameter`]
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result type alias for classifier-system operations
pub type Result<T> = std::result::Result<T, XcsError>;
