//! Core types for the XCSR learning classifier system
//!
//! This crate holds the pieces shared by the learning engine and the
//! problems it learns on: classifiers and their interval predicates, the
//! environment capability trait, hyperparameters, and the per-step metrics
//! record handed back to drivers.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod action;
pub mod classifier;
pub mod config;
pub mod environment;
pub mod error;
pub mod metrics;
pub mod predicate;
pub mod situation;

// Re-export core traits and types
pub use action::{Action, ActionSpace};
pub use classifier::{Classifier, ClassifierId};
pub use config::XcsConfig;
pub use environment::{Environment, Outcome};
pub use error::{Result, XcsError};
pub use metrics::{MetricsRecord, StepMetric};
pub use predicate::{Condition, Interval, Predicate};
pub use situation::{Situation, SituationSpace};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Action, ActionSpace, Classifier, Environment, MetricsRecord, Outcome, Predicate, Result,
        Situation, SituationSpace, XcsConfig, XcsError,
    };
}
