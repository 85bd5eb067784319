//! XCSR learning engine
//!
//! This crate implements the accuracy-based classifier system over
//! real-valued situations:
//! - Population control: covering, merge-on-insert and roulette deletion
//! - Credit assignment with fitness sharing and action-set subsumption
//! - A niche genetic algorithm with GA subsumption
//! - An async driver for independent seeded replications

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod credit;
pub mod driver;
pub mod ga;
pub mod population;
pub mod prediction;
pub mod utils;
pub mod xcsr;

pub use driver::{Experiment, ExperimentConfig, ReplicationReport};
pub use population::{ActionSet, MatchSet, Population, PopulationSnapshot};
pub use prediction::PredictionArray;
pub use xcsr::XcsrAgent;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{Experiment, ExperimentConfig, PredictionArray, ReplicationReport, XcsrAgent};
    pub use xcsr_core::prelude::*;
}
