//! Scenario environments for the XCSR classifier system
//!
//! This crate provides reference problems implementing
//! [`xcsr_core::Environment`]:
//! - A real-valued multiplexer (single-step)
//! - A one-attribute threshold problem (single-step)
//! - The Woods2 grid world (multi-step)
//!
//! plus a step-budget wrapper and a name-based registry.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod multiplexer;
pub mod registry;
pub mod threshold;
pub mod woods2;
pub mod wrappers;

// Re-export environments
pub use multiplexer::{MultiplexerConfig, RealMultiplexer};
pub use registry::{BoxedEnv, EnvParams, EnvRegistry};
pub use threshold::ThresholdEnv;
pub use woods2::Woods2;
pub use wrappers::StepLimit;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{EnvParams, EnvRegistry, RealMultiplexer, StepLimit, ThresholdEnv, Woods2};
    pub use xcsr_core::prelude::*;
}
