//! Hyperparameters of the classifier system

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Result, XcsError};

/// Configuration for an XCSR agent.
///
/// Field names follow the usual XCS notation. Everything is read-only once
/// the agent is built. Call [`XcsConfig::validate`] (done by every
/// constructor in this workspace) before the first learning step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XcsConfig {
    /// Population capacity, in micro-classifiers
    pub n: usize,
    /// Learning rate for prediction, error, action-set size and fitness
    pub beta: f64,
    /// Accuracy fall-off factor
    pub alpha: f64,
    /// Error threshold under which a classifier counts as accurate
    pub epsilon_0: f64,
    /// Accuracy exponent
    pub nu: f64,
    /// Discount factor for multi-step payoff
    pub gamma: f64,
    /// GA fires in an action set once the mean time since its last GA exceeds this
    pub theta_ga: f64,
    /// Crossover probability
    pub chi: f64,
    /// Per-allele mutation probability
    pub mu: f64,
    /// Experience above which fitness enters the deletion vote
    pub theta_del: u64,
    /// Fraction of mean fitness below which the deletion vote is scaled up
    pub delta: f64,
    /// Experience a classifier needs before it may subsume others
    pub theta_sub: u64,
    /// Wildcard probability during covering
    pub p_sharp: f64,
    /// Maximum distance from the situation value to each covering interval bound
    pub cover_half_width: f64,
    /// Maximum distance from the situation value to each interval bound
    /// when mutation turns a wildcard into an interval
    pub mutation_half_width: f64,
    /// Multiplier applied to offspring fitness
    pub fitness_reduction: f64,
    /// Exploration probability during action selection
    pub p_explr: f64,
    /// Minimum number of distinct actions in a match set before covering stops
    pub theta_mna: usize,
    /// Test offspring for subsumption by their parents
    pub do_ga_subsumption: bool,
    /// Collapse action sets onto their most general accurate member
    pub do_action_set_subsumption: bool,
    /// Initial prediction of new classifiers
    pub p_1: f64,
    /// Initial error of new classifiers
    pub epsilon_1: f64,
    /// Initial fitness of new classifiers
    pub f_1: f64,
    /// Seed for the agent's random stream; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for XcsConfig {
    fn default() -> Self {
        Self {
            n: 400,
            beta: 0.2,
            alpha: 0.1,
            epsilon_0: 0.01,
            nu: 5.0,
            gamma: 0.71,
            theta_ga: 25.0,
            chi: 0.8,
            mu: 0.04,
            theta_del: 20,
            delta: 0.1,
            theta_sub: 20,
            p_sharp: 0.33,
            cover_half_width: 0.29,
            mutation_half_width: 0.1,
            fitness_reduction: 0.1,
            p_explr: 0.5,
            theta_mna: 2,
            do_ga_subsumption: true,
            do_action_set_subsumption: false,
            p_1: 0.01,
            epsilon_1: 0.0,
            f_1: 0.01,
            seed: None,
        }
    }
}

impl XcsConfig {
    /// Parameters for the real-valued multiplexer
    #[must_use]
    pub fn multiplexer() -> Self {
        Self {
            n: 10_000,
            theta_ga: 12.0,
            ..Self::default()
        }
    }

    /// Parameters for the Woods2 grid world
    #[must_use]
    pub fn woods2() -> Self {
        Self {
            n: 800,
            beta: 0.1,
            gamma: 0.9,
            mu: 0.01,
            p_sharp: 0.5,
            p_1: 10.0,
            epsilon_1: 0.0,
            f_1: 10.0,
            theta_mna: 8,
            ..Self::default()
        }
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            XcsError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Check every parameter against its legal range
    pub fn validate(&self) -> Result<()> {
        if self.n == 0 {
            return Err(XcsError::invalid("n", "population capacity must be positive"));
        }
        if !(self.beta > 0.0 && self.beta <= 1.0) {
            return Err(XcsError::invalid("beta", format!("{} not in (0, 1]", self.beta)));
        }
        if !(self.epsilon_0 > 0.0) {
            return Err(XcsError::invalid("epsilon_0", "must be positive"));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(XcsError::invalid("alpha", format!("{} not in (0, 1]", self.alpha)));
        }
        if !(self.nu > 0.0) {
            return Err(XcsError::invalid("nu", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(XcsError::invalid("gamma", format!("{} not in [0, 1]", self.gamma)));
        }
        if !(self.theta_ga >= 0.0) {
            return Err(XcsError::invalid("theta_ga", "must be non-negative"));
        }
        for (name, p) in [
            ("chi", self.chi),
            ("mu", self.mu),
            ("delta", self.delta),
            ("p_sharp", self.p_sharp),
            ("p_explr", self.p_explr),
            ("fitness_reduction", self.fitness_reduction),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(XcsError::invalid(name, format!("{p} is not a probability")));
            }
        }
        if !(self.cover_half_width >= 0.0) || !(self.mutation_half_width >= 0.0) {
            return Err(XcsError::invalid(
                "cover_half_width",
                "interval half-widths must be non-negative",
            ));
        }
        if self.theta_mna == 0 {
            return Err(XcsError::invalid("theta_mna", "must be at least 1"));
        }
        if !self.p_1.is_finite() || !(self.epsilon_1 >= 0.0) || !(self.f_1 >= 0.0) {
            return Err(XcsError::invalid(
                "p_1",
                "initial prediction must be finite, initial error and fitness non-negative",
            ));
        }
        Ok(())
    }
}
