//! Name-to-constructor registry for the scenario environments

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use xcsr_core::{Environment, Result, XcsError};

use crate::{MultiplexerConfig, RealMultiplexer, StepLimit, ThresholdEnv, Woods2};

/// Boxed environment as handed out by the registry
pub type BoxedEnv = Box<dyn Environment>;

/// Arguments every constructor receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvParams {
    /// Seed for the environment's own random stream
    pub seed: u64,
    /// Commit budget per reset
    pub max_steps: usize,
}

type EnvConstructor = Box<dyn Fn(EnvParams) -> Result<BoxedEnv> + Send + Sync>;

/// Environment registry
pub struct EnvRegistry {
    envs: HashMap<String, EnvConstructor>,
}

impl Default for EnvRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl EnvRegistry {
    /// Registry with nothing registered
    #[must_use]
    pub fn empty() -> Self {
        Self {
            envs: HashMap::new(),
        }
    }

    /// Registry holding `multiplexer`, `threshold` and `woods2`
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("multiplexer", |p: EnvParams| {
            let env = RealMultiplexer::new(MultiplexerConfig::default(), p.seed)?;
            Ok(Box::new(StepLimit::new(env, p.max_steps)) as BoxedEnv)
        });
        registry.register("threshold", |p: EnvParams| {
            let env = ThresholdEnv::new(0.5, p.seed)?;
            Ok(Box::new(StepLimit::new(env, p.max_steps)) as BoxedEnv)
        });
        registry.register("woods2", |p: EnvParams| {
            Ok(Box::new(StepLimit::new(Woods2::new(p.seed), p.max_steps)) as BoxedEnv)
        });
        registry
    }

    /// Register an environment, replacing any previous one with that name
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(EnvParams) -> Result<BoxedEnv> + Send + Sync + 'static,
    {
        self.envs.insert(name.into(), Box::new(constructor));
    }

    /// Create an environment by name
    pub fn make(&self, name: &str, params: EnvParams) -> Result<BoxedEnv> {
        self.envs
            .get(name)
            .ok_or_else(|| XcsError::Environment(format!("Unknown environment: {name}")))
            .and_then(|constructor| constructor(params))
    }

    /// Whether `name` is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.envs.contains_key(name)
    }

    /// Registered names, sorted
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.envs.keys().cloned().collect();
        names.sort();
        names
    }
}
