//! Environment wrappers

use xcsr_core::{Action, ActionSpace, Environment, Outcome, Result, Situation, SituationSpace};

/// Step budget wrapper.
///
/// Terminates once `max_steps` commits have been made since the last reset,
/// or earlier if the inner environment terminates.
pub struct StepLimit<E> {
    /// Inner environment
    pub env: E,
    /// Maximum commits per reset
    pub max_steps: usize,
    /// Commits since the last reset
    pub steps: usize,
}

impl<E> StepLimit<E> {
    /// Wrap `env` with a budget of `max_steps` commits
    pub fn new(env: E, max_steps: usize) -> Self {
        Self {
            env,
            max_steps,
            steps: 0,
        }
    }

    /// Unwrap the inner environment
    pub fn into_inner(self) -> E {
        self.env
    }
}

impl<E: Environment> Environment for StepLimit<E> {
    fn name(&self) -> &str {
        self.env.name()
    }

    fn situation_space(&self) -> &SituationSpace {
        self.env.situation_space()
    }

    fn action_space(&self) -> ActionSpace {
        self.env.action_space()
    }

    fn situation(&self) -> Situation {
        self.env.situation()
    }

    fn commit(&mut self, action: Action) -> Result<Outcome> {
        self.steps += 1;
        self.env.commit(action)
    }

    fn reset(&mut self) -> Result<()> {
        self.steps = 0;
        self.env.reset()
    }

    fn is_terminated(&self) -> bool {
        self.steps >= self.max_steps || self.env.is_terminated()
    }

    fn is_multi_step(&self) -> bool {
        self.env.is_multi_step()
    }
}
