//! Environment capability interface

use serde::{Deserialize, Serialize};

use crate::{Action, ActionSpace, Situation, SituationSpace};

/// Result of committing one action
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Immediate reward
    pub reward: f64,
    /// Whether the action ended the current episode
    pub done: bool,
}

impl Outcome {
    /// Outcome that keeps the episode running
    #[must_use]
    pub fn running(reward: f64) -> Self {
        Self { reward, done: false }
    }

    /// Outcome that ends the episode
    #[must_use]
    pub fn terminal(reward: f64) -> Self {
        Self { reward, done: true }
    }
}

/// Everything the learning engine needs from a problem.
///
/// Implementations own their own randomness. The engine never reaches into
/// an environment beyond these methods.
pub trait Environment: Send {
    /// Short name used in logs and reports
    fn name(&self) -> &str;

    /// Value domain of situations
    fn situation_space(&self) -> &SituationSpace;

    /// Legal actions
    fn action_space(&self) -> ActionSpace;

    /// Current situation
    fn situation(&self) -> Situation;

    /// Apply an action and report reward and episode end
    fn commit(&mut self, action: Action) -> crate::Result<Outcome>;

    /// Start a new episode
    fn reset(&mut self) -> crate::Result<()>;

    /// Whether the run should stop (step budget spent or episode over)
    fn is_terminated(&self) -> bool;

    /// Whether payoff depends on chains of actions
    fn is_multi_step(&self) -> bool {
        false
    }
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn situation_space(&self) -> &SituationSpace {
        (**self).situation_space()
    }

    fn action_space(&self) -> ActionSpace {
        (**self).action_space()
    }

    fn situation(&self) -> Situation {
        (**self).situation()
    }

    fn commit(&mut self, action: Action) -> crate::Result<Outcome> {
        (**self).commit(action)
    }

    fn reset(&mut self) -> crate::Result<()> {
        (**self).reset()
    }

    fn is_terminated(&self) -> bool {
        (**self).is_terminated()
    }

    fn is_multi_step(&self) -> bool {
        (**self).is_multi_step()
    }
}
