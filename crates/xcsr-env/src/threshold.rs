//! One-attribute threshold problem

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use xcsr_core::{
    Action, ActionSpace, Environment, Outcome, Result, Situation, SituationSpace, XcsError,
};

/// Single-step problem over one attribute in `[0, 1]`.
///
/// Action 1 is correct when the attribute is at least the threshold,
/// action 0 otherwise. Reward is 1 for the correct action and 0 for the
/// other.
pub struct ThresholdEnv {
    threshold: f64,
    space: SituationSpace,
    current: f64,
    rng: StdRng,
}

impl ThresholdEnv {
    /// Threshold problem seeded with `seed`
    pub fn new(threshold: f64, seed: u64) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(XcsError::Environment(format!("threshold {threshold} outside [0, 1]")));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let current = rng.gen::<f64>();
        Ok(Self {
            threshold,
            space: SituationSpace::uniform(1, 0.0, 1.0),
            current,
            rng,
        })
    }

    /// Threshold separating the two classes
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Correct action for attribute value `x`
    #[must_use]
    pub fn correct_action(&self, x: f64) -> Action {
        Action(usize::from(x >= self.threshold))
    }
}

impl Environment for ThresholdEnv {
    fn name(&self) -> &str {
        "threshold"
    }

    fn situation_space(&self) -> &SituationSpace {
        &self.space
    }

    fn action_space(&self) -> ActionSpace {
        ActionSpace::new(2)
    }

    fn situation(&self) -> Situation {
        Situation(vec![self.current])
    }

    fn commit(&mut self, action: Action) -> Result<Outcome> {
        if !self.action_space().contains(action) {
            return Err(XcsError::InvalidAction(format!("{action} on a two-action problem")));
        }
        let reward = if action == self.correct_action(self.current) { 1.0 } else { 0.0 };
        self.current = self.rng.gen::<f64>();
        Ok(Outcome::terminal(reward))
    }

    fn reset(&mut self) -> Result<()> {
        self.current = self.rng.gen::<f64>();
        Ok(())
    }

    fn is_terminated(&self) -> bool {
        false
    }
}
