//! Actions and the discrete action space

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An action, identified by its index in the environment's action enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Action(pub usize);

impl Action {
    /// Index of this action in the enumeration
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}

impl From<usize> for Action {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// The legal actions of an environment: `0..n`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpace {
    /// Number of discrete actions
    pub n: usize,
}

impl ActionSpace {
    /// Create a new discrete action space
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self { n }
    }

    /// Number of legal actions
    #[must_use]
    pub fn len(&self) -> usize {
        self.n
    }

    /// Whether the space has no actions at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Iterate over every legal action in enumeration order
    pub fn actions(&self) -> impl Iterator<Item = Action> {
        (0..self.n).map(Action)
    }

    /// Check if an action is valid within this space
    #[must_use]
    pub fn contains(&self, action: Action) -> bool {
        action.0 < self.n
    }

    /// Sample a uniformly random action
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Action {
        Action(rng.gen_range(0..self.n))
    }

    /// Sample a uniformly random action different from `current`.
    ///
    /// Returns `current` when it is the only legal action.
    pub fn sample_other<R: Rng + ?Sized>(&self, current: Action, rng: &mut R) -> Action {
        if self.n < 2 {
            return current;
        }
        let pick = rng.gen_range(0..self.n - 1);
        if pick >= current.0 {
            Action(pick + 1)
        } else {
            Action(pick)
        }
    }
}
