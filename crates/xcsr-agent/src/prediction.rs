//! Prediction array and action selection

use rand::Rng;

use xcsr_core::{Action, ActionSpace, Result, XcsError};

use crate::population::{MatchSet, Population};
use crate::utils::weighted_mean;

/// Fitness-weighted payoff estimate per action; `None` where no member of
/// the match set proposes the action
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionArray {
    values: Vec<Option<f64>>,
}

impl PredictionArray {
    /// Build the array for `match_set`.
    ///
    /// An action whose proposers all have zero fitness falls back to the
    /// unweighted mean of their predictions, so it is still selectable.
    #[must_use]
    pub fn new(population: &Population, match_set: &MatchSet, actions: ActionSpace) -> Self {
        let mut weighted: Vec<Vec<(f64, f64)>> = vec![Vec::new(); actions.len()];
        for cl in population.members(match_set.ids()) {
            if let Some(slot) = weighted.get_mut(cl.action.index()) {
                slot.push((cl.prediction, cl.fitness));
            }
        }
        let values = weighted
            .into_iter()
            .map(|entries| {
                if entries.is_empty() {
                    return None;
                }
                weighted_mean(entries.iter().copied()).or_else(|| {
                    Some(entries.iter().map(|(p, _)| p).sum::<f64>() / entries.len() as f64)
                })
            })
            .collect();
        Self { values }
    }

    /// Build directly from per-action values
    #[must_use]
    pub fn from_values(values: Vec<Option<f64>>) -> Self {
        Self { values }
    }

    /// Value for `action`
    #[must_use]
    pub fn get(&self, action: Action) -> Option<f64> {
        self.values.get(action.index()).copied().flatten()
    }

    /// Raw per-action values
    #[must_use]
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Actions with a defined value
    pub fn defined(&self) -> impl Iterator<Item = (Action, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (Action(i), v)))
    }

    /// Largest defined value
    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.defined().map(|(_, v)| v).reduce(f64::max)
    }

    /// Action with the largest value, lowest index on ties
    #[must_use]
    pub fn best_action(&self) -> Option<Action> {
        let mut best: Option<(Action, f64)> = None;
        for (action, value) in self.defined() {
            if best.map_or(true, |(_, b)| value > b) {
                best = Some((action, value));
            }
        }
        best.map(|(a, _)| a)
    }

    /// Epsilon-greedy selection: with probability `p_explr` a uniformly
    /// random action among those with a defined value, otherwise the best.
    pub fn select_action<R: Rng + ?Sized>(&self, p_explr: f64, rng: &mut R) -> Result<Action> {
        let defined: Vec<Action> = self.defined().map(|(a, _)| a).collect();
        if defined.is_empty() {
            return Err(XcsError::NoEligibleActions);
        }
        if rng.gen::<f64>() < p_explr {
            return Ok(defined[rng.gen_range(0..defined.len())]);
        }
        self.best_action().ok_or(XcsError::NoEligibleActions)
    }
}
