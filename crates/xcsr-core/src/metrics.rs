//! Per-step metrics emitted by a run

use serde::{Deserialize, Serialize};

/// Metrics of a single control step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepMetric {
    /// Reward received for the committed action
    pub reward: f64,
    /// Prediction-array value of the committed action
    pub predicted_reward: f64,
    /// Population size in micro-classifiers after the step
    pub micro_classifiers: u64,
}

impl StepMetric {
    /// `|reward - predicted_reward|`
    #[must_use]
    pub fn prediction_error(&self) -> f64 {
        (self.reward - self.predicted_reward).abs()
    }
}

/// Append-only, time-ordered record of step metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    steps: Vec<StepMetric>,
}

impl MetricsRecord {
    /// Create an empty record
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one step
    pub fn push(&mut self, metric: StepMetric) {
        self.steps.push(metric);
    }

    /// Steps in the order they happened
    #[must_use]
    pub fn steps(&self) -> &[StepMetric] {
        &self.steps
    }

    /// Number of recorded steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Sum of rewards
    #[must_use]
    pub fn total_reward(&self) -> f64 {
        self.steps.iter().map(|s| s.reward).sum()
    }

    /// Mean reward over the last `window` steps (all steps if `window` is 0)
    #[must_use]
    pub fn mean_reward(&self, window: usize) -> f64 {
        mean(self.tail(window).iter().map(|s| s.reward))
    }

    /// Mean absolute prediction error over the last `window` steps
    #[must_use]
    pub fn mean_prediction_error(&self, window: usize) -> f64 {
        mean(self.tail(window).iter().map(StepMetric::prediction_error))
    }

    /// Population size at the last step
    #[must_use]
    pub fn final_population(&self) -> Option<u64> {
        self.steps.last().map(|s| s.micro_classifiers)
    }

    /// Means of consecutive, non-overlapping blocks of `interval` rewards
    #[must_use]
    pub fn reward_curve(&self, interval: usize) -> Vec<f64> {
        if interval == 0 {
            return Vec::new();
        }
        self.steps
            .chunks_exact(interval)
            .map(|chunk| mean(chunk.iter().map(|s| s.reward)))
            .collect()
    }

    fn tail(&self, window: usize) -> &[StepMetric] {
        if window == 0 || window >= self.steps.len() {
            &self.steps
        } else {
            &self.steps[self.steps.len() - window..]
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
