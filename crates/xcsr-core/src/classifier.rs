//! Classifiers: condition-action rules with learned statistics

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Action, Predicate, Situation, XcsConfig};

/// Identity of a macro-classifier, unique within one population
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassifierId(pub u64);

impl fmt::Display for ClassifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A macro-classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classifier {
    /// Identity (debugging and addressing only)
    pub id: ClassifierId,
    /// Condition over the situation
    pub predicate: Predicate,
    /// Proposed action
    pub action: Action,
    /// Payoff prediction `p`
    pub prediction: f64,
    /// Prediction error `epsilon`
    pub error: f64,
    /// Fitness `F`, never negative
    pub fitness: f64,
    /// Number of action-set updates this rule has taken part in
    pub experience: u64,
    /// Time step of the last GA in an action set containing this rule
    pub last_ga_time: u64,
    /// Estimated action-set size, in micro-classifiers
    pub action_set_size: f64,
    /// Number of micro-classifiers represented
    pub numerosity: u32,
}

impl Classifier {
    /// Fresh classifier carrying the configured initial statistics
    #[must_use]
    pub fn new(
        id: ClassifierId,
        predicate: Predicate,
        action: Action,
        time: u64,
        config: &XcsConfig,
    ) -> Self {
        Self {
            id,
            predicate,
            action,
            prediction: config.p_1,
            error: config.epsilon_1,
            fitness: config.f_1,
            experience: 0,
            last_ga_time: time,
            action_set_size: 1.0,
            numerosity: 1,
        }
    }

    /// Whether the predicate matches `situation`
    #[must_use]
    pub fn matches(&self, situation: &Situation) -> bool {
        self.predicate.matches(situation)
    }

    /// Same predicate and action, ignoring statistics and id
    #[must_use]
    pub fn same_rule(&self, other: &Classifier) -> bool {
        self.action == other.action && self.predicate == other.predicate
    }

    /// Experienced and accurate enough to absorb other rules
    #[must_use]
    pub fn could_subsume(&self, config: &XcsConfig) -> bool {
        self.experience > config.theta_sub && self.error < config.epsilon_0
    }

    /// Whether this predicate accepts everything `other`'s does
    #[must_use]
    pub fn is_more_general(&self, other: &Classifier) -> bool {
        self.predicate.is_more_general(&other.predicate)
    }

    /// Whether this classifier may absorb `other`
    #[must_use]
    pub fn does_subsume(&self, other: &Classifier, config: &XcsConfig) -> bool {
        self.action == other.action && self.could_subsume(config) && self.is_more_general(other)
    }

    /// Fitness of a single micro-classifier
    #[must_use]
    pub fn micro_fitness(&self) -> f64 {
        self.fitness / f64::from(self.numerosity)
    }

    /// Weight of this classifier in the deletion roulette.
    ///
    /// `mean_fitness` is the population's total fitness over its total
    /// numerosity.
    #[must_use]
    pub fn deletion_vote(&self, mean_fitness: f64, config: &XcsConfig) -> f64 {
        let vote = self.action_set_size * f64::from(self.numerosity);
        let micro_fitness = self.micro_fitness();
        if self.experience > config.theta_del && micro_fitness < config.delta * mean_fitness {
            vote * mean_fitness / micro_fitness.max(f64::EPSILON)
        } else {
            vote
        }
    }

    /// Accuracy `k` used by fitness sharing
    #[must_use]
    pub fn accuracy(&self, config: &XcsConfig) -> f64 {
        if self.error < config.epsilon_0 {
            1.0
        } else {
            config.alpha * (self.error / config.epsilon_0).powf(-config.nu)
        }
    }
}

impl fmt::Display for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} p={:.4} e={:.4} F={:.4} num={} exp={} as={:.2}",
            self.id,
            self.predicate,
            self.action,
            self.prediction,
            self.error,
            self.fitness,
            self.numerosity,
            self.experience,
            self.action_set_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Condition, Interval};

    fn classifier(predicate: Predicate, action: usize) -> Classifier {
        Classifier::new(ClassifierId(0), predicate, Action(action), 0, &XcsConfig::default())
    }

    fn trusted(mut cl: Classifier, config: &XcsConfig) -> Classifier {
        cl.experience = config.theta_sub + 1;
        cl.error = config.epsilon_0 / 2.0;
        cl
    }

    #[test]
    fn test_subsumption_requires_same_action_and_trust() {
        let config = XcsConfig::default();
        let general = classifier(Predicate::general(2), 0);
        let specific = classifier(
            Predicate(vec![Condition::Range(Interval::new(0.1, 0.2)), Condition::Wildcard]),
            0,
        );

        assert!(general.is_more_general(&specific));
        assert!(!general.does_subsume(&specific, &config));

        let general = trusted(general, &config);
        assert!(general.does_subsume(&specific, &config));

        let other_action = classifier(specific.predicate.clone(), 1);
        assert!(!general.does_subsume(&other_action, &config));
        assert!(!specific.does_subsume(&general, &config));
    }

    #[test]
    fn test_deletion_vote_monotone_in_numerosity_and_size() {
        let config = XcsConfig::default();
        let mut cl = classifier(Predicate::general(1), 0);
        cl.fitness = 0.05;
        cl.experience = config.theta_del + 5;
        let mean = 0.2;

        let mut last = 0.0;
        for num in 1..10 {
            cl.numerosity = num;
            let vote = cl.deletion_vote(mean, &config);
            assert!(vote >= last, "vote fell at numerosity {num}");
            last = vote;
        }

        cl.numerosity = 3;
        let mut last = 0.0;
        for size in [1.0, 2.0, 5.5, 30.0] {
            cl.action_set_size = size;
            let vote = cl.deletion_vote(mean, &config);
            assert!(vote >= last);
            last = vote;
        }
    }

    #[test]
    fn test_deletion_vote_penalises_experienced_unfit() {
        let config = XcsConfig::default();
        let mut cl = classifier(Predicate::general(1), 0);
        cl.fitness = 0.001;
        let fresh = cl.deletion_vote(1.0, &config);
        cl.experience = config.theta_del + 1;
        let old = cl.deletion_vote(1.0, &config);
        assert!(old > fresh);
    }

    #[test]
    fn test_zero_fitness_vote_is_finite() {
        let config = XcsConfig::default();
        let mut cl = classifier(Predicate::general(1), 0);
        cl.fitness = 0.0;
        cl.experience = config.theta_del + 1;
        assert!(cl.deletion_vote(0.5, &config).is_finite());
    }

    #[test]
    fn test_accuracy() {
        let config = XcsConfig::default();
        let mut cl = classifier(Predicate::general(1), 0);
        cl.error = 0.0;
        assert_eq!(cl.accuracy(&config), 1.0);
        cl.error = config.epsilon_0 * 2.0;
        let k = cl.accuracy(&config);
        approx::assert_relative_eq!(k, config.alpha * 2f64.powf(-config.nu));
    }
}
