//! The rule population and its size control
//!
//! The population owns every macro-classifier, keyed by [`ClassifierId`].
//! Match and action sets are lists of ids, so a set can outlive a deletion:
//! members that have since left the population are skipped on lookup.

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use xcsr_core::{
    Action, ActionSpace, Classifier, ClassifierId, Predicate, Result, Situation, SituationSpace,
    XcsConfig, XcsError,
};

use crate::utils::roulette;

/// Upper bound on covering rounds per situation, per required action
const MAX_COVERING_ROUNDS: usize = 10_000;

/// Classifiers whose predicate matches the current situation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet(pub Vec<ClassifierId>);

/// Members of a match set proposing one action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSet(pub Vec<ClassifierId>);

impl MatchSet {
    /// Ids in population order
    #[must_use]
    pub fn ids(&self) -> &[ClassifierId] {
        &self.0
    }

    /// Whether the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of macro-classifiers in the set
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Distinct actions proposed by the set, in enumeration order
    #[must_use]
    pub fn actions(&self, population: &Population) -> Vec<Action> {
        let mut actions: Vec<Action> = population.members(&self.0).map(|cl| cl.action).collect();
        actions.sort_unstable();
        actions.dedup();
        actions
    }

    /// Members proposing `action`
    #[must_use]
    pub fn action_set(&self, population: &Population, action: Action) -> ActionSet {
        ActionSet(
            population
                .members(&self.0)
                .filter(|cl| cl.action == action)
                .map(|cl| cl.id)
                .collect(),
        )
    }
}

impl ActionSet {
    /// Ids in population order
    #[must_use]
    pub fn ids(&self) -> &[ClassifierId] {
        &self.0
    }

    /// Whether the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of macro-classifiers in the set
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Drop ids no longer present in the population
    pub fn retain_live(&mut self, population: &Population) {
        self.0.retain(|id| population.contains(*id));
    }
}

/// Serializable population contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    /// Next id to hand out
    pub next_id: u64,
    /// Classifiers in population order
    pub classifiers: Vec<Classifier>,
}

/// The rule set
#[derive(Debug, Clone)]
pub struct Population {
    classifiers: IndexMap<ClassifierId, Classifier>,
    config: Arc<XcsConfig>,
    next_id: u64,
}

impl Population {
    /// Empty population
    #[must_use]
    pub fn new(config: Arc<XcsConfig>) -> Self {
        Self {
            classifiers: IndexMap::new(),
            config,
            next_id: 0,
        }
    }

    /// Rebuild a population from a snapshot.
    ///
    /// Rules repeating an earlier `(predicate, action)` pair are merged into
    /// it. Duplicate ids and snapshots holding more than `n`
    /// micro-classifiers are rejected.
    pub fn restore(config: Arc<XcsConfig>, snapshot: PopulationSnapshot) -> Result<Self> {
        let mut classifiers: IndexMap<ClassifierId, Classifier> =
            IndexMap::with_capacity(snapshot.classifiers.len());
        let mut seen = HashSet::with_capacity(snapshot.classifiers.len());
        for cl in snapshot.classifiers {
            if cl.numerosity == 0 {
                return Err(XcsError::Config(format!("classifier {} has zero numerosity", cl.id)));
            }
            if cl.id.0 >= snapshot.next_id {
                return Err(XcsError::Config(format!(
                    "classifier {} not below next id {}",
                    cl.id, snapshot.next_id
                )));
            }
            if !seen.insert(cl.id) {
                return Err(XcsError::Config(format!("classifier {} appears twice", cl.id)));
            }
            match classifiers.values_mut().find(|held| held.same_rule(&cl)) {
                Some(held) => {
                    tracing::debug!(kept = %held.id, merged = %cl.id, "merging repeated rule");
                    held.numerosity += cl.numerosity;
                }
                None => {
                    classifiers.insert(cl.id, cl);
                }
            }
        }
        let micro: u64 = classifiers.values().map(|cl| u64::from(cl.numerosity)).sum();
        if micro > config.n as u64 {
            return Err(XcsError::Config(format!(
                "snapshot holds {micro} micro-classifiers, capacity is {}",
                config.n
            )));
        }
        Ok(Self {
            classifiers,
            config,
            next_id: snapshot.next_id,
        })
    }

    /// Copy out the contents
    #[must_use]
    pub fn snapshot(&self) -> PopulationSnapshot {
        PopulationSnapshot {
            next_id: self.next_id,
            classifiers: self.classifiers.values().cloned().collect(),
        }
    }

    /// Configuration shared with the agent
    #[must_use]
    pub fn config(&self) -> &XcsConfig {
        &self.config
    }

    /// Hand out a fresh id
    pub fn next_id(&mut self) -> ClassifierId {
        let id = ClassifierId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Number of macro-classifiers
    #[must_use]
    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    /// Whether the population is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }

    /// Total numerosity
    #[must_use]
    pub fn micro_count(&self) -> u64 {
        self.classifiers.values().map(|cl| u64::from(cl.numerosity)).sum()
    }

    /// Whether `id` is still in the population
    #[must_use]
    pub fn contains(&self, id: ClassifierId) -> bool {
        self.classifiers.contains_key(&id)
    }

    /// Look up a classifier
    #[must_use]
    pub fn get(&self, id: ClassifierId) -> Option<&Classifier> {
        self.classifiers.get(&id)
    }

    /// Look up a classifier mutably
    pub fn get_mut(&mut self, id: ClassifierId) -> Option<&mut Classifier> {
        self.classifiers.get_mut(&id)
    }

    /// All classifiers in population order
    pub fn iter(&self) -> impl Iterator<Item = &Classifier> {
        self.classifiers.values()
    }

    /// Live members among `ids`
    pub fn members<'a>(&'a self, ids: &'a [ClassifierId]) -> impl Iterator<Item = &'a Classifier> + 'a {
        ids.iter().filter_map(move |id| self.classifiers.get(id))
    }

    /// Remove a classifier entirely
    pub fn remove(&mut self, id: ClassifierId) -> Option<Classifier> {
        self.classifiers.shift_remove(&id)
    }

    /// Ids of every classifier matching `situation`
    #[must_use]
    pub fn matching(&self, situation: &Situation) -> Vec<ClassifierId> {
        self.classifiers
            .values()
            .filter(|cl| cl.matches(situation))
            .map(|cl| cl.id)
            .collect()
    }

    /// Build the match set for `situation`, covering until at least
    /// `theta_mna` distinct actions (capped at the number of legal actions)
    /// are represented.
    pub fn generate_match_set<R: Rng + ?Sized>(
        &mut self,
        situation: &Situation,
        space: &SituationSpace,
        actions: ActionSpace,
        time: u64,
        rng: &mut R,
    ) -> Result<MatchSet> {
        if actions.is_empty() {
            return Err(XcsError::Environment("action space is empty".into()));
        }
        space.check_dim(situation)?;
        if !space.contains(situation) {
            return Err(XcsError::Environment(format!(
                "situation {:?} lies outside the declared value range",
                situation.values()
            )));
        }

        let required = self.config.theta_mna.min(actions.len());
        if self.config.n < required {
            return Err(XcsError::invalid(
                "n",
                format!("capacity {} cannot hold {required} distinct actions", self.config.n),
            ));
        }

        for _ in 0..MAX_COVERING_ROUNDS * required {
            let ids = self.matching(situation);
            let mut present = vec![false; actions.len()];
            for cl in self.members(&ids) {
                if let Some(slot) = present.get_mut(cl.action.index()) {
                    *slot = true;
                }
            }
            let distinct = present.iter().filter(|p| **p).count();
            if distinct >= required {
                return Ok(MatchSet(ids));
            }

            let missing: Vec<Action> = actions.actions().filter(|a| !present[a.index()]).collect();
            let covering = self.cover(situation, space, &missing, actions, time, rng);
            tracing::debug!(classifier = %covering, "covering");
            self.insert(covering);
            self.delete_one(rng);
        }

        Err(XcsError::Other(anyhow::anyhow!(
            "covering did not reach {required} distinct actions"
        )))
    }

    /// Build a covering classifier matching `situation`
    fn cover<R: Rng + ?Sized>(
        &mut self,
        situation: &Situation,
        space: &SituationSpace,
        missing: &[Action],
        actions: ActionSpace,
        time: u64,
        rng: &mut R,
    ) -> Classifier {
        let predicate = Predicate::cover(
            situation,
            space,
            self.config.p_sharp,
            self.config.cover_half_width,
            rng,
        );
        let action = if missing.is_empty() {
            actions.sample(rng)
        } else {
            missing[rng.gen_range(0..missing.len())]
        };
        let id = self.next_id();
        Classifier::new(id, predicate, action, time, &self.config)
    }

    /// Insert a classifier, merging it into an existing rule with the same
    /// action whose predicate is identical or (for a trusted rule) more
    /// general. Returns the id of the rule that now holds it.
    pub fn insert(&mut self, classifier: Classifier) -> ClassifierId {
        let holder = self
            .classifiers
            .values()
            .find(|cl| cl.same_rule(&classifier))
            .or_else(|| {
                self.classifiers
                    .values()
                    .find(|cl| cl.does_subsume(&classifier, &self.config))
            })
            .map(|cl| cl.id);

        match holder.and_then(|id| self.classifiers.get_mut(&id)) {
            Some(existing) => {
                existing.numerosity += classifier.numerosity;
                existing.id
            }
            None => {
                let id = classifier.id;
                self.classifiers.insert(id, classifier);
                id
            }
        }
    }

    /// Add `count` micro-classifiers to an existing rule
    pub fn increment_numerosity(&mut self, id: ClassifierId, count: u32) -> bool {
        match self.classifiers.get_mut(&id) {
            Some(cl) => {
                cl.numerosity += count;
                true
            }
            None => false,
        }
    }

    /// If the population is over capacity, delete one micro-classifier chosen
    /// by roulette over deletion votes. Returns the affected rule.
    pub fn delete_one<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<ClassifierId> {
        let micro = self.micro_count();
        if micro <= self.config.n as u64 {
            return None;
        }

        let total_fitness: f64 = self.classifiers.values().map(|cl| cl.fitness).sum();
        let mean_fitness = total_fitness / micro as f64;
        let votes: Vec<f64> = self
            .classifiers
            .values()
            .map(|cl| cl.deletion_vote(mean_fitness, &self.config))
            .collect();

        let index = roulette(&votes, rng)?;
        let (&id, cl) = self.classifiers.get_index_mut(index)?;
        if cl.numerosity > 1 {
            cl.numerosity -= 1;
        } else {
            self.classifiers.shift_remove_index(index);
        }
        tracing::trace!(%id, "deleted micro-classifier");
        Some(id)
    }
}
