//! The XCSR agent: one performance/reinforcement/discovery cycle per step

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::sync::Arc;

use xcsr_core::{
    ActionSpace, Environment, MetricsRecord, Outcome, Result, Situation, SituationSpace, StepMetric,
    XcsConfig, XcsError,
};

use crate::credit;
use crate::ga::{self, GaContext};
use crate::population::{ActionSet, MatchSet, Population, PopulationSnapshot};
use crate::prediction::PredictionArray;

/// Action set awaiting its discounted payoff from the next step
#[derive(Debug, Clone)]
struct PendingCredit {
    action_set: ActionSet,
    reward: f64,
    situation: Situation,
}

/// XCSR learning agent.
///
/// All stochastic decisions draw from a single seeded generator, so two
/// agents built from the same configuration and seed, run against
/// identically seeded environments, produce identical metrics.
pub struct XcsrAgent {
    config: Arc<XcsConfig>,
    population: Population,
    rng: StdRng,
    time: u64,
    exploration: f64,
    pending: Option<PendingCredit>,
    metrics: MetricsRecord,
}

impl XcsrAgent {
    /// Validate `config` and build an agent with an empty population
    pub fn new(config: XcsConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let exploration = config.p_explr;
        let config = Arc::new(config);
        Ok(Self {
            population: Population::new(Arc::clone(&config)),
            config,
            rng,
            time: 0,
            exploration,
            pending: None,
            metrics: MetricsRecord::new(),
        })
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &XcsConfig {
        &self.config
    }

    /// Current rule set
    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Steps taken since construction
    #[must_use]
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Metrics gathered since the last [`XcsrAgent::take_metrics`]
    #[must_use]
    pub fn metrics(&self) -> &MetricsRecord {
        &self.metrics
    }

    /// Hand over the metrics gathered so far and start a fresh record
    pub fn take_metrics(&mut self) -> MetricsRecord {
        std::mem::take(&mut self.metrics)
    }

    /// Current exploration probability
    #[must_use]
    pub fn exploration(&self) -> f64 {
        self.exploration
    }

    /// Override the exploration probability (clamped to `[0, 1]`)
    pub fn set_exploration(&mut self, p_explr: f64) {
        self.exploration = p_explr.clamp(0.0, 1.0);
    }

    /// Run one control step against `env`
    pub fn step<E: Environment + ?Sized>(&mut self, env: &mut E) -> Result<Outcome> {
        let space = env.situation_space().clone();
        let actions = env.action_space();
        let situation = env.situation();

        let match_set =
            self.population
                .generate_match_set(&situation, &space, actions, self.time, &mut self.rng)?;
        let predictions = PredictionArray::new(&self.population, &match_set, actions);
        let action = predictions.select_action(self.exploration, &mut self.rng)?;
        let predicted = predictions.get(action).ok_or(XcsError::NoEligibleActions)?;
        let action_set = match_set.action_set(&self.population, action);

        let outcome = env.commit(action)?;
        self.time += 1;
        tracing::debug!(
            time = self.time,
            situation = ?situation.values(),
            %action,
            reward = outcome.reward,
            predicted,
            "step"
        );

        if let Some(previous) = self.pending.take() {
            let payoff = previous.reward + self.config.gamma * predictions.max().unwrap_or(0.0);
            self.learn(previous.action_set, payoff, &previous.situation, &space, actions);
        }

        if outcome.done {
            self.learn(action_set, outcome.reward, &situation, &space, actions);
        } else {
            self.pending = Some(PendingCredit {
                action_set,
                reward: outcome.reward,
                situation,
            });
        }

        self.metrics.push(StepMetric {
            reward: outcome.reward,
            predicted_reward: predicted,
            micro_classifiers: self.population.micro_count(),
        });
        Ok(outcome)
    }

    /// Step until `env` reports termination and return the metrics of the run.
    ///
    /// A run cut short while an action set is still waiting for its payoff
    /// drops that set without updating it.
    pub fn run<E: Environment + ?Sized>(&mut self, env: &mut E) -> Result<MetricsRecord> {
        tracing::debug!(env = env.name(), time = self.time, "run started");
        while !env.is_terminated() {
            self.step(env)?;
        }
        if self.pending.take().is_some() {
            tracing::debug!("dropping unfinished action set");
        }
        let metrics = self.take_metrics();
        tracing::debug!(
            env = env.name(),
            steps = metrics.len(),
            macro_classifiers = self.population.len(),
            micro_classifiers = self.population.micro_count(),
            "run finished"
        );
        Ok(metrics)
    }

    /// Prediction array for `situation` using the current rules only.
    ///
    /// Nothing is covered or learned; actions no rule proposes stay `None`.
    pub fn predict(&self, situation: &Situation, actions: ActionSpace) -> PredictionArray {
        let match_set = MatchSet(self.population.matching(situation));
        PredictionArray::new(&self.population, &match_set, actions)
    }

    /// Write the population to `path` as JSON
    pub fn save_population(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.population.snapshot())?;
        std::fs::write(path.as_ref(), json)?;
        tracing::info!(path = %path.as_ref().display(), rules = self.population.len(), "population saved");
        Ok(())
    }

    /// Replace the population with one read from `path`
    pub fn load_population(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let snapshot: PopulationSnapshot = serde_json::from_str(&json)?;
        self.population = Population::restore(Arc::clone(&self.config), snapshot)?;
        self.pending = None;
        tracing::info!(path = %path.as_ref().display(), rules = self.population.len(), "population loaded");
        Ok(())
    }

    fn learn(
        &mut self,
        mut action_set: ActionSet,
        payoff: f64,
        situation: &Situation,
        space: &SituationSpace,
        actions: ActionSpace,
    ) {
        credit::update_set(&mut self.population, &mut action_set, payoff, &self.config);
        let ctx = GaContext {
            situation,
            space,
            actions,
            time: self.time,
        };
        if ga::run(&mut self.population, &mut action_set, &ctx, &mut self.rng) {
            tracing::trace!(time = self.time, "genetic algorithm ran");
        }
    }
}

impl std::fmt::Debug for XcsrAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XcsrAgent")
            .field("time", &self.time)
            .field("exploration", &self.exploration)
            .field("macro_classifiers", &self.population.len())
            .field("micro_classifiers", &self.population.micro_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xcsr_core::Action;

    /// Two-step corridor: action 1 moves forward, reward 100 at the end
    struct Corridor {
        space: SituationSpace,
        position: usize,
        steps: usize,
        budget: usize,
    }

    impl Corridor {
        fn new(budget: usize) -> Self {
            Self {
                space: SituationSpace::uniform(1, 0.0, 1.0),
                position: 0,
                steps: 0,
                budget,
            }
        }
    }

    impl Environment for Corridor {
        fn name(&self) -> &str {
            "corridor"
        }
        fn situation_space(&self) -> &SituationSpace {
            &self.space
        }
        fn action_space(&self) -> ActionSpace {
            ActionSpace::new(2)
        }
        fn situation(&self) -> Situation {
            Situation(vec![self.position as f64 / 2.0])
        }
        fn commit(&mut self, action: Action) -> Result<Outcome> {
            self.steps += 1;
            if action == Action(1) {
                self.position += 1;
            }
            if self.position == 2 {
                self.position = 0;
                Ok(Outcome::terminal(100.0))
            } else {
                Ok(Outcome::running(0.0))
            }
        }
        fn reset(&mut self) -> Result<()> {
            self.position = 0;
            self.steps = 0;
            Ok(())
        }
        fn is_terminated(&self) -> bool {
            self.steps >= self.budget
        }
        fn is_multi_step(&self) -> bool {
            true
        }
    }

    fn config(seed: u64) -> XcsConfig {
        XcsConfig {
            n: 100,
            seed: Some(seed),
            ..XcsConfig::default()
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let bad = XcsConfig { beta: 0.0, ..XcsConfig::default() };
        assert!(matches!(XcsrAgent::new(bad), Err(XcsError::InvalidParameter { name: "beta", .. })));
    }

    #[test]
    fn test_run_records_one_metric_per_step() {
        let mut agent = XcsrAgent::new(config(1)).unwrap();
        let mut env = Corridor::new(50);
        let metrics = agent.run(&mut env).unwrap();
        assert_eq!(metrics.len(), 50);
        assert_eq!(agent.time(), 50);
        assert!(agent.metrics().is_empty());
        for step in metrics.steps() {
            assert!(step.micro_classifiers <= 100);
        }
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed| {
            let mut agent = XcsrAgent::new(config(seed)).unwrap();
            agent.run(&mut Corridor::new(200)).unwrap()
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn test_terminated_environment_takes_no_steps() {
        let mut agent = XcsrAgent::new(config(1)).unwrap();
        let metrics = agent.run(&mut Corridor::new(0)).unwrap();
        assert!(metrics.is_empty());
        assert!(agent.population().is_empty());
    }

    #[test]
    fn test_discounted_payoff_reaches_first_step() {
        let mut agent = XcsrAgent::new(XcsConfig { p_explr: 0.3, ..config(3) }).unwrap();
        agent.run(&mut Corridor::new(3000)).unwrap();

        let start = agent.predict(&Situation(vec![0.0]), ActionSpace::new(2));
        let forward = start.get(Action(1)).unwrap();
        assert!(forward > 30.0, "forward prediction {forward}");
        assert!(forward <= 100.0, "forward prediction {forward}");
    }

    #[test]
    fn test_exploration_override_is_clamped() {
        let mut agent = XcsrAgent::new(config(1)).unwrap();
        agent.set_exploration(3.0);
        assert_eq!(agent.exploration(), 1.0);
    }

    #[test]
    fn test_population_save_and_load() {
        let mut agent = XcsrAgent::new(config(4)).unwrap();
        agent.run(&mut Corridor::new(100)).unwrap();
        let path = std::env::temp_dir().join(format!("xcsr-population-{}.json", std::process::id()));
        agent.save_population(&path).unwrap();

        let mut restored = XcsrAgent::new(config(4)).unwrap();
        restored.load_population(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(restored.population().len(), agent.population().len());
        assert_eq!(restored.population().micro_count(), agent.population().micro_count());
    }

    #[test]
    fn test_load_rejects_population_over_capacity() {
        let mut big = XcsrAgent::new(XcsConfig { n: 400, ..config(6) }).unwrap();
        big.run(&mut Corridor::new(300)).unwrap();
        let micro = big.population().micro_count();
        let path = std::env::temp_dir().join(format!("xcsr-oversized-{}.json", std::process::id()));
        big.save_population(&path).unwrap();

        let capacity = (micro / 2) as usize;
        let mut small = XcsrAgent::new(XcsConfig { n: capacity, ..config(6) }).unwrap();
        let result = small.load_population(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(XcsError::Config(_))));
        assert!(small.population().is_empty());
    }
}
