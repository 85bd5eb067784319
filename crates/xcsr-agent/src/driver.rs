//! Independent replications of an experiment
//!
//! Each replication owns its agent and environment and runs on a blocking
//! worker, so replications proceed in parallel without sharing state.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinSet;
use uuid::Uuid;

use xcsr_core::{Environment, MetricsRecord, Result, XcsConfig, XcsError};

use crate::xcsr::XcsrAgent;

/// Mixed into the replication seed for the explore/exploit coin
const EPISODE_COIN_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// How many replications to run and how to split them into episodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Number of independent replications
    pub replications: usize,
    /// Recorded episodes per replication
    pub episodes: usize,
    /// For multi-step problems, flip a fair coin before every episode:
    /// explore episodes (`p_explr = 1`) train silently, exploit episodes
    /// (`p_explr = 0`) are recorded
    pub alternate_exploration: bool,
    /// Replication `i` is seeded with `base_seed + i`
    pub base_seed: u64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            replications: 10,
            episodes: 1,
            alternate_exploration: false,
            base_seed: 0,
        }
    }
}

impl ExperimentConfig {
    /// Check the counts are usable
    pub fn validate(&self) -> Result<()> {
        if self.replications == 0 {
            return Err(XcsError::invalid("replications", "must be at least 1"));
        }
        if self.episodes == 0 {
            return Err(XcsError::invalid("episodes", "must be at least 1"));
        }
        Ok(())
    }

    /// Seed of replication `index`
    #[must_use]
    pub fn seed_for(&self, index: usize) -> u64 {
        self.base_seed.wrapping_add(index as u64)
    }
}

/// Outcome of one replication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationReport {
    /// Unique run id
    pub id: Uuid,
    /// Position within the experiment
    pub index: usize,
    /// Seed shared by the agent and the environment
    pub seed: u64,
    /// Environment name
    pub environment: String,
    /// Wall-clock start
    pub started_at: DateTime<Utc>,
    /// Wall-clock end
    pub finished_at: DateTime<Utc>,
    /// Metrics of each recorded episode
    pub episodes: Vec<MetricsRecord>,
    /// Final population size in macro-classifiers
    pub macro_classifiers: usize,
    /// Final population size in micro-classifiers
    pub micro_classifiers: u64,
}

impl ReplicationReport {
    /// Mean reward over the last `window` steps of every recorded episode
    #[must_use]
    pub fn mean_reward(&self, window: usize) -> f64 {
        mean(self.episodes.iter().map(|e| e.mean_reward(window)))
    }

    /// Mean episode length
    #[must_use]
    pub fn mean_steps(&self) -> f64 {
        mean(self.episodes.iter().map(|e| e.len() as f64))
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

/// A batch of replications sharing one configuration
#[derive(Debug, Clone)]
pub struct Experiment {
    config: XcsConfig,
    experiment: ExperimentConfig,
}

impl Experiment {
    /// Validate both configurations
    pub fn new(config: XcsConfig, experiment: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        experiment.validate()?;
        Ok(Self { config, experiment })
    }

    /// Agent configuration
    #[must_use]
    pub fn config(&self) -> &XcsConfig {
        &self.config
    }

    /// Replication settings
    #[must_use]
    pub fn experiment(&self) -> &ExperimentConfig {
        &self.experiment
    }

    /// Run every replication in parallel.
    ///
    /// `factory` builds a fresh environment from the replication seed.
    /// Reports come back ordered by index. The first failing replication
    /// aborts the rest and its error is returned.
    pub async fn run<F, E>(&self, factory: F) -> Result<Vec<ReplicationReport>>
    where
        F: Fn(u64) -> Result<E> + Send + Sync + 'static,
        E: Environment + 'static,
    {
        let factory = Arc::new(factory);
        let mut tasks = JoinSet::new();

        for index in 0..self.experiment.replications {
            let factory = Arc::clone(&factory);
            let experiment = self.clone();
            tasks.spawn_blocking(move || {
                let seed = experiment.experiment.seed_for(index);
                let mut env = (*factory)(seed)?;
                experiment.run_replication(index, &mut env)
            });
        }

        let mut reports = Vec::with_capacity(self.experiment.replications);
        while let Some(joined) = tasks.join_next().await {
            let report = joined
                .map_err(|e| XcsError::Other(anyhow::anyhow!("replication task failed: {e}")))??;
            reports.push(report);
        }
        reports.sort_by_key(|r| r.index);
        Ok(reports)
    }

    /// Run replication `index` to completion on the calling thread
    pub fn run_replication<E: Environment + ?Sized>(
        &self,
        index: usize,
        env: &mut E,
    ) -> Result<ReplicationReport> {
        let seed = self.experiment.seed_for(index);
        let started_at = Utc::now();
        let id = Uuid::new_v4();
        tracing::info!(%id, index, seed, env = env.name(), "replication started");

        let mut agent = XcsrAgent::new(XcsConfig {
            seed: Some(seed),
            ..self.config.clone()
        })?;
        let mut coin = StdRng::seed_from_u64(seed ^ EPISODE_COIN_SALT);
        let alternate = self.experiment.alternate_exploration && env.is_multi_step();

        let mut episodes = Vec::with_capacity(self.experiment.episodes);
        let mut explore_episodes = 0usize;
        while episodes.len() < self.experiment.episodes {
            env.reset()?;
            let explore = alternate && coin.gen_bool(0.5);
            if alternate {
                agent.set_exploration(if explore { 1.0 } else { 0.0 });
            }
            let metrics = agent.run(env)?;
            if explore {
                explore_episodes += 1;
            } else {
                tracing::debug!(
                    index,
                    episode = episodes.len(),
                    steps = metrics.len(),
                    total_reward = metrics.total_reward(),
                    "episode recorded"
                );
                episodes.push(metrics);
            }
        }

        let report = ReplicationReport {
            id,
            index,
            seed,
            environment: env.name().to_string(),
            started_at,
            finished_at: Utc::now(),
            episodes,
            macro_classifiers: agent.population().len(),
            micro_classifiers: agent.population().micro_count(),
        };
        tracing::info!(
            %id,
            index,
            explore_episodes,
            mean_reward = report.mean_reward(0),
            macro_classifiers = report.macro_classifiers,
            "replication finished"
        );
        Ok(report)
    }
}
