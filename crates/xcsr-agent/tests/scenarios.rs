//! End-to-end learning scenarios

use approx::assert_relative_eq;
use std::sync::Arc;

use xcsr_agent::ga::{self, GaContext};
use xcsr_agent::{ActionSet, Experiment, ExperimentConfig, Population, XcsrAgent};
use xcsr_core::{
    Action, ActionSpace, Classifier, ClassifierId, Condition, Environment, Interval, Predicate,
    Situation, SituationSpace, XcsConfig,
};
use xcsr_env::{MultiplexerConfig, RealMultiplexer, StepLimit, ThresholdEnv, Woods2};

fn range(lo: f64, hi: f64) -> Condition {
    Condition::Range(Interval::new(lo, hi))
}

#[test]
fn threshold_problem_learns_correct_actions() {
    let config = XcsConfig {
        n: 400,
        seed: Some(17),
        ..XcsConfig::default()
    };
    let mut agent = XcsrAgent::new(config).unwrap();
    let mut env = StepLimit::new(ThresholdEnv::new(0.5, 17).unwrap(), 6000);
    let metrics = agent.run(&mut env).unwrap();
    assert_eq!(metrics.len(), 6000);

    let actions = ActionSpace::new(2);
    for (x, correct) in [(0.1, Action(0)), (0.25, Action(0)), (0.75, Action(1)), (0.9, Action(1))] {
        let predictions = agent.predict(&Situation(vec![x]), actions);
        assert_eq!(predictions.best_action(), Some(correct), "at x = {x}: {predictions:?}");
        let value = predictions.get(correct).unwrap();
        assert!(value > 0.6, "prediction {value} for the correct action at x = {x}");
    }
    assert!(metrics.mean_reward(1000) > metrics.mean_reward(0) - 0.05);
}

#[test]
fn covering_heavy_run_respects_capacity() {
    let config = XcsConfig {
        n: 50,
        p_sharp: 0.0,
        cover_half_width: 0.05,
        theta_ga: 5.0,
        seed: Some(3),
        ..XcsConfig::default()
    };
    let mut agent = XcsrAgent::new(config).unwrap();
    let env = RealMultiplexer::new(MultiplexerConfig { address_bits: 2 }, 3).unwrap();
    let mut env = StepLimit::new(env, 1000);

    while !env.is_terminated() {
        agent.step(&mut env).unwrap();
        assert!(agent.population().micro_count() <= 50);
        assert!(agent.population().iter().all(|cl| cl.numerosity >= 1));
    }
    let metrics = agent.take_metrics();
    assert_eq!(metrics.len(), 1000);
    assert!(metrics.steps().iter().all(|s| s.micro_classifiers <= 50));
}

#[test]
fn crossover_at_first_cut_swaps_only_first_condition() {
    let config = XcsConfig::default();
    let mut a = Classifier::new(
        ClassifierId(0),
        Predicate(vec![range(0.2, 0.4), range(0.0, 0.1), Condition::Wildcard]),
        Action(0),
        0,
        &config,
    );
    let mut b = Classifier::new(
        ClassifierId(1),
        Predicate(vec![range(0.6, 0.8), Condition::Wildcard, range(0.3, 0.35)]),
        Action(0),
        0,
        &config,
    );

    ga::crossover_at(&mut a, &mut b, 0, 1);

    assert_eq!(
        a.predicate.conditions(),
        &[range(0.6, 0.8), range(0.0, 0.1), Condition::Wildcard]
    );
    assert_eq!(
        b.predicate.conditions(),
        &[range(0.2, 0.4), Condition::Wildcard, range(0.3, 0.35)]
    );
}

#[test]
fn general_accurate_parent_subsumes_specific_offspring() {
    let config = XcsConfig {
        theta_ga: 0.0,
        chi: 0.0,
        mu: 1.0,
        ..XcsConfig::default()
    };
    let mut parent = Classifier::new(ClassifierId(0), Predicate::general(2), Action(0), 0, &config);
    parent.experience = config.theta_sub + 1;
    parent.error = config.epsilon_0 / 2.0;

    let child = Classifier::new(
        ClassifierId(1),
        Predicate(vec![range(0.2, 0.4), Condition::Wildcard]),
        Action(0),
        0,
        &config,
    );
    assert!(parent.does_subsume(&child, &config));

    // With mu = 1 every wildcard of an offspring becomes an interval around
    // the situation. A single legal action keeps the offspring's action.
    let space = SituationSpace::uniform(2, 0.0, 1.0);
    let situation = Situation(vec![0.3, 0.6]);
    let ctx = GaContext {
        situation: &situation,
        space: &space,
        actions: ActionSpace::new(1),
        time: 10,
    };
    let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(1);

    let mut mutated = parent.clone();
    ga::mutate(&mut mutated, &ctx, &config, &mut rng);
    assert_eq!(mutated.predicate.wildcards(), 0);
    assert!(mutated.matches(&situation));
    assert!(parent.does_subsume(&mutated, &config));

    let mut population = Population::new(Arc::new(config.clone()));
    parent.id = population.next_id();
    let parent_id = population.insert(parent);
    let mut set = ActionSet(vec![parent_id]);
    assert!(ga::run(&mut population, &mut set, &ctx, &mut rng));

    assert_eq!(population.len(), 1);
    assert_eq!(population.micro_count(), 3);
    let parent = population.get(parent_id).unwrap();
    assert_eq!(parent.numerosity, 3);
    assert_eq!(parent.predicate.wildcards(), 2);
}

#[test]
fn woods2_episodes_keep_population_invariants() {
    let config = XcsConfig {
        seed: Some(5),
        ..XcsConfig::woods2()
    };
    let mut agent = XcsrAgent::new(config).unwrap();
    let mut env = StepLimit::new(Woods2::new(5), 50);

    for _ in 0..20 {
        env.reset().unwrap();
        let metrics = agent.run(&mut env).unwrap();
        assert!(!metrics.is_empty());
        assert!(metrics.len() <= 50);
        assert!(agent.population().micro_count() <= 800);
    }
}

#[test]
fn saturated_update_at_prediction_is_stable() {
    let config = XcsConfig::default();
    let mut population = Population::new(Arc::new(config.clone()));
    let id = population.next_id();
    let mut cl = Classifier::new(id, Predicate::general(1), Action(0), 0, &config);
    cl.experience = 100;
    cl.prediction = 42.0;
    cl.error = 0.0;
    let id = population.insert(cl);
    let mut set = ActionSet(vec![id]);

    xcsr_agent::credit::update_set(&mut population, &mut set, 42.0, &config);

    let cl = population.get(id).unwrap();
    assert_relative_eq!(cl.prediction, 42.0);
    assert_relative_eq!(cl.error, 0.0);
}

#[tokio::test]
async fn driver_runs_replications_in_order_and_reproducibly() {
    let config = XcsConfig {
        n: 200,
        ..XcsConfig::default()
    };
    let experiment = ExperimentConfig {
        replications: 3,
        episodes: 1,
        alternate_exploration: false,
        base_seed: 100,
    };
    let experiment = Experiment::new(config, experiment).unwrap();
    let factory = |seed: u64| -> xcsr_core::Result<_> {
        Ok(StepLimit::new(ThresholdEnv::new(0.5, seed)?, 300))
    };

    let first = experiment.run(factory).await.unwrap();
    let second = experiment.run(factory).await.unwrap();

    assert_eq!(first.len(), 3);
    for (i, report) in first.iter().enumerate() {
        assert_eq!(report.index, i);
        assert_eq!(report.seed, 100 + i as u64);
        assert_eq!(report.episodes.len(), 1);
        assert_eq!(report.episodes[0].len(), 300);
        assert!(report.micro_classifiers <= 200);
        assert!(report.finished_at >= report.started_at);
    }
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.episodes, b.episodes);
        assert_ne!(a.id, b.id);
    }
}

#[tokio::test]
async fn driver_records_only_exploit_episodes() {
    let config = XcsConfig {
        n: 300,
        ..XcsConfig::woods2()
    };
    let experiment = ExperimentConfig {
        replications: 2,
        episodes: 5,
        alternate_exploration: true,
        base_seed: 7,
    };
    let experiment = Experiment::new(config, experiment).unwrap();
    let reports = experiment
        .run(|seed| Ok(StepLimit::new(Woods2::new(seed), 30)))
        .await
        .unwrap();

    assert_eq!(reports.len(), 2);
    for report in &reports {
        assert_eq!(report.environment, "woods2");
        assert_eq!(report.episodes.len(), 5);
        assert!(report.episodes.iter().all(|e| !e.is_empty() && e.len() <= 30));
    }
}

#[test]
fn invalid_experiment_is_rejected() {
    let experiment = ExperimentConfig {
        replications: 0,
        ..ExperimentConfig::default()
    };
    assert!(Experiment::new(XcsConfig::default(), experiment).is_err());
}
