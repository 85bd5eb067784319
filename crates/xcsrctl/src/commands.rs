// Command implementations for xcsrctl

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use xcsr_agent::{Experiment, ExperimentConfig, ReplicationReport};
use xcsr_core::XcsConfig;
use xcsr_env::{EnvParams, EnvRegistry};

const SINGLE_STEP_BUDGET: usize = 10_000;
const EPISODE_STEP_LIMIT: usize = 50;
const DEFAULT_EPISODES: usize = 100;

pub struct RunArgs {
    pub env: String,
    pub config: Option<PathBuf>,
    pub replications: usize,
    pub steps: Option<usize>,
    pub episodes: Option<usize>,
    pub seed: u64,
    pub window: usize,
    pub alternate: bool,
    pub json: bool,
}

pub async fn run_experiment(args: RunArgs) -> Result<()> {
    let registry = Arc::new(EnvRegistry::with_builtins());
    let probe = registry
        .make(&args.env, EnvParams { seed: args.seed, max_steps: 1 })
        .with_context(|| format!("Cannot create environment `{}`", args.env))?;
    let multi_step = probe.is_multi_step();

    let config = match &args.config {
        Some(path) => XcsConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => preset_for(&args.env),
    };

    let max_steps = args
        .steps
        .unwrap_or(if multi_step { EPISODE_STEP_LIMIT } else { SINGLE_STEP_BUDGET });
    let episodes = match args.episodes {
        Some(n) => n,
        None if multi_step => DEFAULT_EPISODES,
        None => 1,
    };
    let experiment = ExperimentConfig {
        replications: args.replications,
        episodes,
        alternate_exploration: args.alternate,
        base_seed: args.seed,
    };

    tracing::info!(
        env = %args.env,
        replications = args.replications,
        max_steps,
        episodes,
        "starting experiment"
    );

    let experiment = Experiment::new(config, experiment).context("Invalid experiment")?;
    let name = args.env.clone();
    let reports = experiment
        .run(move |seed| registry.make(&name, EnvParams { seed, max_steps }))
        .await
        .context("Experiment failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_summary(&reports, args.window, multi_step);
    }
    Ok(())
}

fn preset_for(env: &str) -> XcsConfig {
    match env {
        "multiplexer" => XcsConfig::multiplexer(),
        "woods2" => XcsConfig::woods2(),
        _ => XcsConfig::default(),
    }
}

fn print_summary(reports: &[ReplicationReport], window: usize, multi_step: bool) {
    println!("📊 XCSR results\n");
    for report in reports {
        let elapsed = report.finished_at - report.started_at;
        println!("Replication {} (seed {})", report.index, report.seed);
        if multi_step {
            println!("   Mean steps to food: {:.2}", report.mean_steps());
        } else {
            println!("   Mean reward (last {window}): {:.4}", report.mean_reward(window));
        }
        println!(
            "   Population: {} macro / {} micro",
            report.macro_classifiers, report.micro_classifiers
        );
        println!("   Elapsed: {} ms", elapsed.num_milliseconds());
        println!();
    }

    if reports.len() > 1 {
        let n = reports.len() as f64;
        if multi_step {
            let mean = reports.iter().map(ReplicationReport::mean_steps).sum::<f64>() / n;
            println!("Overall mean steps to food: {mean:.2}");
        } else {
            let mean = reports.iter().map(|r| r.mean_reward(window)).sum::<f64>() / n;
            println!("Overall mean reward: {mean:.4}");
        }
    }
}

pub fn print_config(config: &XcsConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

pub fn list_envs() {
    let registry = EnvRegistry::with_builtins();
    println!("📋 Registered environments:\n");
    for name in registry.list() {
        println!("   {name}");
    }
}
