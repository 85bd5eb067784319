// XCSR experiment CLI
// Runs replications against the built-in scenario environments

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use xcsr_core::XcsConfig;

mod commands;

#[derive(Parser)]
#[command(name = "xcsrctl")]
#[command(about = "XCSR learning classifier system runner", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an experiment
    Run {
        /// Environment name (see `xcsrctl envs`)
        #[arg(short, long, default_value = "multiplexer")]
        env: String,

        /// JSON configuration file; defaults to the environment's preset
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of independent replications
        #[arg(short, long, default_value = "1")]
        replications: usize,

        /// Step budget (whole run for single-step problems, per episode otherwise)
        #[arg(long)]
        steps: Option<usize>,

        /// Recorded episodes per replication (multi-step problems)
        #[arg(long)]
        episodes: Option<usize>,

        /// Base seed; replication i uses seed + i
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Trailing window, in steps, for the reported mean reward
        #[arg(long, default_value = "1000")]
        window: usize,

        /// Keep the configured exploration rate in every multi-step episode
        #[arg(long)]
        no_alternate: bool,

        /// Print the reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a configuration as JSON
    Config {
        /// Parameter preset
        #[arg(short, long, value_enum, default_value = "default")]
        preset: Preset,
    },

    /// List registered environments
    Envs,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Default,
    Multiplexer,
    Woods2,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            env,
            config,
            replications,
            steps,
            episodes,
            seed,
            window,
            no_alternate,
            json,
        } => {
            let args = commands::RunArgs {
                env,
                config,
                replications,
                steps,
                episodes,
                seed,
                window,
                alternate: !no_alternate,
                json,
            };
            commands::run_experiment(args).await?;
        }

        Commands::Config { preset } => {
            commands::print_config(&preset.config())?;
        }

        Commands::Envs => {
            commands::list_envs();
        }
    }

    Ok(())
}

impl Preset {
    fn config(self) -> XcsConfig {
        match self {
            Preset::Default => XcsConfig::default(),
            Preset::Multiplexer => XcsConfig::multiplexer(),
            Preset::Woods2 => XcsConfig::woods2(),
        }
    }
}
