//! feedclicker
//!
//! Command line front end: record click targets, generate a randomized
//! sequence and replay it. Replays use a dry-run executor that logs each
//! action; Ctrl-C stops a run.

mod report;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fc_config::{ConfigStore, DEFAULT_CONFIG_FILE};
use fc_core::RunSettings;
use fc_engine::{DryRunExecutor, ExecutionEngine, RunOutcome};
use fc_sequence::{AdjacencyRule, GenerationPolicy};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "feedclicker",
    about = "Record click targets, generate randomized feed sequences and replay them",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file
    #[arg(long, global = true, env = "FEEDCLICKER_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show recorded actions, settings and the saved sequence
    Show,

    /// Record the screen position of a click target
    Record {
        /// Action name (like, bookmark, follow, ...)
        name: String,

        #[arg(allow_negative_numbers = true)]
        x: i32,

        #[arg(allow_negative_numbers = true)]
        y: i32,
    },

    /// Generate a new sequence and save it
    Generate {
        /// Number of steps (default from config)
        #[arg(long)]
        length: Option<usize>,

        /// Sampling policy (default from config)
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
    },

    /// Replay the saved sequence until Ctrl-C
    Run {
        /// Play the sequence a single time
        #[arg(long)]
        once: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Independent weighted draw per step
    Weighted,
    /// Weighted quotas with no back-to-back likes
    Quota,
}

impl From<PolicyArg> for GenerationPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Weighted => GenerationPolicy::WeightedDraw,
            PolicyArg::Quota => GenerationPolicy::QuotaPool(AdjacencyRule::reference()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let store = ConfigStore::new(cli.config);

    match cli.command {
        Commands::Show => show(&store),
        Commands::Record { name, x, y } => record(&store, &name, x, y),
        Commands::Generate { length, policy } => generate(&store, length, policy),
        Commands::Run { once } => run(&store, once).await,
    }
}

fn show(store: &ConfigStore) -> Result<()> {
    let config = store.load_or_default()?;
    println!("Config: {}", store.path().display());
    print!("{}", report::config_summary(&config));
    Ok(())
}

fn record(store: &ConfigStore, name: &str, x: i32, y: i32) -> Result<()> {
    let mut config = store.load_or_default()?;
    let mut catalog = config.catalog()?;
    catalog
        .record_click(name, x, y)
        .with_context(|| format!("cannot record '{}'", name))?;
    config.set_catalog(&catalog);
    store.save(&config)?;

    info!(action = name, x, y, "Recorded click target");
    println!("Recorded {} at ({}, {})", name, x, y);

    let missing = catalog.missing();
    if !missing.is_empty() {
        println!("Still to record: {}", missing.join(", "));
    }
    Ok(())
}

fn generate(store: &ConfigStore, length: Option<usize>, policy: Option<PolicyArg>) -> Result<()> {
    let mut config = store.load_or_default()?;
    if let Some(policy) = policy {
        config.generation.policy = policy.into();
    }
    let length = length.unwrap_or(config.generation.length);

    let catalog = config.catalog()?;
    let sequence = config
        .generation
        .generator()
        .generate(&catalog, &config.generation.weights, length)
        .context("cannot generate a sequence")?;

    println!("Generated {} steps", sequence.len());
    config.set_sequence(sequence);
    store.save(&config)?;
    Ok(())
}

async fn run(store: &ConfigStore, once: bool) -> Result<()> {
    let config = store.load_or_default()?;
    let catalog = config.catalog()?;
    let settings = if once {
        RunSettings {
            repeat: false,
            ..config.settings.clone()
        }
    } else {
        config.settings.clone()
    };

    let executor = Arc::new(DryRunExecutor::new());
    let engine = ExecutionEngine::new(executor.clone(), Arc::new(catalog));

    let mut events = engine.events().subscribe();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Some(line) = report::event_line(&event.data) {
                println!("{}", line);
            }
            if event.data.is_terminal() {
                break;
            }
        }
    });

    let run_id = engine.start(config.sequence(), &settings)?;
    info!(run_id = %run_id, "Press Ctrl-C to stop");

    let stop = engine.stop_handle();
    let signal = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, stopping");
                stop.stop();
            }
            Err(e) => warn!("Cannot listen for Ctrl-C: {}", e),
        }
    });

    let outcome = engine.join().await;
    signal.abort();
    if outcome.is_none() {
        // No Finished event is coming from a dead worker
        printer.abort();
    }
    match printer.await {
        Err(e) if !e.is_cancelled() => warn!("Event printer ended abnormally: {}", e),
        _ => {}
    }

    info!(performed = executor.performed(), "Run over");
    match outcome {
        Some(RunOutcome::Failed(e)) => Err(e.into()),
        Some(RunOutcome::Completed) | Some(RunOutcome::Cancelled) => Ok(()),
        None => bail!("run worker ended abnormally"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        let cli = Cli::parse_from(["feedclicker", "record", "like", "-20", "540"]);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert!(matches!(
            cli.command,
            Commands::Record { ref name, x: -20, y: 540 } if name == "like"
        ));

        let cli = Cli::parse_from([
            "feedclicker",
            "--config",
            "other.json",
            "generate",
            "--length",
            "20",
            "--policy",
            "quota",
        ]);
        assert_eq!(cli.config, PathBuf::from("other.json"));
        assert!(matches!(
            cli.command,
            Commands::Generate {
                length: Some(20),
                policy: Some(PolicyArg::Quota)
            }
        ));
    }

    #[test]
    fn test_policy_arg_maps_to_policy() {
        assert_eq!(
            GenerationPolicy::from(PolicyArg::Weighted),
            GenerationPolicy::WeightedDraw
        );
        assert!(matches!(
            GenerationPolicy::from(PolicyArg::Quota),
            GenerationPolicy::QuotaPool(_)
        ));
    }
}
