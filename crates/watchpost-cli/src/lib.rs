//! Reusable CLI surface over [`watchpost_core::Engine`]: argument parsing and
//! subcommand dispatch for the four operations the framework exposes to an
//! operator (`list-checks`, `run-checks`, `verify-check-configuration`,
//! `get-check-hostnames`).
//!
//! Check registration has no reflective discovery in Rust — the embedding
//! binary builds an [`EngineBuilder`] with its own checks registered and
//! hands it to [`run`]: a library entry point the binary target is a thin
//! wrapper over.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use watchpost_core::{Engine, EngineBuilder, Reporter, RuntimeOptions};
use watchpost_types::Dispatch;

#[derive(Parser, Debug)]
#[command(name = "watchpost", version)]
#[command(about = "Turns registered checks into a Checkmk-compatible status feed")]
pub struct Cli {
    /// Execution environment this process identifies as.
    #[arg(long, default_value = "default")]
    pub execution_env: String,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every registered check and its positional parameter types.
    ListChecks,
    /// Run one full poll and print a results table.
    RunChecks {
        /// Force caching on for this poll regardless of configuration.
        #[arg(long, conflicts_with = "no_cache")]
        cache: bool,
        /// Force caching off for this poll regardless of configuration.
        #[arg(long)]
        no_cache: bool,
        /// Only run checks whose id starts with this prefix.
        #[arg(long)]
        filter_prefix: Option<String>,
        /// Only run checks whose id contains this substring.
        #[arg(long)]
        filter_contains: Option<String>,
        /// Force every check onto the synchronous executor.
        #[arg(long, conflicts_with = "asynchronous")]
        sync: bool,
        /// Force every check onto the asynchronous executor.
        #[arg(long = "async")]
        asynchronous: bool,
    },
    /// Validate check registration without running anything.
    VerifyCheckConfiguration,
    /// Print the resolved hostname for every (check, environment) pair.
    GetCheckHostnames,
}

pub struct CliReporter;

impl Reporter for CliReporter {
    fn info(&mut self, msg: &str) {
        eprintln!("[info] {msg}");
    }

    fn warn(&mut self, msg: &str) {
        eprintln!("[warn] {msg}");
    }

    fn error(&mut self, msg: &str) {
        eprintln!("[error] {msg}");
    }
}

/// Parse `std::env::args`, build `builder`, and dispatch. `builder` carries
/// every check the embedder registered; building it is where
/// `verify-check-configuration`'s diagnostics come from, for every
/// subcommand alike.
pub fn run(builder: EngineBuilder) -> Result<()> {
    let cli = Cli::parse();
    run_with(cli, builder)
}

pub fn run_with(cli: Cli, builder: EngineBuilder) -> Result<()> {
    let engine = builder.build().map_err(|errors| anyhow::anyhow!("{errors}"))?;

    match cli.cmd {
        Commands::ListChecks => {
            print_checks(&engine);
        }
        Commands::RunChecks { cache, no_cache, filter_prefix, filter_contains, sync, asynchronous } => {
            let mut opts = RuntimeOptions::new(cli.execution_env);
            opts.cache_enabled = if cache {
                Some(true)
            } else if no_cache {
                Some(false)
            } else {
                None
            };
            opts.filter_prefix = filter_prefix;
            opts.filter_contains = filter_contains;
            opts.dispatch_override = if sync {
                Some(Dispatch::Sync)
            } else if asynchronous {
                Some(Dispatch::Async)
            } else {
                None
            };

            let mut reporter = CliReporter;
            let results = engine.run_once(&opts, &mut reporter).context("poll failed")?;
            print_results(&results);
        }
        Commands::VerifyCheckConfiguration => {
            // engine.build() above already validated everything; getting
            // here means registration succeeded.
            println!("configuration OK: {} check(s) registered", engine.list_checks().len());
        }
        Commands::GetCheckHostnames => {
            let pairs = engine.resolve_hostnames().context("hostname resolution failed")?;
            for (check_id, env_name, hostname) in pairs {
                println!("{check_id} ({env_name}): {hostname}");
            }
        }
    }

    Ok(())
}

fn print_checks(engine: &Engine) {
    for line in engine.list_checks() {
        println!("{line}");
    }
}

fn print_results(results: &[watchpost_types::ExecutionResult]) {
    println!("{:<8} {:<16} {:<24} {}", "State", "Environment", "Service", "Summary");
    for r in results {
        println!("{:<8} {:<16} {:<24} {}", r.state, r.environment_name, r.service_name, r.summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_check_configuration_reports_zero_checks_for_empty_builder() {
        let cli = Cli { execution_env: "prod".to_string(), cmd: Commands::VerifyCheckConfiguration };
        assert!(run_with(cli, EngineBuilder::new()).is_ok());
    }

    #[test]
    fn list_checks_succeeds_against_an_empty_engine() {
        let cli = Cli { execution_env: "prod".to_string(), cmd: Commands::ListChecks };
        assert!(run_with(cli, EngineBuilder::new()).is_ok());
    }

    #[test]
    fn run_checks_with_no_registered_checks_produces_an_empty_poll() {
        let cli = Cli {
            execution_env: "prod".to_string(),
            cmd: Commands::RunChecks {
                cache: false,
                no_cache: false,
                filter_prefix: None,
                filter_contains: None,
                sync: false,
                asynchronous: false,
            },
        };
        assert!(run_with(cli, EngineBuilder::new()).is_ok());
    }

    #[test]
    fn get_check_hostnames_succeeds_against_an_empty_engine() {
        let cli = Cli { execution_env: "prod".to_string(), cmd: Commands::GetCheckHostnames };
        assert!(run_with(cli, EngineBuilder::new()).is_ok());
    }
}
