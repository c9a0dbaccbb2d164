mod analysis;
mod binning;
mod config;
mod engine;
mod error;
mod manager;
mod model;
mod stats;

use crate::manager::Manager;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Simulate molting times of worm groups raised at four food concentrations,
/// count them at regular sample points and compare neighbouring groups.
#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// Directory holding `config.toml`, the run directories and `analysis.toml`.
    #[arg(long)]
    sim_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Simulate one run and save its densities and comparisons.
    Create {
        /// Seed of the random number generator (drawn from the OS if omitted).
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Summarize power and density peaks over all saved runs.
    Analyze,

    /// Remove all runs and the analysis file.
    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.sim_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Create { seed } => mgr.create_run(seed)?,
        Command::Analyze => mgr.analyze_sim()?,
        Command::Clean => mgr.clean_sim()?,
    }

    Ok(())
}
