//! Command-line interface for DuelSim
//!
//! Supports both graphical (default) and headless modes.

use clap::Parser;
use std::path::PathBuf;

/// Two-fighter bouncing-arena duel simulator
#[derive(Parser, Debug)]
#[command(name = "duelsim")]
#[command(about = "Two-fighter bouncing-arena duel simulator")]
#[command(version)]
pub struct Args {
    /// Run in headless mode with the specified JSON config file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub headless: Option<PathBuf>,

    /// Output path for the round result JSON (headless mode only)
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum round duration in seconds (headless mode only)
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Random seed for deterministic simulation
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
