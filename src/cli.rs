//! Command-line interface for the headless scenario runner.

use clap::Parser;
use std::path::PathBuf;

/// Deterministic headless runner for the core combat engine
#[derive(Parser, Debug)]
#[command(name = "strikecore")]
#[command(about = "Run a scripted combat scenario and print the resulting damage event log")]
#[command(version)]
pub struct Args {
    /// Path to the scenario JSON file (player, weapon, enemies, attack script)
    pub scenario: PathBuf,

    /// Optional weapon hit geometry JSON to load before running
    #[arg(long, value_name = "FILE")]
    pub weapon_geometry: Option<PathBuf>,

    /// Optional hitbox tuning JSON to load before running
    #[arg(long, value_name = "FILE")]
    pub hitbox_tuning: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

pub fn parse_args() -> Args {
    Args::parse()
}
