//! CLI argument parsing using clap.
//!
//! Defines the command-line interface for cosmic-cli.

use clap::Parser;
use std::path::PathBuf;

/// Cosmic Oracle CLI - Share insights and find resonance on the emotional grid
#[derive(Parser, Debug, Clone)]
#[command(name = "cosmic-cli")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Submit a single insight and exit
    #[arg(short = 'e', long, conflicts_with = "file")]
    pub execute: Option<String>,

    /// Submit insights from a file (one per line) and exit
    #[arg(short = 'f', long, conflicts_with = "execute")]
    pub file: Option<PathBuf>,

    /// Mark submitted insights as private
    #[arg(long)]
    pub private: bool,

    /// Override oracle provider from settings
    ///
    /// Options: gemini, offline
    #[arg(short = 'p', long)]
    pub provider: Option<String>,

    /// Override Gemini model from settings
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// API key (overrides settings and env vars)
    #[arg(long, env = "COSMIC_ORACLE_API_KEY")]
    pub api_key: Option<String>,

    /// Override the mock population size
    #[arg(long)]
    pub population: Option<usize>,

    /// Seed for a reproducible mock population
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output events as JSON lines (for scripting/parsing)
    #[arg(long)]
    pub json: bool,

    /// Only output the submission summary
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Show verbose output (debug information)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Wait for pending notifications to expire before exiting
    #[arg(long)]
    pub linger: bool,
}

impl Args {
    /// Whether submitted insights are public.
    pub fn is_public(&self) -> bool {
        !self.private
    }
}
