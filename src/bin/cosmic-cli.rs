//! Cosmic Oracle CLI - Headless client for the emotional grid
//!
//! # Usage
//!
//! ```bash
//! # Submit a single insight
//! ./target/debug/cosmic-cli -e "Tonight the city feels endless and quiet"
//!
//! # Offline oracle, small reproducible population
//! ./target/debug/cosmic-cli -p offline --population 50 --seed 7 -e "I miss home"
//!
//! # JSON output for scripting
//! ./target/debug/cosmic-cli -e "Hello universe" --json | jq .
//!
//! # Batch file, waiting for notifications to expire
//! ./target/debug/cosmic-cli -f insights.txt --linger
//!
//! # Interactive REPL mode (when no -e or -f provided)
//! ./target/debug/cosmic-cli
//! ```

use anyhow::Result;
use clap::Parser;

use cosmic_oracle::cli::{execute_batch, execute_once, initialize, run_repl, Args};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut ctx = initialize(&args).await?;

    // Execute based on mode
    let result = if let Some(ref text) = args.execute {
        execute_once(&mut ctx, text).await.map(|_| ())
    } else if let Some(ref file) = args.file {
        execute_batch(&mut ctx, file).await
    } else {
        run_repl(&mut ctx).await
    };

    // Graceful shutdown
    ctx.shutdown().await?;

    result
}
