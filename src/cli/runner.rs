//! CLI execution runner.
//!
//! Drives submissions through the pipeline.

use std::path::Path;

use anyhow::{Context, Result};

use crate::pipeline::SubmitOutcome;

use super::bootstrap::CliContext;

/// Submit a single insight and wait for the pipeline to settle.
///
/// Output is rendered by the background event loop. A classification failure is
/// not an error here; the `submission_failed` event already reports it.
pub async fn execute_once(ctx: &mut CliContext, text: &str) -> Result<SubmitOutcome> {
    let outcome = ctx.state.pipeline.submit(text, ctx.args.is_public()).await;

    if outcome == SubmitOutcome::Rejected {
        anyhow::bail!("Another submission is still in flight");
    }
    Ok(outcome)
}

/// Running totals for a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct BatchTally {
    recorded: usize,
    skipped: usize,
    connections: usize,
}

impl BatchTally {
    fn record(&mut self, outcome: &SubmitOutcome) {
        match outcome.report() {
            Some(report) => {
                self.recorded += 1;
                self.connections += report.connections.len();
            }
            None => self.skipped += 1,
        }
    }
}

/// Submit insights from a file, one per line.
///
/// Each non-empty, non-comment line is submitted sequentially.
/// Lines starting with `#` are treated as comments.
/// Lines the oracle cannot classify are skipped and counted.
pub async fn execute_batch(ctx: &mut CliContext, file_path: &Path) -> Result<()> {
    let content = tokio::fs::read_to_string(file_path)
        .await
        .with_context(|| format!("Failed to read insight file: {}", file_path.display()))?;

    let lines = submission_lines(&content);
    if lines.is_empty() {
        anyhow::bail!("No insights found in file: {}", file_path.display());
    }

    let total = lines.len();
    if !ctx.args.quiet {
        eprintln!(
            "[batch] Submitting {} insight(s) from {}",
            total,
            file_path.display()
        );
    }

    let mut tally = BatchTally::default();
    for (i, text) in lines.iter().enumerate() {
        if !ctx.args.quiet {
            eprintln!("\n[batch] [{}/{}] Submitting: {}", i + 1, total, truncate(text, 50));
        }

        let outcome = execute_once(ctx, text).await?;
        tally.record(&outcome);

        if !ctx.args.quiet {
            let status = if outcome.report().is_some() { "Complete" } else { "Skipped" };
            eprintln!("[batch] [{}/{}] {}", i + 1, total, status);
        }
    }

    if !ctx.args.quiet {
        eprintln!(
            "\n[batch] {} of {} insight(s) recorded, {} skipped, {} connection(s) found",
            tally.recorded, total, tally.skipped, tally.connections
        );
    }

    Ok(())
}

fn submission_lines(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

/// Truncate a string for display
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
