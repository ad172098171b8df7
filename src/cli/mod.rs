//! CLI module for headless operation of the emotional grid.
//!
//! # Architecture
//!
//! The pipeline and the notification manager emit events through the
//! `GridRuntime` abstraction. In the CLI, `CliRuntime` forwards them over a
//! channel that a single long-lived output task consumes.
//!
//! ```text
//! +--------------------+     +-------------+     +---------------+
//! | SubmissionPipeline | --> | CliRuntime  | --> | output.rs     |
//! | NotificationCenter |     | (emit())    |     | (print/JSON)  |
//! +--------------------+     +-------------+     +---------------+
//! ```
//!
//! # REPL Mode
//!
//! When no insight is provided via `-e` or `-f`, the CLI enters
//! interactive REPL mode. See `repl.rs` for details.

mod args;
mod bootstrap;
mod output;
mod repl;
mod runner;

pub use args::Args;
pub use bootstrap::{initialize, CliContext};
pub use output::run_event_loop;
pub use repl::run_repl;
pub use runner::{execute_batch, execute_once};
