//! CLI bootstrap - Initialize the full grid stack for CLI usage.
//!
//! This module provides `CliContext`, which owns the application state, the
//! runtime and the background output loop for the lifetime of the process.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::events::GridEvent;
use crate::model::GeoPoint;
use crate::oracle::create_oracle;
use crate::runtime::{CliRuntime, GridRuntime};
use crate::settings::{GridSettings, SettingsManager};
use crate::state::AppState;

use super::args::Args;
use super::output::run_event_loop;

/// Context for CLI execution containing all initialized services.
pub struct CliContext {
    /// Store, pipeline and notifications
    pub state: AppState,

    /// Runtime abstraction for event emission
    pub runtime: Arc<dyn GridRuntime>,

    /// Settings manager
    pub settings_manager: Arc<SettingsManager>,

    /// Command-line arguments
    pub args: Args,

    /// Renders events until the runtime shuts down
    output: JoinHandle<Result<()>>,

    /// Background position resolution, if enabled
    geolocation: Option<JoinHandle<GeoPoint>>,
}

impl CliContext {
    /// Graceful shutdown - optionally let notifications expire, then drain output.
    pub async fn shutdown(self) -> Result<()> {
        if self.args.linger {
            let pending = self.state.notifications.pending();
            if pending > 0 && !self.args.quiet {
                eprintln!("[cli] Waiting for {} notification(s) to expire", pending);
            }
            self.state.notifications.wait_idle().await;
        }

        if let Some(task) = self.geolocation {
            task.abort();
        }

        // Dropping the sender lets the output loop finish
        if let Err(e) = self.runtime.shutdown().await {
            tracing::warn!("Runtime shutdown error: {}", e);
        }

        match self.output.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Output handler error: {}", e),
            Err(e) => tracing::warn!("Output handler panicked: {}", e),
        }

        Ok(())
    }
}

/// Apply command-line overrides on top of loaded settings.
fn apply_overrides(settings: &mut GridSettings, args: &Args) {
    if let Some(ref provider) = args.provider {
        settings.oracle.provider = provider.clone();
    }
    if let Some(ref model) = args.model {
        settings.oracle.gemini.model = model.clone();
    }
    if let Some(size) = args.population {
        settings.population.size = size;
    }
    if args.seed.is_some() {
        settings.population.seed = args.seed;
    }
}

/// Initialize the CLI context with all services.
///
/// Order: settings, logging, runtime, oracle, store and population, geolocation.
pub async fn initialize(args: &Args) -> Result<CliContext> {
    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        // Only warn on errors other than file not found
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("[cli] Failed to load .env file: {}", e);
        }
    }

    // Load settings
    let settings_manager = Arc::new(
        SettingsManager::new()
            .await
            .context("Failed to initialize settings manager")?,
    );

    let mut settings = settings_manager.get().await;
    apply_overrides(&mut settings, args);

    // Initialize logging based on verbosity
    let log_level = if args.verbose {
        "debug"
    } else {
        settings.advanced.log_level.as_str()
    };
    let directive: tracing_subscriber::filter::Directive = format!("cosmic_oracle={}", log_level)
        .parse()
        .with_context(|| format!("Invalid log level '{}'", log_level))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .try_init();

    // Ensure settings file exists (creates template on first run)
    match settings_manager.ensure_settings_file().await {
        Ok(true) if args.verbose => {
            eprintln!("[cli] Wrote settings template to {}", settings_manager.path().display());
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("Failed to create settings template: {}", e),
    }

    if args.verbose {
        eprintln!("[cli] Settings loaded from {}", settings_manager.path().display());
        eprintln!("[cli] Oracle provider: {}", settings.oracle.provider);
        eprintln!("[cli] Submission policy: {:?}", settings.submission);
    }

    // Create event channel and CLI runtime
    let (event_tx, event_rx) = mpsc::unbounded_channel::<GridEvent>();
    let runtime: Arc<dyn GridRuntime> = Arc::new(CliRuntime::new(event_tx));

    let json_mode = args.json;
    let quiet_mode = args.quiet;
    let output = tokio::spawn(async move { run_event_loop(event_rx, json_mode, quiet_mode).await });

    let oracle = create_oracle(&settings.oracle, args.api_key.as_deref());
    if args.verbose {
        eprintln!("[cli] Oracle: {}", oracle.description());
    }

    let state = AppState::new(&settings, oracle, runtime.clone());
    let actors = state.seed_population(&settings.population);
    if args.verbose {
        eprintln!("[cli] Seeded {} actors", actors);
    }

    let geolocation = state.start_geolocation(&settings.geolocation);

    Ok(CliContext {
        state,
        runtime,
        settings_manager,
        args: args.clone(),
        output,
        geolocation,
    })
}
