// Runtime abstraction for front ends (CLI today).
//
// The pipeline and the notification manager only ever talk to `dyn GridRuntime`,
// so a front end decides how events are rendered.

use async_trait::async_trait;
use thiserror::Error;

use crate::events::GridEvent;

/// Runtime-specific errors
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Event receiver closed")]
    ReceiverClosed,
}

/// Runtime abstraction for CLI vs other environments
///
/// # Object Safety
/// This trait is object-safe and intended to be used as `Arc<dyn GridRuntime>`.
#[async_trait]
pub trait GridRuntime: Send + Sync + 'static {
    /// Emit an event to the front end
    ///
    /// # Errors
    /// Returns `RuntimeError::ReceiverClosed` if nobody is listening any more.
    fn emit(&self, event: GridEvent) -> Result<(), RuntimeError>;

    /// Check if running in interactive mode (has UI or TTY)
    fn is_interactive(&self) -> bool;

    /// Graceful shutdown - flush events, close channels, etc.
    async fn shutdown(&self) -> Result<(), RuntimeError>;
}

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "cli")]
pub use cli::CliRuntime;

/// Runtime that keeps every emitted event in memory.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingRuntime {
    events: parking_lot::Mutex<Vec<GridEvent>>,
}

#[cfg(test)]
impl RecordingRuntime {
    pub fn events(&self) -> Vec<GridEvent> {
        self.events.lock().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl GridRuntime for RecordingRuntime {
    fn emit(&self, event: GridEvent) -> Result<(), RuntimeError> {
        self.events.lock().push(event);
        Ok(())
    }

    fn is_interactive(&self) -> bool {
        false
    }

    async fn shutdown(&self) -> Result<(), RuntimeError> {
        Ok(())
    }
}
