//! Emotional grid client: insight submission and resonance connections.
//!
//! A user submits free text; an [`oracle::Oracle`] classifies it, the result is
//! merged into the shared [`store::GridStore`], resonance with other actors'
//! latest insights is discovered, and a transient notification is raised for
//! the strongest match.

pub mod candidates;
#[cfg(feature = "cli")]
pub mod cli;
pub mod error;
pub mod events;
pub mod geolocation;
pub mod model;
pub mod notifications;
pub mod oracle;
pub mod pipeline;
pub mod population;
pub mod runtime;
pub mod settings;
pub mod state;
pub mod store;


pub use error::PipelineError;
pub use pipeline::{ConcurrencyPolicy, SnapshotPolicy, SubmissionPipeline, SubmitOutcome};
pub use state::AppState;
pub use store::GridStore;
