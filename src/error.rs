use thiserror::Error;

use crate::oracle::OracleError;

/// Failures inside one submission. Both are recovered at the pipeline boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Classification failed: {0}")]
    Classification(#[source] OracleError),

    #[error("Discovery failed: {0}")]
    Discovery(#[source] OracleError),
}

impl PipelineError {
    /// Pipeline stage name used in events and logs.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Classification(_) => "classification",
            PipelineError::Discovery(_) => "discovery",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
