//! Errors surfaced by [`crate::FilterPipeline::run`].

use thiserror::Error;

/// A pipeline run failed; `filter` names the stage responsible.
///
/// Validation errors are reported before any stage has touched the
/// vacancies. Apply errors abort the run at the failing stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{filter}: invalid configuration: {source:#}")]
    Validation {
        filter: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{filter}: {source:#}")]
    Apply {
        filter: String,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    pub fn filter(&self) -> &str {
        match self {
            PipelineError::Validation { filter, .. } | PipelineError::Apply { filter, .. } => {
                filter
            }
        }
    }
}
