use std::time::Duration;

use thiserror::Error;

use crate::source::SourceError;

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Failure of an analytics operation.
///
/// Only data-source problems surface here; bad inputs and degenerate data are
/// resolved to defaults inside the computations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("data source failed during {operation}: {source}")]
    Source {
        operation: &'static str,
        #[source]
        source: SourceError,
    },

    #[error("{operation} cancelled by caller")]
    Cancelled { operation: &'static str },

    #[error("{operation} timed out after {after:?}")]
    TimedOut {
        operation: &'static str,
        after: Duration,
    },
}

impl AnalyticsError {
    pub fn operation(&self) -> &'static str {
        match self {
            AnalyticsError::Source { operation, .. }
            | AnalyticsError::Cancelled { operation }
            | AnalyticsError::TimedOut { operation, .. } => operation,
        }
    }
}
