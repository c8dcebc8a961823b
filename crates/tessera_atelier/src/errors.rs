//! Error types for context processing.

use std::error::Error;

/// Failure while reading a content node.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// A single property could not be converted.
    #[error("property `{name}` could not be read: {reason}")]
    Property { name: String, reason: String },

    /// The backing repository failed.
    #[error("repository access failed: {0}")]
    Repository(#[source] Box<dyn Error + Send + Sync>),
}

/// The one failure kind a context processor reports.
///
/// Carries the processor and resource it happened on plus the original cause.
#[derive(Debug, thiserror::Error)]
#[error("{processor} failed for `{path}`")]
pub struct ProcessError {
    pub processor: &'static str,
    pub path: String,
    #[source]
    pub source: ExtractError,
}

impl ProcessError {
    pub fn new(processor: &'static str, path: impl Into<String>, source: ExtractError) -> Self {
        Self {
            processor,
            path: path.into(),
            source,
        }
    }
}

/// Result type for context processing.
pub type ProcessResult<T> = Result<T, ProcessError>;
