//! Error types for content model values.

/// Error raised while converting an externally supplied type into a [`Value`].
///
/// [`Value`]: crate::Value
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// The type could not be represented as JSON.
    #[error("value is not representable: {0}")]
    Unrepresentable(#[from] serde_json::Error),
}

/// Result type for value conversions.
pub type ValueResult<T> = Result<T, ValueError>;
