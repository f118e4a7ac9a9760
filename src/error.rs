use thiserror::Error;

/// Invalid sampler configuration or weight data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("sample size must be at least 1")]
    ZeroSampleSize,
    #[error("weight for category '{category}' must be > 0 (got {weight})")]
    NonPositiveWeight { category: String, weight: f64 },
    #[error("weight for category '{category}' must be finite (got {weight})")]
    NonFiniteWeight { category: String, weight: f64 },
    #[error("a weight table was supplied without a category key function")]
    MissingKeyFunction,
}

/// Failure of a sampling pass.
///
/// Errors raised by the source (or by a filter predicate) are carried as-is in
/// `Source`; nothing is retried or suppressed.
#[derive(Debug, Error)]
pub enum SampleError<E> {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("record source failed: {0}")]
    Source(E),
}

impl<E> SampleError<E> {
    /// The source error, if this failure came from the source.
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::Source(e) => Some(e),
            Self::Config(_) => None,
        }
    }
}
