/// Crate-wide result type for run preparation.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a run before any (account, channel) pair is touched.
///
/// Per-pair failures never surface here; they are recorded in
/// [`JoinResult`](crate::JoinResult) and the logs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// More accounts were requested than the directory holds.
    #[error("sample size {requested} exceeds the {available} available accounts")]
    SampleTooLarge { requested: usize, available: usize },

    /// An account or channel source could not be loaded.
    #[error(transparent)]
    Source(#[from] muster_directory::Error),
}

impl Error {
    #[must_use]
    pub fn sample_too_large(requested: usize, available: usize) -> Self {
        Self::SampleTooLarge {
            requested,
            available,
        }
    }
}
