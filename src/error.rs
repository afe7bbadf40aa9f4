//! Error types for heartmula-rs.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
///
/// No variant is caught or recovered inside the crate — every failure is
/// terminal for its request and surfaces to the caller unmodified.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Model location unreadable, malformed, or incompatible with the
    /// requested version.
    #[error("resource load: {0}")]
    ResourceLoad(String),

    /// The pipeline failed while rendering audio.
    #[error("generation: {0}")]
    Generation(String),

    /// The output directory or file cannot be hosted on storage.
    #[error("storage: {0}")]
    Storage(String),
}
