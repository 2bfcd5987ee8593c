//! Error type definitions for the address manager.

use thiserror::Error;

/// Errors raised by [`crate::AddrMan`].
///
/// Routine rejections, like `add` returning `false`, `mark_*` on an unknown
/// address, or a duplicate `ban`, are not modeled as errors. They encode
/// policy decisions and are reported through plain `bool`/`Option` returns.
#[derive(Debug, Error)]
pub enum AddrManError {
    /// A caller violated a documented precondition (programming error).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The persistence file could not be read or written.
    #[error("file error at {path}: {source}")]
    FileError {
        /// Path that was being read or written.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The persistence file failed validation: version/magic mismatch,
    /// truncation, bucket overflow, a dangling key, or trailing bytes.
    #[error("failed to decode address manager dump: {0}")]
    DecodeError(String),
}

/// Result type for the address manager's public API.
pub type AddrManResult<T> = Result<T, AddrManError>;
