//! Error types for MIME tree operations.

use std::io;

/// Result type alias for MIME tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME tree error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The operation would give a part both a body and a container, a
    /// second body, or a second container.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A header value cannot be used as written.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Nothing has been added to the builder yet.
    #[error("No data: the MIME tree is empty")]
    NoData,

    /// Allocation, entropy, or I/O failure reported by the environment.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(#[from] io::Error),

    /// The part tree breaks its own structure, such as siblings with no
    /// enclosing container. Trees built by `MimeMaker` never do.
    #[error("Inconsistent tree: {0}")]
    Inconsistent(String),
}

/// Coarse category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`Error::Conflict`].
    Conflict,
    /// See [`Error::InvalidValue`].
    InvalidValue,
    /// See [`Error::NoData`].
    NoData,
    /// See [`Error::ResourceExhausted`].
    ResourceExhausted,
    /// See [`Error::Inconsistent`].
    Inconsistent,
}

impl Error {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::InvalidValue(_) => ErrorKind::InvalidValue,
            Self::NoData => ErrorKind::NoData,
            Self::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            Self::Inconsistent(_) => ErrorKind::Inconsistent,
        }
    }

    pub(crate) fn conflict(reason: &str) -> Self {
        Self::Conflict(reason.to_string())
    }

    pub(crate) fn out_of_memory(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::ResourceExhausted(io::Error::new(io::ErrorKind::OutOfMemory, err))
    }
}
