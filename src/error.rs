//! Error types for HyperCopy
//!
//! The safe API reports bounds violations and worker failures as
//! [`CopyError`] values. The native entry point logs them instead, since
//! nothing can be returned across that boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for HyperCopy operations
#[derive(Error, Debug)]
pub enum CopyError {
    /// Source range does not fit in the source buffer
    #[error("Source range {index}..{index}+{len} exceeds buffer of {available} elements")]
    SourceOutOfBounds {
        /// First source element requested
        index: usize,
        /// Elements requested
        len: usize,
        /// Length of the source buffer
        available: usize,
    },

    /// Destination range does not fit in the destination buffer
    #[error("Destination range {index}..{index}+{len} exceeds buffer of {available} elements")]
    DestinationOutOfBounds {
        /// First destination element requested
        index: usize,
        /// Elements requested
        len: usize,
        /// Length of the destination buffer
        available: usize,
    },

    /// Start index plus length overflows the address space
    #[error("Range {index}+{len} overflows usize")]
    RangeOverflow {
        /// Start index
        index: usize,
        /// Elements requested
        len: usize,
    },

    /// Argument rejected at the native boundary
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Null buffer handle at the native boundary
    #[error("Null {0} pointer")]
    NullPointer(&'static str),

    /// A worker panicked before finishing its write phase
    #[error("Worker {worker} panicked during its write phase")]
    WorkerPanicked {
        /// Index of the failed worker
        worker: usize,
    },

    /// Thread pool error
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    /// Destination digest differs from the source digest after the copy
    #[error("Integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch {
        /// Source digest
        expected: String,
        /// Destination digest
        actual: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error while loading configuration
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl CopyError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create an integrity mismatch error
    pub fn integrity_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::IntegrityMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Check if the caller broke the copy contract (bad indices, lengths or handles)
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::SourceOutOfBounds { .. }
                | Self::DestinationOutOfBounds { .. }
                | Self::RangeOverflow { .. }
                | Self::InvalidArgument(_)
                | Self::NullPointer(_)
        )
    }
}

/// Result type alias for HyperCopy operations
pub type Result<T> = std::result::Result<T, CopyError>;

impl From<serde_json::Error> for CopyError {
    fn from(err: serde_json::Error) -> Self {
        CopyError::ConfigError(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| CopyError::io(path, e))
    }
}
