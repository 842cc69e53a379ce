//! Error types for scanning, lookup, and packing.
//!
//! Lookup and scan errors are returned to the immediate caller. Pack
//! failures are the one class that the embedder absorbs per file: they are
//! logged, collected into the embed report, and the file entry is omitted.
//!
//! # Examples
//!
//! ```
//! use embedfs::EmbedError;
//!
//! let error = EmbedError::NotFound {
//!     path: "docs/missing.md".to_string(),
//! };
//!
//! assert!(error.is_not_found());
//! assert!(!error.is_scan_failure());
//! ```

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building, reading, or embedding a tree.
#[derive(Error, Debug)]
pub enum EmbedError {
    /// A logical path has no corresponding directory or file.
    #[error("File/Directory path is not found: {path}")]
    NotFound {
        /// The logical path that was looked up
        path: String,
    },

    /// A directory could not be listed during a scan.
    ///
    /// Fatal to the enclosing build: no partial tree is returned.
    #[error("Failed to scan directory {}: {source}", path.display())]
    ScanFailure {
        /// The physical directory that could not be listed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A data pack could not produce the bytes of a file.
    #[error("Failed to read file {path}: {source}")]
    ReadFailure {
        /// Logical path of the file being read
        path: String,
        /// Underlying disk or decompression error
        #[source]
        source: io::Error,
    },

    /// A file could not be opened or compressed while producing an artifact.
    #[error("Failed to pack {}: {source}", path.display())]
    PackFailure {
        /// Physical path of the source file
        path: PathBuf,
        /// Underlying I/O or compression error
        #[source]
        source: io::Error,
    },

    /// Configuration value is missing or out of range.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem
        reason: String,
    },

    /// An artifact could not be encoded or decoded.
    #[error("Invalid artifact: {reason}")]
    Artifact {
        /// Description of the problem
        reason: String,
    },

    /// Any other I/O error (e.g. reading a config file).
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl EmbedError {
    /// Returns `true` if this is a not-found error.
    ///
    /// # Examples
    ///
    /// ```
    /// use embedfs::EmbedError;
    ///
    /// let error = EmbedError::NotFound { path: "a/b".to_string() };
    /// assert!(error.is_not_found());
    /// ```
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if a directory listing failed during a scan.
    #[must_use]
    pub const fn is_scan_failure(&self) -> bool {
        matches!(self, Self::ScanFailure { .. })
    }

    /// Returns `true` if a data pack failed to produce bytes.
    #[must_use]
    pub const fn is_read_failure(&self) -> bool {
        matches!(self, Self::ReadFailure { .. })
    }

    /// Returns `true` if a file could not be packed into an artifact.
    #[must_use]
    pub const fn is_pack_failure(&self) -> bool {
        matches!(self, Self::PackFailure { .. })
    }

    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }
}

/// Type alias for embedfs results.
pub type Result<T> = std::result::Result<T, EmbedError>;
