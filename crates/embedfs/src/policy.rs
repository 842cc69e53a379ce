//! Path admission and rewriting rules applied during a scan.
//!
//! A [`PathPolicy`] pairs a validator (admit or reject an entry) with a mux
//! (rewrite an entry's relative path into its logical path). Both receive
//! the slash-separated path relative to the scan root and the entry's
//! metadata. The default policy admits everything and rewrites nothing.
//!
//! # Examples
//!
//! ```
//! use embedfs::PathPolicy;
//!
//! let policy = PathPolicy::new()
//!     .skip_vcs()
//!     .with_mount("static");
//!
//! let meta = std::fs::metadata(".").unwrap();
//! assert!(!policy.admit(".git/config", &meta));
//! assert_eq!(policy.rewrite("css/site.css", &meta), "static/css/site.css");
//! ```

use crate::path;
use std::fmt;
use std::fs::Metadata;
use std::sync::Arc;

/// Decides whether a path is admitted into the tree.
pub type Validator = Arc<dyn Fn(&str, &Metadata) -> bool + Send + Sync>;

/// Rewrites a relative path into the logical path used for lookups.
pub type Mux = Arc<dyn Fn(&str, &Metadata) -> String + Send + Sync>;

/// Validator + mux pair applied to every scanned entry.
#[derive(Clone)]
pub struct PathPolicy {
    validator: Validator,
    mux: Mux,
}

impl PathPolicy {
    /// Creates the admit-all, identity-rewrite policy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: Arc::new(|_, _| true),
            mux: Arc::new(|relative, _| relative.to_string()),
        }
    }

    /// Replaces the validator.
    #[must_use]
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str, &Metadata) -> bool + Send + Sync + 'static,
    {
        self.validator = Arc::new(validator);
        self
    }

    /// Adds a validator that must also admit the path.
    #[must_use]
    pub fn and_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str, &Metadata) -> bool + Send + Sync + 'static,
    {
        let previous = Arc::clone(&self.validator);
        self.validator = Arc::new(move |p, m| previous(p, m) && validator(p, m));
        self
    }

    /// Replaces the mux.
    ///
    /// A directory is registered under its rewritten path. A file keeps only
    /// the base name of its rewritten path and stays in the directory where
    /// it was found, so a mux cannot move a file between directories.
    #[must_use]
    pub fn with_mux<F>(mut self, mux: F) -> Self
    where
        F: Fn(&str, &Metadata) -> String + Send + Sync + 'static,
    {
        self.mux = Arc::new(mux);
        self
    }

    /// Rejects any path that has a `.git` segment.
    #[must_use]
    pub fn skip_vcs(self) -> Self {
        self.and_validator(|p, _| !p.split('/').any(|segment| segment == ".git"))
    }

    /// Rejects any path containing one of the given substrings.
    #[must_use]
    pub fn skip_matching(self, patterns: Vec<String>) -> Self {
        if patterns.is_empty() {
            return self;
        }
        self.and_validator(move |p, _| !patterns.iter().any(|pattern| p.contains(pattern.as_str())))
    }

    /// Prefixes every logical path produced by the current mux with `prefix`.
    #[must_use]
    pub fn with_mount(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let previous = Arc::clone(&self.mux);
        self.mux = Arc::new(move |p, m| path::join(&prefix, &previous(p, m)));
        self
    }

    /// Runs the validator.
    #[must_use]
    pub fn admit(&self, relative: &str, metadata: &Metadata) -> bool {
        (self.validator)(relative, metadata)
    }

    /// Runs the mux and normalizes its output.
    #[must_use]
    pub fn rewrite(&self, relative: &str, metadata: &Metadata) -> String {
        path::normalize(&(self.mux)(relative, metadata))
    }
}

impl Default for PathPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PathPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPolicy").finish_non_exhaustive()
    }
}
