//! Embed run configuration.
//!
//! Loaded from TOML; every field has a default, so an empty file is valid.
//!
//! # Examples
//!
//! ```toml
//! input_dir = "./assets"
//! output = "assets.json"
//! name = "assets"
//! gzip = true
//! production = true
//! mount = "static"
//! skip = ["node_modules", ".DS_Store"]
//! extensions = ["html", "css", "js"]
//! max_workers = 8
//! ```

use crate::error::{EmbedError, Result};
use crate::pack::PackMode;
use crate::policy::PathPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for one embed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    /// Directory to scan
    pub input_dir: PathBuf,
    /// Artifact output path
    pub output: PathBuf,
    /// Name recorded in the artifact
    pub name: String,
    /// Gzip payloads
    pub gzip: bool,
    /// Production build (gzip unless `no_decompression` opts out)
    pub production: bool,
    /// Serve gzip payloads without inflating them
    pub no_decompression: bool,
    /// Embed no payloads; read files from disk at runtime
    pub linked: bool,
    /// Logical prefix for every path
    pub mount: Option<String>,
    /// Path substrings to skip
    pub skip: Vec<String>,
    /// File extensions to include; empty includes all
    pub extensions: Vec<String>,
    /// Concurrency cap for the scan
    pub max_workers: Option<usize>,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output: PathBuf::from("embedfs.json"),
            name: "assets".to_string(),
            gzip: false,
            production: false,
            no_decompression: false,
            linked: false,
            mount: None,
            skip: Vec::new(),
            extensions: Vec::new(),
            max_workers: None,
        }
    }
}

impl EmbedConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::InvalidConfig`] if the document is malformed
    /// or fails [`validate`](Self::validate).
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| EmbedError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::Io`] if the file cannot be read and
    /// [`EmbedError::InvalidConfig`] if it is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!("Loaded config from {}", path.as_ref().display());
        Self::from_toml_str(&text)
    }

    /// Checks option combinations.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::InvalidConfig`] if `max_workers` is zero,
    /// `no_decompression` is set without compression, or `linked` is
    /// combined with compression.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(EmbedError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        if self.max_workers == Some(0) {
            return invalid("max_workers must be at least 1");
        }
        if self.no_decompression && !self.compresses() {
            return invalid("no_decompression requires gzip or production");
        }
        if self.linked && self.compresses() {
            return invalid("linked cannot be combined with gzip or production");
        }
        Ok(())
    }

    const fn compresses(&self) -> bool {
        self.gzip || self.production
    }

    /// Pack mode implied by the flags.
    #[must_use]
    pub const fn pack_mode(&self) -> PackMode {
        if self.linked {
            PackMode::Linked
        } else if !self.compresses() {
            PackMode::Development
        } else if self.no_decompression {
            PackMode::ProductionNoDecompress
        } else {
            PackMode::Production
        }
    }

    /// Scan policy implied by `skip`, `extensions` and `mount`.
    ///
    /// Version control directories are always skipped. The extension
    /// filter applies to files only.
    #[must_use]
    pub fn policy(&self) -> PathPolicy {
        let mut policy = PathPolicy::new()
            .skip_vcs()
            .skip_matching(self.skip.clone());

        if !self.extensions.is_empty() {
            let extensions: Vec<String> = self
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect();
            policy = policy.and_validator(move |relative, meta| {
                meta.is_dir()
                    || Path::new(relative)
                        .extension()
                        .is_some_and(|ext| extensions.iter().any(|allowed| ext == allowed.as_str()))
            });
        }

        if let Some(mount) = &self.mount {
            policy = policy.with_mount(mount.clone());
        }
        policy
    }
}
