//! Flat relative path → file index over a directory.
//!
//! An [`AssetMap`] is the lightweight alternative to a full scan: it walks
//! a directory once, records every matching file by its slash-separated
//! relative path, and loads contents on request. [`AssetMap::reload`] picks
//! up files added since the last walk.

use crate::error::{EmbedError, Result};
use crate::path;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Which files an [`AssetMap`] admits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetFilter {
    /// Allowed extensions, with or without the leading dot; empty admits all
    pub extensions: Vec<String>,
    /// Relative paths containing any of these substrings are skipped
    pub skip: Vec<String>,
}

impl AssetFilter {
    /// Admit-all filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the map to the given extensions.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Skips relative paths containing any of the given substrings.
    #[must_use]
    pub fn with_skip<I, S>(mut self, skip: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip = skip.into_iter().map(Into::into).collect();
        self
    }

    /// Returns `true` if a relative file path passes the filter.
    #[must_use]
    pub fn admits(&self, relative: &str) -> bool {
        if self.skip.iter().any(|pattern| relative.contains(pattern.as_str())) {
            return false;
        }
        if self.extensions.is_empty() {
            return true;
        }
        let Some(ext) = Path::new(relative).extension() else {
            return false;
        };
        let ext = ext.to_string_lossy();
        self.extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.') == ext)
    }
}

/// Relative path → absolute file path index.
///
/// # Examples
///
/// ```no_run
/// use embedfs::{AssetFilter, AssetMap};
///
/// let mut assets = AssetMap::scan("./templates", AssetFilter::new().with_extensions(["html"])).unwrap();
/// let page = assets.load("pages/index.html").unwrap();
///
/// // pick up templates added since
/// let added = assets.reload().unwrap();
/// println!("{} templates ({added} new)", assets.len());
/// # let _ = page;
/// ```
#[derive(Debug, Clone)]
pub struct AssetMap {
    root: PathBuf,
    filter: AssetFilter,
    entries: BTreeMap<String, PathBuf>,
}

impl AssetMap {
    /// Walks `root` and records every admitted file.
    ///
    /// A regular file as `root` yields a single entry keyed by its name.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::NotFound`] if `root` does not exist, and
    /// [`EmbedError::ScanFailure`] if it cannot be walked.
    pub fn scan(root: impl AsRef<Path>, filter: AssetFilter) -> Result<Self> {
        let root = std::path::absolute(root.as_ref()).map_err(|source| EmbedError::ScanFailure {
            path: root.as_ref().to_path_buf(),
            source,
        })?;
        if !root.exists() {
            return Err(EmbedError::not_found(root.display().to_string()));
        }

        let mut map = Self {
            root,
            filter,
            entries: BTreeMap::new(),
        };
        map.reload()?;
        Ok(map)
    }

    /// Walks the root again and adds files not already known.
    ///
    /// Existing entries are kept even if their file was removed.
    /// Returns the number of entries added.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::ScanFailure`] if the root cannot be walked.
    pub fn reload(&mut self) -> Result<usize> {
        if self.root.is_file() {
            let key = self
                .root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            if self.filter.admits(&key) && !self.entries.contains_key(&key) {
                self.entries.insert(key, self.root.clone());
                return Ok(1);
            }
            return Ok(0);
        }

        let mut added = 0;
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_vcs_dir(entry));

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map_or_else(|| self.root.clone(), Path::to_path_buf);
                EmbedError::ScanFailure {
                    path,
                    source: e.into(),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let key = path::normalize(&path::to_slash(relative));
            if !self.filter.admits(&key) || self.entries.contains_key(&key) {
                continue;
            }

            tracing::debug!("Asset added: {}", key);
            self.entries.insert(key, entry.into_path());
            added += 1;
        }

        Ok(added)
    }

    /// Root directory of the map.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns `true` if the relative path is indexed.
    #[must_use]
    pub fn has(&self, relative: &str) -> bool {
        self.entries.contains_key(&path::normalize(relative))
    }

    /// Absolute path of an indexed file.
    #[must_use]
    pub fn get(&self, relative: &str) -> Option<&Path> {
        self.entries.get(&path::normalize(relative)).map(PathBuf::as_path)
    }

    /// Reads an indexed file.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::NotFound`] if the path is not indexed and
    /// [`EmbedError::ReadFailure`] if the file cannot be read.
    pub fn load(&self, relative: &str) -> Result<Vec<u8>> {
        let key = path::normalize(relative);
        let file = self
            .entries
            .get(&key)
            .ok_or_else(|| EmbedError::not_found(key.as_str()))?;
        fs::read(file).map_err(|source| EmbedError::ReadFailure { path: key, source })
    }

    /// Number of indexed files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by relative path.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(key, file)| (key.as_str(), file.as_path()))
    }
}

fn is_vcs_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_type().is_dir() && entry.file_name() == ".git"
}
