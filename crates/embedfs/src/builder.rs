//! Concurrent directory scan.
//!
//! [`TreeBuilder::build`] walks a physical directory and produces a
//! [`ScanTree`]. Every directory listing runs as its own task on a bounded
//! rayon pool; the build returns only after all tasks have finished.
//!
//! # Uniqueness
//!
//! Each logical path gets exactly one [`DirNode`], no matter how many
//! physical directories the mux maps onto it or how many tasks discover
//! it at once. Registration goes through
//! [`DirRegistry::register_child`](crate::registry::DirRegistry::register_child),
//! which checks, inserts, and links under one lock. A task that finds the
//! node already registered still lists its own physical directory into it.
//!
//! # Failure
//!
//! The first directory that cannot be listed aborts the build: remaining
//! tasks stop early and [`EmbedError::ScanFailure`] is returned. No partial
//! tree escapes.
//!
//! # Examples
//!
//! ```no_run
//! use embedfs::{PathPolicy, TreeBuilder};
//!
//! let tree = TreeBuilder::new(PathPolicy::new().skip_vcs())
//!     .with_max_workers(4)
//!     .build("./assets")
//!     .unwrap();
//!
//! println!("{} directories, {} files", tree.dir_count(), tree.file_count());
//! ```

use crate::error::{EmbedError, Result};
use crate::lock;
use crate::path;
use crate::policy::PathPolicy;
use crate::registry::SharedRegistry;
use crate::tree::{DirNode, ScanStats, ScanTree};
use rayon::Scope;
use std::fs::{self, DirEntry, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Builds [`ScanTree`]s from physical directories.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    policy: PathPolicy,
    registry: Arc<SharedRegistry>,
    max_workers: Option<usize>,
}

impl TreeBuilder {
    /// Creates a builder with a fresh registry.
    #[must_use]
    pub fn new(policy: PathPolicy) -> Self {
        Self {
            policy,
            registry: Arc::new(SharedRegistry::new()),
            max_workers: None,
        }
    }

    /// Shares an existing registry, so several builds merge into one index.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<SharedRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Caps the number of concurrent listing tasks.
    ///
    /// Defaults to the available parallelism.
    #[must_use]
    pub const fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers);
        self
    }

    /// Registry this builder writes into.
    #[must_use]
    pub const fn registry(&self) -> &Arc<SharedRegistry> {
        &self.registry
    }

    /// Policy applied to every entry.
    #[must_use]
    pub const fn policy(&self) -> &PathPolicy {
        &self.policy
    }

    /// Clears the registry.
    pub fn flush(&self) {
        self.registry.flush();
    }

    fn workers(&self) -> usize {
        self.max_workers
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, usize::from))
            .max(1)
    }

    /// Scans `root` into a tree.
    ///
    /// When `root` is a regular file, the tree holds a root directory
    /// for its parent containing only that file. When the validator
    /// rejects the root itself, the tree is an empty root.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::NotFound`] if `root` does not exist, and
    /// [`EmbedError::ScanFailure`] if any directory cannot be listed.
    pub fn build(&self, root: impl AsRef<Path>) -> Result<ScanTree> {
        let root = root.as_ref();
        let meta = fs::metadata(root).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                EmbedError::not_found(root.display().to_string())
            } else {
                EmbedError::ScanFailure {
                    path: root.to_path_buf(),
                    source,
                }
            }
        })?;

        if meta.is_file() {
            return self.build_single_file(root, &meta);
        }

        let source = root.to_path_buf();
        let source_absolute = absolute(&source)?;

        if !self.policy.admit(path::ROOT, &meta) {
            tracing::debug!("Root rejected by validator: {}", source.display());
            let (node, _) = self.registry.dirs().register_root(path::ROOT, || {
                DirNode::new(path::ROOT, &source, path::ROOT, &source_absolute)
            });
            let stats = ScanStats::default();
            return Ok(ScanTree::new(node, Arc::clone(&self.registry), source, source_absolute, stats));
        }

        let logical = self.policy.rewrite(path::ROOT, &meta);
        let (node, _) = self.registry.dirs().register_root(&logical, || {
            DirNode::new(&logical, &source, path::ROOT, &source_absolute)
        });

        let state = ScanState {
            policy: &self.policy,
            registry: &self.registry,
            source_absolute: &source_absolute,
            abort: AtomicBool::new(false),
            failure: Mutex::new(None),
            directories: AtomicUsize::new(0),
            files: AtomicUsize::new(0),
        };

        let workers = self.workers();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("embedfs-scan-{i}"))
            .build()
            .map_err(|e| EmbedError::ScanFailure {
                path: source.clone(),
                source: io::Error::other(e),
            })?;

        tracing::debug!("Scanning {} with {} workers", source.display(), workers);
        pool.scope(|scope| {
            state.scan_dir(scope, Arc::clone(&node), source.clone(), path::ROOT.to_string());
        });

        if let Some(err) = lock::lock(&state.failure).take() {
            tracing::warn!("Scan of {} failed: {}", source.display(), err);
            return Err(err);
        }

        let stats = ScanStats {
            directories: state.directories.load(Ordering::Relaxed),
            files: state.files.load(Ordering::Relaxed),
        };
        tracing::info!(
            "Scanned {}: {} directories, {} files",
            source.display(),
            stats.directories,
            stats.files
        );

        Ok(ScanTree::new(node, Arc::clone(&self.registry), source, source_absolute, stats))
    }

    fn build_single_file(&self, file: &Path, meta: &Metadata) -> Result<ScanTree> {
        let source = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from(path::ROOT),
        };
        let source_absolute = absolute(&source)?;
        let relative = file
            .file_name()
            .map_or_else(|| path::to_slash(file), |name| name.to_string_lossy().into_owned());

        let source_meta = fs::metadata(&source).map_err(|e| EmbedError::ScanFailure {
            path: source.clone(),
            source: e,
        })?;
        let root_logical = self.policy.rewrite(path::ROOT, &source_meta);
        let (node, _) = self.registry.dirs().register_root(&root_logical, || {
            DirNode::new(&root_logical, &source, path::ROOT, &source_absolute)
        });

        let mut stats = ScanStats {
            directories: 1,
            files: 0,
        };
        if self.policy.admit(&relative, meta) {
            let logical = self.policy.rewrite(&relative, meta);
            register_file(&self.registry, &node, &logical, file);
            stats.files = 1;
        }

        tracing::debug!("Scanned single file: {}", file.display());
        Ok(ScanTree::new(node, Arc::clone(&self.registry), source, source_absolute, stats))
    }
}

/// Adds a file to `node` and keys the flat registry by the node's logical
/// path, so both indexes answer the same lookups.
fn register_file(registry: &SharedRegistry, node: &DirNode, logical: &str, real: &Path) {
    let name = path::base_name(logical);
    registry.files().add(path::join(node.logical_path(), &name), real);
    node.add_file(name, real);
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|source| EmbedError::ScanFailure {
        path: path.to_path_buf(),
        source,
    })
}

struct ScanState<'a> {
    policy: &'a PathPolicy,
    registry: &'a SharedRegistry,
    source_absolute: &'a Path,
    abort: AtomicBool,
    failure: Mutex<Option<EmbedError>>,
    directories: AtomicUsize,
    files: AtomicUsize,
}

impl<'a> ScanState<'a> {
    fn scan_dir<'scope>(
        &'scope self,
        scope: &Scope<'scope>,
        node: Arc<DirNode>,
        physical: PathBuf,
        relative: String,
    ) where
        'a: 'scope,
    {
        if self.abort.load(Ordering::Acquire) {
            return;
        }

        if let Err(err) = self.list(scope, &node, &physical, &relative) {
            self.fail(err);
        }
    }

    fn list<'scope>(
        &'scope self,
        scope: &Scope<'scope>,
        node: &DirNode,
        physical: &Path,
        relative: &str,
    ) -> Result<()>
    where
        'a: 'scope,
    {
        let scan_failure = |path: &Path| {
            let path = path.to_path_buf();
            move |source: io::Error| EmbedError::ScanFailure { path, source }
        };

        let mut entries = fs::read_dir(physical)
            .map_err(scan_failure(physical))?
            .collect::<io::Result<Vec<DirEntry>>>()
            .map_err(scan_failure(physical))?;
        entries.sort_by_key(DirEntry::file_name);
        self.directories.fetch_add(1, Ordering::Relaxed);

        for entry in entries {
            if self.abort.load(Ordering::Acquire) {
                return Ok(());
            }

            let entry_path = entry.path();
            // DirEntry::metadata does not traverse symlinks
            let meta = entry.metadata().map_err(scan_failure(&entry_path))?;
            let child_relative = path::join(relative, &entry.file_name().to_string_lossy());

            if !self.policy.admit(&child_relative, &meta) {
                continue;
            }
            let logical = self.policy.rewrite(&child_relative, &meta);

            if meta.is_dir() {
                let (child, created) = self.registry.dirs().register_child(node, &logical, || {
                    DirNode::new(
                        &logical,
                        &entry_path,
                        &child_relative,
                        self.source_absolute.join(&child_relative),
                    )
                });
                if !created {
                    tracing::debug!(
                        "Merging {} into existing directory {}",
                        entry_path.display(),
                        logical
                    );
                }
                scope.spawn(move |scope| self.scan_dir(scope, child, entry_path, child_relative));
            } else {
                register_file(self.registry, node, &logical, &entry_path);
                self.files.fetch_add(1, Ordering::Relaxed);
            }
        }

        Ok(())
    }

    fn fail(&self, err: EmbedError) {
        self.abort.store(true, Ordering::Release);
        let mut slot = lock::lock(&self.failure);
        if slot.is_none() {
            *slot = Some(err);
        }
    }
}
