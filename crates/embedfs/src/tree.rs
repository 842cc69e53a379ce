//! Build-time directory tree produced by a scan.
//!
//! A [`DirNode`] is created the first time a directory is discovered and is
//! owned jointly by its parent (structural link) and the
//! [`DirRegistry`](crate::registry::DirRegistry) (lookup). The registry is
//! the single source of truth for "does this logical path already have a
//! node"; the children list is only a traversal index.

use crate::lock;
use crate::path;
use crate::registry::SharedRegistry;
use crate::vfs::{DataPack, VirtualDir, VirtualFile, VirtualFs};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

/// A directory discovered during a scan.
pub struct DirNode {
    logical_path: String,
    real_path: PathBuf,
    shadow_path: String,
    absolute_path: PathBuf,
    files: RwLock<BTreeMap<String, PathBuf>>,
    children: Mutex<Vec<Arc<DirNode>>>,
}

impl DirNode {
    /// Creates an empty node.
    ///
    /// `shadow_path` is the slash-separated physical path relative to the
    /// scan root (`"."` for the root itself).
    #[must_use]
    pub fn new(
        logical_path: impl AsRef<str>,
        real_path: impl Into<PathBuf>,
        shadow_path: impl AsRef<str>,
        absolute_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            logical_path: path::normalize(logical_path.as_ref()),
            real_path: real_path.into(),
            shadow_path: path::normalize(shadow_path.as_ref()),
            absolute_path: absolute_path.into(),
            files: RwLock::new(BTreeMap::new()),
            children: Mutex::new(Vec::new()),
        }
    }

    /// Logical path used for lookups.
    #[must_use]
    pub fn logical_path(&self) -> &str {
        &self.logical_path
    }

    /// Last segment of the logical path.
    #[must_use]
    pub fn name(&self) -> String {
        path::base_name(&self.logical_path)
    }

    /// Physical path as it was scanned.
    #[must_use]
    pub fn real_path(&self) -> &Path {
        &self.real_path
    }

    /// Physical path relative to the scan root.
    #[must_use]
    pub fn shadow_path(&self) -> &str {
        &self.shadow_path
    }

    /// Absolute form of the physical path.
    #[must_use]
    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    /// Registers a file under its logical name.
    ///
    /// The first registration of a name wins; returns `false` if the name
    /// was already present.
    pub fn add_file(&self, name: impl Into<String>, real_path: impl Into<PathBuf>) -> bool {
        let mut files = lock::write(&self.files);
        let name = name.into();
        if files.contains_key(&name) {
            return false;
        }
        files.insert(name, real_path.into());
        true
    }

    /// Returns the real path of a file registered in this directory.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<PathBuf> {
        lock::read(&self.files).get(name).cloned()
    }

    /// Returns `(logical name, real path)` pairs sorted by name.
    #[must_use]
    pub fn files(&self) -> Vec<(String, PathBuf)> {
        lock::read(&self.files)
            .iter()
            .map(|(name, real)| (name.clone(), real.clone()))
            .collect()
    }

    /// Number of files registered directly in this directory.
    #[must_use]
    pub fn file_count(&self) -> usize {
        lock::read(&self.files).len()
    }

    /// Returns the child nodes sorted by logical path.
    #[must_use]
    pub fn children(&self) -> Vec<Arc<Self>> {
        let mut children = lock::lock(&self.children).clone();
        children.sort_by(|a, b| a.logical_path.cmp(&b.logical_path));
        children
    }

    /// Links a child node, refusing a second child with the same logical path.
    pub(crate) fn link_child(&self, child: Arc<Self>) -> bool {
        let mut children = lock::lock(&self.children);
        if children
            .iter()
            .any(|existing| existing.logical_path == child.logical_path)
        {
            return false;
        }
        children.push(child);
        true
    }
}

impl fmt::Debug for DirNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirNode")
            .field("logical_path", &self.logical_path)
            .field("real_path", &self.real_path)
            .field("files", &self.file_count())
            .field("children", &lock::lock(&self.children).len())
            .finish()
    }
}

/// Counters collected while scanning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Directories listed
    pub directories: usize,
    /// Files registered
    pub files: usize,
}

/// Result of a successful build: the root node plus the registry it lives in.
#[derive(Debug, Clone)]
pub struct ScanTree {
    root: Arc<DirNode>,
    registry: Arc<SharedRegistry>,
    source: PathBuf,
    source_absolute: PathBuf,
    stats: ScanStats,
}

impl ScanTree {
    pub(crate) const fn new(
        root: Arc<DirNode>,
        registry: Arc<SharedRegistry>,
        source: PathBuf,
        source_absolute: PathBuf,
        stats: ScanStats,
    ) -> Self {
        Self {
            root,
            registry,
            source,
            source_absolute,
            stats,
        }
    }

    /// Root directory node.
    #[must_use]
    pub const fn root(&self) -> &Arc<DirNode> {
        &self.root
    }

    /// Registry shared with the builder that produced this tree.
    #[must_use]
    pub const fn registry(&self) -> &Arc<SharedRegistry> {
        &self.registry
    }

    /// Directory the scan started from, as given.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Absolute form of [`source`](Self::source).
    #[must_use]
    pub fn source_absolute(&self) -> &Path {
        &self.source_absolute
    }

    /// Counters from the build.
    #[must_use]
    pub const fn stats(&self) -> ScanStats {
        self.stats
    }

    /// Looks up a directory node by logical path.
    #[must_use]
    pub fn dir(&self, logical_path: &str) -> Option<Arc<DirNode>> {
        self.registry.dirs().get(&path::normalize(logical_path))
    }

    /// All registered directory nodes, sorted by logical path.
    #[must_use]
    pub fn directories(&self) -> Vec<Arc<DirNode>> {
        self.registry.dirs().snapshot()
    }

    /// Number of registered directories.
    #[must_use]
    pub fn dir_count(&self) -> usize {
        self.registry.dirs().len()
    }

    /// Number of files across all registered directories.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.directories().iter().map(|dir| dir.file_count()).sum()
    }

    /// Visits every node reachable from the root, parents before children,
    /// siblings in logical path order. Each node is visited once.
    pub fn walk<F>(&self, mut visit: F) -> ControlFlow<()>
    where
        F: FnMut(&Arc<DirNode>) -> ControlFlow<()>,
    {
        let mut seen = HashSet::new();
        let mut stack = vec![Arc::clone(&self.root)];
        while let Some(node) = stack.pop() {
            if !seen.insert(Arc::as_ptr(&node)) {
                continue;
            }
            visit(&node)?;
            stack.extend(node.children().into_iter().rev());
        }
        ControlFlow::Continue(())
    }

    /// Shadow path of a file relative to the scan root.
    pub(crate) fn shadow_of(&self, real_path: &Path) -> String {
        real_path
            .strip_prefix(&self.source)
            .map_or_else(|_| path::to_slash(real_path), path::to_slash)
    }

    /// Builds a read-side VFS whose files read straight from disk.
    ///
    /// Directories are registered first and child links are resolved
    /// lazily through the returned [`VirtualFs`], so link order does not
    /// matter.
    #[must_use]
    pub fn to_vfs(&self) -> VirtualFs {
        let vfs = VirtualFs::new();
        let nodes = self.directories();

        for node in &nodes {
            let dir = VirtualDir::new(
                node.logical_path(),
                node.shadow_path(),
                node.absolute_path(),
                Arc::ptr_eq(node, &self.root),
            );

            for (name, real) in node.files() {
                let size = std::fs::metadata(&real).map_or(0, |meta| meta.len());
                let file = VirtualFile::new(path::join(node.logical_path(), &name), self.shadow_of(&real))
                    .with_base_dir(&self.source_absolute)
                    .with_size(size)
                    .with_cache(false)
                    .with_data_pack(DataPack::from_disk());
                dir.add_file(file);
            }

            vfs.register(dir);
        }

        for node in &nodes {
            if let Some(dir) = vfs.dir(node.logical_path()) {
                for child in node.children() {
                    dir.add_directory(child.name(), vfs.link(child.logical_path()));
                }
            }
        }

        vfs
    }
}
