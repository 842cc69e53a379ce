//! Thread-safe registries shared by concurrent scan tasks.
//!
//! [`DirRegistry`] maps logical directory paths to their [`DirNode`] and
//! deduplicates concurrent discoveries of the same directory.
//! [`FileRegistry`] is a flat logical path → real path index giving O(1)
//! existence checks.
//!
//! # Lock ordering
//!
//! [`DirRegistry::register_child`] holds the registry write lock while it
//! links the new node into its parent's children list, so the registry
//! entry and the structural link are created together or not at all.
//! Code never takes the registry lock while holding a node's children
//! lock, which keeps the ordering acyclic.

use crate::lock;
use crate::tree::DirNode;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Logical path → directory node.
#[derive(Debug, Default)]
pub struct DirRegistry {
    dirs: RwLock<HashMap<String, Arc<DirNode>>>,
}

impl DirRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node registered for a logical path.
    #[must_use]
    pub fn get(&self, logical_path: &str) -> Option<Arc<DirNode>> {
        lock::read(&self.dirs).get(logical_path).cloned()
    }

    /// Returns `true` if a node is registered for the logical path.
    #[must_use]
    pub fn contains(&self, logical_path: &str) -> bool {
        lock::read(&self.dirs).contains_key(logical_path)
    }

    /// Registers a parentless node, or returns the existing one.
    ///
    /// The boolean is `true` when `make` was called and the node inserted.
    pub fn register_root(
        &self,
        logical_path: &str,
        make: impl FnOnce() -> DirNode,
    ) -> (Arc<DirNode>, bool) {
        let mut dirs = lock::write(&self.dirs);
        if let Some(existing) = dirs.get(logical_path) {
            return (Arc::clone(existing), false);
        }

        let node = Arc::new(make());
        dirs.insert(logical_path.to_string(), Arc::clone(&node));
        (node, true)
    }

    /// Registers a node under `parent`, or returns the node already
    /// registered for `logical_path`.
    ///
    /// The existence check, the registry insert, and the parent link all
    /// happen under one registry write lock. Two tasks discovering the same
    /// logical path concurrently always end up sharing one node.
    pub fn register_child(
        &self,
        parent: &DirNode,
        logical_path: &str,
        make: impl FnOnce() -> DirNode,
    ) -> (Arc<DirNode>, bool) {
        let mut dirs = lock::write(&self.dirs);
        if let Some(existing) = dirs.get(logical_path) {
            return (Arc::clone(existing), false);
        }

        let node = Arc::new(make());
        parent.link_child(Arc::clone(&node));
        dirs.insert(logical_path.to_string(), Arc::clone(&node));
        (node, true)
    }

    /// Number of registered directories.
    #[must_use]
    pub fn len(&self) -> usize {
        lock::read(&self.dirs).len()
    }

    /// Returns `true` if no directory is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock::read(&self.dirs).is_empty()
    }

    /// All nodes sorted by logical path.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<DirNode>> {
        let mut nodes: Vec<_> = lock::read(&self.dirs).values().cloned().collect();
        nodes.sort_by(|a, b| a.logical_path().cmp(b.logical_path()));
        nodes
    }

    /// Drops every registered node.
    pub fn flush(&self) {
        lock::write(&self.dirs).clear();
    }
}

/// Flat logical path → real path index.
#[derive(Debug, Default)]
pub struct FileRegistry {
    files: RwLock<HashMap<String, PathBuf>>,
}

impl FileRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry unless the logical path is already known.
    ///
    /// Returns `true` if the entry was inserted.
    pub fn add(&self, logical_path: impl Into<String>, real_path: impl Into<PathBuf>) -> bool {
        let mut files = lock::write(&self.files);
        let logical_path = logical_path.into();
        if files.contains_key(&logical_path) {
            return false;
        }
        files.insert(logical_path, real_path.into());
        true
    }

    /// Real path for a logical path.
    #[must_use]
    pub fn get(&self, logical_path: &str) -> Option<PathBuf> {
        lock::read(&self.files).get(logical_path).cloned()
    }

    /// Returns `true` if the logical path is registered.
    #[must_use]
    pub fn contains(&self, logical_path: &str) -> bool {
        lock::read(&self.files).contains_key(logical_path)
    }

    /// Removes an entry, returning its real path.
    pub fn remove(&self, logical_path: &str) -> Option<PathBuf> {
        lock::write(&self.files).remove(logical_path)
    }

    /// Number of registered files.
    #[must_use]
    pub fn len(&self) -> usize {
        lock::read(&self.files).len()
    }

    /// Returns `true` if no file is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock::read(&self.files).is_empty()
    }

    /// Sorted copy of all entries.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, PathBuf> {
        lock::read(&self.files)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Drops every entry.
    pub fn flush(&self) {
        lock::write(&self.files).clear();
    }
}

/// Directory and file registries used together by one builder.
#[derive(Debug, Default)]
pub struct SharedRegistry {
    dirs: DirRegistry,
    files: FileRegistry,
}

impl SharedRegistry {
    /// Creates empty registries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory registry.
    #[must_use]
    pub const fn dirs(&self) -> &DirRegistry {
        &self.dirs
    }

    /// Flat file registry.
    #[must_use]
    pub const fn files(&self) -> &FileRegistry {
        &self.files
    }

    /// Clears both registries.
    pub fn flush(&self) {
        self.dirs.flush();
        self.files.flush();
    }
}
