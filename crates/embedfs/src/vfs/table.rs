//! Owned logical path → directory table.

use super::dir::{DirResolver, VirtualDir};
use super::file::VirtualFile;
use crate::error::{EmbedError, Result};
use crate::lock;
use crate::path;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, Weak};

#[derive(Debug, Default)]
struct FsTable {
    dirs: RwLock<HashMap<String, Arc<VirtualDir>>>,
}

/// A read-side virtual filesystem.
///
/// Owns every registered [`VirtualDir`] by logical path. Links created with
/// [`link`](Self::link) hold only a weak handle to the table, so directories
/// can reference each other (including ancestors) without leaking.
/// Cloning is cheap and shares the same table.
///
/// # Examples
///
/// ```
/// use embedfs::vfs::{VirtualDir, VirtualFile, VirtualFs};
///
/// let vfs = VirtualFs::new();
/// let root = vfs.register(VirtualDir::new(".", ".", "/srv/app", true));
/// let docs = vfs.register(VirtualDir::new("docs", "docs", "/srv/app/docs", false));
/// docs.add_file(VirtualFile::from_bytes("docs/readme.md", b"hello".to_vec()));
/// root.add_directory("docs", vfs.link("docs"));
///
/// let file = vfs.get_file("docs/readme.md").unwrap();
/// assert_eq!(&*file.data().unwrap(), b"hello");
/// ```
#[derive(Debug, Clone, Default)]
pub struct VirtualFs {
    inner: Arc<FsTable>,
}

impl VirtualFs {
    /// Creates an empty filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a directory under its logical path, replacing any
    /// earlier entry, and returns the shared handle.
    pub fn register(&self, dir: VirtualDir) -> Arc<VirtualDir> {
        let dir = Arc::new(dir);
        self.insert(Arc::clone(&dir));
        dir
    }

    /// Registers an already shared directory.
    pub fn insert(&self, dir: Arc<VirtualDir>) {
        lock::write(&self.inner.dirs).insert(dir.path().to_string(), dir);
    }

    /// Resolver that looks `logical_path` up in this table when called.
    #[must_use]
    pub fn link(&self, logical_path: &str) -> DirResolver {
        let table: Weak<FsTable> = Arc::downgrade(&self.inner);
        let logical = path::normalize(logical_path);
        DirResolver::new(move || {
            let table = table
                .upgrade()
                .ok_or_else(|| EmbedError::not_found(logical.as_str()))?;
            let found = lock::read(&table.dirs).get(&logical).cloned();
            found.ok_or_else(|| EmbedError::not_found(logical.as_str()))
        })
    }

    /// Directory registered under exactly this logical path.
    #[must_use]
    pub fn dir(&self, logical_path: &str) -> Option<Arc<VirtualDir>> {
        lock::read(&self.inner.dirs)
            .get(&path::normalize(logical_path))
            .cloned()
    }

    /// Root directory: the one registered at `"."`, else the one flagged
    /// as root.
    #[must_use]
    pub fn root(&self) -> Option<Arc<VirtualDir>> {
        let dirs = lock::read(&self.inner.dirs);
        dirs.get(path::ROOT)
            .or_else(|| dirs.values().find(|dir| dir.is_root()))
            .cloned()
    }

    /// Looks up a directory by logical path.
    ///
    /// Tries the table first, then walks from the root.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::NotFound`] if no directory matches.
    pub fn get_dir(&self, logical_path: &str) -> Result<Arc<VirtualDir>> {
        let normalized = path::normalize(logical_path);
        let root = self.root();
        if path::is_root(&normalized) {
            return root.ok_or_else(|| EmbedError::not_found(normalized.as_str()));
        }

        if let Some(dir) = self.dir(&normalized) {
            return Ok(dir);
        }

        root.ok_or_else(|| EmbedError::not_found(normalized.as_str()))?
            .get_dir(&normalized)
    }

    /// Looks up a file by logical path.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::NotFound`] if the directory or file is missing.
    /// Other resolver errors are returned unchanged.
    pub fn get_file(&self, logical_path: &str) -> Result<Arc<VirtualFile>> {
        let normalized = path::normalize(logical_path);
        let (dir, name) = path::split_parent(&normalized);

        let directory = self.get_dir(dir).map_err(|err| {
            if err.is_not_found() {
                EmbedError::not_found(normalized.as_str())
            } else {
                err
            }
        })?;
        directory
            .file(name)
            .ok_or_else(|| EmbedError::not_found(normalized.as_str()))
    }

    /// Number of registered directories.
    #[must_use]
    pub fn len(&self) -> usize {
        lock::read(&self.inner.dirs).len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock::read(&self.inner.dirs).is_empty()
    }

    /// Registered logical paths, sorted.
    #[must_use]
    pub fn logical_paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = lock::read(&self.inner.dirs).keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Registered directories sorted by logical path.
    #[must_use]
    pub fn dirs(&self) -> Vec<Arc<VirtualDir>> {
        let mut dirs: Vec<_> = lock::read(&self.inner.dirs).values().cloned().collect();
        dirs.sort_by(|a, b| a.path().cmp(b.path()));
        dirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::ControlFlow;

    fn sample() -> VirtualFs {
        let vfs = VirtualFs::new();
        let root = vfs.register(VirtualDir::new(".", ".", "/r", true));
        let a = vfs.register(VirtualDir::new("a", "a", "/r/a", false));
        let b = vfs.register(VirtualDir::new("a/b", "a/b", "/r/a/b", false));
        b.add_file(VirtualFile::from_bytes("a/b/c.txt", b"c".to_vec()));
        root.add_directory("a", vfs.link("a"));
        a.add_directory("b", vfs.link("a/b"));
        vfs
    }

    #[test]
    fn test_lookup_through_links() {
        let vfs = sample();
        assert_eq!(vfs.get_dir("a/b").unwrap().path(), "a/b");
        assert_eq!(&*vfs.get_file("/a/b/c.txt").unwrap().data().unwrap(), b"c");
        assert!(vfs.get_dir("a/x").unwrap_err().is_not_found());
    }

    #[test]
    fn test_root_forms() {
        let vfs = sample();
        for requested in ["", ".", "/"] {
            assert!(vfs.get_dir(requested).unwrap().is_root());
        }
    }

    #[test]
    fn test_link_resolves_after_later_registration() {
        let vfs = VirtualFs::new();
        let root = vfs.register(VirtualDir::new(".", ".", "/r", true));
        root.add_directory("late", vfs.link("late"));
        assert!(root.get_dir("late").unwrap_err().is_not_found());

        vfs.register(VirtualDir::new("late", "late", "/r/late", false));
        assert_eq!(root.get_dir("late").unwrap().path(), "late");
    }

    #[test]
    fn test_link_after_table_dropped_is_not_found() {
        let resolver = {
            let vfs = VirtualFs::new();
            vfs.register(VirtualDir::new("a", "a", "/r/a", false));
            vfs.link("a")
        };
        assert!(resolver.resolve().unwrap_err().is_not_found());
    }

    #[test]
    fn test_ancestor_link_does_not_loop() {
        let vfs = sample();
        let b = vfs.dir("a/b").unwrap();
        b.add_directory("parent", vfs.link("a"));

        let mut count = 0;
        vfs.root()
            .unwrap()
            .every_file(|_| {
                count += 1;
                ControlFlow::Continue(())
            })
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(vfs.get_dir("a/b/parent/b").unwrap().path(), "a/b");
    }

    #[test]
    fn test_mounted_root_without_dot_entry() {
        let vfs = VirtualFs::new();
        vfs.register(VirtualDir::new("static", ".", "/r", true));
        assert_eq!(vfs.root().unwrap().path(), "static");
        assert_eq!(vfs.get_dir(".").unwrap().path(), "static");
    }

    #[test]
    fn test_get_file_keeps_resolver_errors() {
        let vfs = sample();
        vfs.root().unwrap().add_directory(
            "broken",
            DirResolver::new(|| {
                Err(EmbedError::Artifact {
                    reason: "corrupt record".to_string(),
                })
            }),
        );

        let err = vfs.get_file("broken/x.txt").unwrap_err();
        assert!(matches!(err, EmbedError::Artifact { .. }));
        assert!(vfs.get_file("a/missing.txt").unwrap_err().is_not_found());
    }

    #[test]
    fn test_listing_sorted() {
        let vfs = sample();
        assert_eq!(vfs.logical_paths(), vec![".", "a", "a/b"]);
        assert_eq!(vfs.len(), 3);
        assert!(!vfs.is_empty());
    }
}
