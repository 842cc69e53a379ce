//! Virtual directories with deferred subdirectory resolution.

use super::file::VirtualFile;
use crate::error::{EmbedError, Result};
use crate::lock;
use crate::path;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

type ResolveFn = dyn Fn() -> Result<Arc<VirtualDir>> + Send + Sync;

/// Deferred reference to a directory.
///
/// Subdirectories are stored as resolvers rather than direct handles so a
/// tree can be registered in any order and linked afterwards.
#[derive(Clone)]
pub struct DirResolver(Arc<ResolveFn>);

impl DirResolver {
    /// Wraps an arbitrary resolver.
    pub fn new<F>(resolve: F) -> Self
    where
        F: Fn() -> Result<Arc<VirtualDir>> + Send + Sync + 'static,
    {
        Self(Arc::new(resolve))
    }

    /// Resolver that always returns `dir`.
    ///
    /// Holds a strong handle; linking a directory to one of its ancestors
    /// this way creates a reference cycle. Use
    /// [`VirtualFs::link`](super::VirtualFs::link) for such links.
    #[must_use]
    pub fn to(dir: &Arc<VirtualDir>) -> Self {
        let dir = Arc::clone(dir);
        Self::new(move || Ok(Arc::clone(&dir)))
    }

    /// Resolves the directory.
    ///
    /// # Errors
    ///
    /// Returns whatever error the resolver produces, typically
    /// [`EmbedError::NotFound`] when the target is gone.
    pub fn resolve(&self) -> Result<Arc<VirtualDir>> {
        (self.0)()
    }
}

impl fmt::Debug for DirResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DirResolver")
    }
}

/// A directory in the virtual filesystem.
///
/// # Examples
///
/// ```
/// use embedfs::vfs::{DirResolver, VirtualDir, VirtualFile};
/// use std::sync::Arc;
///
/// let root = Arc::new(VirtualDir::new(".", ".", "/srv/app", true));
/// let docs = Arc::new(VirtualDir::new("docs", "docs", "/srv/app/docs", false));
/// docs.add_file(VirtualFile::from_bytes("docs/readme.md", b"hello".to_vec()));
/// root.add_directory("docs", DirResolver::to(&docs));
///
/// let file = root.get_file("/docs/readme.md").unwrap();
/// assert_eq!(&*file.data().unwrap(), b"hello");
/// assert!(root.get_dir("docs/missing").unwrap_err().is_not_found());
/// ```
pub struct VirtualDir {
    logical_path: String,
    shadow_path: String,
    absolute_path: PathBuf,
    root: bool,
    mod_time: SystemTime,
    files: RwLock<BTreeMap<String, Arc<VirtualFile>>>,
    subdirs: RwLock<BTreeMap<String, DirResolver>>,
}

impl VirtualDir {
    /// Creates an empty directory.
    #[must_use]
    pub fn new(
        logical_path: impl AsRef<str>,
        shadow_path: impl AsRef<str>,
        absolute_path: impl Into<PathBuf>,
        root: bool,
    ) -> Self {
        Self {
            logical_path: path::normalize(logical_path.as_ref()),
            shadow_path: path::normalize(shadow_path.as_ref()),
            absolute_path: absolute_path.into(),
            root,
            mod_time: SystemTime::now(),
            files: RwLock::new(BTreeMap::new()),
            subdirs: RwLock::new(BTreeMap::new()),
        }
    }

    /// Sets the modification time.
    #[must_use]
    pub const fn with_mod_time(mut self, mod_time: SystemTime) -> Self {
        self.mod_time = mod_time;
        self
    }

    /// Last segment of the logical path.
    #[must_use]
    pub fn name(&self) -> String {
        path::base_name(&self.logical_path)
    }

    /// Logical path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.logical_path
    }

    /// Physical path relative to the scan root.
    #[must_use]
    pub fn shadow_path(&self) -> &str {
        &self.shadow_path
    }

    /// Absolute physical path on the originating disk.
    #[must_use]
    pub fn real_path(&self) -> &Path {
        &self.absolute_path
    }

    /// Whether this directory is the root of its tree.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.root
    }

    /// Modification time.
    #[must_use]
    pub const fn mod_time(&self) -> SystemTime {
        self.mod_time
    }

    /// Adds a file keyed by its name, replacing any earlier file of that name.
    pub fn add_file(&self, file: impl Into<Arc<VirtualFile>>) {
        let file = file.into();
        lock::write(&self.files).insert(file.name().to_string(), file);
    }

    /// Adds a subdirectory. A later call with the same name replaces the
    /// earlier resolver.
    pub fn add_directory(&self, name: impl Into<String>, resolver: DirResolver) {
        lock::write(&self.subdirs).insert(name.into(), resolver);
    }

    /// File registered directly in this directory.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<Arc<VirtualFile>> {
        lock::read(&self.files).get(name).cloned()
    }

    /// Files registered directly in this directory, sorted by name.
    #[must_use]
    pub fn files(&self) -> Vec<Arc<VirtualFile>> {
        lock::read(&self.files).values().cloned().collect()
    }

    /// Number of files registered directly in this directory.
    #[must_use]
    pub fn file_count(&self) -> usize {
        lock::read(&self.files).len()
    }

    /// Subdirectory names, sorted.
    #[must_use]
    pub fn subdirectory_names(&self) -> Vec<String> {
        lock::read(&self.subdirs).keys().cloned().collect()
    }

    /// Resolves every subdirectory, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns the first resolver failure.
    pub fn subdirectories(&self) -> Result<Vec<Arc<Self>>> {
        let resolvers: Vec<DirResolver> = lock::read(&self.subdirs).values().cloned().collect();
        resolvers.iter().map(DirResolver::resolve).collect()
    }

    fn resolver(&self, name: &str) -> Option<DirResolver> {
        lock::read(&self.subdirs).get(name).cloned()
    }

    /// Looks up a directory relative to this one.
    ///
    /// The path is normalized first; the root forms (`""`, `"."`, `"/"`)
    /// return `self`.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::NotFound`] naming the full requested path if
    /// any segment is missing.
    pub fn get_dir(self: &Arc<Self>, requested: &str) -> Result<Arc<Self>> {
        let normalized = path::normalize(requested);
        if path::is_root(&normalized) {
            return Ok(Arc::clone(self));
        }
        tracing::trace!("Resolving {} from {}", normalized, self.logical_path);

        if let Some(resolver) = self.resolver(&normalized) {
            return resolver.resolve();
        }

        let (first, rest) = path::split_first(&normalized);
        let resolver = self
            .resolver(first)
            .ok_or_else(|| EmbedError::not_found(normalized.as_str()))?;
        let next = resolver.resolve()?;
        if path::is_root(rest) {
            return Ok(next);
        }

        next.get_dir(rest).map_err(|err| {
            if err.is_not_found() {
                EmbedError::not_found(normalized.as_str())
            } else {
                err
            }
        })
    }

    /// Looks up a file relative to this directory.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::NotFound`] naming the full requested path if
    /// the containing directory or the file itself is missing.
    pub fn get_file(self: &Arc<Self>, requested: &str) -> Result<Arc<VirtualFile>> {
        let normalized = path::normalize(requested);
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

    /// Visits the files of this directory in name order.
    pub fn each_file<F>(&self, mut visit: F) -> ControlFlow<()>
    where
        F: FnMut(&Arc<VirtualFile>) -> ControlFlow<()>,
    {
        for file in self.files() {
            visit(&file)?;
        }
        ControlFlow::Continue(())
    }

    /// Visits the immediate subdirectories in name order.
    ///
    /// # Errors
    ///
    /// Returns the first resolver failure.
    pub fn each_subdirectory<F>(&self, mut visit: F) -> Result<ControlFlow<()>>
    where
        F: FnMut(&Arc<Self>) -> ControlFlow<()>,
    {
        for dir in self.subdirectories()? {
            if visit(&dir).is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Visits every file in this subtree, depth first.
    ///
    /// Each directory is entered at most once, so linked cycles terminate.
    ///
    /// # Errors
    ///
    /// Returns the first resolver failure.
    pub fn every_file<F>(self: &Arc<Self>, mut visit: F) -> Result<ControlFlow<()>>
    where
        F: FnMut(&Arc<VirtualFile>) -> ControlFlow<()>,
    {
        let mut seen = HashSet::new();
        Self::walk(self, &mut seen, &mut visit)
    }

    fn walk<F>(
        dir: &Arc<Self>,
        seen: &mut HashSet<*const Self>,
        visit: &mut F,
    ) -> Result<ControlFlow<()>>
    where
        F: FnMut(&Arc<VirtualFile>) -> ControlFlow<()>,
    {
        if !seen.insert(Arc::as_ptr(dir)) {
            return Ok(ControlFlow::Continue(()));
        }

        if dir.each_file(&mut *visit).is_break() {
            return Ok(ControlFlow::Break(()));
        }

        for sub in dir.subdirectories()? {
            if Self::walk(&sub, seen, visit)?.is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }

        Ok(ControlFlow::Continue(()))
    }
}

impl fmt::Debug for VirtualDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualDir")
            .field("path", &self.logical_path)
            .field("real_path", &self.absolute_path)
            .field("root", &self.root)
            .field("files", &self.file_count())
            .field("subdirs", &self.subdirectory_names())
            .finish_non_exhaustive()
    }
}
