//! Virtual files and their payload callbacks.

use crate::error::{EmbedError, Result};
use crate::lock;
use crate::pack;
use crate::path;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

const UNMATERIALIZED: u64 = u64::MAX;

type PackFn = dyn Fn(&VirtualFile) -> io::Result<Vec<u8>> + Send + Sync;

/// Callback that produces a file's payload on demand.
///
/// # Examples
///
/// ```
/// use embedfs::vfs::{DataPack, VirtualFile};
///
/// let file = VirtualFile::new("hello.txt", "hello.txt")
///     .with_data_pack(DataPack::embedded(b"hi".to_vec()));
///
/// assert_eq!(&*file.data().unwrap(), b"hi");
/// ```
#[derive(Clone)]
pub struct DataPack(Arc<PackFn>);

impl DataPack {
    /// Wraps an arbitrary callback.
    pub fn new<F>(pack: F) -> Self
    where
        F: Fn(&VirtualFile) -> io::Result<Vec<u8>> + Send + Sync + 'static,
    {
        Self(Arc::new(pack))
    }

    /// Serves an in-memory payload, inflating it when the file is marked
    /// to decompress.
    pub fn embedded(payload: impl Into<Arc<[u8]>>) -> Self {
        let payload: Arc<[u8]> = payload.into();
        Self::new(move |file| pack::unpack(&payload, file.decompress()))
    }

    /// Reads the file's real path from disk on every call.
    #[must_use]
    pub fn from_disk() -> Self {
        Self::new(|file| std::fs::read(file.real_path()))
    }

    fn call(&self, file: &VirtualFile) -> io::Result<Vec<u8>> {
        (self.0)(file)
    }
}

impl fmt::Debug for DataPack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DataPack")
    }
}

/// A file in the virtual filesystem.
///
/// Holds metadata plus a [`DataPack`] that materializes the payload. With
/// caching enabled (the default) the first successful [`data`](Self::data)
/// result is memoized.
///
/// # Examples
///
/// ```
/// use embedfs::vfs::VirtualFile;
///
/// let file = VirtualFile::from_bytes("docs/readme.md", b"hello".to_vec());
/// assert_eq!(file.name(), "readme.md");
/// assert_eq!(file.path(), "docs/readme.md");
/// assert_eq!(file.size(), 5);
/// ```
pub struct VirtualFile {
    name: String,
    logical_dir: String,
    shadow_path: String,
    base_dir: PathBuf,
    size: u64,
    mod_time: SystemTime,
    decompress: bool,
    cache: bool,
    data_pack: Option<DataPack>,
    cached: RwLock<Option<Arc<[u8]>>>,
    materialized: AtomicU64,
}

impl VirtualFile {
    /// Creates a file with no payload source.
    ///
    /// `logical_path` is where the file is looked up; `shadow_path` is its
    /// physical path relative to [`base_dir`](Self::base_dir).
    #[must_use]
    pub fn new(logical_path: impl AsRef<str>, shadow_path: impl AsRef<str>) -> Self {
        let logical = path::normalize(logical_path.as_ref());
        let (dir, name) = path::split_parent(&logical);
        Self {
            name: name.to_string(),
            logical_dir: dir.to_string(),
            shadow_path: path::normalize(shadow_path.as_ref()),
            base_dir: PathBuf::new(),
            size: 0,
            mod_time: SystemTime::now(),
            decompress: false,
            cache: true,
            data_pack: None,
            cached: RwLock::new(None),
            materialized: AtomicU64::new(UNMATERIALIZED),
        }
    }

    /// Creates a file whose payload is already materialized.
    #[must_use]
    pub fn from_bytes(logical_path: impl AsRef<str>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes: Arc<[u8]> = bytes.into();
        let len = bytes.len() as u64;
        let file = Self::new(logical_path.as_ref(), logical_path.as_ref()).with_size(len);
        *lock::write(&file.cached) = Some(bytes);
        file.materialized.store(len, Ordering::Release);
        file
    }

    /// Sets the directory the shadow path is relative to.
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Sets the declared size reported before the first read.
    #[must_use]
    pub const fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Sets the modification time.
    #[must_use]
    pub const fn with_mod_time(mut self, mod_time: SystemTime) -> Self {
        self.mod_time = mod_time;
        self
    }

    /// Marks the stored payload as gzip data to inflate on read.
    #[must_use]
    pub const fn with_decompress(mut self, decompress: bool) -> Self {
        self.decompress = decompress;
        self
    }

    /// Enables or disables payload memoization.
    #[must_use]
    pub const fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Sets the payload callback.
    #[must_use]
    pub fn with_data_pack(mut self, data_pack: DataPack) -> Self {
        self.data_pack = Some(data_pack);
        self
    }

    /// File name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical directory containing the file.
    #[must_use]
    pub fn logical_dir(&self) -> &str {
        &self.logical_dir
    }

    /// Logical path (directory + name).
    #[must_use]
    pub fn path(&self) -> String {
        path::join(&self.logical_dir, &self.name)
    }

    /// Physical path relative to the base directory.
    #[must_use]
    pub fn shadow_path(&self) -> &str {
        &self.shadow_path
    }

    /// Physical directory relative to the base directory.
    #[must_use]
    pub fn shadow_dir(&self) -> &str {
        path::split_parent(&self.shadow_path).0
    }

    /// Base directory of the physical source.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Physical location of the file on the originating disk.
    #[must_use]
    pub fn real_path(&self) -> PathBuf {
        if path::is_root(&self.shadow_path) {
            self.base_dir.clone()
        } else {
            self.base_dir.join(&self.shadow_path)
        }
    }

    /// Payload length once materialized, the declared size before that.
    #[must_use]
    pub fn size(&self) -> u64 {
        match self.materialized.load(Ordering::Acquire) {
            UNMATERIALIZED => self.size,
            len => len,
        }
    }

    /// Modification time.
    #[must_use]
    pub const fn mod_time(&self) -> SystemTime {
        self.mod_time
    }

    /// Whether reads inflate the stored payload.
    #[must_use]
    pub const fn decompress(&self) -> bool {
        self.decompress
    }

    /// Whether the first successful read is memoized.
    #[must_use]
    pub const fn caches(&self) -> bool {
        self.cache
    }

    /// Returns the payload bytes.
    ///
    /// Serves the cached payload when present and caching is enabled,
    /// otherwise runs the data pack. Failures are not retried.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::ReadFailure`] if the data pack fails to read
    /// or decompress the payload.
    pub fn data(&self) -> Result<Arc<[u8]>> {
        let Some(pack) = &self.data_pack else {
            return Ok(lock::read(&self.cached)
                .clone()
                .unwrap_or_else(|| Arc::from(Vec::new())));
        };

        if self.cache {
            if let Some(cached) = lock::read(&self.cached).clone() {
                return Ok(cached);
            }
        }

        let bytes: Arc<[u8]> = pack
            .call(self)
            .map_err(|source| EmbedError::ReadFailure {
                path: self.path(),
                source,
            })?
            .into();

        self.materialized
            .store(bytes.len() as u64, Ordering::Release);
        if self.cache {
            *lock::write(&self.cached) = Some(Arc::clone(&bytes));
        }

        Ok(bytes)
    }

    /// Returns `true` once a payload is memoized.
    #[must_use]
    pub fn is_cached(&self) -> bool {
        lock::read(&self.cached).is_some()
    }
}

impl fmt::Debug for VirtualFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualFile")
            .field("path", &self.path())
            .field("shadow_path", &self.shadow_path)
            .field("size", &self.size())
            .field("decompress", &self.decompress)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_pack(calls: &Arc<AtomicUsize>, payload: &'static [u8]) -> DataPack {
        let calls = Arc::clone(calls);
        DataPack::new(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(payload.to_vec())
        })
    }

    #[test]
    fn test_new_splits_logical_path() {
        let file = VirtualFile::new("/static/css/site.css", "css/site.css");
        assert_eq!(file.name(), "site.css");
        assert_eq!(file.logical_dir(), "static/css");
        assert_eq!(file.path(), "static/css/site.css");
        assert_eq!(file.shadow_dir(), "css");
    }

    #[test]
    fn test_real_path_uses_shadow() {
        let file = VirtualFile::new("static/site.css", "css/site.css").with_base_dir("/srv/app");
        assert_eq!(file.real_path(), PathBuf::from("/srv/app/css/site.css"));
    }

    #[test]
    fn test_data_cached_after_first_read() {
        let calls = Arc::new(AtomicUsize::new(0));
        let file = VirtualFile::new("a.txt", "a.txt").with_data_pack(counting_pack(&calls, b"abc"));

        assert_eq!(&*file.data().unwrap(), b"abc");
        assert_eq!(&*file.data().unwrap(), b"abc");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(file.is_cached());
    }

    #[test]
    fn test_data_without_cache_reinvokes_pack() {
        let calls = Arc::new(AtomicUsize::new(0));
        let file = VirtualFile::new("a.txt", "a.txt")
            .with_cache(false)
            .with_data_pack(counting_pack(&calls, b"abc"));

        file.data().unwrap();
        file.data().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!file.is_cached());
    }

    #[test]
    fn test_size_switches_to_materialized_length() {
        let compressed = pack::compress(b"hello").unwrap();
        let declared = compressed.len() as u64;
        let file = VirtualFile::new("readme.md", "readme.md")
            .with_size(declared)
            .with_decompress(true)
            .with_data_pack(DataPack::embedded(compressed));

        assert_eq!(file.size(), declared);
        assert_eq!(&*file.data().unwrap(), b"hello");
        assert_eq!(file.size(), 5);
    }

    #[test]
    fn test_data_failure_is_read_failure() {
        let file = VirtualFile::new("missing.txt", "missing.txt")
            .with_base_dir("/definitely/not/here")
            .with_data_pack(DataPack::from_disk());

        let err = file.data().unwrap_err();
        assert!(err.is_read_failure());
        assert!(!file.is_cached());
    }

    #[test]
    fn test_corrupt_gzip_is_read_failure() {
        let file = VirtualFile::new("bad.gz", "bad.gz")
            .with_decompress(true)
            .with_data_pack(DataPack::embedded(b"not gzip".to_vec()));

        assert!(file.data().unwrap_err().is_read_failure());
    }

    #[test]
    fn test_no_pack_returns_empty() {
        let file = VirtualFile::new("empty", "empty");
        assert!(file.data().unwrap().is_empty());
    }

    #[test]
    fn test_virtual_file_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VirtualFile>();
        assert_send_sync::<DataPack>();
    }
}
