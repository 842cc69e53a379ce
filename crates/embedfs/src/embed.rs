//! Turning a scanned tree into an artifact.
//!
//! The [`Embedder`] owns the active [`PackMode`]. The mode can be switched
//! at any time from any thread; each embed run reads it once at the start,
//! so a run never mixes modes.
//!
//! Pack failures are per file: the failing file is logged, recorded in the
//! [`EmbedReport`], and left out of the artifact. Everything else still
//! gets embedded.

use crate::artifact::{Artifact, ChildLink, DirRecord, FileRecord};
use crate::error::{EmbedError, Result};
use crate::pack::{self, PackMode};
use crate::tree::{DirNode, ScanTree};
use crate::vfs::{VirtualDir, VirtualFs};
use rayon::prelude::*;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};

/// Result of one embed run.
#[derive(Debug)]
pub struct EmbedReport {
    /// The artifact, minus any file that failed to pack
    pub artifact: Artifact,
    /// One [`EmbedError::PackFailure`] per omitted file
    pub failures: Vec<EmbedError>,
}

impl EmbedReport {
    /// Returns `true` if every file was packed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of omitted files.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// Produces artifacts from scanned trees or existing virtual filesystems.
///
/// # Examples
///
/// ```no_run
/// use embedfs::{Embedder, PackMode, PathPolicy, TreeBuilder};
///
/// let tree = TreeBuilder::new(PathPolicy::new()).build("./assets").unwrap();
///
/// let embedder = Embedder::new(PackMode::Development).with_name("assets");
/// embedder.production_mode();
///
/// let report = embedder.embed_tree(&tree);
/// for failure in &report.failures {
///     eprintln!("skipped: {failure}");
/// }
/// std::fs::write("assets.json", report.artifact.to_json().unwrap()).unwrap();
/// ```
#[derive(Debug)]
pub struct Embedder {
    name: String,
    mode: AtomicU8,
}

impl Embedder {
    /// Creates an embedder in the given mode.
    #[must_use]
    pub fn new(mode: PackMode) -> Self {
        Self {
            name: "assets".to_string(),
            mode: AtomicU8::new(mode.to_u8()),
        }
    }

    /// Sets the name recorded in produced artifacts.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Name recorded in produced artifacts.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Active mode.
    #[must_use]
    pub fn mode(&self) -> PackMode {
        PackMode::from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Switches the active mode.
    pub fn set_mode(&self, mode: PackMode) {
        self.mode.store(mode.to_u8(), Ordering::Release);
        tracing::debug!("Embedder mode set to {}", mode);
    }

    /// Switches to raw payloads.
    pub fn dev_mode(&self) {
        self.set_mode(PackMode::Development);
    }

    /// Switches to gzip payloads inflated on read.
    pub fn production_mode(&self) {
        self.set_mode(PackMode::Production);
    }

    /// Packs every file of a scanned tree.
    ///
    /// Directories and files appear in sorted logical order regardless of
    /// scan or pack concurrency.
    #[must_use]
    pub fn embed_tree(&self, tree: &ScanTree) -> EmbedReport {
        let mode = self.mode();
        let mut artifact = Artifact::new(&self.name, mode, tree.source_absolute());
        let mut failures = Vec::new();

        for node in tree.directories() {
            let (record, mut dir_failures) = Self::pack_node(tree, &node, mode);
            artifact.directories.push(record);
            failures.append(&mut dir_failures);
        }

        self.finish(artifact, failures)
    }

    fn pack_node(tree: &ScanTree, node: &DirNode, mode: PackMode) -> (DirRecord, Vec<EmbedError>) {
        let results: Vec<(String, PathBuf, Result<pack::PackedPayload>)> = node
            .files()
            .into_par_iter()
            .map(|(name, real)| {
                let packed = pack::pack_file(&real, mode);
                (name, real, packed)
            })
            .collect();

        let mut files = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (name, real, packed) in results {
            match packed {
                Ok(packed) => files.push(FileRecord {
                    name,
                    shadow_path: tree.shadow_of(&real),
                    real_path: real,
                    declared_size: packed.declared_size,
                    decompress: packed.decompress,
                    payload: packed.payload,
                }),
                Err(err) => {
                    tracing::warn!("Skipping {}: {}", real.display(), err);
                    failures.push(err);
                }
            }
        }

        let children = node
            .children()
            .iter()
            .map(|child| ChildLink {
                name: child.name(),
                logical_path: child.logical_path().to_string(),
            })
            .collect();

        let record = DirRecord {
            logical_path: node.logical_path().to_string(),
            shadow_path: node.shadow_path().to_string(),
            absolute_path: node.absolute_path().to_path_buf(),
            root: std::ptr::eq(node, tree.root().as_ref()),
            children,
            files,
        };
        (record, failures)
    }

    /// Re-packs an existing virtual filesystem, e.g. one loaded from a
    /// development artifact, in the active mode.
    ///
    /// # Errors
    ///
    /// Returns an error if a subdirectory link cannot be resolved. Files
    /// whose bytes cannot be read are reported as pack failures instead.
    pub fn embed_vfs(&self, vfs: &VirtualFs) -> Result<EmbedReport> {
        let mode = self.mode();
        let source_root = vfs
            .root()
            .map_or_else(PathBuf::new, |root| root.real_path().to_path_buf());
        let mut artifact = Artifact::new(&self.name, mode, source_root);
        let mut failures = Vec::new();

        for dir in vfs.dirs() {
            let (record, mut dir_failures) = Self::pack_virtual_dir(&dir, mode)?;
            artifact.directories.push(record);
            failures.append(&mut dir_failures);
        }

        Ok(self.finish(artifact, failures))
    }

    fn pack_virtual_dir(dir: &VirtualDir, mode: PackMode) -> Result<(DirRecord, Vec<EmbedError>)> {
        let results: Vec<_> = dir
            .files()
            .into_par_iter()
            .map(|file| {
                let packed = file
                    .data()
                    .map_err(|err| EmbedError::PackFailure {
                        path: file.real_path(),
                        source: io::Error::other(err),
                    })
                    .and_then(|bytes| {
                        pack::pack_bytes(&bytes, mode).map_err(|source| EmbedError::PackFailure {
                            path: file.real_path(),
                            source,
                        })
                    });
                (file, packed)
            })
            .collect();

        let mut files = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (file, packed) in results {
            match packed {
                Ok(packed) => files.push(FileRecord {
                    name: file.name().to_string(),
                    real_path: file.real_path(),
                    shadow_path: file.shadow_path().to_string(),
                    declared_size: packed.declared_size,
                    decompress: packed.decompress,
                    payload: packed.payload,
                }),
                Err(err) => {
                    tracing::warn!("Skipping {}: {}", file.path(), err);
                    failures.push(err);
                }
            }
        }

        let names = dir.subdirectory_names();
        let children = names
            .into_iter()
            .zip(dir.subdirectories()?)
            .map(|(name, child)| ChildLink {
                name,
                logical_path: child.path().to_string(),
            })
            .collect();

        let record = DirRecord {
            logical_path: dir.path().to_string(),
            shadow_path: dir.shadow_path().to_string(),
            absolute_path: dir.real_path().to_path_buf(),
            root: dir.is_root(),
            children,
            files,
        };
        Ok((record, failures))
    }

    fn finish(&self, artifact: Artifact, failures: Vec<EmbedError>) -> EmbedReport {
        tracing::info!(
            "Embedded {} files in {} directories ({} mode, {} skipped)",
            artifact.file_count(),
            artifact.dir_count(),
            artifact.mode,
            failures.len()
        );
        EmbedReport { artifact, failures }
    }
}

impl Default for Embedder {
    fn default() -> Self {
        Self::new(PackMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TreeBuilder;
    use crate::policy::PathPolicy;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn scanned() -> (TempDir, ScanTree) {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("docs")).unwrap();
        std::fs::write(temp.path().join("docs/readme.md"), b"hello").unwrap();
        std::fs::write(temp.path().join("main.cfg"), b"").unwrap();
        let tree = TreeBuilder::new(PathPolicy::new()).build(temp.path()).unwrap();
        (temp, tree)
    }

    #[test]
    fn test_mode_switching_from_threads() {
        let embedder = Arc::new(Embedder::new(PackMode::Development));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let embedder = Arc::clone(&embedder);
                thread::spawn(move || {
                    if i % 2 == 0 {
                        embedder.production_mode();
                    } else {
                        embedder.dev_mode();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(matches!(
            embedder.mode(),
            PackMode::Development | PackMode::Production
        ));
        embedder.set_mode(PackMode::Linked);
        assert_eq!(embedder.mode(), PackMode::Linked);
    }

    #[test]
    fn test_embed_tree_marks_root_and_links() {
        let (_temp, tree) = scanned();
        let report = Embedder::new(PackMode::Development).embed_tree(&tree);

        assert!(report.is_complete());
        let root = report.artifact.directory(".").unwrap();
        assert!(root.root);
        assert_eq!(root.children[0].name, "docs");
        assert_eq!(root.files[0].name, "main.cfg");
        assert_eq!(root.files[0].payload.as_deref(), Some(&b""[..]));
    }

    #[test]
    fn test_embed_vfs_repacks_in_production() {
        let (_temp, tree) = scanned();
        let dev = Embedder::new(PackMode::Development).embed_tree(&tree);
        let vfs = dev.artifact.to_vfs();

        let report = Embedder::new(PackMode::Production).embed_vfs(&vfs).unwrap();
        assert!(report.is_complete());
        let docs = report.artifact.directory("docs").unwrap();
        let readme = &docs.files[0];
        assert!(readme.decompress);
        assert_eq!(
            pack::decompress(readme.payload.as_ref().unwrap()).unwrap(),
            b"hello"
        );
    }

    #[test]
    fn test_linked_mode_has_no_payloads() {
        let (_temp, tree) = scanned();
        let report = Embedder::new(PackMode::Linked).embed_tree(&tree);
        let docs = report.artifact.directory("docs").unwrap();
        assert!(docs.files[0].payload.is_none());
        assert_eq!(docs.files[0].declared_size, 5);

        let vfs = report.artifact.to_vfs();
        let file = vfs.get_file("docs/readme.md").unwrap();
        assert_eq!(&*file.data().unwrap(), b"hello");
    }
}
