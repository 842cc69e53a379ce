//! Serialized embed artifact.
//!
//! An [`Artifact`] is the self-contained output of an embed run: every
//! directory with its child links and files, each file carrying its packed
//! payload as an escaped literal. Loading it back with
//! [`Artifact::to_vfs`] rebuilds the tree with identical lookup behavior
//! and no dependency on the source directory (except in linked mode).

use crate::error::{EmbedError, Result};
use crate::literal::serde_literal;
use crate::pack::PackMode;
use crate::path;
use crate::vfs::{DataPack, VirtualDir, VirtualFile, VirtualFs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Artifact layout version written by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// Serialized form of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Logical name within its directory
    pub name: String,
    /// Physical path at embed time
    pub real_path: PathBuf,
    /// Physical path relative to the source root
    pub shadow_path: String,
    /// Size reported before the first read
    pub declared_size: u64,
    /// Whether readers inflate the payload
    pub decompress: bool,
    /// Packed bytes; absent in linked mode
    #[serde(default, with = "serde_literal", skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<u8>>,
}

/// Link from a directory to one of its subdirectories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildLink {
    /// Name the child is reachable under
    pub name: String,
    /// Logical path of the child record
    pub logical_path: String,
}

/// Serialized form of one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirRecord {
    /// Logical path
    pub logical_path: String,
    /// Physical path relative to the source root
    pub shadow_path: String,
    /// Absolute physical path at embed time
    pub absolute_path: PathBuf,
    /// Whether this is the root directory
    #[serde(default)]
    pub root: bool,
    /// Subdirectory links, sorted by name
    #[serde(default)]
    pub children: Vec<ChildLink>,
    /// Files, sorted by name
    #[serde(default)]
    pub files: Vec<FileRecord>,
}

/// A complete embedded tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Layout version
    pub format_version: u32,
    /// Package or collection name
    pub name: String,
    /// Packing mode of the payloads
    pub mode: PackMode,
    /// Absolute source directory at embed time
    pub source_root: PathBuf,
    /// Directories, sorted by logical path
    pub directories: Vec<DirRecord>,
}

impl Artifact {
    /// Creates an empty artifact.
    #[must_use]
    pub fn new(name: impl Into<String>, mode: PackMode, source_root: impl Into<PathBuf>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            name: name.into(),
            mode,
            source_root: source_root.into(),
            directories: Vec::new(),
        }
    }

    /// Number of directories.
    #[must_use]
    pub fn dir_count(&self) -> usize {
        self.directories.len()
    }

    /// Number of files across all directories.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.directories.iter().map(|dir| dir.files.len()).sum()
    }

    /// Directory record for a logical path.
    #[must_use]
    pub fn directory(&self, logical_path: &str) -> Option<&DirRecord> {
        let normalized = path::normalize(logical_path);
        self.directories
            .iter()
            .find(|dir| dir.logical_path == normalized)
    }

    /// Serializes to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::Artifact`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| EmbedError::Artifact {
            reason: e.to_string(),
        })
    }

    /// Parses an artifact from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::Artifact`] if the JSON is malformed, a payload
    /// literal is invalid, or the layout version is unsupported.
    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: Self = serde_json::from_str(json).map_err(|e| EmbedError::Artifact {
            reason: e.to_string(),
        })?;

        if artifact.format_version != FORMAT_VERSION {
            return Err(EmbedError::Artifact {
                reason: format!(
                    "unsupported format version {} (expected {FORMAT_VERSION})",
                    artifact.format_version
                ),
            });
        }

        Ok(artifact)
    }

    /// Rebuilds the virtual filesystem described by this artifact.
    ///
    /// Files with a payload are served from memory and cache their first
    /// read. Files without one read from `source_root` on every call.
    #[must_use]
    pub fn to_vfs(&self) -> VirtualFs {
        let vfs = VirtualFs::new();

        for record in &self.directories {
            let dir = VirtualDir::new(
                &record.logical_path,
                &record.shadow_path,
                &record.absolute_path,
                record.root,
            );

            for file in &record.files {
                let base = VirtualFile::new(path::join(&record.logical_path, &file.name), &file.shadow_path)
                    .with_base_dir(&self.source_root)
                    .with_size(file.declared_size)
                    .with_decompress(file.decompress);

                let file = match &file.payload {
                    Some(payload) => base.with_data_pack(DataPack::embedded(payload.clone())),
                    None => base.with_cache(false).with_data_pack(DataPack::from_disk()),
                };
                dir.add_file(file);
            }

            vfs.register(dir);
        }

        for record in &self.directories {
            if let Some(dir) = vfs.dir(&record.logical_path) {
                for child in &record.children {
                    dir.add_directory(child.name.clone(), vfs.link(&child.logical_path));
                }
            }
        }

        debug!(
            name = %self.name,
            directories = self.dir_count(),
            files = self.file_count(),
            "Loaded artifact into virtual filesystem"
        );

        vfs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack;

    fn sample() -> Artifact {
        let mut artifact = Artifact::new("assets", PackMode::Production, "/src");
        let packed = pack::pack_bytes(b"hello", PackMode::Production).unwrap();
        artifact.directories.push(DirRecord {
            logical_path: ".".to_string(),
            shadow_path: ".".to_string(),
            absolute_path: PathBuf::from("/src"),
            root: true,
            children: vec![ChildLink {
                name: "docs".to_string(),
                logical_path: "docs".to_string(),
            }],
            files: Vec::new(),
        });
        artifact.directories.push(DirRecord {
            logical_path: "docs".to_string(),
            shadow_path: "docs".to_string(),
            absolute_path: PathBuf::from("/src/docs"),
            root: false,
            children: Vec::new(),
            files: vec![FileRecord {
                name: "readme.md".to_string(),
                real_path: PathBuf::from("/src/docs/readme.md"),
                shadow_path: "docs/readme.md".to_string(),
                declared_size: packed.declared_size,
                decompress: packed.decompress,
                payload: packed.payload,
            }],
        });
        artifact
    }

    #[test]
    fn test_json_round_trip() {
        let artifact = sample();
        let json = artifact.to_json().unwrap();
        assert_eq!(Artifact::from_json(&json).unwrap(), artifact);
    }

    #[test]
    fn test_to_vfs_serves_payload() {
        let vfs = sample().to_vfs();
        let file = vfs.get_file("docs/readme.md").unwrap();

        assert!(file.decompress());
        assert_eq!(&*file.data().unwrap(), b"hello");
        assert_eq!(file.size(), 5);
        assert_eq!(file.real_path(), PathBuf::from("/src/docs/readme.md"));
    }

    #[test]
    fn test_counts_and_directory_lookup() {
        let artifact = sample();
        assert_eq!(artifact.dir_count(), 2);
        assert_eq!(artifact.file_count(), 1);
        assert!(artifact.directory("/docs/").is_some());
        assert!(artifact.directory("missing").is_none());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut artifact = sample();
        artifact.format_version = 99;
        let json = serde_json::to_string(&artifact).unwrap();
        assert!(matches!(
            Artifact::from_json(&json),
            Err(EmbedError::Artifact { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_literal() {
        let json = sample().to_json().unwrap();
        let start = json.find("\"payload\": \"").unwrap() + "\"payload\": \"".len();
        let mut broken = json.clone();
        broken.insert_str(start, "\\\\q");
        assert!(Artifact::from_json(&broken).is_err());
    }
}
