//! Embed directory trees into self-contained artifacts and serve them
//! through a virtual filesystem.
//!
//! The pipeline has three stages:
//!
//! 1. [`TreeBuilder`] scans a physical directory concurrently into a
//!    [`ScanTree`], applying a [`PathPolicy`] to admit and rename entries.
//! 2. [`Embedder`] packs every file (raw, gzip, or linked) into an
//!    [`Artifact`], skipping files that fail to pack.
//! 3. [`Artifact::to_vfs`] (or [`ScanTree::to_vfs`] for live disk access)
//!    produces a [`VirtualFs`] with normalized, lazy lookups.
//!
//! # Examples
//!
//! ```no_run
//! use embedfs::{Artifact, Embedder, PackMode, PathPolicy, TreeBuilder};
//!
//! let tree = TreeBuilder::new(PathPolicy::new().skip_vcs()).build("./assets")?;
//! let report = Embedder::new(PackMode::Production).embed_tree(&tree);
//! let json = report.artifact.to_json()?;
//!
//! let vfs = Artifact::from_json(&json)?.to_vfs();
//! let readme = vfs.get_file("docs/readme.md")?;
//! println!("{}", String::from_utf8_lossy(&readme.data()?));
//! # Ok::<(), embedfs::EmbedError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod artifact;
pub mod asset_map;
pub mod builder;
pub mod config;
pub mod embed;
pub mod error;
pub mod literal;
pub mod pack;
pub mod path;
pub mod policy;
pub mod registry;
pub mod tree;
pub mod vfs;

mod lock;

pub use artifact::{Artifact, ChildLink, DirRecord, FileRecord};
pub use asset_map::{AssetFilter, AssetMap};
pub use builder::TreeBuilder;
pub use config::EmbedConfig;
pub use embed::{EmbedReport, Embedder};
pub use error::{EmbedError, Result};
pub use pack::PackMode;
pub use policy::PathPolicy;
pub use registry::SharedRegistry;
pub use tree::{DirNode, ScanStats, ScanTree};
pub use vfs::{DataPack, DirResolver, VirtualDir, VirtualFile, VirtualFs};
