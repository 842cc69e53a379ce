//! Scan command implementation.
//!
//! Builds the tree for a directory and lists its logical layout.

use crate::cli::{ExitCode, OutputFormat};
use crate::formatters::{Render, format_output};
use anyhow::Result;
use embedfs::{PathPolicy, ScanTree, TreeBuilder};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::error;

/// One directory in the scan listing.
#[derive(Debug, Serialize)]
pub struct DirListing {
    /// Logical path
    pub logical_path: String,
    /// Physical path relative to the scan root
    pub shadow_path: String,
    /// File names, sorted
    pub files: Vec<String>,
}

/// Result of a scan.
#[derive(Debug, Serialize)]
pub struct ScanSummary {
    /// Directory that was scanned
    pub root: PathBuf,
    /// Directories sorted by logical path
    pub directories: Vec<DirListing>,
    /// Total file count
    pub file_count: usize,
}

impl ScanSummary {
    /// Collects the listing from a built tree.
    #[must_use]
    pub fn from_tree(tree: &ScanTree) -> Self {
        let directories: Vec<DirListing> = tree
            .directories()
            .iter()
            .map(|dir| DirListing {
                logical_path: dir.logical_path().to_string(),
                shadow_path: dir.shadow_path().to_string(),
                files: dir.files().into_iter().map(|(name, _)| name).collect(),
            })
            .collect();

        Self {
            root: tree.source_absolute().to_path_buf(),
            file_count: directories.iter().map(|d| d.files.len()).sum(),
            directories,
        }
    }
}

impl Render for ScanSummary {
    fn pretty(&self) -> String {
        let mut out = format!("{}\n", self.root.display());
        for dir in &self.directories {
            let _ = writeln!(out, "{}/", dir.logical_path);
            for file in &dir.files {
                let _ = writeln!(out, "  {file}");
            }
        }
        let _ = write!(
            out,
            "{} directories, {} files",
            self.directories.len(),
            self.file_count
        );
        out
    }
}

/// Runs the scan command.
///
/// # Errors
///
/// Returns an error if output formatting fails. Scan failures are reported
/// through the exit code.
pub fn run(
    dir: PathBuf,
    skip: Vec<String>,
    workers: Option<usize>,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let mut builder = TreeBuilder::new(PathPolicy::new().skip_vcs().skip_matching(skip));
    if let Some(workers) = workers {
        builder = builder.with_max_workers(workers);
    }

    let tree = match builder.build(&dir) {
        Ok(tree) => tree,
        Err(e) => {
            error!("Scan failed: {}", e);
            return Ok(ExitCode::ERROR);
        }
    };

    let summary = ScanSummary::from_tree(&tree);
    println!("{}", format_output(&summary, output_format)?);
    Ok(ExitCode::SUCCESS)
}
