//! Assets command implementation.
//!
//! Prints the flat relative path → file index of a directory.

use crate::cli::{ExitCode, OutputFormat};
use crate::formatters::{Render, format_output};
use anyhow::Result;
use embedfs::{AssetFilter, AssetMap};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::error;

/// Asset map listing.
#[derive(Debug, Serialize)]
pub struct AssetListing {
    /// Root directory
    pub root: PathBuf,
    /// Relative path → absolute path
    pub assets: BTreeMap<String, PathBuf>,
}

impl Render for AssetListing {
    fn pretty(&self) -> String {
        let width = self.assets.keys().map(String::len).max().unwrap_or(0);
        let mut lines: Vec<String> = self
            .assets
            .iter()
            .map(|(key, file)| format!("{key:<width$}  {}", file.display()))
            .collect();
        lines.push(format!("{} assets under {}", self.assets.len(), self.root.display()));
        lines.join("\n")
    }
}

/// Runs the assets command.
///
/// # Errors
///
/// Returns an error if output formatting fails.
pub fn run(
    dir: PathBuf,
    extensions: Vec<String>,
    skip: Vec<String>,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let filter = AssetFilter::new().with_extensions(extensions).with_skip(skip);
    let assets = match AssetMap::scan(&dir, filter) {
        Ok(assets) => assets,
        Err(e) => {
            error!("Failed to index {}: {}", dir.display(), e);
            return Ok(ExitCode::ERROR);
        }
    };

    let listing = AssetListing {
        root: assets.root().to_path_buf(),
        assets: assets
            .iter()
            .map(|(key, file)| (key.to_string(), file.to_path_buf()))
            .collect(),
    };
    println!("{}", format_output(&listing, output_format)?);
    Ok(ExitCode::SUCCESS)
}
