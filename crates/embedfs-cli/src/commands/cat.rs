//! Cat command implementation.
//!
//! Loads an artifact and writes one file's bytes to stdout.

use crate::cli::ExitCode;
use anyhow::{Context, Result};
use embedfs::Artifact;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::error;

/// Reads `logical_path` out of the artifact at `artifact_path`.
///
/// # Errors
///
/// Returns an error if the artifact cannot be read or parsed, or the file
/// is missing from it or cannot be decoded.
pub fn read(artifact_path: &Path, logical_path: &str) -> Result<Vec<u8>> {
    let json = fs::read_to_string(artifact_path)
        .with_context(|| format!("failed to read {}", artifact_path.display()))?;
    let vfs = Artifact::from_json(&json)
        .with_context(|| format!("failed to parse {}", artifact_path.display()))?
        .to_vfs();

    let file = vfs.get_file(logical_path)?;
    let data = file
        .data()
        .with_context(|| format!("failed to read {logical_path} from artifact"))?;
    Ok(data.to_vec())
}

/// Runs the cat command.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn run(artifact_path: &Path, logical_path: &str) -> Result<ExitCode> {
    let bytes = match read(artifact_path, logical_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("{:#}", e);
            return Ok(ExitCode::ERROR);
        }
    };

    let mut stdout = io::stdout().lock();
    stdout.write_all(&bytes).context("failed to write to stdout")?;
    stdout.flush().context("failed to flush stdout")?;
    Ok(ExitCode::SUCCESS)
}
