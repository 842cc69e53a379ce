//! Embed command implementation.
//!
//! Scans a directory, packs every file, and writes the JSON artifact.
//! Settings come from an optional TOML config file; command-line flags
//! override it.

use crate::cli::{ExitCode, OutputFormat};
use crate::formatters::{Render, format_output, human_bytes};
use anyhow::{Context, Result};
use embedfs::{EmbedConfig, EmbedError, Embedder, PackMode, TreeBuilder};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

/// Command-line overrides for an embed run.
#[derive(Debug, Clone, Default)]
pub struct EmbedArgs {
    /// Directory to scan
    pub dir: Option<PathBuf>,
    /// TOML config file
    pub config: Option<PathBuf>,
    /// Pack mode
    pub mode: Option<PackMode>,
    /// Artifact output path
    pub out: Option<PathBuf>,
    /// Logical prefix
    pub mount: Option<String>,
    /// Extra skip patterns
    pub skip: Vec<String>,
    /// Scan concurrency cap
    pub workers: Option<usize>,
}

impl EmbedArgs {
    /// Loads the config file (or defaults) and applies the overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded.
    pub fn resolve(&self) -> Result<(EmbedConfig, PackMode)> {
        let mut config = match &self.config {
            Some(path) => EmbedConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => EmbedConfig::default(),
        };

        if let Some(dir) = &self.dir {
            config.input_dir.clone_from(dir);
        }
        if let Some(out) = &self.out {
            config.output.clone_from(out);
        }
        if self.mount.is_some() {
            config.mount.clone_from(&self.mount);
        }
        if self.workers.is_some() {
            config.max_workers = self.workers;
        }
        config.skip.extend(self.skip.iter().cloned());

        let mode = self.mode.unwrap_or_else(|| config.pack_mode());
        Ok((config, mode))
    }
}

/// Result of an embed run.
#[derive(Debug, Serialize)]
pub struct EmbedSummary {
    /// Artifact path
    pub output: PathBuf,
    /// Pack mode used
    pub mode: PackMode,
    /// Directories embedded
    pub directories: usize,
    /// Files embedded
    pub files: usize,
    /// Artifact size in bytes
    pub bytes: u64,
    /// Files left out, with the reason
    pub failures: Vec<String>,
}

impl Render for EmbedSummary {
    fn pretty(&self) -> String {
        let mut out = format!(
            "Embedded {} files in {} directories ({} mode) -> {} ({})",
            self.files,
            self.directories,
            self.mode,
            self.output.display(),
            human_bytes(self.bytes)
        );
        if !self.failures.is_empty() {
            out.push_str(&format!("\n{} files skipped:", self.failures.len()));
            for failure in &self.failures {
                out.push_str(&format!("\n  {failure}"));
            }
        }
        out
    }
}

fn is_invalid_config(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<EmbedError>(),
        Some(EmbedError::InvalidConfig { .. })
    )
}

/// Runs the embed command.
///
/// Pack failures of individual files do not change the exit code; a scan
/// failure exits with [`ExitCode::ERROR`].
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the artifact
/// cannot be written.
pub fn run(args: &EmbedArgs, output_format: OutputFormat) -> Result<ExitCode> {
    let (config, mode) = match args.resolve() {
        Ok(resolved) => resolved,
        Err(e) if is_invalid_config(&e) => {
            error!("{:#}", e);
            return Ok(ExitCode::INVALID_INPUT);
        }
        Err(e) => return Err(e),
    };
    if let Err(e) = config.validate() {
        error!("{}", e);
        return Ok(ExitCode::INVALID_INPUT);
    }

    let mut builder = TreeBuilder::new(config.policy());
    if let Some(workers) = config.max_workers {
        builder = builder.with_max_workers(workers);
    }

    let tree = match builder.build(&config.input_dir) {
        Ok(tree) => tree,
        Err(e) => {
            error!("Scan failed: {}", e);
            return Ok(ExitCode::ERROR);
        }
    };

    let report = Embedder::new(mode).with_name(&config.name).embed_tree(&tree);
    let json = report
        .artifact
        .to_json()
        .context("failed to serialize artifact")?;

    if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&config.output, &json)
        .with_context(|| format!("failed to write {}", config.output.display()))?;
    info!("Wrote artifact: {}", config.output.display());

    let summary = EmbedSummary {
        output: config.output.clone(),
        mode,
        directories: report.artifact.dir_count(),
        files: report.artifact.file_count(),
        bytes: json.len() as u64,
        failures: report.failures.iter().map(ToString::to_string).collect(),
    };
    println!("{}", format_output(&summary, output_format)?);

    Ok(ExitCode::SUCCESS)
}
