//! Output formatting for CLI commands.

use crate::cli::OutputFormat;
use anyhow::Result;
use serde::Serialize;

/// Command output that can be rendered for humans.
pub trait Render: Serialize {
    /// Human-readable rendering.
    fn pretty(&self) -> String;
}

/// Formats command output according to the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Examples
///
/// ```
/// use embedfs_cli::cli::OutputFormat;
/// use embedfs_cli::formatters::{Render, format_output};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Count {
///     files: usize,
/// }
///
/// impl Render for Count {
///     fn pretty(&self) -> String {
///         format!("{} files", self.files)
///     }
/// }
///
/// let out = format_output(&Count { files: 3 }, OutputFormat::Json)?;
/// assert!(out.contains("\"files\": 3"));
/// assert_eq!(format_output(&Count { files: 3 }, OutputFormat::Pretty)?, "3 files");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn format_output<T: Render>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::Pretty => Ok(data.pretty()),
    }
}

/// Formats a byte count with a binary unit.
#[must_use]
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024 && unit < UNITS.len() - 1 {
        value /= 1024;
        unit += 1;
    }
    format!("{value} {}", UNITS[unit])
}
