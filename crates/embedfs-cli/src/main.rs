//! embedfs CLI.
//!
//! Command-line interface for scanning directories, embedding them into
//! JSON artifacts, and reading files back out.
//!
//! # Architecture
//!
//! The CLI is organized around subcommands:
//! - `scan` - List the logical layout of a directory
//! - `embed` - Pack a directory into an artifact
//! - `cat` - Print one file from an artifact
//! - `assets` - Print the flat asset index of a directory
//!
//! # Examples
//!
//! ```bash
//! # Embed ./web in production mode under the "static" prefix
//! embedfs embed ./web --mode prod --mount static --out web.json
//!
//! # Read a file back
//! embedfs cat web.json static/index.html
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use embedfs::PackMode;
use embedfs_cli::cli::{ExitCode, OutputFormat};
use embedfs_cli::commands;
use embedfs_cli::commands::embed::EmbedArgs;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// embedfs - embed directory trees into self-contained artifacts.
#[derive(Parser, Debug)]
#[command(name = "embedfs")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (json, pretty)
    #[arg(long = "format", global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a directory and list its directories and files.
    Scan {
        /// Directory to scan
        dir: PathBuf,

        /// Skip paths containing this substring
        #[arg(long, num_args = 1)]
        skip: Vec<String>,

        /// Maximum concurrent listing tasks
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Embed a directory into a JSON artifact.
    ///
    /// Files that fail to pack are reported and left out; the command
    /// still succeeds.
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Use settings from a config file, overriding the mode
    /// embedfs embed --config embedfs.toml --mode prod-raw
    /// ```
    Embed {
        /// Directory to embed (default: config `input_dir`, else ".")
        dir: Option<PathBuf>,

        /// TOML config file
        #[arg(short, long, env = "EMBEDFS_CONFIG")]
        config: Option<PathBuf>,

        /// Pack mode (dev, prod, prod-raw, linked)
        #[arg(short, long)]
        mode: Option<PackMode>,

        /// Artifact output path
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Logical prefix for every embedded path
        #[arg(long)]
        mount: Option<String>,

        /// Skip paths containing this substring
        #[arg(long, num_args = 1)]
        skip: Vec<String>,

        /// Maximum concurrent listing tasks
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Print one file from an artifact to stdout.
    Cat {
        /// Artifact path
        artifact: PathBuf,

        /// Logical path of the file
        path: String,
    },

    /// Print the flat asset index of a directory.
    Assets {
        /// Directory to index
        dir: PathBuf,

        /// Only include files with this extension
        #[arg(long = "ext", num_args = 1)]
        extensions: Vec<String>,

        /// Skip paths containing this substring
        #[arg(long, num_args = 1)]
        skip: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let exit_code = execute_command(cli.command, cli.format)?;

    std::process::exit(exit_code.as_i32());
}

/// Initializes logging infrastructure.
///
/// `--verbose` forces debug level; otherwise `RUST_LOG` applies, falling
/// back to info. Logs go to stderr so command output stays clean.
///
/// # Errors
///
/// Returns an error if logging initialization fails.
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}

/// Executes the specified CLI command.
///
/// # Errors
///
/// Returns an error if command execution fails.
fn execute_command(command: Commands, output_format: OutputFormat) -> Result<ExitCode> {
    match command {
        Commands::Scan { dir, skip, workers } => {
            commands::scan::run(dir, skip, workers, output_format)
        }
        Commands::Embed {
            dir,
            config,
            mode,
            out,
            mount,
            skip,
            workers,
        } => {
            let args = EmbedArgs {
                dir,
                config,
                mode,
                out,
                mount,
                skip,
                workers,
            };
            commands::embed::run(&args, output_format)
        }
        Commands::Cat { artifact, path } => commands::cat::run(&artifact, &path),
        Commands::Assets {
            dir,
            extensions,
            skip,
        } => commands::assets::run(dir, extensions, skip, output_format),
    }
}
