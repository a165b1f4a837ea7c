//!
//! # Gdshier Command-Line Interface
//!
//! Reads a GDSII file and writes the instance hierarchy below a top cell to a text report.
//!

// Std-Lib Imports
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

// Crates.io
use anyhow::Context;
use clap::Parser;
use log::LevelFilter;

// Use our own crate, by name
use gdshier::{run, HierError, HierOptions, DEFAULT_DEPTH};

// => The doc-comment on `ProgramOptions` here is displayed by the `clap`-generated help docs =>

/// GDSII Cell Hierarchy Printer
/// Writes the instance tree below `--top` to `hierarchy_YYYYMMDD_HHMMSS.txt`.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct ProgramOptions {
    /// GDS Input File
    pub gds: PathBuf,
    /// Top-Level Cell Name
    #[arg(long)]
    pub top: String,
    /// Number of hierarchy levels to print, including the top cell
    #[arg(long, default_value_t = DEFAULT_DEPTH as u32, value_parser = clap::value_parser!(u32).range(1..))]
    pub depth: u32,
    /// Report file. Defaults to a timestamped name in `--out-dir`.
    #[arg(short = 'o', long)]
    pub out: Option<PathBuf>,
    /// Directory for timestamped reports. Defaults to the working directory.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
    /// Also dump the cell hierarchy to this JSON or YAML file, per its extension
    #[arg(long)]
    pub dump: Option<PathBuf>,
    /// Log level. One of (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl From<ProgramOptions> for HierOptions {
    /// Convert into the [`HierOptions`] struct.
    fn from(opts: ProgramOptions) -> Self {
        HierOptions {
            gds: opts.gds,
            top: opts.top,
            depth: opts.depth as usize,
            out: opts.out,
            out_dir: opts.out_dir.unwrap_or_default(),
            dump: opts.dump,
        }
    }
}

/// Main entry point.
/// Parses the command-line arguments, sets up logging, and calls [`gdshier::run`].
fn main() -> anyhow::Result<ExitCode> {
    let options = ProgramOptions::parse();
    let level = LevelFilter::from_str(&options.log_level)
        .with_context(|| format!("Invalid log level {:?}", options.log_level))?;
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(level)
        .init();
    Ok(ExitCode::from(_main(options.into())?))
}

/// Run with `options`, returning the process exit status
fn _main(options: HierOptions) -> anyhow::Result<u8> {
    match run(&options) {
        Ok(path) => {
            println!("Hierarchy saved to {}", path.display());
            Ok(0)
        }
        Err(HierError::UnknownTopCell(top)) => {
            println!("Error: Top cell '{}' not found in the GDS file.", top);
            Ok(1)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to process {:?}", options.gds)),
    }
}
