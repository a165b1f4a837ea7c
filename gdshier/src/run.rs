//!
//! # Hierarchy Report Orchestration
//! The core logic of the `gdshier` program, usable without its command-line interface.
//!

// Std-Lib Imports
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

// Crates.io
use chrono::{Local, NaiveDateTime};
use log::info;

// Workspace Imports
use gdsio::GdsLibrary;

// Local Imports
use crate::error::{HierError, HierResult};
use crate::hierarchy::HierarchyMap;
use crate::ser::SerializationFormat;
use crate::tree::{LineSink, TreePrinter, WriteSink};

/// Default number of hierarchy levels printed
pub const DEFAULT_DEPTH: usize = 5;
/// First line of every report
pub const REPORT_HEADER: &str = "Hierarchy:";

/// # Hierarchy Report Options
///
/// Awfully similar to the CLI's `ProgramOptions`,
/// without the `clap` annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierOptions {
    /// GDS Input File
    pub gds: PathBuf,
    /// Top-Level Cell Name
    pub top: String,
    /// Number of hierarchy levels to print, including the top cell
    pub depth: usize,
    /// Report path. If [None], a timestamped name in `out_dir`.
    pub out: Option<PathBuf>,
    /// Directory for timestamped reports. Empty for the working directory.
    pub out_dir: PathBuf,
    /// Path for a JSON or YAML dump of the [HierarchyMap], if any
    pub dump: Option<PathBuf>,
}
impl HierOptions {
    /// Create options for reading `gds` from top cell `top`, with all other settings at their defaults
    pub fn new(gds: impl Into<PathBuf>, top: impl Into<String>) -> Self {
        Self {
            gds: gds.into(),
            top: top.into(),
            depth: DEFAULT_DEPTH,
            out: None,
            out_dir: PathBuf::new(),
            dump: None,
        }
    }
}

/// Report file name for time `now`, e.g. `hierarchy_20240131_235959.txt`
pub fn report_filename(now: NaiveDateTime) -> String {
    format!("hierarchy_{}.txt", now.format("%Y%m%d_%H%M%S"))
}

/// Write the full report for `top` to `sink`: the header line, the top cell, and the tree below it.
pub fn write_report(
    map: &HierarchyMap,
    top: &str,
    depth: usize,
    sink: &mut impl LineSink,
) -> io::Result<()> {
    sink.line(REPORT_HEADER)?;
    TreePrinter::new(map, depth).print_tree(top, sink)
}

/// Write the report for `top` to a new file at `path`
fn save_report(map: &HierarchyMap, top: &str, depth: usize, path: &Path) -> HierResult<()> {
    let mut sink = WriteSink(BufWriter::new(File::create(path)?));
    write_report(map, top, depth, &mut sink)?;
    sink.0.flush()?;
    Ok(())
}

/// Check `map` defines `top`, and `depth` is in range
pub fn check(map: &HierarchyMap, top: &str, depth: usize) -> HierResult<()> {
    if depth < 1 {
        return Err(HierError::InvalidDepth(depth));
    }
    if !map.contains(top) {
        return Err(HierError::UnknownTopCell(top.to_string()));
    }
    Ok(())
}

/// Primary entry point.
/// Reads the GDS library, extracts its [HierarchyMap], and writes the report (and optional dump).
/// Returns the report's path.
/// No files are created if the top cell is not found, or the dump format is unknown.
pub fn run(options: &HierOptions) -> HierResult<PathBuf> {
    let lib = GdsLibrary::open(&options.gds)?;
    info!("Read {:?}: {:?}", options.gds, lib.stats());

    let map = HierarchyMap::from_gds(&lib);
    info!("Hierarchy: {:?}", map.stats());
    check(&map, &options.top, options.depth)?;
    let dump = match &options.dump {
        Some(path) => Some((SerializationFormat::from_path(path)?, path)),
        None => None,
    };

    let path = match &options.out {
        Some(out) => out.clone(),
        None => options
            .out_dir
            .join(report_filename(Local::now().naive_local())),
    };
    save_report(&map, &options.top, options.depth, &path)?;
    info!("Wrote {:?}", path);

    if let Some((fmt, dump)) = dump {
        fmt.save(&map, dump)?;
        info!("Wrote {:?}", dump);
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn report_filenames() {
        let now = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(23, 59, 8)
            .unwrap();
        assert_eq!(report_filename(now), "hierarchy_20240131_235908.txt");
    }
    #[test]
    fn default_options() {
        let options = HierOptions::new("a.gds", "top");
        assert_eq!(options.depth, 5);
        assert_eq!(options.out_dir, PathBuf::new());
        assert!(options.out.is_none() && options.dump.is_none());
    }
    #[test]
    fn checks() {
        let map: HierarchyMap = vec![("top".to_string(), Vec::new())].into_iter().collect();
        assert!(check(&map, "top", 1).is_ok());
        assert!(matches!(
            check(&map, "other", 5),
            Err(HierError::UnknownTopCell(ref s)) if s == "other"
        ));
        assert!(matches!(
            check(&map, "top", 0),
            Err(HierError::InvalidDepth(0))
        ));
    }
}
