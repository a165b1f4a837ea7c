//!
//! # Gdsio GDSII Stream Reader & Writer
//!
//! GDSII is the IC industry's de facto standard for storing and sharing layout data.
//! Gdsio reads and writes the parts of a GDSII stream which describe *hierarchy*:
//! the library, its cell definitions (GDSII "structs"), and the references by which cells instantiate one another.
//! Geometric content (boundaries, paths, text, nodes, boxes) is recognized and skipped over,
//! and only counted for summary statistics.
//!
//! Layout data is represented in two forms:
//!
//! * A short tree with three layers:
//!   * The root is a [GdsLibrary], which primarily consists of a set of cells ([GdsStruct]s).
//!     Each [GdsLibrary] is a universe unto itself; references to cells it does not define are *dangling*.
//!   * Each [GdsStruct] holds its ordered list of references ([GdsRef]s) to other cells.
//!   * Each [GdsRef] names its target cell, and carries any attached [GdsProperty]s.
//! * For storage on disk, the tree is flattened to a series of [GdsRecord]s,
//!   each of which is binary-encoded with a four-byte header.
//!
//! ## Usage
//!
//! Loading a [GdsLibrary] from disk:
//!
//! ```skip
//! let lib = gdsio::GdsLibrary::open("sample.gds")?;
//! ```
//!
//! Creating a new [GdsLibrary] with one cell instantiating another:
//!
//! ```
//! use gdsio::{GdsLibrary, GdsRef, GdsStruct};
//! let mut lib = GdsLibrary::new("mylib");
//! let mut top = GdsStruct::new("top");
//! top.refs.push(GdsRef::new("leaf"));
//! lib.structs.push(top);
//! lib.structs.push(GdsStruct::new("leaf"));
//! assert_eq!(lib.stats().struct_refs, 1);
//! ```
//!

pub mod data;
pub use data::*;

pub mod error;
pub use error::*;

pub mod read;
pub use read::*;

pub mod write;
pub use write::*;

#[cfg(test)]
mod tests;
