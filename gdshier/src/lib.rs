//!
//! # Gdshier
//!
//! Extracts the cell hierarchy of a GDSII library and prints it as an indented tree.
//!
//! Each cell's instances are labeled by their instance-name property where present,
//! or `<parent>_inst<n>` otherwise.
//! Printing is depth-first, bounded by a maximum depth, and marks cyclic instances rather than following them.
//!
//! ```
//! use gdshier::{write_report, HierarchyMap, Instance};
//! let map: HierarchyMap = vec![
//!     ("top".to_string(), vec![Instance::new("top_inst1", "leaf")]),
//!     ("leaf".to_string(), vec![]),
//! ]
//! .into_iter()
//! .collect();
//! let mut lines: Vec<String> = Vec::new();
//! write_report(&map, "top", 5, &mut lines).unwrap();
//! assert_eq!(lines, vec!["Hierarchy:", "top", "    |- leaf (top_inst1)"]);
//! ```
//!

pub mod error;
pub use error::*;
pub mod hierarchy;
pub use hierarchy::*;
pub mod run;
pub use run::*;
pub mod ser;
pub use ser::SerializationFormat;
pub mod tree;
pub use tree::*;
