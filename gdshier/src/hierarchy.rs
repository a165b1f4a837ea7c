//!
//! # Cell Hierarchy Extraction
//!
//! Flattens a [GdsLibrary] into a [HierarchyMap]:
//! for each cell, the ordered list of [Instance]s it contains.
//!

// Std-Lib Imports
use std::collections::HashSet;

// Crates.io
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

// Workspace Imports
use gdsio::GdsLibrary;

/// Cell name recorded for references whose target the library does not define.
/// A real cell of the same name is indistinguishable from a dangling reference.
pub const UNKNOWN_CELL: &str = "UNKNOWN";

/// # Instance
/// One placement of `cell`, labeled `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Instance Label
    pub name: String,
    /// Referenced Cell Name
    pub cell: String,
}
impl Instance {
    /// Create a new [Instance]
    pub fn new(name: impl Into<String>, cell: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cell: cell.into(),
        }
    }
}

///
/// # Hierarchy Map
///
/// Mapping from each cell name to the [Instance]s it contains, in reference order.
/// Every cell defined in the source library is a key, including those with no instances.
/// Cell names which are not keys are leaves.
///
/// Keys iterate in library order.
///
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HierarchyMap {
    cells: IndexMap<String, Vec<Instance>>,
}
impl HierarchyMap {
    /// Extract the [HierarchyMap] of [GdsLibrary] `lib`.
    ///
    /// Instance labels are each reference's instance-name property where present,
    /// and otherwise `<parent>_inst<n>` for the reference's 1-based position `n` in its parent.
    /// References to cells `lib` does not define are recorded as [UNKNOWN_CELL].
    pub fn from_gds(lib: &GdsLibrary) -> Self {
        let defined: HashSet<&str> = lib.structs.iter().map(|s| s.name.as_str()).collect();
        let mut cells = IndexMap::with_capacity(lib.structs.len());
        for strukt in lib.structs.iter() {
            let mut insts = Vec::with_capacity(strukt.refs.len());
            for (num, r) in strukt.refs.iter().enumerate() {
                let name = match r.inst_name() {
                    Some(name) => name.to_string(),
                    None => format!("{}_inst{}", strukt.name, num + 1),
                };
                let cell = if defined.contains(r.name.as_str()) {
                    r.name.clone()
                } else {
                    warn!(
                        "Cell {:?} instance {:?} references undefined cell {:?}",
                        strukt.name, name, r.name
                    );
                    UNKNOWN_CELL.to_string()
                };
                insts.push(Instance { name, cell });
            }
            if cells.insert(strukt.name.clone(), insts).is_some() {
                warn!("Duplicate definitions of cell {:?}; keeping the last", strukt.name);
            }
        }
        debug!("Extracted hierarchy of {} cells", cells.len());
        Self { cells }
    }
    /// Boolean indication of whether `cell` is a key
    pub fn contains(&self, cell: &str) -> bool {
        self.cells.contains_key(cell)
    }
    /// Get the instances of `cell`, or [None] if it is not a key
    pub fn instances(&self, cell: &str) -> Option<&[Instance]> {
        self.cells.get(cell).map(Vec::as_slice)
    }
    /// Iterate over all cell names, in library order
    pub fn cells(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }
    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }
    /// Boolean indication of an empty map
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
    /// Collect summary statistics
    pub fn stats(&self) -> HierStats {
        let mut stats = HierStats {
            cells: self.cells.len(),
            ..Default::default()
        };
        for inst in self.cells.values().flatten() {
            stats.instances += 1;
            if inst.cell == UNKNOWN_CELL {
                stats.unknown += 1;
            }
        }
        stats
    }
}
impl FromIterator<(String, Vec<Instance>)> for HierarchyMap {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Instance>)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

/// # Hierarchy Summary Stats
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HierStats {
    /// Cells (map keys)
    pub cells: usize,
    /// Instances, across all cells
    pub instances: usize,
    /// Instances of [UNKNOWN_CELL]
    pub unknown: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdsio::{GdsRef, GdsStruct, INST_NAME_ATTR};

    /// Library with cells `top`, `mid`, `leaf`, and `empty`
    fn lib() -> GdsLibrary {
        let mut lib = GdsLibrary::new("lib");
        let mut top = GdsStruct::new("top");
        top.refs.push(GdsRef::new("mid"));
        top.refs.push(GdsRef::new("leaf").with_property(INST_NAME_ATTR, "xleaf"));
        top.refs.push(GdsRef::array("mid", 2, 2));
        let mut mid = GdsStruct::new("mid");
        mid.refs.push(GdsRef::new("leaf"));
        mid.refs.push(GdsRef::new("missing"));
        lib.structs.push(top);
        lib.structs.push(mid);
        lib.structs.push(GdsStruct::new("leaf"));
        lib.structs.push(GdsStruct::new("empty"));
        lib
    }

    #[test]
    fn every_cell_is_a_key() {
        let map = HierarchyMap::from_gds(&lib());
        assert_eq!(map.len(), 4);
        let cells: Vec<&str> = map.cells().collect();
        assert_eq!(cells, vec!["top", "mid", "leaf", "empty"]);
        assert_eq!(map.instances("empty"), Some(&[][..]));
        assert_eq!(map.instances("leaf"), Some(&[][..]));
        assert_eq!(map.instances("nope"), None);
    }
    #[test]
    fn it_labels_instances() {
        let map = HierarchyMap::from_gds(&lib());
        assert_eq!(
            map.instances("top").unwrap(),
            &[
                Instance::new("top_inst1", "mid"),
                Instance::new("xleaf", "leaf"),
                Instance::new("top_inst3", "mid"),
            ]
        );
    }
    #[test]
    fn it_marks_dangling_references() {
        let map = HierarchyMap::from_gds(&lib());
        assert_eq!(
            map.instances("mid").unwrap(),
            &[
                Instance::new("mid_inst1", "leaf"),
                Instance::new("mid_inst2", UNKNOWN_CELL),
            ]
        );
        assert!(!map.contains(UNKNOWN_CELL));
        assert_eq!(
            map.stats(),
            HierStats {
                cells: 4,
                instances: 5,
                unknown: 1,
            }
        );
    }
    #[test]
    fn it_keeps_duplicate_references() {
        let mut lib = GdsLibrary::new("lib");
        let mut a = GdsStruct::new("a");
        for _ in 0..3 {
            a.refs.push(GdsRef::new("b"));
        }
        lib.structs.push(a);
        lib.structs.push(GdsStruct::new("b"));
        let map = HierarchyMap::from_gds(&lib);
        let names: Vec<&str> = map
            .instances("a")
            .unwrap()
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, vec!["a_inst1", "a_inst2", "a_inst3"]);
    }
    #[test]
    fn empty_library() {
        let map = HierarchyMap::from_gds(&GdsLibrary::new("nothing"));
        assert!(map.is_empty());
        assert_eq!(map.stats(), HierStats::default());
    }
}
