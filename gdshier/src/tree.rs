//!
//! # Hierarchy Tree Printing
//!
//! Depth-first, depth-bounded rendering of a [HierarchyMap] as indented text:
//!
//! ```text
//! top
//!     |- mid (top_inst1)
//!         |- leaf (mid_inst1)
//!         |- top (mid_inst2) (cycle detected)
//! ```
//!

// Std-Lib Imports
use std::io::{self, Write};
use std::rc::Rc;

// Local Imports
use crate::hierarchy::HierarchyMap;

/// Indentation added per level of depth
pub const INDENT: &str = "    ";

/// # Line Sink
/// Destination for printed lines, one at a time.
pub trait LineSink {
    /// Append `line`. Implementers supply any line terminator.
    fn line(&mut self, line: &str) -> io::Result<()>;
}
/// Collect lines in memory
impl LineSink for Vec<String> {
    fn line(&mut self, line: &str) -> io::Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}
/// # Write Sink
/// Adapts any [Write] into a [LineSink], newline-terminating each line.
pub struct WriteSink<W: Write>(pub W);
impl<W: Write> LineSink for WriteSink<W> {
    fn line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.0, "{}", line)
    }
}

///
/// # Ancestor Path
///
/// Persistent list of the cell names from the root to the current node.
/// Extending a path with [Ancestors::with] shares, and never modifies, the existing tail,
/// so sibling branches never observe each other's entries.
///
#[derive(Debug, Clone, Default)]
pub struct Ancestors<'a>(Option<Rc<Link<'a>>>);
#[derive(Debug)]
struct Link<'a> {
    cell: &'a str,
    parent: Ancestors<'a>,
}
impl<'a> Ancestors<'a> {
    /// Create an empty path
    pub fn new() -> Self {
        Self(None)
    }
    /// Create a new path of `self` extended by `cell`
    pub fn with(&self, cell: &'a str) -> Self {
        Self(Some(Rc::new(Link {
            cell,
            parent: self.clone(),
        })))
    }
    /// Boolean indication of whether `cell` is on the path
    pub fn contains(&self, cell: &str) -> bool {
        let mut node = &self.0;
        while let Some(link) = node {
            if link.cell == cell {
                return true;
            }
            node = &link.parent.0;
        }
        false
    }
}

/// Pending traversal work
enum Frame<'a> {
    /// Print `cell` and push its children
    Visit {
        cell: &'a str,
        depth: usize,
        label: Option<&'a str>,
        ancestors: Ancestors<'a>,
    },
    /// Print the cycle-marker line for `cell`
    Cycle {
        cell: &'a str,
        depth: usize,
        label: &'a str,
    },
}

///
/// # Tree Printer
///
/// Prints the instance tree below a cell, one line per visited node, depth-first and in instance order.
/// Nothing is printed past `max_depth`.
/// Reaching a cell already on the current path prints a `(cycle detected)` line in its place,
/// without descending into it.
/// Cells reachable along several paths are printed once per path.
///
pub struct TreePrinter<'m> {
    map: &'m HierarchyMap,
    max_depth: usize,
}
impl<'m> TreePrinter<'m> {
    /// Create a new [TreePrinter]
    pub fn new(map: &'m HierarchyMap, max_depth: usize) -> Self {
        Self { map, max_depth }
    }
    /// Print the full tree for `root`: its name, then the subtree of each of its instances, starting at depth two.
    pub fn print_tree<'a>(&self, root: &'a str, sink: &mut impl LineSink) -> io::Result<()>
    where
        'm: 'a,
    {
        sink.line(root)?;
        if let Some(insts) = self.map.instances(root) {
            let ancestors = Ancestors::new().with(root);
            for inst in insts {
                self.print(&inst.cell, 2, &ancestors, Some(&inst.name), sink)?;
            }
        }
        Ok(())
    }
    /// Print `cell`, reached via instance `label` at `depth`, and everything below it.
    /// `ancestors` holds the cells on the path above `cell`.
    pub fn print<'a>(
        &self,
        cell: &'a str,
        depth: usize,
        ancestors: &Ancestors<'a>,
        label: Option<&'a str>,
        sink: &mut impl LineSink,
    ) -> io::Result<()>
    where
        'm: 'a,
    {
        let mut stack = vec![Frame::Visit {
            cell,
            depth,
            label,
            ancestors: ancestors.clone(),
        }];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Cycle { cell, depth, label } => {
                    let indent = INDENT.repeat(depth - 1);
                    sink.line(&format!("{}|- {} ({}) (cycle detected)", indent, cell, label))?;
                }
                Frame::Visit {
                    cell,
                    depth,
                    label,
                    ancestors,
                } => {
                    if depth > self.max_depth {
                        continue;
                    }
                    sink.line(&Self::format_line(cell, depth, label))?;

                    let insts = match self.map.instances(cell) {
                        Some(insts) => insts,
                        None => continue, // Leaf
                    };
                    let branch = ancestors.with(cell);
                    // Push in reverse, so children pop in instance order
                    for inst in insts.iter().rev() {
                        if branch.contains(&inst.cell) {
                            if depth < self.max_depth {
                                stack.push(Frame::Cycle {
                                    cell: &inst.cell,
                                    depth: depth + 1,
                                    label: &inst.name,
                                });
                            }
                        } else {
                            stack.push(Frame::Visit {
                                cell: &inst.cell,
                                depth: depth + 1,
                                label: Some(&inst.name),
                                ancestors: branch.clone(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
    /// Format the line for `cell` at `depth`
    fn format_line(cell: &str, depth: usize, label: Option<&str>) -> String {
        let indent = INDENT.repeat(depth.saturating_sub(1));
        match label {
            Some(label) => format!("{}|- {} ({})", indent, cell, label),
            None if depth <= 1 => format!("{}{}", indent, cell),
            None => format!("{}|- {}", indent, cell),
        }
    }
}
