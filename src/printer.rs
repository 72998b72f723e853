//! Serialize a hierarchy as a nested JS object literal bound to a variable.
//!
//! Output shape (two-space indentation):
//!
//! const data = {
//!   name: "$",
//!   children: [
//!     {
//!       name: "Run build",
//!       children: [
//!         {
//!           name: "Load configuration cache state",
//!           value: 2
//!         }
//!       ]
//!     }
//!   ]
//! }
//!
//! Below the top level, children with a zero value are elided. A node carries a
//! `value` only when none of its children were printed.

use crate::hierarchy::{Hierarchy, Operation, OperationId};

use std::io::{self, Write};

/// Name of the synthetic node whose children are the hierarchy roots.
pub const ROOT_NAME: &str = "$";

#[derive(Debug, Clone)]
pub struct PrintOptions {
    /// Variable the literal is assigned to.
    pub variable: String,
    /// Deepest level printed, roots being level 1. Nodes at the limit are
    /// printed as leaves.
    pub max_depth: Option<usize>,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            variable: "data".to_string(),
            max_depth: None,
        }
    }
}

/// An operation whose children are still being printed.
struct Frame<'a> {
    op: &'a Operation,
    depth: usize,
    children: &'a [OperationId],
    next: usize,
    has_child_with_value: bool,
}

pub struct HierarchyPrinter<'a, W: Write> {
    hierarchy: &'a Hierarchy,
    options: &'a PrintOptions,
    output: W,
    indent_level: usize,
}

impl<'a, W: Write> HierarchyPrinter<'a, W> {
    pub fn new(hierarchy: &'a Hierarchy, options: &'a PrintOptions, output: W) -> Self {
        Self {
            hierarchy,
            options,
            output,
            indent_level: 0,
        }
    }

    /// Write the whole assignment and return the destination.
    pub fn print(mut self) -> io::Result<W> {
        write!(self.output, "const {} = ", self.options.variable)?;
        self.begin_operation(ROOT_NAME)?;
        self.begin_children()?;

        // Roots are printed regardless of their value.
        let hierarchy = self.hierarchy;
        let mut needs_comma = false;
        for &root_id in hierarchy.roots() {
            let Some(root) = hierarchy.record(root_id) else {
                continue;
            };
            self.separator(&mut needs_comma)?;
            self.print_operation(root_id, root)?;
        }

        self.end_children()?;
        self.end_operation()?;
        self.output.flush()?;
        Ok(self.output)
    }

    /// Depth-first print of `op` and its significant descendants. Open nodes
    /// live on an explicit stack, so tree depth is bounded by the heap.
    fn print_operation(&mut self, id: OperationId, op: &'a Operation) -> io::Result<()> {
        let mut stack = vec![self.open_operation(id, op, 1)?];

        while let Some(frame) = stack.last_mut() {
            let hierarchy = self.hierarchy;
            let next = frame.children[frame.next..]
                .iter()
                .enumerate()
                .find_map(|(offset, &child_id)| {
                    hierarchy
                        .record(child_id)
                        .filter(|child| child.is_significant())
                        .map(|child| (offset, child_id, child))
                });

            match next {
                Some((offset, child_id, child)) => {
                    frame.next += offset + 1;
                    let depth = frame.depth + 1;
                    let mut needs_comma = frame.has_child_with_value;
                    frame.has_child_with_value = true;
                    self.separator(&mut needs_comma)?;
                    stack.push(self.open_operation(child_id, child, depth)?);
                }
                None => {
                    if let Some(frame) = stack.pop() {
                        self.close_operation(&frame)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn open_operation(
        &mut self,
        id: OperationId,
        op: &'a Operation,
        depth: usize,
    ) -> io::Result<Frame<'a>> {
        self.indentation()?;
        self.begin_operation(&op.display_name)?;

        let hierarchy = self.hierarchy;
        let at_depth_limit = self.options.max_depth.is_some_and(|max| depth >= max);
        let children = if at_depth_limit {
            &[][..]
        } else {
            hierarchy.children(id)
        };
        if !children.is_empty() {
            self.begin_children()?;
        }

        Ok(Frame {
            op,
            depth,
            children,
            next: 0,
            has_child_with_value: false,
        })
    }

    fn close_operation(&mut self, frame: &Frame<'a>) -> io::Result<()> {
        let has_children = !frame.children.is_empty();
        if has_children {
            self.end_children()?;
        }
        if !frame.has_child_with_value {
            if has_children {
                write!(self.output, ",")?;
            }
            self.indentation()?;
            writeln!(self.output, "value: {}", frame.op.value())?;
        }
        self.end_operation()
    }

    /// Siblings are separated by a comma leading the next sibling's line.
    fn separator(&mut self, needs_comma: &mut bool) -> io::Result<()> {
        if *needs_comma {
            write!(self.output, ",")?;
        }
        *needs_comma = true;
        Ok(())
    }

    fn begin_operation(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.output, "{{")?;
        self.indent();
        self.indentation()?;
        let quoted = serde_json::to_string(name).map_err(io::Error::other)?;
        writeln!(self.output, "name: {},", quoted)
    }

    fn end_operation(&mut self) -> io::Result<()> {
        self.dedent();
        self.indentation()?;
        writeln!(self.output, "}}")
    }

    fn begin_children(&mut self) -> io::Result<()> {
        self.indentation()?;
        writeln!(self.output, "children: [")?;
        self.indent();
        Ok(())
    }

    fn end_children(&mut self) -> io::Result<()> {
        self.dedent();
        self.indentation()?;
        writeln!(self.output, "]")
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn indentation(&mut self) -> io::Result<()> {
        for _ in 0..self.indent_level {
            self.output.write_all(b"  ")?;
        }
        Ok(())
    }
}

/// Print into a string.
#[cfg(test)]
pub fn print_to_string(hierarchy: &Hierarchy, options: &PrintOptions) -> io::Result<String> {
    let bytes = HierarchyPrinter::new(hierarchy, options, Vec::new()).print()?;
    String::from_utf8(bytes).map_err(io::Error::other)
}
