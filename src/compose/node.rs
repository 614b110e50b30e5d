// src/compose/node.rs

//! Composition primitives.

use std::fmt::Write as _;

use crate::exec::Task;

/// A composed unit of work.
///
/// - `Leaf`: a single task.
/// - `Series`: children run strictly in order; the first failure skips the
///   rest and is propagated unchanged.
/// - `Parallel`: children start together; the node fails if any child fails,
///   but only after every started child has finished.
///
/// Graphs are built once and never mutated; running one does not change it.
#[derive(Debug, Clone)]
pub enum TaskNode {
    Leaf(Task),
    Series(Vec<TaskNode>),
    Parallel(Vec<TaskNode>),
}

impl From<Task> for TaskNode {
    fn from(task: Task) -> Self {
        TaskNode::Leaf(task)
    }
}

/// Compose children into a node that runs them one after another.
pub fn series<I, N>(children: I) -> TaskNode
where
    I: IntoIterator<Item = N>,
    N: Into<TaskNode>,
{
    TaskNode::Series(children.into_iter().map(Into::into).collect())
}

/// Compose children into a node that runs them concurrently.
pub fn parallel<I, N>(children: I) -> TaskNode
where
    I: IntoIterator<Item = N>,
    N: Into<TaskNode>,
{
    TaskNode::Parallel(children.into_iter().map(Into::into).collect())
}

impl TaskNode {
    /// A node that does nothing and succeeds.
    pub fn empty() -> Self {
        TaskNode::Series(Vec::new())
    }

    /// Names of all leaf tasks, depth-first, in declaration order.
    pub fn task_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TaskNode::Leaf(task) => out.push(task.name()),
            TaskNode::Series(children) | TaskNode::Parallel(children) => {
                for child in children {
                    child.collect_names(out);
                }
            }
        }
    }

    /// Indented tree used by `--dry-run`.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        match self {
            TaskNode::Leaf(task) => {
                let _ = writeln!(out, "{pad}- {} ({})", task.name(), task.describe());
            }
            TaskNode::Series(children) => {
                let _ = writeln!(out, "{pad}series:");
                for child in children {
                    child.render_into(out, depth + 1);
                }
            }
            TaskNode::Parallel(children) => {
                let _ = writeln!(out, "{pad}parallel:");
                for child in children {
                    child.render_into(out, depth + 1);
                }
            }
        }
    }
}
