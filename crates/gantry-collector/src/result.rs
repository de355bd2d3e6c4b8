//! Collection results, recorded cycles, and the terminal collection error.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use gantry_core::dependency::Dependency;
use gantry_core::error::RepositoryError;

use crate::graph::{DependencyGraph, NodeId};
use crate::session::CollectSession;
use crate::stack::NodeStack;

/// The outcome of one collection run: the graph, plus whatever recoverable
/// failures and cycles were recorded along the way.
#[derive(Debug)]
pub struct CollectResult {
    pub graph: DependencyGraph,
    /// Root of the graph; `None` only when collection failed before a root
    /// node could be built.
    pub root: Option<NodeId>,
    pub exceptions: Vec<RepositoryError>,
    pub cycles: Vec<DependencyCycle>,
}

/// A cyclic dependency chain: the ancestors from the first occurrence of the
/// repeated coordinates down to the point of closure, followed by the closing
/// dependency itself.
#[derive(Debug, Clone)]
pub struct DependencyCycle {
    dependencies: Vec<Dependency>,
}

impl DependencyCycle {
    pub(crate) fn new(dependencies: Vec<Dependency>) -> Self {
        Self { dependencies }
    }

    /// The full chain; the last entry closes the cycle and is
    /// coordinate-equal to the first.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }
}

impl fmt::Display for DependencyCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, dependency) in self.dependencies.iter().enumerate() {
            if index > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{}", dependency.artifact())?;
        }
        Ok(())
    }
}

/// Terminal failure of a collection run, carrying the partial result.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(help("Inspect the partial result's exception list for the underlying failures"))]
pub struct CollectError {
    message: String,
    pub result: CollectResult,
}

impl CollectError {
    pub(crate) fn new(result: CollectResult, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            result,
        }
    }
}

/// Bounded accumulator for recoverable failures during the walk.
pub(crate) struct Results {
    pub exceptions: Vec<RepositoryError>,
    pub cycles: Vec<DependencyCycle>,
    pub error_path: Option<String>,
    max_exceptions: Option<usize>,
    max_cycles: Option<usize>,
}

impl Results {
    pub fn new(session: &CollectSession) -> Self {
        Self {
            exceptions: Vec::new(),
            cycles: Vec::new(),
            error_path: None,
            max_exceptions: session.max_exceptions,
            max_cycles: session.max_cycles,
        }
    }

    /// Record a failure against the current ancestor path. The first failure
    /// fixes the error path; entries beyond the bound are dropped.
    pub fn add_exception(
        &mut self,
        dependency: &Dependency,
        error: RepositoryError,
        stack: &NodeStack,
        graph: &DependencyGraph,
    ) {
        if self
            .max_exceptions
            .is_some_and(|max| self.exceptions.len() >= max)
        {
            tracing::debug!(%error, "dropping exception beyond the configured bound");
            return;
        }
        self.exceptions.push(error);
        if self.error_path.is_none() {
            let mut path = String::new();
            for index in 0..stack.len() {
                if let Some(artifact) = graph.node(stack.get(index)).artifact() {
                    if !path.is_empty() {
                        path.push_str(" -> ");
                    }
                    path.push_str(&artifact.to_string());
                }
            }
            if !path.is_empty() {
                path.push_str(" -> ");
            }
            path.push_str(&dependency.artifact().to_string());
            self.error_path = Some(path);
        }
    }

    /// Record the cycle closing at `dependency`, whose first occurrence sits
    /// at `cycle_entry` on the stack. Entries beyond the bound are dropped.
    pub fn add_cycle(
        &mut self,
        stack: &NodeStack,
        graph: &DependencyGraph,
        cycle_entry: usize,
        dependency: &Dependency,
    ) {
        if self.max_cycles.is_some_and(|max| self.cycles.len() >= max) {
            return;
        }
        let mut dependencies = Vec::with_capacity(stack.len() - cycle_entry + 1);
        for index in cycle_entry..stack.len() {
            if let Some(entry) = &graph.node(stack.get(index)).dependency {
                dependencies.push(entry.clone());
            }
        }
        dependencies.push(dependency.clone());
        self.cycles.push(DependencyCycle::new(dependencies));
    }
}
