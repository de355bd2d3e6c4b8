//! The DFS ancestor path maintained during collection.

use gantry_core::artifact::Artifact;

use crate::graph::{DependencyGraph, NodeId};

/// Append-only stack of the nodes on the current root-to-leaf path.
#[derive(Debug, Default)]
pub(crate) struct NodeStack {
    entries: Vec<NodeId>,
}

impl NodeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: NodeId) {
        self.entries.push(node);
    }

    pub fn pop(&mut self) -> Option<NodeId> {
        self.entries.pop()
    }

    pub fn top(&self) -> Option<NodeId> {
        self.entries.last().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: usize) -> NodeId {
        self.entries[index]
    }

    /// Index of the deepest ancestor whose artifact is coordinate-equal to
    /// `artifact` (version ignored).
    pub fn find(&self, graph: &DependencyGraph, artifact: &Artifact) -> Option<usize> {
        for index in (0..self.entries.len()).rev() {
            if let Some(candidate) = graph.node(self.entries[index]).artifact() {
                if candidate.same_coordinates(artifact) {
                    return Some(index);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use gantry_core::dependency::Dependency;

    use super::*;
    use crate::graph::DependencyNode;

    fn push_node(graph: &mut DependencyGraph, stack: &mut NodeStack, coordinates: &str) -> NodeId {
        let artifact = Artifact::parse(coordinates).unwrap();
        let children = graph.new_list();
        let id = graph.add_node(DependencyNode {
            dependency: Some(Dependency::new(artifact, "compile")),
            artifact: None,
            version: None,
            version_constraint: None,
            repositories: Vec::new(),
            request_context: String::new(),
            aliases: Vec::new(),
            relocations: Vec::new(),
            managed_bits: 0,
            premanaged: None,
            children,
        });
        stack.push(id);
        id
    }

    #[test]
    fn push_pop_top() {
        let mut graph = DependencyGraph::new();
        let mut stack = NodeStack::new();
        assert_eq!(stack.top(), None);

        let a = push_node(&mut graph, &mut stack, "g:a:1");
        let b = push_node(&mut graph, &mut stack, "g:b:1");
        assert_eq!(stack.top(), Some(b));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop(), Some(b));
        assert_eq!(stack.top(), Some(a));
    }

    #[test]
    fn find_ignores_version() {
        let mut graph = DependencyGraph::new();
        let mut stack = NodeStack::new();
        push_node(&mut graph, &mut stack, "g:a:1");
        push_node(&mut graph, &mut stack, "g:b:1");

        let probe = Artifact::parse("g:a:9").unwrap();
        assert_eq!(stack.find(&graph, &probe), Some(0));

        let missing = Artifact::parse("g:c:1").unwrap();
        assert_eq!(stack.find(&graph, &missing), None);
    }

    #[test]
    fn find_returns_deepest_match() {
        let mut graph = DependencyGraph::new();
        let mut stack = NodeStack::new();
        push_node(&mut graph, &mut stack, "g:a:1");
        push_node(&mut graph, &mut stack, "g:b:1");
        push_node(&mut graph, &mut stack, "g:a:2");

        let probe = Artifact::parse("g:a:3").unwrap();
        assert_eq!(stack.find(&graph, &probe), Some(2));
    }
}
