//! The collected dependency graph: an arena of nodes plus an arena of child
//! lists, so separate nodes can share one children list by id.

use std::collections::HashSet;
use std::fmt::Write as _;

use gantry_core::artifact::Artifact;
use gantry_core::dependency::Dependency;
use gantry_core::repository::RemoteRepository;
use gantry_core::version::{Version, VersionConstraint};

/// Bit in [`DependencyNode::managed_bits`]: the version came from dependency
/// management.
pub const MANAGED_VERSION: u8 = 0x01;
/// Bit: the scope came from dependency management.
pub const MANAGED_SCOPE: u8 = 0x02;
/// Bit: the optional flag came from dependency management.
pub const MANAGED_OPTIONAL: u8 = 0x04;
/// Bit: the artifact properties came from dependency management.
pub const MANAGED_PROPERTIES: u8 = 0x08;
/// Bit: the exclusions came from dependency management.
pub const MANAGED_EXCLUSIONS: u8 = 0x10;

/// Index of a node within its [`DependencyGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Index of a children list within its [`DependencyGraph`]. Two nodes holding
/// the same id share one physical list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildListId(usize);

/// Values a dependency carried before management overrode them. Attached to
/// nodes only when the session runs with verbose premanaged state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PremanagedState {
    pub version: Option<String>,
    pub scope: Option<String>,
    /// Outer `Some` means the flag was overridden; the inner value is the
    /// original tri-state.
    pub optional: Option<Option<bool>>,
}

/// A node in the collected graph.
#[derive(Debug, Clone)]
pub struct DependencyNode {
    /// The resolved dependency, or `None` for a synthetic root-artifact node.
    pub dependency: Option<Dependency>,
    /// Bare artifact of a synthetic root node; read through
    /// [`DependencyNode::artifact`].
    pub(crate) artifact: Option<Artifact>,
    /// The concrete version chosen for this node.
    pub version: Option<Version>,
    /// The constraint the version was matched against.
    pub version_constraint: Option<VersionConstraint>,
    /// Repositories the artifact is known to be available from.
    pub repositories: Vec<RemoteRepository>,
    /// Opaque request context string.
    pub request_context: String,
    pub aliases: Vec<Artifact>,
    /// Relocation chain that led to this node, nearest first.
    pub relocations: Vec<Artifact>,
    /// Which dependency fields were overridden by management.
    pub managed_bits: u8,
    pub premanaged: Option<PremanagedState>,
    pub children: ChildListId,
}

impl DependencyNode {
    /// The artifact this node stands for, from its dependency or, for a
    /// synthetic root, the bare artifact.
    pub fn artifact(&self) -> Option<&Artifact> {
        self.dependency
            .as_ref()
            .map(Dependency::artifact)
            .or(self.artifact.as_ref())
    }
}

/// Arena-backed dependency graph. Children are addressed through
/// [`ChildListId`] so cycle nodes and memoized subtrees can share one list.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: Vec<DependencyNode>,
    lists: Vec<Vec<NodeId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: DependencyNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &DependencyNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut DependencyNode {
        &mut self.nodes[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &DependencyNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    /// Allocate a fresh, empty children list.
    pub fn new_list(&mut self) -> ChildListId {
        let id = ChildListId(self.lists.len());
        self.lists.push(Vec::new());
        id
    }

    pub fn list(&self, id: ChildListId) -> &[NodeId] {
        &self.lists[id.0]
    }

    pub fn push_child(&mut self, list: ChildListId, child: NodeId) {
        self.lists[list.0].push(child);
    }

    pub fn children_of(&self, node: NodeId) -> &[NodeId] {
        self.list(self.node(node).children)
    }

    /// Render the graph as an indented tree, one node per line. Nodes already
    /// on the current path are printed but not descended into, so cyclic
    /// graphs terminate.
    pub fn render(&self, root: NodeId) -> String {
        let mut output = String::new();
        let mut on_path = HashSet::new();
        on_path.insert(root);
        let _ = writeln!(output, "{}", self.label(root));
        let children = self.children_of(root);
        for (index, child) in children.iter().enumerate() {
            self.render_node(&mut output, *child, "", index == children.len() - 1, &mut on_path);
        }
        output
    }

    fn label(&self, id: NodeId) -> String {
        match self.node(id).artifact() {
            Some(artifact) => artifact.to_string(),
            None => "(root)".to_string(),
        }
    }

    fn render_node(
        &self,
        output: &mut String,
        id: NodeId,
        prefix: &str,
        is_last: bool,
        on_path: &mut HashSet<NodeId>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let _ = writeln!(output, "{prefix}{connector}{}", self.label(id));

        if !on_path.insert(id) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let children = self.children_of(id);
        for (index, child) in children.iter().enumerate() {
            self.render_node(output, *child, &child_prefix, index == children.len() - 1, on_path);
        }

        on_path.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(graph: &mut DependencyGraph, coordinates: &str) -> NodeId {
        let artifact = Artifact::parse(coordinates).unwrap();
        let children = graph.new_list();
        graph.add_node(DependencyNode {
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
        })
    }

    #[test]
    fn shared_children_lists_observe_later_pushes() {
        let mut graph = DependencyGraph::new();
        let first = node(&mut graph, "g:a:1");
        let second = node(&mut graph, "g:a:1");
        let shared = graph.node(first).children;
        graph.node_mut(second).children = shared;

        let child = node(&mut graph, "g:b:1");
        graph.push_child(shared, child);

        assert_eq!(graph.children_of(first), graph.children_of(second));
        assert_eq!(graph.children_of(second), &[child]);
    }

    #[test]
    fn render_terminates_on_cycles() {
        let mut graph = DependencyGraph::new();
        let a = node(&mut graph, "g:a:1");
        let b = node(&mut graph, "g:b:1");
        let a_again = node(&mut graph, "g:a:1");
        // the cycle node shares a's children
        graph.node_mut(a_again).children = graph.node(a).children;

        let a_list = graph.node(a).children;
        graph.push_child(a_list, b);
        let b_list = graph.node(b).children;
        graph.push_child(b_list, a_again);

        let rendered = graph.render(a);
        assert!(rendered.contains("g:a:jar:1"));
        assert!(rendered.contains("g:b:jar:1"));
    }
}
