//! Call-scoped memoization: version-range results, descriptor results with
//! negative entries, interned artifacts and dependencies, and resolved child
//! lists. Not thread-safe; one pool serves exactly one collection run.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use gantry_core::artifact::Artifact;
use gantry_core::dependency::Dependency;
use gantry_core::descriptor::ArtifactDescriptor;
use gantry_core::repository::RemoteRepository;

use crate::graph::ChildListId;
use crate::policy::{DependencyManager, DependencySelector, DependencyTraverser, VersionFilter};
use crate::request::{DescriptorRequest, VersionRangeRequest, VersionRangeResult};

/// Cached outcome of a descriptor read. `Missing` is the negative entry: the
/// read was attempted and failed, or the artifact is known to have no
/// descriptor.
#[derive(Debug, Clone)]
pub(crate) enum DescriptorEntry {
    Resolved(Arc<ArtifactDescriptor>),
    Missing,
}

#[derive(Debug, PartialEq, Eq, Hash)]
pub(crate) struct RangeKey {
    artifact: Artifact,
    repositories: Vec<RemoteRepository>,
    request_context: String,
}

impl RangeKey {
    pub fn new(request: &VersionRangeRequest) -> Self {
        Self {
            artifact: request.artifact.clone(),
            repositories: request.repositories.clone(),
            request_context: request.request_context.clone(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
pub(crate) struct DescriptorKey {
    artifact: Artifact,
    repositories: Vec<RemoteRepository>,
}

impl DescriptorKey {
    pub fn new(request: &DescriptorRequest) -> Self {
        Self {
            artifact: request.artifact.clone(),
            repositories: request.repositories.clone(),
        }
    }
}

/// Key of a resolved child list: the artifact, the repositories in play, and
/// the identity of the four policies. Policies compare by `Arc` pointer; the
/// key keeps the `Arc`s alive so an address can never be reused while the
/// pool holds it.
pub(crate) struct ChildrenKey {
    artifact: Artifact,
    repositories: Vec<RemoteRepository>,
    selector: Option<Arc<dyn DependencySelector>>,
    manager: Option<Arc<dyn DependencyManager>>,
    traverser: Option<Arc<dyn DependencyTraverser>>,
    filter: Option<Arc<dyn VersionFilter>>,
}

impl ChildrenKey {
    pub fn new(
        artifact: Artifact,
        repositories: Vec<RemoteRepository>,
        selector: Option<Arc<dyn DependencySelector>>,
        manager: Option<Arc<dyn DependencyManager>>,
        traverser: Option<Arc<dyn DependencyTraverser>>,
        filter: Option<Arc<dyn VersionFilter>>,
    ) -> Self {
        Self {
            artifact,
            repositories,
            selector,
            manager,
            traverser,
            filter,
        }
    }
}

fn policy_address<T: ?Sized>(policy: &Option<Arc<T>>) -> usize {
    policy
        .as_ref()
        .map_or(0, |p| Arc::as_ptr(p) as *const () as usize)
}

impl PartialEq for ChildrenKey {
    fn eq(&self, other: &Self) -> bool {
        self.artifact == other.artifact
            && self.repositories == other.repositories
            && policy_address(&self.selector) == policy_address(&other.selector)
            && policy_address(&self.manager) == policy_address(&other.manager)
            && policy_address(&self.traverser) == policy_address(&other.traverser)
            && policy_address(&self.filter) == policy_address(&other.filter)
    }
}

impl Eq for ChildrenKey {}

impl Hash for ChildrenKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.artifact.hash(state);
        self.repositories.hash(state);
        policy_address(&self.selector).hash(state);
        policy_address(&self.manager).hash(state);
        policy_address(&self.traverser).hash(state);
        policy_address(&self.filter).hash(state);
    }
}

#[derive(Default)]
pub(crate) struct DataPool {
    artifacts: HashMap<Artifact, Artifact>,
    dependencies: HashMap<Dependency, Dependency>,
    ranges: HashMap<RangeKey, Arc<VersionRangeResult>>,
    descriptors: HashMap<DescriptorKey, DescriptorEntry>,
    children: HashMap<ChildrenKey, ChildListId>,
}

impl DataPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalize an artifact: the first instance seen for a value wins and
    /// every later equal artifact resolves to it.
    pub fn intern_artifact(&mut self, artifact: Artifact) -> Artifact {
        match self.artifacts.get(&artifact) {
            Some(canonical) => canonical.clone(),
            None => {
                self.artifacts.insert(artifact.clone(), artifact.clone());
                artifact
            }
        }
    }

    pub fn intern_dependency(&mut self, dependency: Dependency) -> Dependency {
        match self.dependencies.get(&dependency) {
            Some(canonical) => canonical.clone(),
            None => {
                self.dependencies
                    .insert(dependency.clone(), dependency.clone());
                dependency
            }
        }
    }

    pub fn range(&self, key: &RangeKey) -> Option<Arc<VersionRangeResult>> {
        self.ranges.get(key).cloned()
    }

    pub fn put_range(&mut self, key: RangeKey, result: Arc<VersionRangeResult>) {
        self.ranges.insert(key, result);
    }

    pub fn descriptor(&self, key: &DescriptorKey) -> Option<DescriptorEntry> {
        self.descriptors.get(key).cloned()
    }

    pub fn put_descriptor(&mut self, key: DescriptorKey, entry: DescriptorEntry) {
        self.descriptors.insert(key, entry);
    }

    pub fn children(&self, key: &ChildrenKey) -> Option<ChildListId> {
        self.children.get(key).copied()
    }

    pub fn put_children(&mut self, key: ChildrenKey, list: ChildListId) {
        self.children.insert(key, list);
    }
}
