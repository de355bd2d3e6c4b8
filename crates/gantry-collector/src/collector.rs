//! The collector driver: root handling, descriptor-driven recursion,
//! relocation chains, cycle linking, and result assembly.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::Level;

use gantry_core::artifact::Artifact;
use gantry_core::dependency::Dependency;
use gantry_core::descriptor::ArtifactDescriptor;
use gantry_core::error::RepositoryError;
use gantry_core::repository::{ArtifactRepository, RemoteRepository};
use gantry_core::version::Version;

use crate::context::{CollectionContext, VersionFilterContext};
use crate::graph::{DependencyGraph, DependencyNode, NodeId};
use crate::policy::{DependencyManager, DependencySelector, DependencyTraverser, VersionFilter};
use crate::pool::{ChildrenKey, DataPool, DescriptorEntry, DescriptorKey, RangeKey};
use crate::premanaged::PremanagedDependency;
use crate::request::{CollectRequest, DescriptorRequest, VersionRangeRequest, VersionRangeResult};
use crate::result::{CollectError, CollectResult, Results};
use crate::session::CollectSession;
use crate::spi::{
    DescriptorReader, GraphTransformer as _, RepositoryManager, TransformContext,
    VersionRangeResolver,
};
use crate::stack::NodeStack;

/// Walks the transitive dependency graph induced by artifact descriptors.
///
/// One instance can serve any number of [`collect`](Self::collect) calls; all
/// mutable state lives for exactly one call.
pub struct DependencyCollector {
    descriptor_reader: Arc<dyn DescriptorReader>,
    range_resolver: Arc<dyn VersionRangeResolver>,
    repository_manager: Arc<dyn RepositoryManager>,
}

impl DependencyCollector {
    pub fn new(
        descriptor_reader: Arc<dyn DescriptorReader>,
        range_resolver: Arc<dyn VersionRangeResolver>,
        repository_manager: Arc<dyn RepositoryManager>,
    ) -> Self {
        Self {
            descriptor_reader,
            range_resolver,
            repository_manager,
        }
    }

    /// Collect the dependency graph for `request`.
    ///
    /// Recoverable collaborator failures attach to the result and the walk
    /// continues; if any were recorded the call ends in a [`CollectError`]
    /// carrying the partial result.
    pub fn collect(
        &self,
        session: &CollectSession,
        request: &CollectRequest,
    ) -> Result<CollectResult, CollectError> {
        let started = Instant::now();
        let mut graph = DependencyGraph::new();
        let mut results = Results::new(session);

        let mut repositories = request.repositories.clone();
        let mut dependencies = request.dependencies.clone();
        let mut managed_dependencies = request.managed_dependencies.clone();
        let mut manager = session.manager.clone();

        let (root_id, root) = if let Some(requested_root) = &request.root {
            let range_request = VersionRangeRequest {
                artifact: requested_root.artifact().clone(),
                repositories: request.repositories.clone(),
                request_context: request.request_context.clone(),
                trace: request.trace.clone(),
            };
            let range_result = match self.range_resolver.resolve(session, &range_request) {
                Ok(result) => result,
                Err(error) => return Err(root_failure(graph, results, error)),
            };
            let versions = match filter_versions(
                requested_root,
                &range_result,
                session.version_filter.as_deref(),
            ) {
                Ok(versions) => versions,
                Err(error) => return Err(root_failure(graph, results, error)),
            };
            // the highest surviving version wins
            let Some(version) = versions.last().cloned() else {
                let error = RepositoryError::VersionRange {
                    artifact: requested_root.artifact().clone(),
                    message: "no versions remain after filtering".to_string(),
                };
                return Err(root_failure(graph, results, error));
            };
            let mut root =
                requested_root.with_artifact(requested_root.artifact().with_version(version.as_str()));

            // temporary root-scope manager; the recursion seed derives again
            // once the descriptor's management has been merged in
            let context = CollectionContext::new(
                request.root_artifact.clone(),
                Some(root.clone()),
                managed_dependencies.clone(),
            );
            manager = derive_manager(&manager, &context);

            let descriptor_request = DescriptorRequest {
                artifact: root.artifact().clone(),
                repositories: request.repositories.clone(),
                request_context: request.request_context.clone(),
                trace: request.trace.clone(),
            };
            let descriptor = if root.artifact().local_path().is_some() {
                ArtifactDescriptor::new(root.artifact().clone())
            } else {
                match self.descriptor_reader.read(session, &descriptor_request) {
                    Ok(descriptor) => descriptor,
                    Err(error) => return Err(root_failure(graph, results, error)),
                }
            };
            // the descriptor may enrich the artifact, e.g. with properties
            root = root.with_artifact(descriptor.artifact.clone());

            if !session.ignore_descriptor_repositories {
                repositories = self.repository_manager.aggregate(
                    session,
                    &request.repositories,
                    &descriptor.repositories,
                    true,
                );
            }
            dependencies = merge_dependencies(&request.dependencies, &descriptor.dependencies);
            managed_dependencies =
                merge_dependencies(&request.managed_dependencies, &descriptor.managed_dependencies);

            let children = graph.new_list();
            let root_id = graph.add_node(DependencyNode {
                dependency: Some(root.clone()),
                artifact: None,
                version: Some(version),
                version_constraint: Some(range_result.constraint.clone()),
                // the root records the caller's asking list, not the
                // aggregated one used for recursion
                repositories: request.repositories.clone(),
                request_context: request.request_context.clone(),
                aliases: descriptor.aliases,
                relocations: descriptor.relocations,
                managed_bits: 0,
                premanaged: None,
                children,
            });
            (root_id, Some(root))
        } else {
            let children = graph.new_list();
            let root_id = graph.add_node(DependencyNode {
                dependency: None,
                artifact: request.root_artifact.clone(),
                version: None,
                version_constraint: None,
                repositories: request.repositories.clone(),
                request_context: request.request_context.clone(),
                aliases: Vec::new(),
                relocations: Vec::new(),
                managed_bits: 0,
                premanaged: None,
                children,
            });
            (root_id, None)
        };

        let traverse_root = match (&root, &session.traverser) {
            (Some(root), Some(traverser)) => traverser.traverse(root),
            _ => true,
        };

        if traverse_root && !dependencies.is_empty() {
            let seed_context = CollectionContext::new(
                request.root_artifact.clone(),
                root.clone(),
                managed_dependencies.clone(),
            );
            let seed_selector = derive_selector(&session.selector, &seed_context);
            let seed_manager = derive_manager(&manager, &seed_context);
            let seed_traverser = derive_traverser(&session.traverser, &seed_context);
            let seed_filter = derive_filter(&session.version_filter, &seed_context);

            let mut stack = NodeStack::new();
            stack.push(root_id);
            let mut walk = Walk {
                session,
                request,
                reader: &*self.descriptor_reader,
                range_resolver: &*self.range_resolver,
                repository_manager: &*self.repository_manager,
                graph: &mut graph,
                pool: DataPool::new(),
                stack,
                results: &mut results,
            };
            walk.process(
                &dependencies,
                &repositories,
                seed_selector,
                seed_manager,
                seed_traverser,
                seed_filter,
            );
        }

        let mut root_node = root_id;
        if let Some(transformer) = &session.transformer {
            let mut transform_context = TransformContext::new(tracing::enabled!(Level::DEBUG));
            if let Some(stats) = transform_context.stats_mut() {
                stats.insert("collect.nodes".to_string(), graph.node_count().to_string());
                stats.insert(
                    "collect.millis".to_string(),
                    started.elapsed().as_millis().to_string(),
                );
            }
            match transformer.transform(&mut graph, root_id, &mut transform_context) {
                Ok(transformed) => root_node = transformed,
                Err(error) => results.exceptions.push(error),
            }
            if let Some(stats) = transform_context.stats() {
                tracing::debug!(?stats, "dependency graph transformation finished");
            }
        }

        tracing::debug!(
            nodes = graph.node_count(),
            exceptions = results.exceptions.len(),
            cycles = results.cycles.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dependency collection finished"
        );

        let result = CollectResult {
            graph,
            root: Some(root_node),
            exceptions: std::mem::take(&mut results.exceptions),
            cycles: std::mem::take(&mut results.cycles),
        };
        if let Some(path) = results.error_path.take() {
            return Err(CollectError::new(
                result,
                format!("Failed to collect dependencies at {path}"),
            ));
        }
        if !result.exceptions.is_empty() {
            return Err(CollectError::new(result, "Failed to collect dependencies"));
        }
        Ok(result)
    }
}

fn root_failure(graph: DependencyGraph, mut results: Results, error: RepositoryError) -> CollectError {
    let message = error.to_string();
    results.exceptions.push(error);
    CollectError::new(
        CollectResult {
            graph,
            root: None,
            exceptions: results.exceptions,
            cycles: results.cycles,
        },
        message,
    )
}

/// Outcome of a (possibly cached) descriptor lookup for one concrete version.
enum DescriptorOutcome {
    Present(Arc<ArtifactDescriptor>),
    /// Known to have no descriptor; yields a childless leaf node.
    Absent,
    /// The read failed just now; the exception is recorded and no node is
    /// produced for this version.
    Failed,
}

/// Mutable state of one collection run.
struct Walk<'a> {
    session: &'a CollectSession,
    request: &'a CollectRequest,
    reader: &'a dyn DescriptorReader,
    range_resolver: &'a dyn VersionRangeResolver,
    repository_manager: &'a dyn RepositoryManager,
    graph: &'a mut DependencyGraph,
    pool: DataPool,
    stack: NodeStack,
    results: &'a mut Results,
}

impl Walk<'_> {
    fn process(
        &mut self,
        dependencies: &[Dependency],
        repositories: &[RemoteRepository],
        selector: Option<Arc<dyn DependencySelector>>,
        manager: Option<Arc<dyn DependencyManager>>,
        traverser: Option<Arc<dyn DependencyTraverser>>,
        filter: Option<Arc<dyn VersionFilter>>,
    ) {
        for dependency in dependencies {
            self.process_dependency(
                dependency.clone(),
                repositories,
                &selector,
                &manager,
                &traverser,
                &filter,
                Vec::new(),
                false,
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn process_dependency(
        &mut self,
        dependency: Dependency,
        repositories: &[RemoteRepository],
        selector: &Option<Arc<dyn DependencySelector>>,
        manager: &Option<Arc<dyn DependencyManager>>,
        traverser: &Option<Arc<dyn DependencyTraverser>>,
        filter: &Option<Arc<dyn VersionFilter>>,
        relocations: Vec<Artifact>,
        disable_version_management: bool,
    ) {
        if let Some(selector) = selector {
            if !selector.select(&dependency) {
                return;
            }
        }

        let premanaged = PremanagedDependency::create(
            manager.as_deref(),
            &dependency,
            disable_version_management,
            self.session.verbose_premanaged,
        );
        let dependency = premanaged.dependency().clone();

        let lacking_descriptor = dependency.artifact().local_path().is_some();
        let traverse =
            !lacking_descriptor && traverser.as_ref().map_or(true, |t| t.traverse(&dependency));

        let range_request = VersionRangeRequest {
            artifact: dependency.artifact().clone(),
            repositories: repositories.to_vec(),
            request_context: self.request.request_context.clone(),
            trace: self.request.trace.clone(),
        };
        let range_result = match self.cached_range(&range_request) {
            Ok(result) => result,
            Err(error) => {
                self.results
                    .add_exception(&dependency, error, &self.stack, self.graph);
                return;
            }
        };
        let versions = match filter_versions(&dependency, &range_result, filter.as_deref()) {
            Ok(versions) => versions,
            Err(error) => {
                self.results
                    .add_exception(&dependency, error, &self.stack, self.graph);
                return;
            }
        };

        let Some(parent) = self.stack.top() else {
            return;
        };

        for version in versions {
            let original_artifact = dependency.artifact().with_version(version.as_str());
            let mut resolved = dependency.with_artifact(original_artifact.clone());

            let descriptor_request = DescriptorRequest {
                artifact: resolved.artifact().clone(),
                repositories: repositories.to_vec(),
                request_context: self.request.request_context.clone(),
                trace: self.request.trace.clone(),
            };
            match self.descriptor_outcome(lacking_descriptor, &resolved, &descriptor_request) {
                DescriptorOutcome::Present(descriptor) => {
                    resolved = resolved.with_artifact(descriptor.artifact.clone());

                    // a coordinate-equal ancestor closes a cycle: link to its
                    // subtree instead of descending again
                    if let Some(cycle_entry) = self.stack.find(self.graph, resolved.artifact()) {
                        let ancestor = self.stack.get(cycle_entry);
                        if self.graph.node(ancestor).dependency.is_some() {
                            self.results
                                .add_cycle(&self.stack, self.graph, cycle_entry, &resolved);
                            let shared_children = self.graph.node(ancestor).children;
                            let node_repositories = effective_repositories(
                                range_result.repository_of(&version),
                                repositories,
                            );
                            let mut child = DependencyNode {
                                dependency: Some(resolved.clone()),
                                artifact: None,
                                version: Some(version.clone()),
                                version_constraint: Some(range_result.constraint.clone()),
                                repositories: node_repositories,
                                request_context: self.request.request_context.clone(),
                                aliases: descriptor.aliases.clone(),
                                relocations: relocations.clone(),
                                managed_bits: 0,
                                premanaged: None,
                                children: shared_children,
                            };
                            premanaged.apply_to(&mut child);
                            let child_id = self.graph.add_node(child);
                            let parent_list = self.graph.node(parent).children;
                            self.graph.push_child(parent_list, child_id);
                            continue;
                        }
                    }

                    // a relocated dependency replaces this whole chain
                    if !descriptor.relocations.is_empty() {
                        let disable = original_artifact.group_id()
                            == resolved.artifact().group_id()
                            && original_artifact.artifact_id() == resolved.artifact().artifact_id();
                        tracing::debug!(
                            from = %original_artifact,
                            to = %resolved.artifact(),
                            "following relocation"
                        );
                        self.process_dependency(
                            resolved,
                            repositories,
                            selector,
                            manager,
                            traverser,
                            filter,
                            descriptor.relocations.clone(),
                            disable,
                        );
                        return;
                    }

                    let artifact = self.pool.intern_artifact(resolved.artifact().clone());
                    let resolved = self
                        .pool
                        .intern_dependency(resolved.with_artifact(artifact));
                    let node_repositories =
                        effective_repositories(range_result.repository_of(&version), repositories);
                    let children = self.graph.new_list();
                    let mut child = DependencyNode {
                        dependency: Some(resolved.clone()),
                        artifact: None,
                        version: Some(version.clone()),
                        version_constraint: Some(range_result.constraint.clone()),
                        repositories: node_repositories,
                        request_context: self.request.request_context.clone(),
                        aliases: descriptor.aliases.clone(),
                        relocations: relocations.clone(),
                        managed_bits: 0,
                        premanaged: None,
                        children,
                    };
                    premanaged.apply_to(&mut child);
                    let child_id = self.graph.add_node(child);
                    let parent_list = self.graph.node(parent).children;
                    self.graph.push_child(parent_list, child_id);

                    if traverse && !descriptor.dependencies.is_empty() {
                        self.recurse(
                            child_id,
                            &resolved,
                            &descriptor,
                            repositories,
                            selector,
                            manager,
                            traverser,
                            filter,
                        );
                    }
                }
                DescriptorOutcome::Absent => {
                    let node_repositories =
                        effective_repositories(range_result.repository_of(&version), repositories);
                    let children = self.graph.new_list();
                    let mut child = DependencyNode {
                        dependency: Some(resolved.clone()),
                        artifact: None,
                        version: Some(version.clone()),
                        version_constraint: Some(range_result.constraint.clone()),
                        repositories: node_repositories,
                        request_context: self.request.request_context.clone(),
                        aliases: Vec::new(),
                        relocations: relocations.clone(),
                        managed_bits: 0,
                        premanaged: None,
                        children,
                    };
                    premanaged.apply_to(&mut child);
                    let child_id = self.graph.add_node(child);
                    let parent_list = self.graph.node(parent).children;
                    self.graph.push_child(parent_list, child_id);
                }
                DescriptorOutcome::Failed => {}
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn recurse(
        &mut self,
        child_id: NodeId,
        dependency: &Dependency,
        descriptor: &ArtifactDescriptor,
        repositories: &[RemoteRepository],
        selector: &Option<Arc<dyn DependencySelector>>,
        manager: &Option<Arc<dyn DependencyManager>>,
        traverser: &Option<Arc<dyn DependencyTraverser>>,
        filter: &Option<Arc<dyn VersionFilter>>,
    ) {
        let context = CollectionContext::new(
            self.request.root_artifact.clone(),
            Some(dependency.clone()),
            descriptor.managed_dependencies.clone(),
        );
        let child_selector = derive_selector(selector, &context);
        let child_manager = derive_manager(manager, &context);
        let child_traverser = derive_traverser(traverser, &context);
        let child_filter = derive_filter(filter, &context);

        let child_repositories = if self.session.ignore_descriptor_repositories {
            repositories.to_vec()
        } else {
            self.repository_manager.aggregate(
                self.session,
                repositories,
                &descriptor.repositories,
                true,
            )
        };

        let key = ChildrenKey::new(
            dependency.artifact().clone(),
            child_repositories.clone(),
            child_selector.clone(),
            child_manager.clone(),
            child_traverser.clone(),
            child_filter.clone(),
        );
        if let Some(cached) = self.pool.children(&key) {
            // an equal sub-problem was solved before: share its subtree
            self.graph.node_mut(child_id).children = cached;
        } else {
            // register the still-empty list before descending, so an equal
            // sub-problem reached later observes the populated list
            self.pool.put_children(key, self.graph.node(child_id).children);
            self.stack.push(child_id);
            self.process(
                &descriptor.dependencies,
                &child_repositories,
                child_selector,
                child_manager,
                child_traverser,
                child_filter,
            );
            self.stack.pop();
        }
    }

    fn cached_range(
        &mut self,
        request: &VersionRangeRequest,
    ) -> Result<Arc<VersionRangeResult>, RepositoryError> {
        let key = RangeKey::new(request);
        if let Some(cached) = self.pool.range(&key) {
            return Ok(cached);
        }
        let result = Arc::new(self.range_resolver.resolve(self.session, request)?);
        self.pool.put_range(key, result.clone());
        Ok(result)
    }

    fn descriptor_outcome(
        &mut self,
        lacking_descriptor: bool,
        dependency: &Dependency,
        request: &DescriptorRequest,
    ) -> DescriptorOutcome {
        if lacking_descriptor {
            return DescriptorOutcome::Absent;
        }
        let key = DescriptorKey::new(request);
        if let Some(entry) = self.pool.descriptor(&key) {
            return match entry {
                DescriptorEntry::Resolved(descriptor) => DescriptorOutcome::Present(descriptor),
                DescriptorEntry::Missing => DescriptorOutcome::Absent,
            };
        }
        match self.reader.read(self.session, request) {
            Ok(descriptor) => {
                let descriptor = Arc::new(descriptor);
                self.pool
                    .put_descriptor(key, DescriptorEntry::Resolved(descriptor.clone()));
                DescriptorOutcome::Present(descriptor)
            }
            Err(error) => {
                self.results
                    .add_exception(dependency, error, &self.stack, self.graph);
                self.pool.put_descriptor(key, DescriptorEntry::Missing);
                DescriptorOutcome::Failed
            }
        }
    }
}

fn derive_selector(
    selector: &Option<Arc<dyn DependencySelector>>,
    context: &CollectionContext,
) -> Option<Arc<dyn DependencySelector>> {
    selector
        .as_ref()
        .map(|s| s.derive_child(context).unwrap_or_else(|| Arc::clone(s)))
}

fn derive_manager(
    manager: &Option<Arc<dyn DependencyManager>>,
    context: &CollectionContext,
) -> Option<Arc<dyn DependencyManager>> {
    manager
        .as_ref()
        .map(|m| m.derive_child(context).unwrap_or_else(|| Arc::clone(m)))
}

fn derive_traverser(
    traverser: &Option<Arc<dyn DependencyTraverser>>,
    context: &CollectionContext,
) -> Option<Arc<dyn DependencyTraverser>> {
    traverser
        .as_ref()
        .map(|t| t.derive_child(context).unwrap_or_else(|| Arc::clone(t)))
}

fn derive_filter(
    filter: &Option<Arc<dyn VersionFilter>>,
    context: &CollectionContext,
) -> Option<Arc<dyn VersionFilter>> {
    filter
        .as_ref()
        .map(|f| f.derive_child(context).unwrap_or_else(|| Arc::clone(f)))
}

/// Apply the version filter to a range result and return the surviving
/// versions. Pinned versions bypass the filter.
fn filter_versions(
    dependency: &Dependency,
    range: &VersionRangeResult,
    filter: Option<&dyn VersionFilter>,
) -> Result<Vec<Version>, RepositoryError> {
    if range.versions.is_empty() {
        return Err(RepositoryError::VersionRange {
            artifact: dependency.artifact().clone(),
            message: format!("no versions available within {}", range.constraint),
        });
    }
    match filter {
        Some(filter) if range.constraint.is_range() => {
            let mut context = VersionFilterContext::new(dependency, range);
            filter
                .filter_versions(&mut context)
                .map_err(|error| RepositoryError::VersionRange {
                    artifact: dependency.artifact().clone(),
                    message: format!("version filtering failed: {error}"),
                })?;
            let versions = context.into_versions();
            if versions.is_empty() {
                return Err(RepositoryError::VersionRange {
                    artifact: dependency.artifact().clone(),
                    message: format!("no acceptable versions within {}", range.constraint),
                });
            }
            Ok(versions)
        }
        _ => Ok(range.versions.clone()),
    }
}

/// Merge two dependency lists; an entry from `dominant` suppresses any
/// `recessive` entry with the same coordinate key.
fn merge_dependencies(dominant: &[Dependency], recessive: &[Dependency]) -> Vec<Dependency> {
    if recessive.is_empty() {
        return dominant.to_vec();
    }
    if dominant.is_empty() {
        return recessive.to_vec();
    }
    let mut merged = Vec::with_capacity(dominant.len() + recessive.len());
    let mut seen = HashSet::with_capacity(dominant.len());
    for dependency in dominant {
        seen.insert(dependency.artifact().coordinate_key());
        merged.push(dependency.clone());
    }
    for dependency in recessive {
        if !seen.contains(&dependency.artifact().coordinate_key()) {
            merged.push(dependency.clone());
        }
    }
    merged
}

/// The repositories recorded on a child node: the one repository the version
/// was discovered in if it is remote, nothing if it came from a local store,
/// and the ambient list if unknown.
fn effective_repositories(
    repository: Option<&ArtifactRepository>,
    ambient: &[RemoteRepository],
) -> Vec<RemoteRepository> {
    match repository {
        Some(ArtifactRepository::Remote(remote)) => vec![remote.clone()],
        Some(_) => Vec::new(),
        None => ambient.to_vec(),
    }
}
