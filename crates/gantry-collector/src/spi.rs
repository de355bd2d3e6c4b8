//! Contracts of the external collaborators the collector is wired with.

use std::collections::BTreeMap;

use gantry_core::descriptor::ArtifactDescriptor;
use gantry_core::error::RepositoryError;
use gantry_core::repository::RemoteRepository;

use crate::graph::{DependencyGraph, NodeId};
use crate::request::{DescriptorRequest, VersionRangeRequest, VersionRangeResult};
use crate::session::CollectSession;

/// Reads the metadata document of one concrete artifact.
pub trait DescriptorReader {
    fn read(
        &self,
        session: &CollectSession,
        request: &DescriptorRequest,
    ) -> Result<ArtifactDescriptor, RepositoryError>;
}

/// Expands a version constraint to the concrete versions available in the
/// given repositories, ascending.
pub trait VersionRangeResolver {
    fn resolve(
        &self,
        session: &CollectSession,
        request: &VersionRangeRequest,
    ) -> Result<VersionRangeResult, RepositoryError>;
}

/// Merges a parent repository list with newly declared repositories,
/// preserving the parent's entries first.
pub trait RepositoryManager {
    fn aggregate(
        &self,
        session: &CollectSession,
        dominant: &[RemoteRepository],
        recessive: &[RemoteRepository],
        recessive_is_raw: bool,
    ) -> Vec<RemoteRepository>;
}

/// Post-processes the collected graph, e.g. for conflict resolution. Invoked
/// exactly once, after collection completes.
pub trait GraphTransformer {
    fn transform(
        &self,
        graph: &mut DependencyGraph,
        root: NodeId,
        context: &mut TransformContext,
    ) -> Result<NodeId, RepositoryError>;
}

/// Context handed to the graph transformer. Carries a free-form stats map
/// when debug logging is enabled; transformers may add their own entries,
/// everything ends up in one debug log line.
#[derive(Debug, Default)]
pub struct TransformContext {
    stats: Option<BTreeMap<String, String>>,
}

impl TransformContext {
    pub(crate) fn new(with_stats: bool) -> Self {
        Self {
            stats: with_stats.then(BTreeMap::new),
        }
    }

    pub fn stats(&self) -> Option<&BTreeMap<String, String>> {
        self.stats.as_ref()
    }

    pub fn stats_mut(&mut self) -> Option<&mut BTreeMap<String, String>> {
        self.stats.as_mut()
    }
}
