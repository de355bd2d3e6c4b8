//! Call-scoped collector configuration.

use std::sync::Arc;

use crate::policy::{DependencyManager, DependencySelector, DependencyTraverser, VersionFilter};
use crate::spi::GraphTransformer;

/// Configuration for one collection run: the four policies, the optional
/// graph transformer, and bounds on recorded failures.
///
/// Policy objects must tolerate repeated invocation within one run; the
/// collector never shares them across runs of different sessions.
#[derive(Clone)]
pub struct CollectSession {
    pub selector: Option<Arc<dyn DependencySelector>>,
    pub manager: Option<Arc<dyn DependencyManager>>,
    pub traverser: Option<Arc<dyn DependencyTraverser>>,
    pub version_filter: Option<Arc<dyn VersionFilter>>,
    pub transformer: Option<Arc<dyn GraphTransformer>>,
    /// Ignore the repositories descriptors declare and keep using the
    /// request's list throughout the walk.
    pub ignore_descriptor_repositories: bool,
    /// Attach pre-management values to nodes for later introspection.
    pub verbose_premanaged: bool,
    /// Most exceptions kept on a result; `None` is unbounded.
    pub max_exceptions: Option<usize>,
    /// Most cycles kept on a result; `None` is unbounded.
    pub max_cycles: Option<usize>,
}

impl Default for CollectSession {
    fn default() -> Self {
        Self {
            selector: None,
            manager: None,
            traverser: None,
            version_filter: None,
            transformer: None,
            ignore_descriptor_repositories: false,
            verbose_premanaged: false,
            max_exceptions: Some(50),
            max_cycles: Some(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bounds() {
        let session = CollectSession::default();
        assert_eq!(session.max_exceptions, Some(50));
        assert_eq!(session.max_cycles, Some(10));
        assert!(!session.verbose_premanaged);
        assert!(!session.ignore_descriptor_repositories);
    }
}
