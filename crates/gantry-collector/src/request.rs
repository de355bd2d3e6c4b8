//! Requests exchanged with the collector and its collaborators.

use std::collections::HashMap;

use gantry_core::artifact::Artifact;
use gantry_core::dependency::Dependency;
use gantry_core::repository::{ArtifactRepository, RemoteRepository};
use gantry_core::version::{Version, VersionConstraint};

/// Input to one collection run.
///
/// Either `root` or `root_artifact` anchors the graph: with a `root`
/// dependency its descriptor contributes dependencies and management, while a
/// bare `root_artifact` only labels a synthetic root node above the seed
/// `dependencies`.
#[derive(Debug, Clone, Default)]
pub struct CollectRequest {
    pub root: Option<Dependency>,
    pub root_artifact: Option<Artifact>,
    pub dependencies: Vec<Dependency>,
    pub managed_dependencies: Vec<Dependency>,
    pub repositories: Vec<RemoteRepository>,
    /// Opaque string recorded on every node of the resulting graph.
    pub request_context: String,
    /// Opaque token for external correlation; the collector never inspects it.
    pub trace: Option<String>,
}

/// Request to expand a version constraint to concrete versions.
#[derive(Debug, Clone)]
pub struct VersionRangeRequest {
    pub artifact: Artifact,
    pub repositories: Vec<RemoteRepository>,
    pub request_context: String,
    pub trace: Option<String>,
}

/// Request to read the descriptor of one concrete artifact.
#[derive(Debug, Clone)]
pub struct DescriptorRequest {
    pub artifact: Artifact,
    pub repositories: Vec<RemoteRepository>,
    pub request_context: String,
    pub trace: Option<String>,
}

/// Outcome of a version range expansion: the matching versions in ascending
/// order, the constraint they were matched against, and optionally the
/// repository each version was discovered in.
#[derive(Debug, Clone)]
pub struct VersionRangeResult {
    /// Matching versions, ascending.
    pub versions: Vec<Version>,
    pub constraint: VersionConstraint,
    repositories: HashMap<String, ArtifactRepository>,
}

impl VersionRangeResult {
    pub fn new(constraint: VersionConstraint, versions: Vec<Version>) -> Self {
        Self {
            versions,
            constraint,
            repositories: HashMap::new(),
        }
    }

    /// Record the repository a version was discovered in.
    pub fn set_repository(&mut self, version: &Version, repository: ArtifactRepository) {
        self.repositories
            .insert(version.as_str().to_string(), repository);
    }

    pub fn repository_of(&self, version: &Version) -> Option<&ArtifactRepository> {
        self.repositories.get(version.as_str())
    }
}

#[cfg(test)]
mod tests {
    use gantry_core::repository::LocalRepository;

    use super::*;

    #[test]
    fn range_result_tracks_repositories_per_version() {
        let constraint = VersionConstraint::parse("[1,2)");
        let v1 = Version::parse("1.0");
        let v2 = Version::parse("1.5");
        let mut result = VersionRangeResult::new(constraint, vec![v1.clone(), v2.clone()]);

        let repo = ArtifactRepository::Remote(RemoteRepository::new("central", "https://repo"));
        result.set_repository(&v2, repo.clone());

        assert_eq!(result.repository_of(&v2), Some(&repo));
        assert_eq!(result.repository_of(&v1), None);

        let local = ArtifactRepository::Local(LocalRepository::new("/tmp/repo"));
        result.set_repository(&v1, local.clone());
        assert_eq!(result.repository_of(&v1), Some(&local));
    }
}
