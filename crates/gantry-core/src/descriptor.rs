//! The structured form of an artifact's metadata document.

use crate::artifact::Artifact;
use crate::dependency::Dependency;
use crate::repository::RemoteRepository;

/// Parsed metadata for one artifact: its own dependencies, its managed
/// dependency overrides, the repositories it prefers, relocations away from
/// its coordinates, and known aliases.
#[derive(Debug, Clone)]
pub struct ArtifactDescriptor {
    /// The artifact the descriptor actually describes. May differ from the
    /// requested artifact, e.g. after property enrichment or relocation.
    pub artifact: Artifact,
    pub dependencies: Vec<Dependency>,
    pub managed_dependencies: Vec<Dependency>,
    pub repositories: Vec<RemoteRepository>,
    /// Prior coordinates this artifact was relocated from, nearest first.
    pub relocations: Vec<Artifact>,
    pub aliases: Vec<Artifact>,
}

impl ArtifactDescriptor {
    /// An empty descriptor for an artifact that has no metadata document.
    pub fn new(artifact: Artifact) -> Self {
        Self {
            artifact,
            dependencies: Vec::new(),
            managed_dependencies: Vec::new(),
            repositories: Vec::new(),
            relocations: Vec::new(),
            aliases: Vec::new(),
        }
    }
}
