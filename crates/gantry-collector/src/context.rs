//! Call-scoped contexts handed to policies during collection.

use gantry_core::artifact::Artifact;
use gantry_core::dependency::Dependency;
use gantry_core::repository::ArtifactRepository;
use gantry_core::version::{Version, VersionConstraint};

use crate::request::VersionRangeResult;

/// Immutable snapshot of one recursion step, passed to every policy
/// derivation.
#[derive(Debug, Clone)]
pub struct CollectionContext {
    artifact: Option<Artifact>,
    dependency: Option<Dependency>,
    managed_dependencies: Vec<Dependency>,
}

impl CollectionContext {
    pub fn new(
        artifact: Option<Artifact>,
        dependency: Option<Dependency>,
        managed_dependencies: Vec<Dependency>,
    ) -> Self {
        Self {
            artifact,
            dependency,
            managed_dependencies,
        }
    }

    /// The root artifact of the ongoing collection, if the request named one.
    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    /// The dependency whose children are about to be processed, or `None`
    /// when seeding the walk from a bare root artifact.
    pub fn dependency(&self) -> Option<&Dependency> {
        self.dependency.as_ref()
    }

    /// Managed dependencies declared at this level.
    pub fn managed_dependencies(&self) -> &[Dependency] {
        &self.managed_dependencies
    }
}

/// Per-call context a version filter works on: the dependency, the range
/// result it came from, and the list of surviving versions.
#[derive(Debug)]
pub struct VersionFilterContext<'a> {
    dependency: &'a Dependency,
    range: &'a VersionRangeResult,
    versions: Vec<Version>,
}

impl<'a> VersionFilterContext<'a> {
    pub fn new(dependency: &'a Dependency, range: &'a VersionRangeResult) -> Self {
        Self {
            dependency,
            range,
            versions: range.versions.clone(),
        }
    }

    pub fn dependency(&self) -> &Dependency {
        self.dependency
    }

    pub fn constraint(&self) -> &VersionConstraint {
        &self.range.constraint
    }

    pub fn repository_of(&self, version: &Version) -> Option<&ArtifactRepository> {
        self.range.repository_of(version)
    }

    /// The versions still in play, ascending.
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// Drop every version the predicate rejects.
    pub fn retain(&mut self, keep: impl FnMut(&Version) -> bool) {
        self.versions.retain(keep);
    }

    pub(crate) fn into_versions(self) -> Vec<Version> {
        self.versions
    }
}
