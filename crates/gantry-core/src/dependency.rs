//! Dependency declarations: an artifact reference annotated with scope,
//! optionality, and exclusions, plus the management overrides applied to them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;

/// A transitive dependency to exclude, keyed by group and artifact id.
/// `*` acts as a wildcard in either position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Exclusion {
    pub group_id: String,
    pub artifact_id: String,
}

impl Exclusion {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }

    pub fn matches(&self, artifact: &Artifact) -> bool {
        (self.group_id == "*" || self.group_id == artifact.group_id())
            && (self.artifact_id == "*" || self.artifact_id == artifact.artifact_id())
    }
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

/// An artifact reference with scope, a tri-state optional flag, and a set of
/// exclusions. Dependencies are immutable; the `with_*` methods return new
/// instances.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    artifact: Artifact,
    scope: String,
    optional: Option<bool>,
    exclusions: Vec<Exclusion>,
}

impl Dependency {
    pub fn new(artifact: Artifact, scope: impl Into<String>) -> Self {
        Self {
            artifact,
            scope: scope.into(),
            optional: None,
            exclusions: Vec::new(),
        }
    }

    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The raw tri-state flag: explicitly optional, explicitly mandatory, or
    /// unset.
    pub fn optional(&self) -> Option<bool> {
        self.optional
    }

    pub fn is_optional(&self) -> bool {
        self.optional.unwrap_or(false)
    }

    pub fn exclusions(&self) -> &[Exclusion] {
        &self.exclusions
    }

    pub fn with_artifact(&self, artifact: Artifact) -> Self {
        let mut dependency = self.clone();
        dependency.artifact = artifact;
        dependency
    }

    pub fn with_scope(&self, scope: impl Into<String>) -> Self {
        let mut dependency = self.clone();
        dependency.scope = scope.into();
        dependency
    }

    pub fn with_optional(&self, optional: Option<bool>) -> Self {
        let mut dependency = self.clone();
        dependency.optional = optional;
        dependency
    }

    pub fn with_exclusions(&self, exclusions: Vec<Exclusion>) -> Self {
        let mut dependency = self.clone();
        dependency.exclusions = exclusions;
        dependency
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}", self.artifact, self.scope)?;
        if self.is_optional() {
            write!(f, ", optional")?;
        }
        write!(f, ")")
    }
}

/// A partial override produced by a dependency manager. Only the populated
/// fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyManagement {
    pub version: Option<String>,
    pub scope: Option<String>,
    pub optional: Option<bool>,
    pub properties: Option<BTreeMap<String, String>>,
    pub exclusions: Option<Vec<Exclusion>>,
}

impl DependencyManagement {
    pub fn is_empty(&self) -> bool {
        self.version.is_none()
            && self.scope.is_none()
            && self.optional.is_none()
            && self.properties.is_none()
            && self.exclusions.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusion_matching() {
        let artifact = Artifact::new("org.example", "lib", "1.0");
        assert!(Exclusion::new("org.example", "lib").matches(&artifact));
        assert!(Exclusion::new("org.example", "*").matches(&artifact));
        assert!(Exclusion::new("*", "*").matches(&artifact));
        assert!(!Exclusion::new("org.example", "other").matches(&artifact));
        assert!(!Exclusion::new("org.other", "lib").matches(&artifact));
    }

    #[test]
    fn mutators_return_new_instances() {
        let dependency = Dependency::new(Artifact::new("g", "a", "1.0"), "compile");
        let changed = dependency.with_scope("test").with_optional(Some(true));
        assert_eq!(dependency.scope(), "compile");
        assert_eq!(dependency.optional(), None);
        assert_eq!(changed.scope(), "test");
        assert_eq!(changed.optional(), Some(true));
    }

    #[test]
    fn optional_defaults_to_unset() {
        let dependency = Dependency::new(Artifact::new("g", "a", "1.0"), "compile");
        assert_eq!(dependency.optional(), None);
        assert!(!dependency.is_optional());
    }

    #[test]
    fn management_is_empty() {
        assert!(DependencyManagement::default().is_empty());
        let management = DependencyManagement {
            version: Some("2.0".to_string()),
            ..Default::default()
        };
        assert!(!management.is_empty());
    }
}
