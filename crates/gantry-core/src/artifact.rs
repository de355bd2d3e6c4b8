//! Artifact identity: the coordinate tuple plus free-form properties.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Property key marking an artifact as locally available. An artifact that
/// carries this property has no resolvable remote descriptor.
pub const LOCAL_PATH: &str = "localPath";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ArtifactData {
    group_id: String,
    artifact_id: String,
    classifier: String,
    extension: String,
    version: String,
    properties: BTreeMap<String, String>,
}

/// An identified build output: `(group, id, classifier, extension, version)`
/// plus a property map.
///
/// Artifacts are immutable; the `with_*` methods return new instances. The
/// record lives behind an `Arc`, so cloning is cheap and interned artifacts
/// compare by pointer before falling back to a field comparison.
#[derive(Debug, Clone)]
pub struct Artifact {
    data: Arc<ArtifactData>,
}

impl Artifact {
    /// Create an artifact with the default `jar` extension and no classifier.
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            data: Arc::new(ArtifactData {
                group_id: group_id.into(),
                artifact_id: artifact_id.into(),
                classifier: String::new(),
                extension: "jar".to_string(),
                version: version.into(),
                properties: BTreeMap::new(),
            }),
        }
    }

    /// Parse `group:artifact[:extension[:classifier]]:version`.
    pub fn parse(coordinates: &str) -> Option<Self> {
        let parts: Vec<&str> = coordinates.split(':').collect();
        let (group_id, artifact_id, extension, classifier, version) = match parts.as_slice() {
            [g, a, v] => (*g, *a, "jar", "", *v),
            [g, a, e, v] => (*g, *a, *e, "", *v),
            [g, a, e, c, v] => (*g, *a, *e, *c, *v),
            _ => return None,
        };
        if group_id.is_empty() || artifact_id.is_empty() || version.is_empty() {
            return None;
        }
        Some(Self {
            data: Arc::new(ArtifactData {
                group_id: group_id.to_string(),
                artifact_id: artifact_id.to_string(),
                classifier: classifier.to_string(),
                extension: extension.to_string(),
                version: version.to_string(),
                properties: BTreeMap::new(),
            }),
        })
    }

    pub fn group_id(&self) -> &str {
        &self.data.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.data.artifact_id
    }

    pub fn classifier(&self) -> &str {
        &self.data.classifier
    }

    pub fn extension(&self) -> &str {
        &self.data.extension
    }

    pub fn version(&self) -> &str {
        &self.data.version
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.data.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.data.properties.get(key).map(String::as_str)
    }

    /// The local path recorded for this artifact, if any. Artifacts with a
    /// local path are treated as lacking a remote descriptor.
    pub fn local_path(&self) -> Option<&str> {
        self.property(LOCAL_PATH)
    }

    pub fn with_version(&self, version: impl Into<String>) -> Self {
        self.update(|data| data.version = version.into())
    }

    pub fn with_classifier(&self, classifier: impl Into<String>) -> Self {
        self.update(|data| data.classifier = classifier.into())
    }

    pub fn with_extension(&self, extension: impl Into<String>) -> Self {
        self.update(|data| data.extension = extension.into())
    }

    /// Replace the whole property map.
    pub fn with_properties(&self, properties: BTreeMap<String, String>) -> Self {
        self.update(|data| data.properties = properties)
    }

    /// Set a single property.
    pub fn with_property(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.update(|data| {
            data.properties.insert(key.into(), value.into());
        })
    }

    /// Coordinate equality: group, id, classifier, and extension match, the
    /// version is ignored. This is the cycle-detection key.
    pub fn same_coordinates(&self, other: &Artifact) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
            || (self.data.group_id == other.data.group_id
                && self.data.artifact_id == other.data.artifact_id
                && self.data.classifier == other.data.classifier
                && self.data.extension == other.data.extension)
    }

    /// `group:id:classifier:extension`, the key used for dominance merges and
    /// dependency-management lookups.
    pub fn coordinate_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.data.group_id, self.data.artifact_id, self.data.classifier, self.data.extension
        )
    }

    fn update(&self, mutate: impl FnOnce(&mut ArtifactData)) -> Self {
        let mut data = (*self.data).clone();
        mutate(&mut data);
        Self {
            data: Arc::new(data),
        }
    }
}

impl PartialEq for Artifact {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data) || self.data == other.data
    }
}

impl Eq for Artifact {}

impl Hash for Artifact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.data.group_id, self.data.artifact_id, self.data.extension
        )?;
        if !self.data.classifier.is_empty() {
            write!(f, ":{}", self.data.classifier)?;
        }
        write!(f, ":{}", self.data.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_three_parts() {
        let a = Artifact::parse("org.example:lib:1.0").unwrap();
        assert_eq!(a.group_id(), "org.example");
        assert_eq!(a.artifact_id(), "lib");
        assert_eq!(a.extension(), "jar");
        assert_eq!(a.classifier(), "");
        assert_eq!(a.version(), "1.0");
    }

    #[test]
    fn parse_five_parts() {
        let a = Artifact::parse("org.example:lib:jar:sources:1.0").unwrap();
        assert_eq!(a.classifier(), "sources");
    }

    #[test]
    fn parse_rejects_wrong_arity() {
        assert!(Artifact::parse("org.example:lib").is_none());
        assert!(Artifact::parse("a:b:c:d:e:f").is_none());
        assert!(Artifact::parse("").is_none());
    }

    #[test]
    fn with_version_leaves_original_untouched() {
        let a = Artifact::new("g", "a", "1.0");
        let b = a.with_version("2.0");
        assert_eq!(a.version(), "1.0");
        assert_eq!(b.version(), "2.0");
        assert!(a.same_coordinates(&b));
    }

    #[test]
    fn coordinate_equality_ignores_version() {
        let a = Artifact::new("g", "a", "1.0");
        let b = Artifact::new("g", "a", "2.0");
        assert!(a.same_coordinates(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn coordinate_equality_respects_classifier() {
        let a = Artifact::new("g", "a", "1.0");
        let b = a.with_classifier("sources");
        assert!(!a.same_coordinates(&b));
    }

    #[test]
    fn local_path_property() {
        let a = Artifact::new("g", "a", "1.0");
        assert!(a.local_path().is_none());
        let b = a.with_property(LOCAL_PATH, "/tmp/a.jar");
        assert_eq!(b.local_path(), Some("/tmp/a.jar"));
    }

    #[test]
    fn display_with_and_without_classifier() {
        let a = Artifact::new("g", "a", "1.0");
        assert_eq!(a.to_string(), "g:a:jar:1.0");
        let b = a.with_classifier("sources");
        assert_eq!(b.to_string(), "g:a:jar:sources:1.0");
    }
}
