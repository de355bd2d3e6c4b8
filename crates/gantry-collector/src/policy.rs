//! Pluggable collection policies and their standard implementations.
//!
//! Each policy forms a cooperative chain down the tree: `derive_child` is
//! called once per recursion step and returns the value governing the child
//! scope, or `None` to keep using the parent's instance. Returning `None`
//! whenever nothing changed matters, because memoized subtrees are keyed on
//! policy identity.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use gantry_core::dependency::{Dependency, DependencyManagement, Exclusion};
use gantry_core::error::RepositoryError;

use crate::context::{CollectionContext, VersionFilterContext};

/// Decides whether a dependency enters the graph at all.
pub trait DependencySelector {
    fn select(&self, dependency: &Dependency) -> bool;
    fn derive_child(&self, context: &CollectionContext) -> Option<Arc<dyn DependencySelector>>;
}

/// Produces management overrides for a dependency.
pub trait DependencyManager {
    fn manage(&self, dependency: &Dependency) -> Option<DependencyManagement>;
    fn derive_child(&self, context: &CollectionContext) -> Option<Arc<dyn DependencyManager>>;
}

/// Decides whether the dependencies of a dependency are collected.
pub trait DependencyTraverser {
    fn traverse(&self, dependency: &Dependency) -> bool;
    fn derive_child(&self, context: &CollectionContext) -> Option<Arc<dyn DependencyTraverser>>;
}

/// Thins out the versions a range expanded to, before nodes are created for
/// them. Only consulted for true range constraints, never for pinned
/// versions.
pub trait VersionFilter {
    fn filter_versions(&self, context: &mut VersionFilterContext<'_>)
        -> Result<(), RepositoryError>;
    fn derive_child(&self, context: &CollectionContext) -> Option<Arc<dyn VersionFilter>>;
}

/// Rejects dependencies matching an exclusion set. Child derivation unions
/// the child dependency's own exclusions into the set.
#[derive(Debug, Clone, Default)]
pub struct ExclusionDependencySelector {
    exclusions: BTreeSet<Exclusion>,
}

impl ExclusionDependencySelector {
    pub fn new(exclusions: impl IntoIterator<Item = Exclusion>) -> Self {
        Self {
            exclusions: exclusions.into_iter().collect(),
        }
    }
}

impl DependencySelector for ExclusionDependencySelector {
    fn select(&self, dependency: &Dependency) -> bool {
        !self
            .exclusions
            .iter()
            .any(|exclusion| exclusion.matches(dependency.artifact()))
    }

    fn derive_child(&self, context: &CollectionContext) -> Option<Arc<dyn DependencySelector>> {
        let dependency = context.dependency()?;
        if dependency
            .exclusions()
            .iter()
            .all(|exclusion| self.exclusions.contains(exclusion))
        {
            return None;
        }
        let mut exclusions = self.exclusions.clone();
        exclusions.extend(dependency.exclusions().iter().cloned());
        Some(Arc::new(Self { exclusions }))
    }
}

/// Cuts optional dependencies below the direct level: the root's own
/// dependencies may be optional, anything deeper may not.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalDependencySelector {
    depth: u8,
}

impl DependencySelector for OptionalDependencySelector {
    fn select(&self, dependency: &Dependency) -> bool {
        self.depth < 2 || !dependency.is_optional()
    }

    fn derive_child(&self, _context: &CollectionContext) -> Option<Arc<dyn DependencySelector>> {
        if self.depth >= 2 {
            None
        } else {
            Some(Arc::new(Self {
                depth: self.depth + 1,
            }))
        }
    }
}

/// Cuts dependencies of the configured scopes below the direct level,
/// typically `test` and `provided`.
#[derive(Debug, Clone, Default)]
pub struct ScopeDependencySelector {
    depth: u8,
    excluded: Vec<String>,
}

impl ScopeDependencySelector {
    pub fn new<S: Into<String>>(excluded: impl IntoIterator<Item = S>) -> Self {
        Self {
            depth: 0,
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }
}

impl DependencySelector for ScopeDependencySelector {
    fn select(&self, dependency: &Dependency) -> bool {
        self.depth < 2 || !self.excluded.iter().any(|scope| scope == dependency.scope())
    }

    fn derive_child(&self, _context: &CollectionContext) -> Option<Arc<dyn DependencySelector>> {
        if self.depth >= 2 {
            None
        } else {
            Some(Arc::new(Self {
                depth: self.depth + 1,
                excluded: self.excluded.clone(),
            }))
        }
    }
}

/// Applies dependency management the classic way: overrides collected while
/// descending apply from two levels below their declaration, and the
/// declaration nearest to the root wins.
#[derive(Debug, Clone, Default)]
pub struct ClassicDependencyManager {
    depth: u8,
    versions: HashMap<String, String>,
    scopes: HashMap<String, String>,
    optionals: HashMap<String, bool>,
    properties: HashMap<String, BTreeMap<String, String>>,
    exclusions: HashMap<String, Vec<Exclusion>>,
}

impl DependencyManager for ClassicDependencyManager {
    fn manage(&self, dependency: &Dependency) -> Option<DependencyManagement> {
        if self.depth < 2 {
            return None;
        }
        let key = dependency.artifact().coordinate_key();
        let management = DependencyManagement {
            version: self.versions.get(&key).cloned(),
            scope: self.scopes.get(&key).cloned(),
            optional: self.optionals.get(&key).copied(),
            properties: self.properties.get(&key).cloned(),
            exclusions: self.exclusions.get(&key).cloned(),
        };
        (!management.is_empty()).then_some(management)
    }

    fn derive_child(&self, context: &CollectionContext) -> Option<Arc<dyn DependencyManager>> {
        if self.depth >= 2 && context.managed_dependencies().is_empty() {
            return None;
        }
        let mut next = self.clone();
        next.depth = self.depth.saturating_add(1);
        for managed in context.managed_dependencies() {
            let key = managed.artifact().coordinate_key();
            let version = managed.artifact().version();
            if !version.is_empty() {
                next.versions
                    .entry(key.clone())
                    .or_insert_with(|| version.to_string());
            }
            if !managed.scope().is_empty() {
                next.scopes
                    .entry(key.clone())
                    .or_insert_with(|| managed.scope().to_string());
            }
            if let Some(optional) = managed.optional() {
                next.optionals.entry(key.clone()).or_insert(optional);
            }
            if !managed.artifact().properties().is_empty() {
                next.properties
                    .entry(key.clone())
                    .or_insert_with(|| managed.artifact().properties().clone());
            }
            if !managed.exclusions().is_empty() {
                next.exclusions
                    .entry(key)
                    .or_insert_with(|| managed.exclusions().to_vec());
            }
        }
        Some(Arc::new(next))
    }
}

/// Does not descend beneath artifacts that already exist locally; whatever
/// they need is assumed to be bundled.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalPathTraverser;

impl DependencyTraverser for LocalPathTraverser {
    fn traverse(&self, dependency: &Dependency) -> bool {
        dependency.artifact().local_path().is_none()
    }

    fn derive_child(&self, _context: &CollectionContext) -> Option<Arc<dyn DependencyTraverser>> {
        None
    }
}

/// Keeps only the highest version of an expanded range.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighestVersionFilter;

impl VersionFilter for HighestVersionFilter {
    fn filter_versions(
        &self,
        context: &mut VersionFilterContext<'_>,
    ) -> Result<(), RepositoryError> {
        if let Some(highest) = context.versions().last().cloned() {
            context.retain(|version| *version == highest);
        }
        Ok(())
    }

    fn derive_child(&self, _context: &CollectionContext) -> Option<Arc<dyn VersionFilter>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use gantry_core::artifact::Artifact;
    use gantry_core::version::{Version, VersionConstraint};

    use super::*;
    use crate::request::VersionRangeResult;

    fn dependency(coordinates: &str) -> Dependency {
        Dependency::new(Artifact::parse(coordinates).unwrap(), "compile")
    }

    fn context_for(dependency: Dependency, managed: Vec<Dependency>) -> CollectionContext {
        CollectionContext::new(None, Some(dependency), managed)
    }

    #[test]
    fn exclusion_selector_rejects_matches() {
        let selector =
            ExclusionDependencySelector::new([Exclusion::new("g", "banned")]);
        assert!(selector.select(&dependency("g:allowed:1")));
        assert!(!selector.select(&dependency("g:banned:1")));
    }

    #[test]
    fn exclusion_selector_derives_only_on_new_exclusions() {
        let selector = ExclusionDependencySelector::default();

        let plain = context_for(dependency("g:a:1"), Vec::new());
        assert!(selector.derive_child(&plain).is_none());

        let excluding = dependency("g:a:1").with_exclusions(vec![Exclusion::new("g", "b")]);
        let context = context_for(excluding, Vec::new());
        let derived = selector.derive_child(&context).unwrap();
        assert!(!derived.select(&dependency("g:b:1")));
    }

    #[test]
    fn optional_selector_cuts_below_direct_level() {
        let root = OptionalDependencySelector::default();
        let optional = dependency("g:a:1").with_optional(Some(true));
        assert!(root.select(&optional));

        let context = context_for(dependency("g:p:1"), Vec::new());
        let level1 = root.derive_child(&context).unwrap();
        let level2 = level1.derive_child(&context).unwrap();
        assert!(level1.select(&optional));
        assert!(!level2.select(&optional));
        // settled at depth 2, no further derivation needed
        assert!(level2.derive_child(&context).is_none());
    }

    #[test]
    fn scope_selector_cuts_configured_scopes() {
        let root = ScopeDependencySelector::new(["test", "provided"]);
        let context = context_for(dependency("g:p:1"), Vec::new());
        let level2 = root
            .derive_child(&context)
            .unwrap()
            .derive_child(&context)
            .unwrap();

        let test_dep = dependency("g:a:1").with_scope("test");
        assert!(root.select(&test_dep));
        assert!(!level2.select(&test_dep));
        assert!(level2.select(&dependency("g:a:1")));
    }

    #[test]
    fn classic_manager_applies_from_depth_two() {
        let manager = ClassicDependencyManager::default();
        let managed = dependency("g:c:2.0");
        let context = context_for(dependency("g:p:1"), vec![managed]);

        let level1 = manager.derive_child(&context).unwrap();
        assert!(level1.manage(&dependency("g:c:1.0")).is_none());

        let empty = context_for(dependency("g:p:1"), Vec::new());
        let level2 = level1.derive_child(&empty).unwrap();
        let management = level2.manage(&dependency("g:c:1.0")).unwrap();
        assert_eq!(management.version.as_deref(), Some("2.0"));
        assert!(level2.manage(&dependency("g:other:1.0")).is_none());
    }

    #[test]
    fn classic_manager_nearest_declaration_wins() {
        let manager = ClassicDependencyManager::default();
        let near = context_for(dependency("g:p:1"), vec![dependency("g:c:2.0")]);
        let far = context_for(dependency("g:q:1"), vec![dependency("g:c:9.9")]);

        let level2 = manager
            .derive_child(&near)
            .unwrap()
            .derive_child(&far)
            .unwrap();
        let management = level2.manage(&dependency("g:c:1.0")).unwrap();
        assert_eq!(management.version.as_deref(), Some("2.0"));
    }

    #[test]
    fn classic_manager_skips_derivation_when_settled() {
        let manager = ClassicDependencyManager::default();
        let empty = context_for(dependency("g:p:1"), Vec::new());
        let level2 = manager
            .derive_child(&empty)
            .unwrap()
            .derive_child(&empty)
            .unwrap();
        assert!(level2.derive_child(&empty).is_none());
    }

    #[test]
    fn local_path_traverser() {
        let traverser = LocalPathTraverser;
        assert!(traverser.traverse(&dependency("g:a:1")));

        let local = Dependency::new(
            Artifact::parse("g:a:1")
                .unwrap()
                .with_property(gantry_core::artifact::LOCAL_PATH, "/tmp/a.jar"),
            "compile",
        );
        assert!(!traverser.traverse(&local));
    }

    #[test]
    fn highest_version_filter_keeps_last() {
        let dependency = dependency("g:a:[1,2)");
        let range = VersionRangeResult::new(
            VersionConstraint::parse("[1,2)"),
            vec![
                Version::parse("1.0"),
                Version::parse("1.5"),
                Version::parse("1.7"),
            ],
        );
        let mut context = VersionFilterContext::new(&dependency, &range);
        HighestVersionFilter.filter_versions(&mut context).unwrap();
        assert_eq!(context.versions(), &[Version::parse("1.7")]);
    }
}
