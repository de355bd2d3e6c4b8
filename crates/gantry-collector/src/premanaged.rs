//! Application of dependency management to a raw dependency, with a record
//! of what was overridden.

use gantry_core::dependency::Dependency;

use crate::graph::{
    DependencyNode, PremanagedState, MANAGED_EXCLUSIONS, MANAGED_OPTIONAL, MANAGED_PROPERTIES,
    MANAGED_SCOPE, MANAGED_VERSION,
};
use crate::policy::DependencyManager;

/// A dependency with management applied, remembering the original values of
/// every overridden field. Overrides apply in a fixed order: version (unless
/// disabled), properties, scope, optional, exclusions.
pub(crate) struct PremanagedDependency {
    managed: Dependency,
    managed_bits: u8,
    premanaged_version: Option<String>,
    premanaged_scope: Option<String>,
    premanaged_optional: Option<Option<bool>>,
    verbose: bool,
}

impl PremanagedDependency {
    pub fn create(
        manager: Option<&dyn DependencyManager>,
        dependency: &Dependency,
        disable_version_management: bool,
        verbose: bool,
    ) -> Self {
        let mut managed = dependency.clone();
        let mut managed_bits = 0;
        let mut premanaged_version = None;
        let mut premanaged_scope = None;
        let mut premanaged_optional = None;

        if let Some(management) = manager.and_then(|m| m.manage(dependency)) {
            if let Some(version) = management.version {
                if !disable_version_management {
                    premanaged_version = Some(managed.artifact().version().to_string());
                    let artifact = managed.artifact().with_version(version);
                    managed = managed.with_artifact(artifact);
                    managed_bits |= MANAGED_VERSION;
                }
            }
            if let Some(properties) = management.properties {
                let artifact = managed.artifact().with_properties(properties);
                managed = managed.with_artifact(artifact);
                managed_bits |= MANAGED_PROPERTIES;
            }
            if let Some(scope) = management.scope {
                premanaged_scope = Some(managed.scope().to_string());
                managed = managed.with_scope(scope);
                managed_bits |= MANAGED_SCOPE;
            }
            if let Some(optional) = management.optional {
                premanaged_optional = Some(managed.optional());
                managed = managed.with_optional(Some(optional));
                managed_bits |= MANAGED_OPTIONAL;
            }
            if let Some(exclusions) = management.exclusions {
                managed = managed.with_exclusions(exclusions);
                managed_bits |= MANAGED_EXCLUSIONS;
            }
        }

        Self {
            managed,
            managed_bits,
            premanaged_version,
            premanaged_scope,
            premanaged_optional,
            verbose,
        }
    }

    /// The dependency with all applicable overrides applied.
    pub fn dependency(&self) -> &Dependency {
        &self.managed
    }

    /// Write the management outcome onto a node: always the bits, and the
    /// original values only in verbose mode.
    pub fn apply_to(&self, node: &mut DependencyNode) {
        node.managed_bits = self.managed_bits;
        if self.verbose && self.managed_bits != 0 {
            node.premanaged = Some(PremanagedState {
                version: self.premanaged_version.clone(),
                scope: self.premanaged_scope.clone(),
                optional: self.premanaged_optional,
            });
        }
    }
}
