//! Process-wide registry of feature factories, keyed by (name, version).

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{FeatureError, Result};
use crate::feature::FeatureFactory;
use crate::version::{Version, VersionEntry, VersionSelector, VersionTable};

static GLOBAL: Lazy<FeatureRegistry> = Lazy::new(FeatureRegistry::new);

/// Append-only mapping from feature name to its [`VersionTable`].
///
/// The registry is a cheap cloneable handle; clones share state. Capability
/// modules register their factories here at load time, sessions resolve
/// against it afterwards. Tables are never removed.
#[derive(Clone, Default)]
pub struct FeatureRegistry {
    tables: Arc<RwLock<HashMap<String, VersionTable>>>,
}

impl FeatureRegistry {
    /// Create an isolated registry. Tests and embedders that scope feature
    /// sets use this; production modules usually go through
    /// [`global`](Self::global).
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry capability modules register into.
    pub fn global() -> FeatureRegistry {
        GLOBAL.clone()
    }

    /// Register a factory for `(name, version)`, creating the name's table
    /// if absent. Registering a duplicate pair overwrites the prior entry.
    /// The factory is not invoked; instantiation is lazy.
    pub fn register(
        &self,
        name: impl Into<String>,
        version: Version,
        factory: FeatureFactory,
        stable: bool,
    ) {
        let name = name.into();
        let mut tables = self.tables.write();
        let replaced = tables.entry(name.clone()).or_default().insert(VersionEntry {
            version,
            stable,
            factory,
        });

        if replaced.is_some() {
            tracing::warn!(feature = %name, version, "re-registered feature version, last wins");
        } else {
            tracing::info!(feature = %name, version, stable, "registered feature");
        }
    }

    /// Whether any version of `name` is registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.tables.read().contains_key(name)
    }

    /// Every name with at least one registered version, sorted.
    pub fn available_features(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Selector strings usable against `name`: `latest`, `stable` only if a
    /// stable entry exists, then concrete versions descending.
    pub fn available_versions(&self, name: &str) -> Result<Vec<String>> {
        let tables = self.tables.read();
        let table = tables
            .get(name)
            .ok_or_else(|| FeatureError::UnknownFeature(name.to_string()))?;
        Ok(table.selector_labels())
    }

    /// Resolve `(name, selector)` to a registered entry.
    pub fn resolve(&self, name: &str, selector: VersionSelector) -> Result<VersionEntry> {
        let tables = self.tables.read();
        let table = tables
            .get(name)
            .ok_or_else(|| FeatureError::UnknownFeature(name.to_string()))?;

        match selector {
            VersionSelector::Latest => table
                .latest()
                .cloned()
                // Tables are non-empty once created, so latest is derivable.
                .ok_or_else(|| FeatureError::UnknownFeature(name.to_string())),
            VersionSelector::Stable => table
                .stable()
                .cloned()
                .ok_or_else(|| FeatureError::NoStableVersion(name.to_string())),
            VersionSelector::Exact(version) => table
                .exact(version)
                .cloned()
                .ok_or_else(|| FeatureError::version_not_found(name, version)),
        }
    }
}

impl std::fmt::Debug for FeatureRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureRegistry")
            .field("features", &self.available_features())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;
    use pretty_assertions::assert_eq;
    use prism_session::SessionHandle;

    struct NoopFeature;

    impl Feature for NoopFeature {
        fn on_attach(&mut self, _session: &SessionHandle) -> bool {
            true
        }

        fn on_detach(&mut self, _session: &SessionHandle) {}
    }

    fn noop_factory() -> FeatureFactory {
        Arc::new(|_session, _config| Box::new(NoopFeature))
    }

    #[test]
    fn test_resolve_exact() {
        let registry = FeatureRegistry::new();
        registry.register("xr-hit-test", 1, noop_factory(), false);
        registry.register("xr-hit-test", 2, noop_factory(), true);

        let entry = registry
            .resolve("xr-hit-test", VersionSelector::Exact(1))
            .unwrap();
        assert_eq!(entry.version, 1);
        assert!(!entry.stable);
    }

    #[test]
    fn test_resolve_latest_tracks_later_registration() {
        let registry = FeatureRegistry::new();
        registry.register("xr-anchors", 1, noop_factory(), false);

        let entry = registry
            .resolve("xr-anchors", VersionSelector::Latest)
            .unwrap();
        assert_eq!(entry.version, 1);

        registry.register("xr-anchors", 4, noop_factory(), false);
        let entry = registry
            .resolve("xr-anchors", VersionSelector::Latest)
            .unwrap();
        assert_eq!(entry.version, 4);
    }

    #[test]
    fn test_resolve_stable_fails_until_one_exists() {
        let registry = FeatureRegistry::new();
        registry.register("xr-hand-tracking", 1, noop_factory(), false);

        assert!(matches!(
            registry.resolve("xr-hand-tracking", VersionSelector::Stable),
            Err(FeatureError::NoStableVersion(_))
        ));

        registry.register("xr-hand-tracking", 2, noop_factory(), true);
        let entry = registry
            .resolve("xr-hand-tracking", VersionSelector::Stable)
            .unwrap();
        assert_eq!(entry.version, 2);
    }

    #[test]
    fn test_resolve_unknown_feature() {
        let registry = FeatureRegistry::new();
        let err = registry
            .resolve("never-registered", VersionSelector::Latest)
            .unwrap_err();
        assert!(matches!(err, FeatureError::UnknownFeature(name) if name == "never-registered"));
    }

    #[test]
    fn test_resolve_version_not_found() {
        let registry = FeatureRegistry::new();
        registry.register("xr-hit-test", 1, noop_factory(), false);

        assert!(matches!(
            registry.resolve("xr-hit-test", VersionSelector::Exact(9)),
            Err(FeatureError::VersionNotFound { version: 9, .. })
        ));
    }

    #[test]
    fn test_available_features_sorted() {
        let registry = FeatureRegistry::new();
        registry.register("xr-plane-detection", 1, noop_factory(), false);
        registry.register("xr-anchors", 1, noop_factory(), false);

        assert_eq!(
            registry.available_features(),
            vec!["xr-anchors", "xr-plane-detection"]
        );
    }

    #[test]
    fn test_available_versions_listing() {
        let registry = FeatureRegistry::new();
        registry.register("xr-hit-test", 1, noop_factory(), false);
        registry.register("xr-hit-test", 2, noop_factory(), true);

        assert_eq!(
            registry.available_versions("xr-hit-test").unwrap(),
            vec!["latest", "stable", "2", "1"]
        );
        assert!(matches!(
            registry.available_versions("missing"),
            Err(FeatureError::UnknownFeature(_))
        ));
    }

    #[test]
    fn test_clones_share_tables() {
        let registry = FeatureRegistry::new();
        let clone = registry.clone();

        registry.register("xr-hit-test", 1, noop_factory(), false);
        assert!(clone.is_registered("xr-hit-test"));
    }

    #[test]
    fn test_global_is_shared() {
        // Use a name no other test touches; the global registry is
        // process-wide state.
        FeatureRegistry::global().register("test-global-probe", 1, noop_factory(), false);
        assert!(FeatureRegistry::global().is_registered("test-global-probe"));
    }
}
