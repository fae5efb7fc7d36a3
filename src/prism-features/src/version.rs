//! Version numbers, selectors and the per-feature version table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::FeatureError;
use crate::feature::FeatureFactory;
use crate::{LATEST_SELECTOR, STABLE_SELECTOR};

/// A concrete feature version. Positive, strictly ordered, higher is newer.
pub type Version = u32;

/// How a caller picks a version of a feature.
///
/// Parses from the selector strings exposed by
/// [`available_versions`](crate::registry::FeatureRegistry::available_versions):
///
/// ```rust
/// use prism_features::VersionSelector;
///
/// let latest: VersionSelector = "latest".parse().unwrap();
/// assert_eq!(latest, VersionSelector::Latest);
///
/// let exact: VersionSelector = "2".parse().unwrap();
/// assert_eq!(exact, VersionSelector::Exact(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSelector {
    /// The highest registered version.
    Latest,
    /// The highest version explicitly marked stable.
    Stable,
    /// An exact version number.
    #[serde(untagged)]
    Exact(Version),
}

impl std::fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latest => write!(f, "{LATEST_SELECTOR}"),
            Self::Stable => write!(f, "{STABLE_SELECTOR}"),
            Self::Exact(version) => write!(f, "{version}"),
        }
    }
}

impl FromStr for VersionSelector {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            LATEST_SELECTOR => Ok(Self::Latest),
            STABLE_SELECTOR => Ok(Self::Stable),
            other => other
                .parse::<Version>()
                .map(Self::Exact)
                .map_err(|_| FeatureError::InvalidSelector(s.to_string())),
        }
    }
}

impl From<Version> for VersionSelector {
    fn from(version: Version) -> Self {
        Self::Exact(version)
    }
}

/// One registered implementation of a feature.
///
/// The factory is not invoked at registration time; instantiation is lazy.
#[derive(Clone)]
pub struct VersionEntry {
    /// The version this entry implements.
    pub version: Version,
    /// Whether this version is vetted as stable.
    pub stable: bool,
    /// Constructor for feature instances.
    pub factory: FeatureFactory,
}

impl std::fmt::Debug for VersionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionEntry")
            .field("version", &self.version)
            .field("stable", &self.stable)
            .finish()
    }
}

/// Ordered collection of [`VersionEntry`] values for one feature name.
///
/// Pure data plus lookup; all side effects live in the registry and manager.
#[derive(Debug, Default, Clone)]
pub struct VersionTable {
    entries: BTreeMap<Version, VersionEntry>,
}

impl VersionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. A duplicate version overwrites the prior entry;
    /// registration is trusted module-load code and last wins.
    pub fn insert(&mut self, entry: VersionEntry) -> Option<VersionEntry> {
        self.entries.insert(entry.version, entry)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entry with the highest version, if any.
    pub fn latest(&self) -> Option<&VersionEntry> {
        self.entries.values().next_back()
    }

    /// Entry with the highest version marked stable, if any.
    pub fn stable(&self) -> Option<&VersionEntry> {
        self.entries.values().rev().find(|entry| entry.stable)
    }

    /// Entry with exactly this version, if registered.
    pub fn exact(&self, version: Version) -> Option<&VersionEntry> {
        self.entries.get(&version)
    }

    /// Concrete versions, newest first.
    pub fn versions_desc(&self) -> impl Iterator<Item = Version> + '_ {
        self.entries.keys().rev().copied()
    }

    /// Selector strings a caller may use against this table: `latest`,
    /// then `stable` only if some entry is marked stable, then every
    /// concrete version descending.
    pub fn selector_labels(&self) -> Vec<String> {
        let mut labels = vec![LATEST_SELECTOR.to_string()];
        if self.stable().is_some() {
            labels.push(STABLE_SELECTOR.to_string());
        }
        labels.extend(self.versions_desc().map(|v| v.to_string()));
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Feature;
    use pretty_assertions::assert_eq;
    use prism_session::SessionHandle;
    use std::sync::Arc;

    struct NoopFeature;

    impl Feature for NoopFeature {
        fn on_attach(&mut self, _session: &SessionHandle) -> bool {
            true
        }

        fn on_detach(&mut self, _session: &SessionHandle) {}
    }

    fn entry(version: Version, stable: bool) -> VersionEntry {
        VersionEntry {
            version,
            stable,
            factory: Arc::new(|_session, _config| Box::new(NoopFeature)),
        }
    }

    #[test]
    fn test_selector_parse() {
        assert_eq!(
            "latest".parse::<VersionSelector>().unwrap(),
            VersionSelector::Latest
        );
        assert_eq!(
            "stable".parse::<VersionSelector>().unwrap(),
            VersionSelector::Stable
        );
        assert_eq!(
            "7".parse::<VersionSelector>().unwrap(),
            VersionSelector::Exact(7)
        );
        assert!(matches!(
            "newest".parse::<VersionSelector>(),
            Err(FeatureError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_selector_display_round_trip() {
        for selector in [
            VersionSelector::Latest,
            VersionSelector::Stable,
            VersionSelector::Exact(42),
        ] {
            assert_eq!(
                selector.to_string().parse::<VersionSelector>().unwrap(),
                selector
            );
        }
    }

    #[test]
    fn test_latest_tracks_maximum() {
        let mut table = VersionTable::new();
        table.insert(entry(2, false));
        table.insert(entry(1, false));
        assert_eq!(table.latest().unwrap().version, 2);

        table.insert(entry(5, false));
        assert_eq!(table.latest().unwrap().version, 5);
    }

    #[test]
    fn test_stable_picks_highest_stable() {
        let mut table = VersionTable::new();
        table.insert(entry(1, true));
        table.insert(entry(2, true));
        table.insert(entry(3, false));

        assert_eq!(table.stable().unwrap().version, 2);
        assert_eq!(table.latest().unwrap().version, 3);
    }

    #[test]
    fn test_stable_absent_when_nothing_marked() {
        let mut table = VersionTable::new();
        table.insert(entry(1, false));
        assert!(table.stable().is_none());
    }

    #[test]
    fn test_duplicate_version_last_wins() {
        let mut table = VersionTable::new();
        table.insert(entry(1, false));
        let previous = table.insert(entry(1, true));

        assert!(previous.is_some());
        assert_eq!(table.len(), 1);
        assert!(table.exact(1).unwrap().stable);
    }

    #[test]
    fn test_selector_labels_order() {
        let mut table = VersionTable::new();
        table.insert(entry(1, false));
        table.insert(entry(2, true));

        assert_eq!(table.selector_labels(), vec!["latest", "stable", "2", "1"]);
    }

    #[test]
    fn test_selector_labels_without_stable() {
        let mut table = VersionTable::new();
        table.insert(entry(3, false));
        table.insert(entry(1, false));

        assert_eq!(table.selector_labels(), vec!["latest", "3", "1"]);
    }
}
