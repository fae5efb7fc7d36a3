//! Feature core error types.

use thiserror::Error;

use crate::version::Version;

/// Errors surfaced by version resolution and feature enablement.
#[derive(Error, Debug)]
pub enum FeatureError {
    /// No version of this feature was ever registered. The usual cause is a
    /// capability module that was never loaded.
    #[error("Feature not found: {0}")]
    UnknownFeature(String),

    /// The explicitly requested version is not registered for this feature.
    #[error("Version {version} not found for feature '{feature}'")]
    VersionNotFound { feature: String, version: Version },

    /// The `stable` selector was used but no version is marked stable.
    #[error("No stable version registered for feature '{0}'")]
    NoStableVersion(String),

    /// A selector string that is neither `latest`, `stable` nor an integer.
    #[error("Invalid version selector: {0}")]
    InvalidSelector(String),
}

impl FeatureError {
    /// Create a version-not-found error.
    pub fn version_not_found(feature: impl Into<String>, version: Version) -> Self {
        Self::VersionNotFound {
            feature: feature.into(),
            version,
        }
    }
}

/// Result type alias for feature operations.
pub type Result<T> = std::result::Result<T, FeatureError>;
