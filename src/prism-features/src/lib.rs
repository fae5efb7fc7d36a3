//! # Prism Feature Core
//!
//! Versioned feature management for sessions: independently developed,
//! independently versioned optional capabilities register factories in a
//! [`FeatureRegistry`], and a per-session [`FeaturesManager`] resolves them
//! by name and version selector, instantiates them, and drives each
//! instance through a strict enable → attach → detach → dispose lifecycle
//! in lockstep with session start/end events.
//!
//! ## Features
//!
//! - **Version aliases**: resolve by exact version, `latest`, or `stable`
//! - **At most one active version per name**: re-enabling supersedes and
//!   fully disposes the previous instance
//! - **Auto-attach**: session start attaches enabled features, session end
//!   detaches them without disposing, so a restart picks them back up
//! - **Capability-typed features**: concrete implementations plug in behind
//!   the [`Feature`] trait; the core never names them
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use prism_features::{Feature, FeatureRegistry, FeaturesManager, VersionSelector};
//! use prism_session::SessionHandle;
//!
//! struct HitTest;
//!
//! impl Feature for HitTest {
//!     fn on_attach(&mut self, _session: &SessionHandle) -> bool {
//!         true // wire scene hooks here
//!     }
//!     fn on_detach(&mut self, _session: &SessionHandle) {
//!         // unwire them here
//!     }
//! }
//!
//! let registry = FeatureRegistry::new();
//! registry.register(
//!     "xr-hit-test",
//!     1,
//!     Arc::new(|_session, _config| Box::new(HitTest)),
//!     true,
//! );
//!
//! let session = SessionHandle::new();
//! let manager = FeaturesManager::new(registry, session.clone());
//!
//! let feature = manager
//!     .enable_feature(
//!         "xr-hit-test",
//!         VersionSelector::Stable,
//!         serde_json::Value::Null,
//!         true,
//!     )
//!     .unwrap();
//!
//! session.begin();
//! assert!(feature.attached());
//! ```

pub mod error;
pub mod feature;
pub mod manager;
pub mod registry;
pub mod version;

pub use error::{FeatureError, Result};
pub use feature::{Feature, FeatureFactory, FeatureHandle, FeatureInstance, FeatureState};
pub use manager::FeaturesManager;
pub use registry::FeatureRegistry;
pub use version::{Version, VersionEntry, VersionSelector, VersionTable};

/// Feature core version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Selector string resolving to the highest registered version.
pub const LATEST_SELECTOR: &str = "latest";

/// Selector string resolving to the highest version marked stable.
pub const STABLE_SELECTOR: &str = "stable";
