//! Per-session feature orchestration.

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use prism_session::{ObserverToken, SessionEvent, SessionHandle};

use crate::error::Result;
use crate::feature::{FeatureHandle, FeatureInstance};
use crate::registry::FeatureRegistry;
use crate::version::VersionSelector;

/// Insertion-ordered name → instance map. Session start/end fan-out walks
/// it in the order features were enabled.
type InstanceMap = RwLock<IndexMap<String, FeatureHandle>>;

/// Per-session feature orchestrator.
///
/// Owns at most one live instance per feature name, resolves requested
/// versions through a [`FeatureRegistry`], and drives bulk attach/detach in
/// lockstep with the session's start/end events:
///
/// - session start attaches every enabled instance whose
///   `disable_auto_attach` is false;
/// - session end detaches every attached instance but keeps it enabled, so
///   a later restart re-attaches it.
///
/// Dropping the manager (or calling [`dispose`](Self::dispose)) disposes
/// every instance and drops the session subscription.
pub struct FeaturesManager {
    registry: FeatureRegistry,
    session: SessionHandle,
    instances: Arc<InstanceMap>,
    observer: ObserverToken,
    disposed: AtomicBool,
}

impl FeaturesManager {
    /// Create a manager bound to `session`, resolving against `registry`.
    pub fn new(registry: FeatureRegistry, session: SessionHandle) -> Self {
        let instances: Arc<InstanceMap> = Arc::new(RwLock::new(IndexMap::new()));

        // The observer holds a weak reference so an un-disposed manager that
        // was dropped does not keep its instances alive through the session.
        let weak: Weak<InstanceMap> = Arc::downgrade(&instances);
        let observer = session.observe(move |event| {
            if let Some(instances) = weak.upgrade() {
                Self::handle_session_event(&instances, event);
            }
        });

        Self {
            registry,
            session,
            instances,
            observer,
            disposed: AtomicBool::new(false),
        }
    }

    /// Create a manager resolving against the process-wide registry.
    pub fn for_session(session: SessionHandle) -> Self {
        Self::new(FeatureRegistry::global(), session)
    }

    /// The session this manager is bound to.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    // ========== Enable / Disable ==========

    /// Enable a feature: resolve the version, construct an instance and, if
    /// the session is active and `attach_if_possible` is set, attach it
    /// immediately.
    ///
    /// Enabling a name that is already enabled always supersedes: the old
    /// instance is fully disposed before the new one is constructed, and
    /// its configuration is not carried over.
    ///
    /// Resolution failures propagate unchanged; a rejected immediate attach
    /// does not fail the enable (the instance stays enabled and can attach
    /// later).
    pub fn enable_feature(
        &self,
        name: &str,
        selector: VersionSelector,
        config: serde_json::Value,
        attach_if_possible: bool,
    ) -> Result<FeatureHandle> {
        let entry = self.registry.resolve(name, selector)?;

        if let Some(previous) = self.instances.write().shift_remove(name) {
            tracing::info!(feature = %name, "superseding enabled feature");
            previous.dispose();
        }

        let feature = (entry.factory)(&self.session, config.clone());
        let instance =
            FeatureInstance::new(name, entry.version, self.session.clone(), config, feature);
        let handle = FeatureHandle::new(instance);
        handle.set_disable_auto_attach(!attach_if_possible);

        if attach_if_possible && self.session.is_active() && !handle.attach(false) {
            tracing::warn!(feature = %name, "feature rejected immediate attach");
        }

        self.instances
            .write()
            .insert(name.to_string(), handle.clone());
        tracing::info!(feature = %name, version = entry.version, "enabled feature");

        Ok(handle)
    }

    /// Disable a feature: detach if attached, dispose, and forget it.
    ///
    /// Returns false if no instance exists for `name`.
    pub fn disable_feature(&self, name: &str) -> bool {
        let Some(handle) = self.instances.write().shift_remove(name) else {
            return false;
        };
        handle.dispose();
        tracing::info!(feature = %name, "disabled feature");
        true
    }

    // ========== Queries ==========

    /// The live instance for `name`, if one is enabled.
    pub fn get_enabled_feature(&self, name: &str) -> Option<FeatureHandle> {
        self.instances.read().get(name).cloned()
    }

    /// Names of currently enabled features, in enable order.
    pub fn enabled_features(&self) -> Vec<String> {
        self.instances.read().keys().cloned().collect()
    }

    /// Registry delegation; never consults live instances.
    pub fn available_features(&self) -> Vec<String> {
        self.registry.available_features()
    }

    /// Registry delegation; never consults live instances.
    pub fn available_versions(&self, name: &str) -> Result<Vec<String>> {
        self.registry.available_versions(name)
    }

    // ========== Instance surface convenience ==========

    /// Attach an enabled feature by name. False if unknown or rejected.
    pub fn attach_feature(&self, name: &str) -> bool {
        self.get_enabled_feature(name)
            .is_some_and(|handle| handle.attach(false))
    }

    /// Detach an enabled feature by name. This is an explicit detach: the
    /// instance will not auto-attach on the next session start.
    pub fn detach_feature(&self, name: &str) -> bool {
        self.get_enabled_feature(name)
            .is_some_and(|handle| handle.detach())
    }

    // ========== Teardown ==========

    /// Dispose every instance and drop the session subscription.
    /// Idempotent; also runs on drop.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.session.unobserve(self.observer);

        let handles: Vec<(String, FeatureHandle)> = self.instances.write().drain(..).collect();
        for (name, handle) in handles {
            tracing::debug!(feature = %name, "disposing feature on manager teardown");
            handle.dispose();
        }
    }

    fn handle_session_event(instances: &InstanceMap, event: SessionEvent) {
        // Snapshot so feature callbacks can call back into the manager's map
        // (via handles) without holding the lock.
        let handles: Vec<(String, FeatureHandle)> = instances
            .read()
            .iter()
            .map(|(name, handle)| (name.clone(), handle.clone()))
            .collect();

        match event {
            SessionEvent::Started => {
                for (name, handle) in handles {
                    if handle.disable_auto_attach() {
                        continue;
                    }
                    if !handle.attach(false) {
                        tracing::warn!(feature = %name, "auto-attach failed on session start");
                    }
                }
            }
            SessionEvent::Ended => {
                for (_, handle) in handles {
                    // Leaves the instance enabled so a restart re-attaches.
                    handle.detach_quiet();
                }
            }
        }
    }
}

impl Drop for FeaturesManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for FeaturesManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeaturesManager")
            .field("enabled", &self.enabled_features())
            .field("session", &self.session)
            .finish()
    }
}
