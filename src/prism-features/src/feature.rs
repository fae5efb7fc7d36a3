//! The feature capability trait and the per-instance lifecycle machine.
//!
//! Concrete capabilities implement [`Feature`] and only supply the
//! asymmetric side effects: wiring active scene hooks on attach, unwiring
//! them on detach, releasing owned artifacts on dispose. The state machine
//! itself (idempotency, ordering, terminal disposal) lives in
//! [`FeatureInstance`] so every capability gets identical semantics.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use prism_session::SessionHandle;

use crate::version::Version;

/// Lifecycle state of a feature instance.
///
/// `Enabled` and `Detached` are both "not actively hooked into the scene";
/// they stay distinct so an instance that never attached never runs detach
/// cleanup it never set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureState {
    /// Constructed; passive observers registered, no active hooks yet.
    Enabled,
    /// Active hooks wired; the feature is live in the scene.
    Attached,
    /// Was attached; active hooks removed, still enabled for re-attach.
    Detached,
    /// All resources released. Terminal.
    Disposed,
}

impl std::fmt::Display for FeatureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enabled => write!(f, "enabled"),
            Self::Attached => write!(f, "attached"),
            Self::Detached => write!(f, "detached"),
            Self::Disposed => write!(f, "disposed"),
        }
    }
}

/// Trait implemented by concrete feature capabilities.
///
/// Construction (inside the registered factory) must register only passive
/// session-shape observers; everything scene-affecting belongs in
/// [`on_attach`](Self::on_attach).
pub trait Feature: Send + Sync {
    /// Wire the active observers the capability needs to function.
    ///
    /// Returning false rejects the attach (an internal precondition is
    /// unmet); the instance stays in its previous state.
    fn on_attach(&mut self, session: &SessionHandle) -> bool;

    /// Remove the active observers wired by [`on_attach`](Self::on_attach).
    ///
    /// Called at most once per successful attach.
    fn on_detach(&mut self, session: &SessionHandle);

    /// Release everything the capability owns, including passive observers
    /// registered at construction and any created artifacts. Must not fail
    /// outwardly; absorb or log internal cleanup errors.
    fn on_dispose(&mut self, _session: &SessionHandle) {}
}

/// Constructor signature registered per feature version.
pub type FeatureFactory =
    Arc<dyn Fn(&SessionHandle, serde_json::Value) -> Box<dyn Feature> + Send + Sync>;

/// One live feature instance plus its lifecycle state.
pub struct FeatureInstance {
    name: String,
    version: Version,
    state: FeatureState,
    disable_auto_attach: bool,
    config: serde_json::Value,
    session: SessionHandle,
    feature: Box<dyn Feature>,
}

impl FeatureInstance {
    pub(crate) fn new(
        name: impl Into<String>,
        version: Version,
        session: SessionHandle,
        config: serde_json::Value,
        feature: Box<dyn Feature>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            state: FeatureState::Enabled,
            disable_auto_attach: false,
            config,
            session,
            feature,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn state(&self) -> FeatureState {
        self.state
    }

    pub fn attached(&self) -> bool {
        self.state == FeatureState::Attached
    }

    /// The configuration this instance was constructed with.
    pub fn config(&self) -> &serde_json::Value {
        &self.config
    }

    pub fn disable_auto_attach(&self) -> bool {
        self.disable_auto_attach
    }

    pub fn set_disable_auto_attach(&mut self, disable: bool) {
        self.disable_auto_attach = disable;
    }

    /// Wire the feature's active hooks.
    ///
    /// No-op returning true when already attached, unless `force` re-runs
    /// attachment unconditionally. Returns false if the instance is
    /// disposed, the session is not active, or the feature rejects the
    /// attach.
    pub fn attach(&mut self, force: bool) -> bool {
        if self.state == FeatureState::Disposed {
            return false;
        }
        if self.state == FeatureState::Attached && !force {
            return true;
        }
        if !self.session.is_active() {
            tracing::debug!(feature = %self.name, "attach rejected: session not active");
            return false;
        }
        if !self.feature.on_attach(&self.session) {
            tracing::debug!(feature = %self.name, "attach rejected by feature");
            return false;
        }
        self.state = FeatureState::Attached;
        true
    }

    /// Unwire the feature's active hooks and pin `disable_auto_attach` so a
    /// session restart does not silently re-attach a feature the caller
    /// deliberately detached.
    ///
    /// Idempotent: detaching a never-attached or already-detached instance
    /// returns true without effect. Returns false only once disposed.
    pub fn detach(&mut self) -> bool {
        if self.state == FeatureState::Disposed {
            return false;
        }
        self.disable_auto_attach = true;
        self.detach_quiet()
    }

    /// Detach without touching `disable_auto_attach`. Used by the manager's
    /// session-end fan-out, which must leave instances re-attachable.
    pub(crate) fn detach_quiet(&mut self) -> bool {
        match self.state {
            FeatureState::Disposed => false,
            // Nothing was wired, so there is nothing to undo.
            FeatureState::Enabled | FeatureState::Detached => true,
            FeatureState::Attached => {
                self.feature.on_detach(&self.session);
                self.state = FeatureState::Detached;
                true
            }
        }
    }

    /// Release the instance. Detaches first if attached. Irreversible.
    pub fn dispose(&mut self) {
        if self.state == FeatureState::Disposed {
            return;
        }
        if self.state == FeatureState::Attached {
            self.feature.on_detach(&self.session);
        }
        self.feature.on_dispose(&self.session);
        self.state = FeatureState::Disposed;
        tracing::debug!(feature = %self.name, version = self.version, "feature disposed");
    }
}

impl std::fmt::Debug for FeatureInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureInstance")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("state", &self.state)
            .field("disable_auto_attach", &self.disable_auto_attach)
            .finish()
    }
}

/// Cloneable handle to a live feature instance.
///
/// All clones refer to the same instance; the manager holds one and returns
/// clones to callers.
#[derive(Clone)]
pub struct FeatureHandle {
    inner: Arc<Mutex<FeatureInstance>>,
}

impl FeatureHandle {
    pub(crate) fn new(instance: FeatureInstance) -> Self {
        Self {
            inner: Arc::new(Mutex::new(instance)),
        }
    }

    /// See [`FeatureInstance::attach`].
    pub fn attach(&self, force: bool) -> bool {
        self.inner.lock().attach(force)
    }

    /// See [`FeatureInstance::detach`].
    pub fn detach(&self) -> bool {
        self.inner.lock().detach()
    }

    pub(crate) fn detach_quiet(&self) -> bool {
        self.inner.lock().detach_quiet()
    }

    /// See [`FeatureInstance::dispose`].
    pub fn dispose(&self) {
        self.inner.lock().dispose();
    }

    pub fn state(&self) -> FeatureState {
        self.inner.lock().state()
    }

    pub fn attached(&self) -> bool {
        self.inner.lock().attached()
    }

    pub fn disable_auto_attach(&self) -> bool {
        self.inner.lock().disable_auto_attach()
    }

    pub fn set_disable_auto_attach(&self, disable: bool) {
        self.inner.lock().set_disable_auto_attach(disable);
    }

    pub fn name(&self) -> String {
        self.inner.lock().name().to_string()
    }

    pub fn version(&self) -> Version {
        self.inner.lock().version()
    }

    pub fn config(&self) -> serde_json::Value {
        self.inner.lock().config().clone()
    }
}

impl std::fmt::Debug for FeatureHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.lock().fmt(f)
    }
}
