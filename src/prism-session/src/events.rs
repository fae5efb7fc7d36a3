//! Session lifecycle events and observer tokens.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle notifications fanned out to session observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    /// The session became active.
    Started,
    /// The session ended.
    Ended,
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

/// Handle identifying one registered observer.
///
/// Returned by [`crate::SessionHandle::observe`]; pass it back to
/// [`crate::SessionHandle::unobserve`] to drop the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverToken(Uuid);

impl ObserverToken {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}
