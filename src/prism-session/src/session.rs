//! The session handle shared between the transport layer and feature code.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::events::{ObserverToken, SessionEvent};

type ObserverFn = Arc<dyn Fn(SessionEvent) + Send + Sync>;

struct SessionState {
    active: bool,
    /// Observers in subscription order; notification preserves this order.
    observers: Vec<(ObserverToken, ObserverFn)>,
}

/// Cloneable reference to one live session.
///
/// All clones share the same state: flipping the session active through one
/// handle is visible through every other. Observer callbacks run
/// synchronously on the thread that called [`begin`](Self::begin) or
/// [`end`](Self::end), and may themselves query or observe the session.
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<RwLock<SessionState>>,
}

impl SessionHandle {
    /// Create a handle for a session that has not started yet.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState {
                active: false,
                observers: Vec::new(),
            })),
        }
    }

    /// Whether the session is currently active.
    pub fn is_active(&self) -> bool {
        self.state.read().active
    }

    /// Register an observer for session start/end events.
    pub fn observe(&self, f: impl Fn(SessionEvent) + Send + Sync + 'static) -> ObserverToken {
        let token = ObserverToken::new();
        self.state.write().observers.push((token, Arc::new(f)));
        token
    }

    /// Remove a previously registered observer.
    ///
    /// Returns false if the token was already removed.
    pub fn unobserve(&self, token: ObserverToken) -> bool {
        let mut state = self.state.write();
        let before = state.observers.len();
        state.observers.retain(|(t, _)| *t != token);
        state.observers.len() != before
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.state.read().observers.len()
    }

    /// Mark the session active and notify observers.
    ///
    /// No-op if the session is already active.
    pub fn begin(&self) {
        {
            let mut state = self.state.write();
            if state.active {
                return;
            }
            state.active = true;
        }
        tracing::debug!("session started");
        self.notify(SessionEvent::Started);
    }

    /// Mark the session ended and notify observers.
    ///
    /// No-op if the session was never started or already ended.
    pub fn end(&self) {
        {
            let mut state = self.state.write();
            if !state.active {
                return;
            }
            state.active = false;
        }
        tracing::debug!("session ended");
        self.notify(SessionEvent::Ended);
    }

    fn notify(&self, event: SessionEvent) {
        // Snapshot the observer list so callbacks can re-enter the handle
        // (query state, subscribe, unsubscribe) without deadlocking.
        let observers: Vec<ObserverFn> = self
            .state
            .read()
            .observers
            .iter()
            .map(|(_, f)| f.clone())
            .collect();

        for observer in observers {
            observer(event);
        }
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("active", &self.is_active())
            .field("observers", &self.observer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_new_session_is_inactive() {
        let session = SessionHandle::new();
        assert!(!session.is_active());
    }

    #[test]
    fn test_begin_end_flip_active() {
        let session = SessionHandle::new();

        session.begin();
        assert!(session.is_active());

        session.end();
        assert!(!session.is_active());
    }

    #[test]
    fn test_observers_receive_events() {
        let session = SessionHandle::new();
        let starts = Arc::new(AtomicU32::new(0));
        let ends = Arc::new(AtomicU32::new(0));

        let s = starts.clone();
        let e = ends.clone();
        session.observe(move |event| match event {
            SessionEvent::Started => {
                s.fetch_add(1, Ordering::SeqCst);
            }
            SessionEvent::Ended => {
                e.fetch_add(1, Ordering::SeqCst);
            }
        });

        session.begin();
        session.end();
        session.begin();

        assert_eq!(starts.load(Ordering::SeqCst), 2);
        assert_eq!(ends.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_begin_is_idempotent() {
        let session = SessionHandle::new();
        let count = Arc::new(AtomicU32::new(0));

        let c = count.clone();
        session.observe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        session.begin();
        session.begin();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unobserve_stops_delivery() {
        let session = SessionHandle::new();
        let count = Arc::new(AtomicU32::new(0));

        let c = count.clone();
        let token = session.observe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert!(session.unobserve(token));
        assert!(!session.unobserve(token));

        session.begin();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_observer_can_query_session_during_notify() {
        let session = SessionHandle::new();
        let seen_active = Arc::new(AtomicU32::new(0));

        let handle = session.clone();
        let seen = seen_active.clone();
        session.observe(move |_| {
            if handle.is_active() {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });

        session.begin();
        assert_eq!(seen_active.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let session = SessionHandle::new();
        let clone = session.clone();

        session.begin();
        assert!(clone.is_active());
    }
}
