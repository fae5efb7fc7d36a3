//! # Prism Session Interface
//!
//! The session collaborator consumed by the feature core. A [`SessionHandle`]
//! is an opaque, cloneable reference to one live session: it answers the
//! "is the session active?" predicate and fans session start/end events out
//! to registered observers.
//!
//! The transport that actually starts and ends sessions lives elsewhere; it
//! drives the handle through [`SessionHandle::begin`] and
//! [`SessionHandle::end`]. Everything here is synchronous and runs on the
//! caller's control flow.
//!
//! ## Example
//!
//! ```rust
//! use prism_session::{SessionEvent, SessionHandle};
//!
//! let session = SessionHandle::new();
//! let token = session.observe(|event| {
//!     if event == SessionEvent::Started {
//!         // wire up whatever needs a live session
//!     }
//! });
//!
//! session.begin();
//! assert!(session.is_active());
//!
//! session.unobserve(token);
//! ```

pub mod events;
pub mod session;

pub use events::{ObserverToken, SessionEvent};
pub use session::SessionHandle;
