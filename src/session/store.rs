//! Shared container for the session
//!
//! The store wraps a `tokio::sync::watch` channel. Transitions are applied
//! under the channel lock, so every subscriber sees either the state before
//! or the state after a transition, never something in between. The lock
//! is only held for the duration of one pure transition and never across
//! an `.await`.

use std::sync::Arc;

use tokio::sync::watch;

use super::{Epoch, Session, Transition};

/// Single source of truth for the document chat
///
/// Cloning the store is cheap and yields a handle to the same session.
/// Flow controllers and the presentation layer receive a handle through
/// their constructors.
///
/// # Examples
///
/// ```
/// use docchat::session::{InFlight, SessionStore, Transition};
///
/// let store = SessionStore::new();
/// store.apply(Transition::BeginUpload(InFlight::Release));
/// assert!(store.snapshot().upload_in_flight());
/// ```
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<watch::Sender<Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Creates a store holding an empty session
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session::new());
        Self { inner: Arc::new(tx) }
    }

    /// Returns a copy of the current session
    pub fn snapshot(&self) -> Session {
        self.inner.borrow().clone()
    }

    /// Epoch of the current session
    pub fn epoch(&self) -> Epoch {
        self.inner.borrow().epoch()
    }

    /// Subscribes to session snapshots
    ///
    /// The receiver is notified once per applied transition.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.subscribe()
    }

    /// Applies a transition unconditionally and returns the resulting epoch
    pub fn apply(&self, transition: Transition) -> Epoch {
        let mut epoch = 0;
        self.inner.send_modify(|session| {
            apply_in_place(session, transition);
            epoch = session.epoch();
        });
        epoch
    }

    /// Applies a transition only if the session is still at `expected`
    ///
    /// Returns false, leaving the session untouched, if the session was
    /// replaced or destroyed since the caller recorded the epoch.
    pub fn apply_if_current(&self, expected: Epoch, transition: Transition) -> bool {
        self.transact(move |session| {
            if session.epoch() == expected {
                Some((transition, ()))
            } else {
                None
            }
        })
        .is_some()
    }

    /// Inspects the session and optionally applies a transition, atomically
    ///
    /// `decide` sees the current session. Returning `Some((transition,
    /// value))` applies the transition and yields the resulting epoch along
    /// with `value`; returning `None` leaves the session untouched and
    /// notifies nobody.
    pub fn transact<R>(
        &self,
        decide: impl FnOnce(&Session) -> Option<(Transition, R)>,
    ) -> Option<(Epoch, R)> {
        let mut out = None;
        self.inner.send_if_modified(|session| match decide(session) {
            Some((transition, value)) => {
                apply_in_place(session, transition);
                out = Some((session.epoch(), value));
                true
            }
            None => false,
        });
        out
    }
}

fn apply_in_place(session: &mut Session, transition: Transition) {
    let name = transition.to_string();
    let current = std::mem::take(session);
    *session = current.apply(transition);
    tracing::debug!(
        transition = %name,
        epoch = session.epoch(),
        messages = session.messages().len(),
        upload_in_flight = session.upload_in_flight(),
        answer_in_flight = session.answer_in_flight(),
        "Applied session transition"
    );
}
