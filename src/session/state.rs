//! Session state as an explicit, injectable object. The store exposes a
//! snapshot, a subscription, and an event-driven transition; nothing in
//! here is process-global. Phases move `Loading` to `Authenticated` or
//! `Unauthenticated`, and back to `Unauthenticated` on invalidation or
//! logout; a session never becomes authenticated except through a
//! `SignedIn` event, which only validation and login paths emit.

use tokio::sync::watch;
use tracing::debug;

use crate::types::User;

/// Why a session is signed out. Drives user-facing notices and keeps
/// "definitely logged out" distinguishable from "backend unreachable".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignedOutReason {
    /// No stored credentials; nothing was probed.
    NoCredentials,
    /// The backend examined the credential and rejected it.
    SessionExpired,
    /// The user asked to sign out.
    LoggedOut,
    /// The backend could not be consulted; failing closed.
    BackendUnreachable,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionPhase {
    Loading,
    Authenticated(User),
    Unauthenticated(SignedOutReason),
}

/// Immutable snapshot of the session at one point in time.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    phase: SessionPhase,
}

impl Session {
    pub(crate) fn loading() -> Self {
        Self {
            phase: SessionPhase::Loading,
        }
    }

    #[must_use]
    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, SessionPhase::Loading)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.phase, SessionPhase::Authenticated(_))
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match &self.phase {
            SessionPhase::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    #[must_use]
    pub fn signed_out_reason(&self) -> Option<SignedOutReason> {
        match &self.phase {
            SessionPhase::Unauthenticated(reason) => Some(*reason),
            _ => None,
        }
    }

    fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::SignedIn(user) => {
                self.phase = SessionPhase::Authenticated(user);
            }
            SessionEvent::SignedOut(reason) => {
                self.phase = SessionPhase::Unauthenticated(reason);
            }
            SessionEvent::ProfileLoaded(user) => {
                // A profile refresh cannot resurrect a signed-out session.
                if self.is_authenticated() {
                    self.phase = SessionPhase::Authenticated(user);
                } else {
                    debug!("dropping profile update for inactive session");
                }
            }
        }
    }
}

/// Session lifecycle events accepted by [`SessionStore::transition`].
#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// Login success or a successful bootstrap validation.
    SignedIn(User),
    SignedOut(SignedOutReason),
    /// Fresh profile for an already-authenticated session.
    ProfileLoaded(User),
}

/// Observable session state holder.
pub struct SessionStore {
    tx: watch::Sender<Session>,
}

impl SessionStore {
    /// Creates a store in the `Loading` phase.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(Session::loading()),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn state(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Subscribes to state changes. Watchers observe a new snapshot within
    /// one scheduler wake-up of the transition that produced it.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    /// Applies an event to the current state and notifies watchers.
    pub fn transition(&self, event: SessionEvent) {
        self.tx.send_modify(|session| session.apply(event));
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, UsageLimit, User};

    fn user(is_verified: bool) -> User {
        User {
            id: "user-1".to_string(),
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            is_mfa_enabled: false,
            is_verified,
            role: Role {
                id: "role-1".to_string(),
                name: "member".to_string(),
            },
            limit: UsageLimit { limit: 10, used: 0 },
        }
    }

    #[test]
    fn starts_loading() {
        let store = SessionStore::new();
        assert!(store.state().is_loading());
        assert!(!store.state().is_authenticated());
    }

    #[test]
    fn signed_in_then_signed_out() {
        let store = SessionStore::new();

        store.transition(SessionEvent::SignedIn(user(true)));
        let state = store.state();
        assert!(state.is_authenticated());
        assert_eq!(state.user().map(|u| u.email.as_str()), Some("ada@example.com"));

        store.transition(SessionEvent::SignedOut(SignedOutReason::LoggedOut));
        let state = store.state();
        assert!(!state.is_authenticated());
        assert_eq!(state.signed_out_reason(), Some(SignedOutReason::LoggedOut));
    }

    #[test]
    fn profile_update_ignored_when_signed_out() {
        let store = SessionStore::new();
        store.transition(SessionEvent::SignedOut(SignedOutReason::SessionExpired));

        store.transition(SessionEvent::ProfileLoaded(user(true)));

        assert!(!store.state().is_authenticated());
        assert_eq!(
            store.state().signed_out_reason(),
            Some(SignedOutReason::SessionExpired)
        );
    }

    #[test]
    fn profile_update_replaces_user_when_authenticated() {
        let store = SessionStore::new();
        store.transition(SessionEvent::SignedIn(user(false)));

        store.transition(SessionEvent::ProfileLoaded(user(true)));

        let state = store.state();
        assert!(state.user().is_some_and(|u| u.is_verified));
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let store = SessionStore::new();
        let mut watcher = store.subscribe();

        store.transition(SessionEvent::SignedIn(user(true)));

        watcher.changed().await.expect("sender is alive");
        assert!(watcher.borrow().is_authenticated());
    }
}
