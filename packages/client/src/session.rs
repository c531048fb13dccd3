//! Session state machine driven by identity-provider notifications.

use crate::models::Session;

/// The three UI-visible session states.
///
/// `Loading` exists only between startup and the first resolved session
/// fetch; every state after that is `Anonymous` or `Authenticated`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Loading,
    Anonymous,
    Authenticated(Session),
}

/// Holds the current session and applies provider notifications.
///
/// Every notification overwrites the local value unconditionally — the
/// provider is authoritative, the tracker never merges.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionTracker {
    state: SessionState,
}

impl SessionTracker {
    /// A fresh tracker in the `Loading` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a provider notification (or the initial fetch result).
    pub fn apply(&mut self, session: Option<Session>) {
        self.state = match session {
            Some(session) => SessionState::Authenticated(session),
            None => SessionState::Anonymous,
        };
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Still waiting for the initial session fetch.
    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Loading)
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session().map(|s| s.user.id.as_str())
    }

    pub fn email(&self) -> Option<&str> {
        self.session().map(|s| s.user.email.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserInfo;

    fn session(user_id: &str) -> Session {
        Session {
            access_token: format!("token-{user_id}"),
            user: UserInfo {
                id: user_id.to_string(),
                email: format!("{user_id}@example.com"),
            },
        }
    }

    #[test]
    fn starts_loading() {
        let tracker = SessionTracker::new();
        assert!(tracker.is_loading());
        assert!(tracker.session().is_none());
    }

    #[test]
    fn initial_fetch_resolves_either_way() {
        let mut tracker = SessionTracker::new();
        tracker.apply(None);
        assert_eq!(*tracker.state(), SessionState::Anonymous);

        let mut tracker = SessionTracker::new();
        tracker.apply(Some(session("u1")));
        assert_eq!(tracker.user_id(), Some("u1"));
    }

    #[test]
    fn every_notification_overwrites() {
        let mut tracker = SessionTracker::new();
        tracker.apply(Some(session("u1")));
        tracker.apply(Some(session("u2")));
        assert_eq!(tracker.user_id(), Some("u2"));

        tracker.apply(None);
        assert_eq!(*tracker.state(), SessionState::Anonymous);
        assert!(!tracker.is_loading());
    }
}
