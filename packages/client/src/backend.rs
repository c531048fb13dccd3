//! # Backend — the seam to the hosted service
//!
//! [`Backend`] is the abstract interface over the three capability groups the
//! hosted service exposes: identity, tabular storage, and object storage. All
//! application logic goes through this trait, so the same sync code works
//! against the REST/WebSocket client in the browser ([`crate::rest`]) or the
//! deterministic in-memory backend used in tests and as the native fallback
//! ([`crate::memory`]).
//!
//! ## Identity
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`current_session`](Backend::current_session) | One-shot fetch of the provider's current session, done once at startup. |
//! | [`subscribe_session`](Backend::subscribe_session) | Asynchronous session notifications. Every delivered value is the new authoritative session state. |
//! | [`sign_in`](Backend::sign_in) / [`sign_up`](Backend::sign_up) | Credential flows. Failure messages come verbatim from the provider. |
//! | [`provider_sign_in_url`](Backend::provider_sign_in_url) | Third-party sign-in: returns the URL to redirect the browser to. |
//! | [`sign_out`](Backend::sign_out) | Ends the session and notifies subscribers with `None`. |
//!
//! ## Tabular storage
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`list_items`](Backend::list_items) | Bulk read of the items table filtered by owner. |
//! | [`insert_item`](Backend::insert_item) / [`update_item`](Backend::update_item) | Row writes; both return the stored row. |
//! | [`fetch_profile`](Backend::fetch_profile) / [`upsert_profile`](Backend::upsert_profile) | Profile row read by user id, and merge-write. |
//! | [`subscribe_items`](Backend::subscribe_items) | Live insert/update/delete notifications filtered by owner. |
//!
//! ## Object storage
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`upload_object`](Backend::upload_object) | Writes bytes at a path, overwriting any existing object. |
//! | [`resolve_object_url`](Backend::resolve_object_url) | Maps a stored path to a displayable (public or signed) URL. |
//!
//! ## Subscriptions
//!
//! Both subscription methods hand back a [`Subscription`]: a receiver for the
//! notification channel plus a teardown closure that runs on `Drop`,
//! releasing whatever the implementation registered (a subscriber slot, a
//! WebSocket). Dropping the handle is the only way to unsubscribe, which
//! makes "tear down when the owning task is cancelled" automatic.

use futures::channel::mpsc;
use futures::StreamExt;

use crate::error::ClientError;
use crate::models::{Item, NewItem, Profile, RowChange, Session};

/// A live notification channel with teardown-on-drop.
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
    teardown: Option<Box<dyn FnOnce()>>,
}

/// Session notifications: each value is the new authoritative session state.
pub type AuthSubscription = Subscription<Option<Session>>;

/// Row-change notifications for one owner's slice of the items table.
pub type RowSubscription = Subscription<RowChange>;

impl<T> Subscription<T> {
    /// Wrap a receiver with a teardown closure run when the handle drops.
    pub fn new(rx: mpsc::UnboundedReceiver<T>, teardown: impl FnOnce() + 'static) -> Self {
        Self {
            rx,
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A subscription that never delivers. Used by implementations that
    /// failed to establish the channel and degrade silently.
    pub fn dead() -> Self {
        let (_tx, rx) = mpsc::unbounded();
        Self { rx, teardown: None }
    }

    /// Next notification, or `None` once the sender side is gone.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.next().await
    }

    /// Non-blocking variant: a notification if one is already queued.
    pub fn try_next(&mut self) -> Option<T> {
        self.rx.try_next().ok().flatten()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

/// Async interface to the hosted backend's identity, tabular, and object
/// storage capability groups.
pub trait Backend {
    // --- identity ---

    fn current_session(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<Session>, ClientError>>;

    fn subscribe_session(&self) -> AuthSubscription;

    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<Session, ClientError>>;

    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<Session, ClientError>>;

    fn provider_sign_in_url(&self, provider: &str) -> Result<String, ClientError>;

    fn sign_out(&self) -> impl std::future::Future<Output = Result<(), ClientError>>;

    // --- tabular storage ---

    fn list_items(
        &self,
        owner_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Item>, ClientError>>;

    fn insert_item(
        &self,
        item: &NewItem,
    ) -> impl std::future::Future<Output = Result<Item, ClientError>>;

    fn update_item(
        &self,
        id: &str,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Item, ClientError>>;

    fn fetch_profile(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Profile>, ClientError>>;

    fn upsert_profile(
        &self,
        profile: &Profile,
    ) -> impl std::future::Future<Output = Result<(), ClientError>>;

    fn subscribe_items(&self, owner_id: &str) -> RowSubscription;

    // --- object storage ---

    fn upload_object(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> impl std::future::Future<Output = Result<(), ClientError>>;

    fn resolve_object_url(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<String, ClientError>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[tokio::test]
    async fn subscription_delivers_then_ends() {
        let (tx, rx) = mpsc::unbounded();
        let mut sub = Subscription::new(rx, || {});
        tx.unbounded_send(1u32).unwrap();
        tx.unbounded_send(2u32).unwrap();
        drop(tx);
        assert_eq!(sub.next().await, Some(1));
        assert_eq!(sub.next().await, Some(2));
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn drop_runs_teardown_once() {
        let torn_down = Rc::new(Cell::new(0u32));
        let flag = torn_down.clone();
        let (_tx, rx) = mpsc::unbounded::<u32>();
        let sub = Subscription::new(rx, move || flag.set(flag.get() + 1));
        drop(sub);
        assert_eq!(torn_down.get(), 1);
    }

    #[tokio::test]
    async fn dead_subscription_yields_nothing() {
        let mut sub = Subscription::<u32>::dead();
        assert_eq!(sub.next().await, None);
    }
}
