//! # In-memory backend for tests and the native fallback
//!
//! [`MemoryBackend`] is a deterministic, fully local stand-in for the hosted
//! service: accounts, items, profiles, and stored objects live in an
//! `Arc<Mutex<_>>`, and both subscription kinds are fanned out over in-process
//! channels. It backs every unit test in this crate and the non-WASM build of
//! the app, where no hosted service is reachable.
//!
//! Beyond the [`Backend`] impl it carries a few levers the tests (and the
//! demo seeding in the UI crate) use directly:
//! [`register_user`](MemoryBackend::register_user),
//! [`seed_item`](MemoryBackend::seed_item),
//! [`push_change`](MemoryBackend::push_change) to inject "external"
//! notifications, and the `set_fail_*` switches to force individual pipeline
//! steps to fail.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::channel::mpsc;
use uuid::Uuid;

use crate::backend::{AuthSubscription, Backend, RowSubscription, Subscription};
use crate::error::ClientError;
use crate::models::{Item, NewItem, Profile, RowChange, Session, UserInfo};

/// In-memory Backend for testing and the native fallback build.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    session: Option<Session>,
    items: Vec<Item>,
    profiles: HashMap<String, Profile>,
    objects: HashMap<String, StoredObject>,
    auth_subs: HashMap<u64, mpsc::UnboundedSender<Option<Session>>>,
    row_subs: HashMap<u64, RowSubscriber>,
    next_sub_id: u64,
    fail_profile_upserts: bool,
    fail_uploads: bool,
}

struct Account {
    user_id: String,
    password: String,
}

#[derive(Default)]
struct StoredObject {
    content_type: String,
    bytes: Vec<u8>,
    /// Bumped on every overwrite so resolved URLs differ per upload, the way
    /// a signed URL would.
    revision: u64,
}

struct RowSubscriber {
    owner_id: String,
    tx: mpsc::UnboundedSender<RowChange>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account without signing in. Returns the new user id.
    pub fn register_user(&self, email: &str, password: &str) -> String {
        let user_id = Uuid::new_v4().to_string();
        self.inner.lock().unwrap().accounts.insert(
            email.to_string(),
            Account {
                user_id: user_id.clone(),
                password: password.to_string(),
            },
        );
        user_id
    }

    /// Put a row into the table directly, without notifying subscribers.
    pub fn seed_item(&self, item: Item) {
        self.inner.lock().unwrap().items.push(item);
    }

    /// Deliver a notification as if the external store had announced it.
    /// The row data itself is not touched.
    pub fn push_change(&self, owner_id: &str, change: RowChange) {
        let mut inner = self.inner.lock().unwrap();
        notify_rows(&mut inner, owner_id, change);
    }

    /// Force subsequent profile upserts to fail.
    pub fn set_fail_profile_upserts(&self, fail: bool) {
        self.inner.lock().unwrap().fail_profile_upserts = fail;
    }

    /// Force subsequent object uploads to fail.
    pub fn set_fail_uploads(&self, fail: bool) {
        self.inner.lock().unwrap().fail_uploads = fail;
    }

    /// Whether an object exists at `path`.
    pub fn object_exists(&self, path: &str) -> bool {
        self.inner.lock().unwrap().objects.contains_key(path)
    }

    /// The stored bytes at `path`, if any.
    pub fn object_bytes(&self, path: &str) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .unwrap()
            .objects
            .get(path)
            .map(|o| o.bytes.clone())
    }

    /// The stored content type at `path`, if any.
    pub fn object_content_type(&self, path: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .objects
            .get(path)
            .map(|o| o.content_type.clone())
    }

    /// Number of live row subscribers (teardown bookkeeping check).
    pub fn row_subscriber_count(&self) -> usize {
        self.inner.lock().unwrap().row_subs.len()
    }

    fn session_for(&self, email: &str, user_id: &str) -> Session {
        Session {
            access_token: format!("mem-token-{}", Uuid::new_v4()),
            user: UserInfo {
                id: user_id.to_string(),
                email: email.to_string(),
            },
        }
    }
}

fn notify_auth(inner: &mut Inner, session: Option<Session>) {
    inner
        .auth_subs
        .retain(|_, tx| tx.unbounded_send(session.clone()).is_ok());
}

fn notify_rows(inner: &mut Inner, owner_id: &str, change: RowChange) {
    inner.row_subs.retain(|_, sub| {
        if sub.owner_id != owner_id {
            return true;
        }
        sub.tx.unbounded_send(change.clone()).is_ok()
    });
}

impl Backend for MemoryBackend {
    async fn current_session(&self) -> Result<Option<Session>, ClientError> {
        Ok(self.inner.lock().unwrap().session.clone())
    }

    fn subscribe_session(&self) -> AuthSubscription {
        let (tx, rx) = mpsc::unbounded();
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_sub_id;
        inner.next_sub_id += 1;
        inner.auth_subs.insert(id, tx);
        let handle = self.inner.clone();
        Subscription::new(rx, move || {
            handle.lock().unwrap().auth_subs.remove(&id);
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let mut inner = self.inner.lock().unwrap();
        let account = inner
            .accounts
            .get(email)
            .filter(|a| a.password == password)
            .ok_or_else(|| ClientError::Auth("Invalid email or password".to_string()))?;
        let session = self.session_for(email, &account.user_id);
        inner.session = Some(session.clone());
        notify_auth(&mut inner, Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.accounts.contains_key(email) {
            return Err(ClientError::Auth(
                "An account with this email already exists".to_string(),
            ));
        }
        let user_id = Uuid::new_v4().to_string();
        inner.accounts.insert(
            email.to_string(),
            Account {
                user_id: user_id.clone(),
                password: password.to_string(),
            },
        );
        let session = self.session_for(email, &user_id);
        inner.session = Some(session.clone());
        notify_auth(&mut inner, Some(session.clone()));
        Ok(session)
    }

    fn provider_sign_in_url(&self, provider: &str) -> Result<String, ClientError> {
        Err(ClientError::Backend(format!(
            "third-party provider '{provider}' is not available offline"
        )))
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        let mut inner = self.inner.lock().unwrap();
        inner.session = None;
        notify_auth(&mut inner, None);
        Ok(())
    }

    async fn list_items(&self, owner_id: &str) -> Result<Vec<Item>, ClientError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .items
            .iter()
            .filter(|item| item.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn insert_item(&self, item: &NewItem) -> Result<Item, ClientError> {
        let row = Item {
            id: Uuid::new_v4().to_string(),
            name: item.name.clone(),
            owner_id: item.owner_id.clone(),
        };
        let mut inner = self.inner.lock().unwrap();
        inner.items.push(row.clone());
        let owner_id = row.owner_id.clone();
        notify_rows(&mut inner, &owner_id, RowChange::Insert { row: row.clone() });
        Ok(row)
    }

    async fn update_item(&self, id: &str, name: &str) -> Result<Item, ClientError> {
        let mut inner = self.inner.lock().unwrap();
        let row = inner
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| ClientError::Backend(format!("no row with id {id}")))?;
        row.name = name.to_string();
        let row = row.clone();
        let owner_id = row.owner_id.clone();
        notify_rows(&mut inner, &owner_id, RowChange::Update { row: row.clone() });
        Ok(row)
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, ClientError> {
        Ok(self.inner.lock().unwrap().profiles.get(user_id).cloned())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), ClientError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_profile_upserts {
            return Err(ClientError::Backend("profile write rejected".to_string()));
        }
        let entry = inner
            .profiles
            .entry(profile.id.clone())
            .or_insert_with(|| Profile {
                id: profile.id.clone(),
                avatar_path: None,
            });
        // Merge write: an absent path leaves the stored one in place.
        if profile.avatar_path.is_some() {
            entry.avatar_path = profile.avatar_path.clone();
        }
        Ok(())
    }

    fn subscribe_items(&self, owner_id: &str) -> RowSubscription {
        let (tx, rx) = mpsc::unbounded();
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_sub_id;
        inner.next_sub_id += 1;
        inner.row_subs.insert(
            id,
            RowSubscriber {
                owner_id: owner_id.to_string(),
                tx,
            },
        );
        let handle = self.inner.clone();
        Subscription::new(rx, move || {
            handle.lock().unwrap().row_subs.remove(&id);
        })
    }

    async fn upload_object(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ClientError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_uploads {
            return Err(ClientError::Storage("storage write rejected".to_string()));
        }
        let object = inner.objects.entry(path.to_string()).or_default();
        object.content_type = content_type.to_string();
        object.bytes = bytes;
        object.revision += 1;
        Ok(())
    }

    async fn resolve_object_url(&self, path: &str) -> Result<String, ClientError> {
        let inner = self.inner.lock().unwrap();
        let revision = inner.objects.get(path).map(|o| o.revision).unwrap_or(0);
        Ok(format!("memory://{path}?rev={revision}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_up_creates_session_and_notifies() {
        let backend = MemoryBackend::new();
        let mut changes = backend.subscribe_session();

        let session = backend.sign_up("a@example.com", "hunter2-hunter2").await.unwrap();
        assert_eq!(session.user.email, "a@example.com");
        assert_eq!(
            backend.current_session().await.unwrap().as_ref(),
            Some(&session)
        );
        assert_eq!(changes.next().await, Some(Some(session)));
    }

    #[tokio::test]
    async fn invalid_password_leaves_session_absent() {
        let backend = MemoryBackend::new();
        backend.register_user("a@example.com", "right-password");

        let err = backend.sign_in("a@example.com", "wrong").await.unwrap_err();
        assert_eq!(err, ClientError::Auth("Invalid email or password".to_string()));
        assert!(backend.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_out_notifies_none() {
        let backend = MemoryBackend::new();
        backend.sign_up("a@example.com", "hunter2-hunter2").await.unwrap();

        let mut changes = backend.subscribe_session();
        backend.sign_out().await.unwrap();
        assert_eq!(changes.next().await, Some(None));
        assert!(backend.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_filtered_by_owner() {
        let backend = MemoryBackend::new();
        backend.seed_item(Item {
            id: "a".to_string(),
            name: "mine".to_string(),
            owner_id: "u1".to_string(),
        });
        backend.seed_item(Item {
            id: "b".to_string(),
            name: "theirs".to_string(),
            owner_id: "u2".to_string(),
        });

        let rows = backend.list_items("u1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "mine");
    }

    #[tokio::test]
    async fn insert_notifies_matching_owner_only() {
        let backend = MemoryBackend::new();
        let mut theirs = backend.subscribe_items("other");
        let mut ours = backend.subscribe_items("u1");

        let row = backend
            .insert_item(&NewItem {
                name: "socks".to_string(),
                owner_id: "u1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(ours.next().await, Some(RowChange::Insert { row }));
        assert_eq!(theirs.try_next(), None);
    }

    #[tokio::test]
    async fn update_notifies_with_new_values() {
        let backend = MemoryBackend::new();
        let row = backend
            .insert_item(&NewItem {
                name: "socks".to_string(),
                owner_id: "u1".to_string(),
            })
            .await
            .unwrap();

        let mut sub = backend.subscribe_items("u1");
        let updated = backend.update_item(&row.id, "wool socks").await.unwrap();
        assert_eq!(updated.name, "wool socks");
        assert_eq!(sub.next().await, Some(RowChange::Update { row: updated }));
    }

    #[tokio::test]
    async fn dropping_subscription_releases_the_slot() {
        let backend = MemoryBackend::new();
        let sub = backend.subscribe_items("u1");
        assert_eq!(backend.row_subscriber_count(), 1);
        drop(sub);
        assert_eq!(backend.row_subscriber_count(), 0);
    }

    #[tokio::test]
    async fn pushed_changes_reach_subscribers() {
        let backend = MemoryBackend::new();
        let mut sub = backend.subscribe_items("u1");
        backend.push_change("u1", RowChange::Delete { id: "gone".to_string() });
        assert_eq!(sub.next().await, Some(RowChange::Delete { id: "gone".to_string() }));
    }

    #[tokio::test]
    async fn upload_bumps_resolved_url() {
        let backend = MemoryBackend::new();
        let before = backend.resolve_object_url("u1/avatar.png").await.unwrap();
        backend
            .upload_object("u1/avatar.png", "image/png", vec![1, 2, 3])
            .await
            .unwrap();
        let first = backend.resolve_object_url("u1/avatar.png").await.unwrap();
        backend
            .upload_object("u1/avatar.png", "image/png", vec![4, 5, 6])
            .await
            .unwrap();
        let second = backend.resolve_object_url("u1/avatar.png").await.unwrap();

        assert_ne!(before, first);
        assert_ne!(first, second);
        // The second write overwrote the object in place.
        assert_eq!(backend.object_bytes("u1/avatar.png"), Some(vec![4, 5, 6]));
        assert_eq!(
            backend.object_content_type("u1/avatar.png").as_deref(),
            Some("image/png")
        );
    }

    #[tokio::test]
    async fn profile_upsert_merges_path() {
        let backend = MemoryBackend::new();
        backend
            .upsert_profile(&Profile {
                id: "u1".to_string(),
                avatar_path: Some("u1/avatar.png".to_string()),
            })
            .await
            .unwrap();
        // A pathless upsert must not clobber the stored path.
        backend
            .upsert_profile(&Profile {
                id: "u1".to_string(),
                avatar_path: None,
            })
            .await
            .unwrap();

        let profile = backend.fetch_profile("u1").await.unwrap().unwrap();
        assert_eq!(profile.avatar_path.as_deref(), Some("u1/avatar.png"));
    }
}
