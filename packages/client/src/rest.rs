//! # REST backend — the browser client for the hosted service
//!
//! [`RestBackend`] implements [`Backend`] against the hosted service's HTTP
//! surface, and is only compiled for the web platform (`wasm32` + the `web`
//! feature). Endpoint layout:
//!
//! | Group | Endpoint |
//! |-------|----------|
//! | Identity | `POST /auth/v1/token?grant_type=password`, `POST /auth/v1/signup`, `GET /auth/v1/user`, `POST /auth/v1/logout`, `GET /auth/v1/authorize?provider=…` |
//! | Tabular | `GET/POST /rest/v1/<table>` with PostgREST-style filters (`?owner_id=eq.<uid>`), `PATCH …?id=eq.<id>`, upserts via `Prefer: resolution=merge-duplicates` |
//! | Object storage | `POST /storage/v1/object/<bucket>/<path>` (`x-upsert: true`), public URLs under `/storage/v1/object/public/…` |
//! | Realtime | WebSocket at `/realtime/v1/items`, JSON frames decoded by [`crate::models::parse_row_change`] |
//!
//! Every request carries the `apikey` header; authenticated requests add a
//! `Bearer` token. The session is persisted in `localStorage` and revalidated
//! against `/auth/v1/user` on startup, so a reload stays signed in.
//!
//! Session-change notifications are a local fan-out: the provider has no
//! push channel for auth, so `sign_in`/`sign_up`/`sign_out` notify the
//! registered subscribers themselves.
//!
//! Realtime errors degrade silently: a socket that cannot be opened yields a
//! dead subscription (logged), matching the policy for data reads.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::channel::mpsc;
use serde::Deserialize;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{ErrorEvent, MessageEvent, WebSocket};

use crate::backend::{AuthSubscription, Backend, RowSubscription, Subscription};
use crate::config::BackendConfig;
use crate::error::ClientError;
use crate::models::{parse_row_change, Item, NewItem, Profile, Session, UserInfo};

const SESSION_STORAGE_KEY: &str = "shelf.session";
const PROFILES_TABLE: &str = "profiles";

/// REST/WebSocket client for the hosted backend.
#[derive(Clone)]
pub struct RestBackend {
    config: BackendConfig,
    http: reqwest::Client,
    shared: Arc<Mutex<Shared>>,
}

#[derive(Default)]
struct Shared {
    session: Option<Session>,
    auth_subs: HashMap<u64, mpsc::UnboundedSender<Option<Session>>>,
    next_sub_id: u64,
}

/// Token response from the identity endpoints.
#[derive(Deserialize)]
struct AuthResponse {
    access_token: String,
    user: WireUser,
}

#[derive(Deserialize)]
struct WireUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl WireUser {
    fn into_user_info(self) -> UserInfo {
        UserInfo {
            id: self.id,
            email: self.email.unwrap_or_default(),
        }
    }
}

/// Error body shapes the hosted service uses across its capability groups.
#[derive(Deserialize, Default)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self, fallback: &str) -> String {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
            .unwrap_or_else(|| fallback.to_string())
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let fallback = format!("request failed with status {}", response.status().as_u16());
    match response.text().await {
        Ok(body) => serde_json::from_str::<ErrorBody>(&body)
            .unwrap_or_default()
            .into_message(&fallback),
        Err(_) => fallback,
    }
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

fn load_stored_session() -> Option<Session> {
    let raw = local_storage()?.get_item(SESSION_STORAGE_KEY).ok()??;
    serde_json::from_str(&raw).ok()
}

fn store_session(session: &Session) {
    let Some(storage) = local_storage() else {
        return;
    };
    if let Ok(raw) = serde_json::to_string(session) {
        let _ = storage.set_item(SESSION_STORAGE_KEY, &raw);
    }
}

fn clear_stored_session() {
    if let Some(storage) = local_storage() {
        let _ = storage.remove_item(SESSION_STORAGE_KEY);
    }
}

impl RestBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.config.url)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.config.url)
    }

    /// The bearer token for data requests: the session's token, or the
    /// anonymous key when logged out.
    fn bearer(&self) -> String {
        self.shared
            .lock()
            .unwrap()
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.config.anon_key.clone())
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
    }

    fn set_session(&self, session: Option<Session>) {
        let mut shared = self.shared.lock().unwrap();
        shared.session = session.clone();
        shared
            .auth_subs
            .retain(|_, tx| tx.unbounded_send(session.clone()).is_ok());
    }

    /// POST credentials to an identity endpoint and adopt the session.
    async fn credential_call(&self, path: &str, email: &str, password: &str) -> Result<Session, ClientError> {
        let response = self
            .http
            .post(self.auth_url(path))
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::Auth(error_message(response).await));
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let session = Session {
            access_token: auth.access_token,
            user: auth.user.into_user_info(),
        };
        store_session(&session);
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    /// WebSocket URL for the row subscription, derived from the base URL.
    fn realtime_url(&self, owner_id: &str) -> String {
        let ws_base = if let Some(rest) = self.config.url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.config.url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.config.url.clone()
        };
        format!(
            "{ws_base}/realtime/v1/{}?apikey={}&token={}&owner={owner_id}",
            self.config.items_table, self.config.anon_key, self.bearer()
        )
    }
}

impl Backend for RestBackend {
    async fn current_session(&self) -> Result<Option<Session>, ClientError> {
        let Some(stored) = load_stored_session() else {
            return Ok(None);
        };

        // Revalidate the stored token against the identity endpoint.
        let response = self
            .http
            .get(self.auth_url("user"))
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", stored.access_token))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if response.status().as_u16() == 401 {
            clear_stored_session();
            return Ok(None);
        }
        if !response.status().is_success() {
            tracing::warn!("session revalidation failed: {}", response.status());
            return Ok(None);
        }

        let user: WireUser = response
            .json()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let session = Session {
            access_token: stored.access_token,
            user: user.into_user_info(),
        };
        self.set_session(Some(session.clone()));
        Ok(Some(session))
    }

    fn subscribe_session(&self) -> AuthSubscription {
        let (tx, rx) = mpsc::unbounded();
        let mut shared = self.shared.lock().unwrap();
        let id = shared.next_sub_id;
        shared.next_sub_id += 1;
        shared.auth_subs.insert(id, tx);
        let handle = self.shared.clone();
        Subscription::new(rx, move || {
            handle.lock().unwrap().auth_subs.remove(&id);
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        self.credential_call("token?grant_type=password", email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        self.credential_call("signup", email, password).await
    }

    fn provider_sign_in_url(&self, provider: &str) -> Result<String, ClientError> {
        Ok(format!(
            "{}?provider={provider}",
            self.auth_url("authorize")
        ))
    }

    async fn sign_out(&self) -> Result<(), ClientError> {
        let token = self
            .shared
            .lock()
            .unwrap()
            .session
            .as_ref()
            .map(|s| s.access_token.clone());
        if let Some(token) = token {
            let result = self
                .http
                .post(self.auth_url("logout"))
                .header("apikey", &self.config.anon_key)
                .header("Authorization", format!("Bearer {token}"))
                .send()
                .await;
            if let Err(e) = result {
                // The local session is cleared regardless.
                tracing::warn!("logout call failed: {e}");
            }
        }
        clear_stored_session();
        self.set_session(None);
        Ok(())
    }

    async fn list_items(&self, owner_id: &str) -> Result<Vec<Item>, ClientError> {
        let url = format!(
            "{}?select=*&owner_id=eq.{owner_id}",
            self.table_url(&self.config.items_table)
        );
        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ClientError::Backend(error_message(response).await));
        }
        response
            .json()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))
    }

    async fn insert_item(&self, item: &NewItem) -> Result<Item, ClientError> {
        let response = self
            .request(reqwest::Method::POST, self.table_url(&self.config.items_table))
            .header("Prefer", "return=representation")
            .json(item)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ClientError::Backend(error_message(response).await));
        }
        let mut rows: Vec<Item> = response
            .json()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        rows.pop()
            .ok_or_else(|| ClientError::Backend("insert returned no row".to_string()))
    }

    async fn update_item(&self, id: &str, name: &str) -> Result<Item, ClientError> {
        let url = format!("{}?id=eq.{id}", self.table_url(&self.config.items_table));
        let response = self
            .request(reqwest::Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ClientError::Backend(error_message(response).await));
        }
        let mut rows: Vec<Item> = response
            .json()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        rows.pop()
            .ok_or_else(|| ClientError::Backend(format!("no row with id {id}")))
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>, ClientError> {
        let url = format!(
            "{}?select=*&id=eq.{user_id}",
            self.table_url(PROFILES_TABLE)
        );
        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ClientError::Backend(error_message(response).await));
        }
        let rows: Vec<Profile> = response
            .json()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(rows.into_iter().next())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), ClientError> {
        let response = self
            .request(reqwest::Method::POST, self.table_url(PROFILES_TABLE))
            .header("Prefer", "resolution=merge-duplicates")
            .json(profile)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ClientError::Backend(error_message(response).await));
        }
        Ok(())
    }

    fn subscribe_items(&self, owner_id: &str) -> RowSubscription {
        let url = self.realtime_url(owner_id);
        let ws = match WebSocket::new(&url) {
            Ok(ws) => ws,
            Err(e) => {
                tracing::error!("realtime socket failed to open: {e:?}");
                return Subscription::dead();
            }
        };

        let (tx, rx) = mpsc::unbounded();
        let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            let Some(text) = event.data().as_string() else {
                return;
            };
            match parse_row_change(&text) {
                Some(change) => {
                    let _ = tx.unbounded_send(change);
                }
                None => tracing::warn!("dropping unrecognized realtime frame"),
            }
        });
        let onerror = Closure::<dyn FnMut(ErrorEvent)>::new(move |_: ErrorEvent| {
            tracing::warn!("realtime socket error");
        });
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        Subscription::new(rx, move || {
            ws.set_onmessage(None);
            ws.set_onerror(None);
            let _ = ws.close();
            drop(onmessage);
            drop(onerror);
        })
    }

    async fn upload_object(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ClientError> {
        let url = format!(
            "{}/storage/v1/object/{}/{path}",
            self.config.url, self.config.avatar_bucket
        );
        let response = self
            .request(reqwest::Method::POST, url)
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ClientError::Storage(error_message(response).await));
        }
        Ok(())
    }

    async fn resolve_object_url(&self, path: &str) -> Result<String, ClientError> {
        // Cache-busting timestamp: the path is stable across uploads, the
        // rendered URL must not be.
        Ok(format!(
            "{}/storage/v1/object/public/{}/{path}?t={}",
            self.config.url,
            self.config.avatar_bucket,
            js_sys::Date::now() as u64
        ))
    }
}
