//! Session context and hooks for the UI.
//!
//! [`SessionProvider`] owns the whole synchronization contract: it fetches
//! the session once at startup, treats every provider notification as the new
//! authoritative session state, and re-derives the item cache and avatar
//! whenever the session value changes. Components read the results through
//! [`use_session`], [`use_items`], and [`use_avatar`].

use dioxus::prelude::*;

use client::{resolve_avatar, Backend, BackendConfig, ItemCache, SessionState, SessionTracker};

use crate::backend::{make_backend, AppBackend};

/// The currently published avatar, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvatarState {
    pub url: Option<String>,
}

/// The backend handle injected by [`SessionProvider`].
pub fn use_backend() -> AppBackend {
    use_context::<AppBackend>()
}

/// Current session state. Updates on every provider notification.
pub fn use_session() -> Signal<SessionTracker> {
    use_context::<Signal<SessionTracker>>()
}

/// The current user's row cache. Empty whenever no session is present.
pub fn use_items() -> Signal<ItemCache> {
    use_context::<Signal<ItemCache>>()
}

/// The current user's avatar URL, or none.
pub fn use_avatar() -> Signal<AvatarState> {
    use_context::<Signal<AvatarState>>()
}

/// Provider component that manages session, row-cache, and avatar state.
/// Wrap the app with this component; everything below it can use the hooks.
#[component]
pub fn SessionProvider(config: BackendConfig, children: Element) -> Element {
    let backend = use_hook(move || make_backend(&config));
    let mut session = use_signal(SessionTracker::new);
    let mut items = use_signal(ItemCache::new);
    let mut avatar = use_signal(AvatarState::default);

    use_context_provider({
        let backend = backend.clone();
        move || backend
    });
    use_context_provider(|| session);
    use_context_provider(|| items);
    use_context_provider(|| avatar);

    // Startup: one session fetch, then the provider notification loop. Each
    // delivered value overwrites the local state unconditionally.
    let bootstrap = backend.clone();
    let _ = use_future(move || {
        let backend = bootstrap.clone();
        async move {
            match backend.current_session().await {
                Ok(current) => session.write().apply(current),
                Err(e) => {
                    tracing::error!("session bootstrap failed: {e}");
                    session.write().apply(None);
                }
            }
            let mut changes = backend.subscribe_session();
            while let Some(next) = changes.next().await {
                session.write().apply(next);
            }
        }
    });

    // Re-derive rows and avatar from the session. When the session value
    // changes this resource restarts; dropping the superseded future drops
    // the row subscription, which tears it down.
    let derive = backend.clone();
    let _sync = use_resource(move || {
        let backend = derive.clone();
        async move {
            let state = session.read().state().clone();
            match state {
                SessionState::Authenticated(current) => {
                    let user_id = current.user.id;
                    match backend.list_items(&user_id).await {
                        Ok(rows) => items.write().replace_all(rows),
                        // Silent degrade: the cache stays empty.
                        Err(e) => tracing::error!("item refresh failed: {e}"),
                    }
                    avatar.set(AvatarState {
                        url: resolve_avatar(&backend, &user_id).await,
                    });
                    let mut changes = backend.subscribe_items(&user_id);
                    while let Some(change) = changes.next().await {
                        items.write().apply(change);
                    }
                }
                SessionState::Anonymous => {
                    items.write().clear();
                    avatar.set(AvatarState::default());
                }
                SessionState::Loading => {}
            }
        }
    });

    // Suspend the rest of the UI until the startup fetch resolves.
    if session.read().is_loading() {
        return rsx! {
            div { class: "loading-screen", "Loading..." }
        };
    }

    rsx! {
        {children}
    }
}

/// Button to end the current session.
#[component]
pub fn LogoutButton(
    #[props(default = "Sign out".to_string())] label: String,
    #[props(default = "".to_string())] class: String,
) -> Element {
    let backend = use_backend();
    let mut session = use_session();

    let onclick = move |_| {
        let backend = backend.clone();
        async move {
            if let Err(e) = backend.sign_out().await {
                tracing::error!("sign out failed: {e}");
            }
            session.write().apply(None);
        }
    };

    rsx! {
        button {
            class: "{class}",
            onclick: onclick,
            "{label}"
        }
    }
}
