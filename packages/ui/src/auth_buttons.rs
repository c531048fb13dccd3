//! Third-party sign-in button.

use dioxus::prelude::*;

use client::Backend;

use crate::session::use_backend;

/// Button that starts a third-party provider sign-in by redirecting the
/// browser to the provider URL. The redirect lands back on the app, where the
/// startup session fetch picks up the new session.
#[component]
pub fn ProviderLoginButton(
    provider: String,
    #[props(default = "Continue".to_string())] label: String,
    #[props(default = "".to_string())] class: String,
) -> Element {
    let backend = use_backend();
    let provider_clone = provider.clone();
    let mut loading = use_signal(|| false);

    let onclick = move |_| {
        let provider = provider_clone.clone();
        let backend = backend.clone();
        async move {
            loading.set(true);
            match backend.provider_sign_in_url(&provider) {
                Ok(url) => {
                    #[cfg(target_arch = "wasm32")]
                    {
                        if let Some(window) = web_sys::window() {
                            let _ = window.location().set_href(&url);
                        }
                    }
                    #[cfg(not(target_arch = "wasm32"))]
                    {
                        tracing::info!("provider sign-in url: {url}");
                        loading.set(false);
                    }
                }
                Err(e) => {
                    tracing::error!("provider sign-in unavailable: {e}");
                    loading.set(false);
                }
            }
        }
    };

    rsx! {
        button {
            class: "{class}",
            disabled: loading(),
            onclick: onclick,
            if loading() {
                "Redirecting..."
            } else {
                "{label}"
            }
        }
    }
}
