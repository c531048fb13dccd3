//! Login page view with credentials form and third-party sign-in.

use dioxus::prelude::*;

use client::Backend;
use ui::{use_backend, use_session, ProviderLoginButton};

use crate::Route;

/// Login page component.
#[component]
pub fn Login() -> Element {
    let backend = use_backend();
    let mut session = use_session();
    let nav = use_navigator();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);
    let mut loading = use_signal(|| false);

    // If already logged in, go straight to the dashboard.
    if session.read().session().is_some() {
        nav.replace(Route::Dashboard {});
    }

    let handle_login = move |evt: FormEvent| {
        evt.prevent_default();
        let backend = backend.clone();
        spawn(async move {
            error.set(None);

            let e = email().trim().to_string();
            let p = password();
            if e.is_empty() || p.is_empty() {
                error.set(Some("Email and password are required".to_string()));
                return;
            }

            loading.set(true);
            match backend.sign_in(&e, &p).await {
                Ok(new_session) => {
                    session.write().apply(Some(new_session));
                    nav.push(Route::Dashboard {});
                }
                Err(err) => {
                    loading.set(false);
                    error.set(Some(err.to_string()));
                }
            }
        });
    };

    rsx! {
        div {
            class: "auth-screen",

            h1 { class: "auth-screen__title", "Shelf" }
            p { class: "auth-screen__subtitle", "Sign in to your account" }

            form {
                class: "auth-form",
                onsubmit: handle_login,

                if let Some(err) = error() {
                    div { class: "form-error", "{err}" }
                }

                input {
                    class: "auth-form__input",
                    r#type: "email",
                    placeholder: "Email",
                    value: email(),
                    oninput: move |evt: FormEvent| email.set(evt.value()),
                }

                input {
                    class: "auth-form__input",
                    r#type: "password",
                    placeholder: "Password",
                    value: password(),
                    oninput: move |evt: FormEvent| password.set(evt.value()),
                }

                button {
                    class: "auth-form__submit",
                    r#type: "submit",
                    disabled: loading(),
                    if loading() { "Signing in..." } else { "Sign in" }
                }
            }

            div { class: "auth-screen__divider", "or" }

            ProviderLoginButton {
                provider: "github",
                label: "Continue with GitHub",
                class: "auth-form__provider",
            }

            p {
                class: "auth-screen__switch",
                "No account yet? "
                Link { to: Route::Register {}, "Sign up" }
            }
        }
    }
}
