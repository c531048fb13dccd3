//! Dashboard view: the authenticated half of the app.
//!
//! Lists the current user's rows from the shared cache, appends new rows,
//! renames in place, and hosts the avatar uploader. All data flow goes
//! through the context installed by `ui::SessionProvider`; this view never
//! talks to the live-update channel directly.

use dioxus::prelude::*;

use client::{Backend, NewItem, RowChange, SessionState};
use ui::{use_backend, use_items, use_session, AvatarImage, AvatarUploader, LogoutButton};

use crate::Route;

/// Dashboard page component.
#[component]
pub fn Dashboard() -> Element {
    let backend = use_backend();
    let session = use_session();
    let mut items = use_items();
    let nav = use_navigator();
    let mut new_name = use_signal(String::new);
    let mut form_error = use_signal(|| Option::<String>::None);
    let mut editing_id = use_signal(|| Option::<String>::None);
    let mut draft = use_signal(String::new);

    let state = session.read().state().clone();
    let current = match state {
        // SessionProvider holds the tree back until the first fetch resolves.
        SessionState::Loading => return rsx! {},
        SessionState::Anonymous => {
            nav.replace(Route::Login {});
            return rsx! {};
        }
        SessionState::Authenticated(current) => current,
    };
    let email = current.user.email.clone();

    let add_backend = backend.clone();
    let owner_id = current.user.id.clone();
    let handle_add = move |evt: FormEvent| {
        evt.prevent_default();
        let backend = add_backend.clone();
        let owner_id = owner_id.clone();
        spawn(async move {
            form_error.set(None);
            let name = new_name().trim().to_string();
            if name.is_empty() {
                return;
            }
            match backend.insert_item(&NewItem { name, owner_id }).await {
                Ok(row) => {
                    // The live channel echoes this insert; routing the
                    // returned row through the same insert-if-absent path
                    // keeps the echo from double-appending.
                    items.write().apply(RowChange::Insert { row });
                    new_name.set(String::new());
                }
                Err(e) => form_error.set(Some(e.to_string())),
            }
        });
    };

    let rows = items.read().items().to_vec();
    let rows_empty = rows.is_empty();
    let row_nodes = rows.into_iter().map(|item| {
        let rename_backend = backend.clone();
        let item_id = item.id.clone();
        let item_name = item.name.clone();
        let is_editing = editing_id() == Some(item.id.clone());

        rsx! {
            li {
                key: "{item.id}",
                class: "item-row",

                if is_editing {
                    form {
                        class: "item-row__edit",
                        onsubmit: move |evt: FormEvent| {
                            evt.prevent_default();
                            let backend = rename_backend.clone();
                            spawn(async move {
                                let Some(id) = editing_id() else {
                                    return;
                                };
                                let name = draft().trim().to_string();
                                if name.is_empty() {
                                    editing_id.set(None);
                                    return;
                                }
                                match backend.update_item(&id, &name).await {
                                    Ok(row) => {
                                        items.write().apply(RowChange::Update { row });
                                        editing_id.set(None);
                                    }
                                    Err(e) => form_error.set(Some(e.to_string())),
                                }
                            });
                        },
                        input {
                            class: "item-row__input",
                            value: draft(),
                            oninput: move |evt: FormEvent| draft.set(evt.value()),
                        }
                        button { class: "item-row__save", r#type: "submit", "Save" }
                        button {
                            class: "item-row__cancel",
                            r#type: "button",
                            onclick: move |_| editing_id.set(None),
                            "Cancel"
                        }
                    }
                } else {
                    span { class: "item-row__name", "{item.name}" }
                    button {
                        class: "item-row__rename",
                        onclick: move |_| {
                            editing_id.set(Some(item_id.clone()));
                            draft.set(item_name.clone());
                        },
                        "Rename"
                    }
                }
            }
        }
    });

    rsx! {
        div {
            class: "dashboard",

            header {
                class: "dashboard__header",
                h1 { class: "dashboard__title", "Shelf" }
                div {
                    class: "dashboard__user",
                    AvatarImage { size: 36 }
                    span { class: "dashboard__email", "{email}" }
                    LogoutButton { class: "dashboard__logout" }
                }
            }

            section {
                class: "dashboard__profile",
                AvatarUploader {}
            }

            section {
                class: "dashboard__items",
                h2 { "Your items" }

                if let Some(err) = form_error() {
                    div { class: "form-error", "{err}" }
                }

                form {
                    class: "item-add",
                    onsubmit: handle_add,
                    input {
                        class: "item-add__input",
                        placeholder: "Add something to your shelf",
                        value: new_name(),
                        oninput: move |evt: FormEvent| new_name.set(evt.value()),
                    }
                    button { class: "item-add__submit", r#type: "submit", "Add" }
                }

                if rows_empty {
                    p { class: "item-list__empty", "Nothing here yet." }
                } else {
                    ul { class: "item-list", {row_nodes} }
                }
            }
        }
    }
}
