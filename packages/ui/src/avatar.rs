//! Avatar display and upload.

use dioxus::prelude::*;

use client::{upload_avatar, ClientError, UploadFlow};

use crate::session::{use_avatar, use_backend, use_session, AvatarState};

/// The user's avatar image, or an initial-letter placeholder.
#[component]
pub fn AvatarImage(#[props(default = 32)] size: u32) -> Element {
    let session = use_session();
    let avatar = use_avatar();

    let initial = session
        .read()
        .email()
        .and_then(|email| email.chars().next())
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('?');

    match avatar().url {
        Some(url) => rsx! {
            img {
                class: "avatar",
                width: "{size}",
                height: "{size}",
                alt: "avatar",
                src: "{url}",
            }
        },
        None => rsx! {
            span {
                class: "avatar avatar--placeholder",
                style: "width: {size}px; height: {size}px; line-height: {size}px;",
                "{initial}"
            }
        },
    }
}

/// File picker that uploads a new profile picture.
///
/// One upload at a time: the input is disabled while a flight is in
/// progress, and a change event that slips through anyway is ignored. A
/// failed upload shows the backend's message and leaves the published avatar
/// as it was.
#[component]
pub fn AvatarUploader() -> Element {
    let backend = use_backend();
    let session = use_session();
    let mut avatar = use_avatar();
    let mut flow = use_signal(UploadFlow::new);
    let mut error = use_signal(|| Option::<String>::None);

    let onchange = move |evt: FormEvent| {
        let backend = backend.clone();
        async move {
            let Some(file_engine) = evt.files() else {
                return;
            };
            let Some(file_name) = file_engine.files().first().cloned() else {
                return;
            };
            if !flow.write().try_begin() {
                return;
            }
            error.set(None);

            let user_id = session.read().user_id().map(str::to_string);
            let result = async {
                let user_id = user_id
                    .ok_or_else(|| ClientError::Auth("You must be signed in to upload".to_string()))?;
                let bytes = file_engine.read_file(&file_name).await.ok_or_else(|| {
                    ClientError::Storage("could not read the selected file".to_string())
                })?;
                upload_avatar(&backend, &user_id, &file_name, bytes).await
            }
            .await;

            match result {
                Ok(url) => avatar.set(AvatarState { url: Some(url) }),
                Err(e) => error.set(Some(e.to_string())),
            }
            flow.write().finish();
        }
    };

    rsx! {
        div {
            class: "avatar-uploader",
            label {
                class: "avatar-uploader__label",
                "Profile picture"
                input {
                    r#type: "file",
                    accept: "image/*",
                    disabled: flow.read().is_uploading(),
                    onchange: onchange,
                }
            }
            if flow.read().is_uploading() {
                span { class: "avatar-uploader__busy", "Uploading..." }
            }
            if let Some(err) = error() {
                div { class: "form-error", "{err}" }
            }
        }
    }
}
