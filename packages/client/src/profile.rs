//! # Avatar resolution and the upload pipeline
//!
//! Two small pieces of the sync contract live here.
//!
//! [`resolve_avatar`] is the one-shot lookup run on entering the
//! authenticated state: read the profile row, and if it carries a stored
//! path, resolve it to a display URL. Every failure mode — missing profile,
//! missing path, read error, resolve error — publishes "no avatar" (`None`);
//! read errors are logged and never surfaced.
//!
//! [`upload_avatar`] is the three-step pipeline behind the upload button:
//! write the bytes to the per-user deterministic path (overwriting), merge
//! the path into the profile row, resolve the new display URL. A failure at
//! any step aborts the remaining steps and propagates; no rollback of the
//! earlier steps is attempted.
//!
//! [`UploadFlow`] is the mutual-exclusion gate: one upload at a time, a
//! second attempt while busy is a no-op, not an error.

use crate::backend::Backend;
use crate::error::ClientError;
use crate::models::Profile;

/// Where a user's avatar lives in the bucket. Deterministic per user and
/// extension, so every upload overwrites the previous object.
pub fn avatar_path(user_id: &str, file_name: &str) -> String {
    format!("{user_id}/avatar.{}", ext_from_file_name(file_name))
}

/// File extension of an uploaded file, lowercased. Defaults to `png`.
pub fn ext_from_file_name(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "png".to_string())
}

/// MIME type for an image extension.
pub fn content_type_for_ext(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Resolve the current user's avatar to a display URL, or `None`.
pub async fn resolve_avatar<B: Backend>(backend: &B, user_id: &str) -> Option<String> {
    let profile = match backend.fetch_profile(user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!("profile read failed: {e}");
            return None;
        }
    };
    let path = profile.and_then(|p| p.avatar_path)?;
    match backend.resolve_object_url(&path).await {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::error!("avatar url resolution failed: {e}");
            None
        }
    }
}

/// Upload an avatar and point the profile at it. Returns the new display URL.
pub async fn upload_avatar<B: Backend>(
    backend: &B,
    user_id: &str,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<String, ClientError> {
    let ext = ext_from_file_name(file_name);
    let path = avatar_path(user_id, file_name);

    backend
        .upload_object(&path, content_type_for_ext(&ext), bytes)
        .await?;
    backend
        .upsert_profile(&Profile {
            id: user_id.to_string(),
            avatar_path: Some(path.clone()),
        })
        .await?;
    backend.resolve_object_url(&path).await
}

/// One-at-a-time gate for the upload flow.
///
/// The trigger control is disabled while an upload is in flight; a second
/// attempt that slips through anyway sees `try_begin` return `false` and
/// does nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadFlow {
    uploading: bool,
}

impl UploadFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate. `false` means an upload is already in flight and the
    /// caller must back off.
    pub fn try_begin(&mut self) -> bool {
        if self.uploading {
            return false;
        }
        self.uploading = true;
        true
    }

    /// Release the gate, success or not.
    pub fn finish(&mut self) {
        self.uploading = false;
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G'];

    #[test]
    fn extension_handling() {
        assert_eq!(ext_from_file_name("me.PNG"), "png");
        assert_eq!(ext_from_file_name("photo.jpeg"), "jpeg");
        assert_eq!(ext_from_file_name("no-extension"), "png");
        assert_eq!(ext_from_file_name("trailing-dot."), "png");
        assert_eq!(avatar_path("u1", "me.jpg"), "u1/avatar.jpg");
    }

    #[tokio::test]
    async fn no_stored_path_resolves_to_no_avatar() {
        let backend = MemoryBackend::new();
        assert_eq!(resolve_avatar(&backend, "u1").await, None);

        // A profile row without a path is still "no avatar".
        backend
            .upsert_profile(&Profile {
                id: "u1".to_string(),
                avatar_path: None,
            })
            .await
            .unwrap();
        assert_eq!(resolve_avatar(&backend, "u1").await, None);
    }

    #[tokio::test]
    async fn upload_publishes_a_fresh_url() {
        let backend = MemoryBackend::new();
        let first = upload_avatar(&backend, "u1", "me.png", PNG.to_vec())
            .await
            .unwrap();
        assert_eq!(resolve_avatar(&backend, "u1").await.as_ref(), Some(&first));

        let second = upload_avatar(&backend, "u1", "me.png", PNG.to_vec())
            .await
            .unwrap();
        assert_ne!(second, first);
        assert_eq!(resolve_avatar(&backend, "u1").await, Some(second));
    }

    #[tokio::test]
    async fn failed_profile_write_leaves_published_avatar_unchanged() {
        let backend = MemoryBackend::new();
        upload_avatar(&backend, "u1", "me.png", PNG.to_vec())
            .await
            .unwrap();
        let before = resolve_avatar(&backend, "u1").await;
        assert!(before.is_some());

        backend.set_fail_profile_upserts(true);
        let mut flow = UploadFlow::new();
        assert!(flow.try_begin());
        let result = upload_avatar(&backend, "u1", "me.jpg", PNG.to_vec()).await;
        flow.finish();

        assert!(matches!(result, Err(ClientError::Backend(_))));
        assert!(!flow.is_uploading());
        // The storage write happened (no rollback), but the profile still
        // points at the old object, so the published URL is unchanged.
        assert!(backend.object_exists("u1/avatar.jpg"));
        assert_eq!(resolve_avatar(&backend, "u1").await, before);
    }

    #[tokio::test]
    async fn failed_storage_write_aborts_the_pipeline() {
        let backend = MemoryBackend::new();
        backend.set_fail_uploads(true);

        let result = upload_avatar(&backend, "u1", "me.png", PNG.to_vec()).await;
        assert!(matches!(result, Err(ClientError::Storage(_))));
        assert!(!backend.object_exists("u1/avatar.png"));
        assert_eq!(resolve_avatar(&backend, "u1").await, None);
    }

    #[test]
    fn second_attempt_while_busy_is_a_noop() {
        let mut flow = UploadFlow::new();
        assert!(flow.try_begin());
        assert!(!flow.try_begin());
        flow.finish();
        assert!(flow.try_begin());
    }
}
