//! Error type for everything that talks to the hosted backend.

use thiserror::Error;

/// Client-side error taxonomy.
///
/// `Auth` messages come verbatim from the identity provider and are shown to
/// the user as-is. The other variants carry the remote or transport message;
/// whether they surface or are only logged is the caller's policy (data reads
/// degrade silently, the upload pipeline surfaces).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    #[error("{0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("storage error: {0}")]
    Storage(String),
}
