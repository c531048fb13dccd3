//! # Wire models shared with the hosted backend
//!
//! Every type here crosses the HTTP or WebSocket boundary, so everything is
//! `Serialize + Deserialize`. Identifiers are plain `String`s (the hosted
//! service uses UUIDs, but the client never interprets them), which also keeps
//! the types WASM-clean.
//!
//! | Type | Represents |
//! |------|-----------|
//! | [`Session`] | The identity provider's "who is signed in": an opaque access token plus the user it belongs to. Absent = logged out. |
//! | [`UserInfo`] | The client-safe projection of the authenticated user. |
//! | [`Item`] | One user-owned row of the `items` table. |
//! | [`NewItem`] | The insert payload for `items` (the backend assigns the id). |
//! | [`Profile`] | The per-user profile row; `avatar_path` points into object storage. |
//! | [`RowChange`] | A decoded live-update notification. Its serde representation (`type` tag, lowercase) is also the realtime frame format, so [`parse_row_change`] is just a `serde_json` call. |

use serde::{Deserialize, Serialize};

/// An authenticated session as reported by the identity provider.
///
/// The access token is opaque to the client; it is only ever echoed back in
/// `Authorization` headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: UserInfo,
}

/// User information safe to hold client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
}

/// One row of the per-user items table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub owner_id: String,
}

/// Insert payload for a new item. The backend assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub owner_id: String,
}

/// The per-user profile row. `id` equals the owning user's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_path: Option<String>,
}

/// A live-update notification for the items table.
///
/// Doubles as the realtime frame format:
///
/// ```json
/// {"type":"insert","row":{"id":"…","name":"…","owner_id":"…"}}
/// {"type":"update","row":{"id":"…","name":"…","owner_id":"…"}}
/// {"type":"delete","id":"…"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RowChange {
    Insert { row: Item },
    Update { row: Item },
    Delete { id: String },
}

impl RowChange {
    /// The identifier of the row this change concerns.
    pub fn row_id(&self) -> &str {
        match self {
            Self::Insert { row } | Self::Update { row } => &row.id,
            Self::Delete { id } => id,
        }
    }
}

/// Decode a realtime frame. Unknown or malformed frames yield `None`; the
/// caller logs and drops them.
pub fn parse_row_change(text: &str) -> Option<RowChange> {
    serde_json::from_str(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> Item {
        Item {
            id: id.to_string(),
            name: "socks".to_string(),
            owner_id: "u1".to_string(),
        }
    }

    #[test]
    fn parses_insert_frame() {
        let frame = r#"{"type":"insert","row":{"id":"a","name":"socks","owner_id":"u1"}}"#;
        assert_eq!(parse_row_change(frame), Some(RowChange::Insert { row: item("a") }));
    }

    #[test]
    fn parses_delete_frame() {
        let frame = r#"{"type":"delete","id":"a"}"#;
        assert_eq!(
            parse_row_change(frame),
            Some(RowChange::Delete { id: "a".to_string() })
        );
    }

    #[test]
    fn rejects_unknown_frames() {
        assert_eq!(parse_row_change(r#"{"type":"truncate"}"#), None);
        assert_eq!(parse_row_change("not json"), None);
        assert_eq!(parse_row_change(r#"{"type":"insert"}"#), None);
    }

    #[test]
    fn row_id_matches_variant() {
        assert_eq!(RowChange::Insert { row: item("a") }.row_id(), "a");
        assert_eq!(RowChange::Delete { id: "b".to_string() }.row_id(), "b");
    }
}
