//! # Backend configuration
//!
//! [`BackendConfig`] identifies the hosted service instance the app talks to:
//! the base URL, the public (anonymous) API key sent with every request, and
//! the names of the items table and the avatar storage bucket.
//!
//! The struct is constructed once in `main` and injected into the backend
//! client; nothing else reads it. TOML (de)serialisation is provided for
//! deployments that ship the config as a file:
//!
//! ```toml
//! url = "https://example.backend.dev"
//! anon_key = "public-anon-key"
//!
//! items_table = "items"     # optional
//! avatar_bucket = "avatars" # optional
//! ```

use serde::{Deserialize, Serialize};

/// Connection settings for the hosted backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the hosted service, without a trailing slash.
    pub url: String,
    /// Public API key sent as the `apikey` header on every request.
    pub anon_key: String,
    /// Table holding the per-user rows.
    #[serde(default = "default_items_table")]
    pub items_table: String,
    /// Storage bucket holding uploaded avatars.
    #[serde(default = "default_avatar_bucket")]
    pub avatar_bucket: String,
}

fn default_items_table() -> String {
    "items".to_string()
}

fn default_avatar_bucket() -> String {
    "avatars".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new("http://localhost:54321", "dev-anon-key")
    }
}

impl BackendConfig {
    /// Create a config with the default table and bucket names.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let mut url = url.into();
        while url.ends_with('/') {
            url.pop();
        }
        Self {
            url,
            anon_key: anon_key.into(),
            items_table: default_items_table(),
            avatar_bucket: default_avatar_bucket(),
        }
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_roundtrip() {
        let config = BackendConfig::new("https://backend.example", "key-123");
        let text = config.to_toml().unwrap();
        let loaded = BackendConfig::from_toml(&text).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let loaded =
            BackendConfig::from_toml("url = \"https://b.example\"\nanon_key = \"k\"\n").unwrap();
        assert_eq!(loaded.items_table, "items");
        assert_eq!(loaded.avatar_bucket, "avatars");
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = BackendConfig::new("https://b.example/", "k");
        assert_eq!(config.url, "https://b.example");
    }
}
