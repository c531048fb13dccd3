//! Platform-appropriate backend constructor.
//!
//! - **Web** (WASM + `web` feature): the hosted service via [`client::RestBackend`]
//! - **Native** (tests, local runs without a hosted service): [`client::MemoryBackend`]

use client::BackendConfig;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub type AppBackend = client::RestBackend;
#[cfg(not(all(target_arch = "wasm32", feature = "web")))]
pub type AppBackend = client::MemoryBackend;

/// Construct the backend the app runs against. Called once at startup; the
/// handle is injected into the component tree from there.
pub fn make_backend(config: &BackendConfig) -> AppBackend {
    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    {
        client::RestBackend::new(config.clone())
    }
    #[cfg(not(all(target_arch = "wasm32", feature = "web")))]
    {
        let _ = config;
        let backend = client::MemoryBackend::new();
        // Nothing hosted to talk to: seed an account so the app is usable.
        backend.register_user("demo@shelf.dev", "demo-password");
        backend
    }
}
