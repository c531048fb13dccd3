pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod profile;
pub mod session;

mod memory;
pub use memory::MemoryBackend;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
mod rest;
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use rest::RestBackend;

pub use backend::{AuthSubscription, Backend, RowSubscription, Subscription};
pub use cache::ItemCache;
pub use config::BackendConfig;
pub use error::ClientError;
pub use models::{Item, NewItem, Profile, RowChange, Session, UserInfo};
pub use profile::{resolve_avatar, upload_avatar, UploadFlow};
pub use session::{SessionState, SessionTracker};
