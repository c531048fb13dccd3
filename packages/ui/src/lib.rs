//! This crate contains all shared UI for the workspace.

mod backend;
pub use backend::{make_backend, AppBackend};

mod session;
pub use session::{
    use_avatar, use_backend, use_items, use_session, AvatarState, LogoutButton, SessionProvider,
};

mod auth_buttons;
pub use auth_buttons::ProviderLoginButton;

mod avatar;
pub use avatar::{AvatarImage, AvatarUploader};
