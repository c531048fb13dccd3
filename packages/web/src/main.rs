use dioxus::prelude::*;

use ui::SessionProvider;
use views::{Dashboard, Login, Register};

mod views;

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[route("/")]
    Root {},
    #[route("/login")]
    Login {},
    #[route("/register")]
    Register {},
    #[route("/dashboard")]
    Dashboard {},
}

const MAIN_CSS: Asset = asset!("/assets/main.css");

fn main() {
    dioxus::logger::initialize_default();
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    // One config, one backend: the handle is built inside SessionProvider
    // and injected into the tree from there.
    let config = client::BackendConfig::new(
        option_env!("SHELF_BACKEND_URL").unwrap_or("http://localhost:54321"),
        option_env!("SHELF_ANON_KEY").unwrap_or("dev-anon-key"),
    );

    rsx! {
        document::Link { rel: "stylesheet", href: MAIN_CSS }

        SessionProvider {
            config: config,
            Router::<Route> {}
        }
    }
}

/// Redirect `/` by session state.
#[component]
fn Root() -> Element {
    let session = ui::use_session();
    let nav = use_navigator();

    if session.read().session().is_some() {
        nav.replace(Route::Dashboard {});
    } else {
        nav.replace(Route::Login {});
    }
    rsx! {}
}
