mod app;
mod config;
mod contribute;
mod leaflet;
mod map_view;
mod popup;
mod route;
mod store;
mod toast;
mod view_state;

use wasm_bindgen::JsCast;

use crate::config::APP_ROOT_ID;

/// Element the client renders into: the host's `#app` root when present,
/// otherwise `<body>`.
fn mount_target(document: &web_sys::Document) -> Option<web_sys::HtmlElement> {
    let root = document
        .get_element_by_id(APP_ROOT_ID)
        .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok());
    if root.is_none() {
        web_sys::console::info_1(&format!("No #{APP_ROOT_ID} element; mounting on <body>").into());
    }
    root.or_else(|| document.body())
}

fn main() {
    console_error_panic_hook::set_once();
    let document = web_sys::window().and_then(|w| w.document());
    let Some(target) = document.as_ref().and_then(mount_target) else {
        web_sys::console::warn_1(&"No document to mount the registry client into".into());
        return;
    };
    // The client lives for the whole page.
    leptos::mount::mount_to(target, app::App).forget();
}
