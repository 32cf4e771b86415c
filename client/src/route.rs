use std::cell::RefCell;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;

use crate::config::{CONTRIBUTE_ROUTE, FACILITIES_ROUTE, NAVIGATE_EVENT_NAME};

/// Page selected by the current location path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Facility map, optionally deep-linked to one facility.
    Map { facility_id: Option<String> },
    Contribute,
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["contribute"] => Self::Contribute,
            ["facilities", id, ..] => Self::Map {
                facility_id: Some(decode_component(id)),
            },
            _ => Self::Map { facility_id: None },
        }
    }

    pub fn facility_id(&self) -> Option<&str> {
        match self {
            Self::Map { facility_id } => facility_id.as_deref(),
            Self::Contribute => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Map {
                facility_id: Some(id),
            } => make_facility_detail_link(id),
            Self::Map { facility_id: None } => FACILITIES_ROUTE.to_string(),
            Self::Contribute => CONTRIBUTE_ROUTE.to_string(),
        }
    }
}

pub fn make_facility_detail_link(id: &str) -> String {
    format!("{FACILITIES_ROUTE}/{}", encode_component(id))
}

/// Drop every `embed` query parameter from `href`. Input the browser cannot
/// parse as a URL is returned unchanged.
pub fn location_without_embed_param(href: &str) -> String {
    match web_sys::Url::new(href) {
        Ok(url) => {
            url.search_params().delete("embed");
            url.href()
        }
        Err(e) => {
            web_sys::console::warn_1(&format!("Cannot parse {href} as a URL: {e:?}").into());
            href.to_string()
        }
    }
}

pub fn encode_component(raw: &str) -> String {
    js_sys::encode_uri_component(raw)
        .as_string()
        .unwrap_or_default()
}

/// Inverse of [`encode_component`]. Segments without escapes are taken as-is;
/// malformed escapes keep the segment verbatim.
pub fn decode_component(encoded: &str) -> String {
    if !encoded.contains('%') {
        return encoded.to_string();
    }
    js_sys::decode_uri_component(encoded)
        .ok()
        .and_then(|decoded| decoded.as_string())
        .unwrap_or_else(|| encoded.to_string())
}

/// Reactive handle on the current route. Copyable so it can be captured by closures.
#[derive(Clone, Copy)]
pub(crate) struct CurrentRoute(pub RwSignal<Route>);

struct PopstateBinding {
    window: web_sys::Window,
    _handler: Closure<dyn Fn(web_sys::Event)>,
}

thread_local! {
    static POPSTATE_BINDING: RefCell<Option<PopstateBinding>> = const { RefCell::new(None) };
}

pub(crate) fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

pub(crate) fn current_href() -> String {
    web_sys::window()
        .and_then(|w| w.location().href().ok())
        .unwrap_or_default()
}

/// Push `route` onto browser history, update the route signal and tell the
/// host page so its data layer can load the facility.
pub(crate) fn navigate(current: CurrentRoute, route: Route) {
    if current.0.get_untracked() == route {
        return;
    }
    let path = route.path();
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history()
            && let Err(e) = history.push_state_with_url(&JsValue::NULL, "", Some(&path))
        {
            web_sys::console::warn_1(&format!("pushState to {path} failed: {e:?}").into());
        }
        if let Err(e) = emit_navigation(&window, &path) {
            web_sys::console::warn_1(&e.into());
        }
    }
    current.0.set(route);
}

fn emit_navigation(window: &web_sys::Window, path: &str) -> Result<(), String> {
    let init = web_sys::CustomEventInit::new();
    init.set_detail(&JsValue::from_str(path));
    let event = web_sys::CustomEvent::new_with_event_init_dict(NAVIGATE_EVENT_NAME, &init)
        .map_err(|e| format!("navigation event error: {e:?}"))?;
    window
        .dispatch_event(&event)
        .map(|_| ())
        .map_err(|e| format!("navigation dispatch error: {e:?}"))
}

/// Keep the route signal in sync with back/forward navigation.
pub(crate) fn watch_popstate(current: CurrentRoute) {
    let Some(window) = web_sys::window() else {
        return;
    };

    unwatch_popstate();

    let handler = Closure::<dyn Fn(web_sys::Event)>::new(move |_| {
        current.0.set(Route::parse(&current_path()));
    });
    if window
        .add_event_listener_with_callback("popstate", handler.as_ref().unchecked_ref())
        .is_ok()
    {
        POPSTATE_BINDING.with(|slot| {
            *slot.borrow_mut() = Some(PopstateBinding {
                window: window.clone(),
                _handler: handler,
            });
        });
    }
}

pub(crate) fn unwatch_popstate() {
    POPSTATE_BINDING.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            let _ = old.window.remove_event_listener_with_callback(
                "popstate",
                old._handler.as_ref().unchecked_ref(),
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::{Route, decode_component};

    #[test]
    fn parses_map_routes() {
        assert_eq!(Route::parse("/"), Route::Map { facility_id: None });
        assert_eq!(Route::parse("/facilities"), Route::Map { facility_id: None });
        assert_eq!(
            Route::parse("/facilities/BD2019100ABC"),
            Route::Map {
                facility_id: Some("BD2019100ABC".into())
            }
        );
        assert_eq!(Route::parse("/unknown/page"), Route::Map { facility_id: None });
    }

    #[test]
    fn parses_contribute_route() {
        assert_eq!(Route::parse("/contribute"), Route::Contribute);
        assert_eq!(Route::parse("/contribute/"), Route::Contribute);
        assert_eq!(Route::Contribute.facility_id(), None);
    }

    #[test]
    fn plain_segments_skip_decoding() {
        assert_eq!(decode_component("BD2019100ABC"), "BD2019100ABC");
        assert_eq!(decode_component(""), "");
        assert_eq!(
            Route::parse("/facilities/US-2020_01.x~y/extra").facility_id(),
            Some("US-2020_01.x~y")
        );
    }

    #[test]
    fn map_path_without_facility_is_the_list_route() {
        assert_eq!(Route::Map { facility_id: None }.path(), "/facilities");
        assert_eq!(Route::Contribute.path(), "/contribute");
    }
}
