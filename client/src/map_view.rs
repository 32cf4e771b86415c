use std::any::Any;
use std::cell::RefCell;

use leptos::callback::{Callable, Callback};
use leptos::mount::mount_to;
use leptos::prelude::*;
use registry_shared::{Facility, LatLng};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{JsFuture, spawn_local};

use crate::config::{
    DETAILS_ZOOM_LEVEL, INITIAL_CENTER, INITIAL_ZOOM, MAP_CONTAINER_ID, google_maps_loader_url,
};
use crate::leaflet::{MapHandle, MapSetup};
use crate::popup::FacilitiesMapPopup;
use crate::route::{self, CurrentRoute, Route};
use crate::store::Store;
use crate::toast::Toasts;
use crate::view_state::{DefaultView, MapViewController};

const DEFAULT_VIEW: DefaultView = DefaultView {
    center: INITIAL_CENTER,
    zoom: INITIAL_ZOOM,
    details_zoom: DETAILS_ZOOM_LEVEL,
};
const GOOGLE_LOADER_SCRIPT_ID: &str = "google-maps-loader";

thread_local! {
    static MAP_BINDING: RefCell<Option<MapHandle>> = const { RefCell::new(None) };
    static POPUP_MOUNT: RefCell<Option<Box<dyn Any>>> = const { RefCell::new(None) };
}

fn with_map<R>(f: impl FnOnce(&MapHandle) -> R) -> Option<R> {
    MAP_BINDING.with(|slot| slot.borrow().as_ref().map(f))
}

fn teardown_map() {
    // Unmount popup content before the map that hosts it goes away.
    let _popup = POPUP_MOUNT.with(|slot| slot.borrow_mut().take());
    if let Some(handle) = MAP_BINDING.with(|slot| slot.borrow_mut().take()) {
        handle.teardown();
    }
}

/// Inject the Google Maps JS API once, localized to `region`.
fn load_google_maps(api_key: &str, region: &str) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    if document.get_element_by_id(GOOGLE_LOADER_SCRIPT_ID).is_some() {
        return;
    }
    let Some(head) = document.head() else {
        return;
    };
    let Ok(script) = document.create_element("script") else {
        return;
    };
    script.set_id(GOOGLE_LOADER_SCRIPT_ID);
    let src = google_maps_loader_url(api_key, region);
    for (name, value) in [("src", src.as_str()), ("async", "")] {
        if let Err(e) = script.set_attribute(name, value) {
            web_sys::console::warn_1(
                &format!("Google Maps loader attribute {name} rejected: {e:?}").into(),
            );
            return;
        }
    }
    if let Err(e) = head.append_child(&script) {
        web_sys::console::warn_1(&format!("Google Maps loader injection failed: {e:?}").into());
    }
}

fn show_popup(
    facilities: Vec<Facility>,
    anchor: LatLng,
    selected_id: Option<String>,
    on_select: Callback<String>,
    on_close: Callback<()>,
) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let Some(content) = document
        .create_element("div")
        .ok()
        .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
    else {
        return;
    };

    let handle = mount_to(content.clone(), move || {
        view! {
            <FacilitiesMapPopup
                facilities=facilities
                selected_id=selected_id
                on_select=on_select
                on_close=on_close
            />
        }
    });
    with_map(|map| map.open_popup(anchor, &content));
    POPUP_MOUNT.with(|slot| {
        *slot.borrow_mut() = Some(Box::new(handle));
    });
}

fn hide_popup() {
    with_map(MapHandle::close_popup);
    let _old = POPUP_MOUNT.with(|slot| slot.borrow_mut().take());
}

/// Interactive facility map. Owns one [`MapViewController`] per mount.
#[component]
pub fn MapView(#[prop(into)] google_api_key: String) -> impl IntoView {
    let store: Store = expect_context();
    let current_route: CurrentRoute = expect_context();
    let toasts: Toasts = expect_context();

    let fetching = store.fetching();
    let facilities_version = store.facilities_version();
    let focused = store.focused_facility();
    let reset_counter = store.reset_counter();
    let embedded = store.embedded();
    let country_code =
        Memo::new(move |_| store.0.with(|s| s.client_info.country_code().to_string()));
    let route_id = Memo::new(move |_| {
        current_route
            .0
            .with(|r| r.facility_id().map(str::to_string))
    });

    let deep_link_id = route_id.get_untracked();
    let controller = StoredValue::new(MapViewController::mount(
        DEFAULT_VIEW,
        reset_counter.get_untracked(),
    ));
    let candidates: RwSignal<Option<Vec<Facility>>> = RwSignal::new(None);
    let map_ready = RwSignal::new(false);
    let container = NodeRef::<leptos::html::Div>::new();

    let sync_candidates = move || {
        candidates.set(controller.with_value(|c| c.candidates().map(<[Facility]>::to_vec)));
    };
    let go_to_facility = move |id: String| {
        route::navigate(
            current_route,
            Route::Map {
                facility_id: Some(id),
            },
        );
    };

    let on_select = Callback::new(move |id: String| {
        let mut target = None;
        controller.update_value(|c| target = c.select_candidate(&id));
        sync_candidates();
        if let Some(id) = target {
            go_to_facility(id);
        }
    });
    let on_close = Callback::new(move |_: ()| {
        controller.update_value(|c| c.close_popup());
        sync_candidates();
    });

    // Mount the widget once the container is in the DOM.
    Effect::new(move || {
        if container.get().is_none() || map_ready.get_untracked() {
            return;
        }
        load_google_maps(&google_api_key, &country_code.get_untracked());

        let setup = MapSetup {
            container_id: MAP_CONTAINER_ID,
            scroll_wheel_zoom: !embedded.get_untracked(),
        };
        let mut handle = match MapHandle::mount(&setup) {
            Ok(handle) => handle,
            Err(e) => {
                web_sys::console::warn_1(&format!("Map unavailable: {e}").into());
                return;
            }
        };

        handle.on_marker_click(go_to_facility);
        handle.on_cluster_click(move |click| {
            let opened = store.with_facilities_untracked(|data| {
                let mut opened = false;
                controller.update_value(|c| {
                    opened = c.on_cluster_click(click.at, click.zoom, click.max_zoom, data);
                });
                opened
            });
            if opened {
                let count = controller.with_value(|c| c.candidates().map_or(0, <[Facility]>::len));
                web_sys::console::info_1(
                    &format!("Disambiguating {count} co-located facilities").into(),
                );
            }
            sync_candidates();
        });
        handle.on_popup_close(move || on_close.run(()));

        MAP_BINDING.with(|slot| {
            *slot.borrow_mut() = Some(handle);
        });
        controller.update_value(|c| {
            c.on_widget_ready(deep_link_id.as_deref());
        });
        map_ready.set(true);
    });

    on_cleanup(teardown_map);

    // Deep-link centering and follow-on-focus-change.
    Effect::new(move || {
        let detail = focused.get();
        if !map_ready.get() {
            return;
        }
        with_map(|map| {
            controller.update_value(|c| c.on_focused_facility(detail.as_ref(), map));
        });
    });

    // Edge-triggered reset.
    Effect::new(move || {
        let counter = reset_counter.get();
        if !map_ready.get() {
            return;
        }
        let mut reset = false;
        with_map(|map| {
            controller.update_value(|c| reset = c.on_reset_counter(counter, map));
        });
        if reset {
            sync_candidates();
        }
    });

    // Fresh searches close the disambiguation popup.
    Effect::new(move || {
        let fetching = fetching.get();
        controller.update_value(|c| c.on_fetching(fetching));
        sync_candidates();
    });

    Effect::new(move || {
        facilities_version.track();
        let selected = route_id.get();
        if !map_ready.get() {
            return;
        }
        store.with_facilities_untracked(|data| {
            with_map(|map| map.set_markers(data, selected.as_deref()));
        });
    });

    Effect::new(move || {
        let list = candidates.get();
        if !map_ready.get() {
            return;
        }
        let anchor = controller.with_value(MapViewController::popup_anchor);
        match (list, anchor) {
            (Some(list), Some(anchor)) => {
                show_popup(list, anchor, route_id.get_untracked(), on_select, on_close);
            }
            _ => hide_popup(),
        }
    });

    view! {
        <div class="facilities-map" style="width: 100%; height: 100%; position: relative;">
            <div id=MAP_CONTAINER_ID node_ref=container style="width: 100%; height: 100%;" />
            <div style="position: absolute; top: 10px; right: 10px; z-index: 1000;">
                <ShareSearchButton toasts=toasts />
            </div>
        </div>
    }
}

async fn copy_to_clipboard(text: &str) -> Result<(), String> {
    let window = web_sys::window().ok_or("window unavailable")?;
    let promise = window.navigator().clipboard().write_text(text);
    JsFuture::from(promise)
        .await
        .map_err(|e| format!("clipboard write rejected: {e:?}"))?;
    Ok(())
}

/// Copies the current search URL (minus the `embed` flag) to the clipboard.
#[component]
fn ShareSearchButton(toasts: Toasts) -> impl IntoView {
    let on_click = move |_| {
        let text = route::location_without_embed_param(&route::current_href());
        spawn_local(async move {
            match copy_to_clipboard(&text).await {
                Ok(()) => toasts.notify("Copied search to clipboard"),
                Err(e) => web_sys::console::warn_1(&e.into()),
            }
        });
    };

    view! {
        <button
            class="button share-search"
            style="font-size: 12px; padding: 6px 10px; cursor: pointer;"
            on:click=on_click
        >
            "Share This Search"
        </button>
    }
}
