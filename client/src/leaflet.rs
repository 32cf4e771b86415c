#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

//! Thin bindings over the Leaflet globals loaded by the host page
//! (`leaflet`, `leaflet.markercluster`, `leaflet.gridlayer.googlemutant`).

use std::cell::Cell;
use std::rc::Rc;

use js_sys::{Array, Object, Reflect};
use registry_shared::{ClusterIconTier, FacilityCollection, LatLng, LatLngBounds};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::config::{
    INITIAL_CENTER, INITIAL_ZOOM, MARKER_ICON_ANCHOR, MARKER_ICON_SIZE, MAX_BOUNDS, MINIMUM_ZOOM,
    SELECTED_MARKER_URL, UNSELECTED_MARKER_URL,
};
use crate::view_state::MapWidget;

const FACILITY_ID_OPTION: &str = "facilityId";

#[wasm_bindgen]
extern "C" {
    #[derive(Clone)]
    type Map;

    #[wasm_bindgen(catch, js_namespace = L, js_name = map)]
    fn create_map(container_id: &str, options: &JsValue) -> Result<Map, JsValue>;

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view_with_zoom(this: &Map, center: &JsValue, zoom: f64);

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view_keep_zoom(this: &Map, center: &JsValue);

    #[wasm_bindgen(method, js_name = getBounds)]
    fn get_bounds(this: &Map) -> Bounds;

    #[wasm_bindgen(method, js_name = getZoom)]
    fn get_zoom(this: &Map) -> f64;

    #[wasm_bindgen(method, js_name = getMaxZoom)]
    fn get_max_zoom(this: &Map) -> f64;

    #[wasm_bindgen(method, js_name = closePopup)]
    fn close_popup(this: &Map);

    #[wasm_bindgen(method)]
    fn remove(this: &Map);

    #[wasm_bindgen(method)]
    fn on(this: &Map, event: &str, handler: &js_sys::Function);

    type Bounds;

    #[wasm_bindgen(method, js_name = getSouth)]
    fn get_south(this: &Bounds) -> f64;

    #[wasm_bindgen(method, js_name = getWest)]
    fn get_west(this: &Bounds) -> f64;

    #[wasm_bindgen(method, js_name = getNorth)]
    fn get_north(this: &Bounds) -> f64;

    #[wasm_bindgen(method, js_name = getEast)]
    fn get_east(this: &Bounds) -> f64;

    type Layer;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &Layer, map: &Map);

    #[wasm_bindgen(catch, js_namespace = ["L", "gridLayer"], js_name = googleMutant)]
    fn google_mutant(options: &JsValue) -> Result<Layer, JsValue>;

    #[wasm_bindgen(js_namespace = ["L", "control"], js_name = zoom)]
    fn zoom_control(options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = canvas)]
    fn canvas_renderer() -> JsValue;

    #[wasm_bindgen(js_namespace = L, js_name = icon)]
    fn icon(options: &JsValue) -> JsValue;

    #[wasm_bindgen(js_namespace = L, js_name = divIcon)]
    fn div_icon(options: &JsValue) -> JsValue;

    #[wasm_bindgen(js_namespace = L, js_name = marker)]
    fn marker(lat_lng: &JsValue, options: &JsValue) -> JsValue;

    type ClusterGroup;

    #[wasm_bindgen(catch, js_namespace = L, js_name = markerClusterGroup)]
    fn marker_cluster_group(options: &JsValue) -> Result<ClusterGroup, JsValue>;

    #[wasm_bindgen(method, js_name = addLayers)]
    fn add_layers(this: &ClusterGroup, layers: &Array);

    #[wasm_bindgen(method, js_name = clearLayers)]
    fn clear_layers(this: &ClusterGroup);

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &ClusterGroup, map: &Map);

    #[wasm_bindgen(method)]
    fn on(this: &ClusterGroup, event: &str, handler: &js_sys::Function);

    type Popup;

    #[wasm_bindgen(js_namespace = L, js_name = popup)]
    fn popup(options: &JsValue) -> Popup;

    #[wasm_bindgen(method, js_name = setLatLng)]
    fn set_lat_lng(this: &Popup, lat_lng: &JsValue);

    #[wasm_bindgen(method, js_name = setContent)]
    fn set_content(this: &Popup, content: &web_sys::HtmlElement);

    #[wasm_bindgen(method, js_name = openOn)]
    fn open_on(this: &Popup, map: &Map);
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MapOptions {
    center: [f64; 2],
    zoom: f64,
    min_zoom: f64,
    scroll_wheel_zoom: bool,
    zoom_control: bool,
    max_bounds: [[f64; 2]; 2],
    world_copy_jump: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClusterOptions {
    show_coverage_on_hover: bool,
    remove_outside_visible_bounds: bool,
    spiderfy_on_max_zoom: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IconOptions<'a> {
    icon_url: &'a str,
    icon_size: [u32; 2],
    icon_anchor: [u32; 2],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DivIconOptions {
    class_name: String,
    icon_size: [u32; 2],
    html: String,
}

/// Cluster click as reported by the widget.
#[derive(Debug, Clone, Copy)]
pub struct ClusterClick {
    pub at: LatLng,
    pub zoom: f64,
    pub max_zoom: f64,
}

/// Options decided by the caller at mount time.
pub struct MapSetup<'a> {
    pub container_id: &'a str,
    pub scroll_wheel_zoom: bool,
}

/// A mounted Leaflet map together with the listeners registered on it.
pub struct MapHandle {
    map: Map,
    clusters: ClusterGroup,
    selected_icon: JsValue,
    unselected_icon: JsValue,
    suppress_popup_close: Rc<Cell<bool>>,
    _icon_create: Closure<dyn Fn(JsValue) -> JsValue>,
    listeners: Vec<Closure<dyn Fn(JsValue)>>,
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, String> {
    serde_wasm_bindgen::to_value(value).map_err(|e| format!("option encode error: {e}"))
}

fn lat_lng(point: LatLng) -> JsValue {
    Array::of2(&point.lat.into(), &point.lng.into()).into()
}

fn read_f64(target: &JsValue, key: &str) -> Option<f64> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()?
        .as_f64()
}

fn read_lat_lng(event: &JsValue) -> Option<LatLng> {
    let raw = Reflect::get(event, &JsValue::from_str("latlng")).ok()?;
    let lat = read_f64(&raw, "lat")?;
    let lng = read_f64(&raw, "lng")?;
    (lat.is_finite() && lng.is_finite()).then_some(LatLng::new(lat, lng))
}

fn read_facility_id(event: &JsValue) -> Option<String> {
    let layer = Reflect::get(event, &JsValue::from_str("layer")).ok()?;
    let options = Reflect::get(&layer, &JsValue::from_str("options")).ok()?;
    Reflect::get(&options, &JsValue::from_str(FACILITY_ID_OPTION))
        .ok()?
        .as_string()
}

fn cluster_child_count(cluster: &JsValue) -> usize {
    Reflect::get(cluster, &JsValue::from_str("getChildCount"))
        .ok()
        .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
        .and_then(|f| f.call0(cluster).ok())
        .and_then(|count| count.as_f64())
        .map(|count| count.max(0.0) as usize)
        .unwrap_or(0)
}

fn cluster_icon(cluster: JsValue) -> JsValue {
    let count = cluster_child_count(&cluster);
    let tier = ClusterIconTier::for_count(count);
    let size = tier.size_px();
    let options = DivIconOptions {
        class_name: format!("cluster-icon {}", tier.class_name()),
        icon_size: [size, size],
        html: ClusterIconTier::label_html(count),
    };
    match to_js(&options) {
        Ok(options) => div_icon(&options),
        Err(_) => JsValue::UNDEFINED,
    }
}

fn marker_icon(url: &str) -> Result<JsValue, String> {
    let options = IconOptions {
        icon_url: url,
        icon_size: [MARKER_ICON_SIZE.0, MARKER_ICON_SIZE.1],
        icon_anchor: [MARKER_ICON_ANCHOR.0, MARKER_ICON_ANCHOR.1],
    };
    Ok(icon(&to_js(&options)?))
}

impl MapHandle {
    pub fn mount(setup: &MapSetup<'_>) -> Result<Self, String> {
        let (south, west, north, east) = MAX_BOUNDS;
        let options = to_js(&MapOptions {
            center: [INITIAL_CENTER.lat, INITIAL_CENTER.lng],
            zoom: INITIAL_ZOOM,
            min_zoom: MINIMUM_ZOOM,
            scroll_wheel_zoom: setup.scroll_wheel_zoom,
            zoom_control: false,
            max_bounds: [[south, west], [north, east]],
            world_copy_jump: true,
        })?;
        Reflect::set(&options, &JsValue::from_str("renderer"), &canvas_renderer())
            .map_err(|e| format!("renderer option error: {e:?}"))?;

        let map = create_map(setup.container_id, &options)
            .map_err(|e| format!("map init error: {e:?}"))?;

        let tile_options = Object::new();
        let _ = Reflect::set(&tile_options, &"type".into(), &"roadmap".into());
        let _ = Reflect::set(&tile_options, &"continuousWorld".into(), &true.into());
        let _ = Reflect::set(&tile_options, &"minZoom".into(), &1.into());
        match google_mutant(&tile_options) {
            Ok(layer) => layer.add_to(&map),
            Err(e) => web_sys::console::warn_1(&format!("Tile layer unavailable: {e:?}").into()),
        }

        let zoom_options = Object::new();
        let _ = Reflect::set(&zoom_options, &"position".into(), &"bottomright".into());
        zoom_control(&zoom_options).add_to(&map);

        let icon_create = Closure::<dyn Fn(JsValue) -> JsValue>::new(cluster_icon);
        let cluster_options = to_js(&ClusterOptions {
            show_coverage_on_hover: false,
            remove_outside_visible_bounds: true,
            spiderfy_on_max_zoom: false,
        })?;
        Reflect::set(
            &cluster_options,
            &JsValue::from_str("iconCreateFunction"),
            icon_create.as_ref(),
        )
        .map_err(|e| format!("cluster option error: {e:?}"))?;
        let clusters = marker_cluster_group(&cluster_options).map_err(|e| {
            map.remove();
            format!("cluster init error: {e:?}")
        })?;
        clusters.add_to(&map);

        Ok(Self {
            map,
            clusters,
            selected_icon: marker_icon(SELECTED_MARKER_URL)?,
            unselected_icon: marker_icon(UNSELECTED_MARKER_URL)?,
            suppress_popup_close: Rc::new(Cell::new(false)),
            _icon_create: icon_create,
            listeners: Vec::new(),
        })
    }

    pub fn on_cluster_click(&mut self, handler: impl Fn(ClusterClick) + 'static) {
        let map = self.map.clone();
        let listener = Closure::<dyn Fn(JsValue)>::new(move |event: JsValue| {
            let Some(at) = read_lat_lng(&event) else {
                return;
            };
            handler(ClusterClick {
                at,
                zoom: map.get_zoom(),
                max_zoom: map.get_max_zoom(),
            });
        });
        self.clusters
            .on("clusterclick", listener.as_ref().unchecked_ref());
        self.listeners.push(listener);
    }

    pub fn on_marker_click(&mut self, handler: impl Fn(String) + 'static) {
        let listener = Closure::<dyn Fn(JsValue)>::new(move |event: JsValue| {
            if let Some(id) = read_facility_id(&event) {
                handler(id);
            }
        });
        self.clusters.on("click", listener.as_ref().unchecked_ref());
        self.listeners.push(listener);
    }

    /// Fires when the user dismisses the popup; programmatic closes are filtered out.
    pub fn on_popup_close(&mut self, handler: impl Fn() + 'static) {
        let suppress = self.suppress_popup_close.clone();
        let listener = Closure::<dyn Fn(JsValue)>::new(move |_| {
            if !suppress.get() {
                handler();
            }
        });
        self.map.on("popupclose", listener.as_ref().unchecked_ref());
        self.listeners.push(listener);
    }

    /// Replace all markers. Facilities without a usable point are skipped.
    /// Returns the number of markers placed.
    pub fn set_markers(&self, facilities: Option<&FacilityCollection>, selected_id: Option<&str>) -> usize {
        self.clusters.clear_layers();
        let Some(facilities) = facilities else {
            return 0;
        };

        let layers = Array::new();
        for facility in &facilities.features {
            let Some(point) = facility.point() else {
                continue;
            };
            let icon = if selected_id == Some(facility.id.as_str()) {
                &self.selected_icon
            } else {
                &self.unselected_icon
            };
            let options = Object::new();
            let _ = Reflect::set(&options, &"icon".into(), icon);
            let _ = Reflect::set(
                &options,
                &JsValue::from_str(FACILITY_ID_OPTION),
                &JsValue::from_str(&facility.id),
            );
            layers.push(&marker(&lat_lng(point), &options));
        }
        self.clusters.add_layers(&layers);
        layers.length() as usize
    }

    pub fn open_popup(&self, at: LatLng, content: &web_sys::HtmlElement) {
        self.suppress_popup_close.set(true);
        let popup = popup(&JsValue::UNDEFINED);
        popup.set_lat_lng(&lat_lng(at));
        popup.set_content(content);
        popup.open_on(&self.map);
        self.suppress_popup_close.set(false);
    }

    pub fn close_popup(&self) {
        self.suppress_popup_close.set(true);
        self.map.close_popup();
        self.suppress_popup_close.set(false);
    }

    /// Remove the map from the page. Leaflet drops every listener it owns.
    pub fn teardown(self) {
        self.map.remove();
    }
}

impl MapWidget for MapHandle {
    fn set_view(&self, center: LatLng, zoom: Option<f64>) {
        match zoom {
            Some(zoom) => self.map.set_view_with_zoom(&lat_lng(center), zoom),
            None => self.map.set_view_keep_zoom(&lat_lng(center)),
        }
    }

    fn bounds(&self) -> Option<LatLngBounds> {
        let bounds = self.map.get_bounds();
        let (south, west, north, east) = (
            bounds.get_south(),
            bounds.get_west(),
            bounds.get_north(),
            bounds.get_east(),
        );
        if [south, west, north, east].iter().all(|v| v.is_finite()) {
            Some(LatLngBounds::new(
                LatLng::new(south, west),
                LatLng::new(north, east),
            ))
        } else {
            None
        }
    }
}
