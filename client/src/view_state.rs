//! Map view-state controller.
//!
//! Translates external data changes (focused facility, reset counter, fetch
//! status, cluster clicks) into viewport commands and popup visibility. The
//! controller never touches the map widget directly; it drives anything that
//! implements [`MapWidget`], which keeps every rule testable without a
//! rendering surface.

use registry_shared::{Facility, FacilityCollection, LatLng, LatLngBounds};

/// Capabilities the controller needs from the map widget.
pub trait MapWidget {
    /// Move the viewport. `zoom: None` keeps the current zoom level.
    fn set_view(&self, center: LatLng, zoom: Option<f64>);

    /// Currently visible area, if the widget can report one.
    fn bounds(&self) -> Option<LatLngBounds>;
}

/// Viewport the map snaps to on mount and on reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultView {
    pub center: LatLng,
    pub zoom: f64,
    pub details_zoom: f64,
}

/// Transient state owned by one map mount.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub initial_load_handled: bool,
    pub pending_center_on_focus: bool,
    pub last_centered_facility_id: Option<String>,
    pub disambiguation_candidates: Option<Vec<Facility>>,
    pub last_seen_reset_counter: u64,
}

pub struct MapViewController {
    state: ViewState,
    defaults: DefaultView,
}

impl MapViewController {
    /// Start a mount. `reset_counter` is the reset trigger value already seen.
    pub fn mount(defaults: DefaultView, reset_counter: u64) -> Self {
        Self {
            state: ViewState {
                last_seen_reset_counter: reset_counter,
                ..ViewState::default()
            },
            defaults,
        }
    }

    /// First render with a live widget. Runs once per mount: arms deep-link
    /// centering when the route named a facility. Returns whether this call
    /// handled the initial load.
    pub fn on_widget_ready(&mut self, deep_link_id: Option<&str>) -> bool {
        if self.state.initial_load_handled {
            return false;
        }
        self.state.initial_load_handled = true;
        self.state.pending_center_on_focus = deep_link_id.is_some();
        true
    }

    pub fn candidates(&self) -> Option<&[Facility]> {
        self.state.disambiguation_candidates.as_deref()
    }

    /// Where the disambiguation popup is anchored: the first candidate's point.
    pub fn popup_anchor(&self) -> Option<LatLng> {
        self.candidates()?.first()?.point()
    }

    /// React to the focused facility's detail record. Handles both the one-shot
    /// deep-link snap and the follow-on-focus-change rule.
    pub fn on_focused_facility(&mut self, detail: Option<&Facility>, widget: &dyn MapWidget) {
        let Some(detail) = detail else {
            return;
        };
        if !self.state.initial_load_handled {
            return;
        }

        if self.state.pending_center_on_focus {
            self.state.pending_center_on_focus = false;
            self.state.last_centered_facility_id = Some(detail.id.clone());
            if let Some(point) = detail.point() {
                widget.set_view(point, Some(self.defaults.details_zoom));
            }
            return;
        }

        if self.state.last_centered_facility_id.as_deref() == Some(detail.id.as_str()) {
            return;
        }
        self.state.last_centered_facility_id = Some(detail.id.clone());

        let Some(point) = detail.point() else {
            return;
        };
        let Some(bounds) = widget.bounds() else {
            return;
        };
        if !bounds.contains(point) {
            widget.set_view(point, None);
        }
    }

    /// Cluster marker clicked at `at`. Only acts when the map cannot zoom
    /// further to expand the cluster. Returns whether a popup is now open.
    pub fn on_cluster_click(
        &mut self,
        at: LatLng,
        zoom: f64,
        max_zoom: f64,
        facilities: Option<&FacilityCollection>,
    ) -> bool {
        if zoom < max_zoom {
            return false;
        }
        let candidates = facilities
            .map(|collection| collection.co_located(at))
            .unwrap_or_default();
        self.state.disambiguation_candidates = (!candidates.is_empty()).then_some(candidates);
        self.state.disambiguation_candidates.is_some()
    }

    /// A facility was picked from the popup. Returns the identifier to navigate to.
    pub fn select_candidate(&mut self, id: &str) -> Option<String> {
        let found = self
            .candidates()?
            .iter()
            .any(|facility| facility.id == id);
        self.close_popup();
        found.then(|| id.to_string())
    }

    pub fn close_popup(&mut self) {
        self.state.disambiguation_candidates = None;
    }

    /// Edge-triggered: acts only when `counter` differs from the last value seen.
    /// Returns whether a reset happened.
    pub fn on_reset_counter(&mut self, counter: u64, widget: &dyn MapWidget) -> bool {
        if counter == self.state.last_seen_reset_counter {
            return false;
        }
        widget.set_view(self.defaults.center, Some(self.defaults.zoom));
        self.state.last_seen_reset_counter = counter;
        self.close_popup();
        true
    }

    /// A fresh search invalidates any open disambiguation list.
    pub fn on_fetching(&mut self, fetching: bool) {
        if fetching {
            self.close_popup();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use registry_shared::{Facility, FacilityCollection, LatLng, LatLngBounds};
    use serde_json::json;

    use super::{DefaultView, MapViewController, MapWidget};

    const DEFAULTS: DefaultView = DefaultView {
        center: LatLng::new(25.0, 0.0),
        zoom: 2.0,
        details_zoom: 15.0,
    };

    /// Records every `set_view` call and reports fixed bounds.
    struct RecordingWidget {
        bounds: Option<LatLngBounds>,
        calls: RefCell<Vec<(LatLng, Option<f64>)>>,
    }

    impl RecordingWidget {
        fn with_bounds(south: f64, west: f64, north: f64, east: f64) -> Self {
            Self {
                bounds: Some(LatLngBounds::new(
                    LatLng::new(south, west),
                    LatLng::new(north, east),
                )),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(LatLng, Option<f64>)> {
            self.calls.borrow().clone()
        }
    }

    impl MapWidget for RecordingWidget {
        fn set_view(&self, center: LatLng, zoom: Option<f64>) {
            self.calls.borrow_mut().push((center, zoom));
        }

        fn bounds(&self) -> Option<LatLngBounds> {
            self.bounds
        }
    }

    fn facility(id: &str, lng: f64, lat: f64) -> Facility {
        serde_json::from_value(json!({
            "id": id,
            "geometry": { "type": "Point", "coordinates": [lng, lat] },
            "properties": { "name": id }
        }))
        .unwrap()
    }

    fn facility_without_geometry(id: &str) -> Facility {
        serde_json::from_value(json!({ "id": id, "geometry": null })).unwrap()
    }

    fn collection(features: Vec<Facility>) -> FacilityCollection {
        FacilityCollection { features }
    }

    fn ready(deep_link_id: Option<&str>, reset_counter: u64) -> MapViewController {
        let mut controller = MapViewController::mount(DEFAULTS, reset_counter);
        assert!(controller.on_widget_ready(deep_link_id));
        controller
    }

    #[test]
    fn focus_before_widget_ready_is_ignored() {
        let widget = RecordingWidget::with_bounds(-10.0, -10.0, 10.0, 10.0);
        let mut controller = MapViewController::mount(DEFAULTS, 0);
        assert!(!controller.state.initial_load_handled);
        assert!(!controller.state.pending_center_on_focus);

        let a = facility("A", 90.4, 23.8);
        controller.on_focused_facility(Some(&a), &widget);
        assert!(widget.calls().is_empty());
        assert_eq!(controller.state.last_centered_facility_id, None);

        assert!(controller.on_widget_ready(Some("A")));
        assert!(controller.state.pending_center_on_focus);
        controller.on_focused_facility(Some(&a), &widget);
        assert_eq!(widget.calls(), vec![(LatLng::new(23.8, 90.4), Some(15.0))]);
    }

    #[test]
    fn initial_load_is_handled_once_per_mount() {
        let widget = RecordingWidget::with_bounds(-10.0, -10.0, 10.0, 10.0);
        let mut controller = ready(Some("A"), 0);
        controller.on_focused_facility(Some(&facility("A", 1.0, 1.0)), &widget);
        assert!(!controller.state.pending_center_on_focus);

        assert!(!controller.on_widget_ready(Some("B")));
        assert!(!controller.state.pending_center_on_focus);
    }

    #[test]
    fn deep_link_centers_once_at_details_zoom() {
        let widget = RecordingWidget::with_bounds(-10.0, -10.0, 10.0, 10.0);
        let mut controller = ready(Some("A"), 0);
        assert!(controller.state.initial_load_handled);
        assert!(controller.state.pending_center_on_focus);

        controller.on_focused_facility(None, &widget);
        assert!(widget.calls().is_empty());
        assert!(controller.state.pending_center_on_focus);

        let a = facility("A", 90.4, 23.8);
        controller.on_focused_facility(Some(&a), &widget);
        controller.on_focused_facility(Some(&a), &widget);

        assert_eq!(widget.calls(), vec![(LatLng::new(23.8, 90.4), Some(15.0))]);
        assert!(!controller.state.pending_center_on_focus);
    }

    #[test]
    fn deep_link_centers_even_when_point_is_visible() {
        let widget = RecordingWidget::with_bounds(-90.0, -180.0, 90.0, 180.0);
        let mut controller = ready(Some("A"), 0);
        controller.on_focused_facility(Some(&facility("A", 1.0, 1.0)), &widget);
        assert_eq!(widget.calls(), vec![(LatLng::new(1.0, 1.0), Some(15.0))]);
    }

    #[test]
    fn no_deep_link_means_no_pending_center() {
        let controller = ready(None, 0);
        assert!(!controller.state.pending_center_on_focus);
    }

    #[test]
    fn deep_link_without_geometry_is_a_noop() {
        let widget = RecordingWidget::with_bounds(-10.0, -10.0, 10.0, 10.0);
        let mut controller = ready(Some("A"), 0);
        controller.on_focused_facility(Some(&facility_without_geometry("A")), &widget);
        assert!(widget.calls().is_empty());
        assert!(!controller.state.pending_center_on_focus);
    }

    #[test]
    fn focus_change_inside_bounds_does_not_move_viewport() {
        let widget = RecordingWidget::with_bounds(-10.0, -10.0, 10.0, 10.0);
        let mut controller = ready(None, 0);
        controller.on_focused_facility(Some(&facility("A", 5.0, 5.0)), &widget);
        controller.on_focused_facility(Some(&facility("B", -5.0, -5.0)), &widget);
        assert!(widget.calls().is_empty());
        assert_eq!(
            controller.state.last_centered_facility_id.as_deref(),
            Some("B")
        );
    }

    #[test]
    fn focus_change_outside_bounds_pans_once_keeping_zoom() {
        let widget = RecordingWidget::with_bounds(-10.0, -10.0, 10.0, 10.0);
        let mut controller = ready(None, 0);
        let far = facility("FAR", 120.0, 40.0);
        controller.on_focused_facility(Some(&far), &widget);
        controller.on_focused_facility(Some(&far), &widget);
        assert_eq!(widget.calls(), vec![(LatLng::new(40.0, 120.0), None)]);
    }

    #[test]
    fn focus_change_without_geometry_or_bounds_is_a_noop() {
        let mut controller = ready(None, 0);

        let widget = RecordingWidget::with_bounds(-10.0, -10.0, 10.0, 10.0);
        controller.on_focused_facility(Some(&facility_without_geometry("A")), &widget);
        assert!(widget.calls().is_empty());

        let blind = RecordingWidget {
            bounds: None,
            calls: RefCell::new(Vec::new()),
        };
        controller.on_focused_facility(Some(&facility("B", 120.0, 40.0)), &blind);
        assert!(blind.calls().is_empty());
    }

    #[test]
    fn after_deep_link_the_same_facility_is_not_followed_again() {
        let widget = RecordingWidget::with_bounds(-1.0, -1.0, 1.0, 1.0);
        let mut controller = ready(Some("A"), 0);
        let a = facility("A", 50.0, 50.0);
        controller.on_focused_facility(Some(&a), &widget);
        controller.on_focused_facility(Some(&a), &widget);
        assert_eq!(widget.calls().len(), 1);

        controller.on_focused_facility(Some(&facility("B", 60.0, 60.0)), &widget);
        assert_eq!(widget.calls().len(), 2);
        assert_eq!(widget.calls()[1], (LatLng::new(60.0, 60.0), None));
    }

    #[test]
    fn cluster_click_at_max_zoom_collects_co_located_facilities() {
        let data = collection(vec![
            facility("P", 90.4125, 23.8103),
            facility("P2", 90.4125003, 23.8103),
            facility("FAR", 90.4135, 23.8103),
            facility_without_geometry("NONE"),
        ]);
        let mut controller = ready(None, 0);

        let opened =
            controller.on_cluster_click(LatLng::new(23.8103, 90.4125), 18.0, 18.0, Some(&data));
        assert!(opened);

        let ids: Vec<&str> = controller
            .candidates()
            .unwrap()
            .iter()
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(ids, vec!["P", "P2"]);
        assert_eq!(controller.popup_anchor(), Some(LatLng::new(23.8103, 90.4125)));
    }

    #[test]
    fn cluster_click_below_max_zoom_is_ignored() {
        let data = collection(vec![facility("P", 1.0, 1.0), facility("Q", 1.0, 1.0)]);
        let mut controller = ready(None, 0);
        assert!(!controller.on_cluster_click(LatLng::new(1.0, 1.0), 12.0, 18.0, Some(&data)));
        assert!(controller.candidates().is_none());
    }

    #[test]
    fn cluster_click_with_no_match_leaves_popup_closed() {
        let data = collection(vec![facility("P", 1.0, 1.0)]);
        let mut controller = ready(None, 0);
        assert!(!controller.on_cluster_click(LatLng::new(5.0, 5.0), 18.0, 18.0, Some(&data)));
        assert!(!controller.on_cluster_click(LatLng::new(1.0, 1.0), 18.0, 18.0, None));
        assert!(controller.candidates().is_none());
    }

    #[test]
    fn selecting_or_closing_clears_candidates() {
        let data = collection(vec![facility("P", 1.0, 1.0), facility("Q", 1.0, 1.0)]);
        let mut controller = ready(None, 0);

        controller.on_cluster_click(LatLng::new(1.0, 1.0), 18.0, 18.0, Some(&data));
        assert_eq!(controller.select_candidate("Q"), Some("Q".to_string()));
        assert!(controller.candidates().is_none());

        controller.on_cluster_click(LatLng::new(1.0, 1.0), 18.0, 18.0, Some(&data));
        assert_eq!(controller.select_candidate("missing"), None);
        assert!(controller.candidates().is_none());

        controller.on_cluster_click(LatLng::new(1.0, 1.0), 18.0, 18.0, Some(&data));
        controller.close_popup();
        assert!(controller.candidates().is_none());
    }

    #[test]
    fn reset_counter_change_snaps_to_default_and_clears_popup() {
        let widget = RecordingWidget::with_bounds(-10.0, -10.0, 10.0, 10.0);
        let data = collection(vec![facility("P", 1.0, 1.0), facility("Q", 1.0, 1.0)]);
        let mut controller = ready(None, 4);

        assert!(!controller.on_reset_counter(4, &widget));
        assert!(widget.calls().is_empty());

        controller.on_cluster_click(LatLng::new(1.0, 1.0), 18.0, 18.0, Some(&data));
        assert!(controller.on_reset_counter(5, &widget));
        assert_eq!(widget.calls(), vec![(LatLng::new(25.0, 0.0), Some(2.0))]);
        assert!(controller.candidates().is_none());
        assert_eq!(controller.state.last_seen_reset_counter, 5);

        assert!(!controller.on_reset_counter(5, &widget));
        assert!(controller.on_reset_counter(6, &widget));
        assert_eq!(widget.calls().len(), 2);
    }

    #[test]
    fn fetch_start_clears_open_popup() {
        let data = collection(vec![facility("P", 1.0, 1.0), facility("Q", 1.0, 1.0)]);
        let mut controller = ready(None, 0);
        controller.on_cluster_click(LatLng::new(1.0, 1.0), 18.0, 18.0, Some(&data));

        controller.on_fetching(false);
        assert_eq!(controller.candidates().map(<[_]>::len), Some(2));

        controller.on_fetching(true);
        assert!(controller.candidates().is_none());
    }
}
