use registry_shared::LatLng;

pub const INITIAL_CENTER: LatLng = LatLng::new(25.0, 0.0);
pub const INITIAL_ZOOM: f64 = 2.0;
pub const MINIMUM_ZOOM: f64 = 2.0;
pub const DETAILS_ZOOM_LEVEL: f64 = 15.0;

/// World extent the map may not be panned beyond: (south, west, north, east).
pub const MAX_BOUNDS: (f64, f64, f64, f64) = (-90.0, -180.0, 90.0, 180.0);

pub const DEFAULT_COUNTRY_CODE: &str = "US";
pub const GOOGLE_MAPS_VERSION: &str = "3.37";

pub const SELECTED_MARKER_URL: &str = "/images/selectedmarker.png";
pub const UNSELECTED_MARKER_URL: &str = "/images/marker.png";
pub const MARKER_ICON_SIZE: (u32, u32) = (30, 40);
pub const MARKER_ICON_ANCHOR: (u32, u32) = (15, 40);

pub const APP_ROOT_ID: &str = "app";
pub const MAP_CONTAINER_ID: &str = "registry-leaflet-map";
pub const BOOTSTRAP_ELEMENT_ID: &str = "registry-bootstrap";
pub const STATE_EVENT_NAME: &str = "registry:state";
pub const NAVIGATE_EVENT_NAME: &str = "registry:navigate";

pub const TOAST_DURATION_MS: u32 = 3_000;

pub const INFO_LINK: &str = "https://info.openapparel.org";
pub const LISTS_ROUTE: &str = "/lists";
pub const AUTH_LOGIN_FORM_ROUTE: &str = "/auth/login";
pub const CONTRIBUTE_ROUTE: &str = "/contribute";
pub const FACILITIES_ROUTE: &str = "/facilities";

pub fn contribute_instructions_url() -> String {
    format!("{INFO_LINK}/resources/how-to-contribute-data-to-the-oar")
}

pub fn data_quality_url() -> String {
    format!("{INFO_LINK}/how-the-oar-improves-data-quality")
}

/// Script URL for the Google Maps JS API, localized to `region`.
/// Blank or malformed region codes fall back to [`DEFAULT_COUNTRY_CODE`].
pub fn google_maps_loader_url(api_key: &str, region: &str) -> String {
    format!(
        "https://maps.googleapis.com/maps/api/js?v={GOOGLE_MAPS_VERSION}&key={}&region={}",
        crate::route::encode_component(api_key),
        loader_region(region)
    )
}

/// Two-letter region code for the Maps loader, falling back to the default country.
pub fn loader_region(region: &str) -> String {
    let region = region.trim();
    if region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic()) {
        region.to_ascii_uppercase()
    } else {
        DEFAULT_COUNTRY_CODE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{contribute_instructions_url, loader_region};

    #[test]
    fn loader_region_normalizes_country_codes() {
        assert_eq!(loader_region("bd"), "BD");
        assert_eq!(loader_region(" gb "), "GB");
    }

    #[test]
    fn loader_region_falls_back_to_default() {
        assert_eq!(loader_region(""), "US");
        assert_eq!(loader_region("Bangladesh"), "US");
        assert_eq!(loader_region("1A"), "US");
    }

    #[test]
    fn info_links_are_absolute() {
        assert_eq!(
            contribute_instructions_url(),
            "https://info.openapparel.org/resources/how-to-contribute-data-to-the-oar"
        );
    }
}
