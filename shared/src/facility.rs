use serde::{Deserialize, Serialize};

use crate::geo::{LatLng, is_same_point};

/// A registry entry as served by the facilities API: a GeoJSON `Feature`
/// with a point geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: String,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: FacilityProperties,
}

/// Point geometry. Coordinates are kept as a raw array so that partial or
/// malformed positions deserialize and are rejected later by [`Facility::point`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FacilityProperties {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

impl Facility {
    /// Location of the facility, or `None` when the geometry is missing or incomplete.
    pub fn point(&self) -> Option<LatLng> {
        LatLng::from_position(&self.geometry.as_ref()?.coordinates)
    }

    pub fn display_name(&self) -> &str {
        self.properties
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.id)
    }
}

/// GeoJSON `FeatureCollection` of facilities, in server order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FacilityCollection {
    #[serde(default)]
    pub features: Vec<Facility>,
}

impl FacilityCollection {
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Facilities that sit on effectively the same point as `at`, in collection order.
    /// Facilities without a usable point never match.
    pub fn co_located(&self, at: LatLng) -> Vec<Facility> {
        self.features
            .iter()
            .filter(|facility| facility.point().is_some_and(|p| is_same_point(p, at)))
            .cloned()
            .collect()
    }
}
