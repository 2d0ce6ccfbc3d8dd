//! Location model for geographic coordinates and named places

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

/// A bare coordinate pair in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in meters
    #[must_use]
    pub fn distance_meters(&self, other: &LatLng) -> f64 {
        let from = HaversineLocation {
            latitude: self.lat,
            longitude: self.lng,
        };
        let to = HaversineLocation {
            latitude: other.lat,
            longitude: other.lng,
        };
        distance(from, to, Units::Kilometers) * 1000.0
    }

    /// `"lat,lng"` as expected by the weather backend
    #[must_use]
    pub fn to_lat_lng_param(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }

    /// `"lng,lat"` as expected by the driving router and the reverse geocoder
    #[must_use]
    pub fn to_lng_lat_param(&self) -> String {
        format!("{},{}", self.lng, self.lat)
    }
}

/// A named place with resolved coordinates.
///
/// Identity is structural: two locations with the same name and coordinates
/// are the same location.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

/// A route start or end point
pub type RouteEndpoint = Location;

impl Location {
    #[must_use]
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
        }
    }

    #[must_use]
    pub fn coords(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}
