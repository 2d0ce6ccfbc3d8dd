//! Planned routes, their summaries and per-step descriptions

use serde::{Deserialize, Serialize};

use super::location::LatLng;

/// Which routing provider to ask
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    #[default]
    Transit,
    Driving,
}

/// Transport used by one step. Only affects how the step is displayed.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Walk,
    Subway,
    Bus,
    Other,
}

impl StepKind {
    /// Classify a step from the provider's travel mode and vehicle type
    #[must_use]
    pub fn classify(travel_mode: &str, vehicle_type: Option<&str>) -> Self {
        if travel_mode.eq_ignore_ascii_case("walking") {
            return StepKind::Walk;
        }
        match vehicle_type.map(str::to_ascii_uppercase).as_deref() {
            Some("SUBWAY" | "METRO_RAIL" | "HEAVY_RAIL" | "RAIL" | "COMMUTER_TRAIN") => {
                StepKind::Subway
            }
            Some("BUS" | "INTERCITY_BUS" | "TROLLEYBUS") => StepKind::Bus,
            _ => StepKind::Other,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RouteStep {
    pub kind: StepKind,
    pub instruction: String,
    /// Line name or number for transit steps
    pub line: Option<String>,
    pub distance_meters: Option<u64>,
    pub duration_seconds: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RouteSummary {
    pub distance_meters: u64,
    pub duration_seconds: u64,
}

impl RouteSummary {
    #[must_use]
    pub fn format_distance(&self) -> String {
        if self.distance_meters >= 1000 {
            format!("{:.1} km", self.distance_meters as f64 / 1000.0)
        } else {
            format!("{} m", self.distance_meters)
        }
    }

    #[must_use]
    pub fn format_duration(&self) -> String {
        let minutes = (self.duration_seconds + 59) / 60;
        if minutes >= 60 {
            format!("{}h {}min", minutes / 60, minutes % 60)
        } else {
            format!("{minutes} min")
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RouteResult {
    pub mode: RouteMode,
    pub path: Vec<LatLng>,
    pub summary: RouteSummary,
    pub steps: Vec<RouteStep>,
}

/// Total length of a path in meters
#[must_use]
pub fn path_length_meters(path: &[LatLng]) -> f64 {
    path.windows(2)
        .map(|pair| pair[0].distance_meters(&pair[1]))
        .sum()
}
