//! Map-side state: the overlay scene, marker/info-window registry, current
//! selection and the published search results.
//!
//! Everything lives in one `MapState` behind a mutex. Orchestrators mutate it
//! in short critical sections that never span an external call, so readers
//! only ever see fully published states.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::{Article, LatLng, Location, Query, RouteMode, RouteResult, WeatherSnapshot};

pub mod overlay;
pub mod selection;

pub use overlay::{ClickOutcome, InfoContent, InfoWindow, Marker, MarkerSpec, OverlayRegistry, PolylineSlot};
pub use selection::SelectionState;

/// Handle to an overlay attached to (or detached from) the map
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct OverlayId(pub u64);

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    Marker,
    InfoWindow,
    Polyline,
}

/// What is currently drawn on the map
#[derive(Debug)]
pub struct MapScene {
    next_id: u64,
    attached: BTreeMap<OverlayId, OverlayKind>,
    center: LatLng,
    zoom: u8,
}

impl MapScene {
    #[must_use]
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self {
            next_id: 1,
            attached: BTreeMap::new(),
            center,
            zoom,
        }
    }

    /// Reserve a fresh overlay id
    pub fn allocate(&mut self) -> OverlayId {
        let id = OverlayId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn attach(&mut self, id: OverlayId, kind: OverlayKind) {
        self.attached.insert(id, kind);
    }

    /// Remove an overlay from the map. Returns false if it was not attached.
    pub fn detach(&mut self, id: OverlayId) -> bool {
        self.attached.remove(&id).is_some()
    }

    #[must_use]
    pub fn is_attached(&self, id: OverlayId) -> bool {
        self.attached.contains_key(&id)
    }

    #[must_use]
    pub fn count(&self, kind: OverlayKind) -> usize {
        self.attached.values().filter(|k| **k == kind).count()
    }

    pub fn attached(&self) -> impl Iterator<Item = (OverlayId, OverlayKind)> + '_ {
        self.attached.iter().map(|(id, kind)| (*id, *kind))
    }

    pub fn set_center(&mut self, center: LatLng) {
        self.center = center;
    }

    #[must_use]
    pub fn center(&self) -> LatLng {
        self.center
    }

    #[must_use]
    pub fn zoom(&self) -> u8 {
        self.zoom
    }
}

/// Notifications for the presentation layer
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapEvent {
    /// A marker's info window opened; its list entry should scroll into view
    ScrollIntoView {
        marker: OverlayId,
        article_index: usize,
    },
    InfoWindowClosed {
        marker: OverlayId,
    },
    SearchPublished {
        epoch: u64,
        markers: usize,
    },
    RouteDrawn {
        mode: RouteMode,
    },
}

/// Subscription passed to every marker when it is created
pub trait MarkerListener: Send + Sync {
    fn on_open(&self, marker: &Marker);
    fn on_close(&self, marker: &Marker);
}

impl MarkerListener for broadcast::Sender<MapEvent> {
    fn on_open(&self, marker: &Marker) {
        // No subscribers is fine: nobody is looking at the list right now
        let _ = self.send(MapEvent::ScrollIntoView {
            marker: marker.id(),
            article_index: marker.geo().article_index,
        });
    }

    fn on_close(&self, marker: &Marker) {
        let _ = self.send(MapEvent::InfoWindowClosed { marker: marker.id() });
    }
}

/// Result of reverse-geocoding a clicked map point
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PointInspection {
    pub at: LatLng,
    pub address: String,
    pub found: bool,
}

impl PointInspection {
    pub const NOT_FOUND: &'static str = "Address not found";

    /// The inspected point as a route endpoint named after its address
    #[must_use]
    pub fn as_location(&self) -> Location {
        Location::new(self.address.clone(), self.at.lat, self.at.lng)
    }
}

/// Results of the last published search epoch
#[derive(Debug, Default)]
pub struct Published {
    pub epoch: u64,
    pub query: Option<Query>,
    pub articles: Vec<Article>,
    /// Articles the backend returned that had no usable location
    pub excluded: usize,
    pub weather: Option<WeatherSnapshot>,
}

#[derive(Debug)]
pub struct MapState {
    pub scene: MapScene,
    pub overlays: OverlayRegistry,
    pub selection: SelectionState,
    pub route: PolylineSlot,
    pub published: Published,
    pub last_inspected: Option<PointInspection>,
}

impl MapState {
    #[must_use]
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self {
            scene: MapScene::new(center, zoom),
            overlays: OverlayRegistry::default(),
            selection: SelectionState::default(),
            route: PolylineSlot::default(),
            published: Published::default(),
            last_inspected: None,
        }
    }

    /// Read-only copy of everything the list and map views render
    #[must_use]
    pub fn snapshot(&self) -> MapSnapshot {
        let open = self.overlays.open_marker().map(Marker::id);
        MapSnapshot {
            epoch: self.published.epoch,
            query: self.published.query.clone(),
            center: self.scene.center(),
            zoom: self.scene.zoom(),
            articles: self.published.articles.clone(),
            excluded_articles: self.published.excluded,
            markers: self
                .overlays
                .markers()
                .iter()
                .map(|marker| MarkerView::from_marker(marker, open == Some(marker.id())))
                .collect(),
            open_info_window: self.overlays.open_marker().map(|marker| InfoWindowView {
                marker: marker.id(),
                content: marker.info().content.clone(),
            }),
            weather: self.published.weather.clone().map(WeatherView::from),
            highlighted_article: self.selection.highlighted(),
            route_start: self.selection.start().cloned(),
            route_end: self.selection.end().cloned(),
            route: self.route.result().cloned(),
            overlays: OverlayCounts {
                markers: self.scene.count(OverlayKind::Marker),
                info_windows: self.scene.count(OverlayKind::InfoWindow),
                polylines: self.scene.count(OverlayKind::Polyline),
            },
            last_inspected: self.last_inspected.clone(),
        }
    }
}

/// Overlays currently attached to the map, by kind
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlayCounts {
    pub markers: usize,
    pub info_windows: usize,
    pub polylines: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MarkerView {
    pub id: OverlayId,
    pub article_index: usize,
    pub location_index: usize,
    pub location: Location,
    pub title: String,
    pub icon: String,
    pub open: bool,
}

impl MarkerView {
    fn from_marker(marker: &Marker, open: bool) -> Self {
        let geo = marker.geo();
        Self {
            id: marker.id(),
            article_index: geo.article_index,
            location_index: geo.location_index,
            location: geo.location.clone(),
            title: marker.info().content.title.clone(),
            icon: marker.icon().to_string(),
            open,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InfoWindowView {
    pub marker: OverlayId,
    pub content: InfoContent,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherView {
    #[serde(flatten)]
    pub snapshot: WeatherSnapshot,
    pub summary: String,
}

impl From<WeatherSnapshot> for WeatherView {
    fn from(snapshot: WeatherSnapshot) -> Self {
        let summary = snapshot.summary();
        Self { snapshot, summary }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MapSnapshot {
    pub epoch: u64,
    pub query: Option<Query>,
    pub center: LatLng,
    pub zoom: u8,
    pub articles: Vec<Article>,
    pub excluded_articles: usize,
    pub markers: Vec<MarkerView>,
    pub open_info_window: Option<InfoWindowView>,
    pub weather: Option<WeatherView>,
    pub highlighted_article: Option<usize>,
    pub route_start: Option<Location>,
    pub route_end: Option<Location>,
    pub route: Option<RouteResult>,
    pub overlays: OverlayCounts,
    pub last_inspected: Option<PointInspection>,
}

/// Shared, single-writer map state
#[derive(Debug, Clone)]
pub struct MapHandle(Arc<Mutex<MapState>>);

impl MapHandle {
    #[must_use]
    pub fn new(state: MapState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    /// Lock the state. A panic in another critical section leaves the state as
    /// it was at that point; keep serving it rather than poisoning every request.
    pub fn lock(&self) -> MutexGuard<'_, MapState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn snapshot(&self) -> MapSnapshot {
        self.lock().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_attach_detach() {
        let mut scene = MapScene::new(LatLng::new(37.4488, 127.1267), 15);
        let a = scene.allocate();
        let b = scene.allocate();
        assert_ne!(a, b);

        scene.attach(a, OverlayKind::Marker);
        scene.attach(b, OverlayKind::Polyline);
        assert_eq!(scene.count(OverlayKind::Marker), 1);
        assert!(scene.detach(a));
        assert!(!scene.detach(a));
        assert!(!scene.is_attached(a));
        assert!(scene.is_attached(b));
    }

    #[test]
    fn test_empty_snapshot() {
        let handle = MapHandle::new(MapState::new(LatLng::new(37.4488, 127.1267), 15));
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.epoch, 0);
        assert!(snapshot.markers.is_empty());
        assert!(snapshot.weather.is_none());
        assert!(snapshot.route.is_none());
        assert_eq!(snapshot.overlays, OverlayCounts::default());
        assert_eq!(snapshot.zoom, 15);
    }

    #[test]
    fn test_inspection_as_location() {
        let inspection = PointInspection {
            at: LatLng::new(37.45, 127.13),
            address: "경기도 성남시 수정구 복정동 65".to_string(),
            found: true,
        };
        let location = inspection.as_location();
        assert_eq!(location.name, "경기도 성남시 수정구 복정동 65");
        assert_eq!(location.coords(), LatLng::new(37.45, 127.13));
    }
}
