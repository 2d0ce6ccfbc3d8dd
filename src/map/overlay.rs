//! Marker, info window and polyline lifecycle.
//!
//! At most one info window is open at a time: opening one closes whichever
//! was open before. Disposing an overlay twice is a no-op.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{MapScene, MarkerListener, OverlayId, OverlayKind};
use crate::models::{GeoResult, LatLng, RouteResult};
use crate::video::VideoEmbed;

/// What an info window displays
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InfoContent {
    pub title: String,
    pub description: String,
    pub link: String,
    pub location_name: String,
    pub video: VideoEmbed,
}

#[derive(Debug, Clone)]
pub struct InfoWindow {
    pub id: OverlayId,
    pub content: InfoContent,
}

/// Everything needed to create one marker
#[derive(Debug, Clone)]
pub struct MarkerSpec {
    pub geo: GeoResult,
    pub icon: String,
    pub content: InfoContent,
}

pub struct Marker {
    id: OverlayId,
    geo: GeoResult,
    icon: String,
    info: InfoWindow,
    listener: Arc<dyn MarkerListener>,
    disposed: bool,
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marker")
            .field("id", &self.id)
            .field("geo", &self.geo)
            .field("icon", &self.icon)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl Marker {
    #[must_use]
    pub fn id(&self) -> OverlayId {
        self.id
    }

    #[must_use]
    pub fn geo(&self) -> &GeoResult {
        &self.geo
    }

    #[must_use]
    pub fn icon(&self) -> &str {
        &self.icon
    }

    #[must_use]
    pub fn info(&self) -> &InfoWindow {
        &self.info
    }

    #[must_use]
    pub fn position(&self) -> LatLng {
        self.geo.location.coords()
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Detach the marker and its info window from the map
    pub fn dispose(&mut self, scene: &mut MapScene) {
        if self.disposed {
            return;
        }
        scene.detach(self.info.id);
        scene.detach(self.id);
        self.disposed = true;
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClickOutcome {
    Opened { article_index: usize },
    Closed,
}

/// Markers of the current search epoch and the single open info window
#[derive(Debug, Default)]
pub struct OverlayRegistry {
    markers: Vec<Marker>,
    open: Option<OverlayId>,
}

impl OverlayRegistry {
    /// Create a marker, attach it to the map and track it for disposal.
    /// `listener` is notified whenever the marker's info window opens or closes.
    pub fn add(
        &mut self,
        scene: &mut MapScene,
        spec: MarkerSpec,
        listener: Arc<dyn MarkerListener>,
    ) -> OverlayId {
        let id = scene.allocate();
        let info_id = scene.allocate();
        scene.attach(id, OverlayKind::Marker);
        self.markers.push(Marker {
            id,
            geo: spec.geo,
            icon: spec.icon,
            info: InfoWindow {
                id: info_id,
                content: spec.content,
            },
            listener,
            disposed: false,
        });
        id
    }

    /// Dispose every tracked marker and the open info window.
    /// The route polyline is not tracked here and stays on the map.
    pub fn clear(&mut self, scene: &mut MapScene) {
        self.open = None;
        for marker in &mut self.markers {
            marker.dispose(scene);
        }
        self.markers.clear();
    }

    /// Handle a click on marker `id`: toggles its info window, closing any
    /// other open window first. Returns `None` for unknown markers.
    pub fn click(&mut self, scene: &mut MapScene, id: OverlayId) -> Option<ClickOutcome> {
        let position = self.position_of(id)?;

        if self.open == Some(id) {
            self.close_info_window(scene);
            return Some(ClickOutcome::Closed);
        }

        self.close_info_window(scene);
        let marker = &self.markers[position];
        scene.attach(marker.info.id, OverlayKind::InfoWindow);
        self.open = Some(id);
        marker.listener.on_open(marker);
        Some(ClickOutcome::Opened {
            article_index: marker.geo.article_index,
        })
    }

    /// Close the open info window, if any. Returns whether one was open.
    pub fn close_info_window(&mut self, scene: &mut MapScene) -> bool {
        let Some(open) = self.open.take() else {
            return false;
        };
        if let Some(marker) = self.markers.iter().find(|m| m.id == open) {
            scene.detach(marker.info.id);
            marker.listener.on_close(marker);
        }
        true
    }

    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    #[must_use]
    pub fn marker(&self, id: OverlayId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    #[must_use]
    pub fn open_marker(&self) -> Option<&Marker> {
        self.open.and_then(|id| self.marker(id))
    }

    /// First marker belonging to the article at `article_index`
    #[must_use]
    pub fn first_marker_of(&self, article_index: usize) -> Option<&Marker> {
        self.markers
            .iter()
            .find(|m| m.geo.article_index == article_index)
    }

    fn position_of(&self, id: OverlayId) -> Option<usize> {
        self.markers.iter().position(|m| m.id == id && !m.disposed)
    }
}

/// The single route polyline and the route it draws
#[derive(Debug, Default)]
pub struct PolylineSlot {
    polyline: Option<OverlayId>,
    result: Option<RouteResult>,
}

impl PolylineSlot {
    /// Dispose the current polyline, then draw `route` in its place
    pub fn replace(&mut self, scene: &mut MapScene, route: RouteResult) -> OverlayId {
        self.dispose(scene);
        let id = scene.allocate();
        scene.attach(id, OverlayKind::Polyline);
        self.polyline = Some(id);
        self.result = Some(route);
        id
    }

    pub fn dispose(&mut self, scene: &mut MapScene) {
        if let Some(id) = self.polyline.take() {
            scene.detach(id);
        }
        self.result = None;
    }

    #[must_use]
    pub fn result(&self) -> Option<&RouteResult> {
        self.result.as_ref()
    }
}
