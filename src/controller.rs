//! The `NewsMap` controller: one search orchestrator, one route orchestrator
//! and the interactions around them (marker clicks, list focus, endpoint
//! selection, map-point inspection, topic search).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::cache::Cache;
use crate::config::NewsMapConfig;
use crate::geocoding::{Geocoder, NaverGeocoder};
use crate::map::{ClickOutcome, MapEvent, MapHandle, MapSnapshot, MapState, OverlayId, PointInspection};
use crate::models::{LatLng, Query, RouteEndpoint, RouteMode, RouteResult};
use crate::news::{NewsBackendClient, NewsSearch};
use crate::route_planner::RouteOrchestrator;
use crate::routing::{DrivingClient, RouteProvider, TransitClient};
use crate::search::{SearchOrchestrator, SearchOutcome};
use crate::topic::{self, SentimentReport, TopicSearch};
use crate::video::{VideoSearch, YoutubeClient};
use crate::weather::{WeatherBackendClient, WeatherProvider};
use crate::{NewsMapError, Result};

const EVENT_CAPACITY: usize = 64;

/// The external collaborators, one per adapter
#[derive(Clone)]
pub struct Services {
    pub news: Arc<dyn NewsSearch>,
    pub topics: Arc<dyn TopicSearch>,
    pub geocoder: Arc<dyn Geocoder>,
    pub weather: Arc<dyn WeatherProvider>,
    pub video: Arc<dyn VideoSearch>,
    pub transit: Arc<dyn RouteProvider>,
    pub driving: Arc<dyn RouteProvider>,
}

impl Services {
    /// Build the HTTP adapters sharing one client
    pub fn from_config(config: &NewsMapConfig, cache: Option<Cache>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.http.timeout_seconds)))
            .user_agent(concat!("NewsMap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NewsMapError::api(format!("Failed to create HTTP client: {e}")))?;

        let news = Arc::new(NewsBackendClient::new(client.clone(), &config.news.base_url));
        let routing = &config.routing;

        Ok(Self {
            news: news.clone(),
            topics: news,
            geocoder: Arc::new(NaverGeocoder::new(
                client.clone(),
                config.naver.clone(),
                cache.clone(),
            )),
            weather: Arc::new(WeatherBackendClient::new(
                client.clone(),
                &config.weather.base_url,
            )),
            video: Arc::new(YoutubeClient::new(
                client.clone(),
                config.youtube.clone(),
                cache,
            )),
            transit: Arc::new(TransitClient::new(
                client.clone(),
                &routing.transit_url,
                routing.transit_api_key.clone(),
            )),
            driving: Arc::new(DrivingClient::new(
                client,
                &routing.driving_url,
                routing.driving_api_key.clone(),
            )),
        })
    }
}

/// Map defaults and marker presentation
#[derive(Debug, Clone)]
pub struct MapSettings {
    pub default_center: LatLng,
    pub default_zoom: u8,
    pub palette: Vec<String>,
    /// Length of the truncated-title video query
    pub video_title_chars: usize,
}

impl MapSettings {
    #[must_use]
    pub fn from_config(config: &NewsMapConfig) -> Self {
        Self {
            default_center: config.map.default_center,
            default_zoom: config.map.default_zoom,
            palette: config.map.palette.clone(),
            video_title_chars: config.youtube.truncated_title_chars,
        }
    }
}

impl Default for MapSettings {
    fn default() -> Self {
        Self::from_config(&NewsMapConfig::default())
    }
}

pub struct NewsMap {
    map: MapHandle,
    search: SearchOrchestrator,
    routes: RouteOrchestrator,
    topics: Arc<dyn TopicSearch>,
    geocoder: Arc<dyn Geocoder>,
    events: broadcast::Sender<MapEvent>,
    inspection: AtomicU64,
}

impl NewsMap {
    #[must_use]
    pub fn new(services: Services, settings: MapSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let map = MapHandle::new(MapState::new(
            settings.default_center,
            settings.default_zoom,
        ));

        Self {
            search: SearchOrchestrator::new(&services, map.clone(), settings, events.clone()),
            routes: RouteOrchestrator::new(&services, map.clone(), events.clone()),
            topics: services.topics,
            geocoder: services.geocoder,
            map,
            events,
            inspection: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &NewsMapConfig, cache: Option<Cache>) -> Result<Self> {
        let services = Services::from_config(config, cache)?;
        Ok(Self::new(services, MapSettings::from_config(config)))
    }

    /// Run a region + category search and publish its results
    pub async fn search(&self, query: &Query) -> Result<SearchOutcome> {
        self.search.search(query).await
    }

    /// Toggle the info window of marker `id`, keeping the list highlight in step
    #[instrument(skip(self))]
    pub fn click_marker(&self, id: OverlayId) -> Result<ClickOutcome> {
        let mut guard = self.map.lock();
        let state = &mut *guard;
        let outcome = state
            .overlays
            .click(&mut state.scene, id)
            .ok_or_else(|| NewsMapError::validation(format!("Unknown marker {}", id.0)))?;

        match outcome {
            ClickOutcome::Opened { article_index } => state.selection.select(article_index),
            ClickOutcome::Closed => state.selection.deselect(),
        }
        debug!("Marker {} -> {:?}", id.0, outcome);
        Ok(outcome)
    }

    /// Open the first marker of the article at `index` and pan to it
    #[instrument(skip(self))]
    pub fn focus_article(&self, index: usize) -> Result<OverlayId> {
        let mut guard = self.map.lock();
        let state = &mut *guard;
        let (id, position) = state
            .overlays
            .first_marker_of(index)
            .map(|marker| (marker.id(), marker.position()))
            .ok_or_else(|| NewsMapError::validation(format!("No marker for article {index}")))?;

        let already_open = state.overlays.open_marker().map(|m| m.id()) == Some(id);
        if !already_open {
            state.overlays.click(&mut state.scene, id);
        }
        state.scene.set_center(position);
        state.selection.select(index);
        Ok(id)
    }

    pub fn set_start(&self, endpoint: RouteEndpoint) {
        debug!("Route start set to '{}'", endpoint.name);
        self.map.lock().selection.set_start(endpoint);
    }

    pub fn set_end(&self, endpoint: RouteEndpoint) {
        debug!("Route end set to '{}'", endpoint.name);
        self.map.lock().selection.set_end(endpoint);
    }

    /// Plan a route between the selected start and end
    pub async fn plan_route(&self, mode: RouteMode) -> Result<RouteResult> {
        self.routes.plan_selected_route(mode).await
    }

    /// Plan a route between explicit endpoints
    pub async fn plan_route_between(
        &self,
        start: Option<RouteEndpoint>,
        end: Option<RouteEndpoint>,
        mode: RouteMode,
    ) -> Result<RouteResult> {
        self.routes.plan_route(start, end, mode).await
    }

    pub async fn topic_search(&self, topic: &str) -> Result<SentimentReport> {
        topic::search_topic(&*self.topics, topic).await
    }

    /// Reverse-geocode a clicked map point and remember it as the last
    /// inspected point. Lookup failures report the not-found sentinel.
    #[instrument(skip(self))]
    pub async fn inspect_point(&self, at: LatLng) -> PointInspection {
        let ticket = self.inspection.fetch_add(1, Ordering::SeqCst) + 1;

        let address = match self.geocoder.reverse_geocode(at).await {
            Ok(address) => address,
            Err(e) => {
                warn!("Reverse geocoding failed: {e:#}");
                None
            }
        };
        let inspection = PointInspection {
            at,
            found: address.is_some(),
            address: address.unwrap_or_else(|| PointInspection::NOT_FOUND.to_string()),
        };
        info!("Inspected point: {}", inspection.address);

        let mut state = self.map.lock();
        if self.inspection.load(Ordering::SeqCst) == ticket {
            state.last_inspected = Some(inspection.clone());
        }
        inspection
    }

    /// Use the last inspected map point as the route start
    pub fn start_from_inspected(&self) -> Result<()> {
        let mut state = self.map.lock();
        let location = Self::inspected_location(state.last_inspected.as_ref())?;
        state.selection.set_start(location);
        Ok(())
    }

    /// Use the last inspected map point as the route end
    pub fn end_at_inspected(&self) -> Result<()> {
        let mut state = self.map.lock();
        let location = Self::inspected_location(state.last_inspected.as_ref())?;
        state.selection.set_end(location);
        Ok(())
    }

    fn inspected_location(inspection: Option<&PointInspection>) -> Result<RouteEndpoint> {
        inspection
            .map(PointInspection::as_location)
            .ok_or_else(|| NewsMapError::validation("Click a point on the map first"))
    }

    #[must_use]
    pub fn snapshot(&self) -> MapSnapshot {
        self.map.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MapEvent> {
        self.events.subscribe()
    }

    /// Epoch of the most recently started search
    #[must_use]
    pub fn current_epoch(&self) -> u64 {
        self.search.current_epoch()
    }
}
