//! Route planning between two endpoints and the single route polyline

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::controller::Services;
use crate::map::{MapEvent, MapHandle};
use crate::models::{RouteEndpoint, RouteMode, RouteResult};
use crate::routing::RouteProvider;
use crate::{NewsMapError, Result};

pub struct RouteOrchestrator {
    transit: Arc<dyn RouteProvider>,
    driving: Arc<dyn RouteProvider>,
    map: MapHandle,
    events: broadcast::Sender<MapEvent>,
    generation: AtomicU64,
}

impl RouteOrchestrator {
    pub fn new(services: &Services, map: MapHandle, events: broadcast::Sender<MapEvent>) -> Self {
        Self {
            transit: services.transit.clone(),
            driving: services.driving.clone(),
            map,
            events,
            generation: AtomicU64::new(0),
        }
    }

    fn provider(&self, mode: RouteMode) -> &dyn RouteProvider {
        match mode {
            RouteMode::Transit => &*self.transit,
            RouteMode::Driving => &*self.driving,
        }
    }

    /// Request a route and draw it in place of the current one.
    ///
    /// On provider failure the previously drawn route stays on the map. A
    /// response that arrives after a newer plan was requested is discarded.
    #[instrument(skip(self, start, end))]
    pub async fn plan_route(
        &self,
        start: Option<RouteEndpoint>,
        end: Option<RouteEndpoint>,
        mode: RouteMode,
    ) -> Result<RouteResult> {
        let Some(start) = start else {
            return Err(NewsMapError::validation("Please choose a starting point"));
        };
        let Some(end) = end else {
            return Err(NewsMapError::validation("Please choose a destination"));
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Planning {:?} route from '{}' to '{}'", mode, start.name, end.name);

        let route = self
            .provider(mode)
            .route(&start, &end)
            .await
            .map_err(|e| {
                warn!("Route provider failed: {e:#}");
                NewsMapError::route(format!("{e:#}"))
            })?;

        {
            let mut guard = self.map.lock();
            let latest = self.generation.load(Ordering::SeqCst);
            if latest != generation {
                debug!("Route plan {} superseded by {}", generation, latest);
                return Err(NewsMapError::stale(format!(
                    "route plan {generation} superseded by route plan {latest}"
                )));
            }
            let state = &mut *guard;
            state.route.replace(&mut state.scene, route.clone());
        }

        let _ = self.events.send(MapEvent::RouteDrawn { mode });
        info!(
            "Route drawn: {}, {}, {} steps",
            route.summary.format_distance(),
            route.summary.format_duration(),
            route.steps.len()
        );
        Ok(route)
    }

    /// Plan between the endpoints currently held by the selection
    pub async fn plan_selected_route(&self, mode: RouteMode) -> Result<RouteResult> {
        let (start, end) = {
            let state = self.map.lock();
            (
                state.selection.start().cloned(),
                state.selection.end().cloned(),
            )
        };
        self.plan_route(start, end, mode).await
    }
}
