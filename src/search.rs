//! Region + category search: news, weather, geocoding and video enrichment
//! merged into one published map state.
//!
//! Each call starts a new epoch. Results are published only if no newer
//! search has started in the meantime; a superseded search returns
//! `NewsMapError::Stale` and leaves the map untouched.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use futures::future::join_all;
use futures::join;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::controller::{MapSettings, Services};
use crate::geocoding::Geocoder;
use crate::map::{InfoContent, MapEvent, MapHandle, MarkerListener, MarkerSpec, MarkerView, Published};
use crate::models::{Article, GeoResult, Location, NewsItem, Place, Query, WeatherSnapshot};
use crate::news::NewsSearch;
use crate::video::{self, VideoEmbed, VideoQueryChain, VideoSearch};
use crate::weather::{self, WeatherProvider};
use crate::{NewsMapError, Result};

/// What a successful search published
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchOutcome {
    pub epoch: u64,
    pub articles: Vec<Article>,
    pub markers: Vec<MarkerView>,
    pub excluded_articles: usize,
    pub weather: Option<WeatherSnapshot>,
}

pub struct SearchOrchestrator {
    news: Arc<dyn NewsSearch>,
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherProvider>,
    video: Arc<dyn VideoSearch>,
    map: MapHandle,
    settings: MapSettings,
    listener: Arc<dyn MarkerListener>,
    events: broadcast::Sender<MapEvent>,
    epoch: AtomicU64,
}

impl SearchOrchestrator {
    pub fn new(
        services: &Services,
        map: MapHandle,
        settings: MapSettings,
        events: broadcast::Sender<MapEvent>,
    ) -> Self {
        Self {
            news: services.news.clone(),
            geocoder: services.geocoder.clone(),
            weather: services.weather.clone(),
            video: services.video.clone(),
            map,
            settings,
            listener: Arc::new(events.clone()),
            events,
            epoch: AtomicU64::new(0),
        }
    }

    /// Epoch of the most recently started search
    #[must_use]
    pub fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    #[instrument(skip(self), fields(region = %query.region, category = %query.category))]
    pub async fn search(&self, query: &Query) -> Result<SearchOutcome> {
        let query = query.validated()?;
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let start_time = Instant::now();
        info!("Starting search epoch {}", epoch);

        let (weather, news) = join!(
            weather::region_weather(&*self.geocoder, &*self.weather, &query.region),
            self.news.search(&query.region, &query.category)
        );
        let items = news.map_err(|e| {
            warn!("News search failed: {e:#}");
            NewsMapError::search(format!("{e:#}"))
        })?;
        self.ensure_current(epoch)?;

        let total = items.len();
        let articles = self.resolve_articles(items).await;
        let excluded = total - articles.len();
        if excluded > 0 {
            info!("{} of {} articles had no usable location", excluded, total);
        }

        let pairs = GeoResult::pairs(&articles);
        let videos = join_all(pairs.iter().map(|pair| {
            let chain = VideoQueryChain::new(
                &articles[pair.article_index].title,
                &pair.location.name,
                &query.category,
                self.settings.video_title_chars,
            );
            video::find_video(&*self.video, chain)
        }))
        .await;

        let outcome = {
            let mut guard = self.map.lock();
            self.ensure_current(epoch)?;
            let state = &mut *guard;

            state.overlays.clear(&mut state.scene);
            state.scene.set_center(
                articles
                    .first()
                    .and_then(|article| article.locations.first())
                    .map_or(self.settings.default_center, Location::coords),
            );
            for (pair, video) in pairs.into_iter().zip(videos) {
                let spec = self.marker_spec(&articles, pair, video);
                state.overlays.add(&mut state.scene, spec, self.listener.clone());
            }
            state.selection.deselect();
            state.published = Published {
                epoch,
                query: Some(query),
                articles,
                excluded,
                weather,
            };

            let snapshot = state.snapshot();
            SearchOutcome {
                epoch,
                articles: snapshot.articles,
                markers: snapshot.markers,
                excluded_articles: excluded,
                weather: state.published.weather.clone(),
            }
        };

        let _ = self.events.send(MapEvent::SearchPublished {
            epoch,
            markers: outcome.markers.len(),
        });
        info!(
            "Published {} articles with {} markers in {:.3}s",
            outcome.articles.len(),
            outcome.markers.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(outcome)
    }

    fn ensure_current(&self, epoch: u64) -> Result<()> {
        let latest = self.epoch.load(Ordering::SeqCst);
        if latest != epoch {
            debug!("Search epoch {} superseded by {}", epoch, latest);
            return Err(NewsMapError::stale(format!(
                "search {epoch} superseded by search {latest}"
            )));
        }
        Ok(())
    }

    fn marker_spec(&self, articles: &[Article], geo: GeoResult, video: VideoEmbed) -> MarkerSpec {
        let article = &articles[geo.article_index];
        let palette = &self.settings.palette;
        let icon = palette
            .get(geo.palette_slot(palette.len()))
            .cloned()
            .unwrap_or_default();
        MarkerSpec {
            icon,
            content: InfoContent {
                title: article.title.clone(),
                description: article.description.clone(),
                link: article.link.clone(),
                location_name: geo.location.name.clone(),
                video,
            },
            geo,
        }
    }

    /// Geocode every place that arrived without coordinates and keep only
    /// the articles left with at least one location
    async fn resolve_articles(&self, items: Vec<NewsItem>) -> Vec<Article> {
        let resolved = join_all(items.iter().map(|item| {
            join_all(item.locations.iter().map(|place| self.resolve_place(place)))
        }))
        .await;

        items
            .into_iter()
            .zip(resolved)
            .map(|(item, locations)| {
                Article::from_item(item, locations.into_iter().flatten().collect())
            })
            .filter(Article::is_mappable)
            .collect()
    }

    async fn resolve_place(&self, place: &Place) -> Option<Location> {
        if let Some(location) = place.resolved() {
            return Some(location);
        }
        if place.name.trim().is_empty() {
            return None;
        }
        match self.geocoder.geocode(&place.name).await {
            Ok(Some(at)) => Some(place.resolve_with(at)),
            Ok(None) => {
                debug!("No coordinates for '{}', dropping it", place.name);
                None
            }
            Err(e) => {
                warn!("Geocoding '{}' failed, dropping it: {e:#}", place.name);
                None
            }
        }
    }
}
