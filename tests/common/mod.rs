//! In-process adapters for driving `NewsMap` without any network
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::sync::Notify;

use newsmap::geocoding::Geocoder;
use newsmap::models::{NewsItem, Place, RouteSummary};
use newsmap::news::NewsSearch;
use newsmap::routing::RouteProvider;
use newsmap::topic::{TopicItem, TopicSearch};
use newsmap::video::VideoSearch;
use newsmap::weather::WeatherProvider;
use newsmap::{LatLng, Location, MapSettings, NewsMap, RouteMode, RouteResult, Services, WeatherSnapshot};

#[derive(Default)]
pub struct MockNews {
    pub by_region: Mutex<HashMap<String, Vec<NewsItem>>>,
    /// Regions whose search blocks until the gate is notified
    pub gates: Mutex<HashMap<String, Arc<Notify>>>,
    pub fail: Mutex<bool>,
    pub calls: AtomicUsize,
}

impl MockNews {
    pub fn respond(&self, region: &str, items: Vec<NewsItem>) {
        self.by_region
            .lock()
            .unwrap()
            .insert(region.to_string(), items);
    }

    pub fn gate(&self, region: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(region.to_string(), gate.clone());
        gate
    }
}

#[async_trait]
impl NewsSearch for MockNews {
    async fn search(&self, region: &str, _category: &str) -> Result<Vec<NewsItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().get(region).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if *self.fail.lock().unwrap() {
            return Err(anyhow!("news backend unavailable"));
        }
        Ok(self
            .by_region
            .lock()
            .unwrap()
            .get(region)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MockGeocoder {
    pub places: Mutex<HashMap<String, LatLng>>,
    pub addresses: Mutex<HashMap<String, String>>,
    pub fail_reverse: Mutex<bool>,
    pub calls: AtomicUsize,
}

impl MockGeocoder {
    pub fn knows(&self, name: &str, at: LatLng) {
        self.places.lock().unwrap().insert(name.to_string(), at);
    }

    pub fn address(&self, at: LatLng, address: &str) {
        self.addresses
            .lock()
            .unwrap()
            .insert(at.to_lat_lng_param(), address.to_string());
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<LatLng>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.places.lock().unwrap().get(query).copied())
    }

    async fn reverse_geocode(&self, at: LatLng) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_reverse.lock().unwrap() {
            return Err(anyhow!("reverse geocoding quota exceeded"));
        }
        Ok(self
            .addresses
            .lock()
            .unwrap()
            .get(&at.to_lat_lng_param())
            .cloned())
    }
}

#[derive(Default)]
pub struct MockWeather {
    pub snapshot: Mutex<Option<WeatherSnapshot>>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl WeatherProvider for MockWeather {
    async fn current(&self, _at: LatLng) -> Result<WeatherSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("weather backend unavailable"))
    }
}

#[derive(Default)]
pub struct MockVideo {
    pub answers: Mutex<HashMap<String, String>>,
    pub asked: Mutex<Vec<String>>,
}

impl MockVideo {
    pub fn answer(&self, query: &str, video_id: &str) {
        self.answers
            .lock()
            .unwrap()
            .insert(query.to_string(), video_id.to_string());
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoSearch for MockVideo {
    async fn first_video(&self, query: &str) -> Result<Option<String>> {
        self.asked.lock().unwrap().push(query.to_string());
        Ok(self.answers.lock().unwrap().get(query).cloned())
    }
}

#[derive(Default)]
pub struct MockRoute {
    pub responses: Mutex<VecDeque<Result<RouteResult>>>,
    /// Consumed by the next call, which then blocks until notified
    pub gate: Mutex<Option<Arc<Notify>>>,
    /// (start, end) names of every request
    pub requests: Mutex<Vec<(String, String)>>,
    pub calls: AtomicUsize,
}

impl MockRoute {
    pub fn push(&self, response: Result<RouteResult>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn gate_next(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl RouteProvider for MockRoute {
    async fn route(&self, start: &Location, end: &Location) -> Result<RouteResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((start.name.clone(), end.name.clone()));
        let gate = self.gate.lock().unwrap().take();
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no route scripted")));
        if let Some(gate) = gate {
            gate.notified().await;
        }
        response
    }
}

#[derive(Default)]
pub struct MockTopics {
    pub items: Mutex<Vec<TopicItem>>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl TopicSearch for MockTopics {
    async fn topic_search(&self, _topic: &str) -> Result<Vec<TopicItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.lock().unwrap().clone())
    }
}

#[derive(Default, Clone)]
pub struct Mocks {
    pub news: Arc<MockNews>,
    pub topics: Arc<MockTopics>,
    pub geocoder: Arc<MockGeocoder>,
    pub weather: Arc<MockWeather>,
    pub video: Arc<MockVideo>,
    pub transit: Arc<MockRoute>,
    pub driving: Arc<MockRoute>,
}

impl Mocks {
    pub fn services(&self) -> Services {
        Services {
            news: self.news.clone(),
            topics: self.topics.clone(),
            geocoder: self.geocoder.clone(),
            weather: self.weather.clone(),
            video: self.video.clone(),
            transit: self.transit.clone(),
            driving: self.driving.clone(),
        }
    }

    pub fn newsmap(&self) -> NewsMap {
        NewsMap::new(self.services(), settings())
    }

    /// Calls made to any adapter, video lookups included
    pub fn external_calls(&self) -> usize {
        self.news.calls.load(Ordering::SeqCst)
            + self.topics.calls.load(Ordering::SeqCst)
            + self.geocoder.calls.load(Ordering::SeqCst)
            + self.weather.calls.load(Ordering::SeqCst)
            + self.video.asked.lock().unwrap().len()
            + self.transit.calls.load(Ordering::SeqCst)
            + self.driving.calls.load(Ordering::SeqCst)
    }
}

pub fn settings() -> MapSettings {
    MapSettings {
        default_center: LatLng::new(37.4488, 127.1267),
        default_zoom: 15,
        palette: vec![
            "/icons/marker-red.png".to_string(),
            "/icons/marker-blue.png".to_string(),
            "/icons/marker-green.png".to_string(),
        ],
        video_title_chars: 20,
    }
}

pub fn place(name: &str, lat: f64, lng: f64) -> Place {
    Place {
        name: name.to_string(),
        lat: Some(lat),
        lng: Some(lng),
    }
}

pub fn unresolved(name: &str) -> Place {
    Place {
        name: name.to_string(),
        lat: None,
        lng: None,
    }
}

pub fn news_item(title: &str, locations: Vec<Place>) -> NewsItem {
    NewsItem {
        title: title.to_string(),
        description: format!("{title} 상세 내용"),
        link: format!("https://news.example/{}", title.len()),
        locations,
        sentiment: None,
    }
}

pub fn sunny() -> WeatherSnapshot {
    WeatherSnapshot {
        temperature: 21.5,
        humidity: 40.0,
        precipitation_probability: 10.0,
        pm25: 12.0,
        weather_code: 0,
    }
}

pub fn route(mode: RouteMode, distance_meters: u64) -> RouteResult {
    RouteResult {
        mode,
        path: vec![LatLng::new(37.50, 127.02), LatLng::new(37.51, 127.05)],
        summary: RouteSummary {
            distance_meters,
            duration_seconds: 900,
        },
        steps: vec![],
    }
}
