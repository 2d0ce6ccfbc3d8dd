//! `NewsMap` - map-centric regional news explorer
//!
//! This library plots geotagged news for a region on a map, enriches every
//! (article, location) pair with a related video, reports the region's
//! weather and plans transit or driving routes between article locations.

pub mod api;
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod geocoding;
pub mod map;
pub mod models;
pub mod news;
pub mod route_planner;
pub mod routing;
pub mod search;
pub mod telemetry;
pub mod topic;
pub mod video;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use cache::Cache;
pub use config::NewsMapConfig;
pub use controller::{MapSettings, NewsMap, Services};
pub use error::NewsMapError;
pub use map::{MapEvent, MapSnapshot, OverlayId};
pub use models::{Article, GeoResult, LatLng, Location, Query, RouteMode, RouteResult, WeatherSnapshot};
pub use search::SearchOutcome;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, NewsMapError>;
