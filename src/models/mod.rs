//! Data models for the NewsMap application
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates and named places
//! - Article: News items, search queries and (article, location) pairings
//! - Weather: Current conditions for a searched region
//! - Route: Planned routes, their summaries and steps

pub mod article;
pub mod location;
pub mod route;
pub mod weather;

// Re-export all public types for convenient access
pub use article::{Article, GeoResult, NewsItem, Place, Query, Sentiment};
pub use location::{LatLng, Location, RouteEndpoint};
pub use route::{RouteMode, RouteResult, RouteStep, RouteSummary, StepKind};
pub use weather::{AirQuality, WeatherSnapshot};
