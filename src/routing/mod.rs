//! Route planning providers.
//!
//! Transit routes come from a directions service addressed by place name,
//! driving routes from a navigation service addressed by `lng,lat`. Both are
//! decoded into the same `RouteResult`.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{RouteEndpoint, RouteResult};

pub mod driving;
pub mod transit;

pub use driving::DrivingClient;
pub use transit::TransitClient;

#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn route(&self, start: &RouteEndpoint, end: &RouteEndpoint) -> Result<RouteResult>;
}
