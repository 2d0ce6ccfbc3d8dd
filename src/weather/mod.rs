//! Current weather for a searched region.
//!
//! The region name is forward-geocoded first, then the weather backend is
//! asked for the conditions at those coordinates. Either step failing leaves
//! the weather absent; it never fails the surrounding search.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::geocoding::Geocoder;
use crate::models::{LatLng, WeatherSnapshot};

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, at: LatLng) -> Result<WeatherSnapshot>;
}

pub struct WeatherBackendClient {
    client: Client,
    base_url: String,
}

impl WeatherBackendClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl WeatherProvider for WeatherBackendClient {
    #[instrument(skip(self))]
    async fn current(&self, at: LatLng) -> Result<WeatherSnapshot> {
        let url = format!(
            "{}/weather?location={}",
            self.base_url,
            urlencoding::encode(&at.to_lat_lng_param())
        );
        debug!("Weather request URL: {}", url);

        let start_time = Instant::now();
        let response = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?;
        let snapshot: WeatherSnapshot = response
            .json()
            .await
            .with_context(|| "Failed to parse weather response")?;

        info!(
            "Retrieved current weather in {:.3}s",
            start_time.elapsed().as_secs_f64()
        );
        Ok(snapshot)
    }
}

/// Weather for `region`, or `None` if the region can't be located or the
/// weather backend fails
#[instrument(skip(geocoder, provider))]
pub async fn region_weather(
    geocoder: &dyn Geocoder,
    provider: &dyn WeatherProvider,
    region: &str,
) -> Option<WeatherSnapshot> {
    let at = match geocoder.geocode(region).await {
        Ok(Some(at)) => at,
        Ok(None) => {
            warn!("Region '{}' could not be geocoded, weather unavailable", region);
            return None;
        }
        Err(e) => {
            warn!("Geocoding region '{}' failed: {e:#}", region);
            return None;
        }
    };

    match provider.current(at).await {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("Weather lookup for '{}' failed: {e:#}", region);
            None
        }
    }
}
