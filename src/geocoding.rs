//! Forward and reverse geocoding against the Naver Maps API

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::cache::{self, Cache};
use crate::config::NaverConfig;
use crate::models::LatLng;

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Coordinates of the best match for `query`, `None` when nothing matches
    async fn geocode(&self, query: &str) -> Result<Option<LatLng>>;

    /// Jibun (lot-number) address at `at`, `None` when the point has no address
    async fn reverse_geocode(&self, at: LatLng) -> Result<Option<String>>;
}

pub struct NaverGeocoder {
    client: Client,
    config: NaverConfig,
    cache: Option<Cache>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    addresses: Vec<GeocodeAddress>,
}

/// Naver returns coordinates as strings: `x` is the longitude, `y` the latitude
#[derive(Debug, Deserialize)]
struct GeocodeAddress {
    x: String,
    y: String,
}

impl GeocodeAddress {
    fn coords(&self) -> Result<LatLng> {
        let lng: f64 = self.x.parse().with_context(|| format!("Invalid x '{}'", self.x))?;
        let lat: f64 = self.y.parse().with_context(|| format!("Invalid y '{}'", self.y))?;
        Ok(LatLng::new(lat, lng))
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    status: ReverseStatus,
    #[serde(default)]
    results: Vec<ReverseResult>,
}

#[derive(Debug, Deserialize)]
struct ReverseStatus {
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResult {
    region: Region,
    land: Option<Land>,
}

#[derive(Debug, Deserialize)]
struct Region {
    area1: Area,
    area2: Area,
    area3: Area,
    area4: Area,
}

#[derive(Debug, Deserialize)]
struct Area {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Land {
    #[serde(default)]
    number1: String,
    #[serde(default)]
    number2: String,
}

/// Reverse-geocoder status for "no address at this point"
const NO_RESULTS: i32 = 3;

impl ReverseResult {
    fn jibun_address(&self) -> String {
        let mut parts: Vec<String> = [
            &self.region.area1,
            &self.region.area2,
            &self.region.area3,
            &self.region.area4,
        ]
        .iter()
        .map(|area| area.name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

        if let Some(land) = &self.land {
            match (land.number1.trim(), land.number2.trim()) {
                ("", _) => {}
                (main, "") => parts.push(main.to_string()),
                (main, sub) => parts.push(format!("{main}-{sub}")),
            }
        }
        parts.join(" ")
    }
}

impl NaverGeocoder {
    pub fn new(client: Client, config: NaverConfig, cache: Option<Cache>) -> Self {
        Self {
            client,
            config,
            cache,
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request;
        if let Some(id) = &self.config.client_id {
            request = request.header("X-NCP-APIGW-API-KEY-ID", id);
        }
        if let Some(secret) = &self.config.client_secret {
            request = request.header("X-NCP-APIGW-API-KEY", secret);
        }
        request
    }

    async fn geocode_call(&self, query: &str) -> Result<Option<LatLng>> {
        let url = format!(
            "{}?query={}",
            self.config.geocode_url,
            urlencoding::encode(query)
        );
        debug!("Geocoding request URL: {}", url);

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await?
            .error_for_status()?;
        let body: GeocodeResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse Naver geocoding response")?;

        body.addresses.first().map(GeocodeAddress::coords).transpose()
    }
}

#[async_trait]
impl Geocoder for NaverGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Option<LatLng>> {
        let key = format!("geocode:{query}");
        if let Some(cached) = cache::lookup::<(f64, f64)>(self.cache.as_ref(), &key).await {
            return Ok(Some(LatLng::new(cached.0, cached.1)));
        }

        let found = self.geocode_call(query).await?;
        match found {
            Some(at) => {
                info!("Geocoded '{}' to {:.4}, {:.4}", query, at.lat, at.lng);
                cache::store(self.cache.as_ref(), &key, (at.lat, at.lng)).await;
            }
            None => warn!("No geocoding results for '{}'", query),
        }
        Ok(found)
    }

    #[instrument(skip(self))]
    async fn reverse_geocode(&self, at: LatLng) -> Result<Option<String>> {
        let url = format!(
            "{}?coords={}&orders=addr&output=json",
            self.config.reverse_geocode_url,
            at.to_lng_lat_param()
        );

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await?
            .error_for_status()?;
        let body: ReverseResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse Naver reverse geocoding response")?;

        match body.status.code {
            0 => Ok(body.results.first().map(ReverseResult::jibun_address)),
            NO_RESULTS => Ok(None),
            code => Err(anyhow!(
                "Reverse geocoding failed with status {code}: {}",
                body.status.message
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geocode_address_coordinates() {
        let body: GeocodeResponse = serde_json::from_str(
            r#"{"status": "OK", "addresses": [{"roadAddress": "서울특별시 중구 세종대로 110",
                "x": "126.9783882", "y": "37.5666103"}]}"#,
        )
        .unwrap();
        let at = body.addresses[0].coords().unwrap();
        assert_eq!(at, LatLng::new(37.5666103, 126.9783882));
    }

    #[test]
    fn test_empty_geocode_response() {
        let body: GeocodeResponse =
            serde_json::from_str(r#"{"status": "OK", "addresses": []}"#).unwrap();
        assert!(body.addresses.is_empty());
    }

    #[test]
    fn test_jibun_address() {
        let body: ReverseResponse = serde_json::from_str(
            r#"{"status": {"code": 0, "name": "ok", "message": "done"},
                "results": [{"name": "addr",
                  "region": {"area1": {"name": "경기도"}, "area2": {"name": "성남시 수정구"},
                             "area3": {"name": "복정동"}, "area4": {"name": ""}},
                  "land": {"number1": "65", "number2": ""}}]}"#,
        )
        .unwrap();
        assert_eq!(body.results[0].jibun_address(), "경기도 성남시 수정구 복정동 65");
    }

    #[test]
    fn test_jibun_address_with_sub_number() {
        let result = ReverseResult {
            region: Region {
                area1: Area { name: "서울특별시".into() },
                area2: Area { name: "중구".into() },
                area3: Area { name: "태평로1가".into() },
                area4: Area { name: String::new() },
            },
            land: Some(Land {
                number1: "31".into(),
                number2: "2".into(),
            }),
        };
        assert_eq!(result.jibun_address(), "서울특별시 중구 태평로1가 31-2");
    }
}
