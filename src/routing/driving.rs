use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::RouteProvider;
use crate::models::route::path_length_meters;
use crate::models::{LatLng, RouteEndpoint, RouteMode, RouteResult, RouteStep, RouteSummary, StepKind};

pub struct DrivingClient {
    client: Client,
    url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    result_code: i32,
    #[serde(default)]
    result_msg: String,
    summary: Option<Summary>,
    #[serde(default)]
    sections: Vec<Section>,
}

#[derive(Debug, Deserialize)]
struct Summary {
    distance: u64,
    duration: u64,
}

#[derive(Debug, Deserialize)]
struct Section {
    #[serde(default)]
    roads: Vec<Road>,
    #[serde(default)]
    guides: Vec<Guide>,
}

#[derive(Debug, Deserialize)]
struct Road {
    /// Flattened `[lng, lat, lng, lat, ...]`
    #[serde(default)]
    vertexes: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct Guide {
    #[serde(default)]
    name: String,
    #[serde(default)]
    guidance: String,
    distance: Option<u64>,
    duration: Option<u64>,
}

impl DrivingClient {
    pub fn new(client: Client, url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl RouteProvider for DrivingClient {
    #[instrument(skip(self), fields(start = %start.name, end = %end.name))]
    async fn route(&self, start: &RouteEndpoint, end: &RouteEndpoint) -> Result<RouteResult> {
        let api_key = self
            .api_key
            .as_deref()
            .context("Missing routing.driving_api_key")?;
        let url = format!(
            "{}?origin={}&destination={}",
            self.url,
            start.coords().to_lng_lat_param(),
            end.coords().to_lng_lat_param()
        );
        debug!("Calling the driving directions API");

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("KakaoAK {api_key}"))
            .send()
            .await?
            .error_for_status()?;
        let body: DirectionsResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse driving directions response")?;

        let route = parse_directions(body)?;
        info!(
            "Driving route over {} points, {}",
            route.path.len(),
            route.summary.format_distance()
        );
        Ok(route)
    }
}

fn parse_directions(body: DirectionsResponse) -> Result<RouteResult> {
    let route = body
        .routes
        .into_iter()
        .next()
        .ok_or(anyhow!("No routes in response"))?;
    if route.result_code != 0 {
        return Err(anyhow!(
            "Driving directions failed ({}): {}",
            route.result_code,
            route.result_msg
        ));
    }

    let section = route
        .sections
        .into_iter()
        .next()
        .ok_or(anyhow!("No sections in route"))?;

    let mut path = Vec::new();
    for road in &section.roads {
        path.extend(decode_vertexes(&road.vertexes)?);
    }

    let summary = match route.summary {
        Some(summary) => RouteSummary {
            distance_meters: summary.distance,
            duration_seconds: summary.duration,
        },
        None => RouteSummary {
            distance_meters: path_length_meters(&path).round() as u64,
            duration_seconds: 0,
        },
    };

    let steps = section
        .guides
        .into_iter()
        .map(|guide| RouteStep {
            kind: StepKind::Other,
            instruction: match (guide.name.trim(), guide.guidance.trim()) {
                ("", guidance) => guidance.to_string(),
                (name, "") => name.to_string(),
                (name, guidance) => format!("{name}: {guidance}"),
            },
            line: None,
            distance_meters: guide.distance,
            duration_seconds: guide.duration,
        })
        .collect();

    Ok(RouteResult {
        mode: RouteMode::Driving,
        path,
        summary,
        steps,
    })
}

/// Decodes flattened `lng, lat` pairs into coordinates
pub fn decode_vertexes(vertexes: &[f64]) -> Result<Vec<LatLng>> {
    if vertexes.len() % 2 != 0 {
        return Err(anyhow!(
            "Odd number of vertex values ({}), expected lng/lat pairs",
            vertexes.len()
        ));
    }
    Ok(vertexes
        .chunks_exact(2)
        .map(|pair| LatLng::new(pair[1], pair[0]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_vertexes_is_lng_lat() {
        let path = decode_vertexes(&[127.1, 37.4, 127.2, 37.5]).unwrap();
        assert_eq!(path, vec![LatLng::new(37.4, 127.1), LatLng::new(37.5, 127.2)]);
        assert!(decode_vertexes(&[127.1]).is_err());
    }

    #[test]
    fn test_parse_directions_flattens_roads() {
        let body: DirectionsResponse = serde_json::from_str(
            r#"{"routes": [{"result_code": 0, "result_msg": "길찾기 성공",
                "summary": {"distance": 5230, "duration": 1020},
                "sections": [{
                    "roads": [{"vertexes": [127.1, 37.4, 127.11, 37.41]},
                              {"vertexes": [127.12, 37.42]}],
                    "guides": [{"name": "출발지", "guidance": "출발", "distance": 0, "duration": 0},
                               {"name": "", "guidance": "우회전", "distance": 320, "duration": 60}]
                }]}]}"#,
        )
        .unwrap();

        let route = parse_directions(body).unwrap();
        assert_eq!(route.mode, RouteMode::Driving);
        assert_eq!(route.path.len(), 3);
        assert_eq!(route.path[2], LatLng::new(37.42, 127.12));
        assert_eq!(route.summary.distance_meters, 5_230);
        assert_eq!(route.steps[0].instruction, "출발지: 출발");
        assert_eq!(route.steps[1].instruction, "우회전");
        assert!(route.steps.iter().all(|s| s.kind == StepKind::Other));
    }

    #[test]
    fn test_failed_result_code() {
        let body: DirectionsResponse = serde_json::from_str(
            r#"{"routes": [{"result_code": 104, "result_msg": "출발지와 도착지가 5 m 이내로 설정된 경우"}]}"#,
        )
        .unwrap();
        let err = parse_directions(body).unwrap_err();
        assert!(err.to_string().contains("104"));
    }
}
