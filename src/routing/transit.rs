use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::RouteProvider;
use crate::models::route::path_length_meters;
use crate::models::{LatLng, RouteEndpoint, RouteMode, RouteResult, RouteStep, RouteSummary, StepKind};

pub struct TransitClient {
    client: Client,
    url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    overview_polyline: Option<EncodedPolyline>,
    #[serde(default)]
    legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
struct EncodedPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct Leg {
    distance: Option<Measure>,
    duration: Option<Measure>,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct Measure {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct Step {
    travel_mode: String,
    #[serde(default)]
    html_instructions: String,
    distance: Option<Measure>,
    duration: Option<Measure>,
    transit_details: Option<TransitDetails>,
}

#[derive(Debug, Deserialize)]
struct TransitDetails {
    line: TransitLine,
}

#[derive(Debug, Deserialize)]
struct TransitLine {
    short_name: Option<String>,
    name: Option<String>,
    vehicle: Option<Vehicle>,
}

#[derive(Debug, Deserialize)]
struct Vehicle {
    #[serde(rename = "type")]
    kind: String,
}

impl TransitClient {
    pub fn new(client: Client, url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
        }
    }
}

impl TransitClient {
    fn directions_url(&self, start: &RouteEndpoint, end: &RouteEndpoint, api_key: &str) -> String {
        format!(
            "{}?origin={}&destination={}&mode=transit&language=ko&key={}",
            self.url,
            urlencoding::encode(&start.name),
            urlencoding::encode(&end.name),
            urlencoding::encode(api_key)
        )
    }
}

#[async_trait]
impl RouteProvider for TransitClient {
    #[instrument(skip(self), fields(start = %start.name, end = %end.name))]
    async fn route(&self, start: &RouteEndpoint, end: &RouteEndpoint) -> Result<RouteResult> {
        let api_key = self
            .api_key
            .as_deref()
            .context("Missing routing.transit_api_key")?;
        let url = self.directions_url(start, end, api_key);
        debug!("Calling the transit directions API");

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body: DirectionsResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse transit directions response")?;

        let route = parse_directions(body)?;
        info!(
            "Transit route with {} steps, {}",
            route.steps.len(),
            route.summary.format_duration()
        );
        Ok(route)
    }
}

fn parse_directions(body: DirectionsResponse) -> Result<RouteResult> {
    if body.status != "OK" {
        return Err(anyhow!(
            "Directions status {}{}",
            body.status,
            body.error_message
                .map(|m| format!(": {m}"))
                .unwrap_or_default()
        ));
    }

    let route = body
        .routes
        .into_iter()
        .next()
        .ok_or(anyhow!("No routes in response"))?;
    let leg = route
        .legs
        .into_iter()
        .next()
        .ok_or(anyhow!("No legs in route"))?;

    let path = match route.overview_polyline {
        Some(polyline) => decode_polyline(&polyline.points)?,
        None => Vec::new(),
    };

    let distance_meters = leg
        .distance
        .map(|d| d.value)
        .unwrap_or_else(|| path_length_meters(&path).round() as u64);
    let duration_seconds = leg.duration.map(|d| d.value).unwrap_or_default();

    let steps = leg.steps.into_iter().map(into_step).collect();

    Ok(RouteResult {
        mode: RouteMode::Transit,
        path,
        summary: RouteSummary {
            distance_meters,
            duration_seconds,
        },
        steps,
    })
}

fn into_step(step: Step) -> RouteStep {
    let line = step.transit_details.as_ref().map(|details| &details.line);
    let vehicle = line
        .and_then(|line| line.vehicle.as_ref())
        .map(|vehicle| vehicle.kind.as_str());
    let kind = StepKind::classify(&step.travel_mode, vehicle);
    let line_name = line.and_then(|line| line.short_name.clone().or_else(|| line.name.clone()));

    RouteStep {
        kind,
        instruction: strip_html(&step.html_instructions),
        line: line_name,
        distance_meters: step.distance.map(|d| d.value),
        duration_seconds: step.duration.map(|d| d.value),
    }
}

/// Instructions arrive as HTML fragments; keep only the text
fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decodes an encoded polyline (5 decimal places) into coordinates
pub fn decode_polyline(encoded: &str) -> Result<Vec<LatLng>> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut path = Vec::new();

    let next_delta = |index: &mut usize| -> Result<i64> {
        let mut result: i64 = 0;
        let mut shift = 0;
        loop {
            let byte = *bytes
                .get(*index)
                .ok_or(anyhow!("Truncated polyline at byte {}", *index))?;
            *index += 1;
            let chunk = i64::from(byte)
                .checked_sub(63)
                .filter(|chunk| (0..64).contains(chunk))
                .ok_or(anyhow!("Invalid polyline character {:?}", byte as char))?;
            result |= (chunk & 0x1f) << shift;
            shift += 5;
            if chunk < 0x20 {
                break;
            }
            if shift > 60 {
                return Err(anyhow!("Polyline value overflow"));
            }
        }
        Ok(if result & 1 == 1 {
            !(result >> 1)
        } else {
            result >> 1
        })
    };

    while index < bytes.len() {
        lat = lat
            .checked_add(next_delta(&mut index)?)
            .ok_or(anyhow!("Polyline coordinate overflow"))?;
        lng = lng
            .checked_add(next_delta(&mut index)?)
            .ok_or(anyhow!("Polyline coordinate overflow"))?;
        path.push(LatLng::new(lat as f64 / 1e5, lng as f64 / 1e5));
    }
    Ok(path)
}
