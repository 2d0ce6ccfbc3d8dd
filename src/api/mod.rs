use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query as QueryParams, State},
    http::StatusCode,
    response::{
        IntoResponse, Json, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, warn};

use crate::{
    NewsMap, NewsMapError,
    map::{ClickOutcome, MapSnapshot, OverlayId, PointInspection},
    models::{LatLng, Location, Query, RouteMode, RouteResult},
    search::SearchOutcome,
    topic::SentimentReport,
};

pub type AppState = Arc<NewsMap>;

/// A `NewsMapError` rendered as `{ "error": user_message }`
#[derive(Debug)]
pub struct ApiError(pub NewsMapError);

impl From<NewsMapError> for ApiError {
    fn from(err: NewsMapError) -> Self {
        Self(err)
    }
}

#[derive(Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            NewsMapError::Validation { .. } => StatusCode::BAD_REQUEST,
            NewsMapError::Search { .. } | NewsMapError::Route { .. } | NewsMapError::Api { .. } => {
                StatusCode::BAD_GATEWAY
            }
            NewsMapError::Stale { .. } => StatusCode::CONFLICT,
            NewsMapError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }
        let body = ErrorBody {
            error: self.0.user_message(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Serialize, Deserialize)]
pub struct ClickResponse {
    pub outcome: ClickOutcome,
    pub state: MapSnapshot,
}

#[derive(Serialize, Deserialize)]
pub struct RouteRequest {
    #[serde(default)]
    pub mode: RouteMode,
}

#[derive(Serialize, Deserialize)]
pub struct TopicRequest {
    pub topic: String,
}

#[derive(Serialize, Deserialize)]
pub struct PointParams {
    pub lat: f64,
    pub lng: f64,
}

pub fn router(app: AppState) -> Router {
    Router::new()
        .route("/search", post(search))
        .route("/state", get(state))
        .route("/events", get(events))
        .route("/markers/{id}/click", post(click_marker))
        .route("/articles/{index}/focus", post(focus_article))
        .route("/route/start", post(set_start))
        .route("/route/end", post(set_end))
        .route("/route", post(plan_route))
        .route("/topic-search", post(topic_search))
        .route("/reverse-geocode", get(reverse_geocode))
        .with_state(app)
}

async fn search(State(app): State<AppState>, Json(query): Json<Query>) -> ApiResult<SearchOutcome> {
    Ok(Json(app.search(&query).await?))
}

async fn state(State(app): State<AppState>) -> Json<MapSnapshot> {
    Json(app.snapshot())
}

async fn click_marker(State(app): State<AppState>, Path(id): Path<u64>) -> ApiResult<ClickResponse> {
    let outcome = app.click_marker(OverlayId(id))?;
    Ok(Json(ClickResponse {
        outcome,
        state: app.snapshot(),
    }))
}

async fn focus_article(
    State(app): State<AppState>,
    Path(index): Path<usize>,
) -> ApiResult<MapSnapshot> {
    app.focus_article(index)?;
    Ok(Json(app.snapshot()))
}

async fn set_start(State(app): State<AppState>, Json(endpoint): Json<Location>) -> Json<MapSnapshot> {
    app.set_start(endpoint);
    Json(app.snapshot())
}

async fn set_end(State(app): State<AppState>, Json(endpoint): Json<Location>) -> Json<MapSnapshot> {
    app.set_end(endpoint);
    Json(app.snapshot())
}

async fn plan_route(
    State(app): State<AppState>,
    Json(request): Json<RouteRequest>,
) -> ApiResult<RouteResult> {
    Ok(Json(app.plan_route(request.mode).await?))
}

async fn topic_search(
    State(app): State<AppState>,
    Json(request): Json<TopicRequest>,
) -> ApiResult<SentimentReport> {
    Ok(Json(app.topic_search(&request.topic).await?))
}

async fn reverse_geocode(
    State(app): State<AppState>,
    QueryParams(point): QueryParams<PointParams>,
) -> Json<PointInspection> {
    Json(app.inspect_point(LatLng::new(point.lat, point.lng)).await)
}

/// Map events as server-sent events. Lagging clients skip what they missed.
async fn events(State(app): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = app.subscribe();
    let stream = futures::stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => match Event::default().json_data(&event) {
                    Ok(sse) => return Some((Ok(sse), receiver)),
                    Err(e) => warn!("Failed to encode map event: {e}"),
                },
                Err(RecvError::Lagged(skipped)) => warn!("Event stream lagged, {skipped} events dropped"),
                Err(RecvError::Closed) => return None,
            }
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
