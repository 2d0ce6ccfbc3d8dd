//! Representative video lookup for each (article, location) pair.
//!
//! Candidate queries go from most to least specific and the first one that
//! yields a video wins. When every candidate comes back empty the marker gets
//! a placeholder instead.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, TimeDelta, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::cache::{self, Cache};
use crate::config::YoutubeConfig;

pub const NO_VIDEO_PLACEHOLDER: &str = "No related video found.";

#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Id of the most relevant video for `query`, `None` if there is none
    async fn first_video(&self, query: &str) -> Result<Option<String>>;
}

/// What the info window shows in its video panel
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VideoEmbed {
    Video {
        video_id: String,
        embed_url: String,
        /// The candidate query that produced this video
        query: String,
    },
    Unavailable { message: String },
}

impl VideoEmbed {
    #[must_use]
    pub fn video(video_id: impl Into<String>, query: impl Into<String>) -> Self {
        let video_id = video_id.into();
        VideoEmbed::Video {
            embed_url: format!("https://www.youtube.com/embed/{video_id}"),
            video_id,
            query: query.into(),
        }
    }

    #[must_use]
    pub fn unavailable() -> Self {
        VideoEmbed::Unavailable {
            message: NO_VIDEO_PLACEHOLDER.to_string(),
        }
    }

    #[must_use]
    pub fn video_id(&self) -> Option<&str> {
        match self {
            VideoEmbed::Video { video_id, .. } => Some(video_id),
            VideoEmbed::Unavailable { .. } => None,
        }
    }
}

/// Lazily yields the candidate queries for one pair, most specific first:
/// title + location, category + location, a location/category phrase, and
/// finally the truncated title.
#[derive(Debug)]
pub struct VideoQueryChain<'a> {
    title: &'a str,
    location: &'a str,
    category: &'a str,
    title_chars: usize,
    stage: u8,
}

impl<'a> VideoQueryChain<'a> {
    #[must_use]
    pub fn new(title: &'a str, location: &'a str, category: &'a str, title_chars: usize) -> Self {
        Self {
            title: title.trim(),
            location: location.trim(),
            category: category.trim(),
            title_chars,
            stage: 0,
        }
    }
}

impl Iterator for VideoQueryChain<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let candidate = match self.stage {
                0 => format!("{} {}", self.title, self.location),
                1 => format!("{} {}", self.category, self.location),
                2 => format!("{} 지역 {} 소식", self.location, self.category),
                3 => self.title.chars().take(self.title_chars).collect(),
                _ => return None,
            };
            self.stage += 1;
            let candidate = candidate.trim().to_string();
            if !candidate.is_empty() {
                return Some(candidate);
            }
        }
    }
}

/// Walks the query chain until a video is found. Failed lookups count as
/// empty and move on to the next candidate.
#[instrument(skip(search, chain))]
pub async fn find_video(search: &dyn VideoSearch, chain: VideoQueryChain<'_>) -> VideoEmbed {
    for query in chain {
        match search.first_video(&query).await {
            Ok(Some(video_id)) => {
                debug!("Video {} found for '{}'", video_id, query);
                return VideoEmbed::video(video_id, query);
            }
            Ok(None) => debug!("No video for '{}'", query),
            Err(e) => warn!("Video lookup for '{}' failed: {e:#}", query),
        }
    }
    VideoEmbed::unavailable()
}

pub struct YoutubeClient {
    client: Client,
    config: YoutubeConfig,
    cache: Option<Cache>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    video_id: Option<String>,
}

impl YoutubeClient {
    pub fn new(client: Client, config: YoutubeConfig, cache: Option<Cache>) -> Self {
        Self {
            client,
            config,
            cache,
        }
    }

    fn published_after(&self) -> String {
        let since = Utc::now() - TimeDelta::days(i64::from(self.config.published_within_days));
        since.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn search_url(&self, query: &str, api_key: &str) -> String {
        format!(
            "{}/search?part=snippet&q={}&type=video&maxResults=1&publishedAfter={}&order=relevance&key={}",
            self.config.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.published_after()),
            urlencoding::encode(api_key)
        )
    }

    async fn search_call(&self, query: &str) -> Result<Option<String>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .context("Missing youtube.api_key")?;
        let url = self.search_url(query, api_key);

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body: SearchResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse YouTube search response")?;

        Ok(body.items.into_iter().find_map(|item| item.id.video_id))
    }
}

#[async_trait]
impl VideoSearch for YoutubeClient {
    #[instrument(skip(self))]
    async fn first_video(&self, query: &str) -> Result<Option<String>> {
        let key = format!("video:{query}");
        if let Some(cached) = cache::lookup::<Option<String>>(self.cache.as_ref(), &key).await {
            return Ok(cached);
        }

        let found = self.search_call(query).await?;
        cache::store(self.cache.as_ref(), &key, found.clone()).await;
        Ok(found)
    }
}
