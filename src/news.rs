//! News search backend client.
//!
//! The backend collects and geotags regional news (`POST /search`) and
//! classifies topic news by sentiment (`POST /topic-search`).

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::models::NewsItem;
use crate::topic::{TopicItem, TopicSearch};

/// Regional news search
#[async_trait]
pub trait NewsSearch: Send + Sync {
    async fn search(&self, region: &str, category: &str) -> Result<Vec<NewsItem>>;
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    region: &'a str,
    category: &'a str,
}

#[derive(Debug, Serialize)]
struct TopicRequest<'a> {
    topic: &'a str,
}

/// The backend answers either `{news: [...]}` or `{error: "..."}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NewsResponse<T> {
    News { news: Vec<T> },
    Error { error: String },
}

impl<T> NewsResponse<T> {
    fn into_result(self) -> Result<Vec<T>> {
        match self {
            NewsResponse::News { news } => Ok(news),
            NewsResponse::Error { error } => Err(anyhow!("News backend error: {error}")),
        }
    }
}

pub struct NewsBackendClient {
    client: Client,
    base_url: String,
}

impl NewsBackendClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<B: Serialize + ?Sized, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Vec<T>> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("News backend request URL: {}", url);

        let start_time = Instant::now();
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("News backend request to {url} failed"))?;

        let status = response.status();
        // Error bodies still carry {error: "..."}, prefer that message when present
        let parsed: std::result::Result<NewsResponse<T>, _> = response.json().await;
        let items = match (status.is_success(), parsed) {
            (_, Ok(body)) => body.into_result()?,
            (true, Err(e)) => {
                return Err(e).context("Failed to parse news backend response");
            }
            (false, Err(_)) => return Err(anyhow!("News backend returned {status}")),
        };

        let elapsed = start_time.elapsed();
        if elapsed.as_secs() > 5 {
            warn!("Slow news backend response: {:.3}s", elapsed.as_secs_f64());
        }
        Ok(items)
    }
}

#[async_trait]
impl NewsSearch for NewsBackendClient {
    #[instrument(skip(self))]
    async fn search(&self, region: &str, category: &str) -> Result<Vec<NewsItem>> {
        let items: Vec<NewsItem> = self
            .post("search", &SearchRequest { region, category })
            .await?;
        info!("News backend returned {} items", items.len());
        Ok(items)
    }
}

#[async_trait]
impl TopicSearch for NewsBackendClient {
    #[instrument(skip(self))]
    async fn topic_search(&self, topic: &str) -> Result<Vec<TopicItem>> {
        let items: Vec<TopicItem> = self.post("topic-search", &TopicRequest { topic }).await?;
        info!("Topic search returned {} items", items.len());
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_response_variants() {
        let ok: NewsResponse<NewsItem> =
            serde_json::from_str(r#"{"news": [{"title": "축제 개막", "locations": []}]}"#).unwrap();
        assert_eq!(ok.into_result().unwrap().len(), 1);

        let err: NewsResponse<NewsItem> =
            serde_json::from_str(r#"{"error": "crawler unavailable"}"#).unwrap();
        let message = err.into_result().unwrap_err().to_string();
        assert!(message.contains("crawler unavailable"));
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = NewsBackendClient::new(Client::new(), "http://127.0.0.1:5000/");
        assert_eq!(client.base_url, "http://127.0.0.1:5000");
    }
}
