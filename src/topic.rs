//! Topic search with a sentiment breakdown of the matching news.
//!
//! Not coupled to the map: the result is a report the presentation layer
//! renders as a chart plus the top items of each sentiment.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::NewsMapError;
use crate::models::Sentiment;

/// How many items of each sentiment the report keeps
pub const TOP_ITEMS_PER_SENTIMENT: usize = 3;

#[async_trait]
pub trait TopicSearch: Send + Sync {
    async fn topic_search(&self, topic: &str) -> Result<Vec<TopicItem>>;
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TopicItem {
    pub title: String,
    #[serde(default, alias = "link")]
    pub url: String,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub content_summarized: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct SentimentCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SentimentReport {
    pub topic: String,
    pub counts: SentimentCounts,
    pub positive: Vec<TopicItem>,
    pub neutral: Vec<TopicItem>,
    pub negative: Vec<TopicItem>,
}

impl SentimentReport {
    #[must_use]
    pub fn from_items(topic: impl Into<String>, items: Vec<TopicItem>) -> Self {
        let mut report = SentimentReport {
            topic: topic.into(),
            counts: SentimentCounts::default(),
            positive: Vec::new(),
            neutral: Vec::new(),
            negative: Vec::new(),
        };

        for item in items {
            let (count, top) = match item.sentiment {
                Sentiment::Positive => (&mut report.counts.positive, &mut report.positive),
                Sentiment::Negative => (&mut report.counts.negative, &mut report.negative),
                Sentiment::Neutral => (&mut report.counts.neutral, &mut report.neutral),
            };
            *count += 1;
            if top.len() < TOP_ITEMS_PER_SENTIMENT {
                top.push(item);
            }
        }
        report
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.positive + self.counts.negative + self.counts.neutral
    }
}

/// Runs a topic search and summarizes it. A blank topic is rejected before any call.
#[instrument(skip(provider))]
pub async fn search_topic(provider: &dyn TopicSearch, topic: &str) -> crate::Result<SentimentReport> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(NewsMapError::validation(
            "Please enter a keyword to search (e.g. 탄핵)",
        ));
    }

    let items = provider
        .topic_search(topic)
        .await
        .map_err(|e| NewsMapError::search(format!("{e:#}")))?;
    Ok(SentimentReport::from_items(topic, items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedTopics {
        items: Vec<TopicItem>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TopicSearch for FixedTopics {
        async fn topic_search(&self, _topic: &str) -> Result<Vec<TopicItem>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.items.clone())
        }
    }

    fn item(title: &str, sentiment: Sentiment) -> TopicItem {
        TopicItem {
            title: title.to_string(),
            url: format!("https://news.example/{title}"),
            sentiment,
            content_summarized: String::new(),
        }
    }

    #[test]
    fn test_report_counts_and_caps_items() {
        let items = (0..5)
            .map(|i| item(&format!("p{i}"), Sentiment::Positive))
            .chain([item("n0", Sentiment::Negative), item("m0", Sentiment::Neutral)])
            .collect();
        let report = SentimentReport::from_items("탄핵", items);

        assert_eq!(report.counts.positive, 5);
        assert_eq!(report.counts.negative, 1);
        assert_eq!(report.counts.neutral, 1);
        assert_eq!(report.total(), 7);
        assert_eq!(report.positive.len(), TOP_ITEMS_PER_SENTIMENT);
        assert_eq!(report.positive[0].title, "p0");
    }

    #[test]
    fn test_backend_item_labels() {
        let item: TopicItem = serde_json::from_str(
            r#"{"title": "t", "url": "u", "sentiment": "부정", "content_summarized": "요약"}"#,
        )
        .unwrap();
        assert_eq!(item.sentiment, Sentiment::Negative);
    }

    #[tokio::test]
    async fn test_blank_topic_makes_no_call() {
        let provider = FixedTopics {
            items: vec![],
            calls: AtomicUsize::new(0),
        };
        let err = search_topic(&provider, "  ").await.unwrap_err();
        assert!(err.is_user_error());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

        let report = search_topic(&provider, "선거").await.unwrap();
        assert_eq!(report.topic, "선거");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
