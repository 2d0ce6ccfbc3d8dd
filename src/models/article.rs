//! News article model, search query and (article, location) pairings

use serde::{Deserialize, Serialize};

use super::location::{LatLng, Location};
use crate::NewsMapError;

/// A region + category search, immutable for the lifetime of one search epoch
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Query {
    pub region: String,
    pub category: String,
}

impl Query {
    #[must_use]
    pub fn new(region: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            category: category.into(),
        }
    }

    /// Returns the trimmed query, or a validation error if either field is blank
    pub fn validated(&self) -> crate::Result<Query> {
        let region = self.region.trim();
        let category = self.category.trim();
        if region.is_empty() {
            return Err(NewsMapError::validation("Please enter a region to search"));
        }
        if category.is_empty() {
            return Err(NewsMapError::validation("Please enter a news category"));
        }
        Ok(Query::new(region, category))
    }
}

/// Sentiment label assigned by the news backend
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    #[serde(alias = "긍정")]
    Positive,
    #[serde(alias = "부정")]
    Negative,
    #[serde(alias = "중립")]
    Neutral,
}

/// A place mentioned by a news item as delivered by the backend.
/// Coordinates may be missing and then have to be geocoded by name.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

impl Place {
    /// The place as a resolved location, if the backend sent coordinates
    #[must_use]
    pub fn resolved(&self) -> Option<Location> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Location::new(self.name.clone(), lat, lng)),
            _ => None,
        }
    }

    #[must_use]
    pub fn resolve_with(&self, at: LatLng) -> Location {
        Location::new(self.name.clone(), at.lat, at.lng)
    }
}

/// News item as returned by the news search backend
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewsItem {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "url")]
    pub link: String,
    #[serde(default)]
    pub locations: Vec<Place>,
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
}

/// A news article whose locations all have coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub link: String,
    pub locations: Vec<Location>,
    pub sentiment: Option<Sentiment>,
}

impl Article {
    /// Build an article from a news item and the locations resolved for it
    #[must_use]
    pub fn from_item(item: NewsItem, locations: Vec<Location>) -> Self {
        Self {
            title: item.title,
            description: item.description,
            link: item.link,
            locations,
            sentiment: item.sentiment,
        }
    }

    #[must_use]
    pub fn is_mappable(&self) -> bool {
        !self.locations.is_empty()
    }
}

/// One (article, location) pairing with resolved coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeoResult {
    pub article_index: usize,
    pub location_index: usize,
    pub location: Location,
}

impl GeoResult {
    /// Enumerate every (article, location) pair in list order
    #[must_use]
    pub fn pairs(articles: &[Article]) -> Vec<GeoResult> {
        articles
            .iter()
            .enumerate()
            .flat_map(|(article_index, article)| {
                article
                    .locations
                    .iter()
                    .enumerate()
                    .map(move |(location_index, location)| GeoResult {
                        article_index,
                        location_index,
                        location: location.clone(),
                    })
            })
            .collect()
    }

    /// Combined ordinal used to pick a marker icon from the palette
    #[must_use]
    pub fn palette_slot(&self, palette_size: usize) -> usize {
        if palette_size == 0 {
            return 0;
        }
        (self.article_index + self.location_index) % palette_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn article(title: &str, locations: Vec<Location>) -> Article {
        Article {
            title: title.to_string(),
            description: String::new(),
            link: String::new(),
            locations,
            sentiment: None,
        }
    }

    #[rstest]
    #[case("", "축제")]
    #[case("서울특별시", "")]
    #[case("   ", "축제")]
    #[case("서울특별시", "\t")]
    fn test_blank_query_is_rejected(#[case] region: &str, #[case] category: &str) {
        let err = Query::new(region, category).validated().unwrap_err();
        assert!(err.is_user_error());
    }

    #[test]
    fn test_query_is_trimmed() {
        let query = Query::new("  서울특별시 ", " 축제").validated().unwrap();
        assert_eq!(query, Query::new("서울특별시", "축제"));
    }

    #[test]
    fn test_sentiment_accepts_backend_labels() {
        let labels: Vec<Sentiment> =
            serde_json::from_str(r#"["긍정", "부정", "중립", "positive"]"#).unwrap();
        assert_eq!(
            labels,
            vec![
                Sentiment::Positive,
                Sentiment::Negative,
                Sentiment::Neutral,
                Sentiment::Positive
            ]
        );
    }

    #[test]
    fn test_news_item_with_missing_fields() {
        let item: NewsItem = serde_json::from_str(
            r#"{"title": "불꽃축제", "url": "https://news.example/1",
                "locations": [{"name": "여의도"}, {"name": "잠실", "lat": 37.51, "lng": 127.1}]}"#,
        )
        .unwrap();
        assert_eq!(item.link, "https://news.example/1");
        assert_eq!(item.locations[0].resolved(), None);
        assert_eq!(
            item.locations[1].resolved(),
            Some(Location::new("잠실", 37.51, 127.1))
        );
        assert!(item.sentiment.is_none());
    }

    #[test]
    fn test_pairs_and_palette_slots() {
        let articles = vec![
            article(
                "a",
                vec![Location::new("x", 1.0, 1.0), Location::new("y", 2.0, 2.0)],
            ),
            article("b", vec![Location::new("z", 3.0, 3.0)]),
        ];
        let pairs = GeoResult::pairs(&articles);
        let slots: Vec<(usize, usize, usize)> = pairs
            .iter()
            .map(|p| (p.article_index, p.location_index, p.palette_slot(2)))
            .collect();
        assert_eq!(slots, vec![(0, 0, 0), (0, 1, 1), (1, 0, 1)]);
        assert_eq!(pairs[2].location.name, "z");
    }
}
