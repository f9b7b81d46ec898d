use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque source identifier as supplied by the aggregator.
pub type SourceId = String;

/// Media value meaning "no image available".
pub const REMOVED_MEDIA: &str = "[Removed]";

/// Timestamp format used by source dates.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Trigger message published by the aggregator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorMessage {
    pub source_ids: Vec<SourceId>,
}

/// A single ingested news item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub link: String,
    /// Publication timestamp; the db service may send it empty or null
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub media: Option<String>,
}

impl Source {
    /// Media link if this source carries a usable image.
    pub fn media_link(&self) -> Option<&str> {
        match self.media.as_deref() {
            Some(m) if !m.is_empty() && m != REMOVED_MEDIA => Some(m),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SourceEnvelope {
    pub source: Source,
}

/// Lookup key for the scraper
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeQuery {
    pub source_id: SourceId,
    pub link: String,
}

/// Scraped content of one source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeData {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScrapeEnvelope {
    pub scrape_data: ScrapeData,
}

/// Aggregated output entity for one cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub source_ids: Vec<SourceId>,
    pub topics: Vec<String>,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

impl Post {
    pub fn new(source_ids: Vec<SourceId>, topics: Vec<String>, date: String, media: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_ids,
            topics,
            date,
            media,
        }
    }
}

/// Text of one post forwarded to the LLM analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostQuery {
    pub post_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostAnalysis {
    pub post_queries: Vec<PostQuery>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationQuery {
    pub post_ids: Vec<String>,
}
