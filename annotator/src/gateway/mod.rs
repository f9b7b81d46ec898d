use thiserror::Error;

use crate::models::{Post, PostAnalysis, RecommendationQuery, ScrapeData, ScrapeQuery, Source, SourceId};

pub mod http;

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Typed failure of a collaborator call
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Service error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Image error: {0}")]
    Image(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Network(err.to_string())
        }
    }
}

/// Request/response contract with the downstream services
#[async_trait::async_trait]
pub trait ServiceGateway: Send + Sync {
    /// Fetch source metadata from the database service
    async fn get_source(&self, source_id: &SourceId) -> Result<Source>;

    /// Fetch the scraped document for a source
    async fn get_scrape_data(&self, query: &ScrapeQuery) -> Result<ScrapeData>;

    /// Persist an assembled post
    async fn add_post(&self, post: &Post) -> Result<()>;

    /// Forward post texts to the LLM analyzer
    async fn add_analysis(&self, analysis: &PostAnalysis) -> Result<()>;

    /// Notify the recommender about new posts
    async fn add_recommendations(&self, query: &RecommendationQuery) -> Result<()>;

    /// Download every image; the batch fails on the first failed download
    async fn fetch_images(&self, urls: &[String]) -> Result<Vec<Vec<u8>>>;
}
