use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use common::ServicesConfig;

use super::{Result, ServiceError, ServiceGateway};
use crate::models::{
    Post, PostAnalysis, RecommendationQuery, ScrapeData, ScrapeEnvelope, ScrapeQuery, Source, SourceEnvelope,
    SourceId,
};

/// Gateway talking JSON over HTTP to the collaborator services
pub struct HttpGateway {
    db_host: String,
    llm_host: String,
    scraper_host: String,
    recommender_host: String,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(services: &ServicesConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(services.timeout_seconds()))
            .user_agent("annotator/0.1.0")
            .build()?;

        Ok(Self {
            db_host: trim_host(&services.db_host),
            llm_host: trim_host(&services.llm_host),
            scraper_host: trim_host(&services.scraper_host),
            recommender_host: trim_host(&services.recommender_host),
            client,
        })
    }

    async fn get_json<T, Q>(&self, host: &str, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = format!("{}/{}", host, path);
        debug!(%url, "GET");

        let response = self.client.get(&url).query(query).send().await?;
        let response = check_status(response).await?;
        response.json::<T>().await.map_err(|e| ServiceError::Decode(e.to_string()))
    }

    async fn post_json<B>(&self, host: &str, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}/{}", host, path);
        debug!(%url, "POST");

        let response = self.client.post(&url).json(body).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

fn trim_host(host: &str) -> String {
    host.trim_end_matches('/').to_string()
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait::async_trait]
impl ServiceGateway for HttpGateway {
    async fn get_source(&self, source_id: &SourceId) -> Result<Source> {
        let envelope: SourceEnvelope = self
            .get_json(&self.db_host, "aggregator/get-aggregation", &[("source_id", source_id)])
            .await?;
        Ok(envelope.source)
    }

    async fn get_scrape_data(&self, query: &ScrapeQuery) -> Result<ScrapeData> {
        let envelope: ScrapeEnvelope = self
            .get_json(&self.scraper_host, "scraper/get-scrape-data", query)
            .await?;
        Ok(envelope.scrape_data)
    }

    async fn add_post(&self, post: &Post) -> Result<()> {
        self.post_json(&self.db_host, "annotator/add-post", post).await
    }

    async fn add_analysis(&self, analysis: &PostAnalysis) -> Result<()> {
        self.post_json(&self.llm_host, "llm/add-analysis", analysis).await
    }

    async fn add_recommendations(&self, query: &RecommendationQuery) -> Result<()> {
        self.post_json(&self.recommender_host, "recommender/add-recommendations", query)
            .await
    }

    async fn fetch_images(&self, urls: &[String]) -> Result<Vec<Vec<u8>>> {
        let mut images = Vec::with_capacity(urls.len());
        for url in urls {
            let response = self.client.get(url).send().await?;
            let response = check_status(response).await?;
            let bytes = response.bytes().await?;
            images.push(bytes.to_vec());
        }
        Ok(images)
    }
}
