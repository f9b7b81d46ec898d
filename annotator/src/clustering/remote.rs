use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Cluster, ClusterError, ClusterResult, TopicClusterer};
use crate::gateway::ServiceError;

/// Clustering capability exposed by the topic-model service
pub struct RemoteClusterer {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ClusterRequest<'a> {
    model_name: &'a str,
    documents: &'a [String],
    num_clusters: usize,
}

/// Both maps are keyed by the stringified cluster index; key order is significant.
#[derive(Deserialize)]
struct ClusterResponse {
    cluster_topics: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    idx_to_topic: serde_json::Map<String, serde_json::Value>,
}

impl RemoteClusterer {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl TopicClusterer for RemoteClusterer {
    async fn cluster(
        &self,
        model_name: &str,
        documents: &[String],
        num_clusters: usize,
    ) -> Result<ClusterResult, ClusterError> {
        let url = format!("{}/clustering/cluster-by-topic", self.base_url);
        let body = ClusterRequest {
            model_name,
            documents,
            num_clusters,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ServiceError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: ClusterResponse = response
            .json()
            .await
            .map_err(|e| ClusterError::Decode(e.to_string()))?;

        parse_response(parsed)
    }
}

fn parse_response(response: ClusterResponse) -> Result<ClusterResult, ClusterError> {
    let mut clusters = Vec::with_capacity(response.cluster_topics.len());

    for (key, members) in response.cluster_topics {
        let label: i64 = key
            .trim()
            .parse()
            .map_err(|_| ClusterError::Decode(format!("cluster key '{}' is not an integer", key)))?;

        let members: Vec<usize> = serde_json::from_value(members)
            .map_err(|e| ClusterError::Decode(format!("cluster {}: {}", key, e)))?;

        let topics: Vec<Option<String>> = match response.idx_to_topic.get(&key) {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| ClusterError::Decode(format!("topics of cluster {}: {}", key, e)))?,
            None => Vec::new(),
        };

        clusters.push(Cluster { label, members, topics });
    }

    Ok(ClusterResult::new(clusters))
}
