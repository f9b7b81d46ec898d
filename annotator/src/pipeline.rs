use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use common::Config;

use crate::assembly::{assemble_post, resolve_members};
use crate::clustering::TopicClusterer;
use crate::collage::make_collage;
use crate::dispatch::{dispatch_batch, persist_post};
use crate::fetch::fetch_sources;
use crate::gateway::ServiceGateway;
use crate::models::{PostQuery, SourceId};

/// Counters describing one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub requested: usize,
    pub fetched: usize,
    pub clusters: usize,
    pub clusters_rejected: usize,
    pub collages: usize,
    pub posts_persisted: usize,
    pub posts_dropped: usize,
    pub analysis_sent: bool,
}

/// Fetch, cluster, assemble and dispatch one batch of sources
pub struct Pipeline {
    config: Arc<Config>,
    gateway: Arc<dyn ServiceGateway>,
    clusterer: Arc<dyn TopicClusterer>,
}

impl Pipeline {
    pub fn new(config: Arc<Config>, gateway: Arc<dyn ServiceGateway>, clusterer: Arc<dyn TopicClusterer>) -> Self {
        Self {
            config,
            gateway,
            clusterer,
        }
    }

    /// Execute a full run. Per-item and per-cluster failures are absorbed;
    /// only clustering failures abort the run.
    pub async fn run(&self, source_ids: &[SourceId]) -> Result<RunReport> {
        let mut report = RunReport {
            requested: source_ids.len(),
            ..RunReport::default()
        };

        let batch = fetch_sources(self.gateway.as_ref(), source_ids).await;
        report.fetched = batch.len();
        if batch.is_empty() {
            info!("No documents fetched, ending run");
            return Ok(report);
        }

        info!("Clustering {} documents", batch.len());
        let model_name = &self.config.clustering.model_name;
        let result = self
            .clusterer
            .cluster(model_name, batch.documents(), batch.len())
            .await
            .with_context(|| format!("clustering with model '{}' failed", model_name))?;
        result
            .validate_partition(batch.len())
            .context("clustering returned an invalid assignment")?;
        report.clusters = result.clusters.len();

        let mut queries: Vec<PostQuery> = Vec::new();

        for cluster in &result.clusters {
            let Some(mut assembled) = assemble_post(cluster, batch.sources(), batch.documents(), None) else {
                warn!(cluster = cluster.label, "cluster has no parseable member date, skipping post");
                report.clusters_rejected += 1;
                continue;
            };

            let members = resolve_members(cluster, batch.sources());
            assembled.post.media = make_collage(self.gateway.as_ref(), &members, &self.config.collage).await;
            if assembled.post.media.is_some() {
                report.collages += 1;
            }

            if persist_post(self.gateway.as_ref(), &assembled.post).await {
                report.posts_persisted += 1;
                queries.push(PostQuery {
                    post_id: assembled.post.id.to_string(),
                    text: assembled.text,
                });
            } else {
                report.posts_dropped += 1;
            }
        }

        report.analysis_sent =
            dispatch_batch(self.gateway.as_ref(), queries, self.config.dispatch.notify_recommender).await;

        info!(
            requested = report.requested,
            fetched = report.fetched,
            clusters = report.clusters,
            persisted = report.posts_persisted,
            dropped = report.posts_dropped,
            "Pipeline run complete"
        );
        Ok(report)
    }
}
